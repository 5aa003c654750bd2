//! Search handler declarations and the search handler registry.
//!
//! A search handler declares, per resource, an id and the parameter
//! combinations ([`SearchQuery`]) it can satisfy. Requests either name a
//! handler explicitly through the search id parameter or are matched against
//! every handler's declared parameters.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};

use crate::config::RegistryConfig;

mod registry;

pub use registry::{SearchHandlerRegistry, SearchSnapshot};

/// Already-parsed request parameters.
pub type RequestParams = HashMap<String, Vec<String>>;

/// One combination of parameters a search handler accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
	required: BTreeSet<String>,
	optional: BTreeSet<String>,
	description: Option<String>,
}

impl SearchQuery {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_required<I, S>(mut self, parameters: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.required.extend(parameters.into_iter().map(Into::into));
		self
	}

	pub fn with_optional<I, S>(mut self, parameters: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.optional.extend(parameters.into_iter().map(Into::into));
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn required(&self) -> &BTreeSet<String> {
		&self.required
	}

	pub fn optional(&self) -> &BTreeSet<String> {
		&self.optional
	}

	pub fn description(&self) -> Option<&str> {
		self.description.as_deref()
	}

	/// Required and optional parameters, each once.
	pub fn parameters(&self) -> impl Iterator<Item = &str> {
		self.required.union(&self.optional).map(String::as_str)
	}

	/// True if every required parameter is among `supplied`.
	pub fn is_satisfied_by(&self, supplied: &BTreeSet<&str>) -> bool {
		self.required.iter().all(|p| supplied.contains(p.as_str()))
	}
}

/// Declaration of a search handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
	id: String,
	supported_resource: String,
	supported_versions: Vec<String>,
	search_queries: Vec<SearchQuery>,
}

impl SearchConfig {
	pub fn new<V, S>(
		id: impl Into<String>,
		supported_resource: impl Into<String>,
		supported_versions: V,
		search_queries: impl IntoIterator<Item = SearchQuery>,
	) -> Self
	where
		V: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			id: id.into(),
			supported_resource: supported_resource.into(),
			supported_versions: supported_versions.into_iter().map(Into::into).collect(),
			search_queries: search_queries.into_iter().collect(),
		}
	}

	/// Unique among the handlers of one resource.
	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn supported_resource(&self) -> &str {
		&self.supported_resource
	}

	pub fn supported_versions(&self) -> &[String] {
		&self.supported_versions
	}

	pub fn search_queries(&self) -> &[SearchQuery] {
		&self.search_queries
	}

	/// Every parameter named by any query.
	pub fn parameters(&self) -> BTreeSet<&str> {
		self.search_queries.iter().flat_map(SearchQuery::parameters).collect()
	}
}

/// A component answering searches on one resource.
pub trait SearchHandler: Any + Send + Sync {
	fn search_config(&self) -> &SearchConfig;
}

impl dyn SearchHandler {
	pub fn downcast_ref<T: SearchHandler>(&self) -> Option<&T> {
		(self as &dyn Any).downcast_ref::<T>()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct HandlerKey(usize);

impl HandlerKey {
	fn of(handler: &Arc<dyn SearchHandler>) -> Self {
		Self(Arc::as_ptr(handler) as *const () as usize)
	}
}

/// Insertion-ordered set of search handlers compared by identity.
#[derive(Clone, Default)]
pub struct HandlerSet {
	entries: IndexMap<HandlerKey, Arc<dyn SearchHandler>, FxBuildHasher>,
}

impl HandlerSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true if `a` and `b` are the same handler instance.
	pub fn same(a: &Arc<dyn SearchHandler>, b: &Arc<dyn SearchHandler>) -> bool {
		HandlerKey::of(a) == HandlerKey::of(b)
	}

	/// Returns true if the handler was not yet present.
	pub fn insert(&mut self, handler: Arc<dyn SearchHandler>) -> bool {
		self.entries.insert(HandlerKey::of(&handler), handler).is_none()
	}

	pub fn contains(&self, handler: &Arc<dyn SearchHandler>) -> bool {
		self.entries.contains_key(&HandlerKey::of(handler))
	}

	/// Keeps only handlers also present in `other`.
	pub fn retain_in(&mut self, other: &HandlerSet) {
		self.entries.retain(|key, _| other.entries.contains_key(key));
	}

	pub fn retain(&mut self, mut keep: impl FnMut(&Arc<dyn SearchHandler>) -> bool) {
		self.entries.retain(|_, handler| keep(handler));
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn first(&self) -> Option<&Arc<dyn SearchHandler>> {
		self.entries.first().map(|(_, handler)| handler)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SearchHandler>> {
		self.entries.values()
	}

	/// Handler ids in set order.
	pub fn ids(&self) -> Vec<&str> {
		self.iter().map(|h| h.search_config().id()).collect()
	}
}

impl std::fmt::Debug for HandlerSet {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_set().entries(self.ids()).finish()
	}
}

impl FromIterator<Arc<dyn SearchHandler>> for HandlerSet {
	fn from_iter<I: IntoIterator<Item = Arc<dyn SearchHandler>>>(iter: I) -> Self {
		let mut set = Self::new();
		for handler in iter {
			set.insert(handler);
		}
		set
	}
}

/// Request conventions applied while resolving a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRules {
	search_id_parameter: Box<str>,
	reserved: FxHashSet<Box<str>>,
}

impl SearchRules {
	/// The search id parameter is always reserved.
	pub fn new<I, S>(search_id_parameter: impl Into<Box<str>>, reserved: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<Box<str>>,
	{
		let search_id_parameter = search_id_parameter.into();
		let mut reserved: FxHashSet<Box<str>> = reserved.into_iter().map(Into::into).collect();
		reserved.insert(search_id_parameter.clone());
		Self {
			search_id_parameter,
			reserved,
		}
	}

	pub fn from_config(config: &RegistryConfig) -> Self {
		Self::new(config.search_id_parameter.as_str(), config.reserved())
	}

	pub fn search_id_parameter(&self) -> &str {
		&self.search_id_parameter
	}

	pub fn is_reserved(&self, parameter: &str) -> bool {
		self.reserved.contains(parameter)
	}
}

impl Default for SearchRules {
	fn default() -> Self {
		Self::from_config(&RegistryConfig::default())
	}
}
