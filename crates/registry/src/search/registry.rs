//! Search handler registry build and resolution.
//!
//! # Invariants
//!
//! - One registration per `(resource, id)`; a second claim on the pair fails
//!   the build, even from the same handler matching through another version.
//! - A handler is indexed under `(resource, parameter)` for every parameter of
//!   every query it declares.

use std::collections::BTreeSet;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use resdex_version::VersionFilter;
use rustc_hash::FxHashMap;

use super::{HandlerSet, RequestParams, SearchHandler, SearchRules};
use crate::error::{RegistryError, Result};
use crate::key::CompositeKey;
use crate::provider::HandlerProvider;
use crate::state::{RegistryState, SnapshotCell};

/// Immutable view of the registered search handlers.
pub struct SearchSnapshot {
	by_id: FxHashMap<CompositeKey, Arc<dyn SearchHandler>>,
	by_parameter: FxHashMap<CompositeKey, HandlerSet>,
	by_resource: FxHashMap<Box<str>, HandlerSet>,
	all: Vec<Arc<dyn SearchHandler>>,
}

impl SearchSnapshot {
	/// Indexes every handler with at least one declared version matching the platform.
	pub fn build(handlers: Vec<Arc<dyn SearchHandler>>, versions: &dyn VersionFilter, platform_version: &str) -> Result<Self> {
		let mut by_id = FxHashMap::default();
		let mut by_parameter: FxHashMap<CompositeKey, HandlerSet> = FxHashMap::default();
		let mut by_resource: FxHashMap<Box<str>, HandlerSet> = FxHashMap::default();

		for handler in &handlers {
			let config = handler.search_config();
			for version in config.supported_versions() {
				if !versions.matches(platform_version, version) {
					continue;
				}

				insert_id(&mut by_id, handler)?;
				for parameter in config.parameters() {
					by_parameter
						.entry(CompositeKey::new(config.supported_resource(), parameter))
						.or_default()
						.insert(handler.clone());
				}
				by_resource
					.entry(Box::from(config.supported_resource()))
					.or_default()
					.insert(handler.clone());
			}
		}

		tracing::debug!(
			domain = "search",
			handlers = handlers.len(),
			registered = by_id.len(),
			resources = by_resource.len(),
			"search handler registry built"
		);

		Ok(Self {
			by_id,
			by_parameter,
			by_resource,
			all: handlers,
		})
	}

	pub fn by_id(&self, resource: &str, id: &str) -> Option<&Arc<dyn SearchHandler>> {
		self.by_id.get(&CompositeKey::new(resource, id))
	}

	pub fn by_parameter(&self, resource: &str, parameter: &str) -> Option<&HandlerSet> {
		self.by_parameter.get(&CompositeKey::new(resource, parameter))
	}

	pub fn for_resource(&self, resource: &str) -> Option<&HandlerSet> {
		self.by_resource.get(resource)
	}

	/// Every handler the provider supplied, admitted or not.
	pub fn all(&self) -> &[Arc<dyn SearchHandler>] {
		&self.all
	}

	/// Picks the handler serving a search on `resource`.
	///
	/// Returns `Ok(None)` when no handler applies: no search parameters, a
	/// parameter no handler declares, or no handler whose required parameters
	/// are all supplied.
	pub fn resolve(&self, resource: &str, params: &RequestParams, rules: &SearchRules) -> Result<Option<Arc<dyn SearchHandler>>> {
		if let Some(id) = params.get(rules.search_id_parameter()).and_then(|ids| ids.first()) {
			return match self.by_id(resource, id) {
				Some(handler) => Ok(Some(handler.clone())),
				None => Err(RegistryError::UnrecognizedSearchId {
					resource: resource.to_string(),
					id: id.clone(),
				}),
			};
		}

		let search_parameters: BTreeSet<&str> = params
			.keys()
			.map(String::as_str)
			.filter(|p| !rules.is_reserved(p))
			.collect();

		let mut candidates: Option<HandlerSet> = None;
		for parameter in &search_parameters {
			let Some(registered) = self.by_parameter(resource, parameter) else {
				return Ok(None);
			};
			candidates = Some(match candidates.take() {
				None => registered.clone(),
				Some(mut set) => {
					set.retain_in(registered);
					set
				}
			});
		}

		let Some(mut candidates) = candidates else {
			return Ok(None);
		};

		candidates.retain(|handler| {
			handler
				.search_config()
				.search_queries()
				.iter()
				.any(|query| query.is_satisfied_by(&search_parameters))
		});

		match candidates.len() {
			0 => Ok(None),
			1 => Ok(candidates.first().cloned()),
			_ => {
				let hints = candidates
					.iter()
					.map(|h| format!("{}={}", rules.search_id_parameter(), h.search_config().id()))
					.collect();
				Err(RegistryError::AmbiguousSearch {
					resource: resource.to_string(),
					hints,
				})
			}
		}
	}
}

/// Claims `(resource, id)` for `handler`. Any earlier claim on the pair is a
/// conflict, including one made by the same handler for another matching version.
fn insert_id(by_id: &mut FxHashMap<CompositeKey, Arc<dyn SearchHandler>>, handler: &Arc<dyn SearchHandler>) -> Result<()> {
	let config = handler.search_config();
	match by_id.entry(CompositeKey::new(config.supported_resource(), config.id())) {
		Entry::Vacant(slot) => {
			slot.insert(handler.clone());
			Ok(())
		}
		Entry::Occupied(_) => Err(RegistryError::DuplicateSearchId {
			resource: config.supported_resource().to_string(),
			id: config.id().to_string(),
		}),
	}
}

/// Lazily built search handler registry.
pub struct SearchHandlerRegistry {
	cell: SnapshotCell<SearchSnapshot>,
	provider: Arc<dyn HandlerProvider>,
	versions: Arc<dyn VersionFilter>,
	platform_version: Arc<str>,
	rules: SearchRules,
}

impl SearchHandlerRegistry {
	pub fn new(
		provider: Arc<dyn HandlerProvider>,
		versions: Arc<dyn VersionFilter>,
		platform_version: impl Into<Arc<str>>,
		rules: SearchRules,
	) -> Self {
		Self {
			cell: SnapshotCell::new("search"),
			provider,
			versions,
			platform_version: platform_version.into(),
			rules,
		}
	}

	pub fn state(&self) -> RegistryState {
		self.cell.state()
	}

	pub fn rules(&self) -> &SearchRules {
		&self.rules
	}

	/// Returns the published snapshot, building one from the provider if there is none.
	pub fn build(&self) -> Result<Arc<SearchSnapshot>> {
		self.cell.get_or_build(|| {
			SearchSnapshot::build(self.provider.search_handlers(), &*self.versions, &self.platform_version)
		})
	}

	/// Discards the published snapshot and builds a new one.
	pub fn rebuild(&self) -> Result<Arc<SearchSnapshot>> {
		self.reset();
		self.build()
	}

	pub fn reset(&self) {
		self.cell.reset();
	}

	pub fn resolve(&self, resource: &str, params: &RequestParams) -> Result<Option<Arc<dyn SearchHandler>>> {
		self.build()?.resolve(resource, params, &self.rules)
	}

	pub fn handlers_for_resource(&self, resource: &str) -> Result<Option<HandlerSet>> {
		Ok(self.build()?.for_resource(resource).cloned())
	}

	/// Handlers captured by the last build, without triggering one.
	pub fn all_search_handlers(&self) -> Option<Vec<Arc<dyn SearchHandler>>> {
		self.cell.load().map(|snap| snap.all().to_vec())
	}
}
