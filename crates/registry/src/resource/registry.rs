//! Resource registry build and lookup.
//!
//! # Invariants
//!
//! - At most one resource per name; among candidates sharing a name the lowest
//!   order wins and equal orders fail the build.
//! - The class index keeps insertion order so the ancestor fallback scan is
//!   deterministic for a given discovery order.

use std::sync::Arc;

use indexmap::IndexMap;
use resdex_version::{VersionFilter, any_matches};
use rustc_hash::{FxBuildHasher, FxHashMap};

use super::{DelegatingResourceHandler, Resource, ResourceCandidate, ResourceDecl, ResourceScanner};
use crate::class::{ClassId, TypeHierarchy};
use crate::error::{RegistryError, Result};
use crate::provider::HandlerProvider;
use crate::state::{RegistryState, SnapshotCell};

struct ResourceDefinition {
	resource: Arc<dyn Resource>,
	order: i32,
}

/// Metadata derived from a candidate whose declaration applies to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResourceMetadata {
	name: String,
	supported_class: ClassId,
	order: i32,
}

/// Immutable view of the registered resources.
pub struct ResourceSnapshot {
	by_name: FxHashMap<Box<str>, ResourceDefinition>,
	by_class: IndexMap<ClassId, Arc<dyn Resource>, FxBuildHasher>,
}

impl ResourceSnapshot {
	/// Builds a snapshot from discovered candidates.
	pub fn build(candidates: &[ResourceCandidate], versions: &dyn VersionFilter, platform_version: &str) -> Result<Self> {
		let declared: FxHashMap<ClassId, &ResourceDecl> = candidates
			.iter()
			.filter_map(|c| c.declaration.as_ref().map(|decl| (c.implementation, decl)))
			.collect();

		let mut by_name: FxHashMap<Box<str>, ResourceDefinition> = FxHashMap::default();
		let mut by_class: IndexMap<ClassId, Arc<dyn Resource>, FxBuildHasher> = IndexMap::default();

		for candidate in candidates {
			let Some(meta) = resource_metadata(candidate, &declared, versions, platform_version) else {
				tracing::trace!(domain = "resources", implementation = %candidate.implementation, "skipping candidate");
				continue;
			};

			if !is_resource_to_be_added(&meta, by_name.get(meta.name.as_str()))? {
				continue;
			}

			let resource = (candidate.factory)().map_err(|source| RegistryError::Instantiation {
				class: candidate.implementation,
				source,
			})?;

			by_name.insert(
				meta.name.into_boxed_str(),
				ResourceDefinition {
					resource: resource.clone(),
					order: meta.order,
				},
			);
			by_class.insert(meta.supported_class, resource);
		}

		tracing::debug!(
			domain = "resources",
			candidates = candidates.len(),
			names = by_name.len(),
			classes = by_class.len(),
			"resource registry built"
		);

		Ok(Self { by_name, by_class })
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn Resource>> {
		self.by_name.get(name).map(|def| &def.resource)
	}

	/// Order of the resource that won `name`.
	pub fn order_of(&self, name: &str) -> Option<i32> {
		self.by_name.get(name).map(|def| def.order)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.by_name.keys().map(|name| &**name)
	}

	/// Registered `(supported class, resource)` pairs in registration order.
	pub fn classes(&self) -> impl Iterator<Item = (ClassId, &Arc<dyn Resource>)> {
		self.by_class.iter().map(|(class, resource)| (*class, resource))
	}

	pub fn len(&self) -> usize {
		self.by_name.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_name.is_empty()
	}

	/// Finds the resource serving `class`.
	///
	/// Proxy classes are replaced by their direct superclass first. Without an
	/// exact match, registered classes assignable from the query are scanned in
	/// registration order, and the running best is replaced whenever it is
	/// assignable from the next match. With a chain of ancestors this picks the
	/// closest one; with a lattice the result depends on registration order.
	pub fn get_by_class(&self, class: ClassId, hierarchy: &TypeHierarchy) -> Option<&Arc<dyn Resource>> {
		let class = resolve_proxy(class, hierarchy);
		if let Some(resource) = self.by_class.get(&class) {
			return Some(resource);
		}

		let mut best: Option<(ClassId, &Arc<dyn Resource>)> = None;
		for (&registered, resource) in &self.by_class {
			if !hierarchy.is_assignable_from(registered, class) {
				continue;
			}
			if best.is_none_or(|(best_class, _)| hierarchy.is_assignable_from(best_class, registered)) {
				best = Some((registered, resource));
			}
		}
		best.map(|(_, resource)| resource)
	}
}

fn resolve_proxy(class: ClassId, hierarchy: &TypeHierarchy) -> ClassId {
	if hierarchy.is_proxy(class) {
		hierarchy.superclass_of(class).unwrap_or(class)
	} else {
		class
	}
}

fn resource_metadata(
	candidate: &ResourceCandidate,
	declared: &FxHashMap<ClassId, &ResourceDecl>,
	versions: &dyn VersionFilter,
	platform_version: &str,
) -> Option<ResourceMetadata> {
	let decl = candidate.declaration.as_ref()?;
	if !any_matches(versions, platform_version, decl.supported_versions()) {
		return None;
	}

	match decl {
		ResourceDecl::Resource(decl) => Some(ResourceMetadata {
			name: decl.name.to_string(),
			supported_class: decl.supported_class,
			order: decl.order,
		}),
		ResourceDecl::SubResource(sub) => {
			let Some(ResourceDecl::Resource(parent)) = declared.get(&sub.parent).copied() else {
				tracing::debug!(
					domain = "resources",
					implementation = %candidate.implementation,
					parent = %sub.parent,
					"sub-resource parent is not a declared resource"
				);
				return None;
			};
			Some(ResourceMetadata {
				name: format!("{}/{}", parent.name, sub.path),
				supported_class: sub.supported_class,
				order: sub.order,
			})
		}
	}
}

/// Decides whether `meta` displaces the staged definition for its name.
fn is_resource_to_be_added(meta: &ResourceMetadata, existing: Option<&ResourceDefinition>) -> Result<bool> {
	let Some(existing) = existing else {
		return Ok(true);
	};

	if existing.order == meta.order {
		return Err(RegistryError::DuplicateResourceOrder {
			name: meta.name.clone(),
			order: meta.order,
		});
	}

	if existing.order < meta.order {
		tracing::debug!(
			domain = "resources",
			name = %meta.name,
			kept = existing.order,
			dropped = meta.order,
			"keeping lower-order resource"
		);
		return Ok(false);
	}
	Ok(true)
}

/// Lazily built resource registry.
pub struct ResourceRegistry {
	cell: SnapshotCell<ResourceSnapshot>,
	scanner: Arc<dyn ResourceScanner>,
	versions: Arc<dyn VersionFilter>,
	hierarchy: Arc<TypeHierarchy>,
	platform_version: Arc<str>,
}

impl ResourceRegistry {
	pub fn new(
		scanner: Arc<dyn ResourceScanner>,
		versions: Arc<dyn VersionFilter>,
		hierarchy: Arc<TypeHierarchy>,
		platform_version: impl Into<Arc<str>>,
	) -> Self {
		Self {
			cell: SnapshotCell::new("resources"),
			scanner,
			versions,
			hierarchy,
			platform_version: platform_version.into(),
		}
	}

	pub fn state(&self) -> RegistryState {
		self.cell.state()
	}

	pub fn hierarchy(&self) -> &TypeHierarchy {
		&self.hierarchy
	}

	/// Returns the published snapshot, running discovery if there is none.
	pub fn build(&self) -> Result<Arc<ResourceSnapshot>> {
		self.cell.get_or_build(|| {
			let candidates = self.scanner.discover().map_err(RegistryError::Discovery)?;
			ResourceSnapshot::build(&candidates, &*self.versions, &self.platform_version)
		})
	}

	/// Discards the published snapshot and builds a new one.
	pub fn rebuild(&self) -> Result<Arc<ResourceSnapshot>> {
		self.reset();
		self.build()
	}

	pub fn reset(&self) {
		self.cell.reset();
	}

	pub fn lookup_by_name(&self, name: &str) -> Result<Arc<dyn Resource>> {
		self.build()?
			.get(name)
			.cloned()
			.ok_or_else(|| RegistryError::UnknownResource(name.to_string()))
	}

	pub fn lookup_by_supported_class(&self, class: ClassId) -> Result<Arc<dyn Resource>> {
		self.build()?
			.get_by_class(class, &self.hierarchy)
			.cloned()
			.ok_or_else(|| RegistryError::UnknownClass(resolve_proxy(class, &self.hierarchy)))
	}

	/// Every registered resource with the delegating-handler capability,
	/// followed by the provider's subclass handlers.
	pub fn list_all_resource_handlers(&self, provider: &dyn HandlerProvider) -> Result<Vec<Arc<dyn DelegatingResourceHandler>>> {
		let snap = self.build()?;
		let mut handlers: Vec<Arc<dyn DelegatingResourceHandler>> = snap
			.by_class
			.values()
			.filter_map(|resource| resource.clone().as_delegating())
			.collect();

		handlers.extend(
			provider
				.subclass_handlers()
				.into_iter()
				.map(|handler| handler as Arc<dyn DelegatingResourceHandler>),
		);
		Ok(handlers)
	}
}
