//! The externally visible registry service.

use std::sync::Arc;

use resdex_version::{RequiredVersions, VersionFilter};

use crate::class::{ClassId, TypeHierarchy};
use crate::config::{RegistryConfig, UNSET_PLATFORM_VERSION};
use crate::error::Result;
use crate::provider::{HandlerProvider, InventoryHandlers};
use crate::representation::Representation;
use crate::resource::{DelegatingResourceHandler, InventoryScanner, Resource, ResourceRegistry, ResourceScanner};
use crate::search::{HandlerSet, RequestParams, SearchHandler, SearchHandlerRegistry, SearchRules};

/// Selects the handler for a request among every registered resource and
/// search handler.
///
/// Both registries build on first use. [`RestRegistry::initialize`] discards
/// them and rebuilds eagerly, e.g. after a configuration reload.
pub struct RestRegistry {
	config: RegistryConfig,
	provider: Arc<dyn HandlerProvider>,
	resources: ResourceRegistry,
	searches: SearchHandlerRegistry,
}

impl RestRegistry {
	pub fn builder() -> RestRegistryBuilder {
		RestRegistryBuilder::default()
	}

	pub fn config(&self) -> &RegistryConfig {
		&self.config
	}

	pub fn resources(&self) -> &ResourceRegistry {
		&self.resources
	}

	pub fn searches(&self) -> &SearchHandlerRegistry {
		&self.searches
	}

	pub fn resource_by_name(&self, name: &str) -> Result<Arc<dyn Resource>> {
		self.resources.lookup_by_name(name)
	}

	pub fn resource_by_supported_class(&self, class: ClassId) -> Result<Arc<dyn Resource>> {
		self.resources.lookup_by_supported_class(class)
	}

	pub fn resource_handlers(&self) -> Result<Vec<Arc<dyn DelegatingResourceHandler>>> {
		self.resources.list_all_resource_handlers(&*self.provider)
	}

	pub fn search_handler(&self, resource: &str, params: &RequestParams) -> Result<Option<Arc<dyn SearchHandler>>> {
		self.searches.resolve(resource, params)
	}

	pub fn search_handlers(&self, resource: &str) -> Result<Option<HandlerSet>> {
		self.searches.handlers_for_resource(resource)
	}

	/// Search handlers captured by the last build, `None` before any build.
	pub fn all_search_handlers(&self) -> Option<Vec<Arc<dyn SearchHandler>>> {
		self.searches.all_search_handlers()
	}

	pub fn representation_for(&self, requested: Option<&str>) -> Representation {
		self.config.representation.parse(requested)
	}

	/// Discards both registries and rebuilds them.
	///
	/// On failure the failing registry stays uninitialized, so later lookups
	/// retry the build rather than serve a stale snapshot.
	pub fn initialize(&self) -> Result<()> {
		tracing::info!(platform_version = self.config.platform_version(), "initializing registries");
		self.resources.reset();
		self.searches.reset();

		self.resources.build()?;
		self.searches.build()?;
		Ok(())
	}
}

/// Assembles a [`RestRegistry`]; unset collaborators default to the inventory-backed ones.
#[derive(Default)]
pub struct RestRegistryBuilder {
	config: RegistryConfig,
	scanner: Option<Arc<dyn ResourceScanner>>,
	provider: Option<Arc<dyn HandlerProvider>>,
	versions: Option<Arc<dyn VersionFilter>>,
	hierarchy: Option<TypeHierarchy>,
}

impl RestRegistryBuilder {
	pub fn config(mut self, config: RegistryConfig) -> Self {
		self.config = config;
		self
	}

	pub fn platform_version(mut self, version: impl Into<String>) -> Self {
		self.config.platform_version = Some(version.into());
		self
	}

	pub fn scanner(mut self, scanner: impl ResourceScanner + 'static) -> Self {
		self.scanner = Some(Arc::new(scanner));
		self
	}

	pub fn provider(mut self, provider: impl HandlerProvider + 'static) -> Self {
		self.provider = Some(Arc::new(provider));
		self
	}

	pub fn version_filter(mut self, versions: impl VersionFilter + 'static) -> Self {
		self.versions = Some(Arc::new(versions));
		self
	}

	pub fn hierarchy(mut self, hierarchy: TypeHierarchy) -> Self {
		self.hierarchy = Some(hierarchy);
		self
	}

	pub fn build(self) -> RestRegistry {
		let scanner = self.scanner.unwrap_or_else(|| Arc::new(InventoryScanner));
		let provider = self.provider.unwrap_or_else(|| Arc::new(InventoryHandlers::new()));
		let versions = self.versions.unwrap_or_else(|| Arc::new(RequiredVersions));
		let hierarchy = Arc::new(self.hierarchy.unwrap_or_else(TypeHierarchy::from_inventory));
		if self.config.platform_version.is_none() {
			tracing::warn!(
				placeholder = UNSET_PLATFORM_VERSION,
				"no platform version configured, versioned declarations will not match"
			);
		}
		let platform_version: Arc<str> = Arc::from(self.config.platform_version());

		RestRegistry {
			resources: ResourceRegistry::new(scanner, versions.clone(), hierarchy, platform_version.clone()),
			searches: SearchHandlerRegistry::new(
				provider.clone(),
				versions,
				platform_version,
				SearchRules::from_config(&self.config),
			),
			provider,
			config: self.config,
		}
	}
}
