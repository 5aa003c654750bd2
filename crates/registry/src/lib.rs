//! Resource and search handler registries.
//!
//! Incoming API requests name a resource, carry an object of some class, or
//! supply a bag of query parameters. This crate picks the single handler that
//! serves such a request among every implementation that declared itself for
//! it, and reports irreconcilable declarations as configuration errors.
//!
//! # Mental Model
//!
//! 1. **Declaration:** resource implementations and search handlers are paired
//!    with static descriptors ([`ResourceDecl`], [`SearchConfig`]) and made
//!    discoverable through a [`ResourceScanner`] and a [`HandlerProvider`]
//!    (link-time [`inventory`] registration by default).
//! 2. **Build:** on first use, each registry filters declarations by platform
//!    version, resolves collisions, and publishes an immutable snapshot.
//! 3. **Lookup:** requests are served from the published snapshot without
//!    locking. [`RestRegistry::initialize`] discards both snapshots and
//!    rebuilds them.
//!
//! # Precedence Contract
//!
//! - Resources sharing a name: lower order wins; equal order is a
//!   [`RegistryError::DuplicateResourceOrder`].
//! - Search handlers sharing a `(resource, id)` pair are a
//!   [`RegistryError::DuplicateSearchId`].
//! - A parameter search that leaves more than one handler standing is a
//!   [`RegistryError::AmbiguousSearch`].

pub mod class;
pub mod config;
pub mod error;
pub mod key;
pub mod provider;
pub mod representation;
pub mod resource;
pub mod search;
pub mod service;
mod state;

pub use class::{ClassId, ClassInfo, ClassReg, TypeHierarchy};
pub use config::{ConfigError, RegistryConfig, RepresentationTokens, UNSET_PLATFORM_VERSION};
pub use error::{ErrorKind, RegistryError, Result};
pub use key::CompositeKey;
pub use provider::{HandlerProvider, InventoryHandlers, SearchHandlerReg, StaticHandlers, SubclassHandlerReg};
pub use representation::Representation;
pub use resource::{
	DEFAULT_ORDER, DelegatingResourceHandler, DelegatingSubclassHandler, DiscoveryError, InventoryScanner, Resource,
	ResourceCandidate, ResourceDecl, ResourceDeclaration, ResourceFactory, ResourceReg, ResourceRegistry,
	ResourceScanner, ResourceSnapshot, StaticScanner, SubResourceDeclaration,
};
pub use search::{HandlerSet, RequestParams, SearchConfig, SearchHandler, SearchHandlerRegistry, SearchQuery, SearchRules, SearchSnapshot};
pub use service::{RestRegistry, RestRegistryBuilder};
pub use state::RegistryState;

#[doc(hidden)]
pub use inventory;
#[doc(hidden)]
pub use paste;
pub use resdex_version::{RequiredVersions, VersionFilter};

/// Boxed error produced by resource factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
