//! Resource declarations, discovery, and the resource registry.
//!
//! A resource implementation is discoverable once it is paired with a
//! [`ResourceCandidate`]: its implementation tag, an optional declaration, and
//! a factory. Candidates reach the registry through a [`ResourceScanner`];
//! [`register_resource!`](crate::register_resource) submits one to the default
//! [`InventoryScanner`].

use std::any::Any;
use std::sync::Arc;

use crate::BoxError;
use crate::class::ClassId;

mod registry;
mod scan;

pub use registry::{ResourceRegistry, ResourceSnapshot};
pub use scan::{DiscoveryError, InventoryScanner, ResourceReg, ResourceScanner, StaticScanner};

/// Order given to declarations that do not set one; loses against any explicit order.
pub const DEFAULT_ORDER: i32 = i32::MAX;

/// A handler for one kind of domain object.
pub trait Resource: Any + Send + Sync {
	/// Exposes the delegating-handler capability, if this resource has one.
	fn as_delegating(self: Arc<Self>) -> Option<Arc<dyn DelegatingResourceHandler>> {
		None
	}
}

impl dyn Resource {
	pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
		(self as &dyn Any).downcast_ref::<T>()
	}

	pub fn is<T: Resource>(&self) -> bool {
		(self as &dyn Any).is::<T>()
	}
}

/// A resource handler that converts objects of one class to and from their
/// representations.
pub trait DelegatingResourceHandler: Any + Send + Sync {
	fn handled_class(&self) -> ClassId;
}

impl dyn DelegatingResourceHandler {
	pub fn downcast_ref<T: DelegatingResourceHandler>(&self) -> Option<&T> {
		(self as &dyn Any).downcast_ref::<T>()
	}
}

/// A handler for a subclass of an object served by another resource.
pub trait DelegatingSubclassHandler: DelegatingResourceHandler {
	/// The class served by the resource this handler extends.
	fn superclass(&self) -> ClassId;
}

/// A top-level resource declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDeclaration {
	pub name: &'static str,
	pub supported_class: ClassId,
	/// Lower wins when two resources share a name.
	pub order: i32,
	/// Required-version expressions; an empty list never matches.
	pub supported_versions: &'static [&'static str],
}

impl ResourceDeclaration {
	pub const fn new(name: &'static str, supported_class: ClassId) -> Self {
		Self {
			name,
			supported_class,
			order: DEFAULT_ORDER,
			supported_versions: &[],
		}
	}

	pub const fn order(mut self, order: i32) -> Self {
		self.order = order;
		self
	}

	pub const fn versions(mut self, versions: &'static [&'static str]) -> Self {
		self.supported_versions = versions;
		self
	}
}

/// A resource nested under a parent resource, registered as `parent-name/path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubResourceDeclaration {
	/// Implementation tag of the parent resource.
	pub parent: ClassId,
	pub path: &'static str,
	pub supported_class: ClassId,
	pub order: i32,
	pub supported_versions: &'static [&'static str],
}

impl SubResourceDeclaration {
	pub const fn new(parent: ClassId, path: &'static str, supported_class: ClassId) -> Self {
		Self {
			parent,
			path,
			supported_class,
			order: DEFAULT_ORDER,
			supported_versions: &[],
		}
	}

	pub const fn order(mut self, order: i32) -> Self {
		self.order = order;
		self
	}

	pub const fn versions(mut self, versions: &'static [&'static str]) -> Self {
		self.supported_versions = versions;
		self
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceDecl {
	Resource(ResourceDeclaration),
	SubResource(SubResourceDeclaration),
}

impl ResourceDecl {
	pub fn supported_versions(&self) -> &'static [&'static str] {
		match self {
			Self::Resource(decl) => decl.supported_versions,
			Self::SubResource(decl) => decl.supported_versions,
		}
	}
}

impl From<ResourceDeclaration> for ResourceDecl {
	fn from(decl: ResourceDeclaration) -> Self {
		Self::Resource(decl)
	}
}

impl From<SubResourceDeclaration> for ResourceDecl {
	fn from(decl: SubResourceDeclaration) -> Self {
		Self::SubResource(decl)
	}
}

/// Constructs a fresh resource instance.
pub type ResourceFactory = fn() -> Result<Arc<dyn Resource>, BoxError>;

/// A discovered resource implementation.
#[derive(Debug, Clone, Copy)]
pub struct ResourceCandidate {
	/// Tag of the implementation type; sub-resources name their parent by it.
	pub implementation: ClassId,
	/// Candidates without a declaration are ignored.
	pub declaration: Option<ResourceDecl>,
	pub factory: ResourceFactory,
}

impl ResourceCandidate {
	pub const fn new(implementation: ClassId, declaration: ResourceDecl, factory: ResourceFactory) -> Self {
		Self {
			implementation,
			declaration: Some(declaration),
			factory,
		}
	}

	pub const fn undeclared(implementation: ClassId, factory: ResourceFactory) -> Self {
		Self {
			implementation,
			declaration: None,
			factory,
		}
	}
}

/// Registers a `Default`-constructible resource type with the [`InventoryScanner`].
///
/// ```ignore
/// register_resource!(PatientResource, ResourceDeclaration::new("patient", PATIENT).order(0).versions(&["2.*"]));
/// ```
#[macro_export]
macro_rules! register_resource {
	($ty:ident, $decl:expr) => {
		$crate::paste::paste! {
			fn [<new_ $ty:snake>]() -> ::std::result::Result<::std::sync::Arc<dyn $crate::Resource>, $crate::BoxError> {
				::std::result::Result::Ok(::std::sync::Arc::new(<$ty as ::std::default::Default>::default()))
			}

			#[allow(non_upper_case_globals)]
			static [<RESOURCE_ $ty:upper>]: $crate::ResourceCandidate = $crate::ResourceCandidate::new(
				$crate::ClassId::new(stringify!($ty)),
				$crate::ResourceDecl::Resource($decl),
				[<new_ $ty:snake>],
			);

			$crate::inventory::submit!($crate::ResourceReg(&[<RESOURCE_ $ty:upper>]));
		}
	};
}

/// Registers a `Default`-constructible sub-resource type with the [`InventoryScanner`].
#[macro_export]
macro_rules! register_subresource {
	($ty:ident, $decl:expr) => {
		$crate::paste::paste! {
			fn [<new_ $ty:snake>]() -> ::std::result::Result<::std::sync::Arc<dyn $crate::Resource>, $crate::BoxError> {
				::std::result::Result::Ok(::std::sync::Arc::new(<$ty as ::std::default::Default>::default()))
			}

			#[allow(non_upper_case_globals)]
			static [<RESOURCE_ $ty:upper>]: $crate::ResourceCandidate = $crate::ResourceCandidate::new(
				$crate::ClassId::new(stringify!($ty)),
				$crate::ResourceDecl::SubResource($decl),
				[<new_ $ty:snake>],
			);

			$crate::inventory::submit!($crate::ResourceReg(&[<RESOURCE_ $ty:upper>]));
		}
	};
}

#[cfg(test)]
mod tests;
