//! Sources of search handlers and subclass handlers.

use std::sync::{Arc, OnceLock};

use crate::resource::DelegatingSubclassHandler;
use crate::search::SearchHandler;

/// Supplies the registered handler instances.
///
/// Implementations should hand out the same instances on every call; the
/// search registry tells handlers apart by identity.
pub trait HandlerProvider: Send + Sync {
	fn search_handlers(&self) -> Vec<Arc<dyn SearchHandler>>;

	fn subclass_handlers(&self) -> Vec<Arc<dyn DelegatingSubclassHandler>>;
}

/// Provider over explicit handler lists.
#[derive(Clone, Default)]
pub struct StaticHandlers {
	search: Vec<Arc<dyn SearchHandler>>,
	subclass: Vec<Arc<dyn DelegatingSubclassHandler>>,
}

impl StaticHandlers {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_search(mut self, handler: Arc<dyn SearchHandler>) -> Self {
		self.search.push(handler);
		self
	}

	pub fn with_subclass(mut self, handler: Arc<dyn DelegatingSubclassHandler>) -> Self {
		self.subclass.push(handler);
		self
	}
}

impl HandlerProvider for StaticHandlers {
	fn search_handlers(&self) -> Vec<Arc<dyn SearchHandler>> {
		self.search.clone()
	}

	fn subclass_handlers(&self) -> Vec<Arc<dyn DelegatingSubclassHandler>> {
		self.subclass.clone()
	}
}

/// Link-time registration of a search handler constructor.
pub struct SearchHandlerReg(pub fn() -> Arc<dyn SearchHandler>);
inventory::collect!(SearchHandlerReg);

/// Link-time registration of a subclass handler constructor.
pub struct SubclassHandlerReg(pub fn() -> Arc<dyn DelegatingSubclassHandler>);
inventory::collect!(SubclassHandlerReg);

/// Provider over every handler submitted through [`inventory`].
///
/// Each constructor runs once; later calls return the same instances.
#[derive(Default)]
pub struct InventoryHandlers {
	search: OnceLock<Vec<Arc<dyn SearchHandler>>>,
	subclass: OnceLock<Vec<Arc<dyn DelegatingSubclassHandler>>>,
}

impl InventoryHandlers {
	pub fn new() -> Self {
		Self::default()
	}
}

impl HandlerProvider for InventoryHandlers {
	fn search_handlers(&self) -> Vec<Arc<dyn SearchHandler>> {
		self.search
			.get_or_init(|| inventory::iter::<SearchHandlerReg>.into_iter().map(|reg| (reg.0)()).collect())
			.clone()
	}

	fn subclass_handlers(&self) -> Vec<Arc<dyn DelegatingSubclassHandler>> {
		self.subclass
			.get_or_init(|| inventory::iter::<SubclassHandlerReg>.into_iter().map(|reg| (reg.0)()).collect())
			.clone()
	}
}

/// Registers a `Default`-constructible search handler with [`InventoryHandlers`].
#[macro_export]
macro_rules! register_search_handler {
	($ty:ident) => {
		$crate::paste::paste! {
			fn [<new_ $ty:snake>]() -> ::std::sync::Arc<dyn $crate::SearchHandler> {
				::std::sync::Arc::new(<$ty as ::std::default::Default>::default())
			}

			$crate::inventory::submit!($crate::SearchHandlerReg([<new_ $ty:snake>]));
		}
	};
}

/// Registers a `Default`-constructible subclass handler with [`InventoryHandlers`].
#[macro_export]
macro_rules! register_subclass_handler {
	($ty:ident) => {
		$crate::paste::paste! {
			fn [<new_ $ty:snake>]() -> ::std::sync::Arc<dyn $crate::DelegatingSubclassHandler> {
				::std::sync::Arc::new(<$ty as ::std::default::Default>::default())
			}

			$crate::inventory::submit!($crate::SubclassHandlerReg([<new_ $ty:snake>]));
		}
	};
}
