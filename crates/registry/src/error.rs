use crate::BoxError;
use crate::class::ClassId;
use crate::resource::DiscoveryError;

/// Coarse classification of a [`RegistryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Two declarations cannot be reconciled. Fatal at build time.
	ConfigurationConflict,
	/// Candidates could not be enumerated. Fatal at build time.
	Discovery,
	/// A winning resource could not be constructed. Fatal at build time.
	Instantiation,
	/// No resource serves the requested name or class.
	NotFound,
	/// The request names an unknown search or matches several.
	InvalidSearch,
}

/// Registry error.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	#[error("two resources with the same name ({name}) must not have the same order ({order})")]
	DuplicateResourceOrder { name: String, order: i32 },

	#[error("two search handlers for the same resource ({resource}) must not have the same id ({id})")]
	DuplicateSearchId { resource: String, id: String },

	#[error("cannot access resources")]
	Discovery(#[source] DiscoveryError),

	#[error("failed to instantiate {class}")]
	Instantiation {
		class: ClassId,
		#[source]
		source: BoxError,
	},

	#[error("unknown resource: {0}")]
	UnknownResource(String),

	#[error("unknown resource for class: {0}")]
	UnknownClass(ClassId),

	#[error("the search with id '{id}' for '{resource}' resource is not recognized")]
	UnrecognizedSearchId { resource: String, id: String },

	#[error("the search is ambiguous, please specify {}", .hints.join(" or "))]
	AmbiguousSearch { resource: String, hints: Vec<String> },
}

impl RegistryError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::DuplicateResourceOrder { .. } | Self::DuplicateSearchId { .. } => ErrorKind::ConfigurationConflict,
			Self::Discovery(_) => ErrorKind::Discovery,
			Self::Instantiation { .. } => ErrorKind::Instantiation,
			Self::UnknownResource(_) | Self::UnknownClass(_) => ErrorKind::NotFound,
			Self::UnrecognizedSearchId { .. } | Self::AmbiguousSearch { .. } => ErrorKind::InvalidSearch,
		}
	}

	/// Errors that abort a registry build.
	pub fn is_fatal(&self) -> bool {
		matches!(self.kind(), ErrorKind::ConfigurationConflict | ErrorKind::Discovery | ErrorKind::Instantiation)
	}

	pub fn is_not_found(&self) -> bool {
		self.kind() == ErrorKind::NotFound
	}

	pub fn is_invalid_search(&self) -> bool {
		self.kind() == ErrorKind::InvalidSearch
	}
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
