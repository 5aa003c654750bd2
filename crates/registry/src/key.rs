//! Two-part lookup keys.

/// A resource identifier paired with a secondary string (a search id or a
/// parameter name).
///
/// Two keys are equal iff both parts are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
	primary: Box<str>,
	secondary: Box<str>,
}

impl CompositeKey {
	pub fn new(primary: impl Into<Box<str>>, secondary: impl Into<Box<str>>) -> Self {
		Self {
			primary: primary.into(),
			secondary: secondary.into(),
		}
	}

	/// The resource part.
	pub fn primary(&self) -> &str {
		&self.primary
	}

	/// The id or parameter part.
	pub fn secondary(&self) -> &str {
		&self.secondary
	}
}

impl std::fmt::Display for CompositeKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.primary, self.secondary)
	}
}
