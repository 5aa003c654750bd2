//! Representation selection from the requested view name.

use crate::config::RepresentationTokens;

/// Which view of a resource a request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
	Ref,
	Default,
	Full,
	/// A caller-supplied field selection, with the custom prefix removed.
	Custom(String),
	/// A view registered under a name by the resource itself.
	Named(String),
}

impl RepresentationTokens {
	/// Maps the requested view name onto a [`Representation`].
	pub fn parse(&self, requested: Option<&str>) -> Representation {
		let Some(requested) = requested.filter(|r| !r.is_empty()) else {
			return Representation::Default;
		};

		if requested == self.reference {
			Representation::Ref
		} else if requested == self.default {
			Representation::Default
		} else if requested == self.full {
			Representation::Full
		} else if let Some(fields) = requested.strip_prefix(self.custom_prefix.as_str()) {
			Representation::Custom(fields.to_string())
		} else {
			Representation::Named(requested.to_string())
		}
	}
}
