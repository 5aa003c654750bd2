//! Platform version requirement matching.
//!
//! Registry declarations name the platform versions they apply to with
//! required-version expressions. An expression is a comma-separated list of
//! terms, and a term is one of:
//!
//! | Term | Meaning |
//! |------|---------|
//! | `1.9.0` | the platform is at least `1.9.0` |
//! | `1.9.*`, `1.9.x` | any `1.9` release |
//! | `1.9.0 - 1.11.*` | inclusive range, wildcards widen the bound |
//!
//! Qualifiers such as `-SNAPSHOT` are ignored on both sides of a comparison.

use std::cmp::Ordering;

/// Decides whether a declared version requirement applies to the running platform.
pub trait VersionFilter: Send + Sync {
	/// Returns true if `current` satisfies the required-version expression `declared`.
	fn matches(&self, current: &str, declared: &str) -> bool;
}

/// Returns true if any of `declared` matches `current`.
///
/// An empty declaration list never matches.
pub fn any_matches<F, I, S>(filter: &F, current: &str, declared: I) -> bool
where
	F: VersionFilter + ?Sized,
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	declared.into_iter().any(|expr| filter.matches(current, expr.as_ref()))
}

/// Errors produced while parsing a version or a requirement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
	#[error("empty version")]
	Empty,
	#[error("invalid version segment {segment:?} in {version:?}")]
	InvalidSegment { version: String, segment: String },
	#[error("wildcard is not allowed in {0:?}")]
	UnexpectedWildcard(String),
}

/// Default [`VersionFilter`] understanding plain, wildcard and range terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredVersions;

impl VersionFilter for RequiredVersions {
	fn matches(&self, current: &str, declared: &str) -> bool {
		let current = match Version::parse(current) {
			Ok(v) => v,
			Err(error) => {
				tracing::warn!(domain = "versions", %error, current, "unparseable platform version");
				return false;
			}
		};

		match Requirement::parse_list(declared) {
			Ok(terms) => terms.iter().any(|term| term.admits(&current)),
			Err(error) => {
				tracing::warn!(domain = "versions", %error, declared, "ignoring malformed version requirement");
				false
			}
		}
	}
}

/// A concrete version: numeric segments with the qualifier stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
	segments: Vec<u64>,
}

impl Version {
	/// Parses a version without wildcards.
	pub fn parse(input: &str) -> Result<Self, VersionError> {
		let pattern = Pattern::parse(input)?;
		if pattern.has_wildcard() {
			return Err(VersionError::UnexpectedWildcard(input.trim().to_string()));
		}
		Ok(pattern.fill(0))
	}

	pub fn segments(&self) -> &[u64] {
		&self.segments
	}
}

impl PartialOrd for Version {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Version {
	fn cmp(&self, other: &Self) -> Ordering {
		let len = self.segments.len().max(other.segments.len());
		(0..len)
			.map(|i| {
				let a = self.segments.get(i).copied().unwrap_or(0);
				let b = other.segments.get(i).copied().unwrap_or(0);
				a.cmp(&b)
			})
			.find(|ord| ord.is_ne())
			.unwrap_or(Ordering::Equal)
	}
}

impl std::fmt::Display for Version {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut first = true;
		for seg in &self.segments {
			if !first {
				f.write_str(".")?;
			}
			first = false;
			write!(f, "{seg}")?;
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
	Number(u64),
	Wildcard,
}

/// A version that may contain wildcard segments.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pattern {
	segments: Vec<Segment>,
}

impl Pattern {
	fn parse(input: &str) -> Result<Self, VersionError> {
		let trimmed = input.trim();
		let numeric = trimmed.split_once('-').map_or(trimmed, |(head, _qualifier)| head).trim();
		if numeric.is_empty() {
			return Err(VersionError::Empty);
		}

		let segments = numeric
			.split('.')
			.map(|seg| match seg {
				"*" | "x" | "X" => Ok(Segment::Wildcard),
				_ => seg.parse::<u64>().map(Segment::Number).map_err(|_| VersionError::InvalidSegment {
					version: trimmed.to_string(),
					segment: seg.to_string(),
				}),
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self { segments })
	}

	fn has_wildcard(&self) -> bool {
		self.segments.contains(&Segment::Wildcard)
	}

	/// Replaces wildcards with `fill`.
	fn fill(&self, fill: u64) -> Version {
		Version {
			segments: self
				.segments
				.iter()
				.map(|seg| match seg {
					Segment::Number(n) => *n,
					Segment::Wildcard => fill,
				})
				.collect(),
		}
	}
}

/// One term of a required-version expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
	/// The platform must be at or above this version.
	AtLeast(Version),
	/// The platform must fall inside the inclusive bounds.
	Between { lower: Version, upper: Version },
}

impl Requirement {
	/// Parses a single term.
	pub fn parse(term: &str) -> Result<Self, VersionError> {
		let term = term.trim();
		if let Some((lower, upper)) = split_range(term) {
			return Ok(Self::Between {
				lower: Pattern::parse(lower)?.fill(0),
				upper: Pattern::parse(upper)?.fill(u64::MAX),
			});
		}

		let pattern = Pattern::parse(term)?;
		if pattern.has_wildcard() {
			Ok(Self::Between {
				lower: pattern.fill(0),
				upper: pattern.fill(u64::MAX),
			})
		} else {
			Ok(Self::AtLeast(pattern.fill(0)))
		}
	}

	/// Parses a comma-separated list of terms, skipping blank entries.
	pub fn parse_list(expr: &str) -> Result<Vec<Self>, VersionError> {
		let terms = expr
			.split(',')
			.filter(|t| !t.trim().is_empty())
			.map(Self::parse)
			.collect::<Result<Vec<_>, _>>()?;
		if terms.is_empty() {
			return Err(VersionError::Empty);
		}
		Ok(terms)
	}

	/// Returns true if `version` satisfies this term.
	pub fn admits(&self, version: &Version) -> bool {
		match self {
			Self::AtLeast(min) => version >= min,
			Self::Between { lower, upper } => version >= lower && version <= upper,
		}
	}
}

/// Splits `a - b` or `a-b` into bounds, leaving qualifiers like `1.9.0-SNAPSHOT` alone.
fn split_range(term: &str) -> Option<(&str, &str)> {
	if let Some((lower, upper)) = term.split_once(" - ") {
		return Some((lower, upper));
	}
	let (lower, upper) = term.split_once('-')?;
	upper
		.trim_start()
		.starts_with(|c: char| c.is_ascii_digit())
		.then_some((lower, upper))
}
