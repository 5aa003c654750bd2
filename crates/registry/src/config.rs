//! Registry configuration loaded from TOML.
//!
//! ```toml
//! platform-version = "2.4.1"
//! search-id-parameter = "s"
//! reserved-parameters = ["v", "s", "startIndex", "limit", "t", "includeAll", "totalCount"]
//!
//! [representation]
//! reference = "ref"
//! default = "default"
//! full = "full"
//! custom-prefix = "custom:"
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Platform version used when none is configured.
///
/// Below every real release, so only requirements such as `0.*` admit a
/// declaration under it.
pub const UNSET_PLATFORM_VERSION: &str = "0.0.0";

/// Reserved request parameters that never select a search handler.
pub const DEFAULT_RESERVED_PARAMETERS: &[&str] = &["v", "s", "startIndex", "limit", "t", "includeAll", "totalCount"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("invalid registry config: {0}")]
	Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegistryConfig {
	/// Version of the running platform, matched against declared supported versions.
	/// Unset falls back to [`UNSET_PLATFORM_VERSION`].
	pub platform_version: Option<String>,
	/// Request parameter carrying an explicit search handler id.
	pub search_id_parameter: String,
	/// Request parameters excluded from search parameter matching.
	pub reserved_parameters: Vec<String>,
	pub representation: RepresentationTokens,
}

impl Default for RegistryConfig {
	fn default() -> Self {
		Self {
			platform_version: None,
			search_id_parameter: "s".to_string(),
			reserved_parameters: DEFAULT_RESERVED_PARAMETERS.iter().map(|p| p.to_string()).collect(),
			representation: RepresentationTokens::default(),
		}
	}
}

impl RegistryConfig {
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(content)?)
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let config = Self::from_toml_str(&content)?;
		tracing::debug!(
			domain = "config",
			path = %path.display(),
			platform_version = config.platform_version(),
			"loaded registry config"
		);
		Ok(config)
	}

	pub fn with_platform_version(mut self, version: impl Into<String>) -> Self {
		self.platform_version = Some(version.into());
		self
	}

	/// The configured platform version, or [`UNSET_PLATFORM_VERSION`].
	pub fn platform_version(&self) -> &str {
		self.platform_version.as_deref().unwrap_or(UNSET_PLATFORM_VERSION)
	}

	/// Reserved parameter names, always including the search id parameter.
	pub fn reserved(&self) -> impl Iterator<Item = &str> {
		self.reserved_parameters
			.iter()
			.map(String::as_str)
			.chain(std::iter::once(self.search_id_parameter.as_str()))
	}
}

/// Request tokens selecting the built-in representations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RepresentationTokens {
	pub reference: String,
	pub default: String,
	pub full: String,
	pub custom_prefix: String,
}

impl Default for RepresentationTokens {
	fn default() -> Self {
		Self {
			reference: "ref".to_string(),
			default: "default".to_string(),
			full: "full".to_string(),
			custom_prefix: "custom:".to_string(),
		}
	}
}
