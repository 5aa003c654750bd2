//! Candidate discovery.

use super::ResourceCandidate;

/// Failure to enumerate resource candidates.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error("{0}")]
	Other(String),
}

/// Enumerates every resource implementation the registry may consider.
pub trait ResourceScanner: Send + Sync {
	fn discover(&self) -> Result<Vec<ResourceCandidate>, DiscoveryError>;
}

/// Link-time registration of a [`ResourceCandidate`].
pub struct ResourceReg(pub &'static ResourceCandidate);
inventory::collect!(ResourceReg);

/// Scanner over every [`ResourceReg`] submitted through [`inventory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryScanner;

impl ResourceScanner for InventoryScanner {
	fn discover(&self) -> Result<Vec<ResourceCandidate>, DiscoveryError> {
		Ok(inventory::iter::<ResourceReg>.into_iter().map(|reg| *reg.0).collect())
	}
}

/// Scanner over an explicit candidate list.
#[derive(Debug, Clone, Default)]
pub struct StaticScanner {
	candidates: Vec<ResourceCandidate>,
}

impl StaticScanner {
	pub fn new(candidates: impl IntoIterator<Item = ResourceCandidate>) -> Self {
		Self {
			candidates: candidates.into_iter().collect(),
		}
	}

	pub fn with(mut self, candidate: ResourceCandidate) -> Self {
		self.candidates.push(candidate);
		self
	}
}

impl ResourceScanner for StaticScanner {
	fn discover(&self) -> Result<Vec<ResourceCandidate>, DiscoveryError> {
		Ok(self.candidates.clone())
	}
}
