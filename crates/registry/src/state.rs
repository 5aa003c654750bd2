//! Snapshot publication shared by both registries.
//!
//! # Invariants
//!
//! - A snapshot is published with a single pointer store after its build
//!   completed; readers never observe a partially built snapshot.
//! - A failed build publishes nothing, the slot keeps whatever it held.
//! - Published snapshots are never mutated.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::error::Result;

/// Observable lifecycle of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
	Uninitialized,
	Ready,
}

pub(crate) struct SnapshotCell<S> {
	label: &'static str,
	slot: ArcSwapOption<S>,
}

impl<S> SnapshotCell<S> {
	pub(crate) fn new(label: &'static str) -> Self {
		Self {
			label,
			slot: ArcSwapOption::empty(),
		}
	}

	pub(crate) fn state(&self) -> RegistryState {
		if self.slot.load().is_some() {
			RegistryState::Ready
		} else {
			RegistryState::Uninitialized
		}
	}

	pub(crate) fn load(&self) -> Option<Arc<S>> {
		self.slot.load_full()
	}

	pub(crate) fn reset(&self) {
		self.slot.store(None);
	}

	/// Returns the published snapshot, building and publishing one if the slot is empty.
	///
	/// Concurrent callers racing on an empty slot may each build; the last store wins.
	pub(crate) fn get_or_build(&self, build: impl FnOnce() -> Result<S>) -> Result<Arc<S>> {
		if let Some(snap) = self.slot.load_full() {
			return Ok(snap);
		}

		let snap = Arc::new(build().inspect_err(|error| {
			tracing::error!(registry = self.label, %error, "registry build failed");
		})?);
		self.slot.store(Some(snap.clone()));
		Ok(snap)
	}
}
