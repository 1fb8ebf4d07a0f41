// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for renewal cycle activity.
#[derive(Debug, Default)]
pub struct RenewalMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	enqueued: AtomicU64,
	replayed: AtomicU64,
}
impl RenewalMetrics {
	/// Returns the total number of renewal cycles started.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of renewal cycles that produced a fresh credential.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of renewal cycles that terminated the session.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that queued behind an in-flight cycle.
	pub fn enqueued(&self) -> u64 {
		self.enqueued.load(Ordering::Relaxed)
	}

	/// Returns the number of calls replayed after a successful cycle.
	pub fn replayed(&self) -> u64 {
		self.replayed.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_enqueued(&self) {
		self.enqueued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_replayed(&self) {
		self.replayed.fetch_add(1, Ordering::Relaxed);
	}
}
