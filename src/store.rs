//! Storage contracts and built-in store implementations for the session credential pair.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Persistence contract for the current credential pair.
///
/// The coordinator is the only writer; callers read through the coordinator when attaching
/// credentials. `get` carries no error channel: an unavailable backing medium yields `None`
/// and the session is treated as unauthenticated.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the current credential pair, if one is stored and readable.
	fn get(&self) -> StoreFuture<'_, Option<Credential>>;

	/// Replaces both tokens; no reader observes a mixed old/new pair.
	fn set(&self, credential: Credential) -> StoreFuture<'_, Result<(), StoreError>>;

	/// Removes both tokens; idempotent.
	fn clear(&self) -> StoreFuture<'_, Result<(), StoreError>>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
