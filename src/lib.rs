//! Rust’s turnkey authenticated-session coordinator—attach bearer credentials, renew them
//! exactly once under concurrency, and replay every blocked call in one crate built for
//! production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod obs;
pub mod renew;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	pub use crate::{
		auth::Credential,
		coordinator::Coordinator,
		error::TerminationCause,
		http::{ReqwestTransport, ReqwestTransportErrorMapper},
		session::{SessionDescriptor, SessionEventSink},
		store::{CredentialStore, MemoryStore},
	};

	/// Coordinator type alias used by reqwest-backed integration tests.
	pub type ReqwestTestCoordinator = Coordinator<ReqwestTransport, ReqwestTransportErrorMapper>;

	/// Event sink that records every termination cause it observes.
	#[derive(Debug, Default)]
	pub struct RecordingEventSink(Mutex<Vec<TerminationCause>>);
	impl RecordingEventSink {
		/// Returns a snapshot of the causes recorded so far.
		pub fn causes(&self) -> Vec<TerminationCause> {
			self.0.lock().clone()
		}
	}
	impl SessionEventSink for RecordingEventSink {
		fn on_session_terminated(&self, cause: &TerminationCause) {
			self.0.lock().push(cause.clone());
		}
	}

	/// Builds a descriptor pointed at a mock server with the renewal endpoint the tests expect.
	pub fn test_descriptor(base_url: &str) -> SessionDescriptor {
		SessionDescriptor::builder(
			Url::parse(base_url).expect("Mock base URL should parse successfully."),
		)
		.renewal_path("/auth/renew")
		.build()
		.expect("Session descriptor fixture should build successfully.")
	}

	/// Constructs a [`Coordinator`] backed by an in-memory store, a recording event sink, and the
	/// reqwest transport used across integration tests.
	pub fn build_reqwest_test_coordinator(
		descriptor: SessionDescriptor,
		credential: Option<Credential>,
	) -> (ReqwestTestCoordinator, Arc<MemoryStore>, Arc<RecordingEventSink>) {
		let store_backend = match credential {
			Some(credential) => Arc::new(MemoryStore::with_credential(credential)),
			None => Arc::new(MemoryStore::default()),
		};
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let sink_backend = Arc::new(RecordingEventSink::default());
		let sink: Arc<dyn SessionEventSink> = sink_backend.clone();
		let coordinator = Coordinator::new(store, descriptor).with_event_sink(sink);

		(coordinator, store_backend, sink_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::VecDeque,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use tokio::sync::oneshot;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use session_broker as _;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
