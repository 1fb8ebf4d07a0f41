//! The authenticated-session coordinator: credential attachment, expiry detection, and
//! single-flight renewal with FIFO replay.

mod call;
mod gate;
pub mod queue;
pub mod renewal;

pub use renewal::RenewalMetrics;

// self
use crate::{
	_prelude::*,
	http::{CallTransport, TransportErrorMapper},
	session::{NoopEventSink, SessionDescriptor, SessionEventSink},
	store::{CredentialStore, StoreError},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestTransport, ReqwestTransportErrorMapper};
use gate::RenewalGate;

#[cfg(feature = "reqwest")]
/// Coordinator specialized for the crate's default reqwest transport stack.
pub type ReqwestCoordinator = Coordinator<ReqwestTransport, ReqwestTransportErrorMapper>;

/// Coordinates authenticated calls against a single session descriptor.
///
/// The coordinator owns the transport, credential store, descriptor, and event sink so the
/// call and renewal paths can focus on the state machine. It exclusively owns the renewal
/// gate (state flag + pending queue); callers never touch either directly, and the store is
/// written only from inside a renewal cycle. Clones share all of this state, so one
/// coordinator can back any number of concurrent callers.
#[derive(Clone)]
pub struct Coordinator<C, M>
where
	C: ?Sized + CallTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Transport used for every outbound call.
	pub transport: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Credential store; read at attach time, written only by renewal cycles.
	pub store: Arc<dyn CredentialStore>,
	/// Session descriptor defining endpoints, expiry policy, and bounded waits.
	pub descriptor: SessionDescriptor,
	/// Sink receiving the session-terminated signal.
	pub event_sink: Arc<dyn SessionEventSink>,
	/// Shared metrics recorder for renewal cycle outcomes.
	pub renewal_metrics: Arc<RenewalMetrics>,
	gate: Arc<Mutex<RenewalGate>>,
}
impl<C, M> Coordinator<C, M>
where
	C: ?Sized + CallTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a coordinator that reuses the caller-provided transport + mapper pair.
	pub fn with_transport(
		store: Arc<dyn CredentialStore>,
		descriptor: SessionDescriptor,
		transport: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			transport: transport.into(),
			transport_mapper: mapper.into(),
			store,
			descriptor,
			event_sink: Arc::new(NoopEventSink),
			renewal_metrics: Default::default(),
			gate: Default::default(),
		}
	}

	/// Sets or replaces the session event sink.
	pub fn with_event_sink(mut self, sink: Arc<dyn SessionEventSink>) -> Self {
		self.event_sink = sink;

		self
	}

	/// Returns `true` while a renewal cycle is in flight.
	pub fn renewal_in_flight(&self) -> bool {
		self.gate.lock().is_renewing()
	}
}
#[cfg(feature = "reqwest")]
impl Coordinator<ReqwestTransport, ReqwestTransportErrorMapper> {
	/// Creates a new coordinator for the provided store and descriptor.
	///
	/// The coordinator provisions its own reqwest-backed transport so callers do not need
	/// to pass HTTP handles explicitly. Use [`Coordinator::with_event_sink`] to receive the
	/// session-terminated signal.
	pub fn new(store: Arc<dyn CredentialStore>, descriptor: SessionDescriptor) -> Self {
		Self::with_transport(
			store,
			descriptor,
			ReqwestTransport::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for Coordinator<C, M>
where
	C: ?Sized + CallTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Coordinator")
			.field("descriptor", &self.descriptor)
			.field("renewal_in_flight", &self.renewal_in_flight())
			.finish()
	}
}

pub(crate) fn note_store_failure(stage: &'static str, err: &StoreError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(stage, error = %err, "Credential store operation failed.");
	#[cfg(not(feature = "tracing"))]
	let _ = (stage, err);
}
