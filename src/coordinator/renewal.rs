//! Renewal cycle orchestration with a single-flight gate, FIFO replay, and metrics.
//!
//! The call that wins the `Idle → Renewing` transition leads the cycle: it performs the one
//! renewal call, persists (or clears) the credential store, drains the queue of followers,
//! and finally replays its own request. Followers never touch the store or the renewal
//! endpoint; they wait on their settlement and replay or reject accordingly. A failed cycle
//! settles everyone with one shared [`TerminationCause`] and fires the session-terminated
//! signal exactly once, after the queue has drained.

mod metrics;

pub use metrics::RenewalMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	coordinator::{
		Coordinator,
		gate::RenewalGate,
		note_store_failure,
		queue::{CycleOutcome, RequestQueue, Settlement},
	},
	error::{TerminationCause, TransportError},
	http::{CallRequest, CallResponse, CallTransport, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	renew,
};

impl<C, M> Coordinator<C, M>
where
	C: ?Sized + CallTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Runs one renewal cycle on behalf of the triggering call.
	pub(crate) async fn lead_renewal(
		&self,
		request: CallRequest,
		renewal_token: TokenSecret,
	) -> Result<CallResponse> {
		let cycle = CycleGuard::new(&self.gate);

		match self.perform_renewal(&renewal_token).await {
			Ok(credential) => {
				// Persisted before the gate reopens so later calls attach the new token;
				// this cycle's replays carry the in-hand credential either way.
				if let Err(err) = self.store.set(credential.clone()).await {
					note_store_failure("set", &err);
				}

				let mut queue = cycle.finish();

				queue.drain(&CycleOutcome::Renewed(credential.clone()));

				self.replay(request, &credential).await
			},
			Err(cause) => {
				cycle.defuse();

				self.terminate_cycle(cause).await
			},
		}
	}

	/// Waits behind the in-flight cycle and acts on its settlement.
	pub(crate) async fn follow_renewal(
		&self,
		settled: oneshot::Receiver<Settlement>,
	) -> Result<CallResponse> {
		match settled.await {
			Ok(Settlement::Replay { request, credential }) =>
				self.replay(request, &credential).await,
			Ok(Settlement::Reject { cause }) => Err(Error::SessionTerminated { cause }),
			Err(_) =>
				Err(Error::SessionTerminated { cause: TerminationCause::RenewalInterrupted }),
		}
	}

	/// Fails the current cycle: clears the store, drains the queue with a uniform cause,
	/// then fires the session-terminated signal.
	pub(crate) async fn terminate_cycle(&self, cause: TerminationCause) -> Result<CallResponse> {
		if let Err(err) = self.store.clear().await {
			note_store_failure("clear", &err);
		}

		let mut queue = self.gate.lock().finish();

		queue.drain(&CycleOutcome::Terminated(cause.clone()));
		self.event_sink.on_session_terminated(&cause);

		Err(Error::SessionTerminated { cause })
	}

	async fn perform_renewal(
		&self,
		renewal_token: &TokenSecret,
	) -> Result<Credential, TerminationCause> {
		const KIND: FlowKind = FlowKind::Renewal;

		let span = FlowSpan::new(KIND, "perform_renewal");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.renewal_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let call = renew::renewal_call(&self.descriptor, renewal_token);
				let response = match self.transport.execute(call).await {
					Ok(response) => response,
					Err(err) =>
						return Err(match self.transport_mapper.map_transport_error(err) {
							TransportError::Timeout => TerminationCause::RenewalTimedOut,
							TransportError::Network { source } =>
								TerminationCause::RenewalTransport { message: source.to_string() },
						}),
				};
				let grant = renew::parse_grant(&response)?;
				// Endpoints that do not rotate the renewal token expect the old one reused.
				let renewal_token =
					grant.refresh_token.map(TokenSecret::new).or_else(|| Some(renewal_token.clone()));

				Ok(Credential { access_token: TokenSecret::new(grant.access_token), renewal_token })
			})
			.await;

		match &result {
			Ok(_) => {
				self.renewal_metrics.record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(_) => {
				self.renewal_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}
}

/// Reopens the gate and fails queued callers if the leader's future is dropped before the
/// cycle resolves; every ordinary exit path defuses it first.
struct CycleGuard<'a> {
	gate: &'a Mutex<RenewalGate>,
	armed: bool,
}
impl<'a> CycleGuard<'a> {
	fn new(gate: &'a Mutex<RenewalGate>) -> Self {
		Self { gate, armed: true }
	}

	/// Ends the cycle normally, handing the queue to the caller for draining.
	fn finish(mut self) -> RequestQueue {
		self.armed = false;

		self.gate.lock().finish()
	}

	/// Disarms without touching the gate; the caller finishes the cycle itself.
	fn defuse(mut self) {
		self.armed = false;
	}
}
impl Drop for CycleGuard<'_> {
	fn drop(&mut self) {
		if self.armed {
			let mut queue = self.gate.lock().finish();

			queue.drain(&CycleOutcome::Terminated(TerminationCause::RenewalInterrupted));
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::coordinator::gate::ExpiryAction;

	#[test]
	fn dropped_guard_reopens_the_gate_and_rejects_followers() {
		let gate = Mutex::new(RenewalGate::default());
		let leader = gate.lock().admit(CallRequest::get("/a"));

		assert!(matches!(leader, ExpiryAction::Lead { .. }));

		let follower = gate.lock().admit(CallRequest::get("/b"));
		let ExpiryAction::Follow { mut settled } = follower else {
			panic!("Second expiry observer should follow.");
		};

		drop(CycleGuard::new(&gate));

		assert!(!gate.lock().is_renewing());
		assert!(matches!(
			settled.try_recv(),
			Ok(Settlement::Reject { cause: TerminationCause::RenewalInterrupted }),
		));
	}

	#[test]
	fn defused_guard_leaves_the_gate_untouched() {
		let gate = Mutex::new(RenewalGate::default());
		let _leader = gate.lock().admit(CallRequest::get("/a"));

		CycleGuard::new(&gate).defuse();

		assert!(gate.lock().is_renewing());
	}
}
