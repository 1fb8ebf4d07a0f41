//! FIFO queue of calls blocked behind an in-flight renewal cycle.
//!
//! Every entry is settled exactly once when the cycle resolves: replayed with the renewed
//! credential on success, rejected with the shared terminal cause on failure. [`drain`]
//! leaves the queue empty on every path, including callers that abandoned their receiver.
//!
//! [`drain`]: RequestQueue::drain

// self
use crate::{_prelude::*, auth::Credential, error::TerminationCause, http::CallRequest};

/// A call held while a renewal cycle is in flight.
///
/// Owns the original request for the duration of the block; the request is handed back to
/// its caller inside [`Settlement::Replay`] or dropped with [`Settlement::Reject`].
#[derive(Debug)]
pub struct PendingCall {
	request: CallRequest,
	settle: oneshot::Sender<Settlement>,
}
impl PendingCall {
	/// Pairs a blocked request with the sender that will deliver its settlement.
	pub fn new(request: CallRequest, settle: oneshot::Sender<Settlement>) -> Self {
		Self { request, settle }
	}
}

/// Outcome of a finished renewal cycle, applied uniformly to every queued call.
#[derive(Clone, Debug)]
pub enum CycleOutcome {
	/// Renewal succeeded; queued calls replay with this credential.
	Renewed(Credential),
	/// Renewal failed; queued calls reject with this cause.
	Terminated(TerminationCause),
}

/// Settlement delivered to each blocked caller.
#[derive(Debug)]
pub enum Settlement {
	/// Re-issue the original request with the renewed credential.
	Replay {
		/// The original request, returned to its caller for the replay.
		request: CallRequest,
		/// Credential produced by the renewal that unblocked this call.
		credential: Credential,
	},
	/// The cycle failed; the call rejects with the shared cause.
	Reject {
		/// Terminal cause, identical for every caller of the cycle.
		cause: TerminationCause,
	},
}

/// FIFO queue of [`PendingCall`] entries held while a renewal is in flight.
#[derive(Debug, Default)]
pub struct RequestQueue(VecDeque<PendingCall>);
impl RequestQueue {
	/// Appends a call behind every previously blocked call.
	pub fn enqueue(&mut self, call: PendingCall) {
		self.0.push_back(call);
	}

	/// Returns the number of blocked calls.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no calls are blocked.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Settles every entry in enqueue order, then leaves the queue empty.
	///
	/// Abandoned callers (dropped receivers) are still drained; their settlements are
	/// discarded.
	pub fn drain(&mut self, outcome: &CycleOutcome) {
		for call in self.0.drain(..) {
			let settlement = match outcome {
				CycleOutcome::Renewed(credential) =>
					Settlement::Replay { request: call.request, credential: credential.clone() },
				CycleOutcome::Terminated(cause) =>
					Settlement::Reject { cause: cause.clone() },
			};

			let _ = call.settle.send(settlement);
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn blocked(path: &str) -> (PendingCall, oneshot::Receiver<Settlement>) {
		let (settle, settled) = oneshot::channel();

		(PendingCall::new(CallRequest::get(path), settle), settled)
	}

	#[test]
	fn drain_replays_every_entry_with_the_renewed_credential() {
		let mut queue = RequestQueue::default();
		let (call_a, settled_a) = blocked("/a");
		let (call_b, settled_b) = blocked("/b");
		let (call_c, settled_c) = blocked("/c");

		queue.enqueue(call_a);
		queue.enqueue(call_b);
		queue.enqueue(call_c);
		queue.drain(&CycleOutcome::Renewed(Credential::new("t2", "r2")));

		assert!(queue.is_empty());

		for (mut settled, path) in [(settled_a, "/a"), (settled_b, "/b"), (settled_c, "/c")] {
			match settled.try_recv().expect("Every drained entry should be settled.") {
				Settlement::Replay { request, credential } => {
					assert_eq!(request.path, path);
					assert_eq!(credential.access_token.expose(), "t2");
				},
				Settlement::Reject { .. } => panic!("Renewed cycles should never reject."),
			}
		}
	}

	#[test]
	fn drain_rejects_every_entry_with_the_same_cause() {
		let mut queue = RequestQueue::default();
		let (call_a, settled_a) = blocked("/a");
		let (call_b, settled_b) = blocked("/b");
		let cause = TerminationCause::RenewalRejected { status: 401 };

		queue.enqueue(call_a);
		queue.enqueue(call_b);
		queue.drain(&CycleOutcome::Terminated(cause.clone()));

		assert!(queue.is_empty());

		for mut settled in [settled_a, settled_b] {
			match settled.try_recv().expect("Every drained entry should be settled.") {
				Settlement::Reject { cause: delivered } => assert_eq!(delivered, cause),
				Settlement::Replay { .. } => panic!("Terminated cycles should never replay."),
			}
		}
	}

	#[test]
	fn abandoned_callers_do_not_block_the_drain() {
		let mut queue = RequestQueue::default();
		let (call_a, settled_a) = blocked("/a");
		let (call_b, mut settled_b) = blocked("/b");

		drop(settled_a);
		queue.enqueue(call_a);
		queue.enqueue(call_b);
		queue.drain(&CycleOutcome::Renewed(Credential::new("t2", "r2")));

		assert!(queue.is_empty());
		assert!(matches!(settled_b.try_recv(), Ok(Settlement::Replay { .. })));
	}
}
