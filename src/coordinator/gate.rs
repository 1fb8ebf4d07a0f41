// self
use crate::{
	_prelude::*,
	coordinator::queue::{PendingCall, RequestQueue, Settlement},
	http::CallRequest,
};

/// Renewal cycle states guarded by the coordinator's gate mutex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum RenewalState {
	/// No renewal in progress.
	#[default]
	Idle,
	/// Exactly one renewal call outstanding.
	Renewing,
}

/// The renewal state flag and the pending-call queue, mutated only while the gate mutex is
/// held. [`admit`](RenewalGate::admit) is one synchronous step with no await inside, so no
/// two calls can both observe `Idle` and both start a renewal.
#[derive(Debug, Default)]
pub(crate) struct RenewalGate {
	state: RenewalState,
	queue: RequestQueue,
}
impl RenewalGate {
	/// Decides what a call that observed an expiry signal must do.
	pub(crate) fn admit(&mut self, request: CallRequest) -> ExpiryAction {
		match self.state {
			RenewalState::Idle => {
				self.state = RenewalState::Renewing;

				ExpiryAction::Lead { request }
			},
			RenewalState::Renewing => {
				let (settle, settled) = oneshot::channel();

				self.queue.enqueue(PendingCall::new(request, settle));

				ExpiryAction::Follow { settled }
			},
		}
	}

	/// Ends the cycle: returns the queue for draining and reopens the gate.
	pub(crate) fn finish(&mut self) -> RequestQueue {
		self.state = RenewalState::Idle;

		std::mem::take(&mut self.queue)
	}

	pub(crate) fn is_renewing(&self) -> bool {
		self.state == RenewalState::Renewing
	}

	#[cfg(test)]
	pub(crate) fn pending(&self) -> usize {
		self.queue.len()
	}
}

/// Decision handed back to a call that observed an expiry signal.
pub(crate) enum ExpiryAction {
	/// The caller won the `Idle → Renewing` transition and must run the renewal cycle.
	Lead {
		/// The triggering request, held by its caller pending the outcome.
		request: CallRequest,
	},
	/// A renewal is already in flight; the caller waits for its settlement.
	Follow {
		/// Receiver resolved when the in-flight cycle drains the queue.
		settled: oneshot::Receiver<Settlement>,
	},
}
