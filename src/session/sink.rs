//! Session lifecycle signals delivered to the host application.

// self
use crate::error::TerminationCause;

/// Receiver for session lifecycle signals.
///
/// The coordinator fires [`on_session_terminated`](SessionEventSink::on_session_terminated)
/// exactly once per failed renewal cycle, after every blocked caller has been settled.
/// Hosts typically redirect the user to re-authentication and reset UI state; neither is
/// the broker's concern.
pub trait SessionEventSink
where
	Self: Send + Sync,
{
	/// Called once per failed renewal cycle with the shared terminal cause.
	fn on_session_terminated(&self, cause: &TerminationCause);
}

/// Sink that ignores every signal; the default for coordinators built without one.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventSink;
impl SessionEventSink for NoopEventSink {
	fn on_session_terminated(&self, _: &TerminationCause) {}
}

impl<F> SessionEventSink for F
where
	F: Fn(&TerminationCause) + Send + Sync,
{
	fn on_session_terminated(&self, cause: &TerminationCause) {
		self(cause)
	}
}
