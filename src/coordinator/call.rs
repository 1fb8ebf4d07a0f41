//! Attach + expiry-detection path for coordinated calls.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	coordinator::{Coordinator, gate::ExpiryAction},
	error::TerminationCause,
	http::{CallRequest, CallResponse, CallTransport, PreparedCall, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const AUTHORIZATION_HEADER: &str = "Authorization";

impl<C, M> Coordinator<C, M>
where
	C: ?Sized + CallTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Executes a call with credential attachment, expiry detection, and transparent
	/// renewal.
	///
	/// Callers cannot distinguish a first-try success from a success after a renewal cycle;
	/// only terminal outcomes surface: transport failures, a terminated session, or a
	/// replay that was rejected a second time. Anonymous calls (empty store) bypass attach
	/// and expiry handling entirely, so a 401 on the login call comes back as an ordinary
	/// response.
	pub async fn execute(&self, request: CallRequest) -> Result<CallResponse> {
		const KIND: FlowKind = FlowKind::Call;

		let span = FlowSpan::new(KIND, "execute");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				match self.store.get().await {
					None => self.dispatch(&request, None).await,
					Some(credential) => self.run_authenticated(request, credential).await,
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn run_authenticated(
		&self,
		request: CallRequest,
		credential: Credential,
	) -> Result<CallResponse> {
		let response = self.dispatch(&request, Some(&credential)).await?;

		if !self.descriptor.is_expiry_status(response.status) {
			return Ok(response);
		}
		// An expiry signal from the renewal endpoint itself must not recurse into renewal.
		if self.descriptor.is_renewal_destination(&request) {
			return self
				.terminate_cycle(TerminationCause::RenewalRejected { status: response.status })
				.await;
		}

		let Some(renewal_token) = credential.renewal_token else {
			return self.terminate_cycle(TerminationCause::MissingRenewalToken).await;
		};
		// One lock acquisition decides lead vs. follow; no await happens while it is held.
		let action = self.gate.lock().admit(request);

		match action {
			ExpiryAction::Lead { request } => self.lead_renewal(request, renewal_token).await,
			ExpiryAction::Follow { settled } => {
				self.renewal_metrics.record_enqueued();

				self.follow_renewal(settled).await
			},
		}
	}

	/// Re-issues an original request with the renewed credential.
	///
	/// A second expiry signal here is terminal for the call; renewal is never re-entered.
	pub(crate) async fn replay(
		&self,
		request: CallRequest,
		credential: &Credential,
	) -> Result<CallResponse> {
		self.renewal_metrics.record_replayed();

		let response = self.dispatch_attempt(&request, Some(credential), 2).await?;

		if self.descriptor.is_expiry_status(response.status) {
			return Err(Error::ReplayRejected { status: response.status });
		}

		Ok(response)
	}

	async fn dispatch(
		&self,
		request: &CallRequest,
		credential: Option<&Credential>,
	) -> Result<CallResponse> {
		self.dispatch_attempt(request, credential, 1).await
	}

	async fn dispatch_attempt(
		&self,
		request: &CallRequest,
		credential: Option<&Credential>,
		attempt: u8,
	) -> Result<CallResponse> {
		#[cfg(feature = "tracing")]
		tracing::debug!(
			method = %request.method,
			path = %request.path,
			attempt,
			authenticated = credential.is_some(),
			"Dispatching call.",
		);
		#[cfg(not(feature = "tracing"))]
		let _ = attempt;

		let prepared = self.prepare(request, credential)?;

		self.transport
			.execute(prepared)
			.await
			.map_err(|err| Error::Transport(self.transport_mapper.map_transport_error(err)))
	}

	fn prepare(
		&self,
		request: &CallRequest,
		credential: Option<&Credential>,
	) -> Result<PreparedCall> {
		let url = self.descriptor.destination_url(&request.path)?;
		let mut headers = request.headers.clone();

		if let Some(credential) = credential {
			headers.push((
				AUTHORIZATION_HEADER.into(),
				format!("{} {}", self.descriptor.auth_scheme, credential.access_token.expose()),
			));
		}

		Ok(PreparedCall {
			url,
			method: request.method,
			headers,
			body: request.body.clone(),
			bounded_wait: request.bounded_wait.or(Some(self.descriptor.call_timeout)),
		})
	}
}
