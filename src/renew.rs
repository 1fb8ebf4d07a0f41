//! Renewal endpoint wire contract.
//!
//! A renewal is one `POST` to the descriptor's renewal endpoint carrying the current
//! renewal token as `{"refresh_token": "..."}`. A successful exchange is a 2xx JSON body
//! with a fresh `access_token` and, optionally, a fresh `refresh_token`; any other shape
//! is treated as a cycle failure. Response bodies are never interpreted beyond this.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::TerminationCause,
	http::{CallResponse, Method, PreparedCall},
	session::SessionDescriptor,
};

/// Token pair returned by a successful renewal exchange.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenGrant {
	/// Fresh access token; must be non-empty.
	pub access_token: String,
	/// Fresh renewal token, when the endpoint rotates it.
	#[serde(default)]
	pub refresh_token: Option<String>,
}

/// Builds the prepared renewal call for the descriptor's renewal endpoint.
///
/// The call carries no authorization header: the renewal token in the body is the sole
/// proof of identity, and attaching the expired access token would only confuse upstream
/// middleware.
pub(crate) fn renewal_call(
	descriptor: &SessionDescriptor,
	renewal_token: &TokenSecret,
) -> PreparedCall {
	let body = serde_json::json!({ "refresh_token": renewal_token.expose() })
		.to_string()
		.into_bytes();

	PreparedCall {
		url: descriptor.renewal_url().clone(),
		method: Method::Post,
		headers: vec![("Content-Type".into(), "application/json".into())],
		body: Some(body),
		bounded_wait: Some(descriptor.renewal_timeout),
	}
}

/// Interprets the renewal endpoint's response, rejecting anything but the documented shape.
pub(crate) fn parse_grant(response: &CallResponse) -> Result<TokenGrant, TerminationCause> {
	if !response.is_success() {
		return Err(TerminationCause::RenewalRejected { status: response.status });
	}

	let grant: TokenGrant = response
		.json()
		.map_err(|err| TerminationCause::MalformedRenewalResponse { message: err.to_string() })?;

	if grant.access_token.is_empty() {
		return Err(TerminationCause::MalformedRenewalResponse {
			message: "access_token is empty".into(),
		});
	}

	Ok(grant)
}
