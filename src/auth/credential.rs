//! The access/renewal credential pair owned by the session.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Credential pair attached to outgoing calls and rotated by the coordinator.
///
/// The access token authorizes individual calls and is considered current only while the
/// coordinator holds it; a superseded access token is never attached to a new call. The
/// renewal token, when present, is used solely to obtain a fresh access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Short-lived token authorizing individual calls; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Longer-lived token exchanged for a fresh access token, if one was issued.
	pub renewal_token: Option<TokenSecret>,
}
impl Credential {
	/// Creates a credential carrying both tokens.
	pub fn new(access_token: impl Into<String>, renewal_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			renewal_token: Some(TokenSecret::new(renewal_token)),
		}
	}

	/// Creates a credential that can authorize calls but can never be renewed.
	pub fn access_only(access_token: impl Into<String>) -> Self {
		Self { access_token: TokenSecret::new(access_token), renewal_token: None }
	}

	/// Returns `true` if the credential carries a renewal token.
	pub fn has_renewal_token(&self) -> bool {
		self.renewal_token.is_some()
	}
}
