//! Session descriptor data structures and helpers consumed by the coordinator.
//!
//! The descriptor pins down everything the coordinator needs to know about the backend:
//! where calls go, which endpoint renews credentials, which statuses signal expiry, and
//! how long calls may wait. It is validated once at build time so the hot path never
//! re-parses URLs.

// self
use crate::{_prelude::*, error::ConfigError, http::CallRequest};

const DEFAULT_AUTH_SCHEME: &str = "Bearer";
const DEFAULT_EXPIRY_STATUS: u16 = 401;
const DEFAULT_CALL_TIMEOUT: Duration = Duration::seconds(10);
const DEFAULT_RENEWAL_TIMEOUT: Duration = Duration::seconds(10);

/// Immutable session descriptor consumed by the coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
	/// Base URL every destination path resolves against.
	pub base_url: Url,
	/// Normalized renewal endpoint path (leading slash).
	pub renewal_path: String,
	/// Authorization scheme prefixed to the access token.
	pub auth_scheme: String,
	/// Statuses interpreted as expiry signals.
	pub expiry_statuses: Vec<u16>,
	/// Default bounded wait applied to ordinary calls.
	pub call_timeout: Duration,
	/// Bounded wait applied to the renewal call.
	pub renewal_timeout: Duration,
	renewal_url: Url,
}
impl SessionDescriptor {
	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> SessionDescriptorBuilder {
		SessionDescriptorBuilder::new(base_url)
	}

	/// Checks whether a response status signals credential expiry.
	pub fn is_expiry_status(&self, status: u16) -> bool {
		self.expiry_statuses.contains(&status)
	}

	/// Checks whether a call targets the renewal endpoint itself.
	pub fn is_renewal_destination(&self, request: &CallRequest) -> bool {
		normalize_path(&request.path) == self.renewal_path
	}

	/// Returns the precomputed absolute renewal endpoint URL.
	pub fn renewal_url(&self) -> &Url {
		&self.renewal_url
	}

	/// Resolves a destination path against the base URL.
	pub fn destination_url(&self, path: &str) -> Result<Url, ConfigError> {
		let normalized = normalize_path(path);

		self.base_url.join(normalized.trim_start_matches('/')).map_err(|source| {
			ConfigError::InvalidDestination { path: path.to_owned(), source }
		})
	}
}

/// Builder for [`SessionDescriptor`] values.
#[derive(Clone, Debug)]
pub struct SessionDescriptorBuilder {
	/// Base URL every destination path resolves against.
	pub base_url: Url,
	/// Renewal endpoint path (required).
	pub renewal_path: Option<String>,
	/// Authorization scheme prefixed to the access token.
	pub auth_scheme: String,
	/// Statuses interpreted as expiry signals.
	pub expiry_statuses: Vec<u16>,
	/// Default bounded wait applied to ordinary calls.
	pub call_timeout: Duration,
	/// Bounded wait applied to the renewal call.
	pub renewal_timeout: Duration,
}
impl SessionDescriptorBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			renewal_path: None,
			auth_scheme: DEFAULT_AUTH_SCHEME.into(),
			expiry_statuses: vec![DEFAULT_EXPIRY_STATUS],
			call_timeout: DEFAULT_CALL_TIMEOUT,
			renewal_timeout: DEFAULT_RENEWAL_TIMEOUT,
		}
	}

	/// Sets the renewal endpoint path.
	pub fn renewal_path(mut self, path: impl Into<String>) -> Self {
		self.renewal_path = Some(path.into());

		self
	}

	/// Overrides the authorization scheme (defaults to `Bearer`).
	pub fn auth_scheme(mut self, scheme: impl Into<String>) -> Self {
		self.auth_scheme = scheme.into();

		self
	}

	/// Replaces the expiry status set (defaults to `[401]`).
	pub fn expiry_statuses<I>(mut self, statuses: I) -> Self
	where
		I: IntoIterator<Item = u16>,
	{
		self.expiry_statuses = statuses.into_iter().collect();

		self
	}

	/// Marks an additional status as an expiry signal.
	pub fn expiry_status(mut self, status: u16) -> Self {
		if !self.expiry_statuses.contains(&status) {
			self.expiry_statuses.push(status);
		}

		self
	}

	/// Overrides the default per-call bounded wait (defaults to 10 seconds).
	pub fn call_timeout(mut self, timeout: Duration) -> Self {
		self.call_timeout = timeout;

		self
	}

	/// Overrides the renewal call's bounded wait (defaults to 10 seconds).
	pub fn renewal_timeout(mut self, timeout: Duration) -> Self {
		self.renewal_timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<SessionDescriptor, ConfigError> {
		let scheme = self.base_url.scheme();

		if scheme != "http" && scheme != "https" {
			return Err(ConfigError::UnsupportedBaseScheme { scheme: scheme.to_owned() });
		}
		if self.base_url.cannot_be_a_base() {
			return Err(ConfigError::BaseUrlCannotBeBase);
		}
		if self.expiry_statuses.is_empty() {
			return Err(ConfigError::NoExpiryStatuses);
		}
		if !self.call_timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout { which: "call" });
		}
		if !self.renewal_timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout { which: "renewal" });
		}

		let renewal_path =
			normalize_path(&self.renewal_path.ok_or(ConfigError::MissingRenewalPath)?)
				.into_owned();
		let renewal_url = self
			.base_url
			.join(renewal_path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidRenewalPath { source })?;

		Ok(SessionDescriptor {
			base_url: self.base_url,
			renewal_path,
			auth_scheme: self.auth_scheme,
			expiry_statuses: self.expiry_statuses,
			call_timeout: self.call_timeout,
			renewal_timeout: self.renewal_timeout,
			renewal_url,
		})
	}
}

fn normalize_path(path: &str) -> std::borrow::Cow<'_, str> {
	if path.starts_with('/') {
		std::borrow::Cow::Borrowed(path)
	} else {
		std::borrow::Cow::Owned(format!("/{path}"))
	}
}
