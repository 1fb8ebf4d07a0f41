//! Transport primitives for coordinated session calls.
//!
//! The module exposes [`CallTransport`] alongside the [`CallRequest`]/[`CallResponse`]
//! descriptors so downstream crates can integrate custom HTTP stacks without the broker
//! taking a hard dependency on one. The coordinator only ever hands a transport a fully
//! resolved [`PreparedCall`] (absolute URL, attached headers, bounded wait) and reads back
//! status, headers, and body bytes. Everything else (expiry detection, renewal, replay)
//! happens above the transport seam.

// std
use std::ops::Deref;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::_prelude::*;

/// HTTP methods accepted by the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// HTTP GET.
	Get,
	/// HTTP POST.
	Post,
	/// HTTP PUT.
	Put,
	/// HTTP PATCH.
	Patch,
	/// HTTP DELETE.
	Delete,
}
impl Method {
	/// Returns the canonical uppercase method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}

	#[cfg(feature = "reqwest")]
	pub(crate) fn as_reqwest(self) -> reqwest::Method {
		match self {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Caller-facing call descriptor consumed by the coordinator.
///
/// The descriptor is opaque to the coordinator except for the destination path (renewal
/// endpoint detection), the header list (credential attachment), and cloneability (replay
/// after a renewal cycle).
#[derive(Clone, Debug)]
pub struct CallRequest {
	/// HTTP method for the call.
	pub method: Method,
	/// Destination path resolved against the session's base URL.
	pub path: String,
	/// Header pairs sent with the call, in insertion order.
	pub headers: Vec<(String, String)>,
	/// Optional body bytes.
	pub body: Option<Vec<u8>>,
	/// Optional bounded wait overriding the descriptor's per-call default.
	pub bounded_wait: Option<Duration>,
}
impl CallRequest {
	/// Creates a new descriptor for the provided method and destination path.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), headers: Vec::new(), body: None, bounded_wait: None }
	}

	/// Shorthand for a GET descriptor.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a POST descriptor.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Shorthand for a PUT descriptor.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// Shorthand for a PATCH descriptor.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::Patch, path)
	}

	/// Shorthand for a DELETE descriptor.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Appends a header pair.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Serializes the payload as the JSON body and stamps the matching content type.
	pub fn with_json_body<T>(self, payload: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(payload)?;
		let mut request = self.with_header("Content-Type", "application/json");

		request.body = Some(bytes);

		Ok(request)
	}

	/// Overrides the bounded wait for this call only.
	pub fn with_bounded_wait(mut self, wait: Duration) -> Self {
		self.bounded_wait = Some(wait);

		self
	}
}

/// Response surface handed back to callers: status, headers, body bytes.
#[derive(Clone, Debug)]
pub struct CallResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response header pairs.
	pub headers: Vec<(String, String)>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl CallResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns the first header matching `name` (ASCII case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Decodes the body as JSON into the expected shape, keeping the failing path on errors.
	pub fn json<T>(&self) -> Result<T, ResponseParseError>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ResponseParseError { status: self.status, source })
	}
}

/// Failure produced when a response body does not match the expected JSON shape.
#[derive(Debug, ThisError)]
#[error("Response body (status {status}) does not match the expected JSON shape.")]
pub struct ResponseParseError {
	/// Status of the response whose body failed to decode.
	pub status: u16,
	/// Structured parsing failure.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}

/// Fully resolved call handed to a [`CallTransport`]: absolute URL, attached headers,
/// bounded wait. Produced by the coordinator; transports never attach credentials.
#[derive(Clone)]
pub struct PreparedCall {
	/// Absolute destination URL.
	pub url: Url,
	/// HTTP method for the call.
	pub method: Method,
	/// Header pairs, including any attached credential header.
	pub headers: Vec<(String, String)>,
	/// Optional body bytes.
	pub body: Option<Vec<u8>>,
	/// Bounded wait the transport must enforce, if any.
	pub bounded_wait: Option<Duration>,
}
impl PreparedCall {
	/// Converts the bounded wait into the std duration transports expect.
	pub fn wait_std(&self) -> Option<std::time::Duration> {
		self.bounded_wait.and_then(|wait| std::time::Duration::try_from(wait).ok())
	}
}
impl Debug for PreparedCall {
	// Header values may carry the attached credential, so only names are printed.
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PreparedCall")
			.field("url", &self.url.as_str())
			.field("method", &self.method)
			.field("headers", &self.headers.iter().map(|(name, _)| name).collect::<Vec<_>>())
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.field("bounded_wait", &self.bounded_wait)
			.finish()
	}
}

/// Boxed future returned by [`CallTransport::execute`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<CallResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing prepared session calls.
///
/// The trait is the broker's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so they can be shared across coordinator clones without
/// additional wrappers, and the futures they return must be `Send` so coordinator futures
/// can hop executors.
pub trait CallTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Executes the prepared call, honoring its bounded wait when one is set.
	fn execute(&self, call: PreparedCall) -> TransportFuture<'_, Self::TransportError>;
}

/// Classifies transport-specific errors into the broker's [`TransportError`] taxonomy.
///
/// Timeouts must map to [`TransportError::Timeout`]: the coordinator treats a timed-out
/// renewal call as a terminal cycle failure, not a transient network error.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: StdError,
{
	/// Maps a transport error into the broker taxonomy.
	fn map_transport_error(&self, err: E) -> crate::error::TransportError;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The default client follows reqwest's defaults; callers needing proxies, TLS tweaks, or
/// connection pooling knobs pass their own client through [`ReqwestTransport::with_client`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl CallTransport for ReqwestTransport {
	type TransportError = ReqwestError;

	fn execute(&self, call: PreparedCall) -> TransportFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let wait = call.wait_std();
			let mut builder = client.request(call.method.as_reqwest(), call.url);

			for (name, value) in &call.headers {
				builder = builder.header(name, value);
			}
			if let Some(wait) = wait {
				builder = builder.timeout(wait);
			}
			if let Some(bytes) = call.body {
				builder = builder.body(bytes);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await?.to_vec();

			Ok(CallResponse { status, headers, body })
		})
	}
}

/// Default error mapper for the reqwest transport.
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, err: ReqwestError) -> crate::error::TransportError {
		if err.is_timeout() {
			crate::error::TransportError::Timeout
		} else {
			crate::error::TransportError::network(err)
		}
	}
}
