//! Broker-level error types shared across the coordinator, transports, and stores.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure unrelated to credentials (DNS, TCP, TLS, bounded waits).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The renewal cycle failed and the session has been terminated.
	#[error("Session terminated: {cause}")]
	SessionTerminated {
		/// Terminal cause shared verbatim by every caller of the failed cycle.
		cause: TerminationCause,
	},
	/// A replayed call was rejected again; renewal is not re-entered.
	#[error("Replayed call was rejected again with status {status}.")]
	ReplayRejected {
		/// Status returned by the second rejection.
		status: u16,
	},
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Base URL uses a scheme the transport layer cannot speak.
	#[error("Base URL scheme `{scheme}` is not supported.")]
	UnsupportedBaseScheme {
		/// Scheme that failed validation.
		scheme: String,
	},
	/// Base URL cannot serve as a base for destination paths.
	#[error("Base URL cannot be joined with destination paths.")]
	BaseUrlCannotBeBase,
	/// Descriptor was built without a renewal endpoint path.
	#[error("Renewal endpoint path is required.")]
	MissingRenewalPath,
	/// Renewal endpoint path does not resolve against the base URL.
	#[error("Renewal endpoint path is invalid.")]
	InvalidRenewalPath {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Destination path does not resolve against the base URL.
	#[error("Destination path `{path}` is invalid.")]
	InvalidDestination {
		/// Path that failed to resolve.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Expiry status set must not be empty.
	#[error("At least one expiry status must be configured.")]
	NoExpiryStatuses,
	/// Bounded waits must be positive durations.
	#[error("The {which} timeout must be positive.")]
	NonPositiveTimeout {
		/// Which timeout failed validation.
		which: &'static str,
	},
}

/// Transport-level failures (network, IO, bounded waits).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while executing the call.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The call exceeded its bounded wait.
	#[error("Call exceeded its bounded wait.")]
	Timeout,
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Terminal cause delivered to every caller blocked by a failed renewal cycle.
///
/// The cause is cloned verbatim into each rejection so a caller cannot observe a different
/// failure than its neighbors in the same cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TerminationCause {
	/// The renewal endpoint rejected the renewal token.
	#[error("Renewal endpoint rejected the renewal token with status {status}.")]
	RenewalRejected {
		/// Status returned by the renewal endpoint.
		status: u16,
	},
	/// The renewal call failed at the transport layer.
	#[error("Renewal call failed in transport: {message}.")]
	RenewalTransport {
		/// Human-readable transport failure payload.
		message: String,
	},
	/// The renewal call exceeded its bounded wait.
	#[error("Renewal call exceeded its bounded wait.")]
	RenewalTimedOut,
	/// The renewal endpoint returned a body the broker could not interpret.
	#[error("Renewal endpoint returned an unexpected shape: {message}.")]
	MalformedRenewalResponse {
		/// Human-readable parsing failure payload.
		message: String,
	},
	/// The stored credential carries no renewal token, so expiry cannot be recovered.
	#[error("Stored credential has no renewal token.")]
	MissingRenewalToken,
	/// The renewal cycle was dropped before an outcome was known.
	#[error("Renewal cycle was interrupted before completing.")]
	RenewalInterrupted,
}
