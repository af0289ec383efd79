//! Session-level error types shared across the coordinator, stores, and orchestrator.

// self
use crate::_prelude::*;

/// Session-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP status code the API uses for missing, expired, or invalid credentials.
pub const UNAUTHENTICATED: u16 = 401;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Server answered with a non-success status.
	#[error("Request failed with status {status}: {message}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Server-supplied message, or the raw body when none could be extracted.
		message: String,
	},
	/// Login endpoint answered without a usable user or token.
	#[error("Login was rejected: {reason}.")]
	LoginRejected {
		/// Server- or crate-supplied reason string.
		reason: String,
	},
	/// Refresh endpoint rejected the stored refresh token.
	#[error("Token refresh was rejected: {reason}.")]
	RefreshRejected {
		/// Server- or crate-supplied reason string.
		reason: String,
	},
	/// A refresh was required but no refresh token is stored.
	#[error("No refresh token is stored for this session.")]
	MissingRefreshToken,
	/// The in-flight refresh was dropped before it settled.
	#[error("The in-flight token refresh was cancelled.")]
	RefreshAborted,
	/// The session ended or was replaced while a refresh was in flight.
	#[error("The session ended before the token refresh completed.")]
	SessionEnded,
}
impl Error {
	/// Returns the HTTP status carried by a [`Error::Status`] value.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns `true` when the server reported the request as unauthenticated.
	pub fn is_unauthenticated(&self) -> bool {
		self.status() == Some(UNAUTHENTICATED)
	}
}

/// Configuration and validation failures, raised before any timer or request starts.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Idle timeout must be non-zero.
	#[error("Idle timeout must be greater than zero.")]
	ZeroIdleTimeout,
	/// Warning phase cannot outlast the idle timeout it is carved from.
	#[error("Warning duration ({warning:?}) exceeds the idle timeout ({idle:?}).")]
	WarningExceedsIdle {
		/// Configured warning duration.
		warning: Duration,
		/// Configured idle timeout.
		idle: Duration,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// API base URL cannot be parsed.
	#[error("API base URL `{url}` is invalid.")]
	InvalidBaseUrl {
		/// Rejected input.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: BoxError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Response payload could not be parsed into the expected shape.
#[derive(Debug, ThisError)]
#[error("Response body from `{endpoint}` is malformed.")]
pub struct DecodeError {
	/// Endpoint path the body came from.
	pub endpoint: String,
	/// Structured parsing failure including the JSON path.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}
