//! Client-wide error types shared by the request client, session, cart, and stores.

// self
use crate::{_prelude::*, http::ApiResponse};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fallback message used when a response carries nothing more specific.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";

const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";
const NOT_FOUND_MESSAGE: &str = "Resource not found.";
const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
const UNAUTHORIZED_MESSAGE: &str = "Authentication credentials were not provided or are invalid.";

/// Canonical client error exposed by public APIs.
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
	/// No response was received (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The API answered with a non-success status.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Authentication could not be recovered; stored credentials were cleared.
	#[error(transparent)]
	SessionExpired(#[from] AuthFailure),
	/// A response body did not match the expected payload shape.
	#[error("Response from `{endpoint}` (status {status}) could not be decoded.")]
	Decode {
		/// Request path that produced the body.
		endpoint: String,
		/// HTTP status of the response.
		status: u16,
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A request payload could not be serialized.
	#[error("Request payload could not be encoded.")]
	Encode(#[source] serde_json::Error),
}

/// Configuration and validation failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// The API base URL cannot be parsed.
	#[error("API base URL `{value}` is invalid.")]
	InvalidBaseUrl {
		/// Raw value supplied by the caller or environment.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The API base URL uses a scheme other than HTTP(S) or cannot carry paths.
	#[error("API base URL `{value}` must be an http or https URL.")]
	UnsupportedBaseUrl {
		/// Offending URL.
		value: String,
	},
	/// A configured boundary or endpoint path does not start with `/`.
	#[error("Configured {name} path `{value}` must start with '/'.")]
	InvalidPath {
		/// Which path was rejected.
		name: &'static str,
		/// Offending value.
		value: String,
	},
	/// A request path could not be joined onto the base URL.
	#[error("Endpoint `{path}` cannot be joined onto the API base URL.")]
	InvalidEndpoint {
		/// Request path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
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

/// Transport-level failures: the request never produced a response.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the storefront API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
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

/// Non-success responses, classified by status with a user-facing message.
///
/// `message` prefers the body's `detail` field. Validation failures enumerate every
/// `field: message` entry instead.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ApiError {
	/// 401 returned by the API.
	#[error("Request was not authorized: {message}")]
	Unauthorized {
		/// User-facing message.
		message: String,
	},
	/// 403 returned by the API.
	#[error("Permission denied: {message}")]
	Forbidden {
		/// User-facing message.
		message: String,
	},
	/// 404 returned by the API.
	#[error("Not found: {message}")]
	NotFound {
		/// User-facing message.
		message: String,
	},
	/// Client error carrying field-level validation messages.
	#[error("Request failed validation: {message}")]
	Validation {
		/// HTTP status (usually 400).
		status: u16,
		/// Field name mapped to every message reported for it.
		fields: BTreeMap<String, Vec<String>>,
		/// Field messages joined for display.
		message: String,
	},
	/// 5xx returned by the API.
	#[error("Server error ({status}): {message}")]
	Server {
		/// HTTP status.
		status: u16,
		/// User-facing message.
		message: String,
	},
	/// Any other non-success status.
	#[error("Unexpected status {status}: {message}")]
	Status {
		/// HTTP status.
		status: u16,
		/// User-facing message.
		message: String,
	},
}
impl ApiError {
	/// Classifies a non-success response.
	pub fn from_response(response: &ApiResponse) -> Self {
		let body = serde_json::from_slice::<JsonValue>(&response.body).ok();
		let detail = body.as_ref().and_then(detail_of);
		let status = response.status;

		match status {
			401 => Self::Unauthorized {
				message: detail.unwrap_or_else(|| UNAUTHORIZED_MESSAGE.into()),
			},
			403 =>
				Self::Forbidden { message: detail.unwrap_or_else(|| FORBIDDEN_MESSAGE.into()) },
			404 => Self::NotFound { message: detail.unwrap_or_else(|| NOT_FOUND_MESSAGE.into()) },
			500.. => Self::Server { status, message: SERVER_ERROR_MESSAGE.into() },
			_ => {
				if let Some(message) = detail {
					return Self::Status { status, message };
				}

				let fields = body.as_ref().map(field_messages).unwrap_or_default();

				if fields.is_empty() {
					return Self::Status { status, message: UNEXPECTED_ERROR_MESSAGE.into() };
				}

				let message = fields
					.iter()
					.flat_map(|(field, messages)| {
						messages.iter().map(move |message| format!("{field}: {message}"))
					})
					.collect::<Vec<_>>()
					.join("; ");

				Self::Validation { status, fields, message }
			},
		}
	}

	/// HTTP status behind the error.
	pub fn status(&self) -> u16 {
		match self {
			Self::Unauthorized { .. } => 401,
			Self::Forbidden { .. } => 403,
			Self::NotFound { .. } => 404,
			Self::Validation { status, .. }
			| Self::Server { status, .. }
			| Self::Status { status, .. } => *status,
		}
	}

	/// Human-readable message suitable for a notification.
	pub fn message(&self) -> &str {
		match self {
			Self::Unauthorized { message }
			| Self::Forbidden { message }
			| Self::NotFound { message }
			| Self::Validation { message, .. }
			| Self::Server { message, .. }
			| Self::Status { message, .. } => message,
		}
	}
}

/// Why an authentication failure could not be recovered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthFailureKind {
	/// A 401 arrived but no refresh token was stored.
	MissingRefreshToken,
	/// The refresh endpoint answered with a non-success status.
	RefreshRejected,
	/// The refresh endpoint could not be reached.
	RefreshUnreachable,
	/// The refresh endpoint answered with an unusable body.
	RefreshMalformed,
	/// Refreshed credentials could not be read or persisted.
	Storage,
	/// The refresh cycle was abandoned before it settled.
	Cancelled,
	/// The request was rejected with 401 again after retrying with a fresh token.
	RetryRejected,
}
impl AuthFailureKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::MissingRefreshToken => "missing_refresh_token",
			Self::RefreshRejected => "refresh_rejected",
			Self::RefreshUnreachable => "refresh_unreachable",
			Self::RefreshMalformed => "refresh_malformed",
			Self::Storage => "storage",
			Self::Cancelled => "cancelled",
			Self::RetryRejected => "retry_rejected",
		}
	}
}
impl Display for AuthFailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Terminal authentication failure shared with every request waiting on a refresh cycle.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Session expired ({kind}): {message}")]
pub struct AuthFailure {
	/// Failure classification.
	pub kind: AuthFailureKind,
	/// HTTP status observed, when a response was received.
	pub status: Option<u16>,
	/// Human-readable description.
	pub message: String,
}
impl AuthFailure {
	/// Creates a failure of the given kind.
	pub fn new(kind: AuthFailureKind, message: impl Into<String>) -> Self {
		Self { kind, status: None, message: message.into() }
	}

	/// Attaches the HTTP status that caused the failure.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}

	pub(crate) fn missing_refresh_token(original: &ApiError) -> Self {
		Self::new(AuthFailureKind::MissingRefreshToken, original.message())
			.with_status(original.status())
	}

	pub(crate) fn rejected(error: &ApiError) -> Self {
		Self::new(AuthFailureKind::RefreshRejected, error.message()).with_status(error.status())
	}

	pub(crate) fn retry_rejected(error: &ApiError) -> Self {
		Self::new(AuthFailureKind::RetryRejected, error.message()).with_status(error.status())
	}

	pub(crate) fn cancelled() -> Self {
		Self::new(AuthFailureKind::Cancelled, "The refresh cycle ended before settling.")
	}

	pub(crate) fn from_error(kind: AuthFailureKind, error: &dyn StdError) -> Self {
		Self::new(kind, error.to_string())
	}
}

fn detail_of(body: &JsonValue) -> Option<String> {
	match body.get("detail")? {
		JsonValue::String(detail) if !detail.is_empty() => Some(detail.clone()),
		JsonValue::Null => None,
		other => Some(other.to_string()),
	}
}

fn field_messages(body: &JsonValue) -> BTreeMap<String, Vec<String>> {
	let Some(object) = body.as_object() else {
		return BTreeMap::new();
	};

	object
		.iter()
		.map(|(field, value)| {
			let messages = match value {
				JsonValue::Array(items) => items.iter().map(display_value).collect(),
				other => vec![display_value(other)],
			};

			(field.clone(), messages)
		})
		.collect()
}

fn display_value(value: &JsonValue) -> String {
	match value {
		JsonValue::String(text) => text.clone(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(status: u16, body: &str) -> ApiResponse {
		ApiResponse::new(status, body.as_bytes().to_vec())
	}

	#[test]
	fn forbidden_and_not_found_prefer_detail() {
		let err = ApiError::from_response(&response(403, r#"{"detail":"Admins only."}"#));

		assert_eq!(err, ApiError::Forbidden { message: "Admins only.".into() });

		let err = ApiError::from_response(&response(404, ""));

		assert_eq!(err.message(), NOT_FOUND_MESSAGE);
		assert_eq!(err.status(), 404);
	}

	#[test]
	fn server_errors_use_generic_message() {
		let err = ApiError::from_response(&response(502, r#"{"detail":"upstream exploded"}"#));

		assert_eq!(err, ApiError::Server { status: 502, message: SERVER_ERROR_MESSAGE.into() });
	}

	#[test]
	fn validation_errors_enumerate_field_messages() {
		let err = ApiError::from_response(&response(
			400,
			r#"{"email":["This field is required.","Enter a valid email."],"quantity":"Too many."}"#,
		));
		let ApiError::Validation { status, fields, message } = err else {
			panic!("Field errors should classify as validation failures.");
		};

		assert_eq!(status, 400);
		assert_eq!(fields["email"].len(), 2);
		assert_eq!(
			message,
			"email: This field is required.; email: Enter a valid email.; quantity: Too many."
		);
	}

	#[test]
	fn bodiless_client_errors_fall_back_to_generic_message() {
		let err = ApiError::from_response(&response(405, "Method Not Allowed"));

		assert_eq!(err, ApiError::Status { status: 405, message: UNEXPECTED_ERROR_MESSAGE.into() });
	}

	#[test]
	fn auth_failure_display_includes_kind() {
		let failure = AuthFailure::new(AuthFailureKind::RefreshRejected, "Token is blacklisted")
			.with_status(401);

		assert_eq!(failure.to_string(), "Session expired (refresh_rejected): Token is blacklisted");
		assert_eq!(failure.status, Some(401));
	}
}
