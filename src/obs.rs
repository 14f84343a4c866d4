//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `storefront_client.call` with the
//!   `operation` and `stage` fields.
//! - Enable `metrics` to increment `storefront_client_call_total` (labeled by `operation` and
//!   `class`) for every completed request and `storefront_client_refresh_total` (labeled by
//!   `outcome`) for every refresh cycle.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Authenticated API call with refresh recovery.
	Request,
	/// Public API call (login, register) without refresh recovery.
	PublicRequest,
	/// Credential refresh cycle.
	Refresh,
	/// Session transition (restore, login, logout).
	Session,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Request => "request",
			OperationKind::PublicRequest => "public_request",
			OperationKind::Refresh => "refresh",
			OperationKind::Session => "session",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each refresh cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshOutcomeLabel {
	/// A leader started a refresh call.
	Attempt,
	/// A request joined a cycle already in flight.
	Queued,
	/// The cycle produced a new access token.
	Success,
	/// The cycle failed and credentials were cleared.
	Failure,
}
impl RefreshOutcomeLabel {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshOutcomeLabel::Attempt => "attempt",
			RefreshOutcomeLabel::Queued => "queued",
			RefreshOutcomeLabel::Success => "success",
			RefreshOutcomeLabel::Failure => "failure",
		}
	}
}
impl Display for RefreshOutcomeLabel {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Coarse classification of how a request ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusClass {
	/// 2xx response.
	Success,
	/// 4xx response.
	ClientError,
	/// 5xx response.
	ServerError,
	/// Any other status.
	Other,
	/// No response was received.
	Network,
	/// The call failed before or after the exchange (configuration, storage, decoding).
	Local,
}
impl StatusClass {
	/// Classifies an HTTP status.
	pub const fn from_status(status: u16) -> Self {
		match status {
			200..=299 => StatusClass::Success,
			400..=499 => StatusClass::ClientError,
			500..=599 => StatusClass::ServerError,
			_ => StatusClass::Other,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StatusClass::Success => "2xx",
			StatusClass::ClientError => "4xx",
			StatusClass::ServerError => "5xx",
			StatusClass::Other => "other",
			StatusClass::Network => "network",
			StatusClass::Local => "local",
		}
	}
}
impl Display for StatusClass {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_classes_follow_hundreds_digit() {
		assert_eq!(StatusClass::from_status(204), StatusClass::Success);
		assert_eq!(StatusClass::from_status(401), StatusClass::ClientError);
		assert_eq!(StatusClass::from_status(503).as_str(), "5xx");
		assert_eq!(StatusClass::from_status(302), StatusClass::Other);
	}
}
