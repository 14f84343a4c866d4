//! User-visible side effects: toast-style notifications and the login redirect.
//!
//! The client never renders anything itself. Hosts plug a [`Notifier`] and a
//! [`LoginRedirect`] into [`crate::client::ApiClient`]; the defaults only log.

// self
use crate::{
	_prelude::*,
	error::{AuthFailureKind, UNEXPECTED_ERROR_MESSAGE},
};

/// Message shown when no response was received.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

/// Severity of a [`Notification`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
	/// Completed action.
	Success,
	/// Neutral information.
	Info,
	/// Action was refused locally (for example, not enough stock).
	Warning,
	/// Request failed.
	Error,
}
impl NotificationLevel {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::Info => "info",
			Self::Warning => "warning",
			Self::Error => "error",
		}
	}
}

/// A single user-facing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
	/// Severity.
	pub level: NotificationLevel,
	/// Text shown to the user.
	pub message: String,
}
impl Notification {
	/// Creates a notification.
	pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
		Self { level, message: message.into() }
	}

	/// Success notification.
	pub fn success(message: impl Into<String>) -> Self {
		Self::new(NotificationLevel::Success, message)
	}

	/// Info notification.
	pub fn info(message: impl Into<String>) -> Self {
		Self::new(NotificationLevel::Info, message)
	}

	/// Warning notification.
	pub fn warning(message: impl Into<String>) -> Self {
		Self::new(NotificationLevel::Warning, message)
	}

	/// Error notification.
	pub fn error(message: impl Into<String>) -> Self {
		Self::new(NotificationLevel::Error, message)
	}
}

/// Sink for user-facing notifications.
pub trait Notifier
where
	Self: Send + Sync,
{
	/// Surfaces one notification.
	fn notify(&self, notification: Notification);
}

/// Hard navigation to the login boundary after an unrecoverable authentication failure.
pub trait LoginRedirect
where
	Self: Send + Sync,
{
	/// Sends the session to `path`.
	fn redirect(&self, path: &str);
}

/// Default [`Notifier`] that emits tracing events (or nothing when tracing is disabled).
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;
impl Notifier for TracingNotifier {
	fn notify(&self, notification: Notification) {
		#[cfg(feature = "tracing")]
		{
			let level = notification.level.as_str();
			let message = notification.message.as_str();

			match notification.level {
				NotificationLevel::Error | NotificationLevel::Warning =>
					tracing::warn!(level, text = message, "Notification."),
				NotificationLevel::Success | NotificationLevel::Info =>
					tracing::info!(level, text = message, "Notification."),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = notification;
		}
	}
}

/// Default [`LoginRedirect`] that only logs the navigation.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingRedirect;
impl LoginRedirect for TracingRedirect {
	fn redirect(&self, path: &str) {
		#[cfg(feature = "tracing")]
		{
			tracing::info!(path, "Redirecting to the login boundary.");
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = path;
		}
	}
}

/// In-memory [`Notifier`] that records every notification; clones share the log.
#[derive(Clone, Debug, Default)]
pub struct NotificationLog(Arc<Mutex<Vec<Notification>>>);
impl NotificationLog {
	/// Snapshot of recorded notifications in arrival order.
	pub fn entries(&self) -> Vec<Notification> {
		self.0.lock().clone()
	}

	/// Recorded messages in arrival order.
	pub fn messages(&self) -> Vec<String> {
		self.0.lock().iter().map(|n| n.message.clone()).collect()
	}

	/// Drops every recorded notification.
	pub fn clear(&self) {
		self.0.lock().clear();
	}
}
impl Notifier for NotificationLog {
	fn notify(&self, notification: Notification) {
		self.0.lock().push(notification);
	}
}

/// In-memory [`LoginRedirect`] that records every navigation; clones share the log.
#[derive(Clone, Debug, Default)]
pub struct RedirectLog(Arc<Mutex<Vec<String>>>);
impl RedirectLog {
	/// Recorded target paths in arrival order.
	pub fn paths(&self) -> Vec<String> {
		self.0.lock().clone()
	}

	/// Number of redirects issued.
	pub fn count(&self) -> usize {
		self.0.lock().len()
	}
}
impl LoginRedirect for RedirectLog {
	fn redirect(&self, path: &str) {
		self.0.lock().push(path.to_owned());
	}
}

/// Derives the notification surfaced for a failed request, if any.
///
/// Terminal session failures stay silent because the login redirect already tells the user;
/// a 401 after a successful refresh is the exception and reports the API message.
pub fn failure_notification(error: &Error) -> Option<Notification> {
	let message = match error {
		Error::Api(api) => api.message().to_owned(),
		Error::Transport(_) => NETWORK_ERROR_MESSAGE.to_owned(),
		Error::SessionExpired(failure) => match failure.kind {
			AuthFailureKind::RetryRejected => failure.message.clone(),
			_ => return None,
		},
		Error::Storage(_) | Error::Config(_) | Error::Decode { .. } | Error::Encode(_) =>
			UNEXPECTED_ERROR_MESSAGE.to_owned(),
	};

	Some(Notification::error(message))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::{ApiError, AuthFailure, TransportError};

	#[test]
	fn failure_messages_follow_error_class() {
		let forbidden = Error::Api(ApiError::Forbidden { message: "Admins only.".into() });
		let network = Error::Transport(TransportError::network(std::io::Error::other("refused")));
		let expired = Error::SessionExpired(AuthFailure::new(
			AuthFailureKind::RefreshRejected,
			"Token is blacklisted",
		));
		let retried = Error::SessionExpired(AuthFailure::new(
			AuthFailureKind::RetryRejected,
			"Token is invalid or expired",
		));

		assert_eq!(failure_notification(&forbidden), Some(Notification::error("Admins only.")));
		assert_eq!(
			failure_notification(&network),
			Some(Notification::error(NETWORK_ERROR_MESSAGE))
		);
		assert_eq!(failure_notification(&expired), None);
		assert_eq!(
			failure_notification(&retried).map(|n| n.message),
			Some("Token is invalid or expired".into())
		);
		assert_eq!(
			failure_notification(&Error::Encode(serde::ser::Error::custom("boom")))
				.map(|n| n.message),
			Some(UNEXPECTED_ERROR_MESSAGE.into())
		);
	}

	#[test]
	fn logs_share_state_between_clones() {
		let notifications = NotificationLog::default();
		let redirects = RedirectLog::default();

		notifications.clone().notify(Notification::warning("Only 2 items available in stock"));
		redirects.clone().redirect("/login");

		assert_eq!(notifications.entries()[0].level, NotificationLevel::Warning);
		assert_eq!(redirects.paths(), ["/login"]);
	}
}
