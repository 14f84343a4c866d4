//! Client configuration: API base URL, request timeout, and session boundary paths.

// std
use std::{env, time::Duration as StdDuration};
// self
use crate::{_prelude::*, error::ConfigError};

/// Base URL used when neither the builder nor the environment provides one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";
/// Environment variable consulted by [`ClientConfig::from_env`].
pub const BASE_URL_ENV: &str = "STOREFRONT_API_BASE_URL";
/// Login boundary the session is sent to after an unrecoverable authentication failure.
pub const DEFAULT_LOGIN_PATH: &str = "/login";
/// Credential refresh endpoint, relative to the base URL.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh/";

const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Immutable client configuration consumed by [`crate::client::ApiClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// API root every request path is appended to.
	pub base_url: Url,
	/// Per-request timeout handed to the transport; `None` relies on the transport default.
	pub timeout: Option<StdDuration>,
	/// Login boundary passed to [`crate::notify::LoginRedirect`].
	pub login_path: String,
	/// Refresh endpoint path.
	pub refresh_path: String,
}
impl ClientConfig {
	/// Creates a new builder seeded with the defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Builds a configuration from [`BASE_URL_ENV`], falling back to [`DEFAULT_BASE_URL`].
	pub fn from_env() -> Result<Self, ConfigError> {
		let mut builder = Self::builder();

		if let Some(value) = env::var(BASE_URL_ENV).ok().filter(|value| !value.trim().is_empty()) {
			builder = builder.base_url(value.trim());
		}

		builder.build()
	}

	/// Resolves a request path against the base URL, keeping the base URL's own path prefix.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let joined = format!("{base}/{}", path.trim_start_matches('/'));

		Url::parse(&joined)
			.map_err(|source| ConfigError::InvalidEndpoint { path: path.to_owned(), source })
	}
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	base_url: String,
	timeout: Option<StdDuration>,
	login_path: String,
	refresh_path: String,
}
impl ClientConfigBuilder {
	/// Overrides the API base URL.
	pub fn base_url(mut self, value: impl Into<String>) -> Self {
		self.base_url = value.into();

		self
	}

	/// Overrides the per-request timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Leaves timeouts entirely to the transport.
	pub fn without_timeout(mut self) -> Self {
		self.timeout = None;

		self
	}

	/// Overrides the login boundary path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Validates the inputs and produces a [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let base_url = Url::parse(&self.base_url).map_err(|source| {
			ConfigError::InvalidBaseUrl { value: self.base_url.clone(), source }
		})?;

		if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
			return Err(ConfigError::UnsupportedBaseUrl { value: self.base_url });
		}

		validate_path("login", &self.login_path)?;
		validate_path("refresh", &self.refresh_path)?;

		Ok(ClientConfig {
			base_url,
			timeout: self.timeout,
			login_path: self.login_path,
			refresh_path: self.refresh_path,
		})
	}
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.into(),
			timeout: Some(DEFAULT_TIMEOUT),
			login_path: DEFAULT_LOGIN_PATH.into(),
			refresh_path: DEFAULT_REFRESH_PATH.into(),
		}
	}
}

fn validate_path(name: &'static str, value: &str) -> Result<(), ConfigError> {
	if value.starts_with('/') {
		Ok(())
	} else {
		Err(ConfigError::InvalidPath { name, value: value.to_owned() })
	}
}
