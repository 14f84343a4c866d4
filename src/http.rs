//! Transport primitives for storefront API calls.
//!
//! [`HttpTransport`] is the client's only dependency on an HTTP stack. The client turns an
//! [`ApiRequest`] (method, path, query, JSON body) into a [`PreparedRequest`] carrying the
//! resolved URL and the bearer credential, and the transport answers with an
//! [`ApiResponse`] for every status it receives. A transport only fails when no response
//! was received at all; status classification happens above it.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{ACCEPT, CONTENT_TYPE};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::ClientConfig,
	error::{ConfigError, TransportError},
};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks able to execute storefront API requests.
///
/// Implementations must return `Ok` for every response they receive, whatever its status,
/// and reserve `Err` for requests that produced no response.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends the prepared request.
	fn send(&self, request: PreparedRequest) -> TransportFuture<'_>;
}

/// HTTP methods used by the storefront API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Returns the method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transport-agnostic description of an API call, relative to the configured base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the base URL (for example `/products/`).
	pub path: String,
	/// Query parameters, appended in order.
	pub query: Vec<(String, String)>,
	/// Optional JSON body.
	pub body: Option<JsonValue>,
}
impl ApiRequest {
	/// Creates a request without query parameters or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), query: Vec::new(), body: None }
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::Patch, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Appends one query parameter.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Appends every query parameter from `params`.
	pub fn with_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		self.query.extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Sets a JSON body from a raw value.
	pub fn with_body(mut self, body: JsonValue) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `payload` into the JSON body.
	pub fn with_json<P>(self, payload: &P) -> Result<Self>
	where
		P: ?Sized + Serialize,
	{
		let body = serde_json::to_value(payload).map_err(Error::Encode)?;

		Ok(self.with_body(body))
	}

	/// Resolves the request against `config`, attaching `bearer` when present.
	pub fn prepare(
		&self,
		config: &ClientConfig,
		bearer: Option<TokenSecret>,
	) -> Result<PreparedRequest> {
		let mut url = config.endpoint(&self.path)?;

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(self.query.iter());
		}

		let body = self.body.as_ref().map(serde_json::to_vec).transpose().map_err(Error::Encode)?;

		Ok(PreparedRequest { method: self.method, url, bearer, body })
	}
}

/// Fully resolved request handed to an [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct PreparedRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL including the query string.
	pub url: Url,
	/// Access token sent as `Authorization: Bearer <token>`.
	pub bearer: Option<TokenSecret>,
	/// Encoded JSON body.
	pub body: Option<Vec<u8>>,
}

/// Status and body of a received response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Wraps a status and body.
	pub fn new(status: u16, body: Vec<u8>) -> Self {
		Self { status, body }
	}

	/// Returns `true` for any 2xx status.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	///
	/// An empty body decodes as `null`, so `Option<T>` and [`JsonValue`] accept `204` replies.
	pub fn json<T>(&self, endpoint: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let bytes: &[u8] = if self.body.is_empty() { b"null" } else { &self.body };
		let mut deserializer = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|source| Error::Decode {
			endpoint: endpoint.to_owned(),
			status: self.status,
			source,
		})
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the configured timeout.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder();

		if let Some(timeout) = config.timeout {
			builder = builder.timeout(timeout);
		}

		Ok(Self(builder.build()?))
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
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: PreparedRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let PreparedRequest { method, url, bearer, body } = request;
			let mut builder =
				self.0.request(method.into(), url).header(ACCEPT, "application/json");

			if let Some(token) = &bearer {
				builder = builder.bearer_auth(token.expose());
			}
			if let Some(body) = body {
				builder = builder.header(CONTENT_TYPE, "application/json").body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok::<_, TransportError>(ApiResponse::new(status, body))
		})
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => Self::GET,
			Method::Post => Self::POST,
			Method::Put => Self::PUT,
			Method::Patch => Self::PATCH,
			Method::Delete => Self::DELETE,
		}
	}
}
