//! Authenticated request client with transparent, single-flight credential refresh.
//!
//! Every call attaches the stored access token. A `401` on the first attempt joins the
//! client's [`RefreshCoordinator`]: the first request to get there refreshes the pair while
//! later ones queue behind it, and every request is then retried exactly once with the new
//! token. A failed refresh, or a second `401`, clears the stored credentials and sends the
//! session to the login boundary. Other failures are classified into [`Error`] and
//! surfaced through the [`Notifier`] exactly once.

pub mod refresh;

pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{RefreshGrant, RefreshRequest, TokenSecret},
	config::ClientConfig,
	error::{ApiError, AuthFailure, AuthFailureKind},
	http::{ApiRequest, ApiResponse, HttpTransport},
	notify::{self, LoginRedirect, Notification, Notifier, TracingNotifier, TracingRedirect},
	obs::{self, OperationKind, OperationSpan, RefreshOutcomeLabel, StatusClass},
	store::{ClientStore, CredentialVault},
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Whether a request has already been retried after a refresh.
///
/// Passed alongside the request instead of being stored on it, so a retried request can
/// never start a second refresh cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
	Initial,
	Retried,
}

/// Storefront API client.
///
/// Clones share the transport, store, notification sinks, and refresh coordinator.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request.
	pub transport: Arc<T>,
	/// Base URL, timeout, and boundary paths.
	pub config: Arc<ClientConfig>,
	/// Typed view over the persisted credentials.
	pub vault: CredentialVault,
	/// Sink for user-facing notifications.
	pub notifier: Arc<dyn Notifier>,
	/// Navigation to the login boundary.
	pub redirect: Arc<dyn LoginRedirect>,
	/// Shared counters for refresh cycles.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh: Arc<RefreshCoordinator>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client over a caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn ClientStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			config: Arc::new(config),
			vault: CredentialVault::new(store),
			notifier: Arc::new(TracingNotifier),
			redirect: Arc::new(TracingRedirect),
			refresh_metrics: Default::default(),
			refresh: Default::default(),
		}
	}

	/// Replaces the notification sink.
	pub fn with_notifier(mut self, notifier: impl 'static + Notifier) -> Self {
		self.notifier = Arc::new(notifier);

		self
	}

	/// Replaces the login redirect.
	pub fn with_redirect(mut self, redirect: impl 'static + LoginRedirect) -> Self {
		self.redirect = Arc::new(redirect);

		self
	}

	/// Store shared by the vault, the session, and the local cart.
	pub fn store(&self) -> &Arc<dyn ClientStore> {
		self.vault.store()
	}

	/// Coordinator shared by every clone of this client.
	pub fn refresh_coordinator(&self) -> &Arc<RefreshCoordinator> {
		&self.refresh
	}

	/// Sends an authenticated request, recovering from an expired access token once.
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.observe(OperationKind::Request, "execute", &request, self.run(&request)).await
	}

	/// Sends a request without credentials or refresh recovery.
	///
	/// Used for login and registration, where a `401` means wrong credentials rather than an
	/// expired session.
	pub async fn execute_public(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.observe(OperationKind::PublicRequest, "execute_public", &request, async {
			let response = self.dispatch(&request, None).await?;

			if response.is_success() {
				Ok(response)
			} else {
				Err(ApiError::from_response(&response).into())
			}
		})
		.await
	}

	/// Sends an authenticated request and decodes the JSON response.
	pub async fn request_json<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let endpoint = request.path.clone();
		let response = self.execute(request).await?;

		response.json(&endpoint).map_err(|e| self.surface(e))
	}

	/// Sends a public request and decodes the JSON response.
	pub async fn public_json<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let endpoint = request.path.clone();
		let response = self.execute_public(request).await?;

		response.json(&endpoint).map_err(|e| self.surface(e))
	}

	/// Authenticated `GET`.
	pub async fn get(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.execute(ApiRequest::get(path)).await
	}

	/// Authenticated `POST` with a JSON body.
	pub async fn post<P>(&self, path: impl Into<String>, payload: &P) -> Result<ApiResponse>
	where
		P: ?Sized + Serialize,
	{
		self.execute(self.encode(ApiRequest::post(path), payload)?).await
	}

	/// Authenticated `PATCH` with a JSON body.
	pub async fn patch<P>(&self, path: impl Into<String>, payload: &P) -> Result<ApiResponse>
	where
		P: ?Sized + Serialize,
	{
		self.execute(self.encode(ApiRequest::patch(path), payload)?).await
	}

	/// Authenticated `DELETE`.
	pub async fn delete(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.execute(ApiRequest::delete(path)).await
	}

	/// Authenticated `GET` decoding the JSON response.
	pub async fn get_json<R>(&self, path: impl Into<String>) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.request_json(ApiRequest::get(path)).await
	}

	/// Authenticated `POST` decoding the JSON response.
	pub async fn post_json<P, R>(&self, path: impl Into<String>, payload: &P) -> Result<R>
	where
		P: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.request_json(self.encode(ApiRequest::post(path), payload)?).await
	}

	/// Authenticated `PATCH` decoding the JSON response.
	pub async fn patch_json<P, R>(&self, path: impl Into<String>, payload: &P) -> Result<R>
	where
		P: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.request_json(self.encode(ApiRequest::patch(path), payload)?).await
	}

	/// Surfaces `notification` through the configured sink.
	pub fn notify(&self, notification: Notification) {
		self.notifier.notify(notification);
	}

	/// Sends the session to the configured login boundary.
	pub fn redirect_to_login(&self) {
		self.redirect.redirect(&self.config.login_path);
	}

	/// Surfaces the notification derived from `error` and hands the error back.
	pub(crate) fn surface(&self, error: Error) -> Error {
		if let Some(notification) = notify::failure_notification(&error) {
			self.notify(notification);
		}

		error
	}

	/// Clears stored credentials, logging (not propagating) storage failures.
	pub(crate) async fn discard_credentials(&self) {
		if let Err(_e) = self.vault.clear().await {
			#[cfg(feature = "tracing")]
			tracing::warn!(error = %_e, "Failed to clear stored credentials.");
		}
	}

	fn encode<P>(&self, request: ApiRequest, payload: &P) -> Result<ApiRequest>
	where
		P: ?Sized + Serialize,
	{
		request.with_json(payload).map_err(|e| self.surface(e))
	}

	async fn observe<F>(
		&self,
		kind: OperationKind,
		stage: &'static str,
		request: &ApiRequest,
		fut: F,
	) -> Result<ApiResponse>
	where
		F: Future<Output = Result<ApiResponse>>,
	{
		let span = OperationSpan::new(kind, stage);

		span.record_request(request.method.as_str(), &request.path);

		let result = span.instrument(fut).await;

		obs::record_call(kind, status_class(&result));

		result.map_err(|e| self.surface(e))
	}

	async fn run(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let mut attempt = Attempt::Initial;
		let mut bearer = self.vault.access_token().await?;

		loop {
			let response = self.dispatch(request, bearer.take()).await?;

			if response.is_success() {
				return Ok(response);
			}

			let error = ApiError::from_response(&response);

			if !matches!(error, ApiError::Unauthorized { .. }) {
				return Err(error.into());
			}

			match attempt {
				Attempt::Initial => {
					bearer = Some(self.recover(&error).await?);
					attempt = Attempt::Retried;
				},
				Attempt::Retried => return Err(self.reject_retried(&error).await),
			}
		}
	}

	async fn dispatch(
		&self,
		request: &ApiRequest,
		bearer: Option<TokenSecret>,
	) -> Result<ApiResponse> {
		let prepared = request.prepare(&self.config, bearer)?;

		Ok(self.transport.send(prepared).await?)
	}

	/// Obtains a fresh access token, either by leading a refresh cycle or by waiting on one.
	///
	/// A cycle whose leader was dropped before settling carries no verdict on the stored
	/// credentials, so its waiters join the next cycle instead of failing.
	async fn recover(&self, original: &ApiError) -> Result<TokenSecret> {
		loop {
			let waiter = match self.refresh.join() {
				RefreshRole::Leader(ticket) => return self.lead(ticket, original).await,
				RefreshRole::Waiter(waiter) => waiter,
			};

			self.refresh_metrics.record_queued();
			obs::record_refresh(RefreshOutcomeLabel::Queued);

			match waiter.wait().await {
				Err(failure) if failure.kind == AuthFailureKind::Cancelled => {
					#[cfg(feature = "tracing")]
					tracing::debug!("Refresh leader went away; rejoining.");
				},
				outcome => return Ok(outcome?),
			}
		}
	}

	async fn lead(&self, ticket: RefreshTicket, original: &ApiError) -> Result<TokenSecret> {
		let span = OperationSpan::new(OperationKind::Refresh, "refresh_credentials");

		self.refresh_metrics.record_attempt();
		obs::record_refresh(RefreshOutcomeLabel::Attempt);

		let outcome = span.instrument(self.refresh_credentials(original)).await;

		match &outcome {
			Ok(_) => {
				self.refresh_metrics.record_success();
				obs::record_refresh(RefreshOutcomeLabel::Success);
			},
			Err(_) => {
				self.refresh_metrics.record_failure();
				obs::record_refresh(RefreshOutcomeLabel::Failure);
			},
		}

		ticket.settle(outcome.clone());

		if outcome.is_err() {
			self.redirect_to_login();
		}

		Ok(outcome?)
	}

	/// Runs one refresh cycle. Credentials are rotated on success and cleared on failure,
	/// before any queued request resumes.
	async fn refresh_credentials(&self, original: &ApiError) -> RefreshOutcome {
		let refresh = match self.vault.refresh_token().await {
			Ok(Some(refresh)) => refresh,
			Ok(None) => {
				self.discard_credentials().await;

				return Err(AuthFailure::missing_refresh_token(original));
			},
			Err(e) => {
				self.discard_credentials().await;

				return Err(AuthFailure::from_error(AuthFailureKind::Storage, &e));
			},
		};
		let failure = match self.request_refresh(&refresh).await {
			Ok(grant) => match self.vault.rotate(&grant.access, grant.refresh.as_ref()).await {
				Ok(()) => return Ok(grant.access),
				Err(e) => AuthFailure::from_error(AuthFailureKind::Storage, &e),
			},
			Err(failure) => failure,
		};

		#[cfg(feature = "tracing")]
		tracing::warn!(kind = failure.kind.as_str(), "Refresh cycle failed; clearing credentials.");

		self.discard_credentials().await;

		Err(failure)
	}

	async fn request_refresh(&self, refresh: &TokenSecret) -> Result<RefreshGrant, AuthFailure> {
		let endpoint = self.config.refresh_path.as_str();
		let request = ApiRequest::post(endpoint)
			.with_json(&RefreshRequest { refresh })
			.map_err(|e| AuthFailure::from_error(AuthFailureKind::RefreshMalformed, &e))?;
		let response = self
			.dispatch(&request, None)
			.await
			.map_err(|e| AuthFailure::from_error(AuthFailureKind::RefreshUnreachable, &e))?;

		if !response.is_success() {
			return Err(AuthFailure::rejected(&ApiError::from_response(&response)));
		}

		response.json::<RefreshGrant>(endpoint).map_err(|e| {
			AuthFailure::from_error(AuthFailureKind::RefreshMalformed, &e)
				.with_status(response.status)
		})
	}

	async fn reject_retried(&self, error: &ApiError) -> Error {
		self.discard_credentials().await;

		if self.refresh.claim_rejection() {
			self.redirect_to_login();
		}

		AuthFailure::retry_rejected(error).into()
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client with its own reqwest transport honoring the configured timeout.
	pub fn new(config: ClientConfig, store: Arc<dyn ClientStore>) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::from_config(&config)?;

		Ok(Self::with_transport(config, store, transport))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			config: self.config.clone(),
			vault: self.vault.clone(),
			notifier: self.notifier.clone(),
			redirect: self.redirect.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh: self.refresh.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("config", &self.config)
			.field("refresh", &self.refresh)
			.finish()
	}
}

fn status_class(result: &Result<ApiResponse>) -> StatusClass {
	match result {
		Ok(response) => StatusClass::from_status(response.status),
		Err(Error::Api(error)) => StatusClass::from_status(error.status()),
		Err(Error::SessionExpired(AuthFailure { status: Some(status), .. })) =>
			StatusClass::from_status(*status),
		Err(Error::Transport(_)) => StatusClass::Network,
		Err(_) => StatusClass::Local,
	}
}
