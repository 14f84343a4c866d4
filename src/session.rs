//! Signed-in user state, restored from the store and updated by auth transitions.
//!
//! The in-memory state is a snapshot: when the client clears credentials after a failed
//! refresh it redirects to the login boundary, and the host is expected to call
//! [`Session::restore`] again when it lands there.

// self
use crate::{
	_prelude::*,
	auth::{
		AuthPayload, LoginRequest, PasswordChange, RegisterRequest, UnverifiedClaims, UserProfile,
	},
	client::ApiClient,
	http::HttpTransport,
	notify::Notification,
	obs::{OperationKind, OperationSpan},
};

/// Where the current profile came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileSource {
	/// Returned by the login or registration endpoint, or fetched from the profile endpoint.
	Api,
	/// Read from the store.
	Cached,
	/// Reconstructed from the access token's unverified claims. Display only.
	UnverifiedClaims,
}

/// Authentication state of a [`Session`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
	/// No usable credentials.
	#[default]
	Anonymous,
	/// Credentials are stored and a profile is known.
	Authenticated {
		/// Current profile.
		user: UserProfile,
		/// Provenance of `user`.
		source: ProfileSource,
	},
}
impl SessionState {
	/// Current profile, if authenticated.
	pub fn user(&self) -> Option<&UserProfile> {
		match self {
			Self::Anonymous => None,
			Self::Authenticated { user, .. } => Some(user),
		}
	}
}

/// Session store over an [`ApiClient`].
pub struct Session<T>
where
	T: ?Sized + HttpTransport,
{
	client: ApiClient<T>,
	state: RwLock<SessionState>,
	transitions: AsyncMutex<()>,
}
impl<T> Session<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates an anonymous session; call [`Session::restore`] to load stored credentials.
	pub fn new(client: ApiClient<T>) -> Self {
		Self {
			client,
			state: RwLock::new(SessionState::Anonymous),
			transitions: AsyncMutex::new(()),
		}
	}

	/// Client backing the session.
	pub fn client(&self) -> &ApiClient<T> {
		&self.client
	}

	/// Rebuilds the state from the store.
	///
	/// With both tokens stored, the cached profile wins; without one, the access token's
	/// claims provide a display profile that is then cached. Credentials whose token cannot
	/// be decoded are cleared.
	pub async fn restore(&self) -> Result<SessionState> {
		let _transition = self.transitions.lock().await;
		let span = OperationSpan::new(OperationKind::Session, "restore");
		let result = span.instrument(self.load_state()).await;
		let state = match result {
			Ok(state) => state,
			Err(e) => {
				self.client.discard_credentials().await;
				self.set_state(SessionState::Anonymous);

				return Err(e);
			},
		};

		self.set_state(state.clone());

		Ok(state)
	}

	/// Signs in and persists the issued credentials and profile.
	pub async fn login(&self, credentials: &LoginRequest) -> Result<UserProfile> {
		let _transition = self.transitions.lock().await;
		let span = OperationSpan::new(OperationKind::Session, "login");
		let payload = span.instrument(self.client.account().login(credentials)).await?;
		let user = self.accept(payload).await?;

		self.client.notify(Notification::success("Login successful!"));

		Ok(user)
	}

	/// Creates an account, then signs in with the issued credentials.
	pub async fn register(&self, details: &RegisterRequest) -> Result<UserProfile> {
		let _transition = self.transitions.lock().await;
		let span = OperationSpan::new(OperationKind::Session, "register");
		let payload = span.instrument(self.client.account().register(details)).await?;
		let user = self.accept(payload).await?;

		self.client.notify(Notification::success("Registration successful!"));

		Ok(user)
	}

	/// Clears credentials and sends the session to the login boundary.
	pub async fn logout(&self) -> Result<()> {
		let _transition = self.transitions.lock().await;

		self.client.vault.clear().await?;
		self.set_state(SessionState::Anonymous);
		self.client.notify(Notification::info("Logged out successfully"));
		self.client.redirect_to_login();

		Ok(())
	}

	/// Replaces and caches the current profile.
	pub async fn update_user(&self, user: UserProfile) -> Result<()> {
		let _transition = self.transitions.lock().await;

		self.client.vault.store_user(&user).await?;
		self.set_state(SessionState::Authenticated { user, source: ProfileSource::Api });

		Ok(())
	}

	/// Fetches the profile from the API and caches it.
	pub async fn fetch_profile(&self) -> Result<UserProfile> {
		let user = self.client.account().profile().await?;

		self.update_user(user.clone()).await?;

		Ok(user)
	}

	/// Sends profile changes and caches the returned profile.
	pub async fn update_profile(&self, changes: &JsonMap<String, JsonValue>) -> Result<UserProfile> {
		let user = self.client.account().update_profile(changes).await?;

		self.update_user(user.clone()).await?;
		self.client.notify(Notification::success("Profile updated successfully"));

		Ok(user)
	}

	/// Changes the account password.
	pub async fn change_password(&self, change: &PasswordChange) -> Result<()> {
		self.client.account().change_password(change).await?;
		self.client.notify(Notification::success("Password changed successfully"));

		Ok(())
	}

	/// Snapshot of the state.
	pub fn state(&self) -> SessionState {
		self.state.read().clone()
	}

	/// Current profile, if authenticated.
	pub fn current_user(&self) -> Option<UserProfile> {
		self.state.read().user().cloned()
	}

	/// Returns `true` while authenticated.
	pub fn is_authenticated(&self) -> bool {
		matches!(*self.state.read(), SessionState::Authenticated { .. })
	}

	/// Returns `true` when the current profile is an admin account.
	pub fn is_admin(&self) -> bool {
		self.state.read().user().is_some_and(UserProfile::is_admin)
	}

	async fn load_state(&self) -> Result<SessionState> {
		let Some(pair) = self.client.vault.credentials().await? else {
			return Ok(SessionState::Anonymous);
		};

		if let Some(user) = self.client.vault.user().await? {
			return Ok(SessionState::Authenticated { user, source: ProfileSource::Cached });
		}

		match UnverifiedClaims::decode(&pair.access_token) {
			Ok(claims) => {
				let user = claims.display_profile();

				self.client.vault.store_user(&user).await?;

				Ok(SessionState::Authenticated { user, source: ProfileSource::UnverifiedClaims })
			},
			Err(_e) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %_e, "Stored access token is unreadable; clearing credentials.");

				self.client.vault.clear().await?;

				Ok(SessionState::Anonymous)
			},
		}
	}

	async fn accept(&self, payload: AuthPayload) -> Result<UserProfile> {
		let pair = payload.credentials();
		let (user, source) = match payload.user {
			Some(user) => (user, ProfileSource::Api),
			None => (
				UnverifiedClaims::decode(&pair.access_token)
					.map(|claims| claims.display_profile())
					.unwrap_or_default(),
				ProfileSource::UnverifiedClaims,
			),
		};

		self.client.vault.store_login(&pair, Some(&user)).await?;
		self.set_state(SessionState::Authenticated { user: user.clone(), source });

		Ok(user)
	}

	fn set_state(&self, state: SessionState) {
		*self.state.write() = state;
	}
}
impl<T> Debug for Session<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session").field("state", &*self.state.read()).finish()
	}
}
