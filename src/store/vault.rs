//! Typed view over the credential keys of a [`ClientStore`].

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret, UserProfile},
	store::{
		ACCESS_TOKEN_KEY, ClientStore, REFRESH_TOKEN_KEY, StoreBatch, StoreError, USER_KEY,
	},
};

/// Reads and writes the access token, refresh token, and cached profile.
///
/// Both tokens are always written or cleared in the same [`StoreBatch`]. Empty strings read
/// back as absent.
#[derive(Clone)]
pub struct CredentialVault {
	store: Arc<dyn ClientStore>,
}
impl CredentialVault {
	/// Wraps a shared store.
	pub fn new(store: Arc<dyn ClientStore>) -> Self {
		Self { store }
	}

	/// Underlying store, shared with other views such as the local cart.
	pub fn store(&self) -> &Arc<dyn ClientStore> {
		&self.store
	}

	/// Stored access token.
	pub async fn access_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		self.secret(ACCESS_TOKEN_KEY).await
	}

	/// Stored refresh token.
	pub async fn refresh_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		self.secret(REFRESH_TOKEN_KEY).await
	}

	/// Both tokens, when both are present.
	pub async fn credentials(&self) -> Result<Option<CredentialPair>, StoreError> {
		let access = self.access_token().await?;
		let refresh = self.refresh_token().await?;

		Ok(access.zip(refresh).map(|(access_token, refresh_token)| CredentialPair {
			access_token,
			refresh_token,
		}))
	}

	/// Persists a freshly issued pair and, when known, the profile that came with it.
	pub async fn store_login(
		&self,
		pair: &CredentialPair,
		user: Option<&UserProfile>,
	) -> Result<(), StoreError> {
		let mut batch = StoreBatch::new()
			.set(ACCESS_TOKEN_KEY, pair.access_token.expose())
			.set(REFRESH_TOKEN_KEY, pair.refresh_token.expose());

		batch = match user {
			Some(user) => batch.set(USER_KEY, encode_user(user)?),
			None => batch.remove(USER_KEY),
		};

		self.store.apply(batch).await
	}

	/// Stores a refreshed access token and, when rotated, the new refresh token.
	pub async fn rotate(
		&self,
		access: &TokenSecret,
		refresh: Option<&TokenSecret>,
	) -> Result<(), StoreError> {
		let mut batch = StoreBatch::new().set(ACCESS_TOKEN_KEY, access.expose());

		if let Some(refresh) = refresh {
			batch = batch.set(REFRESH_TOKEN_KEY, refresh.expose());
		}

		self.store.apply(batch).await
	}

	/// Cached profile. An undecodable entry reads as absent.
	pub async fn user(&self) -> Result<Option<UserProfile>, StoreError> {
		let Some(raw) = self.store.get(USER_KEY).await? else {
			return Ok(None);
		};

		match serde_json::from_str(&raw) {
			Ok(user) => Ok(Some(user)),
			Err(_e) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %_e, "Discarding unreadable cached user profile.");

				Ok(None)
			},
		}
	}

	/// Replaces the cached profile.
	pub async fn store_user(&self, user: &UserProfile) -> Result<(), StoreError> {
		self.store.apply(StoreBatch::new().set(USER_KEY, encode_user(user)?)).await
	}

	/// Removes both tokens and the cached profile in one batch.
	pub async fn clear(&self) -> Result<(), StoreError> {
		self.store
			.apply(
				StoreBatch::new()
					.remove(ACCESS_TOKEN_KEY)
					.remove(REFRESH_TOKEN_KEY)
					.remove(USER_KEY),
			)
			.await
	}

	async fn secret(&self, key: &str) -> Result<Option<TokenSecret>, StoreError> {
		Ok(self.store.get(key).await?.and_then(TokenSecret::non_empty))
	}
}
impl Debug for CredentialVault {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialVault").finish_non_exhaustive()
	}
}

fn encode_user(user: &UserProfile) -> Result<String, StoreError> {
	serde_json::to_string(user).map_err(|e| StoreError::Serialization {
		message: format!("Failed to encode user profile: {e}"),
	})
}
