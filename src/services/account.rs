//! Authentication and profile endpoints.

// self
use crate::{
	_prelude::*,
	auth::{AuthPayload, LoginRequest, PasswordChange, RegisterRequest, UserProfile},
	client::ApiClient,
	http::{ApiRequest, HttpTransport},
};

const LOGIN_PATH: &str = "/auth/login/";
const REGISTER_PATH: &str = "/auth/register/";
const PROFILE_PATH: &str = "/auth/profile/";
const CHANGE_PASSWORD_PATH: &str = "/auth/change-password/";

/// Account endpoints. Login and registration are public calls; the rest are authenticated.
#[derive(Debug)]
pub struct AccountService<'a, T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) client: &'a ApiClient<T>,
}
impl<T> AccountService<'_, T>
where
	T: ?Sized + HttpTransport,
{
	/// `POST /auth/login/`.
	pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthPayload> {
		self.public_auth(LOGIN_PATH, credentials).await
	}

	/// `POST /auth/register/`.
	pub async fn register(&self, details: &RegisterRequest) -> Result<AuthPayload> {
		self.public_auth(REGISTER_PATH, details).await
	}

	/// `GET /auth/profile/`.
	pub async fn profile(&self) -> Result<UserProfile> {
		self.client.get_json(PROFILE_PATH).await
	}

	/// `PATCH /auth/profile/` with the changed fields.
	pub async fn update_profile(&self, changes: &JsonMap<String, JsonValue>) -> Result<UserProfile> {
		self.client.patch_json(PROFILE_PATH, changes).await
	}

	/// `POST /auth/change-password/`.
	pub async fn change_password(&self, change: &PasswordChange) -> Result<()> {
		self.client.post(CHANGE_PASSWORD_PATH, change).await.map(drop)
	}

	async fn public_auth<P>(&self, path: &str, payload: &P) -> Result<AuthPayload>
	where
		P: Serialize,
	{
		let request = ApiRequest::post(path).with_json(payload).map_err(|e| self.client.surface(e))?;
		let body = self.client.public_json::<JsonValue>(request).await?;

		AuthPayload::from_value(body, path).map_err(|e| self.client.surface(e))
	}
}
