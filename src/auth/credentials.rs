//! Credential pairs, user profiles, and the payloads exchanged with the auth endpoints.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access token plus the refresh token that mints its successors.
///
/// Both halves are persisted and cleared together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialPair {
	/// Short-lived bearer credential attached to every request.
	pub access_token: TokenSecret,
	/// Longer-lived credential spent once per refresh cycle.
	pub refresh_token: TokenSecret,
}
impl CredentialPair {
	/// Pairs the two tokens.
	pub fn new(access_token: impl Into<TokenSecret>, refresh_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
	}
}

/// Identifier issued by the API: numeric primary keys or opaque strings (UUIDs, slugs).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
	/// Numeric identifier.
	Number(u64),
	/// String identifier.
	Text(String),
}
impl Display for EntityId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Number(id) => write!(f, "{id}"),
			Self::Text(id) => f.write_str(id),
		}
	}
}
impl From<u64> for EntityId {
	fn from(value: u64) -> Self {
		Self::Number(value)
	}
}
impl From<&str> for EntityId {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}
impl From<String> for EntityId {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

/// Account role reported by the API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
	/// Regular shopper.
	#[default]
	Customer,
	/// Staff member with access to reports.
	Admin,
	/// Role this client does not know about.
	#[serde(other)]
	Unknown,
}

/// Profile of the signed-in user, persisted under the `user` key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
	/// Account identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<EntityId>,
	/// Account email.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Given name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	/// Account role.
	#[serde(default)]
	pub user_type: UserType,
	/// Any additional profile fields, kept verbatim.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl UserProfile {
	/// Returns `true` for staff accounts allowed into the reporting view.
	pub fn is_admin(&self) -> bool {
		self.user_type == UserType::Admin
	}

	/// Best display label: full name, then email, then identifier.
	pub fn display_name(&self) -> String {
		let full = [self.first_name.as_deref(), self.last_name.as_deref()]
			.into_iter()
			.flatten()
			.filter(|part| !part.is_empty())
			.collect::<Vec<_>>()
			.join(" ");

		if !full.is_empty() {
			return full;
		}

		match (&self.email, &self.id) {
			(Some(email), _) => email.clone(),
			(None, Some(id)) => format!("user {id}"),
			(None, None) => "guest".into(),
		}
	}
}

/// Login and registration response body.
///
/// The API returns the fields either at the top level or nested under `data`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AuthPayload {
	/// Newly issued access token.
	pub access_token: TokenSecret,
	/// Newly issued refresh token.
	pub refresh_token: TokenSecret,
	/// Profile of the authenticated user.
	#[serde(default)]
	pub user: Option<UserProfile>,
}
impl AuthPayload {
	/// Decodes a flat or `data`-nested payload.
	pub fn from_value(value: JsonValue, endpoint: &str) -> Result<Self> {
		let inner = match value {
			JsonValue::Object(mut object)
				if !object.contains_key("access_token")
					&& object.get("data").is_some_and(JsonValue::is_object) =>
				object.remove("data").unwrap_or_default(),
			other => other,
		};

		serde_path_to_error::deserialize(inner).map_err(|source| Error::Decode {
			endpoint: endpoint.to_owned(),
			status: 200,
			source,
		})
	}

	/// Returns the issued credential pair.
	pub fn credentials(&self) -> CredentialPair {
		CredentialPair {
			access_token: self.access_token.clone(),
			refresh_token: self.refresh_token.clone(),
		}
	}
}

/// Refresh endpoint response: a new access token and, optionally, a rotated refresh token.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RefreshGrant {
	/// Replacement access token.
	pub access: TokenSecret,
	/// Rotated refresh token, when the API issues one.
	#[serde(default)]
	pub refresh: Option<TokenSecret>,
}

/// Refresh endpoint request body.
#[derive(Clone, Debug, Serialize)]
pub struct RefreshRequest<'a> {
	/// Stored refresh token.
	pub refresh: &'a TokenSecret,
}

/// Login form.
#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: TokenSecret,
}
impl LoginRequest {
	/// Creates a login form.
	pub fn new(email: impl Into<String>, password: impl Into<TokenSecret>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}

/// Registration form.
#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: TokenSecret,
	/// Password confirmation, when the API asks for it.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub password_confirm: Option<TokenSecret>,
	/// Given name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	/// Additional registration fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl RegisterRequest {
	/// Creates a registration form with only the required fields.
	pub fn new(email: impl Into<String>, password: impl Into<TokenSecret>) -> Self {
		Self {
			email: email.into(),
			password: password.into(),
			password_confirm: None,
			first_name: None,
			last_name: None,
			extra: JsonMap::new(),
		}
	}
}

/// Password change form.
#[derive(Clone, Debug, Serialize)]
pub struct PasswordChange {
	/// Current password.
	pub old_password: TokenSecret,
	/// Replacement password.
	pub new_password: TokenSecret,
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn auth_payload_accepts_flat_and_nested_bodies() {
		let flat = json!({
			"access_token": "a1",
			"refresh_token": "r1",
			"user": { "id": 7, "email": "ada@example.com", "user_type": "admin" }
		});
		let nested = json!({ "status": "ok", "data": flat.clone() });

		for body in [flat, nested] {
			let payload =
				AuthPayload::from_value(body, "/auth/login/").expect("Payload should decode.");

			assert_eq!(payload.credentials(), CredentialPair::new("a1", "r1"));

			let user = payload.user.expect("User should be present.");

			assert_eq!(user.id, Some(EntityId::Number(7)));
			assert!(user.is_admin());
		}
	}

	#[test]
	fn auth_payload_reports_missing_tokens() {
		let err = AuthPayload::from_value(json!({ "data": { "access_token": "a1" } }), "/auth/login/")
			.expect_err("Payloads without a refresh token should be rejected.");

		assert!(matches!(err, Error::Decode { ref endpoint, .. } if endpoint == "/auth/login/"));
	}

	#[test]
	fn profiles_keep_unknown_fields_and_roles() {
		let profile: UserProfile = serde_json::from_value(json!({
			"id": "9b2c",
			"email": "sam@example.com",
			"user_type": "warehouse",
			"phone": "555-0100"
		}))
		.expect("Profile should decode.");

		assert_eq!(profile.user_type, UserType::Unknown);
		assert_eq!(profile.extra.get("phone"), Some(&json!("555-0100")));
		assert_eq!(profile.display_name(), "sam@example.com");
		assert!(!profile.is_admin());
	}

	#[test]
	fn refresh_request_serializes_bare_token() {
		let token = TokenSecret::new("r1");
		let body = serde_json::to_value(RefreshRequest { refresh: &token })
			.expect("Refresh request should serialize.");

		assert_eq!(body, json!({ "refresh": "r1" }));
	}
}
