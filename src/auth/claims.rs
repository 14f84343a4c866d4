//! Unverified access-token claims.
//!
//! The signature is never checked here. Claims only seed a provisional profile while the
//! session restores; the API remains the authority on whether a token is valid.

// crates.io
use base64::{
	Engine,
	engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
};
// self
use crate::{
	_prelude::*,
	auth::{EntityId, TokenSecret, UserProfile, UserType},
};

/// Failures raised while reading a token's payload segment.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// The token does not have three dot-separated segments.
	#[error("Token is not a three-segment JWT.")]
	Malformed,
	/// The payload segment is not valid base64.
	#[error("Token payload is not valid base64.")]
	Encoding(#[source] base64::DecodeError),
	/// The payload segment is not a JSON claims object.
	#[error("Token payload is not a JSON claims object.")]
	Payload(#[source] serde_json::Error),
}

/// Claims read from an access token without verifying its signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UnverifiedClaims {
	/// Subject identifier.
	#[serde(default)]
	pub user_id: Option<EntityId>,
	/// Subject email.
	#[serde(default)]
	pub email: Option<String>,
	/// Subject role.
	#[serde(default)]
	pub user_type: Option<UserType>,
	/// Expiry as seconds since the Unix epoch.
	#[serde(default)]
	pub exp: Option<i64>,
}
impl UnverifiedClaims {
	/// Decodes the payload segment of `token`.
	pub fn decode(token: &TokenSecret) -> Result<Self, ClaimsError> {
		let mut segments = token.expose().split('.');
		let (Some(_), Some(payload), Some(_), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(ClaimsError::Malformed);
		};
		let payload = payload.trim_end_matches('=');
		let bytes = URL_SAFE_NO_PAD
			.decode(payload)
			.or_else(|_| STANDARD_NO_PAD.decode(payload))
			.map_err(ClaimsError::Encoding)?;

		serde_json::from_slice(&bytes).map_err(ClaimsError::Payload)
	}

	/// Expiry instant, when the token carries one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.exp.and_then(|exp| OffsetDateTime::from_unix_timestamp(exp).ok())
	}

	/// Returns `true` once `now` has reached the expiry. Tokens without `exp` never expire.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		match self.exp {
			Some(exp) => now.unix_timestamp() >= exp,
			None => false,
		}
	}

	/// Provisional profile built from the claims.
	pub fn display_profile(&self) -> UserProfile {
		UserProfile {
			id: self.user_id.clone(),
			email: self.email.clone(),
			user_type: self.user_type.unwrap_or_default(),
			..Default::default()
		}
	}
}

/// Returns `true` when `token` is absent, unreadable, or past its expiry.
pub fn token_looks_expired(token: Option<&TokenSecret>, now: OffsetDateTime) -> bool {
	match token.map(UnverifiedClaims::decode) {
		Some(Ok(claims)) => claims.is_expired_at(now),
		_ => true,
	}
}
