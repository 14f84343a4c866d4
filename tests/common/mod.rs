//! Shared fixtures for the reqwest-backed integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::prelude::*;
use serde_json::Value;
// self
use storefront_client::{
	auth::TokenSecret,
	client::ReqwestApiClient,
	config::ClientConfig,
	notify::{NotificationLog, RedirectLog},
	store::{ACCESS_TOKEN_KEY, ClientStore, MemoryStore, REFRESH_TOKEN_KEY, StoreBatch},
};

/// API prefix mounted on the mock server.
pub const API_PREFIX: &str = "/api/v1";

/// Mock server plus a client wired to in-memory sinks.
pub struct Harness {
	pub server: MockServer,
	pub store: MemoryStore,
	pub notifications: NotificationLog,
	pub redirects: RedirectLog,
	pub client: ReqwestApiClient,
}
impl Harness {
	pub async fn start() -> Self {
		let server = MockServer::start_async().await;
		let config = ClientConfig::builder()
			.base_url(format!("http://{}{API_PREFIX}", server.address()))
			.build()
			.expect("Mock server configuration should build.");

		Self::with_config(server, config)
	}

	pub fn with_config(server: MockServer, config: ClientConfig) -> Self {
		let store = MemoryStore::default();
		let notifications = NotificationLog::default();
		let redirects = RedirectLog::default();
		let shared: Arc<dyn ClientStore> = Arc::new(store.clone());
		let client = ReqwestApiClient::new(config, shared)
			.expect("Reqwest client should build for tests.")
			.with_notifier(notifications.clone())
			.with_redirect(redirects.clone());

		Self { server, store, notifications, redirects, client }
	}

	/// Seeds the credential pair; either half may be omitted.
	pub async fn seed_tokens(&self, access: Option<&str>, refresh: Option<&str>) {
		let mut batch = StoreBatch::new();

		if let Some(access) = access {
			batch = batch.set(ACCESS_TOKEN_KEY, access);
		}
		if let Some(refresh) = refresh {
			batch = batch.set(REFRESH_TOKEN_KEY, refresh);
		}

		self.store.apply(batch).await.expect("Seeding the memory store should succeed.");
	}

	pub async fn stored(&self, key: &str) -> Option<String> {
		self.store.get(key).await.expect("Reading the memory store should succeed.")
	}

	/// Full mock-server path for an API path.
	pub fn path(&self, path: &str) -> String {
		format!("{API_PREFIX}{path}")
	}
}

/// Builds an unsigned JWT-shaped token whose payload segment carries `claims`.
pub fn unsigned_token(claims: Value) -> TokenSecret {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

	TokenSecret::new(format!("{header}.{payload}.signature"))
}
