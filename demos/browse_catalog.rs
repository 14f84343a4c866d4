//! Demonstrates browsing the catalog anonymously, signing in, and filling the local cart
//! against a mocked storefront API.
//!
//! Set `STOREFRONT_API_BASE_URL` to point the client at a live API instead of the mock.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use storefront_client::{
	auth::LoginRequest,
	cart::LocalCart,
	client::ReqwestApiClient,
	config::{BASE_URL_ENV, ClientConfig},
	notify::NotificationLog,
	services::ListQuery,
	session::Session,
	store::{ClientStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let config = match env::var(BASE_URL_ENV) {
		Ok(_) => ClientConfig::from_env()?,
		Err(_) =>
			ClientConfig::builder().base_url(format!("http://{}/api/v1", server.address())).build()?,
	};

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/products/").query_param("search", "tea");
			then.status(200).json_body(serde_json::json!({
				"count": 1,
				"results": [{ "id": 1, "name": "Green tea", "price": "6.50", "stock_quantity": 12 }]
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/login/");
			then.status(200).json_body(serde_json::json!({
				"access_token": "demo-access",
				"refresh_token": "demo-refresh",
				"user": { "id": 1, "email": "demo@example.com", "first_name": "Demo" }
			}));
		})
		.await;

	let store: Arc<dyn ClientStore> = Arc::new(MemoryStore::default());
	let notifications = NotificationLog::default();
	let client = ReqwestApiClient::new(config, store)?.with_notifier(notifications.clone());
	let listing = client.catalog().products(&ListQuery::new().search("tea")).await?;

	println!("found {} product(s)", listing.total());

	let session = Session::new(client.clone());
	let user = session.login(&LoginRequest::new("demo@example.com", "demo-password")).await?;

	println!("signed in as {}", user.display_name());

	let cart = LocalCart::for_client(&client).await?;

	for product in listing.into_items() {
		cart.add(product, 2).await?;
	}

	println!("cart holds {} item(s) totalling {:.2}", cart.item_count(), cart.total());

	for message in notifications.messages() {
		println!("notification: {message}");
	}

	Ok(())
}
