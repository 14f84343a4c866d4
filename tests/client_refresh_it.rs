#![cfg(feature = "reqwest")]

mod common;

// std
use std::time::Duration;
// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use common::Harness;
use storefront_client::{
	config::ClientConfig,
	error::{ApiError, AuthFailureKind, Error},
	notify::{NETWORK_ERROR_MESSAGE, NotificationLevel},
	store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY},
};

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried_once() {
	let h = Harness::start().await;

	h.seed_tokens(Some("a1"), Some("r1")).await;

	let expired = h
		.server
		.mock_async(|when, then| {
			when.method(GET).path(h.path("/orders/")).header("authorization", "Bearer a1");
			then.status(401).json_body(json!({ "detail": "Token is invalid or expired" }));
		})
		.await;
	let refresh = h
		.server
		.mock_async(|when, then| {
			when.method(POST).path(h.path("/auth/refresh/")).json_body(json!({ "refresh": "r1" }));
			then.status(200).json_body(json!({ "access": "a2", "refresh": "r2" }));
		})
		.await;
	let fresh = h
		.server
		.mock_async(|when, then| {
			when.method(GET).path(h.path("/orders/")).header("authorization", "Bearer a2");
			then.status(200).json_body(json!([{ "id": 1, "status": "pending" }]));
		})
		.await;
	let body: Value = h.client.get_json("/orders/").await.expect("Retried request should succeed.");

	expired.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;

	assert_eq!(body, json!([{ "id": 1, "status": "pending" }]));
	assert_eq!(h.stored(ACCESS_TOKEN_KEY).await.as_deref(), Some("a2"));
	assert_eq!(h.stored(REFRESH_TOKEN_KEY).await.as_deref(), Some("r2"));
	assert_eq!(h.client.refresh_metrics.attempts(), 1);
	assert_eq!(h.client.refresh_metrics.successes(), 1);
	assert!(h.notifications.entries().is_empty());
	assert_eq!(h.redirects.count(), 0);
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() {
	let h = Harness::start().await;

	h.seed_tokens(Some("a1"), Some("r1")).await;

	for path in ["/products/", "/cart/", "/orders/"] {
		h.server
			.mock_async(|when, then| {
				when.method(GET).path(h.path(path)).header("authorization", "Bearer a1");
				then.status(401);
			})
			.await;
		h.server
			.mock_async(|when, then| {
				when.method(GET).path(h.path(path)).header("authorization", "Bearer a2");
				then.status(200).json_body(json!({ "path": path }));
			})
			.await;
	}

	let refresh = h
		.server
		.mock_async(|when, then| {
			when.method(POST).path(h.path("/auth/refresh/"));
			then.status(200)
				.delay(Duration::from_millis(300))
				.json_body(json!({ "access": "a2" }));
		})
		.await;
	let (products, cart, orders) = tokio::join!(
		h.client.get_json::<Value>("/products/"),
		h.client.get_json::<Value>("/cart/"),
		h.client.get_json::<Value>("/orders/"),
	);

	refresh.assert_calls_async(1).await;

	assert_eq!(products.expect("Products should succeed after refresh.")["path"], "/products/");
	assert_eq!(cart.expect("Cart should succeed after refresh.")["path"], "/cart/");
	assert_eq!(orders.expect("Orders should succeed after refresh.")["path"], "/orders/");
	assert_eq!(h.client.refresh_metrics.attempts(), 1);
	assert_eq!(h.client.refresh_metrics.queued(), 2);
	assert_eq!(h.stored(REFRESH_TOKEN_KEY).await.as_deref(), Some("r1"));
	assert!(!h.client.refresh_coordinator().is_refreshing());
	assert_eq!(h.client.refresh_coordinator().pending(), 0);
}

#[tokio::test]
async fn rejected_refresh_fails_every_waiter_and_clears_credentials() {
	let h = Harness::start().await;

	h.seed_tokens(Some("a1"), Some("r1")).await;
	h.server
		.mock_async(|when, then| {
			when.method(GET).header("authorization", "Bearer a1");
			then.status(401);
		})
		.await;

	let refresh = h
		.server
		.mock_async(|when, then| {
			when.method(POST).path(h.path("/auth/refresh/"));
			then.status(401)
				.delay(Duration::from_millis(300))
				.json_body(json!({ "detail": "Token is blacklisted" }));
		})
		.await;
	let (first, second) =
		tokio::join!(h.client.get("/orders/"), h.client.get("/reports/summary/"));

	refresh.assert_calls_async(1).await;

	for result in [first, second] {
		let Err(Error::SessionExpired(failure)) = result else {
			panic!("Waiters should share the refresh failure.");
		};

		assert_eq!(failure.kind, AuthFailureKind::RefreshRejected);
		assert_eq!(failure.status, Some(401));
		assert_eq!(failure.message, "Token is blacklisted");
	}

	assert_eq!(h.stored(ACCESS_TOKEN_KEY).await, None);
	assert_eq!(h.stored(REFRESH_TOKEN_KEY).await, None);
	assert_eq!(h.redirects.paths(), ["/login"]);
	assert!(h.notifications.entries().is_empty());
	assert_eq!(h.client.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn missing_refresh_token_short_circuits() {
	let h = Harness::start().await;

	h.seed_tokens(Some("a1"), None).await;
	h.server
		.mock_async(|when, then| {
			when.method(GET).path(h.path("/cart/"));
			then.status(401).json_body(json!({ "detail": "Token is invalid or expired" }));
		})
		.await;

	let refresh = h
		.server
		.mock_async(|when, then| {
			when.method(POST).path(h.path("/auth/refresh/"));
			then.status(200).json_body(json!({ "access": "never" }));
		})
		.await;
	let err = h.client.get("/cart/").await.expect_err("A 401 without a refresh token should fail.");

	refresh.assert_calls_async(0).await;

	assert!(matches!(
		err,
		Error::SessionExpired(ref failure) if failure.kind == AuthFailureKind::MissingRefreshToken
	));
	assert_eq!(h.stored(ACCESS_TOKEN_KEY).await, None);
	assert_eq!(h.redirects.count(), 1);
}

#[tokio::test]
async fn second_401_after_refresh_is_terminal() {
	let h = Harness::start().await;

	h.seed_tokens(Some("a1"), Some("r1")).await;

	let protected = h
		.server
		.mock_async(|when, then| {
			when.method(GET).path(h.path("/reports/summary/"));
			then.status(401).json_body(json!({ "detail": "Token is invalid or expired" }));
		})
		.await;
	let refresh = h
		.server
		.mock_async(|when, then| {
			when.method(POST).path(h.path("/auth/refresh/"));
			then.status(200).json_body(json!({ "access": "a2", "refresh": "r2" }));
		})
		.await;
	let err = h
		.client
		.get("/reports/summary/")
		.await
		.expect_err("A 401 on the retried request should be terminal.");

	protected.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;

	assert!(matches!(
		err,
		Error::SessionExpired(ref failure) if failure.kind == AuthFailureKind::RetryRejected
	));
	assert_eq!(h.stored(ACCESS_TOKEN_KEY).await, None);
	assert_eq!(h.stored(REFRESH_TOKEN_KEY).await, None);
	assert_eq!(h.redirects.count(), 1);
	assert_eq!(h.notifications.messages(), ["Token is invalid or expired"]);
}

#[tokio::test]
async fn non_401_failures_notify_without_refreshing() {
	let h = Harness::start().await;

	h.seed_tokens(Some("a1"), Some("r1")).await;
	h.server
		.mock_async(|when, then| {
			when.method(GET).path(h.path("/reports/summary/"));
			then.status(403).json_body(json!({ "detail": "Admins only." }));
		})
		.await;
	h.server
		.mock_async(|when, then| {
			when.method(GET).path(h.path("/products/404/"));
			then.status(404);
		})
		.await;
	h.server
		.mock_async(|when, then| {
			when.method(GET).path(h.path("/orders/"));
			then.status(503).body("upstream unavailable");
		})
		.await;
	h.server
		.mock_async(|when, then| {
			when.method(POST).path(h.path("/cart/"));
			then.status(400).json_body(json!({
				"quantity": ["Ensure this value is greater than or equal to 1."]
			}));
		})
		.await;

	let refresh = h
		.server
		.mock_async(|when, then| {
			when.method(POST).path(h.path("/auth/refresh/"));
			then.status(200).json_body(json!({ "access": "a2" }));
		})
		.await;
	let forbidden = h.client.get("/reports/summary/").await.expect_err("403 should fail.");
	let missing = h.client.get("/products/404/").await.expect_err("404 should fail.");
	let server = h.client.get("/orders/").await.expect_err("503 should fail.");
	let invalid = h
		.client
		.post("/cart/", &json!({ "product_id": 1, "quantity": 0 }))
		.await
		.expect_err("400 should fail.");

	refresh.assert_calls_async(0).await;

	assert!(matches!(forbidden, Error::Api(ApiError::Forbidden { .. })));
	assert!(matches!(missing, Error::Api(ApiError::NotFound { .. })));
	assert!(matches!(server, Error::Api(ApiError::Server { status: 503, .. })));
	assert!(matches!(invalid, Error::Api(ApiError::Validation { status: 400, .. })));
	assert_eq!(
		h.notifications.messages(),
		[
			"Admins only.",
			"Resource not found.",
			"Server error. Please try again later.",
			"quantity: Ensure this value is greater than or equal to 1.",
		]
	);
	assert!(h.notifications.entries().iter().all(|n| n.level == NotificationLevel::Error));
	assert_eq!(h.stored(ACCESS_TOKEN_KEY).await.as_deref(), Some("a1"));
	assert_eq!(h.redirects.count(), 0);
}

#[tokio::test]
async fn anonymous_requests_omit_the_authorization_header() {
	let h = Harness::start().await;
	let products = h
		.server
		.mock_async(|when, then| {
			when.method(GET)
				.path(h.path("/products/"))
				.query_param("search", "mug")
				.header_missing("authorization");
			then.status(200).json_body(json!({ "count": 0, "results": [] }));
		})
		.await;
	let listing = h
		.client
		.catalog()
		.products(&storefront_client::services::ListQuery::new().search("mug"))
		.await
		.expect("Anonymous catalog browsing should succeed.");

	products.assert_calls_async(1).await;

	assert_eq!(listing.total(), 0);
}

#[tokio::test]
async fn unreachable_api_surfaces_network_notification() {
	let server = MockServer::start_async().await;
	let config = ClientConfig::builder()
		.base_url("http://127.0.0.1:1/api/v1")
		.timeout(Duration::from_secs(2))
		.build()
		.expect("Unreachable configuration should still build.");
	let h = Harness::with_config(server, config);
	let err = h.client.get("/products/").await.expect_err("Unreachable hosts should fail.");

	assert!(matches!(err, Error::Transport(_)));
	assert_eq!(h.notifications.messages(), [NETWORK_ERROR_MESSAGE]);
	assert_eq!(h.redirects.count(), 0);
}

#[tokio::test]
async fn harness_talks_plain_http_to_the_mock_server() {
	let h = Harness::start().await;
	let ping = h
		.server
		.mock_async(|when, then| {
			when.method(GET).path(h.path("/products/"));
			then.status(200).json_body(json!([]));
		})
		.await;

	assert_eq!(h.client.config.base_url.scheme(), "http");

	h.client.get("/products/").await.expect("Mock server should be reachable over HTTP.");
	ping.assert_calls_async(1).await;
}

#[tokio::test]
async fn waiter_takes_over_when_the_leader_is_cancelled() {
	let h = Harness::start().await;

	h.seed_tokens(Some("a1"), Some("r1")).await;

	for path in ["/orders/", "/cart/"] {
		h.server
			.mock_async(|when, then| {
				when.method(GET).path(h.path(path)).header("authorization", "Bearer a1");
				then.status(401);
			})
			.await;
		h.server
			.mock_async(|when, then| {
				when.method(GET).path(h.path(path)).header("authorization", "Bearer a2");
				then.status(200).json_body(json!({ "path": path }));
			})
			.await;
	}

	h.server
		.mock_async(|when, then| {
			when.method(POST).path(h.path("/auth/refresh/")).json_body(json!({ "refresh": "r1" }));
			then.status(200).delay(Duration::from_millis(400)).json_body(json!({ "access": "a2" }));
		})
		.await;

	let leader = tokio::time::timeout(Duration::from_millis(150), h.client.get("/orders/"));
	let waiter = async {
		tokio::time::sleep(Duration::from_millis(50)).await;

		h.client.get_json::<Value>("/cart/").await
	};
	let (leader, waiter) = tokio::join!(leader, waiter);

	assert!(leader.is_err(), "Leader should time out while its refresh is in flight.");
	assert_eq!(waiter.expect("Waiter should lead the next cycle and succeed.")["path"], "/cart/");
	assert_eq!(h.stored(ACCESS_TOKEN_KEY).await.as_deref(), Some("a2"));
	assert_eq!(h.stored(REFRESH_TOKEN_KEY).await.as_deref(), Some("r1"));
	assert_eq!(h.client.refresh_coordinator().cycles(), 2);
	assert!(!h.client.refresh_coordinator().is_refreshing());
	assert!(h.notifications.entries().is_empty());
	assert_eq!(h.redirects.count(), 0);
}

#[tokio::test]
async fn retried_requests_rejected_together_redirect_once() {
	let h = Harness::start().await;

	h.seed_tokens(Some("a1"), Some("r1")).await;

	let protected = h
		.server
		.mock_async(|when, then| {
			when.method(GET);
			then.status(401).json_body(json!({ "detail": "Token is invalid or expired" }));
		})
		.await;
	let refresh = h
		.server
		.mock_async(|when, then| {
			when.method(POST).path(h.path("/auth/refresh/"));
			then.status(200).delay(Duration::from_millis(300)).json_body(json!({ "access": "a2" }));
		})
		.await;
	let (first, second) = tokio::join!(h.client.get("/orders/"), h.client.get("/cart/"));

	protected.assert_calls_async(4).await;
	refresh.assert_calls_async(1).await;

	for result in [first, second] {
		assert!(matches!(
			result,
			Err(Error::SessionExpired(ref failure)) if failure.kind == AuthFailureKind::RetryRejected
		));
	}

	assert_eq!(h.stored(ACCESS_TOKEN_KEY).await, None);
	assert_eq!(h.redirects.paths(), ["/login"]);
}
