// std
use std::sync::Arc;
// self
use storefront_client::{
	auth::{CredentialPair, EntityId, TokenSecret, UserProfile},
	store::{
		ACCESS_TOKEN_KEY, CART_KEY, ClientStore, CredentialVault, MemoryStore, REFRESH_TOKEN_KEY,
		StoreBatch, USER_KEY,
	},
};

fn vault_over(store: &MemoryStore) -> CredentialVault {
	CredentialVault::new(Arc::new(store.clone()))
}

#[tokio::test]
async fn clones_share_one_map() {
	let store = MemoryStore::default();
	let other = store.clone();

	store
		.apply(StoreBatch::new().set(CART_KEY, "[]").set(USER_KEY, "{}"))
		.await
		.expect("Applying a batch to the memory store should succeed.");

	assert_eq!(other.keys(), [CART_KEY, USER_KEY]);
	assert_eq!(
		other.get(CART_KEY).await.expect("Reading the memory store should succeed.").as_deref(),
		Some("[]")
	);
}

#[tokio::test]
async fn later_ops_in_a_batch_win() {
	let store = MemoryStore::default();

	store
		.apply(StoreBatch::new().set(ACCESS_TOKEN_KEY, "a1").remove(ACCESS_TOKEN_KEY).set(
			REFRESH_TOKEN_KEY,
			"r1",
		))
		.await
		.expect("Applying a batch to the memory store should succeed.");

	assert_eq!(store.keys(), [REFRESH_TOKEN_KEY]);
}

#[tokio::test]
async fn vault_login_rotation_and_clear() {
	let store = MemoryStore::default();
	let vault = vault_over(&store);
	let user = UserProfile {
		id: Some(EntityId::Number(1)),
		email: Some("ada@example.com".into()),
		..Default::default()
	};

	vault
		.store_login(&CredentialPair::new("a1", "r1"), Some(&user))
		.await
		.expect("Storing login credentials should succeed.");
	vault
		.rotate(&TokenSecret::new("a2"), None)
		.await
		.expect("Rotating the access token should succeed.");

	let pair = vault
		.credentials()
		.await
		.expect("Reading credentials should succeed.")
		.expect("Both tokens should be stored.");

	assert_eq!(pair.access_token.expose(), "a2");
	assert_eq!(pair.refresh_token.expose(), "r1");
	assert_eq!(vault.user().await.expect("Reading the user should succeed."), Some(user));

	store
		.apply(StoreBatch::new().set(CART_KEY, "[]"))
		.await
		.expect("Seeding the cart should succeed.");
	vault.clear().await.expect("Clearing credentials should succeed.");

	assert_eq!(store.keys(), [CART_KEY], "Clearing credentials should keep the cart.");
}
