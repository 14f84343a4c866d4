//! Server-side cart.

// self
use crate::{
	_prelude::*,
	auth::EntityId,
	client::ApiClient,
	http::HttpTransport,
	services::{Order, Price, Product},
};

/// One line of the server-side cart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteCartItem {
	/// Cart item identifier, used by the item endpoints.
	pub id: EntityId,
	/// Product on this line, when the API embeds it.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub product: Option<Product>,
	/// Quantity.
	pub quantity: u32,
	/// Line subtotal.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtotal: Option<Price>,
	/// Additional fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}

/// Server-side cart snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteCart {
	/// Cart identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<EntityId>,
	/// Cart lines.
	#[serde(default)]
	pub items: Vec<RemoteCartItem>,
	/// Cart total.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub total: Option<Price>,
	/// Additional fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}

#[derive(Serialize)]
struct AddItem<'a> {
	product_id: &'a EntityId,
	quantity: u32,
}

#[derive(Serialize)]
struct UpdateItem {
	quantity: u32,
}

#[derive(Serialize)]
struct Checkout<'a> {
	shipping_address: &'a str,
	billing_address: &'a str,
	clear_cart: bool,
}

/// Server-side cart endpoints.
#[derive(Debug)]
pub struct RemoteCartService<'a, T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) client: &'a ApiClient<T>,
}
impl<T> RemoteCartService<'_, T>
where
	T: ?Sized + HttpTransport,
{
	/// `GET /cart/`.
	pub async fn get(&self) -> Result<RemoteCart> {
		self.client.get_json("/cart/").await
	}

	/// `POST /cart/` adding `quantity` units of a product.
	pub async fn add(&self, product_id: &EntityId, quantity: u32) -> Result<RemoteCart> {
		self.client.post_json("/cart/", &AddItem { product_id, quantity }).await
	}

	/// `PATCH /cart/items/{id}/`.
	pub async fn update_item(&self, item_id: &EntityId, quantity: u32) -> Result<RemoteCart> {
		self.client.patch_json(format!("/cart/items/{item_id}/"), &UpdateItem { quantity }).await
	}

	/// `DELETE /cart/items/{id}/`.
	pub async fn remove_item(&self, item_id: &EntityId) -> Result<()> {
		self.client.delete(format!("/cart/items/{item_id}/")).await.map(drop)
	}

	/// `DELETE /cart/`.
	pub async fn clear(&self) -> Result<()> {
		self.client.delete("/cart/").await.map(drop)
	}

	/// `POST /cart/checkout/`, turning the cart into an order.
	///
	/// The billing address defaults to the shipping address.
	pub async fn checkout(
		&self,
		shipping_address: &str,
		billing_address: Option<&str>,
		clear_cart: bool,
	) -> Result<Order> {
		let body = Checkout {
			shipping_address,
			billing_address: billing_address
				.filter(|address| !address.trim().is_empty())
				.unwrap_or(shipping_address),
			clear_cart,
		};

		self.client.post_json("/cart/checkout/", &body).await
	}
}
