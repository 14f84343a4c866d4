//! Orders and card payments.

// self
use crate::{
	_prelude::*,
	auth::{EntityId, TokenSecret},
	cart::CartLine,
	client::ApiClient,
	http::{ApiRequest, HttpTransport},
	services::{Listing, Price},
};

/// Order lifecycle state. Values this client does not know are kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
	/// Created, awaiting payment.
	#[default]
	Pending,
	/// Paid and being fulfilled.
	Processing,
	/// Fulfilled.
	Completed,
	/// Cancelled.
	Cancelled,
	/// Any other status string.
	Other(String),
}
impl OrderStatus {
	/// Wire value.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Pending => "pending",
			Self::Processing => "processing",
			Self::Completed => "completed",
			Self::Cancelled => "cancelled",
			Self::Other(other) => other,
		}
	}
}
impl From<String> for OrderStatus {
	fn from(value: String) -> Self {
		match value.as_str() {
			"pending" => Self::Pending,
			"processing" => Self::Processing,
			"completed" => Self::Completed,
			"cancelled" => Self::Cancelled,
			_ => Self::Other(value),
		}
	}
}
impl From<OrderStatus> for String {
	fn from(value: OrderStatus) -> Self {
		match value {
			OrderStatus::Other(other) => other,
			known => known.as_str().to_owned(),
		}
	}
}
impl Display for OrderStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Line of a placed order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
	/// Item identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<EntityId>,
	/// Product snapshot or identifier, as the API renders it.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub product: Option<JsonValue>,
	/// Quantity.
	pub quantity: u32,
	/// Unit price at order time.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub price: Option<Price>,
	/// Line subtotal.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtotal: Option<Price>,
	/// Additional fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}

/// Placed order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Order identifier.
	pub id: EntityId,
	/// Human-facing order number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order_number: Option<String>,
	/// Lifecycle state.
	#[serde(default)]
	pub status: OrderStatus,
	/// Order total.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub total_amount: Option<Price>,
	/// Email of the ordering customer.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub customer_email: Option<String>,
	/// Shipping address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shipping_address: Option<String>,
	/// Billing address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub billing_address: Option<String>,
	/// CRM synchronization state (`success`, `failed`, `pending`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub crm_sync_status: Option<String>,
	/// Creation timestamp as sent by the API.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<String>,
	/// Ordered lines.
	#[serde(default)]
	pub items: Vec<OrderItem>,
	/// Additional fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}

/// Product and quantity submitted with a new order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderLine {
	/// Product identifier.
	pub product_id: EntityId,
	/// Quantity.
	pub quantity: u32,
}

/// New order submitted to `POST /orders/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderDraft {
	/// Shipping address.
	pub shipping_address: String,
	/// Billing address.
	pub billing_address: String,
	/// Ordered lines.
	pub items: Vec<OrderLine>,
}
impl OrderDraft {
	/// Builds a draft from local cart lines; the billing address defaults to the shipping
	/// address.
	pub fn from_cart(
		lines: &[CartLine],
		shipping_address: impl Into<String>,
		billing_address: Option<String>,
	) -> Self {
		let shipping_address = shipping_address.into();
		let billing_address = billing_address
			.filter(|address| !address.trim().is_empty())
			.unwrap_or_else(|| shipping_address.clone());
		let items = lines
			.iter()
			.map(|line| OrderLine { product_id: line.product.id.clone(), quantity: line.quantity })
			.collect();

		Self { shipping_address, billing_address, items }
	}
}

/// Payment intent handed to the card payment widget.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PaymentIntent {
	/// Client secret for the payment widget.
	pub client_secret: TokenSecret,
	/// Additional fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}

/// Order and payment endpoints.
#[derive(Debug)]
pub struct OrderService<'a, T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) client: &'a ApiClient<T>,
}
impl<T> OrderService<'_, T>
where
	T: ?Sized + HttpTransport,
{
	/// `POST /orders/`.
	pub async fn create(&self, draft: &OrderDraft) -> Result<Order> {
		self.client.post_json("/orders/", draft).await
	}

	/// `GET /orders/`: the signed-in user's order history.
	pub async fn list(&self) -> Result<Listing<Order>> {
		self.client.get_json("/orders/").await
	}

	/// `GET /orders/{id}/`.
	pub async fn get(&self, id: &EntityId) -> Result<Order> {
		self.client.get_json(format!("/orders/{id}/")).await
	}

	/// `POST /orders/{id}/create-payment/`.
	pub async fn create_payment(&self, id: &EntityId) -> Result<PaymentIntent> {
		self.client.request_json(ApiRequest::post(format!("/orders/{id}/create-payment/"))).await
	}

	/// `POST /orders/{id}/confirm-payment/`, after the widget reports success.
	pub async fn confirm_payment(&self, id: &EntityId) -> Result<JsonValue> {
		self.client.request_json(ApiRequest::post(format!("/orders/{id}/confirm-payment/"))).await
	}
}
