//! Products and categories.

// self
use crate::{
	_prelude::*,
	auth::EntityId,
	client::ApiClient,
	http::{ApiRequest, HttpTransport},
	services::{ListQuery, Listing, Price},
};

/// Product category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
	/// Category identifier.
	pub id: EntityId,
	/// Display name.
	pub name: String,
	/// URL slug.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub slug: Option<String>,
	/// Long description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Additional fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}

/// Catalog product, also stored verbatim inside local cart lines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
	/// Product identifier.
	pub id: EntityId,
	/// Display name.
	pub name: String,
	/// Long description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Unit price.
	#[serde(default)]
	pub price: Price,
	/// Units in stock; `None` when the API does not track stock for the product.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stock_quantity: Option<u32>,
	/// Owning category.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<Category>,
	/// Additional fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl Product {
	/// Creates a product with only the fields the cart relies on.
	pub fn new(id: impl Into<EntityId>, name: impl Into<String>, price: impl Into<Price>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			description: None,
			price: price.into(),
			stock_quantity: None,
			category: None,
			extra: JsonMap::new(),
		}
	}

	/// Sets the tracked stock quantity.
	pub fn with_stock(mut self, stock_quantity: u32) -> Self {
		self.stock_quantity = Some(stock_quantity);

		self
	}
}

/// Catalog endpoints.
#[derive(Debug)]
pub struct CatalogService<'a, T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) client: &'a ApiClient<T>,
}
impl<T> CatalogService<'_, T>
where
	T: ?Sized + HttpTransport,
{
	/// `GET /products/`.
	pub async fn products(&self, query: &ListQuery) -> Result<Listing<Product>> {
		self.client
			.request_json(ApiRequest::get("/products/").with_params(query.pairs().iter().cloned()))
			.await
	}

	/// `GET /products/{id}/`.
	pub async fn product(&self, id: &EntityId) -> Result<Product> {
		self.client.get_json(format!("/products/{id}/")).await
	}

	/// `GET /categories/`.
	pub async fn categories(&self, query: &ListQuery) -> Result<Listing<Category>> {
		self.client
			.request_json(
				ApiRequest::get("/categories/").with_params(query.pairs().iter().cloned()),
			)
			.await
	}

	/// `GET /categories/{id}/`.
	pub async fn category(&self, id: &EntityId) -> Result<Category> {
		self.client.get_json(format!("/categories/{id}/")).await
	}
}
