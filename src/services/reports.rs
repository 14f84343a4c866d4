//! Admin reporting.

// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::HttpTransport,
	services::{Order, Price},
};

/// Sales summary shown on the admin dashboard.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ReportSummary {
	/// Number of orders placed.
	#[serde(default)]
	pub total_orders: u64,
	/// Revenue across paid orders.
	#[serde(default)]
	pub total_revenue: Price,
	/// Number of paid orders.
	#[serde(default)]
	pub paid_orders: u64,
	/// Number of orders awaiting payment.
	#[serde(default)]
	pub pending_orders: u64,
	/// Most recent orders, when included.
	#[serde(default)]
	pub recent_orders: Vec<Order>,
	/// Additional fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}

/// Reporting endpoints. Non-admin sessions receive a `403`.
#[derive(Debug)]
pub struct ReportService<'a, T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) client: &'a ApiClient<T>,
}
impl<T> ReportService<'_, T>
where
	T: ?Sized + HttpTransport,
{
	/// `GET /reports/summary/`.
	pub async fn summary(&self) -> Result<ReportSummary> {
		self.client.get_json("/reports/summary/").await
	}
}
