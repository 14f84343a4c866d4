//! Typed wrappers over the storefront endpoints.
//!
//! Each service borrows an [`ApiClient`] and inherits its credential handling, refresh
//! recovery, and failure notifications. Payload types keep unknown fields in an `extra`
//! map so newer API revisions decode without loss.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod reports;

pub use account::*;
pub use cart::*;
pub use catalog::*;
pub use orders::*;
pub use reports::*;

// self
use crate::{_prelude::*, client::ApiClient, http::HttpTransport};

/// Monetary amount as the API sends it: decimal strings or plain numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
	/// Decimal string such as `"19.99"`.
	Text(String),
	/// Plain JSON number.
	Number(f64),
}
impl Price {
	/// Numeric value; unparseable strings count as zero.
	pub fn amount(&self) -> f64 {
		match self {
			Self::Text(text) => text.trim().parse().unwrap_or(0.),
			Self::Number(number) => *number,
		}
	}
}
impl Default for Price {
	fn default() -> Self {
		Self::Number(0.)
	}
}
impl From<f64> for Price {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}
impl From<&str> for Price {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}

/// Collection response: either a paginated envelope or a bare array.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
	/// `{count, next, previous, results}` envelope.
	Page {
		/// Total number of matching items across pages.
		#[serde(default)]
		count: Option<u64>,
		/// URL of the next page.
		#[serde(default)]
		next: Option<String>,
		/// URL of the previous page.
		#[serde(default)]
		previous: Option<String>,
		/// Items on this page.
		results: Vec<T>,
	},
	/// Bare array.
	Items(Vec<T>),
}
impl<T> Listing<T> {
	/// Items in this response.
	pub fn items(&self) -> &[T] {
		match self {
			Self::Page { results, .. } => results,
			Self::Items(items) => items,
		}
	}

	/// Consumes the listing, returning its items.
	pub fn into_items(self) -> Vec<T> {
		match self {
			Self::Page { results, .. } => results,
			Self::Items(items) => items,
		}
	}

	/// Total matching items: the envelope's `count`, or the array length.
	pub fn total(&self) -> u64 {
		match self {
			Self::Page { count: Some(count), .. } => *count,
			other => other.items().len() as u64,
		}
	}

	/// Returns `true` when the server reports another page.
	pub fn has_next(&self) -> bool {
		matches!(self, Self::Page { next: Some(_), .. })
	}
}

/// Query parameters for list endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery(Vec<(String, String)>);
impl ListQuery {
	/// Creates an empty query.
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests a page (1-based).
	pub fn page(self, page: u32) -> Self {
		self.param("page", page.to_string())
	}

	/// Sets the page size.
	pub fn page_size(self, size: u32) -> Self {
		self.param("page_size", size.to_string())
	}

	/// Filters by a free-text search term; blank terms are ignored.
	pub fn search(self, term: impl Into<String>) -> Self {
		let term = term.into();

		if term.trim().is_empty() { self } else { self.param("search", term) }
	}

	/// Adds an arbitrary parameter.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.0.push((key.into(), value.into()));

		self
	}

	/// Parameters in insertion order.
	pub fn pairs(&self) -> &[(String, String)] {
		&self.0
	}
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Products and categories.
	pub fn catalog(&self) -> CatalogService<'_, T> {
		CatalogService { client: self }
	}

	/// Server-side cart.
	pub fn remote_cart(&self) -> RemoteCartService<'_, T> {
		RemoteCartService { client: self }
	}

	/// Orders and payments.
	pub fn orders(&self) -> OrderService<'_, T> {
		OrderService { client: self }
	}

	/// Admin reporting.
	pub fn reports(&self) -> ReportService<'_, T> {
		ReportService { client: self }
	}

	/// Authentication and profile endpoints.
	pub fn account(&self) -> AccountService<'_, T> {
		AccountService { client: self }
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn listings_accept_envelopes_and_arrays() {
		let page: Listing<u32> =
			serde_json::from_value(json!({ "count": 40, "next": "/products/?page=2", "results": [1, 2] }))
				.expect("Paginated listing should decode.");
		let bare: Listing<u32> =
			serde_json::from_value(json!([1, 2, 3])).expect("Bare listing should decode.");

		assert_eq!(page.total(), 40);
		assert!(page.has_next());
		assert_eq!(bare.total(), 3);
		assert_eq!(bare.into_items(), [1, 2, 3]);
	}

	#[test]
	fn prices_parse_strings_and_numbers() {
		assert_eq!(Price::from("19.50").amount(), 19.5);
		assert_eq!(Price::from(3.25).amount(), 3.25);
		assert_eq!(Price::from("n/a").amount(), 0.);
	}

	#[test]
	fn blank_search_terms_are_skipped() {
		let query = ListQuery::new().page(2).search("  ").page_size(12);

		assert_eq!(
			query.pairs(),
			[("page".to_owned(), "2".to_owned()), ("page_size".to_owned(), "12".to_owned())]
		);
	}
}
