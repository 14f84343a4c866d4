//! Local cart persisted under the `cart` key.
//!
//! Quantities are reconciled against the product's known stock before any change lands.
//! Every accepted change is written back to the store; an empty cart removes the key.

// self
use crate::{
	_prelude::*,
	auth::EntityId,
	client::ApiClient,
	http::HttpTransport,
	notify::{Notification, Notifier},
	services::Product,
	store::{CART_KEY, ClientStore, StoreBatch, StoreError},
};

/// Product plus the quantity the shopper wants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
	/// Product snapshot taken when the line was added.
	pub product: Product,
	/// Requested quantity, always at least one.
	pub quantity: u32,
}
impl CartLine {
	/// Line total.
	pub fn subtotal(&self) -> f64 {
		self.product.price.amount() * f64::from(self.quantity)
	}
}

/// Effect of a cart operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CartChange {
	/// A new line was added.
	Added,
	/// An existing line now holds `quantity` units.
	Updated {
		/// New quantity.
		quantity: u32,
	},
	/// A line was removed.
	Removed,
	/// The requested quantity exceeds stock; nothing changed.
	Rejected {
		/// Units in stock.
		available: u32,
	},
	/// Nothing matched; nothing changed.
	Unchanged,
}

/// Shopper-side cart shared across the session.
pub struct LocalCart {
	store: Arc<dyn ClientStore>,
	notifier: Arc<dyn Notifier>,
	lines: RwLock<Vec<CartLine>>,
	writes: AsyncMutex<()>,
}
impl LocalCart {
	/// Loads the persisted cart. An unreadable entry is discarded and removed from the store.
	pub async fn load(
		store: Arc<dyn ClientStore>,
		notifier: Arc<dyn Notifier>,
	) -> Result<Self, StoreError> {
		let lines = match store.get(CART_KEY).await? {
			Some(raw) => match serde_json::from_str::<Vec<CartLine>>(&raw) {
				Ok(lines) => lines,
				Err(_e) => {
					#[cfg(feature = "tracing")]
					tracing::warn!(error = %_e, "Discarding unreadable persisted cart.");

					store.apply(StoreBatch::new().remove(CART_KEY)).await?;

					Vec::new()
				},
			},
			None => Vec::new(),
		};

		Ok(Self { store, notifier, lines: RwLock::new(lines), writes: AsyncMutex::new(()) })
	}

	/// Loads the cart from the client's store, notifying through the client's sink.
	pub async fn for_client<T>(client: &ApiClient<T>) -> Result<Self, StoreError>
	where
		T: ?Sized + HttpTransport,
	{
		Self::load(client.store().clone(), client.notifier.clone()).await
	}

	/// Adds `quantity` units, merging with an existing line for the same product.
	///
	/// The merged quantity is checked against the product's stock, when known.
	pub async fn add(&self, product: Product, quantity: u32) -> Result<CartChange> {
		if quantity == 0 {
			return Ok(CartChange::Unchanged);
		}

		let _write = self.writes.lock().await;
		let mut next = self.lines();
		let existing = next.iter_mut().find(|line| line.product.id == product.id);
		let current = existing.as_ref().map_or(0, |line| line.quantity);
		let wanted = current.saturating_add(quantity);

		if let Some(available) = product.stock_quantity.filter(|stock| wanted > *stock) {
			self.notify(Notification::warning(stock_warning(available)));

			return Ok(CartChange::Rejected { available });
		}

		let change = match existing {
			Some(line) => {
				line.quantity = wanted;

				CartChange::Updated { quantity: wanted }
			},
			None => {
				let message = format!("{} added to cart", product.name);

				next.push(CartLine { product, quantity });
				self.commit(next).await?;
				self.notify(Notification::success(message));

				return Ok(CartChange::Added);
			},
		};

		self.commit(next).await?;

		Ok(change)
	}

	/// Removes the line for `product_id`.
	pub async fn remove(&self, product_id: &EntityId) -> Result<CartChange> {
		let _write = self.writes.lock().await;

		self.remove_locked(product_id).await
	}

	/// Sets the quantity of an existing line; zero removes it.
	pub async fn update_quantity(&self, product_id: &EntityId, quantity: u32) -> Result<CartChange> {
		let _write = self.writes.lock().await;

		if quantity == 0 {
			return self.remove_locked(product_id).await;
		}

		let mut next = self.lines();
		let Some(line) = next.iter_mut().find(|line| &line.product.id == product_id) else {
			return Ok(CartChange::Unchanged);
		};

		if let Some(available) = line.product.stock_quantity.filter(|stock| quantity > *stock) {
			self.notify(Notification::warning(stock_warning(available)));

			return Ok(CartChange::Rejected { available });
		}

		line.quantity = quantity;

		self.commit(next).await?;

		Ok(CartChange::Updated { quantity })
	}

	/// Empties the cart.
	pub async fn clear(&self) -> Result<()> {
		let _write = self.writes.lock().await;

		self.commit(Vec::new()).await?;
		self.notify(Notification::info("Cart cleared"));

		Ok(())
	}

	/// Total number of units across lines.
	pub fn item_count(&self) -> u32 {
		self.lines.read().iter().map(|line| line.quantity).sum()
	}

	/// Sum of line totals.
	pub fn total(&self) -> f64 {
		self.lines.read().iter().map(CartLine::subtotal).sum()
	}

	/// Snapshot of the lines in insertion order.
	pub fn lines(&self) -> Vec<CartLine> {
		self.lines.read().clone()
	}

	/// Quantity held for `product_id`, if any.
	pub fn quantity_of(&self, product_id: &EntityId) -> Option<u32> {
		self.lines.read().iter().find(|line| &line.product.id == product_id).map(|line| line.quantity)
	}

	/// Returns `true` when the cart holds no lines.
	pub fn is_empty(&self) -> bool {
		self.lines.read().is_empty()
	}

	async fn remove_locked(&self, product_id: &EntityId) -> Result<CartChange> {
		let mut next = self.lines();
		let before = next.len();

		next.retain(|line| &line.product.id != product_id);

		let change = if next.len() == before {
			CartChange::Unchanged
		} else {
			self.commit(next).await?;

			CartChange::Removed
		};

		self.notify(Notification::info("Item removed from cart"));

		Ok(change)
	}

	/// Persists `next`, then makes it the visible state.
	async fn commit(&self, next: Vec<CartLine>) -> Result<(), StoreError> {
		let batch = if next.is_empty() {
			StoreBatch::new().remove(CART_KEY)
		} else {
			let encoded = serde_json::to_string(&next).map_err(|e| StoreError::Serialization {
				message: format!("Failed to encode cart: {e}"),
			})?;

			StoreBatch::new().set(CART_KEY, encoded)
		};

		self.store.apply(batch).await?;

		*self.lines.write() = next;

		Ok(())
	}

	fn notify(&self, notification: Notification) {
		self.notifier.notify(notification);
	}
}
impl Debug for LocalCart {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LocalCart").field("lines", &*self.lines.read()).finish()
	}
}

fn stock_warning(available: u32) -> String {
	format!("Only {available} items available in stock")
}

#[cfg(test)]
mod tests {
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::{
		notify::{NotificationLevel, NotificationLog},
		store::MemoryStore,
	};

	struct Fixture {
		rt: Runtime,
		store: MemoryStore,
		log: NotificationLog,
		cart: LocalCart,
	}

	fn fixture() -> Fixture {
		let rt = Runtime::new().expect("Failed to build Tokio runtime for cart test.");
		let store = MemoryStore::default();
		let log = NotificationLog::default();
		let cart = rt
			.block_on(LocalCart::load(Arc::new(store.clone()), Arc::new(log.clone())))
			.expect("Empty cart should load.");

		Fixture { rt, store, log, cart }
	}

	#[test]
	fn adding_merges_lines_and_checks_stock() {
		let Fixture { rt, store, log, cart } = fixture();
		let mug = Product::new(1, "Mug", "9.50").with_stock(3);

		assert_eq!(rt.block_on(cart.add(mug.clone(), 2)).expect("Add should succeed."), CartChange::Added);
		assert_eq!(
			rt.block_on(cart.add(mug.clone(), 1)).expect("Merge should succeed."),
			CartChange::Updated { quantity: 3 }
		);
		assert_eq!(
			rt.block_on(cart.add(mug, 1)).expect("Over-stock add should not fail."),
			CartChange::Rejected { available: 3 }
		);
		assert_eq!(cart.item_count(), 3);
		assert_eq!(cart.total(), 28.5);
		assert_eq!(log.messages(), ["Mug added to cart", "Only 3 items available in stock"]);
		assert_eq!(log.entries()[1].level, NotificationLevel::Warning);
		assert!(rt.block_on(store.get(CART_KEY)).expect("Cart should be readable.").is_some());
	}

	#[test]
	fn zero_quantity_removes_and_empty_cart_drops_key() {
		let Fixture { rt, store, log, cart } = fixture();
		let id = EntityId::from("tea");

		rt.block_on(cart.add(Product::new("tea", "Tea", 4.0), 1)).expect("Add should succeed.");

		assert_eq!(
			rt.block_on(cart.update_quantity(&id, 0)).expect("Zero quantity should remove."),
			CartChange::Removed
		);
		assert!(cart.is_empty());
		assert!(store.keys().is_empty());
		assert_eq!(log.messages().last().map(String::as_str), Some("Item removed from cart"));
	}

	#[test]
	fn update_quantity_respects_line_stock() {
		let Fixture { rt, cart, .. } = fixture();
		let id = EntityId::Number(9);

		rt.block_on(cart.add(Product::new(9, "Lamp", "30").with_stock(2), 1))
			.expect("Add should succeed.");

		assert_eq!(
			rt.block_on(cart.update_quantity(&id, 5)).expect("Update should not fail."),
			CartChange::Rejected { available: 2 }
		);
		assert_eq!(
			rt.block_on(cart.update_quantity(&id, 2)).expect("Update should succeed."),
			CartChange::Updated { quantity: 2 }
		);
		assert_eq!(
			rt.block_on(cart.update_quantity(&EntityId::Number(10), 1))
				.expect("Unknown products should be ignored."),
			CartChange::Unchanged
		);
		assert_eq!(cart.quantity_of(&id), Some(2));
	}

	#[test]
	fn corrupt_persisted_cart_is_discarded() {
		let rt = Runtime::new().expect("Failed to build Tokio runtime for cart test.");
		let store = MemoryStore::default();

		rt.block_on(store.apply(StoreBatch::new().set(CART_KEY, "[{\"product\":")))
			.expect("Seeding the memory store should succeed.");

		let cart = rt
			.block_on(LocalCart::load(Arc::new(store.clone()), Arc::new(NotificationLog::default())))
			.expect("Corrupt carts should load as empty.");

		assert!(cart.is_empty());
		assert!(store.keys().is_empty());
	}

	#[test]
	fn persisted_lines_reload() {
		let Fixture { rt, store, cart, .. } = fixture();

		rt.block_on(cart.add(Product::new(1, "Mug", "9.50"), 2)).expect("Add should succeed.");

		let reloaded = rt
			.block_on(LocalCart::load(Arc::new(store), Arc::new(NotificationLog::default())))
			.expect("Persisted cart should load.");

		assert_eq!(reloaded.lines(), cart.lines());

		rt.block_on(reloaded.clear()).expect("Clear should succeed.");

		assert!(reloaded.is_empty());
	}
}
