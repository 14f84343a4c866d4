//! Thread-safe in-memory [`ClientStore`] implementation for tests and short-lived hosts.

// self
use crate::{
	_prelude::*,
	store::{ClientStore, StoreBatch, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, String>>>;

/// Storage backend that keeps state in-process; clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns the stored keys in sorted order.
	pub fn keys(&self) -> Vec<String> {
		let mut keys = self.0.read().keys().cloned().collect::<Vec<_>>();

		keys.sort();

		keys
	}

	fn get_now(map: &StoreMap, key: &str) -> Option<String> {
		map.read().get(key).cloned()
	}

	fn apply_now(map: &StoreMap, batch: StoreBatch) {
		let mut guard = map.write();

		batch.apply_to(&mut guard);
	}
}
impl Debug for MemoryStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryStore").field("keys", &self.keys()).finish()
	}
}
impl ClientStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Ok(Self::get_now(&self.0, key)) })
	}

	fn apply(&self, batch: StoreBatch) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			Self::apply_now(&map, batch);

			Ok(())
		})
	}
}
