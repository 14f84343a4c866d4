//! Storage contracts and built-in stores for persisted client-side state.
//!
//! State lives under fixed keys ([`ACCESS_TOKEN_KEY`], [`REFRESH_TOKEN_KEY`], [`USER_KEY`],
//! [`CART_KEY`]). Writes go through a [`StoreBatch`] so related keys change together.

pub mod file;
pub mod memory;
pub mod vault;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use vault::CredentialVault;

// self
use crate::_prelude::*;

/// Key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Key holding the JSON-serialized user profile.
pub const USER_KEY: &str = "user";
/// Key holding the JSON-serialized local cart lines.
pub const CART_KEY: &str = "cart";

/// Boxed future returned by [`ClientStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable key/value backend for client-side state.
pub trait ClientStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`, if any.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Applies every operation in `batch` atomically: either all land or none do.
	fn apply(&self, batch: StoreBatch) -> StoreFuture<'_, ()>;
}

/// One write inside a [`StoreBatch`].
#[derive(Clone, PartialEq, Eq)]
pub enum StoreOp {
	/// Stores `value` under `key`.
	Set {
		/// Target key.
		key: String,
		/// New value.
		value: String,
	},
	/// Deletes `key`.
	Remove {
		/// Target key.
		key: String,
	},
}
impl StoreOp {
	/// Key touched by the operation.
	pub fn key(&self) -> &str {
		match self {
			Self::Set { key, .. } | Self::Remove { key } => key,
		}
	}

	fn apply_to(self, map: &mut HashMap<String, String>) {
		match self {
			Self::Set { key, value } => {
				map.insert(key, value);
			},
			Self::Remove { key } => {
				map.remove(&key);
			},
		}
	}
}
impl Debug for StoreOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Set { key, .. } =>
				f.debug_struct("Set").field("key", key).field("value", &"<redacted>").finish(),
			Self::Remove { key } => f.debug_struct("Remove").field("key", key).finish(),
		}
	}
}

/// Ordered set of writes applied as one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreBatch(Vec<StoreOp>);
impl StoreBatch {
	/// Creates an empty batch.
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues a write of `value` under `key`.
	pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.0.push(StoreOp::Set { key: key.into(), value: value.into() });

		self
	}

	/// Queues removal of `key`.
	pub fn remove(mut self, key: impl Into<String>) -> Self {
		self.0.push(StoreOp::Remove { key: key.into() });

		self
	}

	/// Returns `true` when the batch carries no operations.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Operations in application order.
	pub fn ops(&self) -> &[StoreOp] {
		&self.0
	}

	/// Applies the batch to an in-memory map, in order.
	pub fn apply_to(self, map: &mut HashMap<String, String>) {
		for op in self.0 {
			op.apply_to(map);
		}
	}
}

/// Error type produced by [`ClientStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Stored data could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
