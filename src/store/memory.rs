//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{SessionStore, StoreError, StoreKey},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, String>>>;

/// Storage backend that keeps values in-process; cloning shares the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Returns a copy of the stored entries.
	pub fn snapshot(&self) -> HashMap<StoreKey, String> {
		self.0.read().clone()
	}
}
impl SessionStore for MemoryStore {
	fn load(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
		Ok(self.0.read().get(&key).cloned())
	}

	fn save(&self, entries: &[(StoreKey, String)]) -> Result<(), StoreError> {
		let mut guard = self.0.write();

		for (key, value) in entries {
			guard.insert(*key, value.clone());
		}

		Ok(())
	}

	fn remove(&self, keys: &[StoreKey]) -> Result<(), StoreError> {
		let mut guard = self.0.write();

		for key in keys {
			guard.remove(key);
		}

		Ok(())
	}
}
