//! Persistence contracts and built-in backends for session keys.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Key/value backend that survives process restarts (or page reloads).
///
/// Batched writes and removals must be applied all-or-nothing from the reader's point of
/// view, so a concurrent [`SessionStore::load`] never sees one token rotated and the other
/// stale.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`.
	fn load(&self, key: StoreKey) -> Result<Option<String>, StoreError>;

	/// Writes every entry in one batch.
	fn save(&self, entries: &[(StoreKey, String)]) -> Result<(), StoreError>;

	/// Removes every key in one batch. Missing keys are not an error.
	fn remove(&self, keys: &[StoreKey]) -> Result<(), StoreError>;
}

/// The three independent keys persisted for a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKey {
	/// Bearer access token.
	#[serde(rename = "token")]
	AccessToken,
	/// Refresh token.
	RefreshToken,
	/// JSON-encoded user profile.
	User,
}
impl StoreKey {
	/// Every session key, in the order they are cleared.
	pub const ALL: [StoreKey; 3] = [StoreKey::AccessToken, StoreKey::RefreshToken, StoreKey::User];

	/// Returns the storage key name.
	pub const fn as_str(self) -> &'static str {
		match self {
			StoreKey::AccessToken => "token",
			StoreKey::RefreshToken => "refresh_token",
			StoreKey::User => "user",
		}
	}
}
impl Display for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
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
