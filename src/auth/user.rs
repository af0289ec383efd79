//! Cached user profile returned by the login endpoint.

// self
use crate::{
	_prelude::*,
	auth::{Permissions, RoleLabel},
};

/// Authenticated identity with its capability bitmask.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
	/// Numeric user identifier.
	#[serde(default)]
	pub id: i64,
	/// Login name.
	#[serde(default)]
	pub username: String,
	/// Given name.
	#[serde(rename = "firstName", default)]
	pub first_name: String,
	/// Family name.
	#[serde(rename = "lastName", default)]
	pub last_name: String,
	/// Granted capabilities.
	#[serde(default)]
	pub permissions: Permissions,
	/// Whether the account is enabled.
	#[serde(default = "default_active")]
	pub is_active: bool,
}
impl UserProfile {
	/// Returns `true` when the profile holds `permission`.
	pub fn can_access(&self, permission: u64) -> bool {
		self.permissions.contains(permission)
	}

	/// Display-only role label derived from the bitmask.
	pub fn role_label(&self) -> RoleLabel {
		self.permissions.role_label()
	}

	/// First and last name joined with a space, falling back to the username.
	pub fn display_name(&self) -> String {
		let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
		let full = full.trim();

		if full.is_empty() { self.username.clone() } else { full.to_owned() }
	}
}

fn default_active() -> bool {
	true
}
