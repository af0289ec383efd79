//! Capability bitmask and derived, display-only role labels.

// std
use std::ops::BitOr;
// self
use crate::_prelude::*;

/// Independent capability bits granted to a user.
///
/// Every bit stands on its own; a user may hold any combination. Access decisions must go
/// through [`Permissions::contains`] (or the `any`/`all` variants) and never through
/// [`Permissions::role_label`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(u64);
impl Permissions {
	/// Clients section.
	pub const CLIENTS: u64 = 1;
	/// Products section.
	pub const PRODUCTS: u64 = 1 << 1;
	/// Dashboards and reports.
	pub const DASHBOARD: u64 = 1 << 2;
	/// Sales section.
	pub const SALES: u64 = 1 << 3;
	/// User administration.
	pub const USERS: u64 = 1 << 4;
	/// Day-to-day operator: clients, products, and sales.
	pub const OPERATOR: u64 = Self::CLIENTS | Self::PRODUCTS | Self::SALES;
	/// Operator plus dashboards.
	pub const MANAGER: u64 = Self::OPERATOR | Self::DASHBOARD;
	/// Every capability.
	pub const ADMIN: u64 = Self::MANAGER | Self::USERS;

	const NAMED: [(u64, &'static str); 5] = [
		(Self::CLIENTS, "Clients"),
		(Self::PRODUCTS, "Products"),
		(Self::DASHBOARD, "Dashboard"),
		(Self::SALES, "Sales"),
		(Self::USERS, "Users"),
	];

	/// Wraps a raw bitmask.
	pub const fn new(bits: u64) -> Self {
		Self(bits)
	}

	/// Returns the raw bitmask.
	pub const fn bits(self) -> u64 {
		self.0
	}

	/// Returns `true` when any bit of `permission` is granted. A zero mask grants nothing.
	pub const fn contains(self, permission: u64) -> bool {
		self.0 & permission != 0
	}

	/// Returns `true` when at least one of `permissions` is granted.
	pub fn contains_any(self, permissions: impl IntoIterator<Item = u64>) -> bool {
		permissions.into_iter().any(|permission| self.contains(permission))
	}

	/// Returns `true` when every one of `permissions` is granted.
	pub fn contains_all(self, permissions: impl IntoIterator<Item = u64>) -> bool {
		permissions.into_iter().all(|permission| self.contains(permission))
	}

	/// Names of the granted capabilities, in bit order.
	pub fn names(self) -> Vec<&'static str> {
		let names = Self::NAMED
			.iter()
			.filter(|(bit, _)| self.contains(*bit))
			.map(|(_, name)| *name)
			.collect::<Vec<_>>();

		if names.is_empty() { vec!["No permissions"] } else { names }
	}

	/// Best-effort role classification for display.
	pub fn role_label(self) -> RoleLabel {
		match self.0 {
			0 => RoleLabel::NoPermissions,
			1 => RoleLabel::ClientsOnly,
			2 => RoleLabel::Stocker,
			3 => RoleLabel::Employee,
			4 => RoleLabel::DashboardOnly,
			6 => RoleLabel::Cashier,
			Self::OPERATOR => RoleLabel::Operator,
			Self::MANAGER => RoleLabel::Manager,
			7 | Self::ADMIN => RoleLabel::Administrator,
			_ => RoleLabel::Custom,
		}
	}
}
impl From<u64> for Permissions {
	fn from(bits: u64) -> Self {
		Self(bits)
	}
}
impl BitOr for Permissions {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self::Output {
		Self(self.0 | rhs.0)
	}
}

/// Display-only role derived from a [`Permissions`] mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoleLabel {
	/// Empty mask.
	NoPermissions,
	/// Clients only.
	ClientsOnly,
	/// Products only.
	Stocker,
	/// Clients and products.
	Employee,
	/// Dashboard only.
	DashboardOnly,
	/// Products and dashboard.
	Cashier,
	/// Clients, products, and sales.
	Operator,
	/// Operator plus dashboard.
	Manager,
	/// Full access.
	Administrator,
	/// Any other combination.
	Custom,
}
impl RoleLabel {
	/// Returns a stable label suitable for display.
	pub const fn as_str(self) -> &'static str {
		match self {
			RoleLabel::NoPermissions => "No permissions",
			RoleLabel::ClientsOnly => "Clients only",
			RoleLabel::Stocker => "Stocker",
			RoleLabel::Employee => "Employee",
			RoleLabel::DashboardOnly => "Dashboard only",
			RoleLabel::Cashier => "Cashier",
			RoleLabel::Operator => "Operator",
			RoleLabel::Manager => "Manager",
			RoleLabel::Administrator => "Administrator",
			RoleLabel::Custom => "Custom",
		}
	}
}
impl Display for RoleLabel {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn bits_are_independent() {
		let mask = Permissions::new(5);

		assert!(mask.contains(Permissions::CLIENTS));
		assert!(!mask.contains(Permissions::PRODUCTS));
		assert!(mask.contains(Permissions::DASHBOARD));
		assert!(!mask.contains(Permissions::SALES));
		assert!(!mask.contains(0));
		assert!(mask.contains_any([Permissions::SALES, Permissions::DASHBOARD]));
		assert!(!mask.contains_all([Permissions::CLIENTS, Permissions::SALES]));
		assert_eq!(mask.names(), ["Clients", "Dashboard"]);
	}

	#[test]
	fn role_labels_cover_known_combinations() {
		assert_eq!(Permissions::default().role_label(), RoleLabel::NoPermissions);
		assert_eq!(Permissions::default().names(), ["No permissions"]);
		assert_eq!(Permissions::new(6).role_label(), RoleLabel::Cashier);
		assert_eq!(Permissions::new(Permissions::MANAGER).role_label(), RoleLabel::Manager);
		assert_eq!(Permissions::new(Permissions::ADMIN).role_label(), RoleLabel::Administrator);
		assert_eq!(Permissions::new(5).role_label(), RoleLabel::Custom);
		assert_eq!(RoleLabel::Operator.to_string(), "Operator");
	}

	#[test]
	fn serializes_as_plain_integer() {
		let mask: Permissions =
			serde_json::from_str("31").expect("Integer permissions should deserialize.");

		assert_eq!(mask, Permissions::new(Permissions::ADMIN));
		assert_eq!(
			serde_json::to_string(&(Permissions::new(1) | Permissions::new(16)))
				.expect("Permissions should serialize."),
			"17"
		);
	}
}
