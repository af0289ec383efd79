//! Auth-domain models: token secrets, embedded claims, permissions, and user profiles.

pub mod claims;
pub mod permission;
pub mod secret;
pub mod user;

pub use claims::*;
pub use permission::*;
pub use secret::*;
pub use user::*;
