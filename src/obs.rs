//! Optional observability helpers for session operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `session_warden.op` with the `op` field,
//!   plus debug events for every idle/warning/refresh state transition.
//! - Enable `metrics` to increment `session_warden_refresh_total` (labeled by `outcome`) and
//!   `session_warden_session_end_total` (labeled by `reason`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Session operations wrapped in spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Credential exchange against the login endpoint.
	Login,
	/// Session teardown.
	Logout,
	/// Single-flight token refresh.
	Refresh,
	/// Authenticated pass-through request.
	Send,
	/// Session recovery from persisted keys.
	Restore,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Login => "login",
			OpKind::Logout => "logout",
			OpKind::Refresh => "refresh",
			OpKind::Send => "send",
			OpKind::Restore => "restore",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each refresh call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshOutcome {
	/// A refresh network call was started.
	Attempt,
	/// New tokens were stored.
	Success,
	/// The refresh failed and the session was ended.
	Failure,
	/// A request waited behind an in-flight refresh.
	Queued,
}
impl RefreshOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshOutcome::Attempt => "attempt",
			RefreshOutcome::Success => "success",
			RefreshOutcome::Failure => "failure",
			RefreshOutcome::Queued => "queued",
		}
	}
}
impl Display for RefreshOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
