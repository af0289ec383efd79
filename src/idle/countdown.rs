//! Clock-free Normal → Warning → LoggedOut state machine.
//!
//! Transitions only compute what to schedule next; the caller owns the clock.

// self
use crate::_prelude::*;

/// Phase of the pre-logout countdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	/// No warning is showing.
	Normal,
	/// Countdown in progress.
	Warning {
		/// Grace time left before the forced logout.
		remaining: Duration,
	},
	/// Countdown reached zero or the logout was forced.
	LoggedOut,
}

/// Result of feeding elapsed time into a [`Countdown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
	/// Not counting down; nothing changed.
	Ignored,
	/// Still warning with this much left.
	Tick(Duration),
	/// Reached zero and moved to [`Phase::LoggedOut`].
	Expired,
}

/// Countdown state for one warning window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Countdown {
	warning: Duration,
	phase: Phase,
}
impl Countdown {
	/// Interval between countdown updates.
	pub const TICK: Duration = Duration::from_secs(1);

	/// Creates a countdown in [`Phase::Normal`].
	pub fn new(warning: Duration) -> Self {
		Self { warning, phase: Phase::Normal }
	}

	/// Current phase.
	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Length of a full warning window.
	pub fn warning_duration(&self) -> Duration {
		self.warning
	}

	/// Grace time left; zero outside [`Phase::Warning`].
	pub fn remaining(&self) -> Duration {
		match self.phase {
			Phase::Warning { remaining } => remaining,
			_ => Duration::ZERO,
		}
	}

	/// Returns `true` while warning.
	pub fn is_active(&self) -> bool {
		matches!(self.phase, Phase::Warning { .. })
	}

	/// Normal → Warning with a full window.
	///
	/// Returns `None` when already warning or logged out, so a second entry never starts a
	/// second interval.
	pub fn enter_warning(&mut self) -> Option<Duration> {
		if self.phase != Phase::Normal {
			return None;
		}

		self.phase = Phase::Warning { remaining: self.warning };

		Some(self.warning)
	}

	/// Delay until the next tick: one [`Countdown::TICK`], shortened to land exactly on zero.
	pub fn next_tick(&self) -> Option<Duration> {
		match self.phase {
			Phase::Warning { remaining } => Some(remaining.min(Self::TICK)),
			_ => None,
		}
	}

	/// Subtracts `elapsed` from the remaining grace time.
	pub fn tick(&mut self, elapsed: Duration) -> Step {
		let Phase::Warning { remaining } = self.phase else {
			return Step::Ignored;
		};
		let remaining = remaining.saturating_sub(elapsed);

		if remaining.is_zero() {
			self.phase = Phase::LoggedOut;

			Step::Expired
		} else {
			self.phase = Phase::Warning { remaining };

			Step::Tick(remaining)
		}
	}

	/// Warning → Normal. Returns whether a warning was cancelled.
	pub fn cancel(&mut self) -> bool {
		if !self.is_active() {
			return false;
		}

		self.phase = Phase::Normal;

		true
	}

	/// Any phase → LoggedOut. Returns `false` when already logged out.
	pub fn expire(&mut self) -> bool {
		if self.phase == Phase::LoggedOut {
			return false;
		}

		self.phase = Phase::LoggedOut;

		true
	}

	/// Back to [`Phase::Normal`] for a new session.
	pub fn reset(&mut self) {
		self.phase = Phase::Normal;
	}
}
