//! Session timing configuration with fail-fast validation.

// self
use crate::{_prelude::*, error::ConfigError, idle::ActivitySignal};

/// Timing and signal configuration accepted by the session core.
///
/// Only obtainable through [`SessionConfigBuilder::build`], so every instance has a non-zero
/// idle timeout and `warning_duration <= idle_timeout`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
	idle_timeout: Duration,
	warning_duration: Duration,
	signals: BTreeSet<ActivitySignal>,
}
impl SessionConfig {
	/// Idle timeout used by the deployed dashboard.
	pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
	/// Warning window used by the deployed dashboard.
	pub const DEFAULT_WARNING_DURATION: Duration = Duration::from_secs(30);

	/// Returns a builder seeded with the defaults.
	pub fn builder() -> SessionConfigBuilder {
		SessionConfigBuilder::default()
	}

	/// Total inactivity allowed before a forced logout.
	pub fn idle_timeout(&self) -> Duration {
		self.idle_timeout
	}

	/// Length of the warning countdown that precedes the forced logout.
	pub fn warning_duration(&self) -> Duration {
		self.warning_duration
	}

	/// Quiet period after which the warning starts.
	pub fn warning_after(&self) -> Duration {
		self.idle_timeout - self.warning_duration
	}

	/// Activity signals that reset the idle clock.
	pub fn signals(&self) -> &BTreeSet<ActivitySignal> {
		&self.signals
	}
}
impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
			warning_duration: Self::DEFAULT_WARNING_DURATION,
			signals: ActivitySignal::DEFAULTS.into_iter().collect(),
		}
	}
}

/// Builder for [`SessionConfig`].
#[derive(Clone, Debug)]
pub struct SessionConfigBuilder {
	idle_timeout: Duration,
	warning_duration: Duration,
	signals: BTreeSet<ActivitySignal>,
}
impl SessionConfigBuilder {
	/// Sets the total inactivity allowance.
	pub fn idle_timeout(mut self, timeout: Duration) -> Self {
		self.idle_timeout = timeout;

		self
	}

	/// Sets the warning countdown length.
	pub fn warning_duration(mut self, duration: Duration) -> Self {
		self.warning_duration = duration;

		self
	}

	/// Replaces the observed activity signals.
	pub fn signals(mut self, signals: impl IntoIterator<Item = ActivitySignal>) -> Self {
		self.signals = signals.into_iter().collect();

		self
	}

	/// Validates and produces the configuration.
	pub fn build(self) -> Result<SessionConfig, ConfigError> {
		if self.idle_timeout.is_zero() {
			return Err(ConfigError::ZeroIdleTimeout);
		}
		if self.warning_duration > self.idle_timeout {
			return Err(ConfigError::WarningExceedsIdle {
				warning: self.warning_duration,
				idle: self.idle_timeout,
			});
		}

		Ok(SessionConfig {
			idle_timeout: self.idle_timeout,
			warning_duration: self.warning_duration,
			signals: self.signals,
		})
	}
}
impl Default for SessionConfigBuilder {
	fn default() -> Self {
		let defaults = SessionConfig::default();

		Self {
			idle_timeout: defaults.idle_timeout,
			warning_duration: defaults.warning_duration,
			signals: defaults.signals,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_dashboard_timings() {
		let config = SessionConfig::builder().build().expect("Defaults should validate.");

		assert_eq!(config.idle_timeout(), Duration::from_secs(1800));
		assert_eq!(config.warning_after(), Duration::from_secs(1770));
		assert_eq!(config.signals().len(), ActivitySignal::DEFAULTS.len());
	}

	#[test]
	fn rejects_warning_longer_than_idle() {
		let err = SessionConfig::builder()
			.idle_timeout(Duration::from_millis(1000))
			.warning_duration(Duration::from_millis(1001))
			.build()
			.expect_err("Warning longer than idle timeout must fail fast.");

		assert!(matches!(err, ConfigError::WarningExceedsIdle { .. }));
	}

	#[test]
	fn rejects_zero_idle_and_accepts_equal_bounds() {
		let err = SessionConfig::builder()
			.idle_timeout(Duration::ZERO)
			.warning_duration(Duration::ZERO)
			.build()
			.expect_err("Zero idle timeout must be rejected.");

		assert!(matches!(err, ConfigError::ZeroIdleTimeout));

		let config = SessionConfig::builder()
			.idle_timeout(Duration::from_secs(5))
			.warning_duration(Duration::from_secs(5))
			.signals([ActivitySignal::KeyPress])
			.build()
			.expect("Warning equal to the idle timeout is allowed.");

		assert_eq!(config.warning_after(), Duration::ZERO);
		assert_eq!(config.signals().len(), 1);
	}
}
