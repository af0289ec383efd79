//! Warning countdown driven by an [`IdleMonitor`] that fires `warning_duration` early.

// crates.io
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	config::SessionConfig,
	idle::{ActivitySignal, ActivitySource, Countdown, IdleHandler, IdleMonitor, Phase, Step},
	obs,
};

/// Why the controller asked for a logout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogoutCause {
	/// The countdown reached zero.
	Expired,
	/// [`WarningController::force_logout`] was called.
	Forced,
}

/// Callbacks fired by a [`WarningController`], always outside its internal lock.
pub trait WarningHandler
where
	Self: Send + Sync,
{
	/// Entered the warning phase with a full window.
	fn on_warning(&self, remaining: Duration) {
		let _ = remaining;
	}

	/// One countdown step elapsed.
	fn on_tick(&self, remaining: Duration) {
		let _ = remaining;
	}

	/// The user chose to stay; back to normal.
	fn on_cleared(&self) {}

	/// Session must end. Fires at most once per started session.
	fn on_logout(&self, cause: LogoutCause);
}

/// Point-in-time view of a [`WarningController`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WarningSnapshot {
	/// Current countdown phase.
	pub phase: Phase,
	/// Whether the underlying monitor considers the user idle.
	pub is_idle: bool,
	/// Time until the warning starts; zero once it has.
	pub warning_in: Duration,
}

/// Composes an [`IdleMonitor`] with a one-second countdown before the forced logout.
///
/// The monitor fires after `idle_timeout - warning_duration`; the countdown then covers the
/// remaining `warning_duration`. At most one ticker task is alive at any time.
#[derive(Clone)]
pub struct WarningController {
	inner: Arc<ControllerInner>,
}
impl WarningController {
	/// Builds a controller from validated timing.
	pub fn new(config: &SessionConfig, handler: Arc<dyn WarningHandler>) -> Self {
		let inner = Arc::new_cyclic(|weak: &Weak<ControllerInner>| ControllerInner {
			idle_timeout: config.idle_timeout(),
			monitor: IdleMonitor::new(
				config.warning_after(),
				config.signals().iter().copied(),
				Arc::new(MonitorBridge(weak.clone())),
			),
			handler,
			state: Mutex::new(ControllerState {
				countdown: Countdown::new(config.warning_duration()),
				generation: 0,
				ticker: None,
			}),
		});

		Self { inner }
	}

	/// Starts a fresh session clock. Must be called within a Tokio runtime.
	pub fn start(&self) {
		let mut state = self.inner.state.lock();

		state.countdown.reset();
		state.cancel_ticker();
		drop(state);

		self.inner.monitor.start();
	}

	/// Stops every timer and settles in [`Phase::LoggedOut`] without notifying the handler.
	pub fn stop(&self) {
		let mut state = self.inner.state.lock();

		state.countdown.expire();
		state.cancel_ticker();
		drop(state);

		self.inner.monitor.halt();
	}

	/// Leaves the warning (if any) and grants a full idle window from now.
	///
	/// Returns `false` after logout, where there is nothing to keep alive.
	pub fn stay_active(&self) -> bool {
		let mut state = self.inner.state.lock();

		if state.countdown.phase() == Phase::LoggedOut {
			return false;
		}

		let cleared = state.countdown.cancel();

		state.cancel_ticker();
		drop(state);

		self.inner.monitor.resume();
		self.inner.monitor.force_active();

		if cleared {
			obs::record_transition("warning", "cleared");
			self.inner.handler.on_cleared();
		}

		true
	}

	/// Ends the session now, skipping whatever countdown is left. Idempotent.
	pub fn force_logout(&self) -> bool {
		self.logout(LogoutCause::Forced)
	}

	/// Feeds an activity signal to the underlying monitor.
	pub fn record_activity(&self, signal: ActivitySignal) -> bool {
		self.inner.monitor.signal(signal)
	}

	/// Subscribes the underlying monitor to `source`.
	pub fn listen(&self, source: &ActivitySource) -> bool {
		self.inner.monitor.listen(source)
	}

	/// Skips the quiet period and enters the warning immediately.
	pub fn force_idle(&self) {
		self.inner.monitor.force_idle();
	}

	/// Resets the monitor's activity clock without touching the countdown.
	pub fn reset_activity(&self) {
		self.inner.monitor.force_active();
	}

	/// Stops everything and releases the monitor's listeners.
	pub fn dispose(&self) {
		self.stop();
		self.inner.monitor.dispose();
	}

	/// Current phase.
	pub fn phase(&self) -> Phase {
		self.inner.state.lock().countdown.phase()
	}

	/// Returns `true` while the countdown runs.
	pub fn is_warning(&self) -> bool {
		self.inner.state.lock().countdown.is_active()
	}

	/// Grace time left; zero outside the warning.
	pub fn remaining(&self) -> Duration {
		self.inner.state.lock().countdown.remaining()
	}

	/// Total inactivity allowed before the logout.
	pub fn idle_timeout(&self) -> Duration {
		self.inner.idle_timeout
	}

	/// Length of the warning window.
	pub fn warning_duration(&self) -> Duration {
		self.inner.state.lock().countdown.warning_duration()
	}

	/// Underlying monitor.
	pub fn monitor(&self) -> &IdleMonitor {
		&self.inner.monitor
	}

	/// Consistent view for rendering.
	pub fn snapshot(&self) -> WarningSnapshot {
		let phase = self.phase();
		let is_idle = self.inner.monitor.is_idle();
		let warning_in = if is_idle { Duration::ZERO } else { self.inner.monitor.time_remaining() };

		WarningSnapshot { phase, is_idle, warning_in }
	}

	fn enter_warning(&self) {
		let mut state = self.inner.state.lock();
		let Some(remaining) = state.countdown.enter_warning() else {
			return;
		};

		self.inner.monitor.pause();
		self.spawn_ticker(&mut state);
		drop(state);

		obs::record_transition("warning", "entered");
		self.inner.handler.on_warning(remaining);
	}

	fn spawn_ticker(&self, state: &mut ControllerState) {
		state.cancel_ticker();

		let generation = state.generation;
		let weak = Arc::downgrade(&self.inner);

		state.ticker = Some(tokio::spawn(async move {
			let mut deadline = Instant::now();

			loop {
				let Some(delay) = weak.upgrade().and_then(|inner| {
					let state = inner.state.lock();

					(state.generation == generation).then(|| state.countdown.next_tick()).flatten()
				}) else {
					return;
				};

				deadline += delay;
				tokio::time::sleep_until(deadline).await;

				let Some(inner) = weak.upgrade() else { return };
				let controller = WarningController { inner };

				if !controller.advance(generation, delay) {
					return;
				}
			}
		}));
	}

	fn advance(&self, generation: u64, elapsed: Duration) -> bool {
		let mut state = self.inner.state.lock();

		if state.generation != generation {
			return false;
		}

		match state.countdown.tick(elapsed) {
			Step::Ignored => false,
			Step::Tick(remaining) => {
				drop(state);

				self.inner.handler.on_tick(remaining);

				true
			},
			Step::Expired => {
				// The running task is this ticker; release it without aborting.
				state.ticker = None;
				state.generation = state.generation.wrapping_add(1);
				drop(state);

				self.finish(LogoutCause::Expired);

				false
			},
		}
	}

	fn logout(&self, cause: LogoutCause) -> bool {
		let mut state = self.inner.state.lock();

		if !state.countdown.expire() {
			return false;
		}

		state.cancel_ticker();
		drop(state);

		self.finish(cause);

		true
	}

	fn finish(&self, cause: LogoutCause) {
		self.inner.monitor.halt();

		obs::record_transition("warning", "logged_out");
		self.inner.handler.on_logout(cause);
	}
}
impl Debug for WarningController {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WarningController")
			.field("idle_timeout", &self.inner.idle_timeout)
			.field("phase", &self.phase())
			.field("monitor", &self.inner.monitor)
			.finish()
	}
}

struct ControllerInner {
	idle_timeout: Duration,
	monitor: IdleMonitor,
	handler: Arc<dyn WarningHandler>,
	state: Mutex<ControllerState>,
}
impl Drop for ControllerInner {
	fn drop(&mut self) {
		self.state.get_mut().cancel_ticker();
	}
}

struct ControllerState {
	countdown: Countdown,
	generation: u64,
	ticker: Option<JoinHandle<()>>,
}
impl ControllerState {
	fn cancel_ticker(&mut self) {
		self.generation = self.generation.wrapping_add(1);

		if let Some(ticker) = self.ticker.take() {
			ticker.abort();
		}
	}
}

struct MonitorBridge(Weak<ControllerInner>);
impl IdleHandler for MonitorBridge {
	fn on_idle(&self) {
		if let Some(inner) = self.0.upgrade() {
			WarningController { inner }.enter_warning();
		}
	}
}
