//! Inactivity detection.
//!
//! [`IdleMonitor`] flips between active and idle based on [`ActivitySignal`]s and a deadline
//! timer. [`WarningController`] layers the pre-logout countdown on top of it, with the phase
//! logic itself kept in the clock-free [`Countdown`].

pub mod countdown;
pub mod signal;
pub mod warning;

pub use countdown::{Countdown, Phase, Step};
pub use signal::{ActivitySignal, ActivitySource, UnknownSignal};
pub use warning::{LogoutCause, WarningController, WarningHandler, WarningSnapshot};

// crates.io
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
// self
use crate::{_prelude::*, obs};

/// Callbacks fired by an [`IdleMonitor`].
///
/// Both run outside the monitor's internal lock, so they may call back into the monitor.
pub trait IdleHandler
where
	Self: Send + Sync,
{
	/// The timeout elapsed without activity. Fires once per idle episode.
	fn on_idle(&self);

	/// Activity arrived while idle.
	fn on_active(&self) {}
}

/// Active/idle state machine driven by activity signals and one deadline timer.
///
/// Cloning yields another handle to the same monitor. Timer and listener tasks only hold
/// weak references, so dropping the last handle releases everything.
#[derive(Clone)]
pub struct IdleMonitor {
	inner: Arc<MonitorInner>,
}
impl IdleMonitor {
	/// Configures a monitor. Nothing is scheduled until [`IdleMonitor::start`].
	pub fn new(
		timeout: Duration,
		signals: impl IntoIterator<Item = ActivitySignal>,
		handler: Arc<dyn IdleHandler>,
	) -> Self {
		let state = MonitorState {
			last_activity_at: Instant::now(),
			deadline: None,
			running: false,
			idle: false,
			paused: false,
			disposed: false,
			generation: 0,
			timer: None,
			listeners: Vec::new(),
		};

		Self {
			inner: Arc::new(MonitorInner {
				timeout,
				signals: signals.into_iter().collect(),
				handler,
				state: Mutex::new(state),
			}),
		}
	}

	/// Starts a fresh active window. Must be called within a Tokio runtime.
	pub fn start(&self) {
		let mut state = self.inner.state.lock();

		if state.disposed {
			return;
		}

		state.running = true;
		state.idle = false;
		state.paused = false;
		state.last_activity_at = Instant::now();

		self.arm(&mut state);
		drop(state);

		obs::record_transition("idle", "started");
	}

	/// Feeds one activity signal.
	///
	/// Signals outside the configured set are ignored, as is every signal while paused or
	/// before [`IdleMonitor::start`].
	/// Returns whether the signal reset the clock.
	pub fn signal(&self, signal: ActivitySignal) -> bool {
		if !self.inner.signals.contains(&signal) {
			return false;
		}

		self.record_activity(false)
	}

	/// Stops signals from resetting the clock. An armed deadline is left in place; if it
	/// elapses while paused it is ignored.
	pub fn pause(&self) {
		self.inner.state.lock().paused = true;

		obs::record_transition("idle", "paused");
	}

	/// Observes signals again and, unless idle, grants a fresh window from now.
	pub fn resume(&self) {
		let mut state = self.inner.state.lock();

		if state.disposed || !state.paused {
			return;
		}

		state.paused = false;

		if state.running && !state.idle {
			self.arm(&mut state);
		}
		drop(state);

		obs::record_transition("idle", "resumed");
	}

	/// Marks the monitor idle immediately, unless it already is.
	pub fn force_idle(&self) {
		let mut state = self.inner.state.lock();

		if state.disposed || state.idle {
			return;
		}

		state.idle = true;

		self.disarm(&mut state);
		drop(state);

		obs::record_transition("idle", "forced_idle");
		self.inner.handler.on_idle();
	}

	/// Records activity even while paused and restarts the window. The paused flag is kept.
	///
	/// A halted monitor stays halted; only [`IdleMonitor::start`] brings it back.
	pub fn force_active(&self) {
		self.record_activity(true);
	}

	/// Cancels the deadline timer and stops arming new ones until the next start.
	pub fn halt(&self) {
		let mut state = self.inner.state.lock();

		state.running = false;

		self.disarm(&mut state);
		drop(state);

		obs::record_transition("idle", "halted");
	}

	/// Releases the timer and every listener. The monitor ignores all calls afterwards.
	pub fn dispose(&self) {
		let mut state = self.inner.state.lock();

		if state.disposed {
			return;
		}

		state.disposed = true;
		state.running = false;

		self.disarm(&mut state);

		for listener in state.listeners.drain(..) {
			listener.abort();
		}
		drop(state);

		obs::record_transition("idle", "disposed");
	}

	/// Subscribes to `source`; each received signal is fed to [`IdleMonitor::signal`].
	///
	/// A listener that fell behind treats the gap as activity. Returns `false` once disposed.
	pub fn listen(&self, source: &ActivitySource) -> bool {
		let mut state = self.inner.state.lock();

		if state.disposed {
			return false;
		}

		let mut receiver = source.subscribe();
		let weak = Arc::downgrade(&self.inner);
		let listener = tokio::spawn(async move {
			loop {
				let received = receiver.recv().await;
				let Some(inner) = weak.upgrade() else { return };
				let monitor = IdleMonitor { inner };

				match received {
					Ok(signal) => {
						monitor.signal(signal);
					},
					Err(RecvError::Lagged(_)) => {
						monitor.record_activity(false);
					},
					Err(RecvError::Closed) => return,
				}
			}
		});

		state.listeners.retain(|listener| !listener.is_finished());
		state.listeners.push(listener);

		true
	}

	/// Returns `true` while the current idle episode lasts.
	pub fn is_idle(&self) -> bool {
		self.inner.state.lock().idle
	}

	/// Returns `true` while signals are being ignored.
	pub fn is_paused(&self) -> bool {
		self.inner.state.lock().paused
	}

	/// Returns `true` between [`IdleMonitor::start`] and [`IdleMonitor::halt`].
	pub fn is_running(&self) -> bool {
		self.inner.state.lock().running
	}

	/// Moment of the last accepted activity.
	pub fn last_activity_at(&self) -> Instant {
		self.inner.state.lock().last_activity_at
	}

	/// Elapsed time since the last accepted activity.
	pub fn time_since_last_activity(&self) -> Duration {
		self.inner.state.lock().last_activity_at.elapsed()
	}

	/// Time left before the armed deadline; zero once idle, the full timeout when unarmed.
	pub fn time_remaining(&self) -> Duration {
		let state = self.inner.state.lock();

		if state.idle {
			return Duration::ZERO;
		}

		state
			.deadline
			.map(|deadline| deadline.saturating_duration_since(Instant::now()))
			.unwrap_or(self.inner.timeout)
	}

	/// Configured quiet period.
	pub fn timeout(&self) -> Duration {
		self.inner.timeout
	}

	/// Configured signal set.
	pub fn signals(&self) -> &BTreeSet<ActivitySignal> {
		&self.inner.signals
	}

	fn record_activity(&self, force: bool) -> bool {
		let mut state = self.inner.state.lock();

		if state.disposed || !state.running || (!force && state.paused) {
			return false;
		}

		let was_idle = state.idle;

		state.idle = false;
		state.last_activity_at = Instant::now();

		self.arm(&mut state);
		drop(state);

		if was_idle {
			obs::record_transition("idle", "active");
			self.inner.handler.on_active();
		}

		true
	}

	fn arm(&self, state: &mut MonitorState) {
		self.disarm(state);

		let generation = state.generation;
		let deadline = Instant::now() + self.inner.timeout;
		let weak = Arc::downgrade(&self.inner);

		state.deadline = Some(deadline);
		state.timer = Some(tokio::spawn(async move {
			tokio::time::sleep_until(deadline).await;

			if let Some(inner) = weak.upgrade() {
				IdleMonitor { inner }.expire(generation);
			}
		}));
	}

	fn disarm(&self, state: &mut MonitorState) {
		state.generation = state.generation.wrapping_add(1);
		state.deadline = None;

		if let Some(timer) = state.timer.take() {
			timer.abort();
		}
	}

	fn expire(&self, generation: u64) {
		let mut state = self.inner.state.lock();

		if state.generation != generation || state.disposed || state.idle {
			return;
		}

		// The elapsed timer is finished either way; only an unpaused expiry counts.
		state.timer = None;
		state.deadline = None;

		if state.paused {
			return;
		}

		state.idle = true;
		drop(state);

		obs::record_transition("idle", "idle");
		self.inner.handler.on_idle();
	}
}
impl Debug for IdleMonitor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.inner.state.lock();

		f.debug_struct("IdleMonitor")
			.field("timeout", &self.inner.timeout)
			.field("signals", &self.inner.signals)
			.field("running", &state.running)
			.field("idle", &state.idle)
			.field("paused", &state.paused)
			.field("disposed", &state.disposed)
			.finish()
	}
}

struct MonitorInner {
	timeout: Duration,
	signals: BTreeSet<ActivitySignal>,
	handler: Arc<dyn IdleHandler>,
	state: Mutex<MonitorState>,
}
impl Drop for MonitorInner {
	fn drop(&mut self) {
		let state = self.state.get_mut();

		if let Some(timer) = state.timer.take() {
			timer.abort();
		}
		for listener in state.listeners.drain(..) {
			listener.abort();
		}
	}
}

struct MonitorState {
	last_activity_at: Instant,
	deadline: Option<Instant>,
	running: bool,
	idle: bool,
	paused: bool,
	disposed: bool,
	generation: u64,
	timer: Option<JoinHandle<()>>,
	listeners: Vec<JoinHandle<()>>,
}
