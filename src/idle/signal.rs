//! Activity signal kinds and the broadcast source that feeds them to monitors.

// crates.io
use tokio::sync::broadcast;
// self
use crate::_prelude::*;

/// Abstract user-activity signal that can reset the idle clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySignal {
	/// Pointer button pressed.
	PointerDown,
	/// Pointer moved.
	PointerMove,
	/// Key pressed.
	KeyPress,
	/// Viewport or element scrolled.
	Scroll,
	/// Touch started.
	TouchStart,
	/// Click completed.
	Click,
}
impl ActivitySignal {
	/// Signals observed when a configuration does not narrow them down.
	pub const DEFAULTS: [ActivitySignal; 6] = [
		ActivitySignal::PointerDown,
		ActivitySignal::PointerMove,
		ActivitySignal::KeyPress,
		ActivitySignal::Scroll,
		ActivitySignal::TouchStart,
		ActivitySignal::Click,
	];

	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			ActivitySignal::PointerDown => "pointer_down",
			ActivitySignal::PointerMove => "pointer_move",
			ActivitySignal::KeyPress => "key_press",
			ActivitySignal::Scroll => "scroll",
			ActivitySignal::TouchStart => "touch_start",
			ActivitySignal::Click => "click",
		}
	}
}
impl Display for ActivitySignal {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ActivitySignal {
	type Err = UnknownSignal;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ActivitySignal::DEFAULTS
			.into_iter()
			.find(|signal| signal.as_str() == s)
			.ok_or_else(|| UnknownSignal(s.to_owned()))
	}
}

/// Error returned when parsing an unrecognized signal label.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown activity signal `{0}`.")]
pub struct UnknownSignal(pub String);

/// Fan-out point where the embedding application publishes raw activity.
///
/// Monitors subscribe through [`crate::idle::IdleMonitor::listen`]; each subscription is a
/// listener task that the monitor releases on dispose.
#[derive(Clone, Debug)]
pub struct ActivitySource {
	sender: broadcast::Sender<ActivitySignal>,
}
impl ActivitySource {
	/// Buffered signals per subscriber before older ones are dropped.
	pub const DEFAULT_CAPACITY: usize = 64;

	/// Creates a source with [`ActivitySource::DEFAULT_CAPACITY`].
	pub fn new() -> Self {
		Self::with_capacity(Self::DEFAULT_CAPACITY)
	}

	/// Creates a source with a custom per-subscriber buffer.
	pub fn with_capacity(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));

		Self { sender }
	}

	/// Publishes one signal; returns how many listeners received it.
	pub fn emit(&self, signal: ActivitySignal) -> usize {
		self.sender.send(signal).unwrap_or(0)
	}

	/// Number of live listeners.
	pub fn listener_count(&self) -> usize {
		self.sender.receiver_count()
	}

	pub(crate) fn subscribe(&self) -> broadcast::Receiver<ActivitySignal> {
		self.sender.subscribe()
	}
}
impl Default for ActivitySource {
	fn default() -> Self {
		Self::new()
	}
}
