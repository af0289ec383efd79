//! Session lifecycle broadcast consumed by UI code.

// crates.io
use tokio::sync::broadcast;
// self
use crate::_prelude::*;

/// Lifecycle notification published by the session manager.
///
/// Endings carry no reason: inactivity and a failed refresh look the same to subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
	/// A session was established by login, or revived by a refresh after a lapse.
	Started,
	/// The warning countdown began.
	WarningStarted {
		/// Grace time before the forced logout.
		remaining: Duration,
	},
	/// One countdown step elapsed.
	WarningTick {
		/// Grace time left.
		remaining: Duration,
	},
	/// The user stayed; the warning is gone.
	WarningCleared,
	/// The session ended and its state was cleared.
	Ended,
	/// Published right after [`SessionEvent::Ended`], once the core state is reset.
	EndAcknowledged,
}

/// Multi-subscriber channel for [`SessionEvent`]s.
#[derive(Clone, Debug)]
pub struct SessionEvents {
	sender: broadcast::Sender<SessionEvent>,
}
impl SessionEvents {
	/// Buffered events per subscriber.
	pub const DEFAULT_CAPACITY: usize = 32;

	/// Creates a channel with [`SessionEvents::DEFAULT_CAPACITY`].
	pub fn new() -> Self {
		let (sender, _) = broadcast::channel(Self::DEFAULT_CAPACITY);

		Self { sender }
	}

	/// Registers a new subscriber that sees every event published from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event; having no subscribers is not an error.
	pub fn emit(&self, event: SessionEvent) -> usize {
		self.sender.send(event).unwrap_or(0)
	}
}
impl Default for SessionEvents {
	fn default() -> Self {
		Self::new()
	}
}
