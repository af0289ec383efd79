mod common;

// std
use std::{sync::Arc, time::Duration};
// crates.io
use tokio::sync::broadcast::{Receiver, error::TryRecvError};
// self
use common::*;
use session_warden::{
	http::ApiResponse,
	idle::{ActivitySignal, Phase},
	session::{SessionEvent, SessionManager},
};

fn offline() -> Arc<ScriptedTransport> {
	Arc::new(ScriptedTransport::new(|_| ApiResponse::new(503, "offline")))
}

/// Session restored at t = 0 with `idle_ms` of allowed inactivity and `warning_ms` of grace.
fn session(idle_ms: u64, warning_ms: u64) -> SessionManager {
	manager(timing(idle_ms, warning_ms), offline(), seeded_backend("t1", Some("r1")))
}

async fn advance_to(start: tokio::time::Instant, at_ms: u64) {
	tokio::time::sleep_until(start + Duration::from_millis(at_ms)).await;
}

fn drain(events: &mut Receiver<SessionEvent>) -> Vec<SessionEvent> {
	let mut seen = Vec::new();

	loop {
		match events.try_recv() {
			Ok(event) => seen.push(event),
			Err(TryRecvError::Empty) => return seen,
			Err(e) => panic!("Event stream broke: {e}."),
		}
	}
}

#[tokio::test(start_paused = true)]
async fn warning_at_seven_hundred_and_logout_at_one_thousand() {
	let start = tokio::time::Instant::now();
	let manager = session(1_000, 300);
	let mut events = manager.subscribe();

	advance_to(start, 699).await;

	assert_eq!(manager.phase(), Phase::Normal);

	advance_to(start, 701).await;

	assert_eq!(manager.phase(), Phase::Warning { remaining: Duration::from_millis(300) });
	assert_eq!(drain(&mut events), vec![SessionEvent::WarningStarted {
		remaining: Duration::from_millis(300)
	}]);

	advance_to(start, 999).await;

	assert!(manager.is_authenticated());

	advance_to(start, 1_001).await;

	assert!(!manager.is_authenticated());
	assert_eq!(manager.phase(), Phase::LoggedOut);
	assert_eq!(drain(&mut events), vec![SessionEvent::Ended, SessionEvent::EndAcknowledged]);
	assert!(!manager.warning().monitor().is_running());
}

#[tokio::test(start_paused = true)]
async fn longer_warning_ticks_every_second() {
	let start = tokio::time::Instant::now();
	let manager = session(10_000, 2_500);
	let mut events = manager.subscribe();

	advance_to(start, 10_001).await;

	assert_eq!(drain(&mut events), vec![
		SessionEvent::WarningStarted { remaining: Duration::from_millis(2_500) },
		SessionEvent::WarningTick { remaining: Duration::from_millis(1_500) },
		SessionEvent::WarningTick { remaining: Duration::from_millis(500) },
		SessionEvent::Ended,
		SessionEvent::EndAcknowledged,
	]);
}

#[tokio::test(start_paused = true)]
async fn stay_active_grants_a_fresh_full_window() {
	let start = tokio::time::Instant::now();
	let manager = session(1_000, 300);
	let mut events = manager.subscribe();

	advance_to(start, 800).await;

	assert!(manager.warning().is_warning());
	assert!(manager.stay_active());
	assert_eq!(manager.phase(), Phase::Normal);

	// The old countdown would have ended the session here.
	advance_to(start, 1_100).await;

	assert!(manager.is_authenticated());

	advance_to(start, 1_499).await;

	assert_eq!(manager.phase(), Phase::Normal);

	advance_to(start, 1_501).await;

	assert!(manager.warning().is_warning());

	advance_to(start, 1_801).await;

	assert!(!manager.is_authenticated());
	assert_eq!(drain(&mut events), vec![
		SessionEvent::WarningStarted { remaining: Duration::from_millis(300) },
		SessionEvent::WarningCleared,
		SessionEvent::WarningStarted { remaining: Duration::from_millis(300) },
		SessionEvent::Ended,
		SessionEvent::EndAcknowledged,
	]);
}

#[tokio::test(start_paused = true)]
async fn activity_during_warning_neither_resets_nor_cancels() {
	let start = tokio::time::Instant::now();
	let manager = session(1_000, 300);

	advance_to(start, 750).await;

	let last_activity = manager.warning().monitor().last_activity_at();

	assert!(!manager.record_activity(ActivitySignal::KeyPress));
	assert!(!manager.record_activity(ActivitySignal::Click));
	assert_eq!(manager.warning().monitor().last_activity_at(), last_activity);
	assert!(manager.warning().is_warning());

	advance_to(start, 1_001).await;

	assert!(!manager.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn activity_before_warning_postpones_it() {
	let start = tokio::time::Instant::now();
	let manager = session(1_000, 300);

	advance_to(start, 600).await;

	assert!(manager.record_activity(ActivitySignal::PointerMove));

	advance_to(start, 1_200).await;

	assert_eq!(manager.phase(), Phase::Normal);
	assert!(manager.is_authenticated());

	advance_to(start, 1_301).await;

	assert!(manager.warning().is_warning());
}

#[tokio::test(start_paused = true)]
async fn force_logout_skips_the_rest_of_the_countdown() {
	let start = tokio::time::Instant::now();
	let manager = session(10_000, 5_000);
	let mut events = manager.subscribe();

	advance_to(start, 5_500).await;

	assert!(manager.force_logout());
	assert!(!manager.force_logout());
	assert!(!manager.is_authenticated());

	advance_to(start, 20_000).await;

	assert_eq!(drain(&mut events), vec![
		SessionEvent::WarningStarted { remaining: Duration::from_millis(5_000) },
		SessionEvent::Ended,
		SessionEvent::EndAcknowledged,
	]);
	assert!(!manager.stay_active());
}

#[tokio::test(start_paused = true)]
async fn repeated_idle_triggers_keep_a_single_countdown() {
	let start = tokio::time::Instant::now();
	let manager = session(10_000, 2_000);
	let mut events = manager.subscribe();

	manager.warning().force_idle();
	manager.warning().force_idle();
	manager.warning().reset_activity();
	manager.warning().force_idle();

	advance_to(start, 2_001).await;

	assert_eq!(drain(&mut events), vec![
		SessionEvent::WarningStarted { remaining: Duration::from_millis(2_000) },
		SessionEvent::WarningTick { remaining: Duration::from_millis(1_000) },
		SessionEvent::Ended,
		SessionEvent::EndAcknowledged,
	]);
}
