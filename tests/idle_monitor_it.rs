// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// self
use session_warden::idle::{ActivitySignal, ActivitySource, IdleHandler, IdleMonitor};

#[derive(Default)]
struct Counter {
	idle: AtomicUsize,
	active: AtomicUsize,
}
impl IdleHandler for Counter {
	fn on_idle(&self) {
		self.idle.fetch_add(1, Ordering::SeqCst);
	}

	fn on_active(&self) {
		self.active.fetch_add(1, Ordering::SeqCst);
	}
}

fn monitor(signals: &[ActivitySignal]) -> (IdleMonitor, Arc<Counter>) {
	let counter = Arc::new(Counter::default());
	let monitor =
		IdleMonitor::new(Duration::from_millis(1_000), signals.iter().copied(), counter.clone());

	(monitor, counter)
}

/// Lets listener tasks drain their channels.
async fn settle() {
	tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn source_signals_reset_the_clock() {
	let (monitor, counter) = monitor(&ActivitySignal::DEFAULTS);
	let source = ActivitySource::new();

	monitor.start();
	assert!(monitor.listen(&source));

	tokio::time::sleep(Duration::from_millis(900)).await;
	source.emit(ActivitySignal::Scroll);
	settle().await;

	assert!(monitor.time_since_last_activity() <= Duration::from_millis(1));

	tokio::time::sleep(Duration::from_millis(900)).await;

	assert!(!monitor.is_idle());

	tokio::time::sleep(Duration::from_millis(200)).await;

	assert!(monitor.is_idle());
	assert_eq!(counter.idle.load(Ordering::SeqCst), 1);

	source.emit(ActivitySignal::TouchStart);
	settle().await;

	assert!(!monitor.is_idle());
	assert_eq!(counter.active.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn filtered_signals_from_the_source_are_ignored() {
	let (monitor, counter) = monitor(&[ActivitySignal::KeyPress]);
	let source = ActivitySource::new();

	monitor.start();
	monitor.listen(&source);

	tokio::time::sleep(Duration::from_millis(500)).await;
	source.emit(ActivitySignal::PointerMove);
	source.emit(ActivitySignal::Click);
	settle().await;
	tokio::time::sleep(Duration::from_millis(500)).await;

	assert!(monitor.is_idle());
	assert_eq!(counter.idle.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn lagging_listener_counts_the_gap_as_activity() {
	let (monitor, _) = monitor(&[ActivitySignal::KeyPress]);
	let source = ActivitySource::with_capacity(1);

	monitor.start();
	monitor.listen(&source);

	tokio::time::sleep(Duration::from_millis(500)).await;

	let before = monitor.last_activity_at();

	// Nothing in this burst is configured, but the overflow itself is treated as activity.
	for _ in 0..3 {
		source.emit(ActivitySignal::PointerMove);
	}
	settle().await;

	assert!(monitor.last_activity_at() > before);
}

#[tokio::test(start_paused = true)]
async fn one_source_feeds_several_monitors() {
	let (first, _) = monitor(&ActivitySignal::DEFAULTS);
	let (second, _) = monitor(&ActivitySignal::DEFAULTS);
	let source = ActivitySource::new();

	first.start();
	second.start();
	first.listen(&source);
	second.listen(&source);

	assert_eq!(source.listener_count(), 2);

	tokio::time::sleep(Duration::from_millis(700)).await;
	source.emit(ActivitySignal::KeyPress);
	settle().await;

	assert!(first.time_remaining() >= Duration::from_millis(998));
	assert!(second.time_remaining() >= Duration::from_millis(998));
}

#[tokio::test(start_paused = true)]
async fn dispose_and_drop_release_listeners() {
	let (disposed, _) = monitor(&ActivitySignal::DEFAULTS);
	let (dropped, _) = monitor(&ActivitySignal::DEFAULTS);
	let source = ActivitySource::new();

	disposed.start();
	disposed.listen(&source);
	dropped.listen(&source);

	assert_eq!(source.listener_count(), 2);

	disposed.dispose();
	drop(dropped);
	settle().await;

	assert_eq!(source.listener_count(), 0);
	assert!(!disposed.listen(&source));
	assert_eq!(source.emit(ActivitySignal::Click), 0);
}
