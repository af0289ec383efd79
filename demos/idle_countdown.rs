//! Walks a session through login, a transparent refresh, and an idle logout without a server.
//!
//! 1. Implement [`Transport`] with an in-process API that expires the first access token.
//! 2. Open a [`SessionManager`] over it with a short idle window.
//! 3. Watch [`SessionEvent`]s while the warning counts down to the forced logout.

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use color_eyre::Result;
use serde_json::json;
// self
use session_warden::{
	api::{LOGIN_PATH, REFRESH_PATH},
	config::SessionConfig,
	http::{ApiRequest, ApiResponse, Transport, TransportFuture},
	session::{SessionEvent, SessionManager},
	store::MemoryStore,
};

#[derive(Default)]
struct DemoApi {
	refreshes: AtomicUsize,
}
impl Transport for DemoApi {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let body = match request.path.as_str() {
				LOGIN_PATH => json!({
					"user": { "id": 1, "username": "alice", "first_name": "Alice", "permissions": 5 },
					"token": "access-1",
					"refresh_token": "refresh-1",
				}),
				REFRESH_PATH => {
					let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 2;

					json!({ "token": format!("access-{n}"), "refresh_token": format!("refresh-{n}") })
				},
				_ if request.bearer() == Some("access-1") =>
					return Ok(ApiResponse::new(401, r#"{"message":"token expired"}"#)),
				_ => json!({ "data": ["acme", "globex"] }),
			};

			Ok(ApiResponse::new(200, body.to_string()))
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = SessionConfig::builder()
		.idle_timeout(Duration::from_secs(4))
		.warning_duration(Duration::from_secs(2))
		.build()?;
	let manager =
		SessionManager::open(config, Arc::new(DemoApi::default()), Arc::new(MemoryStore::default()))?;
	let mut events = manager.subscribe();
	let user = manager.login("alice", "secret").await?;

	println!("Logged in as {} ({}).", user.username, user.role_label());

	let response = manager.send(ApiRequest::get("/api/clients")).await?;

	println!(
		"Clients: {} (refreshes: {}).",
		String::from_utf8_lossy(&response.body),
		manager.refresh().metrics().attempts()
	);

	while let Ok(event) = events.recv().await {
		match event {
			SessionEvent::WarningStarted { remaining } =>
				println!("Still there? Logging out in {remaining:?}."),
			SessionEvent::WarningTick { remaining } => println!("{remaining:?} left."),
			SessionEvent::Ended => println!("Session ended."),
			SessionEvent::EndAcknowledged => break,
			_ => {},
		}
	}

	println!("Authenticated: {}.", manager.is_authenticated());

	Ok(())
}
