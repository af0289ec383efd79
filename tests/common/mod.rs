//! Shared fixtures for integration tests: a scripted in-memory transport and session seeds.

#![allow(dead_code)]

// std
use std::{collections::HashMap, sync::Arc, time::Duration};
// crates.io
use parking_lot::Mutex;
// self
use session_warden::{
	auth::{Permissions, TokenPair, UserProfile},
	config::SessionConfig,
	http::{ApiRequest, ApiResponse, Transport, TransportFuture},
	session::{SessionManager, TokenStore},
	store::MemoryStore,
};

/// What the transport saw for one call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorded {
	pub path: String,
	pub bearer: Option<String>,
	pub retried: bool,
	pub body: Option<String>,
}

type Responder = dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync;

/// [`Transport`] answering from a closure, with optional per-path latency.
pub struct ScriptedTransport {
	responder: Box<Responder>,
	delays: HashMap<String, Duration>,
	calls: Mutex<Vec<Recorded>>,
}
impl ScriptedTransport {
	pub fn new(responder: impl 'static + Fn(&ApiRequest) -> ApiResponse + Send + Sync) -> Self {
		Self { responder: Box::new(responder), delays: HashMap::new(), calls: Mutex::new(Vec::new()) }
	}

	pub fn delay(mut self, path: &str, delay: Duration) -> Self {
		self.delays.insert(path.to_owned(), delay);

		self
	}

	pub fn calls(&self) -> Vec<Recorded> {
		self.calls.lock().clone()
	}

	pub fn calls_to(&self, path: &str) -> Vec<Recorded> {
		self.calls.lock().iter().filter(|call| call.path == path).cloned().collect()
	}
}
impl Transport for ScriptedTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		self.calls.lock().push(Recorded {
			path: request.path.clone(),
			bearer: request.bearer().map(str::to_owned),
			retried: request.is_retry(),
			body: request.body.as_ref().map(|body| String::from_utf8_lossy(body).into_owned()),
		});

		let response = (self.responder)(&request);
		let delay = self.delays.get(&request.path).copied();

		Box::pin(async move {
			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}

			Ok(response)
		})
	}
}

pub fn json(status: u16, body: serde_json::Value) -> ApiResponse {
	ApiResponse::new(status, body.to_string())
}

pub fn profile(username: &str, permissions: u64) -> UserProfile {
	UserProfile {
		id: 1,
		username: username.into(),
		first_name: String::new(),
		last_name: String::new(),
		permissions: Permissions::new(permissions),
		is_active: true,
	}
}

/// Backend already holding a session for `alice` with the given tokens.
pub fn seeded_backend(access: &str, refresh: Option<&str>) -> MemoryStore {
	let backend = MemoryStore::default();

	TokenStore::new(Arc::new(backend.clone()))
		.establish(profile("alice", 5), TokenPair::new(access, refresh.map(str::to_owned)))
		.expect("Seeding the backend should succeed.");

	backend
}

pub fn timing(idle_ms: u64, warning_ms: u64) -> SessionConfig {
	SessionConfig::builder()
		.idle_timeout(Duration::from_millis(idle_ms))
		.warning_duration(Duration::from_millis(warning_ms))
		.build()
		.expect("Timing should be valid.")
}

/// Manager restored from `backend`, talking to `transport`.
pub fn manager(
	config: SessionConfig,
	transport: Arc<ScriptedTransport>,
	backend: MemoryStore,
) -> SessionManager {
	SessionManager::open(config, transport, Arc::new(backend))
		.expect("Opening the session should succeed.")
}
