//! Bearer attachment and single-flight token refresh with request replay.
//!
//! [`RefreshCoordinator::send`] decorates every pass-through request. When one comes back
//! `401`, the first caller becomes the refresh leader; every caller that fails while that
//! refresh is outstanding parks on a oneshot channel. The leader stores the new pair, wakes
//! the parked callers with the new access token, and then replays its own request. Each
//! request is replayed at most once.

pub mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	api::{RefreshRequest, RefreshResponse},
	auth::TokenSecret,
	error::UNAUTHENTICATED,
	http::{ApiRequest, ApiResponse, Transport},
	obs::{self, OpKind, OpSpan},
	session::state::TokenStore,
};

/// Reaction to refreshes that change whether the session is usable.
pub trait SessionExpiryHandler
where
	Self: Send + Sync,
{
	/// The stored credentials are unusable and the session must end.
	fn session_expired(&self);

	/// A refresh brought back a session whose access token had lapsed.
	fn session_resumed(&self) {}
}

/// Expiry handler that only drops the stored tokens.
#[derive(Debug)]
pub struct ClearTokens(pub Arc<TokenStore>);
impl SessionExpiryHandler for ClearTokens {
	fn session_expired(&self) {
		self.0.take();

		if let Err(e) = self.0.purge() {
			obs::record_storage_failure(&e);
		}
	}
}

/// Serializes token refreshes and replays requests that failed with `401`.
#[derive(Clone)]
pub struct RefreshCoordinator {
	inner: Arc<CoordinatorInner>,
}
impl RefreshCoordinator {
	/// Wires the coordinator to a transport, the shared token store, and the expiry path.
	pub fn new(
		transport: Arc<dyn Transport>,
		tokens: Arc<TokenStore>,
		expiry: Arc<dyn SessionExpiryHandler>,
	) -> Self {
		Self {
			inner: Arc::new(CoordinatorInner {
				transport,
				tokens,
				expiry,
				state: Mutex::new(RefreshState::default()),
				metrics: Arc::new(RefreshMetrics::default()),
			}),
		}
	}

	/// Adds the stored access token as a bearer credential when it is present and unexpired.
	pub fn attach_auth(&self, request: ApiRequest) -> ApiRequest {
		match self.inner.tokens.valid_access_token() {
			Some(token) => request.with_authorization(token.bearer()),
			None => request,
		}
	}

	/// Sends `request` with credentials, recovering once from an expired access token.
	///
	/// Non-success responses come back as [`Error::Status`]. After a failed refresh the caller
	/// receives the original `401`, never the refresh error.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		let request = self.attach_auth(request);
		let response = self.inner.transport.execute(request.clone()).await?;

		if response.status != UNAUTHENTICATED || request.is_retry() {
			return response.error_for_status();
		}

		self.handle_failure(request, response.into_error()).await
	}

	/// Recovers a request that failed with `failure`.
	///
	/// Requests already replayed once, and failures other than `401`, are returned as-is.
	pub async fn handle_failure(&self, request: ApiRequest, failure: Error) -> Result<ApiResponse> {
		if request.is_retry() || !failure.is_unauthenticated() {
			return Err(failure);
		}

		match self.begin(request.bearer()) {
			Role::Stale(token) => self.replay(request, &token).await,
			Role::Follower(waiter) => match waiter.await {
				Ok(Settled::Refreshed(token)) => self.replay(request, &token).await,
				_ => Err(failure),
			},
			Role::Leader(guard) => match self.run_refresh().await {
				Ok(token) => {
					guard.settle(Settled::Refreshed(token.clone()));

					self.replay(request, &token).await
				},
				Err(e) => {
					guard.settle(Settled::Failed);
					self.expire(&e);

					Err(failure)
				},
			},
		}
	}

	/// Refreshes now, or joins the refresh already in flight.
	///
	/// A failed refresh ends the session the same way a failed replay does.
	pub async fn refresh(&self) -> Result<TokenSecret> {
		match self.begin_refresh() {
			Role::Stale(token) => Ok(token),
			Role::Follower(waiter) => match waiter.await {
				Ok(Settled::Refreshed(token)) => Ok(token),
				Ok(Settled::Failed) => Err(Error::RefreshRejected {
					reason: "Concurrent refresh failed".into(),
				}),
				Ok(Settled::Aborted) | Err(_) => Err(Error::RefreshAborted),
			},
			Role::Leader(guard) => match self.run_refresh().await {
				Ok(token) => {
					guard.settle(Settled::Refreshed(token.clone()));

					Ok(token)
				},
				Err(e) => {
					guard.settle(Settled::Failed);
					self.expire(&e);

					Err(e)
				},
			},
		}
	}

	/// Returns `true` while a refresh call is outstanding.
	pub fn is_refreshing(&self) -> bool {
		self.inner.state.lock().refreshing
	}

	/// Number of callers parked behind the current refresh.
	pub fn queued(&self) -> usize {
		self.inner.state.lock().waiters.len()
	}

	/// Counters accumulated by this coordinator.
	pub fn metrics(&self) -> Arc<RefreshMetrics> {
		self.inner.metrics.clone()
	}

	/// Decides this caller's role; the check and the flip share one critical section.
	fn begin(&self, sent_with: Option<&str>) -> Role<'_> {
		let mut state = self.inner.state.lock();

		if state.refreshing {
			return self.enqueue(&mut state);
		}

		// A refresh finished after this request left; the current token is already newer.
		let current = self.inner.tokens.valid_access_token();

		if let Some(current) = current.filter(|current| sent_with != Some(current.expose())) {
			return Role::Stale(current);
		}

		state.refreshing = true;

		Role::Leader(RefreshGuard { inner: &self.inner, settled: false })
	}

	fn begin_refresh(&self) -> Role<'_> {
		let mut state = self.inner.state.lock();

		if state.refreshing {
			return self.enqueue(&mut state);
		}

		state.refreshing = true;

		Role::Leader(RefreshGuard { inner: &self.inner, settled: false })
	}

	fn enqueue(&self, state: &mut RefreshState) -> Role<'_> {
		let (sender, receiver) = oneshot::channel();

		state.waiters.push(sender);
		self.inner.metrics.record_queued();

		Role::Follower(receiver)
	}

	async fn run_refresh(&self) -> Result<TokenSecret> {
		OpSpan::new(OpKind::Refresh)
			.instrument(async {
				let result = self.exchange().await;

				match &result {
					Ok(_) => self.inner.metrics.record_success(),
					Err(_) => self.inner.metrics.record_failure(),
				}

				result
			})
			.await
	}

	async fn exchange(&self) -> Result<TokenSecret> {
		let grant = self.inner.tokens.refresh_grant().ok_or(Error::MissingRefreshToken)?;
		let request = RefreshRequest { refresh_token: grant.refresh_token.expose() }.to_request()?;

		self.inner.metrics.record_attempt();

		let response = self.inner.transport.execute(request).await?;
		let pair = RefreshResponse::parse(response)?.into_pair(grant.refresh_token.expose())?;
		let access_token = pair.access_token.clone();
		let revived = self.inner.tokens.replace_tokens(grant.epoch, pair)?;

		obs::record_transition("refresh", "tokens_replaced");

		if revived {
			self.inner.expiry.session_resumed();
		}

		Ok(access_token)
	}

	fn expire(&self, error: &Error) {
		obs::record_refresh_failure(error);

		// Whatever ended or replaced the session already owns its teardown.
		if !matches!(error, Error::SessionEnded) {
			self.inner.expiry.session_expired();
		}
	}

	async fn replay(&self, request: ApiRequest, token: &TokenSecret) -> Result<ApiResponse> {
		let request = request.with_authorization(token.bearer()).into_retry();

		self.inner.transport.execute(request).await?.error_for_status()
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.inner.state.lock();

		f.debug_struct("RefreshCoordinator")
			.field("refreshing", &state.refreshing)
			.field("queued", &state.waiters.len())
			.field("metrics", &self.inner.metrics)
			.finish()
	}
}

struct CoordinatorInner {
	transport: Arc<dyn Transport>,
	tokens: Arc<TokenStore>,
	expiry: Arc<dyn SessionExpiryHandler>,
	state: Mutex<RefreshState>,
	metrics: Arc<RefreshMetrics>,
}

#[derive(Default)]
struct RefreshState {
	refreshing: bool,
	waiters: Vec<oneshot::Sender<Settled>>,
}

#[derive(Clone, Debug)]
enum Settled {
	Refreshed(TokenSecret),
	Failed,
	Aborted,
}

enum Role<'a> {
	Leader(RefreshGuard<'a>),
	Follower(oneshot::Receiver<Settled>),
	Stale(TokenSecret),
}

/// Clears the in-flight flag and wakes every waiter exactly once, even if the leader's
/// future is dropped mid-refresh.
struct RefreshGuard<'a> {
	inner: &'a CoordinatorInner,
	settled: bool,
}
impl RefreshGuard<'_> {
	fn settle(mut self, outcome: Settled) {
		self.settled = true;
		self.release(outcome);
	}

	fn release(&self, outcome: Settled) {
		let waiters = {
			let mut state = self.inner.state.lock();

			state.refreshing = false;

			std::mem::take(&mut state.waiters)
		};

		for waiter in waiters {
			let _ = waiter.send(outcome.clone());
		}
	}
}
impl Drop for RefreshGuard<'_> {
	fn drop(&mut self) {
		if !self.settled {
			self.release(Settled::Aborted);
		}
	}
}
