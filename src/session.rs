//! Session orchestration: login, logout, permission checks, and the single end-of-session
//! path shared by the idle countdown and the refresh coordinator.

pub mod events;
pub mod state;

pub use events::{SessionEvent, SessionEvents};
pub use state::{Session, TokenStore};

// crates.io
use tokio::sync::broadcast;
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	api::{Credentials, LoginResponse},
	auth::{RoleLabel, UserProfile},
	config::SessionConfig,
	http::{ApiRequest, ApiResponse, Transport},
	idle::{ActivitySignal, ActivitySource, LogoutCause, Phase, WarningController, WarningHandler},
	obs::{self, OpKind, OpSpan},
	refresh::{RefreshCoordinator, SessionExpiryHandler},
	store::SessionStore,
};

/// Why a session ended. Recorded in logs and metrics only; subscribers never see it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndReason {
	/// Explicit logout.
	UserLogout,
	/// The warning countdown reached zero.
	IdleTimeout,
	/// The refresh token was missing or rejected.
	RefreshFailed,
}
impl EndReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			EndReason::UserLogout => "user_logout",
			EndReason::IdleTimeout => "idle_timeout",
			EndReason::RefreshFailed => "refresh_failed",
		}
	}
}
impl Display for EndReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Client-side session lifecycle manager.
///
/// Owns the token store, the refresh coordinator, and the warning controller, and routes
/// every termination through one idempotent logout that publishes [`SessionEvent::Ended`]
/// exactly once per session.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SessionManager {
	inner: Arc<SessionInner>,
}
impl SessionManager {
	/// Builds a manager and restores whatever session `backend` holds.
	///
	/// A restored, still-valid session starts the idle clock immediately, which requires a
	/// Tokio runtime.
	pub fn open(
		config: SessionConfig,
		transport: Arc<dyn Transport>,
		backend: Arc<dyn SessionStore>,
	) -> Result<Self> {
		let tokens = Arc::new(TokenStore::restore(backend)?);
		let inner = Arc::new_cyclic(|weak: &Weak<SessionInner>| {
			let hooks = Arc::new(SessionHooks(weak.clone()));

			SessionInner {
				refresh: RefreshCoordinator::new(transport.clone(), tokens.clone(), hooks.clone()),
				warning: WarningController::new(&config, hooks),
				transport,
				tokens,
				config,
				events: SessionEvents::new(),
			}
		});
		let manager = Self { inner };

		if manager.is_authenticated() {
			manager.inner.warning.start();
			obs::record_transition("session", OpKind::Restore.as_str());
		} else {
			manager.inner.warning.stop();
		}

		Ok(manager)
	}

	/// [`SessionManager::open`] over a [`ReqwestTransport`] for `base_url`.
	#[cfg(feature = "reqwest")]
	pub fn connect(
		config: SessionConfig,
		base_url: impl AsRef<str>,
		backend: Arc<dyn SessionStore>,
	) -> Result<Self> {
		let transport = ReqwestTransport::new(base_url)?;

		Self::open(config, Arc::new(transport), backend)
	}

	/// Exchanges credentials for a session and starts the idle clock.
	///
	/// On any failure the stored session is left untouched.
	pub async fn login(
		&self,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Result<UserProfile> {
		let credentials = Credentials::new(username, password);

		OpSpan::new(OpKind::Login)
			.instrument(async move {
				let request = credentials.to_request()?;
				let response = self.inner.transport.execute(request).await?;
				let (user, tokens) = LoginResponse::parse(response)?.into_grant()?;

				self.inner.tokens.establish(user.clone(), tokens)?;
				self.inner.warning.start();
				obs::record_transition("session", "started");
				self.inner.events.emit(SessionEvent::Started);

				Ok(user)
			})
			.await
	}

	/// Ends the session. Calling it without a session is a no-op.
	///
	/// Returns whether a session was actually ended.
	pub fn logout(&self) -> bool {
		self.end(EndReason::UserLogout)
	}

	/// Sends an API request with bearer credentials and transparent `401` recovery.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		OpSpan::new(OpKind::Send).instrument(self.inner.refresh.send(request)).await
	}

	/// Returns `true` while a profile backed by an unexpired access token is stored.
	pub fn is_authenticated(&self) -> bool {
		self.inner.tokens.user().is_some()
	}

	/// Current profile.
	pub fn user(&self) -> Option<UserProfile> {
		self.inner.tokens.user()
	}

	/// Copy of the stored session.
	pub fn session(&self) -> Session {
		self.inner.tokens.snapshot()
	}

	/// Checks one permission bit against the current user; `false` without a user.
	pub fn can_access(&self, permission: u64) -> bool {
		self.user().is_some_and(|user| user.can_access(permission))
	}

	/// Returns `true` when the current user holds at least one of `permissions`.
	pub fn can_access_any(&self, permissions: impl IntoIterator<Item = u64>) -> bool {
		self.user().is_some_and(|user| user.permissions.contains_any(permissions))
	}

	/// Returns `true` when the current user holds every one of `permissions`.
	pub fn can_access_all(&self, permissions: impl IntoIterator<Item = u64>) -> bool {
		self.user().is_some_and(|user| user.permissions.contains_all(permissions))
	}

	/// Display-only role label of the current user.
	pub fn role_label(&self) -> Option<RoleLabel> {
		self.user().map(|user| user.role_label())
	}

	/// Feeds an activity signal to the idle clock.
	pub fn record_activity(&self, signal: ActivitySignal) -> bool {
		self.inner.warning.record_activity(signal)
	}

	/// Subscribes the idle clock to an application activity source.
	pub fn listen(&self, source: &ActivitySource) -> bool {
		self.inner.warning.listen(source)
	}

	/// Dismisses the warning and grants a full idle window.
	pub fn stay_active(&self) -> bool {
		self.inner.warning.stay_active()
	}

	/// Logs out immediately from the warning dialog.
	pub fn force_logout(&self) -> bool {
		self.inner.warning.force_logout()
	}

	/// Current warning phase.
	pub fn phase(&self) -> Phase {
		self.inner.warning.phase()
	}

	/// Subscribes to lifecycle events.
	pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
		self.inner.events.subscribe()
	}

	/// Validated configuration.
	pub fn config(&self) -> &SessionConfig {
		&self.inner.config
	}

	/// Shared token store.
	pub fn tokens(&self) -> &Arc<TokenStore> {
		&self.inner.tokens
	}

	/// Refresh coordinator used by [`SessionManager::send`].
	pub fn refresh(&self) -> &RefreshCoordinator {
		&self.inner.refresh
	}

	/// Warning controller driving the idle clock.
	pub fn warning(&self) -> &WarningController {
		&self.inner.warning
	}

	/// Stops every timer and releases activity listeners. The stored session is kept.
	pub fn dispose(&self) {
		self.inner.warning.dispose();
	}

	/// Restarts the idle clock for a session a refresh brought back to life.
	fn resume(&self) {
		if !self.is_authenticated() || self.phase() != Phase::LoggedOut {
			return;
		}

		self.inner.warning.start();
		obs::record_transition("session", "resumed");
		self.inner.events.emit(SessionEvent::Started);
	}

	fn end(&self, reason: EndReason) -> bool {
		OpSpan::new(OpKind::Logout).in_scope(|| {
			self.inner.warning.stop();

			let ended = self.inner.tokens.take().is_some();

			if let Err(e) = self.inner.tokens.purge() {
				obs::record_storage_failure(&e);
			}
			if !ended {
				return false;
			}

			obs::record_session_ended(reason);
			obs::record_session_end(reason);
			self.inner.events.emit(SessionEvent::Ended);
			self.inner.events.emit(SessionEvent::EndAcknowledged);

			true
		})
	}
}
impl Debug for SessionManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionManager")
			.field("config", &self.inner.config)
			.field("tokens", &self.inner.tokens)
			.field("refresh", &self.inner.refresh)
			.field("warning", &self.inner.warning)
			.finish()
	}
}

struct SessionInner {
	refresh: RefreshCoordinator,
	warning: WarningController,
	transport: Arc<dyn Transport>,
	tokens: Arc<TokenStore>,
	config: SessionConfig,
	events: SessionEvents,
}

struct SessionHooks(Weak<SessionInner>);
impl SessionHooks {
	fn manager(&self) -> Option<SessionManager> {
		self.0.upgrade().map(|inner| SessionManager { inner })
	}

	fn emit(&self, event: SessionEvent) {
		if let Some(inner) = self.0.upgrade() {
			inner.events.emit(event);
		}
	}
}
impl WarningHandler for SessionHooks {
	fn on_warning(&self, remaining: Duration) {
		self.emit(SessionEvent::WarningStarted { remaining });
	}

	fn on_tick(&self, remaining: Duration) {
		self.emit(SessionEvent::WarningTick { remaining });
	}

	fn on_cleared(&self) {
		self.emit(SessionEvent::WarningCleared);
	}

	fn on_logout(&self, cause: LogoutCause) {
		let reason = match cause {
			LogoutCause::Expired => EndReason::IdleTimeout,
			LogoutCause::Forced => EndReason::UserLogout,
		};

		if let Some(manager) = self.manager() {
			manager.end(reason);
		}
	}
}
impl SessionExpiryHandler for SessionHooks {
	fn session_expired(&self) {
		if let Some(manager) = self.manager() {
			manager.end(EndReason::RefreshFailed);
		}
	}

	fn session_resumed(&self) {
		if let Some(manager) = self.manager() {
			manager.resume();
		}
	}
}
