//! Process-wide token store: the in-memory session snapshot and its persisted mirror.

// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret, UserProfile},
	store::{SessionStore, StoreError, StoreKey},
};

/// Authenticated identity: both tokens plus the cached profile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	user: Option<UserProfile>,
}
impl Session {
	/// Stored access token, expired or not.
	pub fn access_token(&self) -> Option<&TokenSecret> {
		self.access_token.as_ref()
	}

	/// Stored refresh token.
	pub fn refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref()
	}

	/// Access token, provided its embedded claims have not expired at `instant`.
	pub fn valid_access_token_at(&self, instant: OffsetDateTime) -> Option<&TokenSecret> {
		self.access_token.as_ref().filter(|token| !token.is_expired_at(instant))
	}

	/// Profile, reported only while a non-expired access token backs it.
	pub fn user_at(&self, instant: OffsetDateTime) -> Option<&UserProfile> {
		self.valid_access_token_at(instant).and(self.user.as_ref())
	}

	/// [`Session::user_at`] evaluated against the current clock.
	pub fn user(&self) -> Option<&UserProfile> {
		self.user_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` when none of the three fields is present.
	pub fn is_empty(&self) -> bool {
		self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
	}
}

/// Refresh token together with the session generation it was read from.
#[derive(Clone, Debug)]
pub struct RefreshGrant {
	/// Credential to exchange.
	pub refresh_token: TokenSecret,
	/// Generation the credential belongs to; see [`TokenStore::epoch`].
	pub epoch: u64,
}

/// Holder of the current [`Session`], mirrored to a [`SessionStore`].
///
/// Every mutation persists first and swaps the in-memory snapshot under the same write lock,
/// so readers observe either the old or the new session in full.
pub struct TokenStore {
	backend: Arc<dyn SessionStore>,
	slot: RwLock<Slot>,
}
impl TokenStore {
	/// Creates an empty store over `backend` without reading it.
	pub fn new(backend: Arc<dyn SessionStore>) -> Self {
		Self { backend, slot: RwLock::new(Slot::default()) }
	}

	/// Loads whatever session `backend` holds.
	///
	/// An unreadable cached profile is dropped instead of failing the restore; the tokens
	/// alone are still enough to refresh.
	pub fn restore(backend: Arc<dyn SessionStore>) -> Result<Self, StoreError> {
		let access_token = backend.load(StoreKey::AccessToken)?.map(TokenSecret::new);
		let refresh_token = backend.load(StoreKey::RefreshToken)?.map(TokenSecret::new);
		let user = backend
			.load(StoreKey::User)?
			.and_then(|raw| serde_json::from_str::<UserProfile>(&raw).ok());
		let session = Session { access_token, refresh_token, user };

		Ok(Self { backend, slot: RwLock::new(Slot { session, epoch: 0 }) })
	}

	/// Copy of the current session.
	pub fn snapshot(&self) -> Session {
		self.slot.read().session.clone()
	}

	/// Session generation. Bumped by every login and every logout.
	pub fn epoch(&self) -> u64 {
		self.slot.read().epoch
	}

	/// Access token that may still be attached to requests.
	pub fn valid_access_token(&self) -> Option<TokenSecret> {
		self.slot.read().session.valid_access_token_at(OffsetDateTime::now_utc()).cloned()
	}

	/// Stored access token regardless of its claims.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.slot.read().session.access_token.clone()
	}

	/// Stored refresh token.
	pub fn refresh_token(&self) -> Option<TokenSecret> {
		self.slot.read().session.refresh_token.clone()
	}

	/// Stored refresh token and the generation it belongs to, read together.
	pub fn refresh_grant(&self) -> Option<RefreshGrant> {
		let slot = self.slot.read();

		slot.session
			.refresh_token
			.clone()
			.map(|refresh_token| RefreshGrant { refresh_token, epoch: slot.epoch })
	}

	/// Current profile, subject to the access token still being valid.
	pub fn user(&self) -> Option<UserProfile> {
		self.slot.read().session.user().cloned()
	}

	/// Replaces the whole session after a successful login and starts a new generation.
	pub fn establish(&self, user: UserProfile, tokens: TokenPair) -> Result<()> {
		let profile = serde_json::to_string(&user).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize user profile: {e}"),
		})?;
		let mut entries = vec![
			(StoreKey::AccessToken, tokens.access_token.expose().to_owned()),
			(StoreKey::User, profile),
		];

		if let Some(refresh) = &tokens.refresh_token {
			entries.push((StoreKey::RefreshToken, refresh.expose().to_owned()));
		}

		let mut slot = self.slot.write();

		self.backend.save(&entries)?;

		if tokens.refresh_token.is_none() {
			self.backend.remove(&[StoreKey::RefreshToken])?;
		}

		slot.session = Session {
			access_token: Some(tokens.access_token),
			refresh_token: tokens.refresh_token,
			user: Some(user),
		};
		slot.bump();

		Ok(())
	}

	/// Swaps both tokens in one step after a successful refresh.
	///
	/// `epoch` must be the generation the refresh token was read from; once the session has
	/// been ended or replaced, the pair is discarded with [`Error::SessionEnded`]. A pair
	/// without a refresh token keeps the stored one.
	///
	/// Returns `true` when the swap revived a session whose access token had lapsed.
	pub fn replace_tokens(&self, epoch: u64, tokens: TokenPair) -> Result<bool> {
		let mut slot = self.slot.write();

		if slot.epoch != epoch || slot.session.is_empty() {
			return Err(Error::SessionEnded);
		}

		let now = OffsetDateTime::now_utc();
		let lapsed = slot.session.user_at(now).is_none();
		let refresh_token = tokens.refresh_token.or_else(|| slot.session.refresh_token.clone());
		let mut entries = vec![(StoreKey::AccessToken, tokens.access_token.expose().to_owned())];

		if let Some(refresh) = &refresh_token {
			entries.push((StoreKey::RefreshToken, refresh.expose().to_owned()));
		}

		self.backend.save(&entries)?;
		slot.session.access_token = Some(tokens.access_token);
		slot.session.refresh_token = refresh_token;

		Ok(lapsed && slot.session.user_at(now).is_some())
	}

	/// Empties the in-memory session, returning it when one existed.
	///
	/// Exactly one of several concurrent callers receives `Some`. Refreshes that started
	/// before this call can no longer store their result.
	pub fn take(&self) -> Option<Session> {
		let mut slot = self.slot.write();
		let previous = std::mem::take(&mut slot.session);

		slot.bump();

		(!previous.is_empty()).then_some(previous)
	}

	/// Removes all three persisted keys.
	pub fn purge(&self) -> Result<(), StoreError> {
		self.backend.remove(&StoreKey::ALL)
	}

	/// Drops all three fields together, in memory first and then in the backend.
	///
	/// Returns whether a session existed.
	pub fn clear(&self) -> Result<bool> {
		let existed = self.take().is_some();

		self.purge()?;

		Ok(existed)
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let slot = self.slot.read();

		f.debug_struct("TokenStore")
			.field("session", &slot.session)
			.field("epoch", &slot.epoch)
			.finish()
	}
}

#[derive(Default)]
struct Slot {
	session: Session,
	epoch: u64,
}
impl Slot {
	fn bump(&mut self) {
		self.epoch = self.epoch.wrapping_add(1);
	}
}
