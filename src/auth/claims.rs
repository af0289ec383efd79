//! Unverified JWT claim decoding.
//!
//! The client never holds the signing key, so signatures are not checked here. Claims are
//! only used to decide locally whether an access token is still worth attaching; the
//! server stays the source of truth and rejects forged or lapsed tokens with `401`.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, auth::Permissions};

/// Claims embedded in access and refresh tokens issued by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
	/// Numeric user identifier.
	#[serde(default)]
	pub user_id: Option<i64>,
	/// Login name.
	#[serde(default)]
	pub username: Option<String>,
	/// Permission bitmask at issuance time.
	#[serde(default)]
	pub permissions: Option<Permissions>,
	/// Expiry as Unix seconds.
	#[serde(default)]
	pub exp: Option<i64>,
	/// Issued-at as Unix seconds.
	#[serde(default)]
	pub iat: Option<i64>,
	/// Issuer label.
	#[serde(default)]
	pub iss: Option<String>,
}
impl TokenClaims {
	/// Decodes the payload segment of a compact JWT.
	///
	/// Returns `None` for opaque tokens or payloads that are not JSON objects.
	pub fn decode(token: &str) -> Option<Self> {
		let mut segments = token.split('.');
		let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);

		if segments.next().is_some() {
			return None;
		}

		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;

		serde_json::from_slice(&bytes).ok()
	}

	/// Returns the expiry instant, when the token carries one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.exp.and_then(|exp| OffsetDateTime::from_unix_timestamp(exp).ok())
	}

	/// Returns `true` once `instant` reaches the expiry claim.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|expires_at| instant >= expires_at)
	}
}
