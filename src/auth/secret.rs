//! Secure token secret wrapper that redacts sensitive material.

// self
use crate::{_prelude::*, auth::TokenClaims};

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Formats the secret as an `Authorization` header value.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.0)
	}

	/// Decodes the embedded claims, if the secret is a JWT.
	pub fn claims(&self) -> Option<TokenClaims> {
		TokenClaims::decode(&self.0)
	}

	/// Returns `true` when the embedded `exp` claim lies at or before `instant`.
	///
	/// Opaque tokens and tokens without an `exp` claim never expire locally; the server
	/// remains the authority and answers `401` once they lapse.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.claims().is_some_and(|claims| claims.is_expired_at(instant))
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Access and refresh secrets that are always replaced together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPair {
	/// Short-lived bearer credential.
	pub access_token: TokenSecret,
	/// Longer-lived credential exchanged for new access tokens.
	pub refresh_token: Option<TokenSecret>,
}
impl TokenPair {
	/// Pairs the two secrets.
	pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: refresh_token.map(TokenSecret::new),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.bearer(), "Bearer super-secret");
	}

	#[test]
	fn opaque_secrets_never_expire_locally() {
		let secret = TokenSecret::new("t1");

		assert!(secret.claims().is_none());
		assert!(!secret.is_expired_at(OffsetDateTime::now_utc()));
	}
}
