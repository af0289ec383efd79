//! Wire contracts for the authentication endpoints.
//!
//! Only `/api/auth/login` and `/api/auth/refresh` are understood by the session core. Every
//! other endpoint is an opaque [`ApiRequest`] decorated by the refresh coordinator.

// self
use crate::{
	_prelude::*,
	auth::{TokenPair, UserProfile},
	http::{ApiRequest, ApiResponse},
};

/// Login endpoint path.
pub const LOGIN_PATH: &str = "/api/auth/login";
/// Refresh endpoint path.
pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Username/password pair submitted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
	/// Login name.
	pub username: String,
	/// Plain-text password; never logged.
	pub password: String,
}
impl Credentials {
	/// Creates a credential pair.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: password.into() }
	}

	/// Builds the login request, rejecting blank fields before any network call.
	pub fn to_request(&self) -> Result<ApiRequest> {
		if self.username.trim().is_empty() {
			return Err(Error::LoginRejected { reason: "Username is required".into() });
		}
		if self.password.is_empty() {
			return Err(Error::LoginRejected { reason: "Password is required".into() });
		}

		Ok(ApiRequest::post(LOGIN_PATH).json(self)?)
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Body returned by the login endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
	/// Authenticated profile; absent when the login was refused.
	#[serde(default)]
	pub user: Option<UserProfile>,
	/// Access token.
	#[serde(default)]
	pub token: Option<String>,
	/// Refresh token.
	#[serde(default)]
	pub refresh_token: Option<String>,
	/// Server message.
	#[serde(default)]
	pub message: Option<String>,
}
impl LoginResponse {
	/// Parses a raw login response, mapping non-success statuses to [`Error::Status`].
	pub fn parse(response: ApiResponse) -> Result<Self> {
		response.error_for_status()?.json(LOGIN_PATH)
	}

	/// Splits the response into a profile and token pair, or explains why it cannot.
	pub fn into_grant(self) -> Result<(UserProfile, TokenPair)> {
		let reason = || self.message.clone().unwrap_or_else(|| "Login failed".into());
		let user = self.user.clone().ok_or_else(|| Error::LoginRejected { reason: reason() })?;
		let token = self
			.token
			.clone()
			.filter(|token| !token.is_empty())
			.ok_or_else(|| Error::LoginRejected { reason: reason() })?;
		let refresh = self.refresh_token.filter(|token| !token.is_empty());

		Ok((user, TokenPair::new(token, refresh)))
	}
}

/// Body submitted to the refresh endpoint.
#[derive(Clone, Serialize)]
pub struct RefreshRequest<'a> {
	/// Stored refresh token.
	pub refresh_token: &'a str,
}
impl RefreshRequest<'_> {
	/// Builds the refresh request.
	pub fn to_request(&self) -> Result<ApiRequest> {
		Ok(ApiRequest::post(REFRESH_PATH).json(self)?)
	}
}

/// Body returned by the refresh endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct RefreshResponse {
	/// New access token.
	#[serde(default)]
	pub token: Option<String>,
	/// Rotated refresh token, when the server rotates.
	#[serde(default)]
	pub refresh_token: Option<String>,
	/// Server message.
	#[serde(default)]
	pub message: Option<String>,
}
impl RefreshResponse {
	/// Parses a raw refresh response; every non-success status is a rejection.
	pub fn parse(response: ApiResponse) -> Result<Self> {
		if !response.is_success() {
			return Err(Error::RefreshRejected { reason: response.message() });
		}

		response.json(REFRESH_PATH)
	}

	/// Produces the replacement pair, keeping `previous_refresh` when the server did not rotate.
	pub fn into_pair(self, previous_refresh: &str) -> Result<TokenPair> {
		let token = self.token.filter(|token| !token.is_empty()).ok_or_else(|| {
			Error::RefreshRejected {
				reason: self.message.unwrap_or_else(|| "Response carried no token".into()),
			}
		})?;
		let refresh = self
			.refresh_token
			.filter(|token| !token.is_empty())
			.unwrap_or_else(|| previous_refresh.to_owned());

		Ok(TokenPair::new(token, Some(refresh)))
	}
}
