//! Transport primitives for authenticated API calls.
//!
//! The module exposes [`Transport`] alongside [`ApiRequest`] and [`ApiResponse`] so
//! applications can plug in any HTTP stack. The refresh coordinator only needs to read and
//! replace the `Authorization` header and to inspect the response status; everything else
//! about a request is opaque to it.

// self
use crate::{
	_prelude::*,
	error::{ConfigError, DecodeError, TransportError},
};

/// Boxed future returned by [`Transport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks able to execute [`ApiRequest`] values.
///
/// Implementations report every HTTP response, successful or not, as `Ok`; only failures
/// that prevent a response from arriving at all are `Err`. Implementations must be
/// `Send + Sync + 'static` so one transport can be shared by concurrent requests.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Sends the request and resolves with the raw response.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// HTTP verbs used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outbound API call.
#[derive(Clone)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Path relative to the API base URL, starting with `/`.
	pub path: String,
	/// Header pairs; names compare case-insensitively.
	pub headers: Vec<(String, String)>,
	/// Optional JSON body.
	pub body: Option<Vec<u8>>,
	retried: bool,
}
impl ApiRequest {
	const AUTHORIZATION: &'static str = "Authorization";

	/// Creates a request without headers or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), headers: Vec::new(), body: None, retried: false }
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Sets (or replaces) a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		let name = name.into();

		self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
		self.headers.push((name, value.into()));

		self
	}

	/// Serializes `body` as the JSON payload.
	pub fn json<T>(self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(body)?;
		let mut request = self.header("Content-Type", "application/json");

		request.body = Some(bytes);

		Ok(request)
	}

	/// Returns a header value by case-insensitive name.
	pub fn header_value(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(existing, _)| existing.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Returns the bearer token carried by the request, if any.
	pub fn bearer(&self) -> Option<&str> {
		self.header_value(Self::AUTHORIZATION)?.strip_prefix("Bearer ")
	}

	/// Returns `true` once the request has been replayed after a refresh.
	pub fn is_retry(&self) -> bool {
		self.retried
	}

	pub(crate) fn with_authorization(self, value: String) -> Self {
		self.header(Self::AUTHORIZATION, value)
	}

	pub(crate) fn into_retry(mut self) -> Self {
		self.retried = true;

		self
	}
}
impl Debug for ApiRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiRequest")
			.field("method", &self.method)
			.field("path", &self.path)
			.field("authorized", &self.header_value(Self::AUTHORIZATION).is_some())
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.field("retried", &self.retried)
			.finish()
	}
}

/// Raw API response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response from its parts.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}

	/// Returns `true` for `2xx` statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Decodes the body, reporting the JSON path of the first mismatch.
	pub fn json<T>(&self, endpoint: &str) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| DecodeError { endpoint: endpoint.to_owned(), source }.into())
	}

	/// Extracts a human-readable failure message.
	///
	/// JSON bodies contribute their `message` or `msg` field; anything else is used verbatim.
	pub fn message(&self) -> String {
		#[derive(Deserialize)]
		struct Envelope {
			message: Option<String>,
			msg: Option<String>,
		}

		let extracted = serde_json::from_slice::<Envelope>(&self.body)
			.ok()
			.and_then(|Envelope { message, msg }| message.or(msg))
			.filter(|text| !text.is_empty());

		if let Some(text) = extracted {
			return text;
		}

		String::from_utf8_lossy(&self.body).trim().to_owned()
	}

	/// Converts a non-success response into [`Error::Status`].
	pub fn into_error(self) -> Error {
		Error::Status { status: self.status, message: self.message() }
	}

	/// Passes successes through and turns every other status into an error.
	pub fn error_for_status(self) -> Result<Self> {
		if self.is_success() { Ok(self) } else { Err(self.into_error()) }
	}
}

/// [`Transport`] backed by [`ReqwestClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	base_url: String,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Base URL used by local development servers.
	pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8080";
	/// Per-request timeout applied by [`ReqwestTransport::new`].
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

	/// Builds a transport with its own client and the default timeout.
	pub fn new(base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(Self::DEFAULT_TIMEOUT).build()?;

		Self::with_client(client, base_url)
	}

	/// Wraps an existing client.
	pub fn with_client(client: ReqwestClient, base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
		let raw = base_url.as_ref();

		Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl {
			url: raw.to_owned(),
			source: Box::new(e),
		})?;

		Ok(Self { client, base_url: raw.trim_end_matches('/').to_owned() })
	}

	/// Returns the normalized base URL.
	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	fn method(method: Method) -> reqwest::Method {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let url = format!("{}{}", self.base_url, request.path);
			let mut builder = self.client.request(Self::method(request.method), url);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, body })
		})
	}
}
