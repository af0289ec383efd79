#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use session_warden::{
	config::SessionConfig,
	error::{ConfigError, Error},
	http::{ApiRequest, ReqwestTransport},
	session::SessionManager,
	store::MemoryStore,
};

async fn mock_login(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/login")
				.json_body(json!({ "username": "alice", "password": "secret" }));
			then.status(200).header("content-type", "application/json").json_body(json!({
				"user": { "id": 1, "username": "alice", "permissions": 5 },
				"token": "t1",
				"refresh_token": "r1",
				"message": "Login successful",
			}));
		})
		.await
}

fn connect(server: &MockServer) -> SessionManager {
	SessionManager::connect(
		SessionConfig::default(),
		server.base_url(),
		Arc::new(MemoryStore::default()),
	)
	.expect("Connecting to the mock server should succeed.")
}

#[tokio::test]
async fn expired_token_is_refreshed_once_for_concurrent_requests() {
	let server = MockServer::start_async().await;
	let login = mock_login(&server).await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/refresh")
				.json_body(json!({ "refresh_token": "r1" }));
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(100))
				.json_body(json!({ "token": "t2", "refresh_token": "r2", "message": "ok" }));
		})
		.await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/clients").header("authorization", "Bearer t1");
			then.status(401).json_body(json!({ "message": "token expired" }));
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/clients").header("authorization", "Bearer t2");
			then.status(200).json_body(json!({ "data": [] }));
		})
		.await;
	let manager = connect(&server);

	manager.login("alice", "secret").await.expect("Alice should log in.");

	let (first, second, third) = tokio::join!(
		manager.send(ApiRequest::get("/api/clients")),
		manager.send(ApiRequest::get("/api/clients")),
		manager.send(ApiRequest::get("/api/clients")),
	);

	for response in [first, second, third] {
		assert_eq!(response.expect("Request should recover after the refresh.").status, 200);
	}

	login.assert_async().await;
	refresh.assert_calls_async(1).await;
	expired.assert_calls_async(3).await;
	fresh.assert_calls_async(3).await;

	assert!(manager.can_access(4));
	assert_eq!(manager.refresh().metrics().attempts(), 1);
}

#[tokio::test]
async fn rejected_refresh_over_http_logs_out() {
	let server = MockServer::start_async().await;

	mock_login(&server).await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(401).json_body(json!({ "message": "Invalid refresh token" }));
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/products");
			then.status(401).body("unauthorized");
		})
		.await;

	let manager = connect(&server);

	manager.login("alice", "secret").await.expect("Alice should log in.");

	let err = manager
		.send(ApiRequest::get("/api/products"))
		.await
		.expect_err("The original 401 should surface.");

	assert!(matches!(err, Error::Status { status: 401, ref message } if message == "unauthorized"));
	refresh.assert_async().await;
	assert!(!manager.is_authenticated());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
	let manager =
		SessionManager::connect(SessionConfig::default(), "http://127.0.0.1:9", Arc::new(MemoryStore::default()))
			.expect("Building the manager should not touch the network.");
	let err = manager.login("alice", "secret").await.expect_err("Login should fail to connect.");

	assert!(matches!(err, Error::Transport(_)));
	assert!(!manager.is_authenticated());
}

#[test]
fn invalid_base_url_fails_fast() {
	let err = ReqwestTransport::new("not a url").expect_err("Base URL should be rejected.");

	assert!(matches!(err, ConfigError::InvalidBaseUrl { ref url, .. } if url == "not a url"));
	assert_eq!(
		ReqwestTransport::new("http://localhost:8080/")
			.expect("Default base URL should parse.")
			.base_url(),
		ReqwestTransport::DEFAULT_BASE_URL,
	);
}
