#![cfg(feature = "reqwest")]

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
// self
use session_broker::{
	_preludet::*,
	auth::{Credential, TokenSecret},
	error::Error,
	http::CallRequest,
};

#[tokio::test]
async fn blocked_calls_replay_with_the_renewed_token() {
	let server = MockServer::start_async().await;
	let (coordinator, store, sink) = build_reqwest_test_coordinator(
		test_descriptor(&server.base_url()),
		Some(Credential::new("t1", "r1")),
	);

	for path in ["/a", "/b", "/c"] {
		server
			.mock_async(|when, then| {
				when.method(GET).path(path).header("Authorization", "Bearer t1");
				then.status(401);
			})
			.await;
		server
			.mock_async(|when, then| {
				when.method(GET).path(path).header("Authorization", "Bearer t2");
				then.status(200).body(format!("payload{path}"));
			})
			.await;
	}

	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/renew").body(r#"{"refresh_token":"r1"}"#);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"t2","refresh_token":"r2"}"#)
				.delay(StdDuration::from_millis(500));
		})
		.await;
	let (a, b, c) = tokio::join!(
		coordinator.execute(CallRequest::get("/a")),
		coordinator.execute(CallRequest::get("/b")),
		coordinator.execute(CallRequest::get("/c")),
	);
	let a = a.expect("Call /a should succeed after the transparent renewal.");
	let b = b.expect("Call /b should succeed after the transparent renewal.");
	let c = c.expect("Call /c should succeed after the transparent renewal.");

	renewal.assert_calls_async(1).await;

	assert_eq!(a.body, b"payload/a".to_vec());
	assert_eq!(b.body, b"payload/b".to_vec());
	assert_eq!(c.body, b"payload/c".to_vec());

	let rotated = store.get().await.expect("Store should hold the renewed credential.");

	assert_eq!(rotated.access_token.expose(), "t2");
	assert_eq!(rotated.renewal_token.as_ref().map(TokenSecret::expose), Some("r2"));
	assert!(sink.causes().is_empty());
	assert_eq!(coordinator.renewal_metrics.attempts(), 1);
	assert_eq!(coordinator.renewal_metrics.successes(), 1);
	assert_eq!(coordinator.renewal_metrics.enqueued(), 2);
	assert_eq!(coordinator.renewal_metrics.replayed(), 3);
}

#[tokio::test]
async fn five_concurrent_expired_calls_renew_exactly_once() {
	let server = MockServer::start_async().await;
	let (coordinator, _, _) = build_reqwest_test_coordinator(
		test_descriptor(&server.base_url()),
		Some(Credential::new("t1", "r1")),
	);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/batch").header("Authorization", "Bearer t1");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/batch").header("Authorization", "Bearer t2");
			then.status(200).body("ok");
		})
		.await;

	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/renew");
			then.status(200)
				.body(r#"{"access_token":"t2","refresh_token":"r2"}"#)
				.delay(StdDuration::from_millis(500));
		})
		.await;
	let (a, b, c, d, e) = tokio::join!(
		coordinator.execute(CallRequest::get("/batch")),
		coordinator.execute(CallRequest::get("/batch")),
		coordinator.execute(CallRequest::get("/batch")),
		coordinator.execute(CallRequest::get("/batch")),
		coordinator.execute(CallRequest::get("/batch")),
	);

	for response in [a, b, c, d, e] {
		assert_eq!(
			response.expect("Every concurrent call should succeed after the renewal.").status,
			200,
		);
	}

	renewal.assert_calls_async(1).await;
}

#[tokio::test]
async fn fifty_concurrent_expired_calls_renew_exactly_once() {
	let server = MockServer::start_async().await;
	let (coordinator, _, _) = build_reqwest_test_coordinator(
		test_descriptor(&server.base_url()),
		Some(Credential::new("t1", "r1")),
	);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/bulk").header("Authorization", "Bearer t1");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/bulk").header("Authorization", "Bearer t2");
			then.status(200).body("ok");
		})
		.await;

	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/renew");
			then.status(200)
				.body(r#"{"access_token":"t2","refresh_token":"r2"}"#)
				.delay(StdDuration::from_millis(500));
		})
		.await;
	let handles: Vec<_> = (0..50)
		.map(|_| {
			let coordinator = coordinator.clone();

			tokio::spawn(async move { coordinator.execute(CallRequest::get("/bulk")).await })
		})
		.collect();

	for handle in handles {
		let response = handle
			.await
			.expect("Spawned call task should not panic.")
			.expect("Every concurrent call should succeed after the single renewal.");

		assert_eq!(response.status, 200);
	}

	renewal.assert_calls_async(1).await;

	assert_eq!(coordinator.renewal_metrics.attempts(), 1);
}

#[tokio::test]
async fn renewal_without_rotation_keeps_the_previous_renewal_token() {
	let server = MockServer::start_async().await;
	let (coordinator, store, _) = build_reqwest_test_coordinator(
		test_descriptor(&server.base_url()),
		Some(Credential::new("t1", "r1")),
	);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("Authorization", "Bearer t1");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("Authorization", "Bearer t2");
			then.status(200).body("{}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/renew");
			then.status(200).body(r#"{"access_token":"t2"}"#);
		})
		.await;

	coordinator
		.execute(CallRequest::get("/profile"))
		.await
		.expect("Call should succeed after renewal without rotation.");

	let current = store.get().await.expect("Store should hold the renewed credential.");

	assert_eq!(current.access_token.expose(), "t2");
	assert_eq!(current.renewal_token.as_ref().map(TokenSecret::expose), Some("r1"));
}

#[tokio::test]
async fn a_second_expiry_after_replay_fails_without_another_renewal() {
	let server = MockServer::start_async().await;
	let (coordinator, store, sink) = build_reqwest_test_coordinator(
		test_descriptor(&server.base_url()),
		Some(Credential::new("t1", "r1")),
	);

	// The destination rejects every credential, renewed or not.
	server
		.mock_async(|when, then| {
			when.method(GET).path("/locked");
			then.status(401);
		})
		.await;

	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/renew");
			then.status(200).body(r#"{"access_token":"t2","refresh_token":"r2"}"#);
		})
		.await;
	let err = coordinator
		.execute(CallRequest::get("/locked"))
		.await
		.expect_err("A replay rejected again should fail outright.");

	assert!(matches!(err, Error::ReplayRejected { status: 401 }));

	renewal.assert_calls_async(1).await;

	// The renewal itself succeeded, so the session survives with the fresh credential.
	let current = store.get().await.expect("Renewed credential should remain stored.");

	assert_eq!(current.access_token.expose(), "t2");
	assert!(sink.causes().is_empty());
}
