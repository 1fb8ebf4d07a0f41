#![cfg(feature = "reqwest")]

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
// self
use session_broker::{
	_preludet::*,
	auth::Credential,
	error::{Error, TerminationCause},
	http::CallRequest,
};

fn termination_cause(err: Error) -> TerminationCause {
	match err {
		Error::SessionTerminated { cause } => cause,
		other => panic!("Expected a terminated session, got: {other:?}"),
	}
}

#[tokio::test]
async fn failed_renewal_rejects_every_blocked_call_with_one_cause() {
	let server = MockServer::start_async().await;
	let (coordinator, store, sink) = build_reqwest_test_coordinator(
		test_descriptor(&server.base_url()),
		Some(Credential::new("t1", "r1")),
	);

	for path in ["/a", "/b", "/c"] {
		server
			.mock_async(|when, then| {
				when.method(GET).path(path);
				then.status(401);
			})
			.await;
	}

	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/renew");
			then.status(500)
				.body(r#"{"error":"renewal backend down"}"#)
				.delay(StdDuration::from_millis(500));
		})
		.await;
	let (a, b, c) = tokio::join!(
		coordinator.execute(CallRequest::get("/a")),
		coordinator.execute(CallRequest::get("/b")),
		coordinator.execute(CallRequest::get("/c")),
	);
	let causes = [
		termination_cause(a.expect_err("Call /a should reject when renewal fails.")),
		termination_cause(b.expect_err("Call /b should reject when renewal fails.")),
		termination_cause(c.expect_err("Call /c should reject when renewal fails.")),
	];

	renewal.assert_calls_async(1).await;

	for cause in &causes {
		assert_eq!(*cause, TerminationCause::RenewalRejected { status: 500 });
	}

	assert!(store.get().await.is_none());
	assert_eq!(sink.causes(), vec![TerminationCause::RenewalRejected { status: 500 }]);
	assert_eq!(coordinator.renewal_metrics.failures(), 1);
	assert_eq!(coordinator.renewal_metrics.replayed(), 0);
}

#[tokio::test]
async fn renewal_timeout_terminates_the_session() {
	let server = MockServer::start_async().await;
	let descriptor = session_broker::session::SessionDescriptor::builder(
		Url::parse(&server.base_url()).expect("Mock base URL should parse successfully."),
	)
	.renewal_path("/auth/renew")
	.renewal_timeout(Duration::milliseconds(200))
	.build()
	.expect("Descriptor with a short renewal timeout should build successfully.");
	let (coordinator, store, sink) =
		build_reqwest_test_coordinator(descriptor, Some(Credential::new("t1", "r1")));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/slow");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/renew");
			then.status(200)
				.body(r#"{"access_token":"t2"}"#)
				.delay(StdDuration::from_secs(5));
		})
		.await;

	let cause = termination_cause(
		coordinator
			.execute(CallRequest::get("/slow"))
			.await
			.expect_err("A timed-out renewal should terminate the session."),
	);

	assert_eq!(cause, TerminationCause::RenewalTimedOut);
	assert!(store.get().await.is_none());
	assert_eq!(sink.causes(), vec![TerminationCause::RenewalTimedOut]);
}

#[tokio::test]
async fn malformed_renewal_response_terminates_the_session() {
	let server = MockServer::start_async().await;
	let (coordinator, store, sink) = build_reqwest_test_coordinator(
		test_descriptor(&server.base_url()),
		Some(Credential::new("t1", "r1")),
	);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/a");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/renew");
			then.status(200).body("surprise! not json");
		})
		.await;

	let cause = termination_cause(
		coordinator
			.execute(CallRequest::get("/a"))
			.await
			.expect_err("An uninterpretable renewal response should terminate the session."),
	);

	assert!(matches!(cause, TerminationCause::MalformedRenewalResponse { .. }));
	assert!(store.get().await.is_none());
	assert_eq!(sink.causes().len(), 1);
}

#[tokio::test]
async fn expiry_without_a_renewal_token_terminates_the_session() {
	let server = MockServer::start_async().await;
	let (coordinator, store, sink) = build_reqwest_test_coordinator(
		test_descriptor(&server.base_url()),
		Some(Credential::access_only("t1")),
	);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/a");
			then.status(401);
		})
		.await;

	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/renew");
			then.status(200).body(r#"{"access_token":"t2"}"#);
		})
		.await;
	let cause = termination_cause(
		coordinator
			.execute(CallRequest::get("/a"))
			.await
			.expect_err("Expiry without a renewal token cannot recover."),
	);

	renewal.assert_calls_async(0).await;

	assert_eq!(cause, TerminationCause::MissingRenewalToken);
	assert!(store.get().await.is_none());
	assert_eq!(sink.causes(), vec![TerminationCause::MissingRenewalToken]);
}

#[tokio::test]
async fn expiry_on_the_renewal_endpoint_never_recurses() {
	let server = MockServer::start_async().await;
	let (coordinator, store, sink) = build_reqwest_test_coordinator(
		test_descriptor(&server.base_url()),
		Some(Credential::new("t1", "r1")),
	);
	let renewal_endpoint = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/renew");
			then.status(401).body(r#"{"error":"invalid_token"}"#);
		})
		.await;
	let cause = termination_cause(
		coordinator
			.execute(CallRequest::post("/auth/renew"))
			.await
			.expect_err("Expiry from the renewal endpoint goes straight to termination."),
	);

	// Exactly one hit: the original call. No recursive renewal was attempted.
	renewal_endpoint.assert_calls_async(1).await;

	assert_eq!(cause, TerminationCause::RenewalRejected { status: 401 });
	assert!(store.get().await.is_none());
	assert_eq!(sink.causes().len(), 1);
	assert_eq!(coordinator.renewal_metrics.attempts(), 0);
}
