//! Tests for the Descil facade against a mock service

use std::time::Duration;

use descil_mturk::{CodeRegistry, CodeResult, Descil, Error};
use mockito::{Matcher, Server};
use serde_json::json;

use crate::common::{PROJECT, SERVICE_KEY, codes_reply, config_for, descil_for};

fn get_codes_body() -> Matcher {
    Matcher::PartialJson(json!({
        "Operation": "GetCodes",
        "ServiceKey": SERVICE_KEY,
        "ProjectCode": PROJECT,
        "AccessCode": "",
        "ExitCode": "",
        "Bonus": 0,
        "Payoffs": [],
        "Codes": []
    }))
}

// =============================================================================
// GET CODES
// =============================================================================

#[tokio::test]
async fn test_get_codes_merges_into_registry() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(get_codes_body())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(codes_reply(&["A1", "A2", "A3"]))
        .expect(1)
        .create_async()
        .await;

    let descil = descil_for(&server.url());
    let outcome = descil.get_codes().await.unwrap();

    assert!(outcome.requested);
    assert_eq!(outcome.imported, 3);
    assert_eq!(outcome.total, 3);
    assert_eq!(
        descil.code_exists("A2").and_then(|r| r.exit_code),
        Some("EXIT-A2".to_string())
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_codes_on_populated_registry_makes_no_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_body(codes_reply(&["A1"]))
        .expect(1)
        .create_async()
        .await;

    let descil = descil_for(&server.url());
    assert!(descil.get_codes().await.unwrap().requested);

    let second = descil.get_codes().await.unwrap();
    assert!(!second.requested);
    assert_eq!(second.total, 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_overlapping_get_codes_share_one_exchange() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(get_codes_body())
        .with_body(codes_reply(&["A1", "A2"]))
        .expect(1)
        .create_async()
        .await;

    let descil = descil_for(&server.url());
    let (first, second) = tokio::join!(descil.get_codes(), descil.get_codes());

    let first = first.unwrap();
    let second = second.unwrap();
    assert!(first.requested);
    assert!(!second.requested);
    assert_eq!(second.imported, 2);
    assert_eq!(second.total, 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_failed_get_codes_leaves_registry_untouched_and_reaches_waiters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(503)
        .with_body("maintenance")
        .expect(1)
        .create_async()
        .await;

    let descil = descil_for(&server.url());
    let (first, second) = tokio::join!(descil.get_codes(), descil.get_codes());

    let expected = Error::Transport {
        status: Some(503),
        message: "maintenance".into(),
    };
    assert_eq!(first.unwrap_err(), expected);
    assert_eq!(second.unwrap_err(), expected);
    assert!(descil.records().is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_can_be_retried_after_failure() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", "/")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let descil = descil_for(&server.url());
    assert!(descil.get_codes().await.is_err());
    failing.remove_async().await;

    server
        .mock("POST", "/")
        .with_body(codes_reply(&["A1"]))
        .create_async()
        .await;
    let outcome = descil.get_codes().await.unwrap();
    assert!(outcome.requested);
    assert_eq!(outcome.total, 1);
}

#[tokio::test]
async fn test_cancelled_fetch_releases_waiters() {
    // Accepts connections into the backlog but never answers
    let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let descil = descil_for(&format!("http://{}/", silent.local_addr().unwrap()));

    let waiter = async {
        // Let the first fetch register itself as in flight
        tokio::task::yield_now().await;
        descil.get_codes().await
    };
    let cancelled = tokio::time::timeout(Duration::from_millis(50), descil.get_codes());

    let (cancelled, waited) = tokio::join!(cancelled, waiter);
    assert!(cancelled.is_err());
    assert_eq!(
        waited.unwrap_err(),
        Error::transport("GetCodes exchange was abandoned")
    );
}

#[tokio::test]
async fn test_undecodable_reply_is_transport_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let descil = descil_for(&server.url());
    let err = descil.get_codes().await.unwrap_err();
    assert!(matches!(err, Error::Transport { status: Some(200), .. }));
}

// =============================================================================
// SESSION EVENTS
// =============================================================================

async fn loaded(server: &mut Server, codes: &[&str]) -> Descil {
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"Operation": "GetCodes"})))
        .with_body(codes_reply(codes))
        .create_async()
        .await;
    let descil = descil_for(&server.url());
    descil.get_codes().await.unwrap();
    descil
}

#[tokio::test]
async fn test_check_out_updates_local_record_then_posts() {
    let mut server = Server::new_async().await;
    let descil = loaded(&mut server, &["ABC123"]).await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "Operation": "CheckOut",
            "ServiceKey": SERVICE_KEY,
            "ProjectCode": PROJECT,
            "AccessCode": "ABC123",
            "ExitCode": "EXIT1",
            "Bonus": 5
        })))
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    descil.check_out("ABC123", "EXIT1", 5.0).await.unwrap();

    let record = descil.code_exists("ABC123").unwrap();
    assert!(record.checked_out);
    assert!((record.bonus - 5.0).abs() < f64::EPSILON);
    assert_eq!(record.exit_code.as_deref(), Some("EXIT1"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_local_state_is_set_even_when_exchange_fails() {
    let mut server = Server::new_async().await;
    let descil = loaded(&mut server, &["A1"]).await;
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"Operation": "CheckIn"})))
        .with_status(502)
        .create_async()
        .await;

    let err = descil.check_in("A1").await.unwrap_err();
    assert!(matches!(err, Error::Transport { status: Some(502), .. }));
    assert!(descil.code_exists("A1").unwrap().checked_in);
}

#[tokio::test]
async fn test_check_in_unknown_code_sends_nothing() {
    let mut server = Server::new_async().await;
    let descil = loaded(&mut server, &["A1"]).await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"Operation": "CheckIn"})))
        .expect(0)
        .create_async()
        .await;

    let err = descil.check_in("NOPE").await.unwrap_err();
    assert_eq!(err, Error::NotFound("NOPE".into()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_validation_fails_before_lookup_or_network() {
    let descil = descil_for("http://127.0.0.1:9/");
    assert!(matches!(descil.check_in("").await, Err(Error::Validation(_))));
    assert!(matches!(
        descil.check_out("A", "", 0.0).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        descil.drop_out("", "E", 0.0).await,
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn test_drop_out_marks_record_and_transmits_everything() {
    let mut server = Server::new_async().await;
    let descil = loaded(&mut server, &["A1"]).await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "Operation": "DropOut",
            "AccessCode": "A1",
            "ExitCode": "QUIT",
            "Bonus": 0.5
        })))
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    descil.drop_out("A1", "QUIT", 0.5).await.unwrap();
    assert!(descil.code_exists("A1").unwrap().dropped_out);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_pending_sends_ended_sessions() {
    let mut server = Server::new_async().await;
    let descil = loaded(&mut server, &["A1", "A2", "A3"]).await;
    server
        .mock("POST", "/")
        .match_body(Matcher::Regex("\"Operation\":\"(CheckOut|DropOut)\"".into()))
        .with_body("{}")
        .create_async()
        .await;
    let post = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "Operation": "PostCodes",
            "Codes": [
                {"AccessCode": "A1", "ExitCode": "E1", "Bonus": 2},
                {"AccessCode": "A3", "ExitCode": "E3", "Bonus": 0}
            ]
        })))
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    descil.check_out("A1", "E1", 2.0).await.unwrap();
    descil.drop_out("A3", "E3", 0.0).await.unwrap();
    descil.post_pending().await.unwrap();
    post.assert_async().await;
}

#[tokio::test]
async fn test_post_codes_validates_every_entry() {
    let descil = descil_for("http://127.0.0.1:9/");
    let batch = vec![
        CodeResult {
            access_code: "A1".into(),
            exit_code: "E1".into(),
            bonus: 1.0,
        },
        CodeResult {
            access_code: "A2".into(),
            exit_code: String::new(),
            bonus: 0.0,
        },
    ];
    assert!(matches!(descil.post_codes(&batch).await, Err(Error::Validation(_))));
}

// =============================================================================
// INJECTED REGISTRY
// =============================================================================

#[tokio::test]
async fn test_injected_registry_is_shared() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_body(codes_reply(&["A1"]))
        .expect(1)
        .create_async()
        .await;

    let registry = CodeRegistry::shared();
    let first = Descil::with_registry(config_for(&server.url()), registry.clone()).unwrap();
    let second = Descil::with_registry(config_for(&server.url()), registry.clone()).unwrap();

    first.get_codes().await.unwrap();
    assert!(!second.get_codes().await.unwrap().requested);

    second.mark_used("A1").unwrap();
    assert!(first.is_used("A1").unwrap());
    assert!(CodeRegistry::lock(&registry).get("A1").unwrap().used);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_facades_sharing_a_registry_coalesce_separately() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_body(codes_reply(&["A1", "A2"]))
        .expect(2)
        .create_async()
        .await;

    let registry = CodeRegistry::shared();
    let first = Descil::with_registry(config_for(&server.url()), registry.clone()).unwrap();
    let second = Descil::with_registry(config_for(&server.url()), registry.clone()).unwrap();

    let (one, two) = tokio::join!(first.get_codes(), second.get_codes());
    assert!(one.unwrap().requested);
    assert!(two.unwrap().requested);
    assert_eq!(CodeRegistry::lock(&registry).len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_separate_facades_are_independent() {
    let one = descil_for("http://127.0.0.1:9/");
    let two = descil_for("http://127.0.0.1:9/");
    CodeRegistry::lock(&one.registry()).import_batch([descil_mturk::AccessCodeRecord::new("X")]);

    assert!(one.code_exists("X").is_some());
    assert!(two.code_exists("X").is_none());
}

#[tokio::test]
async fn test_registry_pass_throughs() {
    let descil = descil_for("http://127.0.0.1:9/");
    CodeRegistry::lock(&descil.registry()).import_batch([descil_mturk::AccessCodeRecord::new("A")]);

    assert_eq!(descil.increment_usage("A").unwrap().usage, 1);
    assert_eq!(descil.decrement_usage("A").unwrap().usage, 0);
    assert!(matches!(descil.decrement_usage("A"), Err(Error::InvalidState(_))));
    assert!(!descil.mark_invalid("A").unwrap().valid);
    assert!(descil.update("A", &json!({"valid": true})).unwrap().valid);
    assert!(descil.mark_used("A").unwrap().used);
    assert!(!descil.mark_unused("A").unwrap().used);
}
