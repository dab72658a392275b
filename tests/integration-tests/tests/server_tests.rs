// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! End-to-end server scenarios: readiness, evaluation decisions and the
//! refresh scheduler picking up mutated fixtures.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use trustl_integration::{subscribe, write_tsl, x5c_request, FixtureService, TestCa};
use trustl_pipeline::Pipeline;
use trustl_server::api::{router, AppState};
use trustl_server::scheduler::Scheduler;
use trustl_server::snapshot::SnapshotPublisher;
use trustl_server::SecurityConfig;

async fn serve(yaml: &str, frequency: Duration) -> (Router, Arc<SnapshotPublisher>, Scheduler) {
    let pipeline = Arc::new(Pipeline::from_yaml(yaml).unwrap());
    let publisher = Arc::new(SnapshotPublisher::new());
    let scheduler = Scheduler::new(pipeline, Arc::clone(&publisher), frequency);
    scheduler.run_once().await.unwrap();

    let state = AppState::new(Arc::clone(&publisher), &SecurityConfig::default());
    (router(state), publisher, scheduler)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn evaluate(app: &Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/evaluate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Scenario: an empty pipeline leaves the service alive but not ready.
#[tokio::test]
async fn empty_pipeline_is_alive_but_not_ready() {
    subscribe();
    let (app, publisher, _) = serve("[]", Duration::from_secs(60)).await;

    let snapshot = publisher.current().unwrap();
    assert_eq!(snapshot.context().tsl_count(), 0);
    assert!(snapshot.context().pool().is_empty());

    assert_eq!(get(&app, "/health").await.0, StatusCode::OK);
    assert_eq!(get(&app, "/ready").await.0, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = get(&app, "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tsl_count"], 0);
}

/// Scenario: a certificate issued by the loaded CA is permitted; an
/// unrelated one is denied with a verify reason.
#[tokio::test]
async fn evaluate_decides_against_the_loaded_pool() {
    subscribe();
    let dir = tempfile::tempdir().unwrap();
    let ca = TestCa::new("scenario CA");
    let url = write_tsl(
        dir.path(),
        "tsl.xml",
        "SE",
        1,
        vec![FixtureService::granted_ca(ca.der())],
        &[],
    );

    let yaml = format!("- load: [\"{url}\"]\n- select: []");
    let (app, _, _) = serve(&yaml, Duration::from_secs(60)).await;

    assert_eq!(get(&app, "/ready").await.0, StatusCode::OK);

    let leaf = ca.issue_leaf("client.example");
    let (status, body) = evaluate(&app, x5c_request(&leaf)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decision"], true);

    let stranger = TestCa::new("stranger CA").issue_leaf("impostor.example");
    let (status, body) = evaluate(&app, x5c_request(&stranger)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decision"], false);
    assert!(body["context"]["reason_admin"]
        .as_str()
        .unwrap()
        .contains("issuer"));
}

/// Scenario: with no pool built, evaluation denies with a pool reason.
#[tokio::test]
async fn evaluate_without_a_pool_denies() {
    subscribe();
    let (app, _, _) = serve("[]", Duration::from_secs(60)).await;

    let ca = TestCa::new("any CA");
    let (status, body) = evaluate(&app, x5c_request(&ca.der())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decision"], false);
    assert_eq!(body["context"]["reason_user"], "pool not initialized");
}

/// Scenario: the info endpoint summarizes every loaded list.
#[tokio::test]
async fn info_lists_scheme_summaries() {
    subscribe();
    let dir = tempfile::tempdir().unwrap();
    let ca = TestCa::new("info CA");
    let leaf_url = write_tsl(
        dir.path(),
        "leaf.xml",
        "NO",
        3,
        vec![FixtureService::granted_ca(ca.der())],
        &[],
    );
    let root_url = write_tsl(
        dir.path(),
        "root.xml",
        "SE",
        9,
        vec![FixtureService::granted_ca(ca.der())],
        &[leaf_url],
    );

    let yaml = format!(
        "- set-fetch-options: [\"max-depth:1\"]\n- load: [\"{root_url}\"]\n- select: [\"include-referenced\"]"
    );
    let (app, _, _) = serve(&yaml, Duration::from_secs(60)).await;

    let (status, body) = get(&app, "/info").await;
    assert_eq!(status, StatusCode::OK);
    let summaries = body["tsl_summaries"].as_array().unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0]["territory"], "SE");
    assert_eq!(summaries[0]["sequence"], 9);
    assert_eq!(summaries[1]["territory"], "NO");
    assert_eq!(summaries[1]["sequence"], 3);
}

/// Scenario: a mutated fixture becomes observable within two refresh
/// periods, and a reader holding the old snapshot keeps a whole view.
#[tokio::test]
async fn refresh_picks_up_mutated_fixtures() {
    subscribe();
    let dir = tempfile::tempdir().unwrap();
    let first_ca = TestCa::new("first CA");
    let url = write_tsl(
        dir.path(),
        "tsl.xml",
        "SE",
        1,
        vec![FixtureService::granted_ca(first_ca.der())],
        &[],
    );

    let yaml = format!("- load: [\"{url}\"]\n- select: []");
    let (app, publisher, scheduler) = serve(&yaml, Duration::from_millis(200)).await;

    let old_snapshot = publisher.current().unwrap();
    assert_eq!(
        old_snapshot.context().trees()[0].root().tsl().scheme().sequence_number(),
        1
    );

    let shutdown = CancellationToken::new();
    let refresher = tokio::spawn({
        let scheduler = scheduler.clone();
        let shutdown = shutdown.clone();
        async move { scheduler.run(shutdown).await }
    });

    // mutate the fixture in place: new sequence, new CA
    let second_ca = TestCa::new("second CA");
    write_tsl(
        dir.path(),
        "tsl.xml",
        "SE",
        2,
        vec![FixtureService::granted_ca(second_ca.der())],
        &[],
    );

    let mut observed = None;
    for _ in 0..40 {
        let (_, body) = get(&app, "/info").await;
        let sequence = body["tsl_summaries"][0]["sequence"].as_u64();
        if sequence == Some(2) {
            observed = sequence;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(observed, Some(2), "mutation not observed within 2s");

    // the new pool answers for the new CA
    let leaf = second_ca.issue_leaf("client.example");
    let (_, body) = evaluate(&app, x5c_request(&leaf)).await;
    assert_eq!(body["decision"], true);

    // the old reader still sees its complete, original state
    assert_eq!(
        old_snapshot.context().trees()[0].root().tsl().scheme().sequence_number(),
        1
    );
    assert_eq!(old_snapshot.context().pool().len(), 1);

    shutdown.cancel();
    refresher.await.unwrap();
}
