// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the generation pipeline.
//!
//! Each test creates an isolated TestHarness with a temp SQLite registry, a
//! temp artifact tree and scripted generators. Tests are independent and
//! order-insensitive.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use figura_core::types::{ArtifactRef, GenerationRecord, NewGenerationRecord, User};
use figura_core::{ArtifactStore, FiguraError, MeshGenerator};
use figura_gateway::{build_router, GatewayState, JobTracker};
use figura_meshgen::{PollState, Reconciler, RecordReconciler};
use figura_test_utils::{StatusStep, TestHarness, PNG_BYTES};

async fn record_for(harness: &TestHarness, user: &User) -> GenerationRecord {
    harness
        .storage
        .create_record(user.id, &NewGenerationRecord::default())
        .await
        .unwrap()
}

fn channel() -> (watch::Sender<PollState>, watch::Receiver<PollState>) {
    watch::channel(PollState::Submitted)
}

// ---- Scenario: processing three times, then completed ----

#[tokio::test]
async fn completed_job_reconciles_the_record() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (alice, _) = harness.sign_up("alice").await.unwrap();
    let record = record_for(&harness, &alice).await;

    harness.mesh.script(
        "test-1700000000",
        [
            StatusStep::processing(),
            StatusStep::processing(),
            StatusStep::processing(),
            StatusStep::completed("/files/test-1700000000.glb"),
        ],
    );

    let reconciler = RecordReconciler::new(harness.storage.clone(), record.id);
    let (tx, rx) = channel();
    let outcome = harness
        .poller()
        .run("test-1700000000", &reconciler, &tx, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.model_url, "/files/test-1700000000.glb");
    assert_eq!(outcome.attempts, 4);
    assert_eq!(harness.mesh.status_calls("test-1700000000"), 4);
    assert_eq!(harness.sleeper.sleeps().len(), 4);
    assert_eq!(
        *rx.borrow(),
        PollState::Completed {
            model_url: "/files/test-1700000000.glb".into()
        }
    );

    let stored = harness.storage.get_record(alice.id, record.id).await.unwrap();
    assert_eq!(
        stored.generated_3d_ref,
        Some(ArtifactRef::from("/files/test-1700000000.glb".to_string()))
    );
}

// ---- Scenario: the service reports an error ----

#[tokio::test]
async fn service_error_stops_polling_once() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (alice, _) = harness.sign_up("alice").await.unwrap();
    let record = record_for(&harness, &alice).await;

    harness.mesh.script(
        "job-broken",
        [
            StatusStep::processing(),
            StatusStep::error("invalid mesh topology"),
        ],
    );

    let reconciler = RecordReconciler::new(harness.storage.clone(), record.id);
    let (tx, rx) = channel();
    let err = harness
        .poller()
        .run("job-broken", &reconciler, &tx, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        FiguraError::ServiceReported { request_id, message } => {
            assert_eq!(request_id, "job-broken");
            assert_eq!(message, "invalid mesh topology");
        }
        other => panic!("expected ServiceReported, got {other:?}"),
    }
    assert_eq!(harness.mesh.status_calls("job-broken"), 2);
    assert!(matches!(&*rx.borrow(), PollState::Failed { message } if message.contains("invalid mesh topology")));

    let stored = harness.storage.get_record(alice.id, record.id).await.unwrap();
    assert_eq!(stored.generated_3d_ref, None);
}

// ---- Scenario: a job that never leaves processing ----

#[tokio::test]
async fn stuck_job_times_out_after_the_budget() {
    let harness = TestHarness::builder()
        .with_poll_policy(5, Duration::from_secs(2))
        .build()
        .await
        .unwrap();
    harness
        .mesh
        .script("job-stuck", [StatusStep::queued(), StatusStep::processing()]);

    let (tx, rx) = channel();
    let err = harness
        .poller()
        .run(
            "job-stuck",
            &figura_meshgen::NoopReconciler,
            &tx,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FiguraError::Timeout { attempts: 5, elapsed, .. } if elapsed == Duration::from_secs(10)
    ));
    assert_eq!(*rx.borrow(), PollState::TimedOut { attempts: 5 });
    assert_eq!(harness.mesh.status_calls("job-stuck"), 5);
    assert_eq!(harness.sleeper.total(), Duration::from_secs(10));
}

// ---- Scenario: transport failures consume the budget but are not terminal ----

#[tokio::test]
async fn transport_failures_are_retried() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.mesh.script(
        "job-flaky",
        [
            StatusStep::TransportFailure("connection reset".into()),
            StatusStep::TransportFailure("connection reset".into()),
            StatusStep::completed("/files/job-flaky.glb"),
        ],
    );

    let (tx, _rx) = channel();
    let outcome = harness
        .poller()
        .run(
            "job-flaky",
            &figura_meshgen::NoopReconciler,
            &tx,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.attempts, 3);
}

// ---- Scenario: toggling visibility on someone else's record ----

#[tokio::test]
async fn foreign_visibility_toggle_is_rejected() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (alice, _) = harness.sign_up("alice").await.unwrap();
    let (bob, _) = harness.sign_up("bob").await.unwrap();
    let record = record_for(&harness, &alice).await;

    let err = harness
        .storage
        .set_visibility(bob.id, record.id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, FiguraError::Forbidden(_)));

    let unchanged = harness.storage.get_record(alice.id, record.id).await.unwrap();
    assert_eq!(unchanged, record);
    assert!(!unchanged.is_public);
}

// ---- Scenario: repeated reads and reconciliation are idempotent ----

#[tokio::test]
async fn status_reads_and_reconciliation_are_idempotent() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (alice, _) = harness.sign_up("alice").await.unwrap();
    let record = record_for(&harness, &alice).await;
    harness
        .mesh
        .script("job-done", [StatusStep::completed("/files/job-done.glb")]);

    let first = harness.mesh.get_status("job-done").await.unwrap();
    let second = harness.mesh.get_status("job-done").await.unwrap();
    assert_eq!(first, second);

    let reconciler = RecordReconciler::new(harness.storage.clone(), record.id);
    let a = reconciler.reconcile("job-done", "/files/job-done.glb").await.unwrap();
    let b = reconciler.reconcile("job-done", "/files/job-done.glb").await.unwrap();
    assert_eq!(a, b);

    let changed = harness.storage.attach_generated_3d(record.id, &a).await.unwrap();
    assert!(!changed, "a repeated reconciliation must not rewrite the record");

    let records = harness
        .storage
        .list_records(alice.id, Default::default())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].generated_3d_ref.as_ref(), Some(&a));
}

// ---- Scenario: mirrored meshes land in the artifact store ----

#[tokio::test]
async fn mirrored_meshes_are_stored_locally() {
    let harness = TestHarness::builder()
        .with_mirrored_artifacts()
        .build()
        .await
        .unwrap();
    let (alice, _) = harness.sign_up("alice").await.unwrap();
    let record = record_for(&harness, &alice).await;
    harness
        .mesh
        .script("job-mirror", [StatusStep::completed("/files/job-mirror.glb")]);

    let reconciler = RecordReconciler::new(harness.storage.clone(), record.id)
        .with_mirror(harness.mesh.clone(), harness.artifact_store());
    let (tx, _rx) = channel();
    let outcome = harness
        .poller()
        .run("job-mirror", &reconciler, &tx, &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.artifact.as_str().starts_with("/uploads/meshes/"));
    assert!(outcome.artifact.as_str().ends_with(".glb"));
    assert_eq!(
        harness.artifacts.get(&outcome.artifact).await.unwrap(),
        b"glTF scripted mesh"
    );
    assert_eq!(harness.mesh.fetched_urls(), vec!["/files/job-mirror.glb".to_string()]);
}

// ---- Full HTTP round trip ----

const BOUNDARY: &str = "e2e-boundary";

fn upload(uri: &str, token: &str, image: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"instructions\"\r\n\r\na knight\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"knight.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn http_generation_round_trip() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (_, token) = harness.sign_up("alice").await.unwrap();
    harness.mesh.next_request_id("test-1700000000");
    harness.mesh.script(
        "test-1700000000",
        [
            StatusStep::processing(),
            StatusStep::processing(),
            StatusStep::processing(),
            StatusStep::completed("/files/test-1700000000.glb"),
        ],
    );

    let state = GatewayState {
        storage: harness.storage.clone(),
        artifacts: harness.artifacts.clone(),
        accounts: harness.accounts.clone(),
        images: harness.images.clone(),
        meshes: harness.mesh.clone(),
        poller: harness.poller(),
        jobs: JobTracker::new(),
        image_config: Arc::new(harness.config.image.clone()),
        mirror_artifacts: false,
        shutdown: CancellationToken::new(),
        started_at: Instant::now(),
    };
    let app = build_router(state, &harness.config.server, &harness.config.artifacts);

    let response = app
        .clone()
        .oneshot(upload("/api/generate?wait=true", &token, PNG_BYTES))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["record"]["generated_3d_ref"], "/files/test-1700000000.glb");
    assert_eq!(body["record"]["instructions"], "a knight");
    assert_eq!(body["job"]["state"], "completed");
    assert_eq!(harness.mesh.submitted_images(), vec![PNG_BYTES.to_vec()]);

    let reference = body["record"]["reference_image_ref"].as_str().unwrap();
    let served = app
        .oneshot(Request::builder().uri(reference).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(served.status(), StatusCode::OK);
}
