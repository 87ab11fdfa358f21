// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level tests driving the router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use figura_gateway::{build_router, GatewayState, JobTracker};
use figura_meshgen::PollState;
use figura_test_utils::harness::TEST_PASSWORD;
use figura_test_utils::{StatusStep, TestHarness, PNG_BYTES};

const BOUNDARY: &str = "figura-test-boundary";

struct Api {
    app: Router,
    harness: TestHarness,
    jobs: JobTracker,
}

impl Api {
    async fn new() -> Self {
        Self::with(TestHarness::builder().build().await.unwrap())
    }

    fn with(harness: TestHarness) -> Self {
        Self::with_jobs(harness, JobTracker::new())
    }

    fn with_jobs(harness: TestHarness, jobs: JobTracker) -> Self {
        let state = GatewayState {
            storage: harness.storage.clone(),
            artifacts: harness.artifacts.clone(),
            accounts: harness.accounts.clone(),
            images: harness.images.clone(),
            meshes: harness.mesh.clone(),
            poller: harness.poller(),
            jobs: jobs.clone(),
            image_config: Arc::new(harness.config.image.clone()),
            mirror_artifacts: harness.config.mesh.mirror_artifacts,
            shutdown: CancellationToken::new(),
            started_at: Instant::now(),
        };
        let app = build_router(state, &harness.config.server, &harness.config.artifacts);
        Self { app, harness, jobs }
    }

    async fn raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.raw(request).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn form(&self, uri: &str, token: &str, fields: &[Field<'_>]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields)))
            .unwrap();
        self.send(request).await
    }

    async fn sign_up(&self, username: &str) -> String {
        self.harness.sign_up(username).await.unwrap().1
    }

    /// A second session for a user created with [`Api::sign_up`].
    async fn log_in(&self, username: &str) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": format!("{username}@example.com"), "password": TEST_PASSWORD})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }
}

enum Field<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn multipart_body(fields: &[Field<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for field in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match field {
            Field::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Field::File(name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"upload.png\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn wait_until_terminal(jobs: &JobTracker, request_id: &str) -> PollState {
    for _ in 0..500 {
        if let Some(job) = jobs.get(request_id) {
            let state = job.state();
            if state.is_terminal() {
                return state;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {request_id} never reached a terminal state");
}

#[tokio::test]
async fn health_is_public() {
    let api = Api::new().await;
    let (status, body) = api.json(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"]["status"], "healthy");
    assert_eq!(body["active_jobs"], 0);
}

#[tokio::test]
async fn protected_routes_answer_uniform_401() {
    let api = Api::new().await;

    let (status, body) = api.json(Method::GET, "/api/models", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");

    let (status, body) = api
        .json(Method::GET, "/api/models", Some("not-a-real-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("invalid or expired token"));
}

#[tokio::test]
async fn account_lifecycle() {
    let api = Api::new().await;
    let registration = json!({"username": "alice", "email": "alice@example.com", "password": "hunter2hunter2"});

    let (status, user) = api
        .json(Method::POST, "/api/auth/register", None, Some(registration.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["username"], "alice");
    assert!(user.get("password_hash").is_none());

    let (status, _) = api
        .json(Method::POST, "/api/auth/register", None, Some(registration))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = api
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "wrong password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("incorrect email or password"));

    let (status, token) = api
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "hunter2hunter2"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(token["token_type"], "bearer");
    let token = token["access_token"].as_str().unwrap().to_string();

    let (status, me) = api.json(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "alice@example.com");

    let (status, body) = api
        .json(Method::POST, "/api/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled_jobs"], 0);

    let (status, _) = api.json(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn records_are_owner_scoped() {
    let api = Api::new().await;
    let alice = api.sign_up("alice").await;
    let bob = api.sign_up("bob").await;

    let (status, record) = api
        .json(
            Method::POST,
            "/api/models",
            Some(&alice),
            Some(json!({"instructions": "a knight in red armor"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["is_public"], false);
    let uri = format!("/api/models/{}", record["id"]);

    let (status, body) = api.json(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");

    let (status, _) = api
        .json(
            Method::PUT,
            &format!("{uri}/visibility"),
            Some(&bob),
            Some(json!({"is_public": true})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = api.json(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, unchanged) = api.json(Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged, record);

    let (status, updated) = api
        .json(
            Method::PUT,
            &uri,
            Some(&alice),
            Some(json!({"instructions": "a knight in blue armor"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["instructions"], "a knight in blue armor");

    let (status, body) = api
        .json(Method::GET, "/api/models/9999", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "record_not_found");

    let (status, _) = api.json(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = api.json(Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_gallery_search() {
    let api = Api::new().await;
    let alice = api.sign_up("alice").await;

    for instructions in ["a knight", "a dragon"] {
        let (_, record) = api
            .json(
                Method::POST,
                "/api/models",
                Some(&alice),
                Some(json!({"instructions": instructions})),
            )
            .await;
        let (status, _) = api
            .json(
                Method::PUT,
                &format!("/api/models/{}/visibility", record["id"]),
                Some(&alice),
                Some(json!({"is_public": true})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = api
        .json(Method::GET, "/api/public/models?search=KNIGHT&skip=0&limit=10", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["instructions"], "a knight");
    assert_eq!(listed[0]["owner_username"], "alice");

    let (_, body) = api
        .json(Method::GET, "/api/public/models?limit=1", None, None)
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn generate_2d_attaches_and_serves_the_figure() {
    let api = Api::new().await;
    let alice = api.sign_up("alice").await;
    let (_, record) = api
        .json(Method::POST, "/api/models", Some(&alice), Some(json!({})))
        .await;
    let record_id = record["id"].to_string();

    let (status, body) = api
        .form(
            "/api/generate-2d",
            &alice,
            &[
                Field::Text("instructions", "a knight"),
                Field::Text("record_id", &record_id),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let image_url = body["image_url"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/uploads/2d/"));
    assert_eq!(body["record"]["generated_2d_ref"], image_url.as_str());

    let prompt = &api.harness.images.requests()[0].prompt;
    assert!(prompt.ends_with("User Request: a knight"));

    let (status, bytes) = api
        .raw(Request::builder().uri(&image_url).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, PNG_BYTES);
}

#[tokio::test]
async fn generate_2d_requires_instructions_or_reference() {
    let api = Api::new().await;
    let alice = api.sign_up("alice").await;

    let (status, body) = api
        .form("/api/generate-2d", &alice, &[Field::Text("instructions", "   ")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
    assert_eq!(api.harness.images.calls(), 0);

    let (status, _) = api
        .form(
            "/api/generate-2d",
            &alice,
            &[Field::Text("instructions", ""), Field::File("file", PNG_BYTES)],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let request = &api.harness.images.requests()[0];
    assert!(request.reference.is_some());
    assert!(request.prompt.ends_with(&api.harness.config.image.default_instruction));
}

#[tokio::test]
async fn generate_2d_failure_is_bad_gateway() {
    let api = Api::new().await;
    let alice = api.sign_up("alice").await;
    api.harness.images.push_failure("no image generated");

    let (status, body) = api
        .form("/api/generate-2d", &alice, &[Field::Text("instructions", "a knight")])
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("no image generated"));
}

#[tokio::test]
async fn generate_rejects_non_images() {
    let api = Api::new().await;
    let alice = api.sign_up("alice").await;

    let (status, _) = api
        .form("/api/generate", &alice, &[Field::File("file", b"plain text")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = api
        .form("/api/generate", &alice, &[Field::Text("instructions", "x")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(api.harness.mesh.submit_calls(), 0);
}

#[tokio::test]
async fn rejected_submission_leaves_no_trace() {
    let api = Api::new().await;
    let alice = api.sign_up("alice").await;
    api.harness.mesh.reject_submissions("queue full");

    let (status, body) = api
        .form("/api/generate", &alice, &[Field::File("file", PNG_BYTES)])
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("queue full"));
    assert_eq!(api.harness.mesh.submit_calls(), 1);

    let (_, records) = api.json(Method::GET, "/api/models", Some(&alice), None).await;
    assert!(records.as_array().unwrap().is_empty());

    let references = api.harness.artifacts.root().join("references");
    let leftover = std::fs::read_dir(&references)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn background_job_reconciles_once_and_reads_are_idempotent() {
    let api = Api::new().await;
    let alice = api.sign_up("alice").await;
    api.harness.mesh.next_request_id("job-async");
    api.harness.mesh.script(
        "job-async",
        [
            StatusStep::queued(),
            StatusStep::processing(),
            StatusStep::completed("/files/job-async.glb"),
        ],
    );

    let (status, body) = api
        .form("/api/generate", &alice, &[Field::File("file", PNG_BYTES)])
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["job"]["request_id"], "job-async");
    assert!(body["record"]["generated_3d_ref"].is_null());
    let record_uri = format!("/api/models/{}", body["record"]["id"]);

    let terminal = wait_until_terminal(&api.jobs, "job-async").await;
    assert_eq!(
        terminal,
        PollState::Completed {
            model_url: "/files/job-async.glb".into()
        }
    );

    let (_, first) = api
        .json(Method::GET, "/api/jobs/job-async", Some(&alice), None)
        .await;
    let (_, second) = api
        .json(Method::GET, "/api/jobs/job-async", Some(&alice), None)
        .await;
    assert_eq!(first, second);
    assert_eq!(first["state"], "completed");

    let (_, record) = api.json(Method::GET, &record_uri, Some(&alice), None).await;
    assert_eq!(record["generated_3d_ref"], "/files/job-async.glb");
    assert_eq!(api.harness.mesh.status_calls("job-async"), 3);
}

#[tokio::test]
async fn jobs_are_owner_only() {
    let api = Api::new().await;
    let alice = api.sign_up("alice").await;
    let bob = api.sign_up("bob").await;
    api.harness.mesh.next_request_id("job-owned");
    api.harness
        .mesh
        .script("job-owned", [StatusStep::completed("/files/job-owned.glb")]);

    let (status, _) = api
        .form("/api/generate", &alice, &[Field::File("file", PNG_BYTES)])
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = api
        .json(Method::GET, "/api/jobs/job-owned", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = api
        .json(Method::DELETE, "/api/jobs/job-owned", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = api
        .json(Method::GET, "/api/jobs/nope", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "job_not_found");
}

#[tokio::test]
async fn cancelling_a_job_stops_local_polling() {
    let api = Api::with(
        TestHarness::builder()
            .with_poll_policy(u32::MAX, Duration::from_secs(2))
            .build()
            .await
            .unwrap(),
    );
    let alice = api.sign_up("alice").await;
    api.harness.mesh.next_request_id("job-stuck");
    api.harness
        .mesh
        .script("job-stuck", [StatusStep::processing()]);

    let (status, _) = api
        .form("/api/generate", &alice, &[Field::File("file", PNG_BYTES)])
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = api
        .json(Method::DELETE, "/api/jobs/job-stuck", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(matches!(
        wait_until_terminal(&api.jobs, "job-stuck").await,
        PollState::Cancelled { .. }
    ));
}

#[tokio::test]
async fn logout_cancels_the_callers_pollers() {
    let api = Api::with(
        TestHarness::builder()
            .with_poll_policy(u32::MAX, Duration::from_secs(2))
            .build()
            .await
            .unwrap(),
    );
    let alice = api.sign_up("alice").await;
    let bob = api.sign_up("bob").await;
    api.harness.mesh.next_request_id("alice-job");
    api.harness.mesh.next_request_id("bob-job");
    api.harness.mesh.script("alice-job", [StatusStep::processing()]);
    api.harness.mesh.script("bob-job", [StatusStep::processing()]);

    api.form("/api/generate", &alice, &[Field::File("file", PNG_BYTES)])
        .await;
    api.form("/api/generate", &bob, &[Field::File("file", PNG_BYTES)])
        .await;

    let (status, body) = api
        .json(Method::POST, "/api/auth/logout", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled_jobs"], 1);
    assert!(matches!(
        wait_until_terminal(&api.jobs, "alice-job").await,
        PollState::Cancelled { .. }
    ));
    assert!(!api.jobs.get("bob-job").unwrap().state().is_terminal());

    api.jobs.cancel_all();
    wait_until_terminal(&api.jobs, "bob-job").await;
}

#[tokio::test]
async fn logout_leaves_other_sessions_of_the_same_user_polling() {
    let api = Api::with(
        TestHarness::builder()
            .with_poll_policy(u32::MAX, Duration::from_secs(2))
            .build()
            .await
            .unwrap(),
    );
    let laptop = api.sign_up("alice").await;
    let phone = api.log_in("alice").await;
    assert_ne!(laptop, phone);
    api.harness.mesh.next_request_id("phone-job");
    api.harness.mesh.script("phone-job", [StatusStep::processing()]);

    let (status, _) = api
        .form("/api/generate", &phone, &[Field::File("file", PNG_BYTES)])
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, body) = api
        .json(Method::POST, "/api/auth/logout", Some(&laptop), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled_jobs"], 0);
    assert!(!api.jobs.get("phone-job").unwrap().state().is_terminal());

    let (status, _) = api.json(Method::GET, "/api/auth/me", Some(&phone), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, job) = api
        .json(Method::GET, "/api/jobs/phone-job", Some(&phone), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(job["state"], "cancelled");

    let (_, body) = api
        .json(Method::POST, "/api/auth/logout", Some(&phone), None)
        .await;
    assert_eq!(body["cancelled_jobs"], 1);
    assert!(matches!(
        wait_until_terminal(&api.jobs, "phone-job").await,
        PollState::Cancelled { .. }
    ));
}

#[tokio::test]
async fn finished_jobs_are_forgotten_after_retention() {
    let api = Api::with_jobs(
        TestHarness::builder().build().await.unwrap(),
        JobTracker::with_retention(Duration::ZERO),
    );
    let alice = api.sign_up("alice").await;

    for i in 0..50 {
        let id = format!("job-{i}");
        api.harness.mesh.next_request_id(&id);
        api.harness
            .mesh
            .script(&id, [StatusStep::completed("/files/done.glb")]);
        let (status, _) = api
            .form("/api/generate?wait=true", &alice, &[Field::File("file", PNG_BYTES)])
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    assert_eq!(api.jobs.len(), 1);
    api.jobs.sweep();
    let (status, body) = api
        .json(Method::GET, "/api/jobs/job-49", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "job_not_found");

    let (_, records) = api.json(Method::GET, "/api/models?limit=100", Some(&alice), None).await;
    assert_eq!(records.as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn create_ignores_client_supplied_3d_model() {
    let api = Api::new().await;
    let alice = api.sign_up("alice").await;

    let (status, record) = api
        .json(
            Method::POST,
            "/api/models",
            Some(&alice),
            Some(json!({
                "instructions": "a knight",
                "generated_3d_ref": "/files/forged.glb",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(record["generated_3d_ref"].is_null());

    let (_, stored) = api
        .json(Method::GET, &format!("/api/models/{}", record["id"]), Some(&alice), None)
        .await;
    assert!(stored["generated_3d_ref"].is_null());
    assert_eq!(stored["instructions"], "a knight");
}

#[tokio::test]
async fn generate_3d_prefers_the_2d_figure() {
    let api = Api::new().await;
    let alice = api.sign_up("alice").await;
    let figure: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0xAB, 0xCD];
    api.harness.images.push_image(figure, "image/png");

    let (_, record) = api
        .json(Method::POST, "/api/models", Some(&alice), Some(json!({})))
        .await;
    let record_id = record["id"].to_string();

    let (status, _) = api
        .json(
            Method::POST,
            &format!("/api/models/{record_id}/generate-3d"),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    api.form(
        "/api/generate-2d",
        &alice,
        &[
            Field::Text("instructions", "a knight"),
            Field::Text("record_id", &record_id),
        ],
    )
    .await;

    api.harness.mesh.next_request_id("from-2d");
    api.harness
        .mesh
        .script("from-2d", [StatusStep::completed("/files/from-2d.glb")]);
    let (status, body) = api
        .json(
            Method::POST,
            &format!("/api/models/{record_id}/generate-3d?wait=true"),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["record"]["generated_3d_ref"], "/files/from-2d.glb");
    assert_eq!(api.harness.mesh.submitted_images(), vec![figure.to_vec()]);
}
