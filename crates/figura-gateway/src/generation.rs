// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation endpoints: 2D figures, 3D jobs and job tracking.
//!
//! A 3D request stores its input, submits it once, creates or reuses a
//! registry record, and hands the job to a background poller. With
//! `?wait=true` the handler awaits that poller and answers with the
//! reconciled record; otherwise it answers 202 straight away and progress
//! is read from `/api/jobs/{request_id}`.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use figura_core::media::sniff_image;
use figura_core::types::{ArtifactKind, ArtifactRef, GenerationRecord, NewGenerationRecord, RecordId};
use figura_core::FiguraError;
use figura_meshgen::RecordReconciler;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::jobs::{JobView, TrackedJob};
use crate::server::GatewayState;

/// Fields accepted by the multipart generation endpoints.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<Vec<u8>>,
    pub instructions: Option<String>,
    pub record_id: Option<RecordId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WaitQuery {
    #[serde(default)]
    pub wait: bool,
}

/// Response body for POST /api/generate-2d.
#[derive(Debug, Serialize)]
pub struct Generate2dResponse {
    pub image_url: ArtifactRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<GenerationRecord>,
}

/// Response body for 3D generation requests.
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub record: GenerationRecord,
    pub job: JobView,
}

/// Reads the known fields of a multipart body. Empty file parts count as
/// absent; unknown fields are skipped.
pub async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.file = Some(bytes.to_vec());
                }
            }
            "instructions" => form.instructions = Some(field.text().await?),
            "record_id" => {
                let raw = field.text().await?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    let id = raw.parse::<i64>().map_err(|_| {
                        FiguraError::InvalidInput(format!("record_id `{raw}` is not an integer"))
                    })?;
                    form.record_id = Some(RecordId(id));
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }
    Ok(form)
}

/// POST /api/generate-2d
///
/// Generates a figure from `instructions` and an optional reference `file`.
/// With `record_id`, the result is attached to that record.
pub async fn generate_2d(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    multipart: Multipart,
) -> Result<Json<Generate2dResponse>, ApiError> {
    let form = read_form(multipart).await?;
    if let Some(id) = form.record_id {
        // Fail on foreign or missing records before spending a generation.
        state.storage.get_record(caller.user_id(), id).await?;
    }

    let artifact = figura_imagegen::generate_2d(
        state.images.as_ref(),
        state.artifacts.as_ref(),
        &state.image_config,
        form.instructions.as_deref(),
        form.file.as_deref(),
    )
    .await?;

    let record = match form.record_id {
        Some(id) => Some(
            state
                .storage
                .attach_generated_2d(caller.user_id(), id, &artifact)
                .await?,
        ),
        None => None,
    };
    Ok(Json(Generate2dResponse {
        image_url: artifact,
        record,
    }))
}

/// POST /api/generate
///
/// Stores the uploaded image, submits it, records it and starts polling.
/// The stored upload is removed again when the submission is rejected.
pub async fn generate(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<WaitQuery>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_form(multipart).await?;
    let image = form
        .file
        .ok_or_else(|| FiguraError::InvalidInput("an image file is required".into()))?;
    let kind = sniff_image(&image)?;

    let reference = state
        .artifacts
        .put(ArtifactKind::Reference, &image, kind.extension)
        .await?;

    let receipt = match state.meshes.submit(&image).await {
        Ok(receipt) => receipt,
        Err(e) => {
            if let Err(cleanup) = state.artifacts.delete(&reference).await {
                warn!(artifact = %reference, error = %cleanup, "failed to remove rejected upload");
            }
            return Err(e.into());
        }
    };

    let instructions = form
        .instructions
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let record = state
        .storage
        .create_record(
            caller.user_id(),
            &NewGenerationRecord {
                instructions,
                reference_image_ref: Some(reference),
                ..NewGenerationRecord::default()
            },
        )
        .await?;

    info!(
        request_id = %receipt.request_id,
        record_id = %record.id,
        status = %receipt.status,
        "3D job accepted"
    );
    track(&state, &caller, record, receipt.request_id, query.wait).await
}

/// POST /api/models/{id}/generate-3d
///
/// Converts the record's 2D figure, or its reference image when no figure
/// exists yet.
pub async fn generate_3d_from_record(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<RecordId>,
    Query(query): Query<WaitQuery>,
) -> Result<Response, ApiError> {
    let record = state.storage.get_record(caller.user_id(), id).await?;
    let source = record
        .generated_2d_ref
        .clone()
        .or_else(|| record.reference_image_ref.clone())
        .ok_or_else(|| {
            FiguraError::InvalidInput(format!("record {id} has no image to convert"))
        })?;

    let image = state.artifacts.get(&source).await?;
    let receipt = state.meshes.submit(&image).await?;
    info!(
        request_id = %receipt.request_id,
        record_id = %record.id,
        source = %source,
        "3D job accepted"
    );
    track(&state, &caller, record, receipt.request_id, query.wait).await
}

async fn track(
    state: &GatewayState,
    caller: &Caller,
    record: GenerationRecord,
    request_id: String,
    wait: bool,
) -> Result<Response, ApiError> {
    let mut reconciler = RecordReconciler::new(state.storage.clone(), record.id);
    if state.mirror_artifacts {
        reconciler = reconciler.with_mirror(state.meshes.clone(), state.artifacts.clone());
    }

    let (view, handle) = state.jobs.start(
        &state.poller,
        request_id,
        caller.user_id(),
        &caller.session(),
        Some(record.id),
        Box::new(reconciler),
        &state.shutdown,
    );

    if !wait {
        return Ok((StatusCode::ACCEPTED, Json(GenerationResponse { record, job: view }))
            .into_response());
    }

    let outcome = handle
        .await
        .map_err(|e| FiguraError::Internal(format!("poller task failed: {e}")))??;
    let record = state.storage.get_record(caller.user_id(), record.id).await?;
    let job = state
        .jobs
        .get(&outcome.request_id)
        .map(|job| job.view())
        .unwrap_or(view);
    Ok((StatusCode::CREATED, Json(GenerationResponse { record, job })).into_response())
}

fn owned_job(state: &GatewayState, caller: &Caller, request_id: &str) -> Result<TrackedJob, ApiError> {
    let job = state
        .jobs
        .get(request_id)
        .ok_or_else(|| FiguraError::JobNotFound {
            request_id: request_id.to_string(),
        })?;
    if job.owner != caller.user_id() {
        return Err(FiguraError::Forbidden(format!("job {request_id} belongs to another user")).into());
    }
    Ok(job)
}

/// GET /api/jobs/{request_id}
pub async fn get_job(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(request_id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    Ok(Json(owned_job(&state, &caller, &request_id)?.view()))
}

/// DELETE /api/jobs/{request_id}
///
/// Stops local polling only. The answer may still show the last
/// non-terminal state if the poller has not observed the cancellation yet.
pub async fn cancel_job(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(request_id): Path<String>,
) -> Result<(StatusCode, Json<JobView>), ApiError> {
    let job = owned_job(&state, &caller, &request_id)?;
    job.cancel();
    info!(request_id = %request_id, "polling cancelled by caller");
    Ok((StatusCode::ACCEPTED, Json(job.view())))
}
