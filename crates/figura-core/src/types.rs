// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Figura service.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a generation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable, addressable reference to a stored artifact (path or URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(pub String);

impl ArtifactRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ArtifactRef {
    fn from(value: String) -> Self {
        ArtifactRef(value)
    }
}

/// Category of stored artifact. Determines the sub-directory in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Images uploaded by users as generation input.
    #[strum(serialize = "references")]
    #[serde(rename = "references")]
    Reference,
    /// Stylized figures produced by the 2D image model.
    #[strum(serialize = "2d")]
    #[serde(rename = "2d")]
    Generated2d,
    /// Meshes mirrored from the 3D generation service.
    #[strum(serialize = "meshes")]
    #[serde(rename = "meshes")]
    Mesh,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    ArtifactStore,
    ImageGenerator,
    MeshGenerator,
    Auth,
}

// --- Users and authentication ---

/// A registered user as exposed through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

/// A user row together with its stored password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// A bearer token presented by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
}

/// The identity a valid token resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub user_id: UserId,
    pub username: String,
}

/// A freshly issued bearer token. The plaintext is only ever returned here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    /// ISO 8601 expiry timestamp.
    pub expires_at: String,
}

// --- Generation records ---

/// A user's generation session: instructions plus the artifacts produced for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: RecordId,
    pub owner: UserId,
    pub instructions: Option<String>,
    pub reference_image_ref: Option<ArtifactRef>,
    pub generated_2d_ref: Option<ArtifactRef>,
    pub generated_3d_ref: Option<ArtifactRef>,
    pub is_public: bool,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

/// Fields accepted when creating a record. `owner` and `created_at` are
/// assigned by the registry. New records start without a 3D model; any
/// `generated_3d_ref` in the request body is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGenerationRecord {
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub reference_image_ref: Option<ArtifactRef>,
    #[serde(default)]
    pub generated_2d_ref: Option<ArtifactRef>,
    #[serde(default)]
    pub is_public: bool,
}

/// Partial update of a record. `None` leaves the stored value unchanged.
///
/// There is no `generated_3d_ref`: only job reconciliation writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub reference_image_ref: Option<ArtifactRef>,
    #[serde(default)]
    pub generated_2d_ref: Option<ArtifactRef>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl RecordUpdate {
    pub fn is_empty(&self) -> bool {
        self.instructions.is_none()
            && self.reference_image_ref.is_none()
            && self.generated_2d_ref.is_none()
            && self.is_public.is_none()
    }
}

/// A record listed in the public gallery, with its owner's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicRecord {
    #[serde(flatten)]
    pub record: GenerationRecord,
    pub owner_username: String,
}

/// Offset pagination for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_page_limit")]
    pub limit: u32,
}

/// Upper bound applied to any requested page size.
pub const MAX_PAGE_LIMIT: u32 = 500;

fn default_page_limit() -> u32 {
    100
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_page_limit(),
        }
    }
}

impl Page {
    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }

    /// The limit clamped to [`MAX_PAGE_LIMIT`].
    pub fn effective_limit(&self) -> u32 {
        self.limit.min(MAX_PAGE_LIMIT)
    }
}

// --- 3D generation jobs ---

/// Status of a job on the external 3D generation service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// `completed` and `error` are terminal on the service side.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Whether a submission answered with this status counts as accepted.
    pub fn is_accepted(self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Processing)
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReceipt {
    pub request_id: String,
    pub status: JobStatus,
}

/// A single status observation of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
}

impl JobStatusReport {
    pub fn queued() -> Self {
        Self::with_status(JobStatus::Queued)
    }

    pub fn processing() -> Self {
        Self::with_status(JobStatus::Processing)
    }

    pub fn completed(model_url: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Completed,
            message: None,
            model_url: Some(model_url.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Error,
            message: Some(message.into()),
            model_url: None,
        }
    }

    fn with_status(status: JobStatus) -> Self {
        Self {
            status,
            message: None,
            model_url: None,
        }
    }
}

// --- 2D generation ---

/// Raw image bytes with their MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// A request to the 2D image model. `prompt` is the final prompt text,
/// already combined with any system prompt.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub reference: Option<ImagePayload>,
}
