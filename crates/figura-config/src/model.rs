// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Figura service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Prompt prepended to every 2D generation request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert 3D character designer.
Generate a realistic, stylized action figure on a plain white background.
Do not include any packaging, boxes, or text. The background must be white/transparent, without any shadows, so that the image can easily be converted to a 3D model.
Ensure the figure is the main focus, clearly visible, and fully contained within the frame.
High quality, detailed, 3D render style.";

/// Instruction used when a reference image is supplied without any text.
pub const DEFAULT_INSTRUCTION: &str =
    "Turn the subject of the reference image into a stylized action figure.";

/// Top-level Figura configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FiguraConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Registry database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Artifact store settings.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Account and bearer token settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// 2D image model settings.
    #[serde(default)]
    pub image: ImageConfig,

    /// 3D generation service and poller settings.
    #[serde(default)]
    pub mesh: MeshConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body (uploads included), in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Allow cross-origin requests from any origin.
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,

    /// How long a finished 3D job stays readable at `/api/jobs/{id}`.
    #[serde(default = "default_job_retention_secs")]
    pub job_retention_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_permissive: default_cors_permissive(),
            job_retention_secs: default_job_retention_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_cors_permissive() -> bool {
    true
}

fn default_job_retention_secs() -> u64 {
    60 * 60
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("figura").join("figura.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("figura.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Artifact store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactsConfig {
    /// Directory holding uploaded and generated files.
    #[serde(default = "default_artifacts_root")]
    pub root: String,

    /// URL path prefix under which artifacts are served and referenced.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            root: default_artifacts_root(),
            public_prefix: default_public_prefix(),
        }
    }
}

fn default_artifacts_root() -> String {
    "uploads".to_string()
}

fn default_public_prefix() -> String {
    "/uploads".to_string()
}

/// Account and bearer token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Lifetime of issued bearer tokens, in minutes.
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: u64,

    /// Minimum accepted password length at registration.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Argon2id memory cost in KiB.
    #[serde(default = "default_password_memory_kib")]
    pub password_memory_kib: u32,

    /// Argon2id iteration count.
    #[serde(default = "default_password_iterations")]
    pub password_iterations: u32,

    /// Argon2id lane count.
    #[serde(default = "default_password_parallelism")]
    pub password_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: default_token_ttl_minutes(),
            min_password_length: default_min_password_length(),
            password_memory_kib: default_password_memory_kib(),
            password_iterations: default_password_iterations(),
            password_parallelism: default_password_parallelism(),
        }
    }
}

fn default_token_ttl_minutes() -> u64 {
    24 * 60
}

fn default_min_password_length() -> usize {
    8
}

fn default_password_memory_kib() -> u32 {
    19 * 1024
}

fn default_password_iterations() -> u32 {
    2
}

fn default_password_parallelism() -> u32 {
    1
}

/// 2D image model configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    /// API key for the image model. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the generative language API.
    #[serde(default = "default_image_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_image_model")]
    pub model: String,

    /// Prompt prepended to every user instruction.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Instruction substituted when only a reference image is supplied.
    #[serde(default = "default_instruction")]
    pub default_instruction: String,

    /// Request timeout, in seconds.
    #[serde(default = "default_image_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_image_base_url(),
            model: default_image_model(),
            system_prompt: default_system_prompt(),
            default_instruction: default_instruction(),
            timeout_secs: default_image_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ImageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_image_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_instruction() -> String {
    DEFAULT_INSTRUCTION.to_string()
}

fn default_image_timeout_secs() -> u64 {
    120
}

/// 3D generation service and status poller configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MeshConfig {
    /// Base URL of the model generator service.
    #[serde(default = "default_mesh_base_url")]
    pub base_url: String,

    /// Bearer token presented to the model generator service.
    #[serde(default)]
    pub token: Option<String>,

    /// Timeout for job submission, in seconds.
    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,

    /// Timeout for a single status query, in seconds.
    #[serde(default = "default_status_timeout_secs")]
    pub status_timeout_secs: u64,

    /// Fixed delay before every status poll, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Number of polls before a job is declared timed out.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Download completed meshes into the local artifact store.
    #[serde(default)]
    pub mirror_artifacts: bool,

    /// Optional prefix rewrite applied to reported model URLs.
    #[serde(default)]
    pub artifact_rewrite: Option<PrefixRewrite>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            base_url: default_mesh_base_url(),
            token: None,
            submit_timeout_secs: default_submit_timeout_secs(),
            status_timeout_secs: default_status_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_attempts: default_max_poll_attempts(),
            mirror_artifacts: false,
            artifact_rewrite: None,
        }
    }
}

impl std::fmt::Debug for MeshConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("submit_timeout_secs", &self.submit_timeout_secs)
            .field("status_timeout_secs", &self.status_timeout_secs)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("mirror_artifacts", &self.mirror_artifacts)
            .field("artifact_rewrite", &self.artifact_rewrite)
            .finish()
    }
}

fn default_mesh_base_url() -> String {
    "http://127.0.0.1:8001".to_string()
}

fn default_submit_timeout_secs() -> u64 {
    30
}

fn default_status_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_max_poll_attempts() -> u32 {
    60
}

/// Replaces a leading path prefix, e.g. `/static/` with `/output/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrefixRewrite {
    pub from: String,
    pub to: String,
}

impl PrefixRewrite {
    /// Applies the rewrite to `url` if it starts with `from`.
    pub fn apply(&self, url: &str) -> String {
        match url.strip_prefix(&self.from) {
            Some(rest) => format!("{}{rest}", self.to),
            None => url.to_string(),
        }
    }
}
