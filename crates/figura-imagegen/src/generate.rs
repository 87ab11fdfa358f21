// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The 2D generation step: prompt composition, generation, and storage.

use figura_config::model::ImageConfig;
use figura_core::media::{extension_for_mime, sniff_image};
use figura_core::types::{ArtifactKind, ArtifactRef, ImagePayload, ImageRequest};
use figura_core::{ArtifactStore, FiguraError, ImageGenerator};
use tracing::info;

/// Picks the instruction text for a request.
///
/// Blank instructions are only allowed alongside a reference image, in which
/// case the configured default instruction is used.
pub fn resolve_instructions(
    config: &ImageConfig,
    instructions: Option<&str>,
    has_reference: bool,
) -> Result<String, FiguraError> {
    match instructions.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => Ok(text.to_string()),
        None if has_reference => Ok(config.default_instruction.clone()),
        None => Err(FiguraError::InvalidInput(
            "instructions are required when no reference image is supplied".to_string(),
        )),
    }
}

pub fn build_prompt(system_prompt: &str, instructions: &str) -> String {
    format!("{}\n\nUser Request: {instructions}", system_prompt.trim())
}

/// Generates a stylized figure and stores it under the `2d` kind.
pub async fn generate_2d(
    generator: &dyn ImageGenerator,
    artifacts: &dyn ArtifactStore,
    config: &ImageConfig,
    instructions: Option<&str>,
    reference: Option<&[u8]>,
) -> Result<ArtifactRef, FiguraError> {
    let instructions = resolve_instructions(config, instructions, reference.is_some())?;

    let reference = match reference {
        Some(bytes) => {
            let kind = sniff_image(bytes)?;
            Some(ImagePayload {
                bytes: bytes.to_vec(),
                mime_type: kind.mime_type.to_string(),
            })
        }
        None => None,
    };

    let payload = generator
        .generate(ImageRequest {
            prompt: build_prompt(&config.system_prompt, &instructions),
            reference,
        })
        .await?;

    let extension = match sniff_image(&payload.bytes) {
        Ok(kind) => kind.extension,
        Err(_) => extension_for_mime(&payload.mime_type),
    };
    let artifact = artifacts
        .put(ArtifactKind::Generated2d, &payload.bytes, extension)
        .await?;
    info!(artifact = %artifact, bytes = payload.bytes.len(), "2D figure stored");
    Ok(artifact)
}
