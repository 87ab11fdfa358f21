// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image generator trait for the synchronous 2D model.

use async_trait::async_trait;

use crate::error::FiguraError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ImagePayload, ImageRequest};

/// Adapter for a text(+image)-to-image model.
///
/// The call blocks until the model answers; there is no polling and no
/// internal retry. Failures are [`FiguraError::Generation`].
#[async_trait]
pub trait ImageGenerator: PluginAdapter {
    async fn generate(&self, request: ImageRequest) -> Result<ImagePayload, FiguraError>;
}
