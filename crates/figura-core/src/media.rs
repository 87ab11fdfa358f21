// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raster image sniffing shared by uploads and generator clients.

use image::ImageFormat;

use crate::error::FiguraError;

/// File extension and MIME type of a recognized raster image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageKind {
    pub extension: &'static str,
    pub mime_type: &'static str,
}

/// Identifies the raster format of `bytes` from its magic number.
///
/// PNG, JPEG, WebP, GIF and BMP are accepted; anything else fails with
/// [`FiguraError::InvalidInput`].
pub fn sniff_image(bytes: &[u8]) -> Result<ImageKind, FiguraError> {
    if bytes.is_empty() {
        return Err(FiguraError::InvalidInput("image is empty".to_string()));
    }

    let format = image::guess_format(bytes)
        .map_err(|_| FiguraError::InvalidInput("unrecognized image data".to_string()))?;

    let (extension, mime_type) = match format {
        ImageFormat::Png => ("png", "image/png"),
        ImageFormat::Jpeg => ("jpg", "image/jpeg"),
        ImageFormat::WebP => ("webp", "image/webp"),
        ImageFormat::Gif => ("gif", "image/gif"),
        ImageFormat::Bmp => ("bmp", "image/bmp"),
        other => {
            return Err(FiguraError::InvalidInput(format!(
                "unsupported image format {other:?}"
            )));
        }
    };

    Ok(ImageKind {
        extension,
        mime_type,
    })
}

/// Maps an image MIME type to a file extension, defaulting to `png`.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.split(';').next().map(str::trim) {
        Some("image/jpeg") | Some("image/jpg") => "jpg",
        Some("image/webp") => "webp",
        Some("image/gif") => "gif",
        Some("image/bmp") => "bmp",
        _ => "png",
    }
}
