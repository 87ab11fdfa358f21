// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Figura integration tests.
//!
//! Provides scripted generators and a harness over a temporary registry so
//! the whole generation pipeline can run without external services.
//!
//! # Components
//!
//! - [`ScriptedMeshGenerator`] - 3D service double driven by per-job status scripts
//! - [`MockImageGenerator`] - 2D generator double returning canned images
//! - [`InstantSleeper`] - records requested sleeps without waiting
//! - [`TestHarness`] - temp SQLite registry, artifact root, accounts and doubles

pub mod harness;
pub mod mock_generators;
pub mod sleeper;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_generators::{MockImageGenerator, ScriptedMeshGenerator, StatusStep};
pub use sleeper::InstantSleeper;

/// Smallest byte string recognized as a PNG.
pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
];

/// Smallest byte string recognized as a JPEG.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
