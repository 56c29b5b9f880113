// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Flachwerk.

use thiserror::Error;

/// Top-level error type for all flattening operations.
#[derive(Debug, Error)]
pub enum FlattenError {
    // -- Precondition violations (detected before any mutation) --
    #[error("art to be flattened references a linked mask")]
    HasLinkedMask,

    #[error("art to be flattened uses {count} distinct spot colors (limit is {limit})")]
    TooManySpots { count: usize, limit: usize },

    #[error("art set is empty")]
    EmptyArtSet,

    #[error("raster/vector balance {value} is outside 0..=100")]
    InvalidBalance { value: u16 },

    #[error("rasterization resolution {value} dpi is outside {min}..={max} dpi")]
    ResolutionOutOfRange { value: f64, min: f64, max: f64 },

    #[error("progress range start {start} exceeds end {end}")]
    InvalidProgressRange { start: f64, end: f64 },

    // -- Handle liveness --
    #[error("art object no longer exists")]
    ArtMissing,

    #[error("anchor object cannot contain children")]
    AnchorNotContainer,

    #[error("layer no longer exists")]
    LayerMissing,

    // -- Resource lifecycle --
    #[error("no temporary flattening layer exists")]
    NoTemporaryLayer,

    // -- Operational failures --
    #[error("flattening backend failed: {0}")]
    Backend(String),

    // -- Cancellation --
    #[error("flattening cancelled")]
    Cancelled,

    // -- Info channel --
    #[error("flattening info receiver failed: {0}")]
    Receiver(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FlattenError>;
