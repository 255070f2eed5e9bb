// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Fitsize.

use thiserror::Error;

/// Top-level error type for all Fitsize operations.
///
/// Missing the target size is not an error: a search that runs out of budget
/// still returns its best candidate, marked `TerminalState::Exhausted`.
#[derive(Debug, Error)]
pub enum FitsizeError {
    // -- Request validation --
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Image errors --
    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("candidate encode failed: {0}")]
    Encode(String),

    // -- Search control --
    #[error("search cancelled after {iterations} iteration(s)")]
    Cancelled { iterations: u32 },

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FitsizeError>;
