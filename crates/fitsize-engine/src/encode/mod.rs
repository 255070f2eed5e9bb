// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Encode module — the capability a search uses to turn a raster into a
// candidate at a given quality and scale.

pub mod jpeg;

use fitsize_core::error::{FitsizeError, Result};
use fitsize_core::types::Candidate;
use image::ImageFormat;

use crate::raster::RasterSource;

pub use jpeg::JpegCandidateEncoder;

/// Produces encoded candidates from a raster.
///
/// Implementations may keep a reusable rendering surface between calls, which
/// is why `encode` takes `&mut self`: one encoder serves one search at a time.
/// Smaller `quality` or `scale` should usually give smaller output, but the
/// search does not rely on it.
pub trait CandidateEncoder {
    /// Container format of the bytes this encoder produces.
    fn format(&self) -> ImageFormat;

    /// Encode `raster` resampled to `round(w * scale) x round(h * scale)` at
    /// `quality` (`scale` in `(0, 1]`, `quality` in `[0, 1]`).
    fn encode(&mut self, raster: &RasterSource, scale: f64, quality: f64) -> Result<Candidate>;
}

impl<E: CandidateEncoder + ?Sized> CandidateEncoder for &mut E {
    fn format(&self) -> ImageFormat {
        (**self).format()
    }

    fn encode(&mut self, raster: &RasterSource, scale: f64, quality: f64) -> Result<Candidate> {
        (**self).encode(raster, scale, quality)
    }
}

impl<E: CandidateEncoder + ?Sized> CandidateEncoder for Box<E> {
    fn format(&self) -> ImageFormat {
        (**self).format()
    }

    fn encode(&mut self, raster: &RasterSource, scale: f64, quality: f64) -> Result<Candidate> {
        (**self).encode(raster, scale, quality)
    }
}

/// Reject parameters outside the encoder contract.
pub fn check_parameters(scale: f64, quality: f64) -> Result<()> {
    if !(scale > 0.0 && scale <= 1.0) {
        return Err(FitsizeError::Encode(format!(
            "scale {scale} is outside (0, 1]"
        )));
    }
    if !(0.0..=1.0).contains(&quality) {
        return Err(FitsizeError::Encode(format!(
            "quality {quality} is outside [0, 1]"
        )));
    }
    Ok(())
}
