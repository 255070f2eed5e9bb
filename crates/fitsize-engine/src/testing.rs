// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test fixtures: synthetic images and a deterministic size-model encoder.

use std::io::Cursor;

use fitsize_core::error::{FitsizeError, Result};
use fitsize_core::types::Candidate;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::encode::{CandidateEncoder, check_parameters};
use crate::raster::RasterSource;

/// Smooth RGB gradient.
pub(crate) fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

/// Gradient with deterministic pseudo-random noise, so JPEG size reacts
/// clearly to quality and scale.
pub(crate) fn textured_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let mut h = x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA77);
        h ^= h >> 15;
        h = h.wrapping_mul(0x2C1B_3C6D);
        h ^= h >> 12;
        let noise = (h & 0x3F) as u8;
        Rgb([
            ((x * 191 / width.max(1)) as u8).wrapping_add(noise),
            ((y * 191 / height.max(1)) as u8).wrapping_add(noise / 2),
            (h >> 8) as u8,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

pub(crate) fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

/// Fixed container overhead every synthetic candidate carries.
const HEADER_BYTES: f64 = 600.0;

/// Encoder whose output size follows a closed-form model:
/// `HEADER + pixels * coefficient * curve(quality)`.
///
/// The bytes are zeros; only their length matters to the search.
pub(crate) struct SyntheticEncoder {
    coefficient: f64,
    curve: fn(f64) -> f64,
    pub calls: u32,
    fail_on_call: Option<u32>,
    on_call: Option<Box<dyn FnMut(u32)>>,
}

impl SyntheticEncoder {
    /// Calibrated so a `width x height` raster at `(scale 1, quality 0.92)`
    /// encodes to `baseline` bytes.
    pub fn calibrated(width: u32, height: u32, baseline: u64, curve: fn(f64) -> f64) -> Self {
        let coefficient =
            (baseline as f64 - HEADER_BYTES) / (width as f64 * height as f64 * curve(0.92));
        Self {
            coefficient,
            curve,
            calls: 0,
            fail_on_call: None,
            on_call: None,
        }
    }

    /// Quality matters, but less than pixel count: the floor alone can't
    /// reach aggressive targets.
    pub fn quadratic(width: u32, height: u32, baseline: u64) -> Self {
        Self::calibrated(width, height, baseline, |q| 0.2 + q * q)
    }

    /// Quality dominates: fixed ±steps can bracket the band and oscillate.
    pub fn cubic(width: u32, height: u32, baseline: u64) -> Self {
        Self::calibrated(width, height, baseline, |q| 0.1 + 2.5 * q * q * q)
    }

    /// Fail the `call`-th encode (1-based).
    pub fn failing_on(mut self, call: u32) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Run `hook` with the call number before every encode.
    pub fn on_call(mut self, hook: impl FnMut(u32) + 'static) -> Self {
        self.on_call = Some(Box::new(hook));
        self
    }

    pub fn size_at(&self, width: u32, height: u32, quality: f64) -> u64 {
        let pixels = (width as u64 * height as u64) as f64;
        (HEADER_BYTES + pixels * self.coefficient * (self.curve)(quality)) as u64
    }
}

impl CandidateEncoder for SyntheticEncoder {
    fn format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    fn encode(&mut self, raster: &RasterSource, scale: f64, quality: f64) -> Result<Candidate> {
        check_parameters(scale, quality)?;
        self.calls += 1;
        if let Some(hook) = self.on_call.as_mut() {
            hook(self.calls);
        }
        if self.fail_on_call == Some(self.calls) {
            return Err(FitsizeError::Encode("synthetic encoder failure".into()));
        }

        let (width, height) = raster.scaled_dimensions(scale);
        let size = self.size_at(width, height, quality);
        Ok(Candidate {
            bytes: vec![0u8; size as usize],
            quality,
            scale,
            width,
            height,
        })
    }
}
