// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster source — the decoded image a search compresses. Built once per
// request from a file, an encoded buffer, or an already-decoded image, and
// never mutated afterwards.

use std::path::Path;

use fitsize_core::error::{FitsizeError, Result};
use fitsize_core::types::RasterId;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, info, instrument};

/// The encoded bytes a raster was decoded from, kept so a search can hand
/// them back untouched when they already fit.
#[derive(Debug, Clone)]
pub struct EncodedInput {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

/// An immutable decoded image with fixed dimensions.
///
/// ```ignore
/// let raster = RasterSource::open("photo.png")?;
/// let (w, h) = raster.scaled_dimensions(0.5);
/// ```
pub struct RasterSource {
    id: RasterId,
    image: DynamicImage,
    encoded: Option<EncodedInput>,
}

impl RasterSource {
    // -- Construction ---------------------------------------------------------

    /// Read and decode an image file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        let raster = Self::from_bytes(data)?;
        info!(
            width = raster.width(),
            height = raster.height(),
            "Image loaded"
        );
        Ok(raster)
    }

    /// Decode an encoded image (JPEG, PNG, WebP, ...). The format is sniffed
    /// from the content, not taken from a file name.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = image::guess_format(&data)
            .map_err(|err| FitsizeError::Decode(format!("unrecognised image data: {err}")))?;
        let image = image::load_from_memory_with_format(&data, format)
            .map_err(|err| FitsizeError::Decode(format!("failed to decode {format:?}: {err}")))?;
        ensure_not_empty(&image)?;

        debug!(
            width = image.width(),
            height = image.height(),
            ?format,
            "Image decoded from bytes"
        );
        Ok(Self {
            id: RasterId::new(),
            image,
            encoded: Some(EncodedInput {
                format,
                bytes: data,
            }),
        })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        ensure_not_empty(&image)?;
        Ok(Self {
            id: RasterId::new(),
            image,
            encoded: None,
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn id(&self) -> RasterId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the decoded pixels.
    pub fn pixels(&self) -> &DynamicImage {
        &self.image
    }

    /// The bytes this raster was decoded from, if it came from encoded data.
    pub fn encoded_input(&self) -> Option<&EncodedInput> {
        self.encoded.as_ref()
    }

    /// Output dimensions at `scale`: `round(w * scale) x round(h * scale)`,
    /// never less than one pixel per side.
    pub fn scaled_dimensions(&self, scale: f64) -> (u32, u32) {
        (
            scale_dimension(self.width(), scale),
            scale_dimension(self.height(), scale),
        )
    }
}

impl std::fmt::Debug for RasterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSource")
            .field("id", &self.id)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("encoded_format", &self.encoded.as_ref().map(|e| e.format))
            .finish()
    }
}

fn scale_dimension(pixels: u32, scale: f64) -> u32 {
    ((pixels as f64 * scale).round() as u32).max(1)
}

fn ensure_not_empty(image: &DynamicImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(FitsizeError::Decode(format!(
            "image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}
