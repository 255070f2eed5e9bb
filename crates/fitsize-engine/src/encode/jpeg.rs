// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JPEG candidate encoder built on the `image` crate's baseline JPEG encoder.
//
// Alpha is composited onto a solid background (JPEG has no transparency),
// grayscale stays single-channel, and the flattened, resampled pixels are
// cached as a surface so quality-only steps skip the resize.

use fitsize_core::config::{EncoderConfig, ResampleFilter};
use fitsize_core::error::{FitsizeError, Result};
use fitsize_core::types::{Candidate, RasterId};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
use tracing::{debug, instrument};

use super::{CandidateEncoder, check_parameters};
use crate::raster::RasterSource;

/// Flattened, resampled pixels for one raster at one output size.
struct Surface {
    raster: RasterId,
    /// `ImageLuma8` or `ImageRgb8`.
    pixels: DynamicImage,
}

impl Surface {
    fn matches(&self, raster: RasterId, width: u32, height: u32) -> bool {
        self.raster == raster && self.pixels.width() == width && self.pixels.height() == height
    }
}

/// Production [`CandidateEncoder`] producing baseline JPEG.
pub struct JpegCandidateEncoder {
    config: EncoderConfig,
    surface: Option<Surface>,
}

impl Default for JpegCandidateEncoder {
    fn default() -> Self {
        Self::new(EncoderConfig::default())
    }
}

impl JpegCandidateEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            surface: None,
        }
    }

    /// Return the cached surface for `raster` at `width x height`, rendering
    /// a new one if the cache belongs to another raster or size.
    fn surface_for(&mut self, raster: &RasterSource, width: u32, height: u32) -> &DynamicImage {
        let surface = match self.surface.take() {
            Some(surface) if surface.matches(raster.id(), width, height) => surface,
            _ => {
                let flattened = flatten(raster.pixels(), self.config.background);
                let pixels = if (width, height) == (flattened.width(), flattened.height()) {
                    flattened
                } else {
                    flattened.resize_exact(width, height, filter_type(self.config.filter))
                };
                debug!(width, height, "Rendered encode surface");
                Surface {
                    raster: raster.id(),
                    pixels,
                }
            }
        };
        &self.surface.insert(surface).pixels
    }
}

impl CandidateEncoder for JpegCandidateEncoder {
    fn format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    #[instrument(skip(self, raster), fields(raster = %raster.id()))]
    fn encode(&mut self, raster: &RasterSource, scale: f64, quality: f64) -> Result<Candidate> {
        check_parameters(scale, quality)?;
        let (width, height) = raster.scaled_dimensions(scale);
        let codec_quality = codec_quality(quality);

        let pixels = self.surface_for(raster, width, height);
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, codec_quality);
        pixels.write_with_encoder(encoder).map_err(|err| {
            FitsizeError::Encode(format!("JPEG encoding failed: {}", err))
        })?;

        debug!(codec_quality, size = buffer.len(), "JPEG candidate encoded");
        Ok(Candidate {
            bytes: buffer,
            quality,
            scale,
            width,
            height,
        })
    }
}

/// Map a normalised quality onto the codec's 1-100 scale.
fn codec_quality(quality: f64) -> u8 {
    ((quality * 100.0).round() as u8).clamp(1, 100)
}

fn filter_type(filter: ResampleFilter) -> FilterType {
    match filter {
        ResampleFilter::Nearest => FilterType::Nearest,
        ResampleFilter::Triangle => FilterType::Triangle,
        ResampleFilter::CatmullRom => FilterType::CatmullRom,
        ResampleFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Composite the image onto `background`, dropping the alpha channel.
/// Opaque grayscale comes back as 8-bit luma, everything else as RGB.
fn flatten(image: &DynamicImage, background: [u8; 3]) -> DynamicImage {
    let color = image.color();
    if !color.has_alpha() {
        return if color.has_color() {
            DynamicImage::ImageRgb8(image.to_rgb8())
        } else {
            DynamicImage::ImageLuma8(image.to_luma8())
        };
    }

    let rgba = image.to_rgba8();
    let [back_r, back_g, back_b] = background;
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let blend = |channel: u8, back: u8| -> u8 {
            let alpha = a as u32;
            ((channel as u32 * alpha + back as u32 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([blend(r, back_r), blend(g, back_g), blend(b, back_b)])
    }))
}
