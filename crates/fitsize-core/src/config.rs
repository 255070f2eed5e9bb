// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Search and encoder configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FitsizeError, Result};
use crate::types::{QualityBounds, ToleranceBand};

/// Tuning constants for the target-size search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Hard cap on encode calls per search (default 20).
    pub max_iterations: u32,
    /// Quality never leaves this range.
    pub quality: QualityBounds,
    /// Quality of the first probe (default 0.92).
    pub initial_quality: f64,
    /// Raise applied while under the band (default 0.05).
    pub quality_step_up: f64,
    /// Drop applied while over the target (default 0.1).
    pub quality_step_down: f64,
    /// Quality restored after each scale shrink (default 0.8).
    pub reset_quality: f64,
    /// Multiplier applied to scale once quality bottoms out (default 0.9).
    pub scale_shrink_factor: f64,
    /// The search stops instead of shrinking below this scale.
    pub min_scale: f64,
    /// Wall-clock budget in milliseconds, checked after every iteration.
    pub time_budget_ms: Option<u64>,
    /// Stop when the next `(quality, scale)` pair was already probed.
    pub stop_on_cycle: bool,
    /// Return the source bytes untouched when they are already in the output
    /// format and fit. Off by default, so every input is re-encoded at the
    /// search's own qualities.
    pub keep_source_if_under_target: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            quality: QualityBounds::default(),
            initial_quality: 0.92,
            quality_step_up: 0.05,
            quality_step_down: 0.1,
            reset_quality: 0.8,
            scale_shrink_factor: 0.9,
            min_scale: 0.01,
            time_budget_ms: None,
            stop_on_cycle: true,
            keep_source_if_under_target: false,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        self.quality.validate()?;

        if self.max_iterations == 0 {
            return Err(invalid("max_iterations must be at least 1"));
        }
        if !self.quality.contains(self.initial_quality) {
            return Err(invalid(format!(
                "initial_quality {} is outside [{}, {}]",
                self.initial_quality, self.quality.min, self.quality.max
            )));
        }
        if !self.quality.contains(self.reset_quality) {
            return Err(invalid(format!(
                "reset_quality {} is outside [{}, {}]",
                self.reset_quality, self.quality.min, self.quality.max
            )));
        }
        if !(self.quality_step_up > 0.0 && self.quality_step_up <= 1.0) {
            return Err(invalid("quality_step_up must be in (0, 1]"));
        }
        if !(self.quality_step_down > 0.0 && self.quality_step_down <= 1.0) {
            return Err(invalid("quality_step_down must be in (0, 1]"));
        }
        if !(self.scale_shrink_factor > 0.0 && self.scale_shrink_factor < 1.0) {
            return Err(invalid("scale_shrink_factor must be in (0, 1)"));
        }
        if !(self.min_scale > 0.0 && self.min_scale <= 1.0) {
            return Err(invalid("min_scale must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Resampling filter used when the raster is scaled down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    #[default]
    Lanczos3,
}

/// Settings for the production JPEG candidate encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub filter: ResampleFilter,
    /// RGB colour transparent pixels are composited onto.
    pub background: [u8; 3],
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            filter: ResampleFilter::default(),
            background: [255, 255, 255],
        }
    }
}

/// Everything a front end needs to run a search, loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitsizeConfig {
    pub tolerance: ToleranceBand,
    pub search: SearchConfig,
    pub encoder: EncoderConfig,
}

impl FitsizeConfig {
    /// Load a configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.tolerance.validate()?;
        self.search.validate()
    }
}

fn invalid(detail: impl Into<String>) -> FitsizeError {
    FitsizeError::InvalidConfig(detail.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = FitsizeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.max_iterations, 20);
        assert_eq!(config.search.quality, QualityBounds { min: 0.3, max: 0.95 });
        assert_eq!(config.tolerance, ToleranceBand { low: 0.9, high: 1.0 });
        assert!(!config.search.keep_source_if_under_target);
    }

    #[test]
    fn rejects_out_of_range_constants() {
        let mut config = SearchConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FitsizeError::InvalidConfig(_))
        ));

        config.max_iterations = 20;
        config.scale_shrink_factor = 1.0;
        assert!(config.validate().is_err());

        config.scale_shrink_factor = 0.9;
        config.initial_quality = 0.99;
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "search": {{ "max_iterations": 8, "time_budget_ms": 500 }}, "encoder": {{ "filter": "catmull-rom" }} }}"#
        )
        .unwrap();

        let config = FitsizeConfig::load(file.path()).unwrap();
        assert_eq!(config.search.max_iterations, 8);
        assert_eq!(config.search.time_budget_ms, Some(500));
        assert_eq!(config.search.initial_quality, 0.92);
        assert_eq!(config.encoder.filter, ResampleFilter::CatmullRom);
        assert_eq!(config.encoder.background, [255, 255, 255]);
    }

    #[test]
    fn load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "tolerance": {{ "low": 0.95, "high": 0.5 }} }}"#).unwrap();
        assert!(matches!(
            FitsizeConfig::load(file.path()),
            Err(FitsizeError::InvalidTarget(_))
        ));
    }

    #[test]
    fn load_reports_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            FitsizeConfig::load(file.path()),
            Err(FitsizeError::Serialization(_))
        ));
    }
}
