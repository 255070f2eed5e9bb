// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Fitsize compression engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FitsizeError, Result};

/// Unique identifier for a decoded raster.
///
/// Encoders use it to tell whether a cached rendering surface still belongs
/// to the raster they are asked to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RasterId(pub Uuid);

impl RasterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RasterId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RasterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Acceptable final size, as fractions `[low, high]` of the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceBand {
    pub low: f64,
    pub high: f64,
}

impl Default for ToleranceBand {
    fn default() -> Self {
        Self {
            low: 0.9,
            high: 1.0,
        }
    }
}

impl ToleranceBand {
    pub fn new(low: f64, high: f64) -> Result<Self> {
        let band = Self { low, high };
        band.validate()?;
        Ok(band)
    }

    /// Requires `0 < low <= high <= 1`.
    pub fn validate(&self) -> Result<()> {
        let ordered = self.low > 0.0 && self.low <= self.high && self.high <= 1.0;
        if !ordered || !self.low.is_finite() || !self.high.is_finite() {
            return Err(FitsizeError::InvalidTarget(format!(
                "tolerance band [{}, {}] must satisfy 0 < low <= high <= 1",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

/// Where an encoded size lands relative to a target's tolerance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fit {
    /// Under budget, but not tightly: quality could still be raised.
    Below,
    /// Inside the band.
    Within,
    /// Over budget.
    Above,
}

/// A validated byte budget. `target_bytes` is always positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSpec {
    target_bytes: u64,
    band: ToleranceBand,
}

impl TargetSpec {
    /// Target with the default `[0.9, 1.0]` band.
    pub fn new(target_bytes: u64) -> Result<Self> {
        Self::with_band(target_bytes, ToleranceBand::default())
    }

    pub fn with_band(target_bytes: u64, band: ToleranceBand) -> Result<Self> {
        if target_bytes == 0 {
            return Err(FitsizeError::InvalidTarget(
                "target size must be greater than zero bytes".into(),
            ));
        }
        band.validate()?;
        Ok(Self { target_bytes, band })
    }

    pub fn target_bytes(&self) -> u64 {
        self.target_bytes
    }

    pub fn band(&self) -> ToleranceBand {
        self.band
    }

    /// Smallest size considered a tight fit.
    pub fn lower_bound(&self) -> u64 {
        (self.target_bytes as f64 * self.band.low).ceil() as u64
    }

    /// Largest acceptable size.
    pub fn upper_bound(&self) -> u64 {
        (self.target_bytes as f64 * self.band.high).floor() as u64
    }

    pub fn classify(&self, size_bytes: u64) -> Fit {
        if size_bytes > self.upper_bound() {
            Fit::Above
        } else if size_bytes < self.lower_bound() {
            Fit::Below
        } else {
            Fit::Within
        }
    }
}

/// Allowed encode-quality range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for QualityBounds {
    fn default() -> Self {
        Self {
            min: 0.3,
            max: 0.95,
        }
    }
}

impl QualityBounds {
    pub fn validate(&self) -> Result<()> {
        let ordered = self.min > 0.0 && self.min <= self.max && self.max <= 1.0;
        if !ordered || !self.min.is_finite() || !self.max.is_finite() {
            return Err(FitsizeError::InvalidConfig(format!(
                "quality bounds [{}, {}] must satisfy 0 < min <= max <= 1",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, quality: f64) -> bool {
        quality >= self.min && quality <= self.max
    }

    pub fn clamp(&self, quality: f64) -> f64 {
        quality.clamp(self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// Candidates and outcomes
// ---------------------------------------------------------------------------

/// One encoded attempt at a specific `(quality, scale)` pair.
#[derive(Clone, PartialEq)]
pub struct Candidate {
    /// Encoded output, ready to be written out as-is.
    pub bytes: Vec<u8>,
    pub quality: f64,
    pub scale: f64,
    /// Pixel dimensions of the encoded output.
    pub width: u32,
    pub height: u32,
}

impl Candidate {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl std::fmt::Debug for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate")
            .field("size_bytes", &self.size_bytes())
            .field("quality", &self.quality)
            .field("scale", &self.scale)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// How a search ended, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    /// The returned candidate satisfies the target.
    Converged,
    /// Best effort: the search stopped before meeting the band.
    Exhausted,
}

/// The specific condition that stopped a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    /// Size landed inside the tolerance band.
    WithinBand,
    /// Under budget at maximum quality; nothing left to gain.
    QualityCeiling,
    /// The source bytes already fit and were returned untouched.
    AlreadyUnderTarget,
    IterationLimit,
    TimeBudget,
    /// The next parameter pair had already been probed.
    Cycle,
    /// Shrinking further would go below the minimum scale.
    ScaleFloor,
    /// The encoder failed after at least one candidate was produced.
    EncoderFailed { detail: String },
}

impl StopReason {
    pub fn terminal_state(&self) -> TerminalState {
        match self {
            Self::WithinBand | Self::QualityCeiling | Self::AlreadyUnderTarget => {
                TerminalState::Converged
            }
            Self::IterationLimit
            | Self::TimeBudget
            | Self::Cycle
            | Self::ScaleFloor
            | Self::EncoderFailed { .. } => TerminalState::Exhausted,
        }
    }
}

/// Byte-free record of one search iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    /// 1-based iteration number.
    pub iteration: u32,
    pub quality: f64,
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
    pub fit: Fit,
}

/// Final result of a search: the chosen candidate plus how it was reached.
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    pub candidate: Candidate,
    pub stop_reason: StopReason,
    /// Number of encode calls made.
    pub iterations: u32,
    pub target_bytes: u64,
    /// Every probe in iteration order.
    pub trace: Vec<Probe>,
}

impl CompressionOutcome {
    pub fn terminal_state(&self) -> TerminalState {
        self.stop_reason.terminal_state()
    }

    /// Whether the output is at or under the requested size.
    pub fn target_met(&self) -> bool {
        self.candidate.size_bytes() <= self.target_bytes
    }

    pub fn report(&self) -> CompressionReport {
        CompressionReport {
            target_bytes: self.target_bytes,
            final_size_bytes: self.candidate.size_bytes(),
            final_quality: self.candidate.quality,
            final_scale: self.candidate.scale,
            width: self.candidate.width,
            height: self.candidate.height,
            terminal_state: self.terminal_state(),
            stop_reason: self.stop_reason.clone(),
            iterations: self.iterations,
            target_met: self.target_met(),
            trace: self.trace.clone(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.candidate.into_bytes()
    }
}

/// Serializable summary of a [`CompressionOutcome`], without the image bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionReport {
    pub target_bytes: u64,
    pub final_size_bytes: u64,
    pub final_quality: f64,
    pub final_scale: f64,
    pub width: u32,
    pub height: u32,
    pub terminal_state: TerminalState,
    pub stop_reason: StopReason,
    pub iterations: u32,
    pub target_met: bool,
    pub trace: Vec<Probe>,
}

// ---------------------------------------------------------------------------
// Byte sizes
// ---------------------------------------------------------------------------

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Parse a human byte size such as `512000`, `500KB`, `1.5 MB` or `2m`.
///
/// Units are binary multiples (1 KB = 1024 B) and case-insensitive.
pub fn parse_byte_size(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| FitsizeError::InvalidTarget(format!("not a byte size: {input:?}")))?;

    let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1.0,
        "k" | "kb" | "kib" => KIB,
        "m" | "mb" | "mib" => MIB,
        "g" | "gb" | "gib" => GIB,
        other => {
            return Err(FitsizeError::InvalidTarget(format!(
                "unknown size unit {other:?} in {input:?}"
            )));
        }
    };

    let bytes = (value * multiplier).round();
    if !bytes.is_finite() || bytes > u64::MAX as f64 {
        return Err(FitsizeError::InvalidTarget(format!(
            "byte size out of range: {input:?}"
        )));
    }
    Ok(bytes as u64)
}

/// Format a byte count for people: `512 B`, `500.0 KB`, `1.95 MB`.
pub fn format_bytes(bytes: u64) -> String {
    let value = bytes as f64;
    if value < KIB {
        format!("{bytes} B")
    } else if value < MIB {
        format!("{:.1} KB", value / KIB)
    } else {
        format!("{:.2} MB", value / MIB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_target_is_rejected() {
        let err = TargetSpec::new(0).unwrap_err();
        assert!(matches!(err, FitsizeError::InvalidTarget(_)));
    }

    #[test]
    fn default_band_bounds() {
        let target = TargetSpec::new(512_000).unwrap();
        assert_eq!(target.lower_bound(), 460_800);
        assert_eq!(target.upper_bound(), 512_000);
    }

    #[test]
    fn custom_band_moves_the_lower_bound() {
        let band = ToleranceBand::new(0.5, 1.0).unwrap();
        let target = TargetSpec::with_band(1000, band).unwrap();
        assert_eq!(target.band(), band);
        assert_eq!(target.lower_bound(), 500);
        assert_eq!(target.classify(600), Fit::Within);
    }

    #[test]
    fn classify_against_band() {
        let target = TargetSpec::new(1000).unwrap();
        assert_eq!(target.classify(899), Fit::Below);
        assert_eq!(target.classify(900), Fit::Within);
        assert_eq!(target.classify(1000), Fit::Within);
        assert_eq!(target.classify(1001), Fit::Above);
    }

    #[test]
    fn band_must_be_ordered_and_within_target() {
        assert!(ToleranceBand::new(0.9, 1.0).is_ok());
        assert!(ToleranceBand::new(0.95, 0.9).is_err());
        assert!(ToleranceBand::new(0.0, 1.0).is_err());
        assert!(ToleranceBand::new(0.9, 1.1).is_err());
        assert!(ToleranceBand::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn quality_bounds_clamp() {
        let bounds = QualityBounds::default();
        assert_eq!(bounds.clamp(0.1), 0.3);
        assert_eq!(bounds.clamp(0.99), 0.95);
        assert!(bounds.contains(0.92));
        assert!(QualityBounds { min: 0.8, max: 0.5 }.validate().is_err());
    }

    #[test]
    fn stop_reasons_map_to_terminal_states() {
        assert_eq!(
            StopReason::WithinBand.terminal_state(),
            TerminalState::Converged
        );
        assert_eq!(
            StopReason::AlreadyUnderTarget.terminal_state(),
            TerminalState::Converged
        );
        assert_eq!(
            StopReason::Cycle.terminal_state(),
            TerminalState::Exhausted
        );
        assert_eq!(
            StopReason::EncoderFailed {
                detail: "boom".into()
            }
            .terminal_state(),
            TerminalState::Exhausted
        );
    }

    #[test]
    fn parses_byte_sizes() {
        assert_eq!(parse_byte_size("512000").unwrap(), 512_000);
        assert_eq!(parse_byte_size("500KB").unwrap(), 512_000);
        assert_eq!(parse_byte_size("500 kb").unwrap(), 512_000);
        assert_eq!(parse_byte_size("1.5MB").unwrap(), 1_572_864);
        assert_eq!(parse_byte_size("2m").unwrap(), 2_097_152);
        assert_eq!(parse_byte_size("0").unwrap(), 0);
    }

    #[test]
    fn rejects_bad_byte_sizes() {
        assert!(parse_byte_size("").is_err());
        assert!(parse_byte_size("-5KB").is_err());
        assert!(parse_byte_size("12 parsecs").is_err());
        assert!(parse_byte_size("1.2.3").is_err());
    }

    #[test]
    fn formats_byte_sizes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(512_000), "500.0 KB");
        assert_eq!(format_bytes(2_097_152), "2.00 MB");
    }

    #[test]
    fn report_mirrors_outcome() {
        let outcome = CompressionOutcome {
            candidate: Candidate {
                bytes: vec![0u8; 900],
                quality: 0.72,
                scale: 0.9,
                width: 90,
                height: 45,
            },
            stop_reason: StopReason::WithinBand,
            iterations: 3,
            target_bytes: 1000,
            trace: Vec::new(),
        };
        let report = outcome.report();
        assert_eq!(report.final_size_bytes, 900);
        assert_eq!(report.terminal_state, TerminalState::Converged);
        assert!(report.target_met);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"terminal_state\":\"converged\""));
        assert!(json.contains("\"kind\":\"within_band\""));
    }
}
