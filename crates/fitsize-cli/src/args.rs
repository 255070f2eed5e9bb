// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments for the `fitsize` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use fitsize_core::config::{FitsizeConfig, ResampleFilter};
use fitsize_core::types::parse_byte_size;

#[derive(Parser, Debug)]
#[command(name = "fitsize")]
#[command(
    author,
    version,
    about = "Re-encode an image as JPEG so it fits a file-size budget, keeping as much quality as possible"
)]
pub struct Args {
    /// Input image (JPEG, PNG, WebP, GIF, BMP, TIFF, ...)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Target size: plain bytes or with a unit (e.g. 500KB, 1.5MB; 1 KB = 1024 B)
    #[arg(short, long, value_parser = parse_target)]
    pub target: u64,

    /// Output file (defaults to <input-stem>.min.jpg next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON settings file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of encode attempts
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Lowest JPEG quality to try (0-1)
    #[arg(long)]
    pub min_quality: Option<f64>,

    /// Highest JPEG quality to try (0-1)
    #[arg(long)]
    pub max_quality: Option<f64>,

    /// Factor applied to the dimensions each time the image is shrunk
    #[arg(long)]
    pub shrink_factor: Option<f64>,

    /// Lower edge of the accepted size band, as a fraction of the target
    #[arg(long)]
    pub band_low: Option<f64>,

    /// Give up after this many milliseconds and keep the best attempt
    #[arg(long)]
    pub time_budget_ms: Option<u64>,

    /// Resampling filter used when shrinking
    #[arg(long, value_enum)]
    pub filter: Option<Filter>,

    /// Keep the input byte-for-byte when it is already a small enough JPEG
    #[arg(long)]
    pub keep_source: bool,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Filter {
    Nearest,
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl From<Filter> for ResampleFilter {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Nearest => ResampleFilter::Nearest,
            Filter::Triangle => ResampleFilter::Triangle,
            Filter::CatmullRom => ResampleFilter::CatmullRom,
            Filter::Lanczos3 => ResampleFilter::Lanczos3,
        }
    }
}

impl Args {
    /// Get the output path, defaulting to `<stem>.min.jpg` beside the input
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self
                .input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".into());
            self.input.with_file_name(format!("{stem}.min.jpg"))
        })
    }

    /// Overlay the flags that were given onto `config`.
    ///
    /// Start and reset qualities are pulled inside new quality bounds so that
    /// narrowing the range from the command line never fails validation.
    pub fn apply(&self, config: &mut FitsizeConfig) {
        let search = &mut config.search;
        if let Some(max_iterations) = self.max_iterations {
            search.max_iterations = max_iterations;
        }
        if let Some(min) = self.min_quality {
            search.quality.min = min;
        }
        if let Some(max) = self.max_quality {
            search.quality.max = max;
        }
        if self.min_quality.is_some() || self.max_quality.is_some() {
            search.initial_quality = search.quality.clamp(search.initial_quality);
            search.reset_quality = search.quality.clamp(search.reset_quality);
        }
        if let Some(factor) = self.shrink_factor {
            search.scale_shrink_factor = factor;
        }
        if let Some(ms) = self.time_budget_ms {
            search.time_budget_ms = Some(ms);
        }
        if self.keep_source {
            search.keep_source_if_under_target = true;
        }

        if let Some(low) = self.band_low {
            config.tolerance.low = low;
        }
        if let Some(filter) = self.filter {
            config.encoder.filter = filter.into();
        }
    }
}

fn parse_target(value: &str) -> Result<u64, String> {
    match parse_byte_size(value) {
        Ok(0) => Err("target size must be greater than zero".into()),
        Ok(bytes) => Ok(bytes),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_target_units() {
        assert_eq!(parse(&["fitsize", "a.png", "-t", "2048"]).target, 2048);
        assert_eq!(parse(&["fitsize", "a.png", "-t", "500KB"]).target, 512_000);
        assert_eq!(parse(&["fitsize", "a.png", "--target", "1.5MB"]).target, 1_572_864);
    }

    #[test]
    fn test_rejects_bad_targets() {
        assert!(Args::try_parse_from(["fitsize", "a.png", "-t", "0"]).is_err());
        assert!(Args::try_parse_from(["fitsize", "a.png", "-t", "lots"]).is_err());
        assert!(Args::try_parse_from(["fitsize", "a.png", "-t", "5 parsecs"]).is_err());
        assert!(Args::try_parse_from(["fitsize", "a.png"]).is_err());
    }

    #[test]
    fn test_default_output_path() {
        let args = parse(&["fitsize", "/photos/holiday.png", "-t", "1MB"]);
        assert_eq!(args.output_path(), PathBuf::from("/photos/holiday.min.jpg"));

        let args = parse(&["fitsize", "scan.jpeg", "-t", "1MB", "-o", "out.jpg"]);
        assert_eq!(args.output_path(), PathBuf::from("out.jpg"));
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse(&[
            "fitsize",
            "a.png",
            "-t",
            "100KB",
            "--max-iterations",
            "8",
            "--shrink-factor",
            "0.75",
            "--band-low",
            "0.8",
            "--time-budget-ms",
            "1500",
            "--filter",
            "catmull-rom",
            "--keep-source",
        ]);
        let mut config = FitsizeConfig::default();
        args.apply(&mut config);

        assert_eq!(config.search.max_iterations, 8);
        assert_eq!(config.search.scale_shrink_factor, 0.75);
        assert_eq!(config.search.time_budget_ms, Some(1500));
        assert!(config.search.keep_source_if_under_target);
        assert_eq!(config.tolerance.low, 0.8);
        assert_eq!(config.encoder.filter, ResampleFilter::CatmullRom);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_narrowed_quality_range_stays_valid() {
        let args = parse(&[
            "fitsize",
            "a.png",
            "-t",
            "100KB",
            "--min-quality",
            "0.5",
            "--max-quality",
            "0.7",
        ]);
        let mut config = FitsizeConfig::default();
        args.apply(&mut config);

        assert_eq!(config.search.initial_quality, 0.7);
        assert_eq!(config.search.reset_quality, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = parse(&["fitsize", "a.png", "-t", "100KB"]);
        let mut config = FitsizeConfig::default();
        args.apply(&mut config);
        assert_eq!(config, FitsizeConfig::default());
    }
}
