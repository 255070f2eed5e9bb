// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One command-line compression: settings, decode, search, write.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use fitsize_core::config::FitsizeConfig;
use fitsize_core::types::{CompressionReport, Probe, TargetSpec, format_bytes};
use fitsize_engine::{JpegCandidateEncoder, RasterSource, SearchController};
use tracing::info;

use crate::args::Args;

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub output: PathBuf,
    pub report: CompressionReport,
}

/// Resolve settings from the optional config file and the flags.
pub fn load_config(args: &Args) -> Result<FitsizeConfig> {
    let mut config = match &args.config {
        Some(path) => FitsizeConfig::load(path)
            .with_context(|| format!("Failed to load settings: {}", path.display()))?,
        None => FitsizeConfig::default(),
    };
    args.apply(&mut config);
    config.validate().context("Invalid settings")?;
    Ok(config)
}

pub fn run(args: &Args) -> Result<RunSummary> {
    let config = load_config(args)?;
    let target = TargetSpec::with_band(args.target, config.tolerance)?;

    let raster = RasterSource::open(&args.input)
        .with_context(|| format!("Failed to read input image: {}", args.input.display()))?;

    let mut encoder = JpegCandidateEncoder::new(config.encoder.clone());
    let mut controller = SearchController::new(config.search.clone()).with_observer(log_probe);
    let outcome = controller
        .run(&raster, &target, &mut encoder)
        .with_context(|| format!("Failed to compress {}", args.input.display()))?;

    let report = outcome.report();
    let output = args.output_path();
    fs::write(&output, outcome.into_bytes())
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    info!(
        output = %output.display(),
        size = report.final_size_bytes,
        "Output written"
    );
    Ok(RunSummary { output, report })
}

fn log_probe(probe: &Probe) {
    info!(
        "Attempt {}: {:.0}% quality at {}x{} -> {}",
        probe.iteration,
        probe.quality * 100.0,
        probe.width,
        probe.height,
        format_bytes(probe.size_bytes)
    );
}
