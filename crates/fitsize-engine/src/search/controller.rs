// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Search controller — drives the encoder through (quality, scale) pairs until
// the output fits the target.
//
// Quality moves first: down in coarse steps while over budget, up in fine
// steps while comfortably under it. Once quality sits at its floor and the
// output is still too big, the raster is shrunk and quality is reset to a
// middle value. Every iteration makes exactly one encode call, and the loop is
// bounded by the iteration cap, an optional wall-clock budget, cancellation,
// and cycle detection.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use fitsize_core::config::SearchConfig;
use fitsize_core::error::{FitsizeError, Result};
use fitsize_core::types::{
    Candidate, CompressionOutcome, Fit, Probe, StopReason, TargetSpec, TerminalState,
    ToleranceBand,
};
use image::ImageFormat;
use tracing::{debug, info, instrument, warn};

use super::cancel::CancelToken;
use super::selector::{ResultSelector, Termination};
use crate::encode::CandidateEncoder;
use crate::raster::RasterSource;

/// Quality values are kept on a 1/1000 grid so repeated steps don't drift.
const QUALITY_GRID: f64 = 1000.0;

/// Scale is compared at this resolution when detecting revisited pairs.
const SCALE_GRID: f64 = 1e9;

/// Phases of the search state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Init,
    Probing,
    Converged,
    Exhausted,
    /// Encoder failure or cancellation.
    Failed,
}

/// Parameters for the next encode, plus loop bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    quality: f64,
    scale: f64,
    iteration: u32,
    phase: SearchPhase,
}

impl SearchState {
    fn start(config: &SearchConfig) -> Self {
        Self {
            quality: config.quality.clamp(snap_quality(config.initial_quality)),
            scale: 1.0,
            iteration: 0,
            phase: SearchPhase::Init,
        }
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Number of encodes completed so far.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    fn key(&self) -> (i64, i64) {
        (
            (self.quality * QUALITY_GRID).round() as i64,
            (self.scale * SCALE_GRID).round() as i64,
        )
    }
}

/// Which lever an adjustment pulled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lever {
    RaiseQuality,
    LowerQuality,
    ShrinkScale,
}

/// What to do after measuring a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Decision {
    Converge { at_ceiling: bool },
    Adjust { lever: Lever, quality: f64, scale: f64 },
    /// Over budget at the quality floor and the minimum scale.
    OutOfLevers,
}

/// One step of the state machine, as a pure function of the measured size.
pub(crate) fn decide(
    state: &SearchState,
    size_bytes: u64,
    target: &TargetSpec,
    config: &SearchConfig,
) -> Decision {
    let bounds = config.quality;
    match target.classify(size_bytes) {
        Fit::Within => Decision::Converge { at_ceiling: false },
        Fit::Below if state.quality < bounds.max => Decision::Adjust {
            lever: Lever::RaiseQuality,
            quality: bounds.clamp(snap_quality(state.quality + config.quality_step_up)),
            scale: state.scale,
        },
        Fit::Below => Decision::Converge { at_ceiling: true },
        Fit::Above if state.quality > bounds.min => Decision::Adjust {
            lever: Lever::LowerQuality,
            quality: bounds.clamp(snap_quality(state.quality - config.quality_step_down)),
            scale: state.scale,
        },
        Fit::Above => {
            let scale = state.scale * config.scale_shrink_factor;
            if scale < config.min_scale {
                Decision::OutOfLevers
            } else {
                Decision::Adjust {
                    lever: Lever::ShrinkScale,
                    quality: bounds.clamp(snap_quality(config.reset_quality)),
                    scale,
                }
            }
        }
    }
}

fn snap_quality(quality: f64) -> f64 {
    (quality * QUALITY_GRID).round() / QUALITY_GRID
}

/// Runs target-size searches with one configuration.
///
/// ```ignore
/// let raster = RasterSource::open("photo.png")?;
/// let target = TargetSpec::new(500 * 1024)?;
/// let mut encoder = JpegCandidateEncoder::default();
/// let outcome = SearchController::new(SearchConfig::default())
///     .with_observer(|probe| println!("{probe:?}"))
///     .run(&raster, &target, &mut encoder)?;
/// std::fs::write("photo.min.jpg", outcome.into_bytes())?;
/// ```
pub struct SearchController<'a> {
    config: SearchConfig,
    cancel: Option<CancelToken>,
    observer: Option<Box<dyn FnMut(&Probe) + 'a>>,
    last_state: Option<SearchState>,
}

impl<'a> SearchController<'a> {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            cancel: None,
            observer: None,
            last_state: None,
        }
    }

    /// Stop the search, with `FitsizeError::Cancelled`, once `token` is cancelled.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Receive every probe as soon as it is measured (progress reporting).
    pub fn with_observer(mut self, observer: impl FnMut(&Probe) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Final state of the most recent run, if any.
    pub fn state(&self) -> Option<&SearchState> {
        self.last_state.as_ref()
    }

    /// Search for the best candidate that fits `target`.
    ///
    /// Missing the target is not an error: the outcome is then marked
    /// `Exhausted` and carries the smallest candidate produced.
    #[instrument(
        skip_all,
        fields(raster = %raster.id(), target_bytes = target.target_bytes())
    )]
    pub fn run<E: CandidateEncoder + ?Sized>(
        &mut self,
        raster: &RasterSource,
        target: &TargetSpec,
        encoder: &mut E,
    ) -> Result<CompressionOutcome> {
        self.config.validate()?;

        let mut state = SearchState::start(&self.config);
        if let Some(outcome) = self.passthrough(raster, target, encoder.format()) {
            state.phase = SearchPhase::Converged;
            self.last_state = Some(state);
            return Ok(outcome);
        }

        let budget = self.config.time_budget_ms.map(Duration::from_millis);
        let started = Instant::now();
        let mut selector = ResultSelector::new();
        let mut trace = Vec::new();
        let mut visited = HashSet::new();

        info!(
            width = raster.width(),
            height = raster.height(),
            band_low = target.band().low,
            lower = target.lower_bound(),
            upper = target.upper_bound(),
            "Starting target-size search"
        );
        state.phase = SearchPhase::Probing;

        let termination = loop {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                info!(iteration = state.iteration, "Search cancelled");
                state.phase = SearchPhase::Failed;
                let iterations = state.iteration;
                self.last_state = Some(state);
                return Err(FitsizeError::Cancelled { iterations });
            }

            visited.insert(state.key());
            let candidate = match encoder.encode(raster, state.scale, state.quality) {
                Ok(candidate) => candidate,
                Err(err) => break Termination::Failed(err),
            };
            state.iteration += 1;

            let probe = Probe {
                iteration: state.iteration,
                quality: state.quality,
                scale: state.scale,
                width: candidate.width,
                height: candidate.height,
                size_bytes: candidate.size_bytes(),
                fit: target.classify(candidate.size_bytes()),
            };
            debug!(
                iteration = probe.iteration,
                quality = probe.quality,
                scale = probe.scale,
                size = probe.size_bytes,
                fit = ?probe.fit,
                "Probe measured"
            );
            trace.push(probe);
            if let Some(observer) = self.observer.as_mut() {
                observer(&probe);
            }

            match decide(&state, probe.size_bytes, target, &self.config) {
                Decision::Converge { at_ceiling } => {
                    let reason = if at_ceiling {
                        StopReason::QualityCeiling
                    } else {
                        StopReason::WithinBand
                    };
                    break Termination::Converged { candidate, reason };
                }
                Decision::OutOfLevers => {
                    selector.offer(candidate);
                    break Termination::Exhausted(StopReason::ScaleFloor);
                }
                Decision::Adjust {
                    lever,
                    quality,
                    scale,
                } => {
                    selector.offer(candidate);
                    debug!(?lever, quality, scale, "Adjusting parameters");
                    state.quality = quality;
                    state.scale = scale;
                }
            }

            if state.iteration >= self.config.max_iterations {
                break Termination::Exhausted(StopReason::IterationLimit);
            }
            if self.config.stop_on_cycle && visited.contains(&state.key()) {
                debug!(
                    quality = state.quality,
                    scale = state.scale,
                    "Next parameters already probed"
                );
                break Termination::Exhausted(StopReason::Cycle);
            }
            if budget.is_some_and(|budget| started.elapsed() >= budget) {
                break Termination::Exhausted(StopReason::TimeBudget);
            }
        };

        state.phase = match &termination {
            Termination::Converged { .. } => SearchPhase::Converged,
            Termination::Exhausted(_) => SearchPhase::Exhausted,
            Termination::Failed(_) => SearchPhase::Failed,
        };
        let iterations = state.iteration;
        self.last_state = Some(state);

        let (candidate, stop_reason) = selector.resolve(termination).inspect_err(|err| {
            warn!(%err, iterations, "Search failed");
        })?;

        match stop_reason.terminal_state() {
            TerminalState::Converged => info!(
                iterations,
                size = candidate.size_bytes(),
                quality = candidate.quality,
                scale = candidate.scale,
                reason = ?stop_reason,
                "Search converged"
            ),
            TerminalState::Exhausted => warn!(
                iterations,
                size = candidate.size_bytes(),
                quality = candidate.quality,
                scale = candidate.scale,
                reason = ?stop_reason,
                "Search exhausted; returning smallest candidate"
            ),
        }

        Ok(CompressionOutcome {
            candidate,
            stop_reason,
            iterations,
            target_bytes: target.target_bytes(),
            trace,
        })
    }

    /// The source bytes, untouched, when they already fit and are in the
    /// encoder's output format.
    fn passthrough(
        &self,
        raster: &RasterSource,
        target: &TargetSpec,
        format: ImageFormat,
    ) -> Option<CompressionOutcome> {
        if !self.config.keep_source_if_under_target {
            return None;
        }
        let input = raster.encoded_input()?;
        if input.format != format || input.bytes.len() as u64 > target.upper_bound() {
            return None;
        }

        info!(
            size = input.bytes.len(),
            "Source already fits the target; keeping it unchanged"
        );
        Some(CompressionOutcome {
            candidate: Candidate {
                bytes: input.bytes.clone(),
                quality: 1.0,
                scale: 1.0,
                width: raster.width(),
                height: raster.height(),
            },
            stop_reason: StopReason::AlreadyUnderTarget,
            iterations: 0,
            target_bytes: target.target_bytes(),
            trace: Vec::new(),
        })
    }
}

/// Run one search with `config`.
pub fn compress_to_target<E: CandidateEncoder + ?Sized>(
    raster: &RasterSource,
    target: &TargetSpec,
    config: &SearchConfig,
    encoder: &mut E,
) -> Result<CompressionOutcome> {
    SearchController::new(config.clone()).run(raster, target, encoder)
}

/// Validate a raw byte budget, then search. A zero budget fails with
/// `InvalidTarget` before the encoder is touched.
pub fn compress<E: CandidateEncoder + ?Sized>(
    raster: &RasterSource,
    target_bytes: u64,
    band: ToleranceBand,
    config: &SearchConfig,
    encoder: &mut E,
) -> Result<CompressionOutcome> {
    let target = TargetSpec::with_band(target_bytes, band)?;
    compress_to_target(raster, &target, config, encoder)
}
