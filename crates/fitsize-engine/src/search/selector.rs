// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result selector — remembers the smallest candidate seen during a search
// and decides what the caller gets back when the search stops.

use fitsize_core::error::{FitsizeError, Result};
use fitsize_core::types::{Candidate, StopReason};
use tracing::warn;

/// How the search loop ended, before a result is selected.
#[derive(Debug)]
pub enum Termination {
    /// The candidate satisfies the target and is returned as-is.
    Converged {
        candidate: Candidate,
        reason: StopReason,
    },
    /// Budget or levers ran out; fall back to the best candidate seen.
    Exhausted(StopReason),
    /// The encoder failed mid-search.
    Failed(FitsizeError),
}

/// Tracks the smallest candidate across a search.
///
/// Only one candidate is held at a time; a smaller offer replaces (and drops)
/// the previous best.
#[derive(Debug, Default)]
pub struct ResultSelector {
    best: Option<Candidate>,
}

impl ResultSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `candidate` if it is strictly smaller than the best so far.
    /// Returns whether it was kept; ties keep the earlier candidate.
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        let smaller = self
            .best
            .as_ref()
            .is_none_or(|best| candidate.size_bytes() < best.size_bytes());
        if smaller {
            self.best = Some(candidate);
        }
        smaller
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best.as_ref()
    }

    pub fn best_size(&self) -> Option<u64> {
        self.best.as_ref().map(Candidate::size_bytes)
    }

    /// Pick the candidate to return for `termination`.
    ///
    /// - converged: the converging candidate;
    /// - exhausted: the smallest candidate seen;
    /// - encoder failure: the smallest candidate seen, reported as
    ///   [`StopReason::EncoderFailed`], or the error if nothing was produced.
    pub fn resolve(self, termination: Termination) -> Result<(Candidate, StopReason)> {
        match termination {
            Termination::Converged { candidate, reason } => Ok((candidate, reason)),
            Termination::Exhausted(reason) => self.best.map(|best| (best, reason)).ok_or_else(|| {
                FitsizeError::Encode("search stopped before any candidate was produced".into())
            }),
            Termination::Failed(FitsizeError::Encode(detail)) => match self.best {
                Some(best) => {
                    warn!(
                        %detail,
                        best_size = best.size_bytes(),
                        "Encoder failed; returning best candidate so far"
                    );
                    Ok((best, StopReason::EncoderFailed { detail }))
                }
                None => Err(FitsizeError::Encode(detail)),
            },
            Termination::Failed(err) => Err(err),
        }
    }
}
