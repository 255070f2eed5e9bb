// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Search module — the quality x scale search that fits an image into a byte
// budget, the selector that picks what to return, and cooperative
// cancellation.

pub mod cancel;
pub mod controller;
pub mod selector;

pub use cancel::CancelToken;
pub use controller::{SearchController, SearchPhase, SearchState, compress, compress_to_target};
pub use selector::{ResultSelector, Termination};
