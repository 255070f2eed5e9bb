// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// fitsize-engine — Target-size image compression for Fitsize.
//
// Provides the raster source a search runs against, the candidate encoder
// capability (with a JPEG implementation on the `image` crate), and the
// search controller that walks quality and scale until the output fits a
// byte budget.

pub mod encode;
pub mod raster;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the primary types so callers can use `fitsize_engine::SearchController` etc.
pub use encode::jpeg::JpegCandidateEncoder;
pub use encode::CandidateEncoder;
pub use raster::source::RasterSource;
pub use search::cancel::CancelToken;
pub use search::controller::{SearchController, compress, compress_to_target};
pub use search::selector::ResultSelector;
