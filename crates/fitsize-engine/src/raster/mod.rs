// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster module — decoded, immutable pixel buffers that searches run against.

pub mod source;

pub use source::RasterSource;
