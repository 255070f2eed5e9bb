// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for people using the compressor.
//
// Every technical error is mapped to plain English with a clear suggestion,
// and finished searches get a one-line summary that says whether the size
// was hit.

use crate::error::FitsizeError;
use crate::types::{CompressionReport, StopReason, TerminalState, format_bytes};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Running the same request again may work.
    Transient,
    /// The user has to change something (target, file, settings).
    ActionRequired,
    /// Retrying will not help with this input.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether running the same request again could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `FitsizeError` into a `HumanError`.
pub fn humanize_error(err: &FitsizeError) -> HumanError {
    match err {
        // -- Request validation --
        FitsizeError::InvalidTarget(detail) => {
            if detail.contains("tolerance band") {
                HumanError {
                    message: "The accepted size range doesn't work.".into(),
                    suggestion: format!(
                        "Set the lower edge between 0 and 1, no higher than the upper edge (0.9 is a good start). ({detail})"
                    ),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "That target size doesn't work.".into(),
                    suggestion: format!(
                        "Enter a size larger than zero, such as 500KB or 1.5MB. ({detail})"
                    ),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            }
        }

        FitsizeError::InvalidConfig(detail) => HumanError {
            message: "One of the compression settings is out of range.".into(),
            suggestion: format!("Check the settings file or options and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Image errors --
        FitsizeError::Decode(_) => HumanError {
            message: "This file couldn't be opened as an image.".into(),
            suggestion: "The file may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FitsizeError::Encode(_) => HumanError {
            message: "The image couldn't be compressed.".into(),
            suggestion: "Try again. If this keeps happening, try a smaller image or a different file.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FitsizeError::Cancelled { .. } => HumanError {
            message: "Compression was stopped.".into(),
            suggestion: "Start it again whenever you're ready.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Storage --
        FitsizeError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or choose a different folder for the output.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        FitsizeError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Make sure it is valid JSON, or remove it to use the defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

/// One-line plain English summary of a finished search.
pub fn summarize_report(report: &CompressionReport) -> String {
    let size = format_bytes(report.final_size_bytes);
    let target = format_bytes(report.target_bytes);

    if report.stop_reason == StopReason::AlreadyUnderTarget {
        return format!("Your image is already {size}, which fits within {target}. Nothing to do.");
    }

    let shrunk = if report.final_scale < 1.0 {
        format!(" and resized to {}x{}", report.width, report.height)
    } else {
        String::new()
    };

    match report.terminal_state {
        TerminalState::Converged => format!(
            "Done! Your image is now {size} (target {target}), saved at {:.0}% quality{shrunk}.",
            report.final_quality * 100.0
        ),
        TerminalState::Exhausted if report.target_met => format!(
            "Your image is now {size}, within the {target} target{shrunk}. It may be smaller than it needed to be."
        ),
        TerminalState::Exhausted => format!(
            "We couldn't get this image down to {target}. The smallest version we made is {size}{shrunk}."
        ),
    }
}
