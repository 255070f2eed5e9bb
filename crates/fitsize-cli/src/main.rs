// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fitsize — compress an image to a target file size.
//
// Entry point. Parses arguments, initialises logging, runs one search and
// prints either a plain-English summary or the JSON report.

mod args;
mod run;

use std::process::ExitCode;

use clap::Parser;
use fitsize_core::FitsizeError;
use fitsize_core::human_errors::{humanize_error, summarize_report};
use tracing_subscriber::EnvFilter;

use args::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    tracing::debug!(?args, "Fitsize starting");

    let summary = match run::run(&args) {
        Ok(summary) => summary,
        Err(err) => {
            report_error(&err);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&summary.report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                report_error(&err.into());
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", summarize_report(&summary.report));
        println!("Saved to {}", summary.output.display());
    }

    // A best-effort file was still written; signal the miss to scripts.
    if summary.report.target_met {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises the level from warn.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn report_error(err: &anyhow::Error) {
    tracing::debug!("{err:?}");
    match err.downcast_ref::<FitsizeError>() {
        Some(inner) => {
            let human = humanize_error(inner);
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
        }
        None => eprintln!("Error: {err:#}"),
    }
}
