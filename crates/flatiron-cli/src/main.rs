// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Flatiron command-line interface.
//!
//! This is the main entry point for the `flatiron` command: format Erlang
//! source files in place, or check whether they are already formatted.

use clap::Parser;
use miette::Result;

mod commands;

/// Flatiron: an Erlang source-code formatter
#[derive(Debug, Parser)]
#[command(name = "flatiron")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Files or directories to format (directories are searched for
    /// .erl/.hrl files)
    #[arg(required = true)]
    paths: Vec<String>,

    /// Check formatting and print diffs instead of rewriting files
    #[arg(long)]
    check: bool,

    /// Target line width
    #[arg(long, default_value_t = flatiron_core::DEFAULT_LINE_LENGTH)]
    line_length: usize,
}

fn main() -> Result<()> {
    // Initialize tracing subscriber only if RUST_LOG is explicitly set.
    // This keeps stderr clean for scripted and editor integrations.
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .try_init();
    }

    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    match commands::fmt::run_fmt(&cli.paths, cli.check, cli.line_length) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}
