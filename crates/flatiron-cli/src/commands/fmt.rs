// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `flatiron` and `flatiron --check` — format Erlang source files.
//!
//! **DDD Context:** Formatting — Driver
//!
//! Formatting a source file (`.erl`, `.hrl`) runs the token stream through
//! the layout engine, then re-lexes the output and compares the semantic
//! token streams of input and output. If they diverge, the reformatted
//! text is diverted to a crash dump next to the offending file and the run
//! fails with a `formatter_broke_the_code` error so a human can diff.
//!
//! Files with other extensions (`rebar.config`, `.app.src`, …) are
//! formatted unconditionally — their content is Erlang terms, but the
//! equivalence gate only applies to code the compiler will see.
//!
//! With `--check`, a unified diff is printed for every file that would
//! change and the command exits non-zero; no files are modified.

use camino::Utf8PathBuf;
use miette::{IntoDiagnostic, Result};
use similar::TextDiff;
use std::collections::HashSet;

use flatiron_core::{check_equivalence, format_source, FormatOptions};

/// File name the unsafe output is diverted to when the equivalence check
/// fails.
pub const CRASH_DUMP_FILE: &str = "flatiron.crashdump";

/// Format (or check formatting of) the given paths.
///
/// When `check_only` is `true` the command prints a unified diff for every
/// file that is not already formatted and exits non-zero if any files
/// would change or could not be verified. When `check_only` is `false` the
/// command writes formatted output back to each file that has changed.
pub fn run_fmt(paths: &[String], check_only: bool, line_length: usize) -> Result<()> {
    let mut seen = HashSet::new();
    let mut source_files = Vec::new();

    for path in paths {
        let source_path = Utf8PathBuf::from(path);

        if source_path.is_file() {
            if seen.insert(source_path.clone()) {
                source_files.push(source_path);
            }
        } else if source_path.is_dir() {
            for file in collect_source_files(&source_path)? {
                if seen.insert(file.clone()) {
                    source_files.push(file);
                }
            }
        } else {
            miette::bail!("Path '{}' does not exist", path);
        }
    }

    if source_files.is_empty() {
        miette::bail!("No source files found");
    }

    let options = FormatOptions { line_length };
    let mut changed_files: Vec<Utf8PathBuf> = Vec::new();
    let mut skipped_files: Vec<Utf8PathBuf> = Vec::new();

    for file in &source_files {
        let original = std::fs::read_to_string(file.as_std_path())
            .into_diagnostic()
            .map_err(|e| miette::miette!("Failed to read '{}': {e}", file))?;

        let formatted = match format_source(&original, &options) {
            Ok(formatted) => formatted,
            Err(e) => {
                // A file the core cannot build is fatal for that file; in
                // write mode the rest of the run continues.
                tracing::warn!("skipping '{file}': {e}");
                eprintln!("warning: skipping '{file}' ({e})");
                skipped_files.push(file.clone());
                continue;
            }
        };

        if is_erlang_source(file) {
            if let Err(e) = check_equivalence(&original, &formatted) {
                let dump = crash_dump_path(file);
                std::fs::write(dump.as_std_path(), &formatted)
                    .into_diagnostic()
                    .map_err(|e| miette::miette!("Failed to write '{dump}': {e}"))?;
                return Err(miette::miette!(
                    code = "flatiron::formatter_broke_the_code",
                    help = "diff the crash dump against the original to see what went wrong",
                    "formatter broke the code in '{file}': {e}; unsafe output written to '{dump}'"
                ));
            }
        }

        if formatted == original {
            continue;
        }

        changed_files.push(file.clone());

        if check_only {
            print_unified_diff(file.as_str(), &original, &formatted);
        } else {
            tracing::debug!("rewriting '{file}'");
            std::fs::write(file.as_std_path(), &formatted)
                .into_diagnostic()
                .map_err(|e| miette::miette!("Failed to write '{}': {e}", file))?;
        }
    }

    let mut parts: Vec<String> = Vec::new();
    if check_only && !changed_files.is_empty() {
        let count = changed_files.len();
        let plural = if count == 1 { "" } else { "s" };
        parts.push(format!("{count} file{plural} would be reformatted"));
    }
    if !skipped_files.is_empty() {
        let count = skipped_files.len();
        let plural = if count == 1 { "" } else { "s" };
        parts.push(format!("{count} file{plural} could not be formatted"));
    }
    if !parts.is_empty() && (check_only || !skipped_files.is_empty()) {
        miette::bail!("{}", parts.join("; "));
    }

    Ok(())
}

/// Recursively collects `.erl` and `.hrl` files beneath a directory.
fn collect_source_files(dir: &Utf8PathBuf) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(dir.as_std_path())
        .into_diagnostic()
        .map_err(|e| miette::miette!("Failed to read directory '{dir}': {e}"))?;

    for entry in entries {
        let entry = entry.into_diagnostic()?;
        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|p| miette::miette!("Non-UTF-8 path: {}", p.display()))?;
        if path.is_dir() {
            files.extend(collect_source_files(&path)?);
        } else if is_erlang_source(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// The AST-equivalence gate only applies to compiler-visible source.
fn is_erlang_source(path: &Utf8PathBuf) -> bool {
    matches!(path.extension(), Some("erl" | "hrl"))
}

/// The crash dump lands next to the offending file.
fn crash_dump_path(file: &Utf8PathBuf) -> Utf8PathBuf {
    file.parent()
        .map_or_else(|| Utf8PathBuf::from(CRASH_DUMP_FILE), |p| p.join(CRASH_DUMP_FILE))
}

/// Print a unified diff between `original` and `formatted` for the given
/// file path. Output goes to stdout so it can be captured and piped.
fn print_unified_diff(path: &str, original: &str, formatted: &str) {
    let diff = TextDiff::from_lines(original, formatted);
    print!(
        "{}",
        diff.unified_diff()
            .header(&format!("a/{path}"), &format!("b/{path}"))
    );
}
