//! CLI output formatting.
//!
//! # Entity Display Contract
//!
//! Every catalog entry follows the same two-level pattern:
//!
//! 1. **Header line**: positional index + raster reference + declared size
//!    (+ `face` marker when a face box is present)
//! 2. **Context line**: indented verification status
//!
//! ## Check
//!
//! ```text
//! Catalog public/meta.json
//! 001 /images/a.jpg 1000x500 face
//!     ok
//! 002 /images/b.jpg 640x480
//!     mismatch: catalog 640x480, file 320x240
//!
//! 2 images, 1 with faces, 1 problem
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::catalog::Catalog;
use crate::verify::{EntryCheck, EntryStatus};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Shorten inline `data:` URIs to their header so lines stay readable.
fn display_reference(data: &str) -> &str {
    if data.starts_with("data:") {
        data.split_once(',').map(|(head, _)| head).unwrap_or(data)
    } else {
        data
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn status_line(status: &EntryStatus) -> String {
    match status {
        EntryStatus::Ok => "ok".to_string(),
        EntryStatus::Inline => "inline data URI (not checked)".to_string(),
        EntryStatus::Mismatch { declared, actual } => format!(
            "mismatch: catalog {}x{}, file {}x{}",
            declared.0, declared.1, actual.0, actual.1
        ),
        EntryStatus::Unreadable(reason) => format!("unreadable: {reason}"),
    }
}

// ============================================================================
// check
// ============================================================================

/// Format the `check` command report.
pub fn format_check_output(catalog_path: &str, catalog: &Catalog, checks: &[EntryCheck]) -> Vec<String> {
    let mut lines = vec![format!("Catalog {catalog_path}")];

    for (check, entry) in checks.iter().zip(catalog.entries()) {
        let face = if check.has_face { " face" } else { "" };
        lines.push(format!(
            "{} {} {}x{}{}",
            format_index(check.index + 1),
            display_reference(&check.data),
            entry.width,
            entry.height,
            face
        ));
        lines.push(format!("    {}", status_line(&check.status)));
    }

    let problems = checks.iter().filter(|c| c.is_problem()).count();
    lines.push(String::new());
    lines.push(format!(
        "{}, {} with faces, {}",
        plural(catalog.len(), "image"),
        catalog.faces(),
        plural(problems, "problem")
    ));
    lines
}

/// Print the `check` report to stdout.
pub fn print_check_output(catalog_path: &str, catalog: &Catalog, checks: &[EntryCheck]) {
    for line in format_check_output(catalog_path, catalog, checks) {
        println!("{}", line);
    }
}
