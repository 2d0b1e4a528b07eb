//! User-facing lines for each outcome.

use photosort_core::pipeline::FileOutcome;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Stdout(String),
    Stderr(String),
}

/// `None` for outcomes that succeed quietly.
pub fn render(outcome: &FileOutcome) -> Option<Line> {
    let line = match outcome {
        FileOutcome::Reported(d) => Line::Stdout(format!(
            "{} -> {}",
            d.source.display(),
            d.destination.display()
        )),
        FileOutcome::Placed(_) => return None,
        FileOutcome::SkippedNoDate { path } => Line::Stderr(format!(
            "Could not extract date for '{}'.  Skipping ...",
            path.display()
        )),
        FileOutcome::SkippedOddDate { path, raw } => Line::Stderr(format!(
            "Odd date data: '{}' for '{}'.  Skipping ...",
            raw,
            path.display()
        )),
        FileOutcome::SkippedExists(d) => {
            Line::Stderr(format!("File exists: '{}'", d.destination.display()))
        }
        FileOutcome::SkippedUndecodable { path, message } => Line::Stderr(format!(
            "Could not read metadata for '{}': {}.  Skipping ...",
            path.display(),
            message
        )),
        FileOutcome::Failed { path, error } => {
            Line::Stderr(format!("Error placing '{}': {}", path.display(), error))
        }
    };
    Some(line)
}

pub fn emit(outcome: &FileOutcome) {
    match render(outcome) {
        Some(Line::Stdout(s)) => {
            let _ = writeln!(io::stdout(), "{}", s);
        }
        Some(Line::Stderr(s)) => {
            let _ = writeln!(io::stderr(), "{}", s);
        }
        None => {}
    }
}
