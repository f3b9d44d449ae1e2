use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::DocumentIoError;
use crate::pipeline::{DocumentOutcome, QaOutcome, WalkStats};

/// Per-document and per-sheet run progress on stderr, for the person running the batch.
/// Diagnostics go through `tracing` instead.
pub struct RunProgress {
    enabled: bool,
    started: Instant,
}

impl RunProgress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started: Instant::now(),
        }
    }

    /// A resolved input of the run, e.g. `("Config", path)`.
    pub fn resolved(&self, what: &str, path: &Path) {
        self.emit(format!("{what}: {}", path.display()));
    }

    pub fn glossary_loaded(&self, terms: usize, duplicates: usize) {
        self.emit(glossary_line(terms, duplicates));
    }

    pub fn document_started(&self, index: usize, total: usize, input: &Path) {
        self.emit(format!("[{}/{}] {}", index + 1, total.max(1), input.display()));
    }

    pub fn sheet_walked(&self, sheet: &str, done: usize, total: usize, stats: &WalkStats) {
        self.emit(sheet_line(sheet, done, total, stats));
    }

    pub fn document_finished(&self, outcome: &DocumentOutcome) {
        self.emit(format!("  Output: {}", outcome.output.display()));
        self.emit(qa_line(outcome));
    }

    pub fn document_failed(&self, err: &DocumentIoError) {
        self.emit(format!("  FAILED: {err}"));
    }

    fn emit(&self, line: String) {
        if !self.enabled {
            return;
        }
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "[{}] {line}", Elapsed(self.started.elapsed()));
    }
}

fn glossary_line(terms: usize, duplicates: usize) -> String {
    match duplicates {
        0 => format!("Glossary terms: {terms}"),
        d => format!("Glossary terms: {terms} ({d} duplicate keys, last row wins)"),
    }
}

fn sheet_line(sheet: &str, done: usize, total: usize, stats: &WalkStats) -> String {
    let total = total.max(1);
    format!(
        "  Sheet {}/{total} {sheet}: {} text cells, {} translated, {} skipped",
        done.min(total),
        stats.text_cells,
        stats.translated(),
        stats.skipped
    )
}

fn qa_line(outcome: &DocumentOutcome) -> String {
    match outcome.qa_outcome {
        QaOutcome::Written { rows } => {
            format!("  QA: {} ({rows} untranslated cells)", outcome.qa.display())
        }
        QaOutcome::Cleared => "  QA: no untranslated cells".to_string(),
    }
}

/// `mm:ss`, or `h:mm:ss` past the hour.
struct Elapsed(Duration);

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
        if h == 0 {
            write!(f, "{m:02}:{s:02}")
        } else {
            write!(f, "{h}:{m:02}:{s:02}")
        }
    }
}
