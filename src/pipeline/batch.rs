use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use crate::error::{document_name, DocumentIoError};
use crate::glossary::GlossaryStore;
use crate::pipeline::report::{write_qa_report, QaOutcome};
use crate::pipeline::walker::{translate_workbook, WalkOptions, WalkStats};
use crate::progress::RunProgress;
use crate::xlsx::XlsxDocument;

/// Where one document's results go.
#[derive(Clone, Debug)]
pub struct DocumentJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub qa: PathBuf,
}

#[derive(Clone, Debug)]
pub struct DocumentOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub qa: PathBuf,
    pub qa_rows: usize,
    pub qa_outcome: QaOutcome,
    pub stats: WalkStats,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: Vec<DocumentOutcome>,
    /// `(document name, message)` for every document that could not be processed.
    pub failures: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn qa_rows(&self) -> usize {
        self.succeeded.iter().map(|d| d.qa_rows).sum()
    }
}

pub struct TranslateSettings<'a> {
    pub glossary: &'a GlossaryStore,
    pub walk: &'a WalkOptions,
    pub write_empty_qa: bool,
}

/// Read one workbook, translate it in memory, then write the translated copy and its report.
/// The output is only produced once the whole walk has finished.
pub fn translate_file(
    job: &DocumentJob,
    settings: &TranslateSettings<'_>,
    progress: &RunProgress,
) -> Result<DocumentOutcome, DocumentIoError> {
    if same_file(&job.input, &job.output) {
        return Err(DocumentIoError::new(
            &job.input,
            anyhow::anyhow!("output would overwrite the input: {}", job.output.display()),
        ));
    }

    let mut doc = XlsxDocument::open(&job.input).map_err(|e| DocumentIoError::new(&job.input, e))?;
    let report = translate_workbook(doc.workbook_mut(), settings.glossary, settings.walk, progress);

    doc.save(&job.output)
        .with_context(|| format!("save translated workbook: {}", job.output.display()))
        .map_err(|e| DocumentIoError::new(&job.output, e))?;

    let qa_outcome = write_qa_report(&job.qa, &report.qa_records, settings.write_empty_qa)
        .map_err(|e| DocumentIoError::new(&job.qa, e))?;

    info!(
        input = %job.input.display(),
        cells = report.stats.text_cells,
        translated = report.stats.translated(),
        qa_rows = report.qa_records.len(),
        "document translated"
    );

    Ok(DocumentOutcome {
        input: job.input.clone(),
        output: job.output.clone(),
        qa: job.qa.clone(),
        qa_rows: report.qa_records.len(),
        qa_outcome,
        stats: report.stats,
    })
}

/// Process every job in order. A failing document is recorded and the rest still run.
pub fn translate_batch(
    jobs: &[DocumentJob],
    settings: &TranslateSettings<'_>,
    progress: &RunProgress,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for (i, job) in jobs.iter().enumerate() {
        progress.document_started(i, jobs.len(), &job.input);
        match translate_file(job, settings, progress) {
            Ok(outcome) => {
                progress.document_finished(&outcome);
                summary.succeeded.push(outcome);
            }
            Err(e) => {
                let name = document_name(&job.input);
                warn!(document = %name, error = %e, "document failed");
                progress.document_failed(&e);
                summary.failures.push((name, e.to_string()));
            }
        }
    }
    summary
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}
