pub mod batch;
pub mod config;
pub mod report;
pub mod walker;

pub use batch::{
    translate_batch, translate_file, BatchSummary, DocumentJob, DocumentOutcome, TranslateSettings,
};
pub use config::{RunConfig, RunOverrides};
pub use report::{write_qa_report, QaOutcome};
pub use walker::{translate_workbook, WalkOptions, WalkReport, WalkStats};
