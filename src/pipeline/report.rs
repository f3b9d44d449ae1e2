use std::io::Write;
use std::path::Path;

use anyhow::Context;

use crate::quality::QaRecord;

pub const QA_COLUMNS: [&str; 7] = [
    "sheet",
    "row",
    "column",
    "cell_address",
    "original_text",
    "final_text",
    "residual_fragments",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QaOutcome {
    Written { rows: usize },
    Cleared,
}

pub fn render_qa_csv(records: &[QaRecord]) -> anyhow::Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::with_capacity(64 + records.len() * 96);
    buf.extend_from_slice(UTF8_BOM);
    let mut writer = csv::WriterBuilder::new().from_writer(buf);
    writer.write_record(QA_COLUMNS).context("write qa header")?;
    for rec in records {
        writer
            .write_record([
                rec.sheet.as_str(),
                rec.row.to_string().as_str(),
                rec.column.as_str(),
                rec.cell_address.as_str(),
                rec.original_text.as_str(),
                rec.final_text.as_str(),
                rec.fragments_joined().as_str(),
            ])
            .with_context(|| format!("write qa row: {}!{}", rec.sheet, rec.cell_address))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush qa csv: {}", e.error()))
}

pub fn write_qa_report(
    path: &Path,
    records: &[QaRecord],
    write_empty: bool,
) -> anyhow::Result<QaOutcome> {
    if records.is_empty() && !write_empty {
        remove_stale_report(path);
        return Ok(QaOutcome::Cleared);
    }

    let bytes = render_qa_csv(records)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create qa dir: {}", dir.display()))?;
    }
    let mut f = std::fs::File::create(path)
        .with_context(|| format!("create qa report: {}", path.display()))?;
    f.write_all(&bytes)
        .with_context(|| format!("write qa report: {}", path.display()))?;
    Ok(QaOutcome::Written {
        rows: records.len(),
    })
}

// A leftover report that cannot be removed is logged; the document itself succeeded.
fn remove_stale_report(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "removed stale qa report"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not remove stale qa report")
        }
    }
}
