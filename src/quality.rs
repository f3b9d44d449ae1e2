use std::collections::BTreeSet;

use crate::ir::CellRef;
use crate::textutil::{has_source_script, source_script_runs};

/// Separator used when fragments are flattened into a single report column.
pub const FRAGMENT_SEPARATOR: &str = " | ";

pub fn has_residual(final_text: &str) -> bool {
    has_source_script(final_text)
}

/// Untranslated fragments left in `final_text`, deduplicated and sorted so reports are
/// reproducible. Each fragment can be pasted straight into the glossary's CN column.
pub fn scan(final_text: &str) -> BTreeSet<String> {
    if !has_residual(final_text) {
        return BTreeSet::new();
    }
    source_script_runs(final_text).map(str::to_string).collect()
}

/// A cell that still needs a human after substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QaRecord {
    pub sheet: String,
    pub row: u32,
    pub column: String,
    pub cell_address: String,
    pub original_text: String,
    pub final_text: String,
    pub residual_fragments: BTreeSet<String>,
}

impl QaRecord {
    /// `None` when the final text is free of source-script characters.
    pub fn check(sheet: &str, at: CellRef, original_text: &str, final_text: &str) -> Option<Self> {
        let residual_fragments = scan(final_text);
        if residual_fragments.is_empty() {
            return None;
        }
        Some(Self {
            sheet: sheet.to_string(),
            row: at.row,
            column: at.column_letter(),
            cell_address: at.to_string(),
            original_text: original_text.to_string(),
            final_text: final_text.to_string(),
            residual_fragments,
        })
    }

    pub fn fragments_joined(&self) -> String {
        self.residual_fragments
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(FRAGMENT_SEPARATOR)
    }
}
