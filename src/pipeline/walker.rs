use std::collections::BTreeSet;

use tracing::{debug, trace, warn};

use crate::glossary::GlossaryStore;
use crate::ir::{Sheet, Workbook};
use crate::progress::RunProgress;
use crate::quality::QaRecord;
use crate::rules::{classify, CellClass};
use crate::substitute::{substitute, MatchMethod};
use crate::textutil::normalize;

/// `None` means every sheet or column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalkOptions {
    pub only_sheets: Option<BTreeSet<String>>,
    // upper-case letters
    pub only_columns: Option<BTreeSet<String>>,
}

impl WalkOptions {
    pub fn from_lists(only_sheets: Option<&[String]>, only_columns: Option<&[String]>) -> Self {
        Self {
            only_sheets: only_sheets.and_then(|v| split_list(v, false)),
            only_columns: only_columns.and_then(|v| split_list(v, true)),
        }
    }

    pub fn sheet_selected(&self, name: &str) -> bool {
        self.only_sheets.as_ref().map_or(true, |s| s.contains(name))
    }

    pub fn column_selected(&self, letter: &str) -> bool {
        self.only_columns.as_ref().map_or(true, |c| c.contains(letter))
    }
}

fn split_list(items: &[String], upper: bool) -> Option<BTreeSet<String>> {
    let set: BTreeSet<String> = items
        .iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| if upper { s.to_ascii_uppercase() } else { s.to_string() })
        .collect();
    (!set.is_empty()).then_some(set)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub sheets: usize,
    pub text_cells: usize,
    pub skipped: usize,
    pub exact: usize,
    pub substring: usize,
    pub unchanged: usize,
}

impl WalkStats {
    fn absorb(&mut self, other: &WalkStats) {
        self.sheets += other.sheets;
        self.text_cells += other.text_cells;
        self.skipped += other.skipped;
        self.exact += other.exact;
        self.substring += other.substring;
        self.unchanged += other.unchanged;
    }

    pub fn translated(&self) -> usize {
        self.exact + self.substring
    }
}

#[derive(Clone, Debug, Default)]
pub struct WalkReport {
    pub qa_records: Vec<QaRecord>,
    pub stats: WalkStats,
}

pub fn translate_workbook(
    workbook: &mut Workbook,
    glossary: &GlossaryStore,
    options: &WalkOptions,
    progress: &RunProgress,
) -> WalkReport {
    let mut report = WalkReport::default();
    let total = workbook
        .sheets
        .iter()
        .filter(|s| options.sheet_selected(&s.name))
        .count();

    if let Some(wanted) = options.only_sheets.as_ref() {
        for name in wanted {
            if workbook.sheet(name).is_none() {
                warn!(sheet = %name, "requested sheet not found in workbook");
            }
        }
    }

    let mut done = 0usize;
    for sheet in workbook.sheets.iter_mut() {
        if !options.sheet_selected(&sheet.name) {
            continue;
        }
        let stats = translate_sheet(sheet, glossary, options, &mut report.qa_records);
        done += 1;
        debug!(
            sheet = %sheet.name,
            text_cells = stats.text_cells,
            skipped = stats.skipped,
            exact = stats.exact,
            substring = stats.substring,
            unchanged = stats.unchanged,
            "sheet walked"
        );
        progress.sheet_walked(&sheet.name, done, total, &stats);
        report.stats.absorb(&stats);
    }
    report
}

fn translate_sheet(
    sheet: &mut Sheet,
    glossary: &GlossaryStore,
    options: &WalkOptions,
    qa: &mut Vec<QaRecord>,
) -> WalkStats {
    let mut stats = WalkStats {
        sheets: 1,
        ..WalkStats::default()
    };

    for (at, raw) in sheet.text_cells() {
        if !options.column_selected(&at.column_letter()) {
            continue;
        }
        stats.text_cells += 1;

        let normalized = normalize(&raw);
        let mut final_text = raw.clone();
        match classify(&normalized) {
            CellClass::Eligible => {
                let result = substitute(&normalized, glossary);
                match result.method {
                    MatchMethod::Exact => stats.exact += 1,
                    MatchMethod::Substring => stats.substring += 1,
                    MatchMethod::Unchanged => stats.unchanged += 1,
                }
                if result.changed {
                    sheet.set_text(at, result.final_text.as_str());
                    final_text = result.final_text;
                }
            }
            class => {
                trace!(sheet = %sheet.name, cell = %at, class = class.as_str(), "cell skipped");
                stats.skipped += 1;
            }
        }

        if let Some(record) = QaRecord::check(&sheet.name, at, &raw, &final_text) {
            qa.push(record);
        }
    }
    stats
}
