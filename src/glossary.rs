use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{
    DocumentIoError, GlossaryDuplicateWarning, GlossaryFormatError, GlossaryLoadError,
};
use crate::ir::{CellRef, Sheet, Workbook};
use crate::textutil::{has_source_script, normalize};
use crate::xlsx::XlsxDocument;

/// Header rows are looked for in this top-left window only.
pub const HEADER_SCAN_ROWS: u32 = 50;
pub const HEADER_SCAN_COLS: u32 = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlossaryEntry {
    pub source_term: String,
    pub target_term: String,
    pub priority: i64,
}

impl GlossaryEntry {
    fn sort_key(&self) -> Reverse<(usize, i64)> {
        Reverse((self.source_term.chars().count(), self.priority))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlossaryRow {
    pub source: String,
    pub target: String,
    pub priority: i64,
}

impl<S: Into<String>, T: Into<String>> From<(S, T)> for GlossaryRow {
    fn from((source, target): (S, T)) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            priority: 0,
        }
    }
}

#[derive(Debug)]
pub struct GlossaryLoad {
    pub store: GlossaryStore,
    pub warnings: Vec<GlossaryDuplicateWarning>,
}

#[derive(Clone, Debug, Default)]
pub struct GlossaryStore {
    entries: Vec<GlossaryEntry>,
    exact: HashMap<String, usize>,
    substring_terms: Vec<usize>,
}

impl GlossaryStore {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load<I, R>(rows: I) -> GlossaryLoad
    where
        I: IntoIterator<Item = R>,
        R: Into<GlossaryRow>,
    {
        let mut entries: Vec<GlossaryEntry> = Vec::new();
        let mut slot_of: HashMap<String, usize> = HashMap::new();
        let mut seen: Vec<usize> = Vec::new();

        for row in rows {
            let row: GlossaryRow = row.into();
            let src = normalize(&row.source);
            let tgt = row.target.trim();
            if src.is_empty() || tgt.is_empty() {
                continue;
            }
            match slot_of.get(&src) {
                Some(&slot) => {
                    let e = &mut entries[slot];
                    e.target_term = tgt.to_string();
                    e.priority = row.priority;
                    seen[slot] += 1;
                }
                None => {
                    slot_of.insert(src.clone(), entries.len());
                    entries.push(GlossaryEntry {
                        source_term: src,
                        target_term: tgt.to_string(),
                        priority: row.priority,
                    });
                    seen.push(1);
                }
            }
        }

        let warnings: Vec<GlossaryDuplicateWarning> = entries
            .iter()
            .zip(seen.iter())
            .filter(|(_, n)| **n > 1)
            .map(|(e, &n)| GlossaryDuplicateWarning {
                source_term: e.source_term.clone(),
                occurrences: n,
                kept_target: e.target_term.clone(),
            })
            .collect();

        // Stable: equal (length, priority) keep load order.
        entries.sort_by_key(GlossaryEntry::sort_key);

        let exact = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.source_term.clone(), i))
            .collect();
        let substring_terms = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| has_source_script(&e.source_term))
            .map(|(i, _)| i)
            .collect();

        GlossaryLoad {
            store: Self {
                entries,
                exact,
                substring_terms,
            },
            warnings,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    pub fn exact_target(&self, normalized: &str) -> Option<&str> {
        self.exact
            .get(normalized)
            .map(|&i| self.entries[i].target_term.as_str())
            .filter(|t| !t.is_empty())
    }

    pub fn substring_terms(&self) -> impl Iterator<Item = &GlossaryEntry> {
        self.substring_terms.iter().map(move |&i| &self.entries[i])
    }
}

#[derive(Clone, Debug)]
pub struct GlossarySource {
    pub sheet: Option<String>,
    pub cn_header: String,
    pub en_header: String,
    pub priority_header: Option<String>,
}

impl Default for GlossarySource {
    fn default() -> Self {
        Self {
            sheet: None,
            cn_header: "CN".to_string(),
            en_header: "EN".to_string(),
            priority_header: Some("PRIORITY".to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HeaderMap {
    pub row: u32,
    pub columns: HashMap<String, u32>,
}

impl HeaderMap {
    pub fn column(&self, label: &str) -> Option<u32> {
        self.columns.get(label).copied()
    }
}

/// Find the first row (within the scan window) that carries every required label.
pub fn resolve_headers(
    sheet: &Sheet,
    required: &[&str],
) -> Result<HeaderMap, GlossaryFormatError> {
    let max_row = sheet.max_row().min(HEADER_SCAN_ROWS);
    let max_col = sheet.max_col().min(HEADER_SCAN_COLS);
    let mut first_seen: Option<Vec<String>> = None;

    for r in 1..=max_row {
        let mut columns: HashMap<String, u32> = HashMap::new();
        let mut labels: Vec<String> = Vec::new();
        for c in 1..=max_col {
            let Some(text) = sheet.get(CellRef::new(r, c)).and_then(|v| v.as_text()) else {
                continue;
            };
            let label = text.trim();
            if label.is_empty() {
                continue;
            }
            labels.push(label.to_string());
            columns.entry(label.to_string()).or_insert(c);
        }
        if required.iter().all(|h| columns.contains_key(*h)) {
            return Ok(HeaderMap { row: r, columns });
        }
        if first_seen.is_none() && !labels.is_empty() {
            first_seen = Some(labels);
        }
    }

    Err(GlossaryFormatError::MissingHeaders {
        required: required.iter().map(|s| s.to_string()).collect(),
        found: first_seen.unwrap_or_default(),
    })
}

pub fn read_glossary_rows(
    workbook: &Workbook,
    source: &GlossarySource,
) -> Result<Vec<GlossaryRow>, GlossaryFormatError> {
    let sheet = match source.sheet.as_deref() {
        Some(name) => workbook
            .sheet(name)
            .ok_or_else(|| GlossaryFormatError::MissingSheet {
                name: name.to_string(),
                available: workbook.sheet_names().iter().map(|s| s.to_string()).collect(),
            })?,
        None => workbook.active_sheet().ok_or(GlossaryFormatError::NoSheets)?,
    };

    let headers = resolve_headers(sheet, &[source.cn_header.as_str(), source.en_header.as_str()])?;
    let cn_col = headers.column(&source.cn_header).unwrap_or_default();
    let en_col = headers.column(&source.en_header).unwrap_or_default();
    let prio_col = source
        .priority_header
        .as_deref()
        .and_then(|h| headers.column(h));

    let cell_text = |r: u32, c: u32| -> Option<String> {
        sheet.get(CellRef::new(r, c)).and_then(|v| v.display_text())
    };

    let mut rows = Vec::new();
    for r in headers.row + 1..=sheet.max_row() {
        let (Some(src), Some(tgt)) = (cell_text(r, cn_col), cell_text(r, en_col)) else {
            continue;
        };
        let priority = prio_col
            .and_then(|c| cell_text(r, c))
            .and_then(|p| parse_priority(&p))
            .unwrap_or(0);
        rows.push(GlossaryRow {
            source: src,
            target: tgt,
            priority,
        });
    }
    Ok(rows)
}

// Spreadsheet numbers often come back as "2.0".
fn parse_priority(text: &str) -> Option<i64> {
    let t = text.trim();
    t.parse::<i64>()
        .ok()
        .or_else(|| t.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
}

pub fn load_glossary_xlsx(
    path: &Path,
    source: &GlossarySource,
) -> Result<GlossaryLoad, GlossaryLoadError> {
    let doc = XlsxDocument::open(path).map_err(|e| DocumentIoError::new(path, e))?;
    let rows = read_glossary_rows(doc.workbook(), source)?;
    Ok(GlossaryStore::load(rows))
}
