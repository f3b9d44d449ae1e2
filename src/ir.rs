use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// 1-based cell position. Ordering is row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style reference such as `C12` (`$` markers are ignored).
    pub fn parse(a1: &str) -> Option<Self> {
        let mut col: u32 = 0;
        let mut row: u32 = 0;
        let mut seen_digit = false;
        for ch in a1.trim().chars() {
            match ch {
                '$' => continue,
                c if c.is_ascii_alphabetic() && !seen_digit => {
                    let v = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
                    col = col.checked_mul(26)?.checked_add(v)?;
                }
                c if c.is_ascii_digit() => {
                    seen_digit = true;
                    row = row.checked_mul(10)?.checked_add(c as u32 - '0' as u32)?;
                }
                _ => return None,
            }
        }
        if col == 0 || row == 0 {
            return None;
        }
        Some(Self { row, col })
    }

    pub fn column_letter(&self) -> String {
        column_letter(self.col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.col), self.row)
    }
}

/// 1 -> "A", 26 -> "Z", 27 -> "AA".
pub fn column_letter(col: u32) -> String {
    let mut n = col;
    let mut out: Vec<u8> = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        out.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(String),
    Bool(bool),
    Error(String),
    Formula {
        formula: String,
        cached: Option<String>,
    },
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn display_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(n.clone()),
            CellValue::Bool(true) => Some("TRUE".to_string()),
            CellValue::Bool(false) => Some("FALSE".to_string()),
            CellValue::Error(e) => Some(e.clone()),
            CellValue::Formula { cached, .. } => cached.clone(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<CellRef, CellValue>,
    dirty: BTreeSet<CellRef>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    // Load-time insert: the cell is not marked dirty.
    pub fn insert(&mut self, at: CellRef, value: CellValue) {
        self.cells.insert(at, value);
    }

    pub fn get(&self, at: CellRef) -> Option<&CellValue> {
        self.cells.get(&at)
    }

    pub fn set_text(&mut self, at: CellRef, text: impl Into<String>) {
        self.cells.insert(at, CellValue::Text(text.into()));
        self.dirty.insert(at);
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellRef, &CellValue)> {
        self.cells.iter().map(|(k, v)| (*k, v))
    }

    pub fn text_cells(&self) -> Vec<(CellRef, String)> {
        self.cells
            .iter()
            .filter_map(|(k, v)| v.as_text().map(|s| (*k, s.to_string())))
            .collect()
    }

    pub fn dirty_cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        self.dirty.iter().copied()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn max_row(&self) -> u32 {
        self.cells.keys().map(|c| c.row).max().unwrap_or(0)
    }

    pub fn max_col(&self) -> u32 {
        self.cells.keys().map(|c| c.col).max().unwrap_or(0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    active: usize,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets, active: 0 }
    }

    /// Mark the sheet at `index` as the one the workbook opens on. Out of range falls back to
    /// the first sheet.
    pub fn set_active(&mut self, index: usize) {
        self.active = if index < self.sheets.len() { index } else { 0 };
    }

    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.sheets.get(self.active).or_else(|| self.sheets.first())
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}
