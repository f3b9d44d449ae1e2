use once_cell::sync::Lazy;
use regex::Regex;

use crate::textutil::has_source_script;

static PURE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?\d+(?:\.\d+)?$").expect("pure number regex"));
static DIMENSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\d+(?:\.\d+)?\s*(?:mm|cm|m|inch|in)$").expect("dimension regex")
});
// Part numbers, model codes: "M6x20", "SKD-11", "A1/B2".
static CODE_LIKE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-._/]*$").expect("code regex"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellClass {
    Blank,
    Number,
    Dimension,
    Code,
    Eligible,
}

impl CellClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellClass::Blank => "blank",
            CellClass::Number => "number",
            CellClass::Dimension => "dimension",
            CellClass::Code => "code",
            CellClass::Eligible => "eligible",
        }
    }
}

pub fn classify(text: &str) -> CellClass {
    let s = text.trim();
    if s.is_empty() {
        return CellClass::Blank;
    }
    if PURE_NUMBER_RE.is_match(s) {
        return CellClass::Number;
    }
    if DIMENSION_RE.is_match(s) {
        return CellClass::Dimension;
    }
    if CODE_LIKE_RE.is_match(s) && !has_source_script(s) {
        return CellClass::Code;
    }
    CellClass::Eligible
}

/// Quantities, dimensions and codes are never handed to the substitution engine.
pub fn should_skip(text: &str) -> bool {
    classify(text) != CellClass::Eligible
}
