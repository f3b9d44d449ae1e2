use once_cell::sync::Lazy;
use regex::Regex;

static WS_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws run"));
static SOURCE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u4e00-\u9fff]+").expect("source run"));

const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// CJK Unified Ideographs, the only script translated away.
pub fn is_source_script(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&ch)
}

pub fn has_source_script(text: &str) -> bool {
    text.chars().any(is_source_script)
}

/// Maximal runs of source-script characters, in order of appearance.
pub fn source_script_runs(text: &str) -> impl Iterator<Item = &str> {
    SOURCE_RUN_RE.find_iter(text).map(|m| m.as_str())
}

/// Canonical whitespace: full-width spaces become ASCII, runs collapse to one space, ends trimmed.
pub fn normalize(raw: &str) -> String {
    let replaced = raw.replace(IDEOGRAPHIC_SPACE, " ");
    WS_RUN_RE.replace_all(&replaced, " ").trim().to_string()
}
