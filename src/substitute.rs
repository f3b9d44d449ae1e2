use crate::glossary::{GlossaryEntry, GlossaryStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMethod {
    /// The whole normalized cell was a glossary key.
    Exact,
    /// One or more terms were replaced inside the text.
    Substring,
    Unchanged,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubstitutionResult {
    pub final_text: String,
    pub changed: bool,
    pub method: MatchMethod,
}

/// Translate one normalized cell value: whole-cell match first, then longest-first substrings.
pub fn substitute(normalized: &str, glossary: &GlossaryStore) -> SubstitutionResult {
    if let Some(target) = glossary.exact_target(normalized) {
        return SubstitutionResult {
            final_text: target.to_string(),
            changed: target != normalized,
            method: MatchMethod::Exact,
        };
    }

    let final_text = replace_longest_first(normalized, glossary.substring_terms());
    let changed = final_text != normalized;
    SubstitutionResult {
        method: if changed {
            MatchMethod::Substring
        } else {
            MatchMethod::Unchanged
        },
        final_text,
        changed,
    }
}

struct Piece {
    text: String,
    // Produced by a replacement; never searched again.
    locked: bool,
}

impl Piece {
    fn open(text: &str) -> Self {
        Self {
            text: text.to_string(),
            locked: false,
        }
    }

    fn locked(text: &str) -> Self {
        Self {
            text: text.to_string(),
            locked: true,
        }
    }
}

/// Apply `terms` in the given order (callers pass longest first). Each term replaces all of
/// its non-overlapping occurrences, scanning left to right, in text that no earlier term
/// produced.
pub fn replace_longest_first<'a>(
    text: &str,
    terms: impl IntoIterator<Item = &'a GlossaryEntry>,
) -> String {
    let mut pieces = vec![Piece::open(text)];

    for term in terms {
        let src = term.source_term.as_str();
        if src.is_empty() || !pieces.iter().any(|p| !p.locked && p.text.contains(src)) {
            continue;
        }
        let mut next: Vec<Piece> = Vec::with_capacity(pieces.len() + 2);
        for piece in pieces {
            if piece.locked || !piece.text.contains(src) {
                next.push(piece);
                continue;
            }
            let mut rest = piece.text.as_str();
            while let Some(pos) = rest.find(src) {
                if pos > 0 {
                    next.push(Piece::open(&rest[..pos]));
                }
                next.push(Piece::locked(&term.target_term));
                rest = &rest[pos + src.len()..];
            }
            if !rest.is_empty() {
                next.push(Piece::open(rest));
            }
        }
        pieces = next;
    }

    pieces.into_iter().map(|p| p.text).collect()
}
