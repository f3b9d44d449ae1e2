use std::collections::HashMap;

use anyhow::{anyhow, Context};

use crate::ir::{CellRef, Sheet};

use super::workbook::{CellSpan, SheetPart};
use super::xml::{name_prefix, XmlEvent};

/// Rewrite dirty cells as inline strings, keeping every other attribute of `<c>`.
pub fn apply_sheet_edits(part: &mut SheetPart, sheet: &Sheet) -> anyhow::Result<usize> {
    let mut edits: Vec<(CellSpan, CellRef, &str)> = Vec::new();
    for at in sheet.dirty_cells() {
        let span = *part
            .spans
            .get(&at)
            .with_context(|| format!("cell {at} of sheet {} has no element to patch", sheet.name))?;
        let text = sheet
            .get(at)
            .and_then(|v| v.as_text())
            .ok_or_else(|| anyhow!("dirty cell {at} of sheet {} is not text", sheet.name))?;
        edits.push((span, at, text));
    }

    // Splice back to front so earlier spans stay valid.
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    for (span, at, text) in &edits {
        let replacement = inline_string_cell(&part.xml.events, *span, text)
            .with_context(|| format!("patch cell {at} of sheet {}", sheet.name))?;
        part.xml.events.splice(span.start..=span.end, replacement);
    }

    let applied = edits.len();
    if applied > 0 {
        reindex(part, &edits);
    }
    Ok(applied)
}

fn inline_string_cell(
    events: &[XmlEvent],
    span: CellSpan,
    text: &str,
) -> anyhow::Result<Vec<XmlEvent>> {
    let (name, attrs) = match events.get(span.start) {
        Some(XmlEvent::Start { name, attrs }) | Some(XmlEvent::Empty { name, attrs }) => {
            (name, attrs)
        }
        _ => return Err(anyhow!("expected cell element at event {}", span.start)),
    };
    let prefix = name_prefix(name);
    let mut attrs: Vec<(String, String)> =
        attrs.iter().filter(|(k, _)| k != "t").cloned().collect();
    attrs.push(("t".to_string(), "inlineStr".to_string()));

    Ok(vec![
        XmlEvent::Start {
            name: name.clone(),
            attrs,
        },
        XmlEvent::Start {
            name: format!("{prefix}is"),
            attrs: Vec::new(),
        },
        XmlEvent::Start {
            name: format!("{prefix}t"),
            attrs: vec![("xml:space".to_string(), "preserve".to_string())],
        },
        XmlEvent::Text {
            text: text.to_string(),
        },
        XmlEvent::End {
            name: format!("{prefix}t"),
        },
        XmlEvent::End {
            name: format!("{prefix}is"),
        },
        XmlEvent::End { name: name.clone() },
    ])
}

fn reindex(part: &mut SheetPart, edits: &[(CellSpan, CellRef, &str)]) {
    const PATCHED_LEN: usize = 7;
    let mut ascending: Vec<(CellSpan, CellRef)> =
        edits.iter().map(|(s, at, _)| (*s, *at)).collect();
    ascending.sort_by_key(|(s, _)| s.start);

    let shift_at = |idx: usize| -> isize {
        ascending
            .iter()
            .take_while(|(s, _)| s.end < idx)
            .map(|(s, _)| PATCHED_LEN as isize - (s.end - s.start + 1) as isize)
            .sum()
    };

    let mut updated: HashMap<CellRef, CellSpan> = HashMap::with_capacity(part.spans.len());
    for (at, span) in &part.spans {
        let new_span = if let Some((s, _)) = ascending.iter().find(|(_, e)| e == at) {
            let start = (s.start as isize + shift_at(s.start)) as usize;
            CellSpan {
                start,
                end: start + PATCHED_LEN - 1,
            }
        } else {
            let delta = shift_at(span.start);
            CellSpan {
                start: (span.start as isize + delta) as usize,
                end: (span.end as isize + delta) as usize,
            }
        };
        updated.insert(*at, new_span);
    }
    part.spans = updated;
}
