use std::collections::HashMap;

use anyhow::{anyhow, Context};

use crate::ir::{CellRef, CellValue, Sheet};

use super::package::XlsxPackage;
use super::xml::{attr_value, find_attr, local_name, parse_xml_part, XmlEvent, XmlPart};

pub const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";
const ROOT_RELS_PART: &str = "_rels/.rels";
const REL_OFFICE_DOCUMENT: &str = "/officeDocument";
const REL_WORKSHEET: &str = "/worksheet";
const REL_SHARED_STRINGS: &str = "/sharedStrings";

#[derive(Clone, Debug)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// Event index range of one `<c>` element (inclusive on both ends).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSpan {
    pub start: usize,
    pub end: usize,
}

/// A worksheet part as loaded: the parsed XML plus where each cell lives in it.
#[derive(Clone, Debug)]
pub struct SheetPart {
    pub name: String,
    pub xml: XmlPart,
    pub spans: HashMap<CellRef, CellSpan>,
}

/// `xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`
pub fn rels_path_for(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part_name}.rels"),
    }
}

/// Resolve a relationship target against the directory of the part that owns it.
pub fn resolve_target(owner_part: &str, target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        return abs.to_string();
    }
    let mut segs: Vec<&str> = match owner_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segs.pop();
            }
            s => segs.push(s),
        }
    }
    segs.join("/")
}

pub fn load_part(pkg: &XlsxPackage, name: &str) -> anyhow::Result<Option<XmlPart>> {
    match pkg.entry(name) {
        Some(ent) => parse_xml_part(name, &ent.data)
            .with_context(|| format!("parse xml: {name}"))
            .map(Some),
        None => Ok(None),
    }
}

pub fn read_relationships(pkg: &XlsxPackage, rels_path: &str) -> anyhow::Result<Vec<Relationship>> {
    let Some(part) = load_part(pkg, rels_path)? else {
        return Ok(Vec::new());
    };
    let mut rels = Vec::new();
    for ev in &part.events {
        let (XmlEvent::Start { name, attrs } | XmlEvent::Empty { name, attrs }) = ev else {
            continue;
        };
        if local_name(name) != "Relationship" {
            continue;
        }
        let (Some(id), Some(target)) = (attr_value(attrs, "Id"), attr_value(attrs, "Target")) else {
            continue;
        };
        rels.push(Relationship {
            id: id.into_owned(),
            rel_type: attr_value(attrs, "Type").unwrap_or_default().into_owned(),
            target: target.into_owned(),
        });
    }
    Ok(rels)
}

pub fn office_document_path(pkg: &XlsxPackage) -> anyhow::Result<String> {
    let rels = read_relationships(pkg, ROOT_RELS_PART)?;
    Ok(rels
        .iter()
        .find(|r| r.rel_type.ends_with(REL_OFFICE_DOCUMENT))
        .map(|r| resolve_target("", &r.target))
        .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string()))
}

/// Worksheets of a workbook in tab order, plus the position of the one it opens on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetList {
    /// `(sheet name, part path)`. Chartsheets and dialog sheets are left out.
    pub worksheets: Vec<(String, String)>,
    pub active: usize,
}

// `<workbookView activeTab>` counts every tab, chartsheets included.
fn active_tab(part: &XmlPart) -> usize {
    part.events
        .iter()
        .find_map(|ev| match ev {
            XmlEvent::Start { name, attrs } | XmlEvent::Empty { name, attrs }
                if local_name(name) == "workbookView" =>
            {
                Some(find_attr(attrs, "activeTab").and_then(|v| v.trim().parse().ok()))
            }
            _ => None,
        })
        .flatten()
        .unwrap_or(0)
}

pub fn list_worksheets(pkg: &XlsxPackage, workbook_part: &str) -> anyhow::Result<SheetList> {
    let part = load_part(pkg, workbook_part)?
        .ok_or_else(|| anyhow!("missing workbook part: {workbook_part}"))?;
    let rels = read_relationships(pkg, &rels_path_for(workbook_part))?;
    let by_id: HashMap<&str, &Relationship> = rels.iter().map(|r| (r.id.as_str(), r)).collect();
    let active_tab = active_tab(&part);

    let mut list = SheetList::default();
    let mut tab = 0usize;
    for ev in &part.events {
        let (XmlEvent::Start { name, attrs } | XmlEvent::Empty { name, attrs }) = ev else {
            continue;
        };
        if local_name(name) != "sheet" {
            continue;
        }
        let this_tab = tab;
        tab += 1;
        let sheet_name = attr_value(attrs, "name").unwrap_or_default().into_owned();
        let Some(rid) = attrs
            .iter()
            .find(|(k, _)| local_name(k) == "id" && k.contains(':'))
            .map(|(_, v)| v.as_str())
        else {
            continue;
        };
        let Some(rel) = by_id.get(rid) else {
            continue;
        };
        if !rel.rel_type.ends_with(REL_WORKSHEET) {
            continue;
        }
        if this_tab == active_tab {
            list.active = list.worksheets.len();
        }
        list.worksheets.push((sheet_name, resolve_target(workbook_part, &rel.target)));
    }
    Ok(list)
}

pub fn shared_strings_path(
    pkg: &XlsxPackage,
    workbook_part: &str,
) -> anyhow::Result<Option<String>> {
    let rels = read_relationships(pkg, &rels_path_for(workbook_part))?;
    Ok(rels
        .iter()
        .find(|r| r.rel_type.ends_with(REL_SHARED_STRINGS))
        .map(|r| resolve_target(workbook_part, &r.target)))
}

/// Plain text of every `<si>`; rich-text runs are concatenated, phonetic hints dropped.
pub fn parse_shared_strings(part: &XmlPart) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Option<String> = None;
    let mut stack: Vec<&str> = Vec::new();

    for ev in &part.events {
        match ev {
            XmlEvent::Start { name, .. } => {
                let l = local_name(name);
                if l == "si" {
                    current = Some(String::new());
                }
                stack.push(l);
            }
            XmlEvent::Empty { name, .. } => {
                if local_name(name) == "si" {
                    out.push(String::new());
                }
            }
            XmlEvent::End { name } => {
                stack.pop();
                if local_name(name) == "si" {
                    out.push(current.take().unwrap_or_default());
                }
            }
            XmlEvent::Text { .. } | XmlEvent::Verbatim { .. } => {
                let Some(text) = ev.char_data() else {
                    continue;
                };
                if let Some(cur) = current.as_mut() {
                    if stack.last() == Some(&"t") && !stack.contains(&"rPh") {
                        cur.push_str(text);
                    }
                }
            }
            _ => {}
        }
    }
    out
}

#[derive(Default)]
struct PendingCell {
    start: usize,
    at: Option<CellRef>,
    kind: Option<String>,
    formula: Option<String>,
    value: Option<String>,
    inline: Option<String>,
}

impl PendingCell {
    fn into_value(self, shared: &[String]) -> Option<CellValue> {
        if let Some(formula) = self.formula {
            return Some(CellValue::Formula {
                formula,
                cached: self.value.or(self.inline),
            });
        }
        match self.kind.as_deref() {
            Some("s") => {
                let idx: usize = self.value?.trim().parse().ok()?;
                shared.get(idx).cloned().map(CellValue::Text)
            }
            Some("inlineStr") => Some(CellValue::Text(self.inline.unwrap_or_default())),
            Some("str") => self.value.map(CellValue::Text),
            Some("b") => self.value.map(|v| CellValue::Bool(v.trim() == "1")),
            Some("e") => self.value.map(CellValue::Error),
            _ => self.value.map(CellValue::Number),
        }
    }
}

/// Build the in-memory sheet and the cell -> event span index for one worksheet part.
pub fn parse_worksheet(
    sheet_name: &str,
    part: &XmlPart,
    shared: &[String],
) -> (Sheet, HashMap<CellRef, CellSpan>) {
    let mut sheet = Sheet::new(sheet_name);
    let mut spans: HashMap<CellRef, CellSpan> = HashMap::new();

    let mut row: u32 = 0;
    let mut next_col: u32 = 1;
    let mut pending: Option<PendingCell> = None;
    let mut stack: Vec<&str> = Vec::new();

    fn locate(attrs: &[(String, String)], row: &mut u32, next_col: &mut u32) -> CellRef {
        let at = find_attr(attrs, "r")
            .and_then(CellRef::parse)
            .unwrap_or_else(|| CellRef::new((*row).max(1), *next_col));
        *row = at.row;
        *next_col = at.col + 1;
        at
    }

    for (idx, ev) in part.events.iter().enumerate() {
        match ev {
            XmlEvent::Start { name, attrs } | XmlEvent::Empty { name, attrs } => {
                let l = local_name(name);
                let is_empty = matches!(ev, XmlEvent::Empty { .. });
                match l {
                    "row" if pending.is_none() => {
                        row = find_attr(attrs, "r")
                            .and_then(|r| r.trim().parse().ok())
                            .unwrap_or(row + 1);
                        next_col = 1;
                    }
                    "c" if pending.is_none() => {
                        let at = locate(attrs, &mut row, &mut next_col);
                        if is_empty {
                            spans.insert(at, CellSpan { start: idx, end: idx });
                        } else {
                            pending = Some(PendingCell {
                                start: idx,
                                at: Some(at),
                                kind: find_attr(attrs, "t").map(str::to_string),
                                ..PendingCell::default()
                            });
                        }
                    }
                    "f" if pending.is_some() => {
                        if let Some(p) = pending.as_mut() {
                            p.formula.get_or_insert_with(String::new);
                        }
                        if !is_empty {
                            stack.push(l);
                        }
                    }
                    _ => {
                        if !is_empty && pending.is_some() {
                            stack.push(l);
                        }
                    }
                }
            }
            XmlEvent::End { name } => {
                if local_name(name) == "c" {
                    if let Some(p) = pending.take() {
                        let start = p.start;
                        let at = p.at.unwrap_or_else(|| CellRef::new(row.max(1), next_col));
                        spans.insert(at, CellSpan { start, end: idx });
                        if let Some(value) = p.into_value(shared) {
                            sheet.insert(at, value);
                        }
                    }
                    stack.clear();
                } else if pending.is_some() {
                    stack.pop();
                }
            }
            XmlEvent::Text { .. } | XmlEvent::Verbatim { .. } => {
                let (Some(p), Some(text)) = (pending.as_mut(), ev.char_data()) else {
                    continue;
                };
                match stack.last().copied() {
                    Some("v") => p.value.get_or_insert_with(String::new).push_str(text),
                    Some("f") => p.formula.get_or_insert_with(String::new).push_str(text),
                    Some("t") if stack.contains(&"is") && !stack.contains(&"rPh") => {
                        p.inline.get_or_insert_with(String::new).push_str(text)
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    (sheet, spans)
}
