pub mod apply;
pub mod package;
pub mod workbook;
pub mod xml;

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use anyhow::Context;

use crate::ir::Workbook;

use self::package::XlsxPackage;
use self::workbook::{
    load_part, list_worksheets, office_document_path, parse_shared_strings, parse_worksheet,
    shared_strings_path, SheetPart,
};
use self::xml::write_xml_part;

/// An opened spreadsheet: the raw package, the parsed worksheet parts and the cell view
/// built from them. Saving re-serializes only worksheets that carry edits.
pub struct XlsxDocument {
    package: XlsxPackage,
    parts: Vec<SheetPart>,
    workbook: Workbook,
}

impl XlsxDocument {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let package = XlsxPackage::read(path)?;
        Self::from_package(package).with_context(|| format!("load workbook: {}", path.display()))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> anyhow::Result<Self> {
        Self::from_package(XlsxPackage::from_reader(reader)?)
    }

    pub fn from_package(package: XlsxPackage) -> anyhow::Result<Self> {
        let workbook_part = office_document_path(&package)?;
        let shared = match shared_strings_path(&package, &workbook_part)? {
            Some(p) => load_part(&package, &p)?
                .map(|part| parse_shared_strings(&part))
                .unwrap_or_default(),
            None => Vec::new(),
        };

        let listed = list_worksheets(&package, &workbook_part)?;
        let mut parts = Vec::new();
        let mut sheets = Vec::new();
        for (sheet_name, part_path) in listed.worksheets {
            let xml = load_part(&package, &part_path)?
                .with_context(|| format!("missing worksheet part: {part_path}"))?;
            let (sheet, spans) = parse_worksheet(&sheet_name, &xml, &shared);
            sheets.push(sheet);
            parts.push(SheetPart {
                name: sheet_name,
                xml,
                spans,
            });
        }
        let mut workbook = Workbook::new(sheets);
        workbook.set_active(listed.active);
        Ok(Self {
            package,
            parts,
            workbook,
        })
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    fn patched_parts(&mut self) -> anyhow::Result<HashMap<String, Vec<u8>>> {
        let mut replacements = HashMap::new();
        for (part, sheet) in self.parts.iter_mut().zip(self.workbook.sheets.iter()) {
            if !sheet.is_dirty() {
                continue;
            }
            apply::apply_sheet_edits(part, sheet)?;
            replacements.insert(part.xml.name.clone(), write_xml_part(&part.xml));
        }
        Ok(replacements)
    }

    /// Write the workbook to `path`. Parts without edits are copied byte for byte.
    pub fn save(&mut self, path: &Path) -> anyhow::Result<()> {
        let replacements = self.patched_parts()?;
        self.package.write_with_replacements(path, &replacements)
    }

    pub fn save_to<W: std::io::Write + Seek>(&mut self, writer: W) -> anyhow::Result<W> {
        let replacements = self.patched_parts()?;
        self.package.write_to(writer, &replacements)
    }
}
