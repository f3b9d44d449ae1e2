#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// One worksheet: name plus the raw `<sheetData>` body.
pub struct SheetSpec<'a> {
    pub name: &'a str,
    pub sheet_data: &'a str,
}

pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/></font></fonts></styleSheet>"#;

/// Build a minimal but well-formed `.xlsx` package.
pub fn build_xlsx(sheets: &[SheetSpec<'_>], shared_strings: &[&str]) -> Vec<u8> {
    build_xlsx_with_active_tab(sheets, shared_strings, None)
}

/// Same as [`build_xlsx`], with a `<workbookView activeTab>` when `active_tab` is set.
pub fn build_xlsx_with_active_tab(
    sheets: &[SheetSpec<'_>],
    shared_strings: &[&str],
    active_tab: Option<usize>,
) -> Vec<u8> {
    let mut w = ZipWriter::new(Cursor::new(Vec::new()));
    let mut put = |name: &str, body: &str| {
        w.start_file(name, SimpleFileOptions::default()).expect("start entry");
        w.write_all(body.as_bytes()).expect("write entry");
    };

    let mut overrides = String::new();
    let mut wb_sheets = String::new();
    let mut wb_rels = String::new();
    for (i, s) in sheets.iter().enumerate() {
        let n = i + 1;
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        wb_sheets.push_str(&format!(
            r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
            s.name
        ));
        wb_rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    let book_views = active_tab
        .map(|t| format!(r#"<bookViews><workbookView activeTab="{t}"/></bookViews>"#))
        .unwrap_or_default();
    let extra = sheets.len() + 1;
    wb_rels.push_str(&format!(
        r#"<Relationship Id="rId{extra}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/><Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        extra + 1
    ));

    put(
        "[Content_Types].xml",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
        ),
    );
    put(
        "_rels/.rels",
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
    );
    put(
        "xl/workbook.xml",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">{book_views}<sheets>{wb_sheets}</sheets></workbook>"#
        ),
    );
    put(
        "xl/_rels/workbook.xml.rels",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{wb_rels}</Relationships>"#
        ),
    );
    put("xl/styles.xml", STYLES_XML);

    let sst: String = shared_strings
        .iter()
        .map(|s| format!("<si><t>{s}</t></si>"))
        .collect();
    put(
        "xl/sharedStrings.xml",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{sst}</sst>"#,
            shared_strings.len()
        ),
    );

    for (i, s) in sheets.iter().enumerate() {
        put(
            &format!("xl/worksheets/sheet{}.xml", i + 1),
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                s.sheet_data
            ),
        );
    }
    drop(put);
    w.finish().expect("finish zip").into_inner()
}

pub fn write_xlsx(path: &Path, sheets: &[SheetSpec<'_>], shared_strings: &[&str]) {
    std::fs::write(path, build_xlsx(sheets, shared_strings)).expect("write xlsx");
}

/// Inline-string cell markup.
pub fn inline(at: &str, text: &str) -> String {
    format!(r#"<c r="{at}" t="inlineStr"><is><t>{text}</t></is></c>"#)
}

/// Glossary workbook with a title row above the header, like the ones people keep by hand.
pub fn write_glossary(path: &Path, rows: &[(&str, &str)]) {
    let mut data = format!(r#"<row r="1">{}</row>"#, inline("A1", "术语表 v3"));
    data.push_str(&format!(
        r#"<row r="2">{}{}</row>"#,
        inline("B2", "CN"),
        inline("C2", "EN")
    ));
    for (i, (cn, en)) in rows.iter().enumerate() {
        let r = i + 3;
        data.push_str(&format!(
            r#"<row r="{r}">{}{}</row>"#,
            inline(&format!("B{r}"), cn),
            inline(&format!("C{r}"), en)
        ));
    }
    write_xlsx(
        path,
        &[SheetSpec {
            name: "Terms",
            sheet_data: &data,
        }],
        &[],
    );
}

pub fn read_entry(xlsx: &Path, name: &str) -> Option<Vec<u8>> {
    use std::io::Read;
    let f = std::fs::File::open(xlsx).expect("open xlsx");
    let mut zip = zip::ZipArchive::new(f).expect("read zip");
    let mut file = zip.by_name(name).ok()?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).expect("read entry");
    Some(buf)
}
