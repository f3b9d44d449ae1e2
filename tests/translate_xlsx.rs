mod common;

use bom_translator::glossary::{load_glossary_xlsx, GlossarySource};
use bom_translator::ir::{CellRef, CellValue};
use bom_translator::pipeline::{
    translate_batch, translate_file, DocumentJob, QaOutcome, TranslateSettings, WalkOptions,
};
use bom_translator::progress::RunProgress;
use bom_translator::xlsx::XlsxDocument;

use common::{inline, read_entry, write_glossary, write_xlsx, SheetSpec, STYLES_XML};

const BOM_SHARED: &[&str] = &["名称", "导柱组件 x2", "内六角螺栓 M6", "M6x20"];

fn bom_sheet_data() -> String {
    format!(
        concat!(
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s" s="0"><v>0</v></c></row>"#,
            r#"<row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2" t="s"><v>3</v></c><c r="C2"><v>12.5</v></c></row>"#,
            r#"<row r="3"><c r="A3" t="s"><v>2</v></c>{}<c r="C3" t="str"><f>A2</f><v>导柱组件 x2</v></c></row>"#
        ),
        inline("B3", "30mm")
    )
}

fn setup(dir: &std::path::Path) -> (std::path::PathBuf, bom_translator::glossary::GlossaryStore) {
    let glossary = dir.join("WORD LIST.xlsx");
    write_glossary(
        &glossary,
        &[
            ("导柱", "GUIDE PIN"),
            ("导柱组件", "GUIDE PIN ASSEMBLY"),
            ("螺栓", "BOLT"),
            ("名称", "NAME"),
        ],
    );
    let load = load_glossary_xlsx(&glossary, &GlossarySource::default()).expect("glossary");
    assert!(load.warnings.is_empty());

    let input = dir.join("bom.xlsx");
    let data = bom_sheet_data();
    write_xlsx(
        &input,
        &[
            SheetSpec {
                name: "BOM",
                sheet_data: &data,
            },
            SheetSpec {
                name: "Notes",
                sheet_data: r#"<row r="1"><c r="A1" t="inlineStr"><is><t>备注</t></is></c></row>"#,
            },
        ],
        BOM_SHARED,
    );
    (input, load.store)
}

fn job(dir: &std::path::Path, input: &std::path::Path) -> DocumentJob {
    DocumentJob {
        input: input.to_path_buf(),
        output: dir.join("bom_EN.xlsx"),
        qa: dir.join("bom_QA_untranslated.csv"),
    }
}

fn text_at(doc: &XlsxDocument, sheet: &str, a1: &str) -> Option<String> {
    let at = CellRef::parse(a1)?;
    doc.workbook()
        .sheet(sheet)?
        .get(at)
        .and_then(|v| v.as_text())
        .map(str::to_string)
}

#[test]
fn translates_workbook_and_writes_qa_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (input, store) = setup(dir.path());
    let walk = WalkOptions::default();
    let settings = TranslateSettings {
        glossary: &store,
        walk: &walk,
        write_empty_qa: false,
    };
    let job = job(dir.path(), &input);

    let outcome = translate_file(&job, &settings, &RunProgress::new(false)).expect("translate");
    assert_eq!(outcome.qa_rows, 2);
    assert_eq!(outcome.qa_outcome, QaOutcome::Written { rows: 2 });
    assert_eq!(outcome.stats.exact, 2);
    assert_eq!(outcome.stats.skipped, 2);

    let out = XlsxDocument::open(&job.output).expect("open output");
    assert_eq!(text_at(&out, "BOM", "A1").as_deref(), Some("NAME"));
    assert_eq!(text_at(&out, "BOM", "B1").as_deref(), Some("NAME"));
    assert_eq!(text_at(&out, "BOM", "A2").as_deref(), Some("GUIDE PIN ASSEMBLY x2"));
    assert_eq!(text_at(&out, "BOM", "A3").as_deref(), Some("内六角BOLT M6"));
    assert_eq!(text_at(&out, "BOM", "B2").as_deref(), Some("M6x20"));
    assert_eq!(text_at(&out, "BOM", "B3").as_deref(), Some("30mm"));
    assert_eq!(text_at(&out, "Notes", "A1").as_deref(), Some("备注"));

    let bom = out.workbook().sheet("BOM").expect("sheet");
    assert_eq!(
        bom.get(CellRef::new(2, 3)),
        Some(&CellValue::Number("12.5".into()))
    );
    assert_eq!(
        bom.get(CellRef::new(3, 3)),
        Some(&CellValue::Formula {
            formula: "A2".into(),
            cached: Some("导柱组件 x2".into()),
        })
    );

    // Style attribute survives the rewrite.
    let sheet1 = read_entry(&job.output, "xl/worksheets/sheet1.xml").expect("sheet1");
    let sheet_xml = String::from_utf8(sheet1).expect("utf8");
    assert!(sheet_xml.contains(r#"<c r="B1" s="0" t="inlineStr">"#));

    let qa = std::fs::read(&job.qa).expect("qa csv");
    assert!(qa.starts_with(b"\xEF\xBB\xBF"));
    let qa = String::from_utf8_lossy(&qa[3..]).into_owned();
    let lines: Vec<&str> = qa.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "BOM,3,A,A3,内六角螺栓 M6,内六角BOLT M6,内六角");
    assert_eq!(lines[2], "Notes,1,A,A1,备注,备注,备注");
}

#[test]
fn untouched_parts_are_byte_identical() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (input, store) = setup(dir.path());
    let walk = WalkOptions::default();
    let settings = TranslateSettings {
        glossary: &store,
        walk: &walk,
        write_empty_qa: false,
    };
    let job = job(dir.path(), &input);
    translate_file(&job, &settings, &RunProgress::new(false)).expect("translate");

    for name in [
        "xl/styles.xml",
        "xl/sharedStrings.xml",
        "xl/workbook.xml",
        "xl/worksheets/sheet2.xml",
        "[Content_Types].xml",
    ] {
        assert_eq!(
            read_entry(&input, name),
            read_entry(&job.output, name),
            "{name} changed"
        );
    }
    assert_eq!(
        read_entry(&job.output, "xl/styles.xml").as_deref(),
        Some(STYLES_XML.as_bytes())
    );
    assert_ne!(
        read_entry(&input, "xl/worksheets/sheet1.xml"),
        read_entry(&job.output, "xl/worksheets/sheet1.xml")
    );
}

#[test]
fn column_subset_and_stale_report_removal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (input, store) = setup(dir.path());
    let job = job(dir.path(), &input);
    std::fs::write(&job.qa, "stale").expect("stale qa");

    let walk = WalkOptions::from_lists(Some(&["BOM".to_string()]), Some(&["b".to_string()]));
    let settings = TranslateSettings {
        glossary: &store,
        walk: &walk,
        write_empty_qa: false,
    };
    let outcome = translate_file(&job, &settings, &RunProgress::new(false)).expect("translate");
    assert_eq!(outcome.qa_outcome, QaOutcome::Cleared);
    assert!(!job.qa.exists());

    let out = XlsxDocument::open(&job.output).expect("open output");
    assert_eq!(text_at(&out, "BOM", "B1").as_deref(), Some("NAME"));
    // Column A was outside the subset.
    assert_eq!(text_at(&out, "BOM", "A1").as_deref(), Some("名称"));
}

#[test]
fn report_path_that_cannot_be_cleared_does_not_fail_the_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (input, store) = setup(dir.path());
    let job = job(dir.path(), &input);
    std::fs::create_dir(&job.qa).expect("qa dir");
    std::fs::write(job.qa.join("notes.txt"), "keep").expect("qa dir entry");

    // Nothing lives in column Z, so the run has no rows to report.
    let walk = WalkOptions::from_lists(None, Some(&["Z".to_string()]));
    let settings = TranslateSettings {
        glossary: &store,
        walk: &walk,
        write_empty_qa: false,
    };
    let outcome = translate_file(&job, &settings, &RunProgress::new(false)).expect("translate");
    assert_eq!(outcome.qa_outcome, QaOutcome::Cleared);
    assert!(job.output.exists());
    assert!(job.qa.join("notes.txt").exists());
}

#[test]
fn translated_output_is_a_fixed_point() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (input, store) = setup(dir.path());
    let walk = WalkOptions::default();
    let settings = TranslateSettings {
        glossary: &store,
        walk: &walk,
        write_empty_qa: false,
    };
    let first = job(dir.path(), &input);
    translate_file(&first, &settings, &RunProgress::new(false)).expect("first pass");

    let second = DocumentJob {
        input: first.output.clone(),
        output: dir.path().join("again.xlsx"),
        qa: dir.path().join("again.csv"),
    };
    let outcome =
        translate_file(&second, &settings, &RunProgress::new(false)).expect("second pass");
    assert_eq!(outcome.stats.translated(), 0);
    assert_eq!(
        read_entry(&first.output, "xl/worksheets/sheet1.xml"),
        read_entry(&second.output, "xl/worksheets/sheet1.xml")
    );
}

#[test]
fn batch_keeps_going_after_a_bad_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (input, store) = setup(dir.path());
    let broken = dir.path().join("broken.xlsx");
    std::fs::write(&broken, b"not a zip").expect("write broken");

    let walk = WalkOptions::default();
    let settings = TranslateSettings {
        glossary: &store,
        walk: &walk,
        write_empty_qa: true,
    };
    let jobs = vec![
        DocumentJob {
            input: broken.clone(),
            output: dir.path().join("broken_EN.xlsx"),
            qa: dir.path().join("broken_QA_untranslated.csv"),
        },
        job(dir.path(), &input),
    ];
    let summary = translate_batch(&jobs, &settings, &RunProgress::new(false));

    assert!(!summary.is_success());
    assert_eq!(summary.succeeded.len(), 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, "broken.xlsx");
    assert!(!dir.path().join("broken_EN.xlsx").exists());
    assert!(dir.path().join("bom_EN.xlsx").exists());
}

#[test]
fn output_may_not_overwrite_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (input, store) = setup(dir.path());
    let walk = WalkOptions::default();
    let settings = TranslateSettings {
        glossary: &store,
        walk: &walk,
        write_empty_qa: false,
    };
    let job = DocumentJob {
        input: input.clone(),
        output: input.clone(),
        qa: dir.path().join("qa.csv"),
    };
    let before = std::fs::read(&input).expect("read input");
    assert!(translate_file(&job, &settings, &RunProgress::new(false)).is_err());
    assert_eq!(std::fs::read(&input).expect("reread input"), before);
}
