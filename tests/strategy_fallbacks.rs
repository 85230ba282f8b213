mod support;

use assert_matches::assert_matches;
use std::path::PathBuf;
use support::{TestWorkspace, make_result_set, text};
use vendor_report::strategy::{OutputStrategy, plan, select_and_produce};
use vendor_report::template::locate;
use vendor_report::{
    OutputFormat, OutputMethod, ReportError, TabMapping, TemplateDescriptor, TemplateFormat,
};

fn summary_only() -> Vec<vendor_report::ResultSet> {
    vec![make_result_set(
        "Summary_Metrics",
        &["VENDOR_NAME"],
        vec![vec![text("ACME")]],
    )]
}

#[test]
fn plan_always_ends_in_blank_workbook() {
    let strategies = plan(true, None, OutputFormat::Xlsx);
    assert_eq!(strategies.len(), 1);
    assert!(matches!(strategies[0], OutputStrategy::BlankWorkbook(_)));

    let descriptor = TemplateDescriptor {
        path: PathBuf::from("Template.xlsm"),
        format: TemplateFormat::MacroEnabled,
    };
    let strategies = plan(true, Some(descriptor), OutputFormat::Xlsx);
    assert_eq!(strategies.len(), 2);
    assert!(matches!(strategies[0], OutputStrategy::CopyTemplate(_)));
    assert!(matches!(strategies[1], OutputStrategy::BlankWorkbook(_)));
}

#[test]
fn templates_are_ignored_when_disabled() {
    let descriptor = TemplateDescriptor {
        path: PathBuf::from("Template.xlsm"),
        format: TemplateFormat::MacroEnabled,
    };
    let strategies = plan(false, Some(descriptor), OutputFormat::Xlsx);
    assert_eq!(strategies.len(), 1);
    assert!(matches!(strategies[0], OutputStrategy::BlankWorkbook(_)));
}

#[test]
fn blank_workbook_produces_xlsx() {
    let ws = TestWorkspace::new();
    let (path, method, report) = select_and_produce(
        plan(false, None, OutputFormat::Xlsx),
        ws.root(),
        "12345 - ACME - APR 2025",
        &TabMapping::default(),
        &summary_only(),
    )
    .expect("blank workbook build");

    assert_eq!(method, OutputMethod::BlankWorkbook);
    assert_eq!(
        path.extension().and_then(|e| e.to_str()),
        Some("xlsx")
    );
    assert!(path.is_file());
    assert_eq!(report.sheets.len(), 1);
    assert_eq!(report.skipped.len(), 2);
}

#[test]
fn macro_template_produces_xlsm_via_copy() {
    let ws = TestWorkspace::new();
    ws.create_workbook("templates/Vendor_Performance_Template.xlsm", |book| {
        let sheet = book.new_sheet("Tab1_Summary_Metrics").expect("new sheet");
        sheet.get_cell_mut("A1").set_value("Vendor");
    });
    let located = locate(
        None,
        &[ws.path("templates")],
        "Vendor_Performance_Template.xlsm",
    )
    .expect("template located");
    assert_eq!(located.format, TemplateFormat::MacroEnabled);

    let (path, method, report) = select_and_produce(
        plan(true, Some(located), OutputFormat::Xlsx),
        ws.root(),
        "12345 - ACME - APR 2025",
        &TabMapping::default(),
        &summary_only(),
    )
    .expect("template build");

    assert_eq!(method, OutputMethod::MacroTemplate);
    assert_eq!(
        path.extension().and_then(|e| e.to_str()),
        Some("xlsm")
    );
    assert!(path.is_file());
    assert_eq!(report.sheets.len(), 1);
}

#[test]
fn failed_copy_falls_back_to_blank_workbook() {
    let ws = TestWorkspace::new();
    // The descriptor points at a file that disappeared after location.
    let descriptor = TemplateDescriptor {
        path: ws.path("gone/Template.xlsm"),
        format: TemplateFormat::MacroEnabled,
    };

    let (path, method, _) = select_and_produce(
        plan(true, Some(descriptor), OutputFormat::Xlsx),
        ws.root(),
        "12345 - ACME - APR 2025",
        &TabMapping::default(),
        &summary_only(),
    )
    .expect("fallback build");

    assert_eq!(method, OutputMethod::BlankWorkbook);
    assert_eq!(
        path.extension().and_then(|e| e.to_str()),
        Some("xlsx")
    );
    assert!(path.is_file());
}

#[test]
fn unreadable_template_copy_falls_back_and_cleans_up() {
    let ws = TestWorkspace::new();
    // Copies fine, but is not a workbook the populator can open.
    let template = ws.create_fake_macro_archive("templates/Template.xlsm");
    let descriptor = TemplateDescriptor {
        path: template,
        format: TemplateFormat::MacroEnabled,
    };

    let (path, method, _) = select_and_produce(
        plan(true, Some(descriptor), OutputFormat::Xlsx),
        ws.root(),
        "12345 - ACME - APR 2025",
        &TabMapping::default(),
        &summary_only(),
    )
    .expect("fallback build");

    assert_eq!(method, OutputMethod::BlankWorkbook);
    assert!(path.is_file());
    // The failed .xlsm copy must not be left next to the real output.
    assert!(!ws.path("12345 - ACME - APR 2025.xlsm").exists());
}

#[test]
fn blank_workbook_honors_preferred_format() {
    let ws = TestWorkspace::new();
    let (path, method, _) = select_and_produce(
        plan(false, None, OutputFormat::Xlsm),
        ws.root(),
        "12345 - ACME - APR 2025",
        &TabMapping::default(),
        &summary_only(),
    )
    .expect("blank workbook build");

    assert_eq!(method, OutputMethod::BlankWorkbook);
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsm"));
    assert!(path.is_file());
}

#[test]
fn template_format_beats_preferred_format() {
    let ws = TestWorkspace::new();
    ws.create_workbook("templates/Template.xlsx", |book| {
        book.new_sheet("Tab1_Summary_Metrics").expect("new sheet");
    });
    let located = locate(None, &[ws.path("templates")], "Template.xlsx")
        .expect("template located");

    let (path, method, _) = select_and_produce(
        plan(true, Some(located), OutputFormat::Xlsm),
        ws.root(),
        "12345 - ACME - APR 2025",
        &TabMapping::default(),
        &summary_only(),
    )
    .expect("template build");

    assert_eq!(method, OutputMethod::StandardTemplate);
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));
}

#[test]
fn failed_copy_does_not_leave_a_stale_destination() {
    let ws = TestWorkspace::new();
    // A leftover from an earlier run sits at the template output path; the
    // new copy fails because the template itself is gone.
    ws.touch("12345 - ACME - APR 2025.xlsm");
    let descriptor = TemplateDescriptor {
        path: ws.path("gone/Template.xlsm"),
        format: TemplateFormat::MacroEnabled,
    };

    let (path, method, _) = select_and_produce(
        plan(true, Some(descriptor), OutputFormat::Xlsx),
        ws.root(),
        "12345 - ACME - APR 2025",
        &TabMapping::default(),
        &summary_only(),
    )
    .expect("fallback build");

    assert_eq!(method, OutputMethod::BlankWorkbook);
    assert!(path.is_file());
    assert!(!ws.path("12345 - ACME - APR 2025.xlsm").exists());
}

#[test]
fn fatal_error_when_final_fallback_cannot_write() {
    let ws = TestWorkspace::new();
    let missing_dir = ws.path("does/not/exist");

    let error = select_and_produce(
        plan(false, None, OutputFormat::Xlsx),
        &missing_dir,
        "12345 - ACME - APR 2025",
        &TabMapping::default(),
        &summary_only(),
    )
    .expect_err("save into missing directory must fail");

    assert_matches!(error, ReportError::OutputWrite { .. });
}
