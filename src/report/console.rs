use crate::fill::{FillMethod, FillReport};
use crate::scan::ScanResult;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a fill report for terminal output.
///
/// Produces output like:
/// ```text
/// === Fill Report (2 passes) ===
///
/// ✓ FILLED   first_name = "Ada" (text)
/// ✓ FILLED   country = "United States" (select, matched "United States of America" via canonical)
/// ✗ ERROR    visa: no option matches 'Maybe' (options: Yes, No)
/// - SKIPPED  essay: needs human attention
/// ? MISSING  linkedin
///
/// ! page navigated during fill pass 2; 1 remaining entry not applied
///
/// === Results: 2 filled, 1 errors, 1 skipped, 1 not found ===
/// ```
pub fn format_console_report(report: &FillReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== Fill Report ({} pass{}) ===\n\n",
        report.iterations,
        if report.iterations == 1 { "" } else { "es" }
    ));

    for filled in &report.filled {
        out.push_str(&format!(
            "\u{2713} FILLED   {} = {:?} ({}",
            filled.id,
            filled.value,
            method_label(filled.method)
        ));
        if let Some(ref option) = filled.matched_option {
            out.push_str(&format!(", matched {:?}", option));
            if let Some(rung) = filled.rung {
                out.push_str(&format!(" via {}", rung.as_str()));
            }
        }
        out.push_str(")\n");
    }

    for error in &report.errors {
        out.push_str(&format!("\u{2717} ERROR    {}: {}\n", error.id, error.issue));
    }

    for skipped in &report.skipped {
        out.push_str(&format!(
            "- SKIPPED  {}: {}\n",
            skipped.id,
            skipped.reason.describe()
        ));
    }

    for id in &report.not_found {
        out.push_str(&format!("? MISSING  {}\n", id));
    }

    if !report.warnings.is_empty() {
        out.push('\n');
        for warning in &report.warnings {
            out.push_str(&format!("! {}\n", warning));
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} filled, {} errors, {} skipped, {} not found ===\n",
        report.filled.len(),
        report.errors.len(),
        report.skipped.len(),
        report.not_found.len()
    ));

    out
}

/// One line per scanned field, for `scan` when stdout is not the target.
pub fn format_scan_summary(scan: &ScanResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== Scan: {} fields, {} actions ===\n",
        scan.fields.len(),
        scan.actions.len()
    ));
    for field in &scan.fields {
        let marker = if field.required { "*" } else { " " };
        out.push_str(&format!(
            "{} {:<30} {:<14} {}",
            marker,
            field.id,
            field.kind.as_str(),
            field.label
        ));
        if let Some(options) = &field.options {
            out.push_str(&format!(" [{} options]", options.len()));
        }
        out.push('\n');
    }
    out
}

fn method_label(method: FillMethod) -> &'static str {
    match method {
        FillMethod::Toggle => "toggle",
        FillMethod::SelectValue => "select",
        FillMethod::TypeAndSelect => "type and select",
        FillMethod::ButtonClick => "button click",
        FillMethod::TextInput => "text",
        FillMethod::Upload => "upload",
        FillMethod::AlreadySet => "already set",
    }
}
