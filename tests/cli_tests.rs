use std::path::{Path, PathBuf};

use clap::Parser;
use form_autofill::cli::commands::{cmd_fill, cmd_scan};
use form_autofill::cli::config::{
    AppConfig, Cli, Commands, FillOutputArgs, OutputFormat, load_config, parse_file_arg,
};
use form_autofill::dom::{Document, ElementTree, PageSnapshot};
use form_autofill::resolver::http::DEFAULT_ENDPOINT;
use serde_json::{Value, json};

mod common;
use common::{select, text_input};

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_scan_defaults() {
    let cli = Cli::parse_from(["form-autofill", "scan", "--page", "page.json"]);
    assert_eq!(cli.verbose, 0);
    assert!(cli.config.is_none());
    match cli.command {
        Commands::Scan { page, exclude, format } => {
            assert_eq!(page, PathBuf::from("page.json"));
            assert!(exclude.is_empty());
            assert_eq!(format, OutputFormat::Json);
        }
        _ => panic!("Expected Scan command"),
    }
}

#[test]
fn cli_parse_scan_all_args() {
    let cli = Cli::parse_from([
        "form-autofill",
        "-vv",
        "scan",
        "--page",
        "page.yaml",
        "--exclude",
        "email",
        "--exclude",
        "phone",
        "--format",
        "yaml",
    ]);
    assert_eq!(cli.verbose, 2);
    match cli.command {
        Commands::Scan { exclude, format, .. } => {
            assert_eq!(exclude, vec!["email", "phone"]);
            assert_eq!(format, OutputFormat::Yaml);
        }
        _ => panic!("Expected Scan command"),
    }
}

#[test]
fn cli_parse_fill_with_outputs() {
    let cli = Cli::parse_from([
        "form-autofill",
        "fill",
        "--page",
        "page.json",
        "--mapping",
        "mapping.yaml",
        "-o",
        "filled.json",
        "--report",
        "report.json",
        "--file",
        "resume=cv.pdf",
        "--file",
        "cover_letter=letter.pdf",
        "--cover-letter",
        "letter.txt",
        "--trace",
        "trace.jsonl",
    ]);
    assert_eq!(cli.trace, Some(PathBuf::from("trace.jsonl")));
    match cli.command {
        Commands::Fill { page, mapping, output } => {
            assert_eq!(page, PathBuf::from("page.json"));
            assert_eq!(mapping, PathBuf::from("mapping.yaml"));
            assert_eq!(output.out, Some(PathBuf::from("filled.json")));
            assert_eq!(output.report, Some(PathBuf::from("report.json")));
            assert_eq!(
                output.files,
                vec![
                    ("resume".to_string(), PathBuf::from("cv.pdf")),
                    ("cover_letter".to_string(), PathBuf::from("letter.pdf")),
                ]
            );
            assert_eq!(output.cover_letter, Some(PathBuf::from("letter.txt")));
        }
        _ => panic!("Expected Fill command"),
    }
}

#[test]
fn cli_parse_autofill_endpoint() {
    let cli = Cli::parse_from([
        "form-autofill",
        "autofill",
        "--page",
        "page.json",
        "--endpoint",
        "http://matcher:8080/api/match-fields",
        "--config",
        "custom.yaml",
    ]);
    assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
    match cli.command {
        Commands::Autofill { endpoint, output, .. } => {
            assert_eq!(endpoint.as_deref(), Some("http://matcher:8080/api/match-fields"));
            assert!(output.files.is_empty());
        }
        _ => panic!("Expected Autofill command"),
    }
}

#[test]
fn cli_rejects_malformed_file_flag() {
    let result = Cli::try_parse_from([
        "form-autofill",
        "fill",
        "--page",
        "p.json",
        "--mapping",
        "m.json",
        "--file",
        "cv.pdf",
    ]);
    assert!(result.is_err());
}

#[test]
fn parse_file_arg_cases() {
    assert_eq!(
        parse_file_arg("resume = ./docs/cv.pdf").unwrap(),
        ("resume".to_string(), PathBuf::from("./docs/cv.pdf"))
    );
    assert!(parse_file_arg("=cv.pdf").is_err());
    assert!(parse_file_arg("resume=").is_err());
    assert!(parse_file_arg("resume").is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn load_config_missing_file_gives_defaults() {
    let config = load_config(Some("/nonexistent/form-autofill.yaml"));
    assert_eq!(config.fill.max_iterations, 5);
    assert_eq!(config.resolver.endpoint, DEFAULT_ENDPOINT);
    assert!(config.files.is_empty());
}

#[test]
fn load_config_reads_partial_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("form-autofill.yaml");
    std::fs::write(
        &path,
        "fill:\n  max_iterations: 3\nresolver:\n  endpoint: http://matcher/api/match-fields\nscan:\n  boolean_keywords: [\"relocate\"]\nfiles:\n  resume: cv.pdf\n",
    )
    .unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.fill.max_iterations, 3);
    assert_eq!(config.fill.rescan_delay_ms, 800);
    assert_eq!(config.resolver.endpoint, "http://matcher/api/match-fields");
    assert_eq!(config.resolver.timeout_secs, 60);
    assert_eq!(config.scan.boolean_keywords, vec!["relocate"]);
    assert_eq!(config.files["resume"], PathBuf::from("cv.pdf"));
}

#[test]
fn load_config_malformed_or_empty_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.yaml");
    std::fs::write(&broken, "fill: [not, a, map").unwrap();
    assert_eq!(load_config(broken.to_str()).fill.max_iterations, 5);

    let empty = dir.path().join("empty.yaml");
    std::fs::write(&empty, "\n").unwrap();
    assert_eq!(load_config(empty.to_str()).fill.max_iterations, 5);
}

#[test]
fn flags_override_config_values() {
    let mut config = AppConfig::default();
    config.files.insert("resume".into(), PathBuf::from("old.pdf"));
    let args = FillOutputArgs {
        files: vec![("resume".into(), PathBuf::from("new.pdf"))],
        cover_letter: Some(PathBuf::from("letter.txt")),
        ..FillOutputArgs::default()
    };
    config.merge_fill_args(&args);
    config.merge_endpoint(Some("http://other/api"));
    config.merge_endpoint(None);

    assert_eq!(config.files["resume"], PathBuf::from("new.pdf"));
    assert_eq!(config.fill.cover_letter, Some(PathBuf::from("letter.txt")));
    assert_eq!(config.resolver.endpoint, "http://other/api");
}

// ============================================================================
// Command Tests
// ============================================================================

fn write_page(dir: &Path) -> PathBuf {
    let path = dir.join("page.json");
    let snapshot = json!({
        "url": "https://jobs.lever.co/acme/123/apply",
        "title": "Backend Engineer - Acme",
        "body": [
            text_input("full_name", "Full name"),
            text_input("email", "Email"),
            select("work_auth", "Are you authorized to work in the US?", &[("", "Select"), ("1", "Yes"), ("0", "No")]),
            { "tag": "button", "attrs": { "type": "submit" }, "text": "Submit application" }
        ]
    });
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    path
}

#[test]
fn scan_command_reports_fields_actions_and_job() {
    let dir = tempfile::tempdir().unwrap();
    let page = write_page(dir.path());

    let rendered = cmd_scan(&page, &["email".to_string()], OutputFormat::Json, &AppConfig::default()).unwrap();
    let output: Value = serde_json::from_str(&rendered).unwrap();

    let ids: Vec<&str> = output["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["full_name", "work_auth"]);
    assert_eq!(output["actions"][0]["text"], "Submit application");
    assert_eq!(output["job"]["companyName"], "Acme");
    assert_eq!(output["job"]["roleTitle"], "Backend Engineer");
}

#[test]
fn scan_command_renders_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let page = write_page(dir.path());
    let rendered = cmd_scan(&page, &[], OutputFormat::Yaml, &AppConfig::default()).unwrap();
    let output: Value = serde_yaml::from_str(&rendered).unwrap();
    assert_eq!(output["fields"].as_array().unwrap().len(), 3);
}

#[test]
fn fill_command_writes_snapshot_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let page = write_page(dir.path());
    let mapping = dir.path().join("mapping.yaml");
    std::fs::write(&mapping, "full_name: Ada Lovelace\nwork_auth: true\nlinkedin: https://example.com/ada\n").unwrap();
    let out = dir.path().join("filled.json");
    let report_path = dir.path().join("report.json");

    let report = cmd_fill(
        &page,
        &mapping,
        &AppConfig::default(),
        Some(&out),
        Some(&report_path),
        None,
    )
    .unwrap();
    assert_eq!(report.filled_ids(), vec!["full_name", "work_auth"]);
    assert_eq!(report.not_found, vec!["linkedin"]);

    let filled = Document::from_snapshot(&PageSnapshot::load(&out).unwrap());
    let name = filled.element_by_id("full_name").unwrap();
    let auth = filled.element_by_id("work_auth").unwrap();
    assert_eq!(filled.value(name), "Ada Lovelace");
    assert_eq!(filled.value(auth), "1");

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written["filled"].as_array().unwrap().len(), 2);
    assert_eq!(written["notFound"], json!(["linkedin"]));
}

#[test]
fn fill_command_fails_on_missing_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let page = write_page(dir.path());
    let err = cmd_fill(
        &page,
        &dir.path().join("absent.json"),
        &AppConfig::default(),
        None,
        None,
        None,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}

#[test]
fn scan_command_renders_text_summary() {
    let dir = tempfile::tempdir().unwrap();
    let page = write_page(dir.path());
    let rendered = cmd_scan(&page, &[], OutputFormat::Text, &AppConfig::default()).unwrap();
    assert!(rendered.starts_with("=== Scan: 3 fields, 1 actions ==="));
    assert!(rendered.contains("work_auth"));
}

#[test]
fn verbosity_maps_to_log_level() {
    use form_autofill::logging::default_level;
    assert_eq!(default_level(0), "warn");
    assert_eq!(default_level(1), "info");
    assert_eq!(default_level(2), "debug");
    assert_eq!(default_level(7), "trace");
}
