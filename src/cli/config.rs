use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fill::FillConfig;
use crate::resolver::ResolverConfig;
use crate::scan::ScanConfig;

pub const DEFAULT_CONFIG_FILE: &str = "form-autofill.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-autofill",
    version,
    about = "Scan and fill job-application forms from page snapshots"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: form-autofill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Append one JSON line per field outcome to this file
    #[arg(long, global = true)]
    pub trace: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a page snapshot and print its fields, actions and job context
    Scan {
        /// Page snapshot (.json, .yaml or .yml)
        #[arg(long)]
        page: PathBuf,

        /// Field ids to leave out of the result
        #[arg(long)]
        exclude: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Fill a page snapshot from a fixed id -> value mapping
    Fill {
        /// Page snapshot (.json, .yaml or .yml)
        #[arg(long)]
        page: PathBuf,

        /// Mapping file (.json, .yaml or .yml)
        #[arg(long)]
        mapping: PathBuf,

        #[command(flatten)]
        output: FillOutputArgs,
    },

    /// Scan, ask the matching backend for values, then fill
    Autofill {
        /// Page snapshot (.json, .yaml or .yml)
        #[arg(long)]
        page: PathBuf,

        /// Matching backend endpoint (overrides config)
        #[arg(long)]
        endpoint: Option<String>,

        #[command(flatten)]
        output: FillOutputArgs,
    },
}

/// Options shared by `fill` and `autofill`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FillOutputArgs {
    /// Write the filled page snapshot here
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Write the fill report as JSON here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Upload file for a file type, e.g. resume=cv.pdf (repeatable)
    #[arg(long = "file", value_parser = parse_file_arg)]
    pub files: Vec<(String, PathBuf)>,

    /// Plain-text cover letter for cover-letter text fields
    #[arg(long)]
    pub cover_letter: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    /// One line per field
    Text,
}

/// Parse `type=path`.
pub fn parse_file_arg(raw: &str) -> Result<(String, PathBuf), String> {
    let (file_type, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=PATH, got '{}'", raw))?;
    let file_type = file_type.trim();
    if file_type.is_empty() || path.trim().is_empty() {
        return Err(format!("expected TYPE=PATH, got '{}'", raw));
    }
    Ok((file_type.to_string(), PathBuf::from(path.trim())))
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-autofill.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub fill: FillConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// File type -> path, for uploads.
    #[serde(default)]
    pub files: BTreeMap<String, PathBuf>,
}

impl AppConfig {
    /// Fold CLI flags over the file values. Flags win.
    pub fn merge_fill_args(&mut self, args: &FillOutputArgs) {
        for (file_type, path) in &args.files {
            self.files.insert(file_type.clone(), path.clone());
        }
        if let Some(path) = &args.cover_letter {
            self.fill.cover_letter = Some(path.clone());
        }
    }

    pub fn merge_endpoint(&mut self, endpoint: Option<&str>) {
        if let Some(endpoint) = endpoint {
            self.resolver.endpoint = endpoint.to_string();
        }
    }
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing,
/// and defaults plus a warning if it is malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = Path::new(path.unwrap_or(DEFAULT_CONFIG_FILE));
    match std::fs::read_to_string(config_path) {
        Ok(content) if content.trim().is_empty() => AppConfig::default(),
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "ignoring malformed config '{}': {}",
                    config_path.display(),
                    e
                );
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}
