use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use form_autofill::cli::commands::{cmd_autofill, cmd_fill, cmd_scan};
use form_autofill::cli::config::{Cli, Commands, load_config};
use form_autofill::logging;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the run was clean.
fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    let mut config = load_config(cli.config.as_deref());
    let trace = cli.trace.as_deref();

    match cli.command {
        Commands::Scan {
            page,
            exclude,
            format,
        } => {
            let rendered = cmd_scan(&page, &exclude, format, &config)?;
            println!("{}", rendered);
            Ok(true)
        }
        Commands::Fill {
            page,
            mapping,
            output,
        } => {
            config.merge_fill_args(&output);
            let report = cmd_fill(
                &page,
                &mapping,
                &config,
                output.out.as_deref(),
                output.report.as_deref(),
                trace,
            )
            .context("fill failed")?;
            Ok(report.is_clean())
        }
        Commands::Autofill {
            page,
            endpoint,
            output,
        } => {
            config.merge_fill_args(&output);
            config.merge_endpoint(endpoint.as_deref());
            let report = cmd_autofill(
                &page,
                &config,
                output.out.as_deref(),
                output.report.as_deref(),
                trace,
            )
            .context("autofill failed")?;
            Ok(report.is_clean())
        }
    }
}
