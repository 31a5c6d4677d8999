//! klipstats - derive diagnostic series from a Klipper host log
//!
//! Loads the log, runs every series builder and writes the result as JSON or
//! as a short text summary. Drawing the charts is left to other tools.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};

use klipstats::analysis::BuilderRegistry;
use klipstats::cli::Cli;
use klipstats::export::{export_groups, ExportConfig};
use klipstats::parsers::KlippyLog;
use klipstats::settings::AnalysisSettings;

/// Initialize logging to stderr; each -v raises the level one step
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let stored = match &args.settings {
        Some(path) => AnalysisSettings::load_from(path),
        None => AnalysisSettings::load(),
    };
    let settings = args.apply_overrides(stored);
    settings.validate().context("Invalid analysis settings")?;

    if args.save_settings {
        let path = settings.save().context("Failed to save settings")?;
        tracing::info!("Settings stored in {:?}", path);
    }

    let log = KlippyLog::new(&settings.mcu)
        .load_file(&args.log)
        .with_context(|| format!("Failed to load {}", args.log.display()))?;
    if log.is_empty() {
        tracing::warn!("No stats lines found in {}", args.log.display());
    }

    let groups = BuilderRegistry::new(&settings).build_all(&log)?;

    let config = ExportConfig {
        format: args.format,
        pretty: args.pretty,
        source: Some(args.log.display().to_string()),
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            export_groups(&config, log.len(), &groups, &mut out)?;
            out.flush()?;
            tracing::info!("Wrote {} groups to {}", groups.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            export_groups(&config, log.len(), &groups, &mut out)?;
        }
    }

    Ok(())
}
