//! CLI argument parsing for klipstats

use clap::Parser;
use std::path::PathBuf;

use crate::export::ExportFormat;
use crate::settings::AnalysisSettings;

#[derive(Parser, Debug)]
#[command(name = "klipstats")]
#[command(version)]
#[command(
    about = "Derive bandwidth, load, clock and temperature series from a Klipper log",
    long_about = None
)]
pub struct Cli {
    /// Klipper host log to analyze (e.g. klippy.log)
    #[arg(value_name = "LOG")]
    pub log: PathBuf,

    /// Name of the primary micro-controller
    #[arg(short = 'm', long = "mcu", value_name = "NAME")]
    pub mcu: Option<String>,

    /// Comma separated heaters for the temperature chart
    #[arg(short = 'H', long = "heaters", value_name = "LIST")]
    pub heaters: Option<String>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "summary")]
    pub format: ExportFormat,

    /// Write output to a file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Indent JSON output
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Read settings from this file instead of the user config directory
    #[arg(short = 's', long = "settings", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Store the effective settings in the user config directory
    #[arg(long = "save-settings")]
    pub save_settings: bool,

    /// Log progress to stderr (repeat for more detail)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Apply command line overrides on top of stored settings
    pub fn apply_overrides(&self, mut settings: AnalysisSettings) -> AnalysisSettings {
        if let Some(mcu) = &self.mcu {
            settings.mcu = mcu.clone();
        }
        if let Some(heaters) = &self.heaters {
            settings.heaters = heaters.clone();
        }
        settings
    }
}
