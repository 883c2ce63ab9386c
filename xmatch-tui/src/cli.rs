//! Command line for the XMATCH binary.
//!
//! Unique tags are generated for each object in the format
//! `<radio_host_ID>*<infrared_host_ID>*m<#_of_components>*C<component_#>`.
//! Press `h` in the identification window for the key bindings.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use xmatch_core::RunMode;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "xmatch",
    about = "Interactive cross-identification of infrared and radio catalogues",
    long_about = "Interactive program for catalogue cross-identification.\n\
                  Displays the infrared heatmap cutout with catalogue sources \
                  overlaid and walks each radio source through infrared host, \
                  radio core, and radio component selection. Output tables land \
                  under <output_root>/tables, figures under <output_root>/figures."
)]
pub struct Cli {
    /// Field to work on; must be present in the configuration file.
    pub field: String,

    /// Verbose (debug-level) logging.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Log render and save timings (needs verbose mode to be visible).
    #[arg(short = 't', long = "timings")]
    pub timings: bool,

    /// Process only sources previously deferred as tricky.
    #[arg(short = 'x', long = "tricky")]
    pub tricky: bool,

    /// Demo run: writes under demo_output/ with a demo- filename prefix.
    #[arg(short = 'd', long = "demo")]
    pub demo: bool,

    /// Export a figure for each identified source in this format.
    #[arg(long = "savefigs", value_enum)]
    pub savefigs: Option<FigureFormat>,

    /// Configuration file path (or set XMATCH_CONFIG).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn run_mode(&self) -> RunMode {
        if self.tricky {
            RunMode::TrickyOnly
        } else {
            RunMode::Normal
        }
    }
}

/// Export format for auto-saved per-source figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FigureFormat {
    Png,
    Eps,
    Pdf,
}

impl FigureFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FigureFormat::Png => "png",
            FigureFormat::Eps => "eps",
            FigureFormat::Pdf => "pdf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["xmatch", "-v", "-x", "--savefigs", "png", "cdfs"]);
        assert!(cli.verbose);
        assert!(cli.tricky);
        assert!(!cli.demo);
        assert_eq!(cli.savefigs, Some(FigureFormat::Png));
        assert_eq!(cli.field, "cdfs");
        assert_eq!(cli.run_mode(), RunMode::TrickyOnly);
    }

    #[test]
    fn test_field_is_required() {
        assert!(Cli::try_parse_from(["xmatch", "-v"]).is_err());
    }

    #[test]
    fn test_bad_figure_format_rejected() {
        assert!(Cli::try_parse_from(["xmatch", "--savefigs", "svg", "cdfs"]).is_err());
    }
}
