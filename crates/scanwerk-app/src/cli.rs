// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scanwerk_core::types::BarcodeFormat;

/// Capture a photo, decode it within a memory budget, and read the barcodes in it
#[derive(Debug, Parser)]
#[command(name = "scanwerk")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Directory holding config.json, session.json and captured photos
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one capture cycle and save the session
    Scan {
        /// Photo the desktop camera hands back; without it the capture is cancelled
        #[arg(long)]
        photo: Option<PathBuf>,

        /// Answer the permission prompt with "deny"
        #[arg(long)]
        deny_permission: bool,
    },

    /// Decode an image file directly and print every classified record
    Decode {
        path: PathBuf,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the saved session without re-running anything
    Resume,

    /// Clear the saved session
    Reset,

    /// Show the stored config, updating it first when options are given
    Config {
        /// Symbology to detect, e.g. qr_code or data_matrix; repeat for several
        #[arg(long = "format", value_parser = parse_format)]
        formats: Vec<BarcodeFormat>,

        /// Widest decoded raster in pixels
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_width: Option<u32>,

        /// Tallest decoded raster in pixels
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_height: Option<u32>,
    },
}

fn parse_format(name: &str) -> Result<BarcodeFormat, String> {
    BarcodeFormat::from_name(name).ok_or_else(|| format!("unknown barcode format `{name}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_scan_flags() {
        let cli = Cli::parse_from(["scanwerk", "scan", "--photo", "a.jpg", "--deny-permission"]);
        match cli.command {
            Command::Scan {
                photo,
                deny_permission,
            } => {
                assert_eq!(photo, Some(PathBuf::from("a.jpg")));
                assert!(deny_permission);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_config_overrides() {
        let cli = Cli::parse_from([
            "scanwerk",
            "config",
            "--format",
            "qr",
            "--format",
            "data-matrix",
            "--max-width",
            "1024",
        ]);
        match cli.command {
            Command::Config {
                formats,
                max_width,
                max_height,
            } => {
                assert_eq!(formats, vec![BarcodeFormat::QrCode, BarcodeFormat::DataMatrix]);
                assert_eq!(max_width, Some(1024));
                assert_eq!(max_height, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_format_and_zero_bound() {
        assert!(Cli::try_parse_from(["scanwerk", "config", "--format", "hologram"]).is_err());
        assert!(Cli::try_parse_from(["scanwerk", "config", "--max-height", "0"]).is_err());
    }

    #[test]
    fn data_dir_is_global() {
        let cli = Cli::parse_from(["scanwerk", "reset", "--data-dir", "/tmp/sw"]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/sw")));
        assert!(matches!(cli.command, Command::Reset));
    }
}
