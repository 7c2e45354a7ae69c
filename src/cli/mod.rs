//! Command-line interface definitions for the `zonal-export` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Top-level CLI for the `zonal-export` binary.
#[derive(Debug, Parser)]
#[command(
    name = "zonal-export",
    about = "Queue Earth Engine zonal statistics exports for cropland, built-up, and nightlight layers",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Log request details at debug level (overridden by `RUST_LOG`).
    #[arg(long, short = 'v', global = true)]
    pub(crate) verbose: bool,
    /// Subcommand to run.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Subcommands of `zonal-export`.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Build the combined tables and queue one CSV export per variable.
    #[command(
        name = "export",
        about = "Build the combined tables and queue one CSV export per variable"
    )]
    Export(ExportCommand),
    /// Look up the progress of a queued export.
    #[command(name = "status", about = "Look up the progress of a queued export")]
    Status(StatusCommand),
}

/// Arguments for the `zonal-export export` subcommand.
#[derive(Debug, Args)]
pub(crate) struct ExportCommand {
    /// Variable to export; repeat to select several. Defaults to all three.
    #[arg(
        long = "variable",
        value_name = "VARIABLE",
        value_parser = ["cropland", "builtup", "nightlight"],
        ignore_case = true
    )]
    pub(crate) variables: Vec<String>,
    /// Years to export, for example `2015,2018-2020`. Defaults to each
    /// variable's full range.
    ///
    /// The list replaces the range of every selected variable, so each year
    /// must be supported by all of them: built-up covers only 2000, 2005,
    /// 2010, 2015, 2020 and 2025. Combine with `--variable` to narrow one
    /// variable.
    #[arg(long, value_name = "YEARS")]
    pub(crate) years: Option<String>,
    /// Print the request bodies as JSON instead of submitting them.
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Also write each dry-run body to `<DIR>/<file name prefix>.json`.
    #[arg(long, value_name = "DIR", requires = "dry_run")]
    pub(crate) out_dir: Option<Utf8PathBuf>,
}

/// Arguments for the `zonal-export status` subcommand.
#[derive(Debug, Args)]
pub(crate) struct StatusCommand {
    /// Operation name (`projects/<project>/operations/<id>`) or bare id.
    #[arg(value_name = "OPERATION")]
    pub(crate) operation: String,
}
