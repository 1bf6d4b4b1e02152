//! Clap derive structures for the `azmon` CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// azmon -- read-only tour of the Azure Monitor metrics API
#[derive(Debug, Parser)]
#[command(
    name = "azmon",
    version,
    about = "Query Azure Monitor metric definitions and metrics for one resource",
    long_about = "Authenticates as a service principal and walks the Azure Monitor\n\
        metrics API for a single resource: metric definitions first, then a\n\
        fixed sequence of metrics queries of increasing specificity.\n\n\
        Credentials are read from AZURE_TENANT_ID, AZURE_CLIENT_ID,\n\
        AZURE_CLIENT_SECRET and AZURE_SUBSCRIPTION_ID.",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Fully-qualified resource id
    /// (/subscriptions/<id>/resourceGroups/<rg>/providers/<type>/<name>)
    #[arg(value_name = "RESOURCE_ID")]
    pub resource_id: String,

    /// Settings file (TOML); defaults to the platform config directory
    #[arg(long, short = 'c', env = "AZMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Max records shown per list (overrides `display_limit`)
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,

    /// How far back the query timespan reaches, e.g. 3h or 90m
    #[arg(long, value_parser = humantime::parse_duration)]
    pub lookback: Option<Duration>,

    /// Output format
    #[arg(long, short = 'o', default_value = "text")]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto")]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Console text, tab-separated metric rows
    Text,
    /// One pretty-printed JSON document per section
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}
