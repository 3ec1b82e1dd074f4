//! Command-line interface definitions for wallstash.
//!
//! Global options (verbosity, config file, download directory) apply to every
//! subcommand.
//!
//! # Example
//!
//! ```bash
//! # Show downloaded wallpapers, widest first
//! wallstash list --sort width
//!
//! # Download two wallpapers
//! wallstash download 94x38z k7q1y7
//!
//! # Browse the second toplist page
//! wallstash browse toplist --page 2
//!
//! # Search
//! wallstash browse search --query "mountain lake"
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::local::SortKey;
use crate::model::SearchQuery;
use crate::remote::ListingCategory;

/// Wallpaper downloader with a local index and an in-memory photo cache.
#[derive(Debug, Parser)]
#[command(name = "wallstash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print errors as JSON
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Read configuration from this file instead of the platform default
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the download directory
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List downloaded wallpapers
    List(ListArgs),
    /// Show details of a downloaded wallpaper
    Info(InfoArgs),
    /// Delete a downloaded wallpaper
    Remove(RemoveArgs),
    /// Download wallpapers by id
    Download(DownloadArgs),
    /// Fetch a listing page from the site
    Browse(BrowseArgs),
    /// Print the effective configuration as TOML
    Config,
}

/// Arguments for the list subcommand.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Sort order (always descending)
    #[arg(short, long, value_enum, default_value = "added")]
    pub sort: SortArg,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the info subcommand.
#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Photo id, e.g. 94x38z
    #[arg(value_name = "ID")]
    pub id: String,

    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the remove subcommand.
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Photo id to delete
    #[arg(value_name = "ID")]
    pub id: String,
}

/// Arguments for the download subcommand.
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Photo ids to download
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<String>,

    /// Number of parallel downloads (overrides config)
    #[arg(short = 'j', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Encoder quality for JPEG output, 0-100 (overrides config)
    #[arg(long, value_name = "Q", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: Option<u8>,
}

/// Arguments for the browse subcommand.
#[derive(Debug, Args)]
pub struct BrowseArgs {
    /// Which listing to fetch
    #[arg(value_enum)]
    pub listing: ListingArg,

    /// Search terms (required for `search`)
    #[arg(long, value_name = "TEXT", required_if_eq("listing", "search"))]
    pub query: Option<String>,

    /// Page number, starting at 1
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,

    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

impl BrowseArgs {
    /// The listing category these arguments describe.
    #[must_use]
    pub fn category(&self) -> ListingCategory {
        match self.listing {
            ListingArg::Latest => ListingCategory::Latest,
            ListingArg::Toplist => ListingCategory::Toplist,
            ListingArg::Random => ListingCategory::Random,
            ListingArg::Search => {
                ListingCategory::Search(SearchQuery::text(self.query.clone().unwrap_or_default()))
            }
        }
    }
}

/// Sort order for `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortArg {
    /// Most recently saved first
    #[default]
    Added,
    /// Widest first
    Width,
    /// Tallest first
    Height,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Added => SortKey::Added,
            SortArg::Width => SortKey::Width,
            SortArg::Height => SortKey::Height,
        }
    }
}

/// Listings for `browse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListingArg {
    Latest,
    Toplist,
    Random,
    Search,
}
