use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "scrio",
    about = "Scrio - cached retrieval of git-hosted translation resources",
    version,
    author
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the upstream host URL
    #[arg(long, global = true)]
    pub upstream: Option<String>,

    /// Override the file cache directory
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
}

/// Addressing shared by every per-resource command.
#[derive(Args, Debug, Clone)]
pub struct ResourceArgs {
    /// Language code, e.g. en
    #[arg(short, long)]
    pub language: String,

    /// Organization owning the upstream repository
    #[arg(short, long, default_value = "unfoldingWord")]
    pub organization: String,

    /// Resource type: ult, ust, tn, tq, tw or ta
    #[arg(short, long)]
    pub resource: String,

    /// Pinned git ref, defaults to master
    #[arg(long)]
    pub version: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a resource and print its assembled content
    Fetch {
        #[command(flatten)]
        target: ResourceArgs,

        /// Output format
        #[arg(short = 'f', long, default_value = "pretty")]
        output: OutputFormat,

        /// Save output to file instead of stdout
        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,
    },

    /// List the file paths contained in a resource
    Paths {
        #[command(flatten)]
        target: ResourceArgs,

        /// Only print paths matching this regular expression
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show per-tier cache statistics
    Stats {
        /// Output format
        #[arg(short = 'f', long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Probe upstream reachability and report the verdict
    Status {
        /// Wait up to this many seconds for the host to come online
        #[arg(long)]
        wait: Option<u64>,

        /// Output format
        #[arg(short = 'f', long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Remove one resource from every cache tier
    Delete {
        #[command(flatten)]
        target: ResourceArgs,
    },

    /// Empty every cache tier
    Clear,
}

#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Pretty,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Pretty => write!(f, "pretty"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::JsonCompact => write!(f, "json-compact"),
        }
    }
}
