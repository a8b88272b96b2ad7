use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::Feed;
use crate::logging::Verbosity;
use crate::store::LaunchOrder;

#[derive(Parser, Debug)]
#[command(name = "rocket-launches")]
#[command(version, about = "Keep a local catalogue of SpaceX launches")]
pub struct Cli {
    /// Config file (defaults to <config dir>/rocket-launches/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path, overriding the configured one
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch launch feeds and import each into its list
    Sync {
        /// Feeds to sync (comma-separated, default: all four)
        #[arg(short, long, value_enum, value_delimiter = ',')]
        feed: Option<Vec<Feed>>,

        /// Read feeds from the response cache instead of the network
        #[arg(long)]
        offline: bool,

        /// Delete cached feed responses before fetching
        #[arg(long, conflicts_with = "offline")]
        clear_cache: bool,

        /// Show a full-screen progress display
        #[arg(long)]
        tui: bool,
    },

    /// Import a JSON file of launches into an existing list
    Import {
        /// File holding one launch object or an array of them
        file: PathBuf,

        /// Destination list title
        #[arg(short, long)]
        list: String,
    },

    /// Show all lists with launch counts
    Lists,

    /// Create an empty list
    CreateList { title: String },

    /// List launches
    Launches {
        /// Only launches in this list
        #[arg(short, long)]
        list: Option<String>,

        /// Hide launches already marked viewed
        #[arg(short, long)]
        unviewed: bool,

        #[arg(short, long, value_enum, default_value_t = LaunchOrder::Date)]
        sort: LaunchOrder,
    },

    /// Show one launch with its tags, lists, fairings and links
    Show { id: i64 },

    /// Add a launch by hand
    Add {
        #[arg(short, long)]
        name: String,

        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(short, long)]
        date: String,

        /// List to add the launch to
        #[arg(short, long)]
        list: String,

        #[arg(long)]
        launchpad: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Tags (repeatable or comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tag: Vec<String>,

        /// Mark as already viewed
        #[arg(long)]
        viewed: bool,
    },

    /// Tag a launch
    Tag {
        id: i64,
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Remove tags from a launch
    Untag {
        id: i64,
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Add an existing launch to another list
    AddToList {
        id: i64,

        #[arg(short, long)]
        list: String,
    },

    /// Mark a launch as viewed
    MarkViewed {
        id: i64,

        /// Clear the viewed flag instead
        #[arg(long)]
        unviewed: bool,
    },

    /// Show all tags with usage counts
    Tags,

    /// Create "Sample List" with demo launches
    Sample,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
