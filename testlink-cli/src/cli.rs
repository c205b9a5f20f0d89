//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use testlink_core::MergeStrategy;

/// TestLink XML import/export command-line interface
#[derive(Parser)]
#[command(name = "testlink-cli")]
#[command(author, version, about = "TestLink XML import/export")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Write a settings file with default values
    #[command(about = "Create settings.toml and the database")]
    Init {
        /// Database file to record in the settings
        #[arg(long)]
        database: Option<PathBuf>,

        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Analyze a file without writing anything
    #[command(about = "Show statistics, validation errors and duplicates for a file")]
    Preview {
        /// TestLink XML file
        file: PathBuf,

        /// Target project id
        #[arg(short, long)]
        project: i64,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Import a file into a project
    #[command(about = "Import a TestLink XML file")]
    Import {
        /// TestLink XML file
        file: PathBuf,

        /// Target project id
        #[arg(short, long)]
        project: i64,

        /// Duplicate handling; the recommended strategy is used when omitted
        #[arg(short, long, value_enum)]
        strategy: Option<StrategyArg>,
    },

    /// Export suites or cases to TestLink XML
    #[command(about = "Export stored suites or cases")]
    Export(ExportArgs),

    /// Retry a failed import from its retained file
    #[command(about = "Retry a failed import")]
    Retry {
        /// Import log id of the failed attempt
        log_id: i64,

        /// Strategy to use instead of the original one
        #[arg(short, long, value_enum)]
        strategy: Option<StrategyArg>,
    },

    /// Delete retained upload files whose retry window has passed
    Cleanup,

    /// List import logs of a project
    #[command(about = "Show import history")]
    Logs {
        /// Project id
        #[arg(short, long)]
        project: i64,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },
}

/// Project subcommands
#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a project
    Add {
        /// Project name
        name: String,

        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List projects
    List {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },
}

/// Arguments of `export`
#[derive(Args)]
#[command(group = clap::ArgGroup::new("scope").required(true).args(["project", "suite", "cases"]))]
pub struct ExportArgs {
    /// Export every suite of a project
    #[arg(long)]
    pub project: Option<i64>,

    /// Export one suite and its descendants
    #[arg(long)]
    pub suite: Option<i64>,

    /// Export the listed test case ids
    #[arg(long, value_delimiter = ',')]
    pub cases: Option<Vec<i64>>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Leave out keywords
    #[arg(long)]
    pub no_keywords: bool,

    /// Leave out requirements
    #[arg(long)]
    pub no_requirements: bool,

    /// Leave out custom fields
    #[arg(long)]
    pub no_custom_fields: bool,
}

/// Output format options
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    #[default]
    Table,
    /// Output as JSON
    Json,
}

/// Import strategy options
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StrategyArg {
    /// Leave existing cases untouched
    SkipDuplicates,
    /// Overwrite existing cases
    UpdateExisting,
    /// Insert copies with a fresh internal id
    CreateNew,
    /// Fill existing cases with incoming non-empty values
    MergeData,
}

impl From<StrategyArg> for MergeStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::SkipDuplicates => Self::SkipDuplicates,
            StrategyArg::UpdateExisting => Self::UpdateExisting,
            StrategyArg::CreateNew => Self::CreateNew,
            StrategyArg::MergeData => Self::MergeData,
        }
    }
}
