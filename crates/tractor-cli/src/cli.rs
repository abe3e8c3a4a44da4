//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Tractor CLI - Declarative extraction and transformation
///
/// Resolve accessor expressions against JSON or YAML documents and pipe the
/// results through declaratively configured stage pipelines.
#[derive(Parser, Debug)]
#[command(
    name = "tractor",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TRACTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results [default: from config, else human]
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve an accessor against a document, optionally through a pipeline
    Extract(ExtractArgs),

    /// Build an output document from a field mapping
    Map(MapArgs),

    /// Check a pipeline or mapping definition without running it
    Check(CheckArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the extract command
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Path to the subject document (JSON or YAML, `-` for stdin)
    #[arg(value_name = "SUBJECT")]
    pub subject: PathBuf,

    /// Accessor expression, e.g. `order.lines.0.sku` or `user::name`
    #[arg(short, long, default_value = "")]
    pub accessor: String,

    /// Pipeline definition applied to the extracted value
    #[arg(short, long, value_name = "PIPELINE")]
    pub pipeline: Option<PathBuf>,

    /// Context document used for `::` lookups
    #[arg(long, value_name = "CONTEXT")]
    pub context: Option<PathBuf>,
}

/// Arguments for the map command
#[derive(Parser, Debug)]
pub struct MapArgs {
    /// Path to the subject document (JSON or YAML, `-` for stdin)
    #[arg(value_name = "SUBJECT")]
    pub subject: PathBuf,

    /// Field mapping definition
    #[arg(short, long, value_name = "MAPPING")]
    pub mapping: PathBuf,

    /// Context document used for `::` lookups
    #[arg(long, value_name = "CONTEXT")]
    pub context: Option<PathBuf>,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Path to the definition file (JSON or YAML)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Kind of definition in the file
    #[arg(short, long, value_enum, default_value = "pipeline")]
    pub kind: DefinitionKind,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable formatted output
    #[default]
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Definition kinds accepted by `check`
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DefinitionKind {
    /// Ordered list of `{stage, args}` entries
    Pipeline,
    /// Output field name to `{accessor, pipeline}`
    Mapping,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
