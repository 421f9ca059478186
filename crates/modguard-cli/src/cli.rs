use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "modguard")]
#[command(
    author,
    version,
    about = "Predict whether Reddit comments might violate subreddit rules"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Config file path (defaults to ./modguard.yaml, then the user config dir)
    #[arg(short, long, global = true, env = "MODGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model artifact path (overrides the config file)
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Vectorizer artifact path (overrides the config file)
    #[arg(long, global = true)]
    pub vectorizer: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score comments, one per line
    Score {
        /// Comment text (repeatable); each value may hold several lines
        #[arg(short, long)]
        text: Vec<String>,

        /// Read comments from a file ("-" for stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Disable ANSI colors in table output
        #[arg(long)]
        no_color: bool,
    },

    /// Enter comments interactively; an empty line submits
    Interactive {
        /// Disable ANSI colors
        #[arg(long)]
        no_color: bool,
    },

    /// List the built-in sample comments
    Samples,

    /// Load the model and print its metadata
    Info,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Html,
}
