//! CLI for the routing inspector.
//!
//! The `advisor-research` binary classifies and routes queries offline so the
//! heuristics can be checked without running any capability unit. Uses clap
//! for argument parsing and owo-colors for colored terminal output.

pub mod output;

use crate::routing::selector::{RoutingPolicy, WorkflowMode};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Prompts routed by `route` when none are given.
pub const DEFAULT_PROMPTS: &[&str] = &[
    "Analyze BTC and give me a quick outlook.",
    "Show me a chart of TSLA and key levels.",
    "Any latest news on Nvidia?",
    "Vad ar RSI och hur fungerar det?",
    "Borde jag kopa ETH idag?",
    "Compare SPY vs QQQ for the next month.",
    "Riskhantering for swing trading?",
];

/// Advisor research routing inspector
#[derive(Parser, Debug)]
#[command(
    name = "advisor-research",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "Inspect how queries are classified and routed to research units",
    after_help = "EXAMPLES:\n    \
                  advisor-research classify 'Should I buy AAPL?'\n    \
                  advisor-research route                        # Route the built-in prompts\n    \
                  advisor-research route --policy targeted --mode fast 'Analyze BTC'\n    \
                  advisor-research config --validate"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "research.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a query and print its intent as JSON
    Classify {
        /// Query text
        text: String,
    },

    /// Print the routing decision for each query
    Route {
        /// Queries to route (a built-in set when omitted)
        texts: Vec<String>,

        /// Override the configured routing policy (broad, targeted)
        #[arg(long)]
        policy: Option<RoutingPolicy>,

        /// Override the configured workflow mode (full, fast)
        #[arg(long)]
        mode: Option<WorkflowMode>,

        /// Print decisions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration and toggles
    Config {
        /// Only validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Queries for `route`, falling back to [`DEFAULT_PROMPTS`].
    pub fn prompts(texts: &[String]) -> Vec<String> {
        if texts.is_empty() {
            DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect()
        } else {
            texts.to_vec()
        }
    }
}
