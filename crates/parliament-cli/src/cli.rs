//! Command-line arguments and config resolution.
//!
//! Precedence: flags > TOML file (`--config`) > `PARLIAMENT_*` env > defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use parliament::{ParliamentConfig, VoteChoice};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Watch AI parliament debates in the terminal", long_about = None)]
pub struct Cli {
    /// TOML config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides PARLIAMENT_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Session store file, so a later run can resume (overrides PARLIAMENT_STORE_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Delay between revealed statements in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub interval_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a fresh batch of papers and list them
    Papers {
        /// Number of papers to request
        #[arg(long)]
        max: Option<u32>,

        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Generate a debate for a paper and play it back
    Debate(DebateArgs),

    /// Check that the backend is reachable
    Health,

    /// Show the parliament seat distribution
    Seats {
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the session persisted in the store
    Status {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct DebateArgs {
    /// Paper id to debate
    #[arg(long, conflicts_with = "pick")]
    pub paper: Option<String>,

    /// Import papers and debate the N-th one (1-based)
    #[arg(long, value_name = "N")]
    pub pick: Option<usize>,

    /// Vote once playback completes
    #[arg(long, value_enum)]
    pub vote: Option<VoteArg>,

    /// Print events as JSON lines
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteArg {
    For,
    Against,
    Abstain,
}

impl From<VoteArg> for VoteChoice {
    fn from(arg: VoteArg) -> Self {
        match arg {
            VoteArg::For => VoteChoice::For,
            VoteArg::Against => VoteChoice::Against,
            VoteArg::Abstain => VoteChoice::Abstain,
        }
    }
}

impl Cli {
    /// Build the effective configuration.
    pub fn resolve_config(&self) -> Result<ParliamentConfig> {
        let mut config = match &self.config {
            Some(path) => ParliamentConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ParliamentConfig::default(),
        };
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(path) = &self.store {
            config.store_path = Some(path.clone());
        }
        if let Some(ms) = self.interval_ms {
            config.reveal_interval_ms = ms;
        }
        if let Command::Papers { max: Some(max), .. } = &self.command {
            config.max_results = *max;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}
