use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::LogDestination;

/// Batch generation runner.
#[derive(Debug, Parser)]
#[command(name = "genrun", version, about)]
pub struct Cli {
    /// Where log lines go.
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal, global = true)]
    pub log: LogDestination,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Drive a run against the simulated page.
    Run(RunArgs),
    /// Expand a wildcard template and print the prompts.
    Expand(ExpandArgs),
    /// Print one built-in example template.
    Example {
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Prompt given inline; may be repeated.
    #[arg(long = "prompt", value_name = "TEXT")]
    pub prompts: Vec<String>,

    /// File with one prompt per line; blank lines and `#` comments are skipped.
    #[arg(long, value_name = "PATH")]
    pub prompts_file: Option<PathBuf>,

    /// Wildcard template expanded into the prompt list.
    #[arg(long)]
    pub template: Option<String>,

    /// Number of prompts generated from `--template`.
    #[arg(long, default_value_t = 3)]
    pub count: usize,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Refill the queue when it drains.
    #[arg(long = "loop")]
    pub looping: bool,

    /// RON config file with timing and selector overrides.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Image stored as a persistent attachment; may be repeated.
    #[arg(long = "attach", value_name = "PATH")]
    pub attachments: Vec<PathBuf>,

    /// Simulated generation latency in milliseconds.
    #[arg(long)]
    pub latency_ms: Option<u64>,

    /// Simulated page never signals completion, so every submission stalls.
    #[arg(long)]
    pub no_complete: bool,

    /// Request a stop after this many submissions.
    #[arg(long)]
    pub max_submissions: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ExpandArgs {
    pub template: String,

    #[arg(long, default_value_t = 5)]
    pub count: usize,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Extra category as `name=a,b,c`; may be repeated.
    #[arg(long = "category", value_name = "NAME=VALUES", value_parser = parse_category)]
    pub categories: Vec<(String, Vec<String>)>,
}

fn parse_category(raw: &str) -> Result<(String, Vec<String>), String> {
    let (name, values) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUES, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("category name is empty".to_string());
    }
    let values: Vec<String> = values
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
    if values.is_empty() {
        return Err(format!("category `{name}` has no values"));
    }
    Ok((name.to_string(), values))
}
