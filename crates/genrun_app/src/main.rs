mod cli;
mod config;
mod logging;
mod run;

use anyhow::Result;
use clap::Parser;
use genrun_core::WildcardExpander;

use crate::cli::{Cli, CliCommand, ExpandArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log, cli.verbose);

    match cli.command {
        CliCommand::Run(args) => run::execute(args),
        CliCommand::Expand(args) => {
            expand(args);
            Ok(())
        }
        CliCommand::Example { seed } => {
            println!("{}", expander(seed).random_example());
            Ok(())
        }
    }
}

fn expander(seed: Option<u64>) -> WildcardExpander {
    match seed {
        Some(seed) => WildcardExpander::with_seed(seed),
        None => WildcardExpander::new(),
    }
}

fn expand(args: ExpandArgs) {
    let mut expander = expander(args.seed);
    for (name, values) in args.categories {
        expander.set_category(name, values);
    }
    for prompt in expander.generate_prompts(&args.template, args.count) {
        println!("{prompt}");
    }
}
