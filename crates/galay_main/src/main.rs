use std::io::{IsTerminal, Read};

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use galay_main::{Cli, init_tracing, run};

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    if cli.prompt.is_none() && cli.subcommands.is_none() && !std::io::stdin().is_terminal() {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        if !input.trim().is_empty() {
            cli.piped_input = Some(input);
        }
    }

    init_tracing(cli.verbose)?;

    if let Err(error) = run(cli).await {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
    Ok(())
}
