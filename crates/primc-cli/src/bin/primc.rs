use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;

use primc_cli::args::{CliArgs, OutputFormat};
use primc_cli::driver;
use primc_cli::reporter::{Reporter, render_json};

fn main() -> Result<()> {
    // PRIMC_LOG / PRIMC_LOG_FORMAT, see tracing_config.rs.
    primc_cli::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let outcome = driver::run(&args, &cwd)?;

    match args.format {
        OutputFormat::Json => {
            let text = render_json(&outcome, args.emit_artifacts)
                .context("failed to serialize results")?;
            println!("{text}");
        }
        OutputFormat::Text => {
            let color = !args.no_color && std::io::stdout().is_terminal();
            let text = Reporter::new(color).render_outcome(&outcome, args.emit_artifacts);
            if !text.is_empty() {
                println!("{text}");
            }
        }
    }

    std::process::exit(outcome.exit_code());
}
