use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

use gpu_stats::logger::setup_logging;
use gpu_stats::timing::{format_execution_time, measure_command, DEFAULT_LABEL};

/// Run a program once and print its wall-clock execution time
#[derive(Parser, Debug)]
#[command(name = "measure-perf")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Label printed in the result line
    #[arg(short, long, default_value = DEFAULT_LABEL)]
    label: String,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Program to run
    program: String,

    /// Arguments for the program
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    debug!("running {} {:?}", cli.program, cli.args);
    let (status, elapsed) = match measure_command(&cli.program, &cli.args) {
        Ok(result) => result,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };

    println!("{}", format_execution_time(&cli.label, elapsed));

    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }
    Ok(())
}
