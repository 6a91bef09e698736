use changegate::policy::EXIT_INTERNAL_ERROR;
use changegate::{engine, Cli, Config, JsonReporter, Reporter, RunOptions, TerminalReporter};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "changegate=debug"
    } else {
        "changegate=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load(&cli.repo) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("changegate: {e}");
            return ExitCode::from(EXIT_INTERNAL_ERROR);
        }
    };

    let opts = RunOptions::from_cli(&cli, config);
    match engine::run(&opts) {
        Ok(summary) => {
            let reporter: Box<dyn Reporter> = if cli.json {
                Box::new(JsonReporter::new())
            } else {
                Box::new(TerminalReporter::new(cli.verbose))
            };
            print!("{}", reporter.report(&summary));
            ExitCode::from(summary.exit_code)
        }
        Err(e) => {
            eprintln!("changegate: {e}");
            ExitCode::from(EXIT_INTERNAL_ERROR)
        }
    }
}
