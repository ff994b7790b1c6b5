use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use std::io;
use std::process;
use sumkeep::cli::{Cli, Commands};
use sumkeep::commands::{self, Outcome};
use sumkeep::output::{self, Verbosity};
use sumkeep::strategy::Mode;
use sumkeep::{LOG_ENV, SumkeepContext};
use tracing_subscriber::EnvFilter;

fn main() {
    match run() {
        Ok(Outcome::Success) => {}
        Ok(Outcome::Incomplete) => process::exit(1),
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            process::exit(1);
        }
    }
}

/// Route `tracing` events to stderr, filtered by `SUMKEEP_LOG`
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    // A subscriber can only be installed once per process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<Outcome> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    output::set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    if let Commands::Completion { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(Outcome::Success);
    }

    let mut ctx = SumkeepContext::new()?;

    match cli.command {
        Commands::New {
            root,
            depth,
            mode,
            bitrot,
            export,
            algorithm,
            manifest,
            jobs,
            no_follow,
        } => {
            let options = commands::new::NewOptions {
                depth,
                mode: if bitrot { Mode::Bitrot } else { mode },
                export,
                algorithm,
                manifest,
                jobs,
                no_follow,
            };
            commands::new::execute(&mut ctx, &root, &options)
        }
        Commands::Export { dirs } => commands::export::execute(&ctx, &dirs),
        Commands::Types { dir } => commands::types::execute(&ctx, &dir),
        Commands::Depths { dir, dirs } => commands::depths::execute(&ctx, &dir, dirs),
        Commands::Chars { file, count } => commands::chars::execute(file.as_deref(), count),
        Commands::Extract { archives, force } => commands::extract::execute(&ctx, &archives, force),
        Commands::Pack {
            dirs,
            force,
            remove,
        } => commands::pack::execute(&ctx, &dirs, force, remove),
        Commands::Config {
            key,
            value,
            unset,
            list,
        } => {
            commands::config::execute(&mut ctx, key.as_deref(), value, unset, list)?;
            Ok(Outcome::Success)
        }
        Commands::Completion { .. } => Ok(Outcome::Success),
    }
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
