// CLI binary entry point for opusmux

mod cli;

use anyhow::Context;
use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use cli::commands::{command_encode, command_inspect, EncodeArgs};
use cli::{Commands, Config, OutputFormatter};

fn main() {
    let config = Config::parse();
    init_tracing(config.verbose);

    let formatter = OutputFormatter::new(config.format.clone(), config.quiet);
    if let Err(e) = run(config.command, &formatter) {
        formatter.print_error(&format!("{:#}", e));
        process::exit(1);
    }
}

fn run(command: Commands, formatter: &OutputFormatter) -> anyhow::Result<()> {
    match command {
        Commands::Inspect {
            files,
            directory,
            pattern,
        } => {
            command_inspect(files, directory, pattern, formatter).context("inspect failed")?;
        }
        Commands::Encode {
            input,
            output,
            config,
            rate,
            channels,
            frame_ms,
            application,
            bitrate,
            pre_skip,
            serial,
            tags,
            chunk_size,
        } => {
            let args = EncodeArgs {
                input,
                output,
                config,
                rate,
                channels,
                frame_ms,
                application,
                bitrate,
                pre_skip,
                serial,
                tags,
                chunk_size,
            };
            command_encode(args.clone(), formatter)
                .with_context(|| format!("failed to encode {} into {}", args.input, args.output))?;
        }
    }
    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
