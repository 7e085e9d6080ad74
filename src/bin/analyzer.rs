//! `analyzer` — the command-line front end over the pipeline substrate.
//!
//! Invocation: `analyzer <queue_size> <stage1> <stage2> ... <stageN>`. This
//! binary contains no synchronization logic of its own; it parses
//! arguments, resolves stage names, builds a [`conveyor::pipeline::Pipeline`],
//! feeds it standard input, and maps the outcome to an exit code.

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use conveyor::pipeline::Pipeline;
use conveyor::transforms;

/// A threaded line-processing pipeline over a chain of text-transform stages.
#[derive(Parser, Debug)]
#[command(name = "analyzer", about, long_about = None)]
struct Cli {
    /// Per-stage bounded queue capacity (must be a positive integer).
    queue_size: Option<String>,

    /// Stage names to chain, in order.
    #[arg(num_args = 0.., value_name = "STAGE")]
    stages: Vec<String>,
}

fn print_usage() {
    let mut cmd = Cli::command();
    cmd.print_help().ok();
    println!();
    println!("Available stages: {}", transforms::STAGE_NAMES.join(", "));
}

fn main() -> ExitCode {
    env_logger::init();

    // Bare invocation prints help and exits 0, distinct from clap's own
    // exit-2 behavior for a missing required argument — there is none here,
    // every positional is optional so we can apply that policy ourselves.
    if std::env::args().count() <= 1 {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let cli = Cli::parse();

    let queue_size = match cli.queue_size.as_deref().map(str::parse::<usize>) {
        Some(Ok(n)) if n > 0 => n,
        _ => {
            eprintln!("error: queue_size must be a positive integer");
            return ExitCode::from(1);
        }
    };

    if cli.stages.is_empty() {
        eprintln!("error: at least one stage is required");
        return ExitCode::from(1);
    }

    for name in &cli.stages {
        if transforms::resolve(name).is_none() {
            eprintln!(
                "error: unknown stage '{name}' (available: {})",
                transforms::STAGE_NAMES.join(", ")
            );
            return ExitCode::from(1);
        }
    }

    let pipeline = match Pipeline::build(&cli.stages, queue_size) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            eprintln!("error: failed to initialize pipeline: {err}");
            return ExitCode::from(2);
        }
    };

    let stdin = io::stdin();
    match pipeline.run(stdin.lock()) {
        Ok(()) => {
            println!("Pipeline shutdown complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}
