use std::{fs, path::PathBuf, process::ExitCode, time};

use clap::Parser;
use jacaranta::{evaluate, logging, parse, rt::Value, scan, Error};

/// Evaluates every non-blank line of a Jacaranta file as its own expression.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The file to run.
    path: PathBuf,

    /// Print the tokens scanned from every line.
    #[arg(long)]
    tokens: bool,

    /// Print the expression tree parsed from every line.
    #[arg(long)]
    tree: bool,

    /// Print how long each stage took.
    #[arg(long)]
    timings: bool,

    /// Log pipeline diagnostics to stderr (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(error) = logging::init(args.verbose) {
        eprintln!("Failed to install the logger: {error}");
    }

    let buffer = match fs::read_to_string(&args.path) {
        Ok(buffer) => buffer,
        Err(error) => {
            eprintln!("Failed to read '{}': {error}", args.path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut failed = false;
    for (index, line) in buffer.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match run_line(line, &args) {
            Ok(value) => println!("{value}"),
            Err(error) => {
                eprintln!("line {}: {error}", index + 1);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_line<'src>(line: &'src str, args: &Args) -> Result<Value<'src>, Error<'src>> {
    let start = time::Instant::now();
    let tokens = scan(line)?;
    if args.timings {
        println!("[Scanning took: {:?}]", start.elapsed());
    }
    if args.tokens {
        for token in &tokens {
            println!("{:?} {}", token.kind, token);
        }
    }

    let start = time::Instant::now();
    let expr = parse(tokens)?;
    if args.timings {
        println!("[Parsing took: {:?}]", start.elapsed());
    }
    if args.tree {
        println!("{expr}");
    }

    let start = time::Instant::now();
    let value = evaluate(&expr)?;
    if args.timings {
        println!("[Evaluating took: {:?}]", start.elapsed());
    }

    Ok(value)
}
