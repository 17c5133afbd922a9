use clap::Parser;
use jacaranta::{evaluate, logging, parse, rt::Value, scan, Error};

/// Interactive Jacaranta prompt, evaluating one expression per line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Print the tokens scanned from every line.
    #[arg(long)]
    tokens: bool,

    /// Print the expression tree parsed from every line.
    #[arg(long)]
    tree: bool,

    /// Log pipeline diagnostics to stderr (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), rustyline::error::ReadlineError> {
    let args = Args::parse();
    if let Err(error) = logging::init(args.verbose) {
        eprintln!("Failed to install the logger: {error}");
    }

    let mut rl = rustyline::DefaultEditor::new()?;
    println!("Jacaranta lang");

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(error) = rl.add_history_entry(line.as_str()) {
                    log::warn!("could not record history: {error}");
                }

                match run_line(&line, &args) {
                    Ok(value) => println!("{value}"),
                    Err(error) => eprintln!("{error}"),
                }
            }
            Err(error) => {
                println!("Bye! ({error})");
                break;
            }
        }
    }

    Ok(())
}

fn run_line<'src>(line: &'src str, args: &Args) -> Result<Value<'src>, Error<'src>> {
    let tokens = scan(line)?;
    if args.tokens {
        for token in &tokens {
            println!("{:?} {}", token.kind, token);
        }
    }

    let expr = parse(tokens)?;
    if args.tree {
        println!("{expr}");
    }

    Ok(evaluate(&expr)?)
}
