use std::error::Error;
use std::io::{self, BufRead};
use std::num::NonZero;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gridroute::optimize::{Outcome, Router};
use gridroute::oracle::PbSolverCommand;
use gridroute::{Dimension, Location, Pair, Problem};

/// Route disjoint paths between terminal pairs on a grid, minimizing occupied cells.
///
/// The problem is read from standard input: a line `n m`, a line `p`, then p lines
/// `x1 y1 x2 y2`, one terminal pair each.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Path of the pseudo-Boolean solver executable.
    #[arg(long, default_value = "pbsolver")]
    solver: PathBuf,

    /// Path of the OPB instance file, overwritten on every solver call.
    #[arg(long, default_value = "out.opb")]
    instance: PathBuf,

    /// Print the first feasible routing instead of searching for the optimum.
    #[arg(long)]
    no_optimize: bool,
}

fn parse_fields(line: &str, expected: usize) -> Result<Vec<usize>, Box<dyn Error>> {
    let fields = line.split_whitespace()
        .map(str::parse)
        .collect::<Result<Vec<usize>, _>>()?;
    if fields.len() != expected {
        return Err(format!("expected {} fields, got {}", expected, fields.len()).into());
    }

    Ok(fields)
}

fn next_line(input: &mut impl BufRead) -> Result<String, Box<dyn Error>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err("unexpected end of input".into());
    }
    Ok(line)
}

fn read_problem(input: &mut impl BufRead) -> Result<Problem, Box<dyn Error>> {
    println!("Insert n and m");
    let dims = parse_fields(&next_line(input)?, 2)?;
    let dims: (Dimension, Dimension) = (
        NonZero::new(dims[0]).ok_or("n must be positive")?,
        NonZero::new(dims[1]).ok_or("m must be positive")?,
    );

    println!("Insert number of pairs");
    let pair_count = parse_fields(&next_line(input)?, 1)?[0];

    println!("Insert all pairs (one pair per line)");
    let mut pairs = Vec::with_capacity(pair_count);
    for _ in 0..pair_count {
        let fields = parse_fields(&next_line(input)?, 4)?;
        pairs.push(Pair(Location(fields[0], fields[1]), Location(fields[2], fields[3])));
    }

    Ok(Problem::new(dims, pairs)?)
}

fn run(args: Args) -> Result<ExitCode, Box<dyn Error>> {
    let problem = read_problem(&mut io::stdin().lock())?;
    println!("Input successfully read");

    let oracle = PbSolverCommand::new(args.solver, args.instance);
    let mut router = Router::new(&problem, oracle);

    let outcome = match args.no_optimize {
        true => router.solve()?,
        false => router.optimize()?,
    };

    match outcome {
        Outcome::Infeasible => {
            println!("no routing exists");
            Ok(ExitCode::FAILURE)
        }
        Outcome::Routed { solution, .. } => {
            // an uncapped one-shot model may carry loops beside the paths
            let solution = match args.no_optimize {
                true => solution.walked()?,
                false => solution,
            };
            print!("{}", solution);
            println!("total cost: {}", solution.cost());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {}", error);
            ExitCode::FAILURE
        }
    }
}
