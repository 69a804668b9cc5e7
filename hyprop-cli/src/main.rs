use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use clap::Parser as ClapParser;
use hyprop::prelude::*;
use log::{LevelFilter, debug};

/// Prove a propositional formula from the classical Hilbert axioms.
#[derive(ClapParser)]
#[command(name = "hyprop", version)]
pub struct Arguments {
    /// Formula to prove, e.g. "(a>b)>((b>c)>(a>c))"
    formula: String,

    /// Search budget in milliseconds (0 selects the default)
    #[arg(short, long)]
    time_budget: Option<u64>,

    /// Discard formulas with more nodes than this
    #[arg(short = 's', long)]
    max_size: Option<usize>,

    /// Keep the derivation log at this path instead of a temporary file
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// TOML file with solver settings; flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search for the formula as written, without standardizing it or freezing its variables
    #[arg(long)]
    raw: bool,

    /// More output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

const EXIT_NO_PROOF: u8 = 1;
const EXIT_INPUT: u8 = 2;
const EXIT_FAILURE: u8 = 3;

/// Configuration problems are the user's input; log and search failures are not.
fn exit_code(error: &ProverError) -> u8 {
    match error {
        ProverError::ConfigIo { .. } | ProverError::ConfigParse { .. } => EXIT_INPUT,
        _ => EXIT_FAILURE,
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn load_config(args: &Arguments) -> ProverResult<SolverConfig> {
    let mut config = match &args.config {
        Some(path) => SolverConfig::load(path)?,
        None => SolverConfig::default(),
    };
    if let Some(budget) = args.time_budget {
        config.time_budget_ms = budget;
    }
    if let Some(size) = args.max_size {
        config.max_formula_size = size;
    }
    if let Some(log) = &args.log {
        config.log_path = Some(log.clone());
    }
    Ok(config)
}

fn report_parse_error(formula: &str, error: &ParseError) {
    let Some(position) = error.position() else {
        eprintln!("Error: {error}");
        return;
    };

    let mut colors = ColorGenerator::new();
    let end = (position + 1).min(formula.len()).max(position);
    let span = ("<formula>", position..end);
    let printed = Report::build(ReportKind::Error, span.clone())
        .with_message(error.to_string())
        .with_label(
            Label::new(span)
                .with_message("The error occurred here")
                .with_color(colors.next()),
        )
        .finish()
        .eprint(("<formula>", Source::from(formula)));
    if printed.is_err() {
        eprintln!("Error: {error}");
    }
}

fn run(args: &Arguments, parsed: Expression) -> ProverResult<ProofStatus> {
    let config = load_config(args)?;
    debug!("configuration: {config:?}");

    let target = if args.raw {
        parsed
    } else {
        Solver::prepare_target(parsed)
    };

    print!("target: ");
    target.pretty_print()?;

    let mut solver = Solver::with_config(axioms::classical(), target, config)?;
    let start = Instant::now();
    let status = solver.solve();
    let elapsed = start.elapsed();
    if status.is_ok() {
        print!("{}", solver.proof_narrative());
    }
    let closed = solver.close();
    let status = status?;
    closed?;

    println!("elapsed: {:.3}s", elapsed.as_secs_f64());
    Ok(status)
}

fn main() -> ExitCode {
    let args = Arguments::parse();
    init_logger(args.verbose);

    let parsed = match parse(&args.formula) {
        Ok(parsed) => parsed,
        Err(error) => {
            report_parse_error(&args.formula, &error);
            return ExitCode::from(EXIT_INPUT);
        }
    };

    match run(&args, parsed) {
        Ok(ProofStatus::Proved) => ExitCode::SUCCESS,
        Ok(ProofStatus::NotFound) => ExitCode::from(EXIT_NO_PROOF),
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::from(exit_code(&error))
        }
    }
}
