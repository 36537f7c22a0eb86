//! Convloss - Seven-Level Converter Loss Calculator
//!
//! Computes conduction and switching losses of every semiconductor over one
//! fundamental cycle and the resulting efficiency.
//!
//! # Usage
//!
//! ```bash
//! convloss                              # built-in default operating point
//! convloss demos/seven_level.cnv        # operating point from a description file
//! convloss demos/seven_level.cnv --json > report.json
//! RUST_LOG=debug convloss --strict --series
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use convloss_core::{
    dsl,
    error::{ConvlossError, Result},
    report, CalculatorConfig, LossCalculator, ValidationMode,
};

/// Seven-level converter loss calculator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the operating point description file (.cnv); defaults are used when omitted
    #[arg(value_name = "DESCRIPTION_FILE")]
    description: Option<PathBuf>,

    /// Reject operating points that violate a converter limit instead of warning
    #[arg(long)]
    strict: bool,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Also print the per-period waveform table
    #[arg(long)]
    series: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let ast = match &args.description {
        Some(path) => dsl::parse_file(path)?,
        None => dsl::DescriptionAst::new(),
    };

    let validation = if args.strict {
        ValidationMode::Strict
    } else {
        ValidationMode::Lenient
    };
    let config = CalculatorConfig::new().with_validation(validation);

    let calculator = LossCalculator::from_ast(&ast, config)?;
    let result = calculator.run()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        writeln!(out, "{}", result.to_json()?).map_err(|e| ConvlossError::OutputError {
            message: e.to_string(),
        })?;
    } else {
        report::write_text(&result, &mut out)?;
    }

    if args.series {
        writeln!(out).map_err(|e| ConvlossError::OutputError {
            message: e.to_string(),
        })?;
        report::write_series(&result, &mut out)?;
    }

    Ok(())
}
