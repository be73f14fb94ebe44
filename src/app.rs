//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - opens the input files
//! - runs the growth pipeline
//! - prints summaries
//! - writes optional exports

use std::fs::File;
use std::path::Path;

use clap::Parser;

use crate::cli::{Command, CorrelateArgs, CurvesArgs, ReferenceArgs, ReportArgs};
use crate::domain::{AgeConvention, AnalyzerConfig, ReferenceConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `growth` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Curves(args) => handle_curves(args),
        Command::Correlate(args) => handle_correlate(args),
    }
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let reference = File::open(&args.reference.reference).map_err(|e| open_error(&args.reference.reference, e))?;
    let subject = File::open(&args.subject).map_err(|e| open_error(&args.subject, e))?;

    let reference_config = reference_config_from_args(&args.reference);
    let analyzer_config = analyzer_config_from_args(&args);
    let run = pipeline::run_report(
        reference,
        subject,
        &reference_config,
        &analyzer_config,
        args.to_age,
        args.reference.samples,
    )?;

    println!("{}", crate::report::format_report_summary(&run.report));

    if let Some(path) = &args.export_json {
        crate::io::export::write_report_json(path, &run.report)?;
        tracing::info!(path = %path.display(), "wrote report JSON");
    }

    Ok(())
}

fn handle_curves(args: CurvesArgs) -> Result<(), AppError> {
    let reference = File::open(&args.reference.reference).map_err(|e| open_error(&args.reference.reference, e))?;
    let config = reference_config_from_args(&args.reference);
    let curves = pipeline::run_curves(
        reference,
        &config,
        args.reference.samples,
        AgeConvention::default().days_per_unit,
    )?;

    println!("{}", crate::report::format_curves(&curves));

    if let Some(path) = &args.export {
        crate::io::export::write_curves_csv(path, &curves)?;
        tracing::info!(path = %path.display(), "wrote curve CSV");
    }

    Ok(())
}

fn handle_correlate(args: CorrelateArgs) -> Result<(), AppError> {
    let input = File::open(&args.input).map_err(|e| open_error(&args.input, e))?;
    let (x, y) = crate::io::ingest::read_pairs(input, args.header)?;
    let r = crate::math::pearson(&x, &y)?;
    let fit = crate::math::linear_fit(&x, &y)?;

    println!("{}", crate::report::format_correlation(r, &fit, x.len()));
    Ok(())
}

pub fn reference_config_from_args(args: &ReferenceArgs) -> ReferenceConfig {
    ReferenceConfig {
        table_unit: args.reference_unit,
        output_unit: args.unit,
        has_headers: args.header,
    }
}

pub fn analyzer_config_from_args(args: &ReportArgs) -> AnalyzerConfig {
    AnalyzerConfig {
        age: AgeConvention {
            base_age: args.base_age,
            offset_days: args.offset_days,
            days_per_unit: args.days_per_unit,
        },
        windows: args.windows.clone(),
        subject_unit: args.subject_unit,
        output_unit: args.reference.unit,
        has_headers: args.reference.header,
    }
}

fn open_error(path: &Path, e: std::io::Error) -> AppError {
    AppError::new(2, format!("Failed to open '{}': {e}", path.display()))
}
