//! Command-line parsing for the growth-curve tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the interpolation/analysis code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{AgeConvention, DEFAULT_WINDOWS, WeightUnit};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "growth", version, about = "Growth trajectory vs reference percentile curves")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compare a subject's trajectory with the reference percentiles.
    Report(ReportArgs),
    /// Fit and sample the reference percentile curves only.
    Curves(CurvesArgs),
    /// Correlate two paired score columns and fit a line.
    Correlate(CorrelateArgs),
}

/// Reference table options shared by `report` and `curves`.
#[derive(Debug, Args, Clone)]
pub struct ReferenceArgs {
    /// Reference CSV (`time,percentile,value`).
    #[arg(long, value_name = "CSV")]
    pub reference: PathBuf,

    /// Unit of unsuffixed reference values.
    #[arg(long, value_enum, default_value_t = WeightUnit::Kilograms)]
    pub reference_unit: WeightUnit,

    /// Unit every value is reported in.
    #[arg(long, value_enum, default_value_t = WeightUnit::Grams)]
    pub unit: WeightUnit,

    /// Points per sampled curve (default: one per day across the domain).
    #[arg(long)]
    pub samples: Option<usize>,

    /// Input files start with a header row.
    #[arg(long)]
    pub header: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Subject CSV (`date,day_offset,value`).
    #[arg(long, value_name = "CSV")]
    pub subject: PathBuf,

    /// Unit of unsuffixed subject values.
    #[arg(long, value_enum, default_value_t = WeightUnit::Grams)]
    pub subject_unit: WeightUnit,

    /// Age (weeks) projections run to.
    #[arg(long, default_value_t = 50.0)]
    pub to_age: f64,

    /// Lookback windows (observation intervals) for rate projections.
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_WINDOWS)]
    pub windows: Vec<usize>,

    /// Gestational age at day offset `-offset_days`.
    #[arg(long, default_value_t = AgeConvention::default().base_age)]
    pub base_age: f64,

    /// Days added to each day offset.
    #[arg(long, default_value_t = AgeConvention::default().offset_days, allow_negative_numbers = true)]
    pub offset_days: i64,

    /// Days per age unit.
    #[arg(long, default_value_t = AgeConvention::default().days_per_unit)]
    pub days_per_unit: u32,

    /// Write every derived series to a JSON file.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CurvesArgs {
    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Write sampled curves to a CSV file.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CorrelateArgs {
    /// Paired samples CSV (`x,y`).
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Input file starts with a header row.
    #[arg(long)]
    pub header: bool,
}
