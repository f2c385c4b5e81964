pub mod cli;
pub mod data;
pub mod execute;
pub mod frame;
pub mod io_utils;
pub mod plan;
pub mod profile;
pub mod schema;
pub mod table;

use std::{
    env,
    fs::File,
    io::BufReader,
    path::Path,
    sync::OnceLock,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};
use serde::Serialize;

use crate::{
    cli::{AnalyzeArgs, CleanArgs, Cli, Commands},
    execute::{CleanStats, CleaningReport},
    plan::{CleaningPlan, DataKind},
    profile::DatasetProfile,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_remedy", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => handle_analyze(&args),
        Commands::Clean(args) => handle_clean(&args),
    }
}

/// Analysis artifact: the profile plus the plan it seeded, mirroring what
/// callers edit and hand back for plan override.
#[derive(Debug, Serialize)]
struct AnalyzeEnvelope<'a> {
    profile: &'a DatasetProfile,
    plan: &'a CleaningPlan,
}

/// Clean artifact: shape delta, change report, and the executed plan.
#[derive(Debug, Serialize)]
struct CleanEnvelope<'a> {
    stats: &'a CleanStats,
    report: &'a CleaningReport,
    plan: &'a CleaningPlan,
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Analyzing '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );

    let frame = io_utils::read_dataframe(&args.input, delimiter, encoding)
        .with_context(|| format!("Reading dataset from {:?}", args.input))?;
    let dataset_profile = profile::profile_frame(&frame);
    let cleaning_plan = plan::build_plan(&dataset_profile, DataKind::Tabular);

    if args.table {
        print_profile_summary(&dataset_profile, &cleaning_plan);
        if let Some(path) = &args.output {
            write_json(
                Some(path),
                &AnalyzeEnvelope {
                    profile: &dataset_profile,
                    plan: &cleaning_plan,
                },
            )?;
        }
    } else {
        write_json(
            args.output.as_deref(),
            &AnalyzeEnvelope {
                profile: &dataset_profile,
                plan: &cleaning_plan,
            },
        )?;
    }

    info!(
        "Planned {} step(s) across {} column(s)",
        cleaning_plan.steps.len(),
        dataset_profile.column_count
    );
    Ok(())
}

fn handle_clean(args: &CleanArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;

    let frame = io_utils::read_dataframe(&args.input, delimiter, encoding)
        .with_context(|| format!("Reading dataset from {:?}", args.input))?;

    let cleaning_plan = match &args.plan {
        Some(path) => load_plan(path)?,
        None => plan::build_plan(&profile::profile_frame(&frame), DataKind::Tabular),
    };
    info!(
        "Executing {} step(s) against '{}'",
        cleaning_plan.steps.len(),
        args.input.display()
    );

    let (cleaned, report) = execute::execute(&frame, &cleaning_plan);

    let output_delimiter = io_utils::resolve_output_delimiter(
        args.output.as_deref(),
        args.output_delimiter,
        delimiter,
    );
    io_utils::write_dataframe(&cleaned, args.output.as_deref(), output_delimiter)
        .context("Writing cleaned dataset")?;

    let stats = CleanStats::compare(&frame, &cleaned);
    if let Some(path) = &args.report {
        write_json(
            Some(path),
            &CleanEnvelope {
                stats: &stats,
                report: &report,
                plan: &cleaning_plan,
            },
        )?;
    }
    info!(
        "Cleaning complete: removed {} row(s) and {} column(s)",
        stats.removed_rows, stats.removed_columns
    );
    Ok(())
}

/// Loads a plan file, accepting either a bare plan document or the full
/// `analyze` envelope that nests one under its `plan` key.
fn load_plan(path: &Path) -> Result<CleaningPlan> {
    let file = File::open(path).with_context(|| format!("Opening plan file {path:?}"))?;
    let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Parsing plan JSON from {path:?}"))?;
    let plan_value = match value.get("plan") {
        Some(nested) if nested.is_object() => nested.clone(),
        _ => value,
    };
    serde_json::from_value(plan_value)
        .with_context(|| format!("Plan in {path:?} does not match the step contract"))
}

fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    match path {
        Some(p) if !io_utils::is_dash(p) => {
            let file =
                File::create(p).with_context(|| format!("Creating output file {p:?}"))?;
            serde_json::to_writer_pretty(file, value)
                .with_context(|| format!("Writing JSON to {p:?}"))?;
            info!("Wrote {:?}", p);
        }
        _ => {
            let rendered = serde_json::to_string_pretty(value).context("Rendering JSON")?;
            println!("{rendered}");
        }
    }
    Ok(())
}

fn print_profile_summary(profile: &DatasetProfile, plan: &CleaningPlan) {
    let headers = [
        "column", "class", "missing", "mean", "std", "min", "p25", "p75", "max",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect::<Vec<_>>();

    let rows = profile
        .columns
        .iter()
        .map(|name| {
            let class = profile
                .column_types
                .get(name)
                .map(|c| c.to_string())
                .unwrap_or_default();
            let missing = profile
                .missing_counts
                .get(name)
                .map(|m| m.to_string())
                .unwrap_or_default();
            let stats = profile.numeric_stats.get(name);
            let metric = |value: Option<f64>| value.map(format_number).unwrap_or_default();
            vec![
                name.clone(),
                class,
                missing,
                metric(stats.map(|s| s.mean)),
                metric(stats.map(|s| s.std)),
                metric(stats.map(|s| s.min)),
                metric(stats.map(|s| s.p25)),
                metric(stats.map(|s| s.p75)),
                metric(stats.map(|s| s.max)),
            ]
        })
        .collect::<Vec<_>>();

    table::print_table(&headers, &rows);
    println!();
    println!(
        "{} row(s), {} exact duplicate row(s)",
        profile.row_count, profile.duplicate_row_count
    );
    if !plan.reasoning.is_empty() {
        println!();
        for line in &plan.reasoning {
            println!("- {line}");
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
