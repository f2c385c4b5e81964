use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Profile CSV datasets and run explainable cleaning plans", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Profile a CSV file and derive a cleaning plan from the profile
    Analyze(AnalyzeArgs),
    /// Execute a cleaning plan and write the cleaned dataset plus a report
    Clean(CleanArgs),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Input CSV file to profile
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination for the analysis JSON (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Render the profile and plan reasoning as text instead of JSON
    #[arg(long = "table")]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Input CSV file to clean
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file for the cleaned dataset (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Cleaning plan JSON to execute (derived from a fresh profile if omitted)
    #[arg(short = 'p', long = "plan")]
    pub plan: Option<PathBuf>,
    /// Destination for the execution report JSON
    #[arg(long = "report")]
    pub report: Option<PathBuf>,
    /// CSV delimiter character for reading input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter to use for output (defaults to input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
