//! I/O utilities for CSV reading, writing, encoding, and delimiter
//! resolution.
//!
//! All file I/O in csv-remedy flows through this module:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` →
//!   comma, `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8;
//!   output is always UTF-8.
//! - **stdin/stdout**: the `-` path convention routes through standard
//!   streams.
//! - **Whole-file conversion**: [`read_dataframe`] decodes, infers column
//!   types over the full file, and parses typed cells; [`write_dataframe`]
//!   encodes a cleaned frame back out with `QuoteStyle::Always`.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::{
    frame::DataFrame,
    schema::{infer_schema, parse_typed_row},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>, fallback: u8) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    if let Some(path) = path {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => return DEFAULT_TSV_DELIMITER,
            Some(ext) if ext.eq_ignore_ascii_case("csv") => return DEFAULT_CSV_DELIMITER,
            _ => {}
        }
    }
    fallback
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    Ok(builder.from_reader(reader))
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true);
    Ok(builder.from_writer(base))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}

/// Reads a whole CSV file into a typed [`DataFrame`]. Column types are
/// inferred over every row, so the subsequent typed parse cannot hit a
/// value inference has not already seen.
pub fn read_dataframe(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<DataFrame> {
    let mut reader = open_csv_reader_from_path(path, delimiter)?;
    let headers = reader_headers(&mut reader, encoding)?;

    let mut raw_rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        raw_rows.push(decode_record(&record, encoding)?);
    }

    let schema = infer_schema(&headers, &raw_rows);
    let mut frame = DataFrame::new(schema);
    for (idx, raw) in raw_rows.iter().enumerate() {
        let typed = parse_typed_row(frame.schema(), raw)
            .with_context(|| format!("Parsing row {}", idx + 2))?;
        frame
            .push_row(typed)
            .with_context(|| format!("Ingesting row {}", idx + 2))?;
    }
    Ok(frame)
}

/// Writes a frame as CSV; missing cells become empty fields.
pub fn write_dataframe(frame: &DataFrame, path: Option<&Path>, delimiter: u8) -> Result<()> {
    let mut writer = open_csv_writer(path, delimiter)?;
    writer
        .write_record(frame.schema().headers().iter())
        .context("Writing output headers")?;
    for (idx, row) in frame.rows().iter().enumerate() {
        let fields = row
            .iter()
            .map(|cell| cell.as_ref().map(|v| v.as_display()).unwrap_or_default());
        writer
            .write_record(fields)
            .with_context(|| format!("Writing output row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output writer")?;
    Ok(())
}
