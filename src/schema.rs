//! Column schema and type inference.
//!
//! A [`Schema`] is the ordered list of column definitions backing a
//! [`DataFrame`](crate::frame::DataFrame). Types are inferred by candidate
//! elimination: every column starts out possibly being every type, and each
//! non-empty field rules candidates out until the most specific survivor
//! decides. Empty fields are missing cells and never influence inference.

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{Value, parse_naive_date, parse_naive_datetime, parse_typed_value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Guid,
}

/// Planner-facing classification of a column type. Matches the original
/// pandas split: number dtypes are numeric, object-like dtypes are
/// categorical, everything else (booleans, temporals, GUIDs) is other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnClass {
    Numeric,
    Categorical,
    Other,
}

impl ColumnType {
    pub fn class(&self) -> ColumnClass {
        match self {
            ColumnType::Integer | ColumnType::Float => ColumnClass::Numeric,
            ColumnType::String => ColumnClass::Categorical,
            _ => ColumnClass::Other,
        }
    }
}

impl fmt::Display for ColumnClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnClass::Numeric => "numeric",
            ColumnClass::Categorical => "categorical",
            ColumnClass::Other => "other",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub data_type: ColumnType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schema {
    pub columns: Vec<ColumnMeta>,
}

impl Schema {
    pub fn from_headers(headers: &[String]) -> Self {
        let columns = headers
            .iter()
            .map(|name| ColumnMeta {
                name: name.to_string(),
                data_type: ColumnType::String,
            })
            .collect();
        Schema { columns }
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    possible_integer: bool,
    possible_float: bool,
    possible_boolean: bool,
    possible_date: bool,
    possible_datetime: bool,
    possible_guid: bool,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            possible_integer: true,
            possible_float: true,
            possible_boolean: true,
            possible_date: true,
            possible_datetime: true,
            possible_guid: true,
        }
    }

    fn observe(&mut self, field: &str) {
        if self.possible_boolean
            && !matches!(
                field.to_ascii_lowercase().as_str(),
                "true" | "false" | "t" | "f" | "yes" | "no" | "y" | "n"
            )
        {
            self.possible_boolean = false;
        }
        if self.possible_integer && field.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_float && field.parse::<f64>().is_err() {
            self.possible_float = false;
        }
        if self.possible_date && parse_naive_date(field).is_err() {
            self.possible_date = false;
        }
        if self.possible_datetime && parse_naive_datetime(field).is_err() {
            self.possible_datetime = false;
        }
        if self.possible_guid
            && uuid::Uuid::parse_str(field.trim().trim_matches(|c| matches!(c, '{' | '}')))
                .is_err()
        {
            self.possible_guid = false;
        }
    }

    fn decide(&self) -> ColumnType {
        if self.possible_boolean {
            ColumnType::Boolean
        } else if self.possible_integer {
            ColumnType::Integer
        } else if self.possible_float {
            ColumnType::Float
        } else if self.possible_date {
            ColumnType::Date
        } else if self.possible_datetime {
            ColumnType::DateTime
        } else if self.possible_guid {
            ColumnType::Guid
        } else {
            ColumnType::String
        }
    }
}

/// Infers one [`ColumnType`] per header by scanning every raw row.
/// A full scan (rather than sampling) guarantees that typed parsing of the
/// same rows cannot fail afterwards.
pub fn infer_schema(headers: &[String], rows: &[Vec<String>]) -> Schema {
    let mut candidates = vec![TypeCandidate::new(); headers.len()];
    for row in rows {
        for (idx, field) in row.iter().enumerate().take(headers.len()) {
            if field.is_empty() {
                continue;
            }
            candidates[idx].observe(field);
        }
    }

    let columns = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| ColumnMeta {
            name: header.to_string(),
            data_type: candidates[idx].decide(),
        })
        .collect();

    Schema { columns }
}

/// Converts a raw string row into typed cells using the schema's column
/// definitions. Short rows pad with missing cells.
pub fn parse_typed_row(schema: &Schema, raw: &[String]) -> Result<Vec<Option<Value>>> {
    schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let value = raw.get(idx).map(|s| s.as_str()).unwrap_or("");
            parse_typed_value(value, &column.data_type)
        })
        .collect()
}
