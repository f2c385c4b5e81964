//! In-memory tabular dataset.
//!
//! A [`DataFrame`] owns an ordered [`Schema`] and row-major typed cells.
//! Missing cells are `None`. The container enforces one structural
//! invariant: every row has exactly one cell per column. The cleaning
//! executor works on a clone and never mutates the caller's frame.

use thiserror::Error;

use crate::{
    data::{ComparableValue, Value},
    schema::Schema,
};

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("row {row} has {found} cell(s), expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    schema: Schema,
    rows: Vec<Vec<Option<Value>>>,
}

impl DataFrame {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(schema: Schema, rows: Vec<Vec<Option<Value>>>) -> Result<Self, FrameError> {
        let mut frame = Self::new(schema);
        for row in rows {
            frame.push_row(row)?;
        }
        Ok(frame)
    }

    pub fn push_row(&mut self, row: Vec<Option<Value>>) -> Result<(), FrameError> {
        let expected = self.schema.columns.len();
        if row.len() != expected {
            return Err(FrameError::RowWidth {
                row: self.rows.len() + 1,
                expected,
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Option<Value>>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.schema.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.column_index(name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r[column].as_ref())
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: Option<Value>) {
        self.rows[row][column] = value;
    }

    /// Non-missing values of one column projected to `f64`.
    /// Cells that are present but not numeric are skipped.
    pub fn numeric_values(&self, column: usize) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row[column].as_ref())
            .filter_map(Value::as_metric)
            .collect()
    }

    /// Non-missing values of one column, borrowed.
    pub fn present_values(&self, column: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |row| row[column].as_ref())
    }

    pub fn missing_count(&self, column: usize) -> usize {
        self.rows.iter().filter(|row| row[column].is_none()).count()
    }

    /// Fills every missing cell of one column with a copy of `value`;
    /// returns the number of cells filled.
    pub fn fill_missing(&mut self, column: usize, value: &Value) -> usize {
        let mut filled = 0usize;
        for row in &mut self.rows {
            if row[column].is_none() {
                row[column] = Some(value.clone());
                filled += 1;
            }
        }
        filled
    }

    /// Applies `f` to every present cell of one column in place.
    pub fn map_column<F>(&mut self, column: usize, mut f: F)
    where
        F: FnMut(&mut Value),
    {
        for row in &mut self.rows {
            if let Some(value) = row[column].as_mut() {
                f(value);
            }
        }
    }

    /// Widens an integer column to float, keeping cells homogeneous when a
    /// fractional fill value lands in it.
    pub fn promote_to_float(&mut self, column: usize) {
        if self.schema.columns[column].data_type != crate::schema::ColumnType::Float {
            self.schema.columns[column].data_type = crate::schema::ColumnType::Float;
            for row in &mut self.rows {
                if let Some(Value::Integer(i)) = row[column] {
                    row[column] = Some(Value::Float(i as f64));
                }
            }
        }
    }

    /// Removes a column from the schema and every row.
    pub fn drop_column(&mut self, column: usize) {
        self.schema.columns.remove(column);
        for row in &mut self.rows {
            row.remove(column);
        }
    }

    /// Keeps only rows for which the predicate holds; returns removed count.
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[Option<Value>]) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }

    /// Duplicate key for one row: every cell wrapped for total ordering.
    pub fn row_key(&self, row: usize) -> Vec<ComparableValue> {
        self.rows[row]
            .iter()
            .cloned()
            .map(ComparableValue)
            .collect()
    }
}
