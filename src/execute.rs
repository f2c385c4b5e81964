//! Plan execution: applies remediation steps to a working copy.
//!
//! Steps run strictly in list order, each against the frame as mutated by
//! every prior step. Outlier bounds and fill statistics are therefore
//! computed on progressively shrunk data, not on the pristine input.
//! Steps referencing absent columns or carrying unknown actions are
//! skipped, never fatal, so stale or hand-edited plans degrade gracefully.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    data::{ComparableValue, Value},
    frame::DataFrame,
    plan::{CleaningPlan, IQR_MULTIPLIER, ImputeMethod, StepAction},
    profile::percentile,
    schema::{ColumnClass, ColumnType},
};

/// Record of exactly what a plan's execution changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub removed_columns: Vec<String>,
    pub imputed_columns: Vec<String>,
    pub outliers_removed: usize,
    pub duplicates_removed: usize,
    pub dropped_rows: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standardized_columns: Option<Vec<String>>,
}

/// Before/after shape summary attached to every clean result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanStats {
    pub original_rows: usize,
    pub original_columns: usize,
    pub cleaned_rows: usize,
    pub cleaned_columns: usize,
    pub removed_rows: usize,
    pub removed_columns: usize,
}

impl CleanStats {
    pub fn compare(original: &DataFrame, cleaned: &DataFrame) -> Self {
        Self {
            original_rows: original.row_count(),
            original_columns: original.column_count(),
            cleaned_rows: cleaned.row_count(),
            cleaned_columns: cleaned.column_count(),
            removed_rows: original.row_count().saturating_sub(cleaned.row_count()),
            removed_columns: original
                .column_count()
                .saturating_sub(cleaned.column_count()),
        }
    }
}

/// Executes a plan against a clone of `frame`; the input is never mutated.
pub fn execute(frame: &DataFrame, plan: &CleaningPlan) -> (DataFrame, CleaningReport) {
    let mut working = frame.clone();
    let mut report = CleaningReport::default();

    for step in &plan.steps {
        match &step.action {
            StepAction::DropColumns { columns } => {
                apply_drop_columns(&mut working, columns, &mut report);
            }
            StepAction::DropDuplicates => apply_drop_duplicates(&mut working, &mut report),
            StepAction::ImputeOrDrop { details } => {
                apply_impute(&mut working, details, &mut report);
            }
            StepAction::IqrFilter { columns } => {
                apply_iqr_filter(&mut working, columns, &mut report);
            }
            StepAction::CleanText { columns } => {
                apply_clean_text(&mut working, columns, &mut report);
            }
            StepAction::Denoise | StepAction::Unknown => {
                debug!("Skipping step '{}': no tabular semantics", step.step);
            }
        }
    }

    (working, report)
}

fn apply_drop_columns(working: &mut DataFrame, columns: &[String], report: &mut CleaningReport) {
    for name in columns {
        if let Some(idx) = working.column_index(name) {
            working.drop_column(idx);
        }
    }
    // The report echoes the plan's full intent, absent columns included.
    report
        .removed_columns
        .extend(columns.iter().map(|c| c.to_string()));
}

fn apply_drop_duplicates(working: &mut DataFrame, report: &mut CleaningReport) {
    let mut seen: BTreeSet<Vec<ComparableValue>> = BTreeSet::new();
    let removed = working.retain_rows(|row| {
        let key: Vec<ComparableValue> = row.iter().cloned().map(ComparableValue).collect();
        seen.insert(key)
    });
    report.duplicates_removed += removed;
    report.dropped_rows += removed;
}

fn apply_impute(
    working: &mut DataFrame,
    details: &BTreeMap<String, ImputeMethod>,
    report: &mut CleaningReport,
) {
    for (name, method) in details {
        let Some(idx) = working.column_index(name) else {
            continue;
        };
        let Some(fill) = fill_value(working, idx, *method) else {
            continue;
        };
        working.fill_missing(idx, &fill);
        report.imputed_columns.push(format!("{name} ({method})"));
    }
}

/// Computes the fill value for one column, or `None` when the method
/// cannot determine one (no non-missing values, or mean/median requested
/// for a non-numeric column).
fn fill_value(working: &mut DataFrame, column: usize, method: ImputeMethod) -> Option<Value> {
    match method {
        ImputeMethod::Mean | ImputeMethod::Median => {
            let column_type = working.schema().columns[column].data_type.clone();
            if column_type.class() != ColumnClass::Numeric {
                return None;
            }
            let mut values = working.numeric_values(column);
            if values.is_empty() {
                return None;
            }
            let fill = match method {
                ImputeMethod::Mean => values.iter().sum::<f64>() / values.len() as f64,
                ImputeMethod::Median => {
                    values.sort_by(|a, b| a.total_cmp(b));
                    percentile(&values, 0.5)
                }
                ImputeMethod::Mode => unreachable!(),
            };
            if column_type == ColumnType::Integer {
                if fill.fract() == 0.0 {
                    Some(Value::Integer(fill as i64))
                } else {
                    working.promote_to_float(column);
                    Some(Value::Float(fill))
                }
            } else {
                Some(Value::Float(fill))
            }
        }
        ImputeMethod::Mode => {
            let mut counts: BTreeMap<Value, usize> = BTreeMap::new();
            for value in working.present_values(column) {
                *counts.entry(value.clone()).or_insert(0) += 1;
            }
            // Ascending key order means ties resolve to the smallest value.
            let mut best: Option<(&Value, usize)> = None;
            for (value, count) in &counts {
                if best.map(|(_, c)| *count > c).unwrap_or(true) {
                    best = Some((value, *count));
                }
            }
            best.map(|(value, _)| value.clone())
        }
    }
}

fn apply_iqr_filter(working: &mut DataFrame, columns: &[String], report: &mut CleaningReport) {
    for name in columns {
        let Some(idx) = working.column_index(name) else {
            continue;
        };
        if working.schema().columns[idx].data_type.class() != ColumnClass::Numeric {
            continue;
        }
        let mut values = working.numeric_values(idx);
        let removed = if values.is_empty() {
            // No basis for bounds; every cell is missing and fails the
            // retention test.
            working.retain_rows(|_| false)
        } else {
            values.sort_by(|a, b| a.total_cmp(b));
            let q1 = percentile(&values, 0.25);
            let q3 = percentile(&values, 0.75);
            let iqr = q3 - q1;
            let lower = q1 - IQR_MULTIPLIER * iqr;
            let upper = q3 + IQR_MULTIPLIER * iqr;
            working.retain_rows(|row| {
                row[idx]
                    .as_ref()
                    .and_then(Value::as_metric)
                    .map(|v| v >= lower && v <= upper)
                    .unwrap_or(false)
            })
        };
        report.outliers_removed += removed;
        report.dropped_rows += removed;
    }
}

fn apply_clean_text(working: &mut DataFrame, columns: &[String], report: &mut CleaningReport) {
    let mut standardized = Vec::new();
    for name in columns {
        let Some(idx) = working.column_index(name) else {
            continue;
        };
        if working.schema().columns[idx].data_type != ColumnType::String {
            continue;
        }
        working.map_column(idx, |value| {
            if let Value::String(s) = value {
                let trimmed = s.trim();
                if trimmed.len() != s.len() {
                    *s = trimmed.to_string();
                }
            }
        });
        standardized.push(name.to_string());
    }
    if !standardized.is_empty() {
        report
            .standardized_columns
            .get_or_insert_with(Vec::new)
            .extend(standardized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanStep;
    use crate::schema::{infer_schema, parse_typed_row};

    fn frame_from_csv(headers: &[&str], raw: &[&[&str]]) -> DataFrame {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let rows: Vec<Vec<String>> = raw
            .iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect();
        let schema = infer_schema(&headers, &rows);
        let typed = rows
            .iter()
            .map(|row| parse_typed_row(&schema, row).unwrap())
            .collect();
        DataFrame::from_rows(schema, typed).unwrap()
    }

    fn step(action: StepAction) -> PlanStep {
        PlanStep {
            step: String::new(),
            reason: String::new(),
            action,
        }
    }

    fn plan_of(actions: Vec<StepAction>) -> CleaningPlan {
        CleaningPlan {
            steps: actions.into_iter().map(step).collect(),
            reasoning: Vec::new(),
        }
    }

    #[test]
    fn drop_columns_records_absent_names_but_ignores_them() {
        let frame = frame_from_csv(&["a", "b"], &[&["1", "2"]]);
        let plan = plan_of(vec![StepAction::DropColumns {
            columns: vec!["b".to_string(), "ghost".to_string()],
        }]);
        let (cleaned, report) = execute(&frame, &plan);
        assert_eq!(cleaned.column_count(), 1);
        assert_eq!(report.removed_columns, vec!["b", "ghost"]);
    }

    #[test]
    fn executor_never_mutates_the_input_frame() {
        let frame = frame_from_csv(&["a"], &[&["1"], &["1"], &["2"]]);
        let before = frame.clone();
        let plan = plan_of(vec![StepAction::DropDuplicates]);
        let (cleaned, _) = execute(&frame, &plan);
        assert_eq!(frame, before);
        assert_eq!(cleaned.row_count(), 2);
    }

    #[test]
    fn mode_ties_resolve_to_the_smallest_value() {
        let mut frame = frame_from_csv(&["tag"], &[&["b"], &["a"], &[""], &["b"], &["a"]]);
        let fill = fill_value(&mut frame, 0, ImputeMethod::Mode).unwrap();
        assert_eq!(fill, Value::String("a".into()));
    }

    #[test]
    fn mode_with_no_values_is_a_silent_no_op() {
        let frame = frame_from_csv(&["tag", "v"], &[&["", "1"], &["", "2"]]);
        let mut details = BTreeMap::new();
        details.insert("tag".to_string(), ImputeMethod::Mode);
        let plan = plan_of(vec![StepAction::ImputeOrDrop { details }]);
        let (cleaned, report) = execute(&frame, &plan);
        assert!(report.imputed_columns.is_empty());
        assert_eq!(cleaned.missing_count(0), 2);
    }

    #[test]
    fn fractional_median_promotes_integer_columns() {
        let frame = frame_from_csv(&["n"], &[&["1"], &["2"], &["3"], &["4"], &[""]]);
        let mut details = BTreeMap::new();
        details.insert("n".to_string(), ImputeMethod::Median);
        let plan = plan_of(vec![StepAction::ImputeOrDrop { details }]);
        let (cleaned, report) = execute(&frame, &plan);
        assert_eq!(report.imputed_columns, vec!["n (median)"]);
        assert_eq!(cleaned.schema().columns[0].data_type, ColumnType::Float);
        assert_eq!(cleaned.cell(4, 0), Some(&Value::Float(2.5)));
    }

    #[test]
    fn mean_on_categorical_column_is_skipped() {
        let frame = frame_from_csv(&["tag"], &[&["x"], &[""]]);
        let mut details = BTreeMap::new();
        details.insert("tag".to_string(), ImputeMethod::Mean);
        let plan = plan_of(vec![StepAction::ImputeOrDrop { details }]);
        let (cleaned, report) = execute(&frame, &plan);
        assert!(report.imputed_columns.is_empty());
        assert_eq!(cleaned.missing_count(0), 1);
    }

    #[test]
    fn iqr_filter_drops_rows_with_missing_cells() {
        let frame = frame_from_csv(&["v"], &[&["10"], &[""], &["11"], &["9"], &["10"]]);
        let plan = plan_of(vec![StepAction::IqrFilter {
            columns: vec!["v".to_string()],
        }]);
        let (cleaned, report) = execute(&frame, &plan);
        assert_eq!(cleaned.row_count(), 4);
        assert_eq!(report.outliers_removed, 1);
        assert_eq!(report.dropped_rows, 1);
    }

    #[test]
    fn iqr_bounds_recompute_after_each_column() {
        // Columns filter sequentially: the second column's bounds come from
        // the rows that survived the first column's pass.
        let frame = frame_from_csv(
            &["a", "b"],
            &[
                &["1000", "10"],
                &["10", "10"],
                &["10", "10"],
                &["10", "10"],
                &["10", "10"],
                &["10", "10"],
                &["10", "10"],
                &["10", "10"],
                &["10", "500"],
                &["10", "10"],
            ],
        );
        let plan = plan_of(vec![StepAction::IqrFilter {
            columns: vec!["a".to_string(), "b".to_string()],
        }]);
        let (cleaned, report) = execute(&frame, &plan);
        assert_eq!(cleaned.row_count(), 8);
        assert_eq!(report.outliers_removed, 2);
    }

    #[test]
    fn unknown_actions_contribute_nothing() {
        let frame = frame_from_csv(&["a"], &[&["1"], &["2"]]);
        let plan = plan_of(vec![StepAction::Unknown, StepAction::Denoise]);
        let (cleaned, report) = execute(&frame, &plan);
        assert_eq!(cleaned.row_count(), 2);
        assert_eq!(report, CleaningReport::default());
    }

    #[test]
    fn clean_text_trims_and_records_textual_columns_only() {
        let frame = frame_from_csv(&["name", "n"], &[&["  Alice  ", "1"], &["Bob", "2"]]);
        let plan = plan_of(vec![StepAction::CleanText {
            columns: vec!["name".to_string(), "n".to_string(), "ghost".to_string()],
        }]);
        let (cleaned, report) = execute(&frame, &plan);
        assert_eq!(cleaned.cell(0, 0), Some(&Value::String("Alice".into())));
        assert_eq!(report.standardized_columns, Some(vec!["name".to_string()]));
    }

    #[test]
    fn clean_stats_summarize_shape_delta() {
        let frame = frame_from_csv(&["a", "b"], &[&["1", "2"], &["1", "2"]]);
        let plan = plan_of(vec![
            StepAction::DropColumns {
                columns: vec!["b".to_string()],
            },
            StepAction::DropDuplicates,
        ]);
        let (cleaned, _) = execute(&frame, &plan);
        let stats = CleanStats::compare(&frame, &cleaned);
        assert_eq!(stats.removed_rows, 1);
        assert_eq!(stats.removed_columns, 1);
        assert_eq!(stats.cleaned_rows, 1);
        assert_eq!(stats.cleaned_columns, 1);
    }
}
