//! Analysis Reporter: offline statistics over the persisted response table
//!
//! # Components
//! - `crosstab.rs`: `CrossTab`, count matrices for the contingency and
//!   confusion tables
//! - `stats.rs`: Welch t-test backed by `statrs`
//!
//! A record counts as correct when its testing answer equals its class.
//! Untagged records (empty teaching phase) are left out of every grouping
//! keyed on the phase.

pub mod crosstab;
pub mod stats;

pub use crosstab::CrossTab;
pub use stats::{welch_t_test, TTestResult, ALPHA};

use crate::recorder::ResponseTable;
use crate::session::{GuessRecord, TeachingPhase, DONT_KNOW};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

/// Table-wide counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    /// Rows in the table
    pub total_records: usize,
    /// Distinct participant names
    pub unique_users: usize,
    /// Distinct classes
    pub unique_classes: usize,
    /// Distinct teaching phases, in first-seen order
    pub treatment_types: Vec<TeachingPhase>,
}

/// Mean testing accuracy of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAccuracy<K> {
    /// Group key
    pub key: K,
    /// Fraction of correct testing answers
    pub accuracy: f64,
    /// Rows in the group
    pub count: usize,
}

/// Contingency row key: (teaching phase, guessed correctly before teaching).
pub type ContingencyKey = (TeachingPhase, bool);

/// Everything the analysis binary prints.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Table-wide counts
    pub overview: Overview,
    /// Accuracy per teaching phase
    pub accuracy_by_phase: Vec<GroupAccuracy<TeachingPhase>>,
    /// Accuracy per (participant, teaching phase)
    pub accuracy_by_participant: Vec<GroupAccuracy<(String, TeachingPhase)>>,
    /// Accuracy per (class, teaching phase)
    pub accuracy_by_class: Vec<GroupAccuracy<(String, TeachingPhase)>>,
    /// Testing correctness by teaching phase and guessing correctness
    pub contingency: CrossTab<ContingencyKey, bool>,
    /// Actual class against testing answer
    pub confusion: CrossTab<String, String>,
    /// Accuracy per phase over rows first answered "I don't know"
    pub learning_effect: Vec<GroupAccuracy<TeachingPhase>>,
    /// treatment1 against treatment2; `None` when either group is too small
    pub treatment_comparison: Option<TTestResult>,
    /// Accuracy per phase with "I don't know" testing answers removed
    pub confident_accuracy: Vec<GroupAccuracy<TeachingPhase>>,
}

impl AnalysisReport {
    /// Load the table at `path` and analyze it.
    ///
    /// # Errors
    ///
    /// Returns `Error::InsufficientData` if the table is absent or empty, or a
    /// CSV error if it cannot be decoded
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = ResponseTable::load(path)?;
        if table.is_empty() {
            return Err(Error::InsufficientData(format!(
                "no responses in {}",
                path.display()
            )));
        }
        Ok(Self::from_records(table.records()))
    }

    /// Analyze in-memory records.
    #[must_use]
    pub fn from_records(records: &[GuessRecord]) -> Self {
        let tagged: Vec<&GuessRecord> = records
            .iter()
            .filter(|r| r.teaching_phase.is_tagged())
            .collect();

        let confusion = CrossTab::from_pairs(records.iter().filter_map(|r| {
            r.testing_phase_user_answer
                .as_ref()
                .map(|answer| (r.class_label.clone(), answer.clone()))
        }));

        let contingency = CrossTab::from_pairs(
            tagged
                .iter()
                .map(|r| ((r.teaching_phase, r.correct_in_teaching()), r.correct_testing())),
        );

        let treatment_comparison =
            compare_phases(records, TeachingPhase::Treatment1, TeachingPhase::Treatment2).ok();

        Self {
            overview: overview(records),
            accuracy_by_phase: accuracy_by(tagged.iter().copied(), |r| r.teaching_phase),
            accuracy_by_participant: accuracy_by(tagged.iter().copied(), |r| {
                (r.participant_name.clone(), r.teaching_phase)
            }),
            accuracy_by_class: accuracy_by(tagged.iter().copied(), |r| {
                (r.class_label.clone(), r.teaching_phase)
            }),
            contingency,
            confusion,
            learning_effect: accuracy_by(
                tagged.iter().copied().filter(|r| r.user_selection == DONT_KNOW),
                |r| r.teaching_phase,
            ),
            treatment_comparison,
            confident_accuracy: accuracy_by(
                tagged
                    .iter()
                    .copied()
                    .filter(|r| r.testing_phase_user_answer.as_deref() != Some(DONT_KNOW)),
                |r| r.teaching_phase,
            ),
        }
    }

    /// Row-normalized contingency row.
    #[must_use]
    pub fn contingency_rate(&self, phase: TeachingPhase, correct_in_teaching: bool) -> Option<f64> {
        let row = (phase, correct_in_teaching);
        let rates = self.contingency.normalized_row(&row)?;
        let idx = self.contingency.columns().iter().position(|&c| c)?;
        rates.get(idx).copied()
    }
}

/// Welch t-test of testing correctness between two teaching phases.
///
/// # Errors
///
/// Returns `Error::InsufficientData` if either phase has fewer than two rows
pub fn compare_phases(
    records: &[GuessRecord],
    a: TeachingPhase,
    b: TeachingPhase,
) -> Result<TTestResult> {
    let scores = |phase: TeachingPhase| -> Vec<f64> {
        records
            .iter()
            .filter(|r| r.teaching_phase == phase)
            .map(|r| if r.correct_testing() { 1.0 } else { 0.0 })
            .collect()
    };
    welch_t_test(&scores(a), &scores(b))
}

fn overview(records: &[GuessRecord]) -> Overview {
    let users: HashSet<&str> = records.iter().map(|r| r.participant_name.as_str()).collect();
    let classes: HashSet<&str> = records.iter().map(|r| r.class_label.as_str()).collect();
    let mut treatment_types = Vec::new();
    for r in records {
        if !treatment_types.contains(&r.teaching_phase) {
            treatment_types.push(r.teaching_phase);
        }
    }
    Overview {
        total_records: records.len(),
        unique_users: users.len(),
        unique_classes: classes.len(),
        treatment_types,
    }
}

#[allow(clippy::cast_precision_loss)]
fn accuracy_by<'a, K, I, F>(records: I, key: F) -> Vec<GroupAccuracy<K>>
where
    K: Ord,
    I: IntoIterator<Item = &'a GuessRecord>,
    F: Fn(&GuessRecord) -> K,
{
    let mut groups: BTreeMap<K, (usize, usize)> = BTreeMap::new();
    for r in records {
        let entry = groups.entry(key(r)).or_default();
        entry.0 += usize::from(r.correct_testing());
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(key, (correct, count))| GroupAccuracy {
            key,
            accuracy: correct as f64 / count as f64,
            count,
        })
        .collect()
}

fn write_phase_table(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    rows: &[GroupAccuracy<TeachingPhase>],
) -> fmt::Result {
    writeln!(f, "\n{title}:")?;
    if rows.is_empty() {
        return writeln!(f, "  (no data)");
    }
    for row in rows {
        writeln!(f, "  {:<12} {:.3}  (n={})", row.key, row.accuracy, row.count)?;
    }
    Ok(())
}

fn write_pair_table(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    rows: &[GroupAccuracy<(String, TeachingPhase)>],
) -> fmt::Result {
    writeln!(f, "\n{title}:")?;
    if rows.is_empty() {
        return writeln!(f, "  (no data)");
    }
    for row in rows {
        let (name, phase) = &row.key;
        writeln!(f, "  {name:<32} {phase:<12} {:.3}  (n={})", row.accuracy, row.count)?;
    }
    Ok(())
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.overview;
        let types: Vec<&str> = o
            .treatment_types
            .iter()
            .map(|t| if t.is_tagged() { t.as_str() } else { "(untagged)" })
            .collect();
        writeln!(f, "Dataset Overview:")?;
        writeln!(f, "  Total records: {}", o.total_records)?;
        writeln!(f, "  Unique users: {}", o.unique_users)?;
        writeln!(f, "  Unique classes: {}", o.unique_classes)?;
        writeln!(f, "  Treatment types: {}", types.join(", "))?;

        write_phase_table(f, "Accuracy by Treatment", &self.accuracy_by_phase)?;
        write_pair_table(f, "Accuracy by User and Treatment", &self.accuracy_by_participant)?;
        write_pair_table(f, "Accuracy by Class and Treatment", &self.accuracy_by_class)?;

        writeln!(f, "\nTesting Correctness by Treatment and Teaching Correctness:")?;
        if self.contingency.is_empty() {
            writeln!(f, "  (no data)")?;
        }
        for (phase, correct_in_teaching) in self.contingency.rows() {
            let rate = self
                .contingency_rate(*phase, *correct_in_teaching)
                .unwrap_or(0.0);
            writeln!(
                f,
                "  {phase:<12} taught-correct={correct_in_teaching:<5}  correct={rate:.3}  incorrect={:.3}",
                1.0 - rate
            )?;
        }

        writeln!(f, "\nConfusion Matrix (actual x answer):")?;
        if self.confusion.is_empty() {
            writeln!(f, "  (no data)")?;
        }
        for (actual, counts) in self.confusion.iter_rows() {
            let cells: Vec<String> = self
                .confusion
                .columns()
                .iter()
                .zip(counts)
                .filter(|(_, n)| **n > 0)
                .map(|(answer, n)| format!("{answer}={n}"))
                .collect();
            writeln!(f, "  {actual}: {}", cells.join(", "))?;
        }

        write_phase_table(
            f,
            "Learning Effect (initially \"I don't know\")",
            &self.learning_effect,
        )?;

        writeln!(f, "\nStatistical Test (treatment1 vs treatment2):")?;
        match &self.treatment_comparison {
            Some(t) => {
                writeln!(f, "  t-statistic: {:.4}", t.statistic)?;
                writeln!(f, "  p-value: {:.4}", t.p_value)?;
                writeln!(f, "  Significant difference: {}", t.significant)?;
            }
            None => writeln!(f, "  unavailable (fewer than two responses in a group)")?,
        }

        write_phase_table(
            f,
            "Accuracy Excluding \"I don't know\" Responses",
            &self.confident_accuracy,
        )
    }
}
