//! Prediction Catalog - model prototypes per class
//!
//! Reads the prediction table (`class_name, prototype_id, activation_score`)
//! produced by the explanation model. Sessions sample their class labels from
//! it and the highlight treatments show each class's strongest prototypes.

use crate::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

/// One row of the prediction table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    /// Class the prototype belongs to
    pub class_name: String,
    /// Prototype identifier
    pub prototype_id: String,
    /// Activation of the prototype for this class
    pub activation_score: f64,
}

/// In-memory prediction table.
#[derive(Debug, Clone, Default)]
pub struct PredictionCatalog {
    rows: Vec<PredictionRow>,
}

impl PredictionCatalog {
    /// Build from rows
    #[must_use]
    pub fn new(rows: Vec<PredictionRow>) -> Self {
        Self { rows }
    }

    /// Load from CSV. Extra columns are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or a row fails to decode
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<PredictionRow>, csv::Error>>()?;
        Ok(Self { rows })
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the catalog holds no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Unique class labels in first-seen order.
    #[must_use]
    pub fn class_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for row in &self.rows {
            if !labels.contains(&row.class_name) {
                labels.push(row.class_name.clone());
            }
        }
        labels
    }

    /// Draw `n` distinct labels (fewer if the catalog has fewer classes).
    pub fn sample_labels<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<String> {
        self.class_labels()
            .choose_multiple(rng, n)
            .cloned()
            .collect()
    }

    /// Prototype with the highest activation for `class_name`.
    #[must_use]
    pub fn top_prototype(&self, class_name: &str) -> Option<&PredictionRow> {
        self.rows
            .iter()
            .filter(|r| r.class_name == class_name)
            .max_by(|a, b| compare_scores(a.activation_score, b.activation_score))
    }

    /// Up to `k` prototypes for `class_name`, strongest first.
    #[must_use]
    pub fn top_prototypes(&self, class_name: &str, k: usize) -> Vec<&PredictionRow> {
        let mut rows: Vec<&PredictionRow> = self
            .rows
            .iter()
            .filter(|r| r.class_name == class_name)
            .collect();
        rows.sort_by(|a, b| compare_scores(b.activation_score, a.activation_score));
        rows.truncate(k);
        rows
    }
}

// NaN sorts lowest
fn compare_scores(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
