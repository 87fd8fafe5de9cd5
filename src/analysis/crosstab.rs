//! Cross-tabulation of two categorical keys.

use serde::Serialize;
use std::collections::BTreeSet;

/// Count matrix over sorted row and column keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossTab<R, C> {
    rows: Vec<R>,
    columns: Vec<C>,
    counts: Vec<Vec<usize>>,
}

impl<R: Ord + Clone, C: Ord + Clone> CrossTab<R, C> {
    /// Tabulate `(row, column)` observations.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (R, C)>,
    {
        let pairs: Vec<(R, C)> = pairs.into_iter().collect();
        let rows: Vec<R> = pairs
            .iter()
            .map(|(r, _)| r.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns: Vec<C> = pairs
            .iter()
            .map(|(_, c)| c.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut counts = vec![vec![0; columns.len()]; rows.len()];
        for (r, c) in &pairs {
            if let (Ok(i), Ok(j)) = (rows.binary_search(r), columns.binary_search(c)) {
                counts[i][j] += 1;
            }
        }

        Self {
            rows,
            columns,
            counts,
        }
    }

    /// Row keys, ascending
    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Column keys, ascending
    #[must_use]
    pub fn columns(&self) -> &[C] {
        &self.columns
    }

    /// Check if nothing was tabulated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count at `(row, column)`; zero for unseen keys.
    #[must_use]
    pub fn count(&self, row: &R, column: &C) -> usize {
        match (self.rows.binary_search(row), self.columns.binary_search(column)) {
            (Ok(i), Ok(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    /// Sum of one row.
    #[must_use]
    pub fn row_total(&self, row: &R) -> usize {
        self.rows
            .binary_search(row)
            .map_or(0, |i| self.counts[i].iter().sum())
    }

    /// Row counts divided by the row total, aligned with `columns()`.
    ///
    /// Unseen rows give `None`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn normalized_row(&self, row: &R) -> Option<Vec<f64>> {
        let i = self.rows.binary_search(row).ok()?;
        let total: usize = self.counts[i].iter().sum();
        Some(
            self.counts[i]
                .iter()
                .map(|&n| n as f64 / total as f64)
                .collect(),
        )
    }

    /// Iterate `(row, counts)` in row order.
    pub fn iter_rows(&self) -> impl Iterator<Item = (&R, &[usize])> {
        self.rows.iter().zip(self.counts.iter().map(Vec::as_slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_sorted_keys() {
        let tab = CrossTab::from_pairs(vec![("b", 1), ("a", 2), ("b", 1), ("a", 1)]);

        assert_eq!(tab.rows(), &["a", "b"]);
        assert_eq!(tab.columns(), &[1, 2]);
        assert_eq!(tab.count(&"b", &1), 2);
        assert_eq!(tab.count(&"b", &2), 0);
        assert_eq!(tab.count(&"z", &1), 0);
        assert_eq!(tab.row_total(&"a"), 2);
    }

    #[test]
    fn test_normalized_row() {
        let tab = CrossTab::from_pairs(vec![(0, false), (0, true), (0, true), (0, true)]);
        assert_eq!(tab.normalized_row(&0), Some(vec![0.25, 0.75]));
        assert_eq!(tab.normalized_row(&1), None);
    }

    #[test]
    fn test_empty() {
        let tab: CrossTab<String, String> = CrossTab::from_pairs(Vec::new());
        assert!(tab.is_empty());
        assert_eq!(tab.iter_rows().count(), 0);
    }
}
