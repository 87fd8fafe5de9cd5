//! Two-sample unequal-variance (Welch) t-test via the `statrs` crate.
//!
//! Statistic: t = (mean_a - mean_b) / sqrt(var_a/n_a + var_b/n_b)
//! Degrees of freedom: Welch-Satterthwaite.
//! p-value: two-sided, from the Student's t survival function.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance level used for the `significant` flag.
pub const ALPHA: f64 = 0.05;

/// Outcome of a Welch t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    /// t statistic (positive when the first group has the higher mean)
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Welch-Satterthwaite degrees of freedom
    pub df: f64,
    /// `p_value < ALPHA`
    pub significant: bool,
}

/// Arithmetic mean; `None` for an empty slice.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample variance (n - 1 denominator); `None` below two values.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Welch's t-test of `a` against `b`.
///
/// Two groups with zero spread are compared exactly: identical means give
/// t = 0 and p = 1, different means give an infinite statistic and p = 0.
///
/// # Errors
///
/// Returns `Error::InsufficientData` if either group has fewer than two values
#[allow(clippy::cast_precision_loss)]
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<TTestResult> {
    let (Some(var_a), Some(var_b)) = (sample_variance(a), sample_variance(b)) else {
        return Err(Error::InsufficientData(format!(
            "t-test needs at least two observations per group (got {} and {})",
            a.len(),
            b.len()
        )));
    };
    let n_a = a.len() as f64;
    let n_b = b.len() as f64;
    let diff = mean(a).unwrap_or_default() - mean(b).unwrap_or_default();

    let se_a = var_a / n_a;
    let se_b = var_b / n_b;
    let se2 = se_a + se_b;

    if se2 <= 0.0 {
        let (statistic, p_value) = if diff == 0.0 {
            (0.0, 1.0)
        } else {
            (diff.signum() * f64::INFINITY, 0.0)
        };
        return Ok(TTestResult {
            statistic,
            p_value,
            df: n_a + n_b - 2.0,
            significant: p_value < ALPHA,
        });
    }

    let statistic = diff / se2.sqrt();
    let df = se2 * se2 / (se_a * se_a / (n_a - 1.0) + se_b * se_b / (n_b - 1.0));

    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| Error::InsufficientData(format!("invalid t distribution (df = {df}): {e}")))?;
    let p_value = (2.0 * dist.sf(statistic.abs())).clamp(0.0, 1.0);

    Ok(TTestResult {
        statistic,
        p_value,
        df,
        significant: p_value < ALPHA,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_groups() {
        let r = welch_t_test(&[1.0, 0.0, 1.0], &[1.0, 0.0, 1.0]).unwrap();
        assert!(r.statistic.abs() < 1e-12);
        assert!((r.p_value - 1.0).abs() < 1e-9);
        assert!(!r.significant);
    }

    #[test]
    fn test_constant_identical_groups() {
        let r = welch_t_test(&[1.0, 1.0, 1.0], &[1.0, 1.0]).unwrap();
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.p_value, 1.0);
    }

    #[test]
    fn test_constant_different_groups() {
        let r = welch_t_test(&[1.0, 1.0], &[0.0, 0.0, 0.0]).unwrap();
        assert!(r.statistic.is_infinite() && r.statistic > 0.0);
        assert_eq!(r.p_value, 0.0);
        assert!(r.significant);
    }

    #[test]
    fn test_known_values() {
        // Reference: scipy.stats.ttest_ind(a, b, equal_var=False)
        let r = welch_t_test(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0, 10.0]).unwrap();
        assert!((r.statistic - -2.251_436).abs() < 1e-4);
        assert!((r.df - 5.520_788).abs() < 1e-4);
        assert!((r.p_value - 0.069_134).abs() < 1e-4);
        assert!(!r.significant);
    }

    #[test]
    fn test_binary_outcomes() {
        let r = welch_t_test(&[1.0, 0.0, 1.0, 1.0, 0.0], &[0.0, 0.0, 1.0, 0.0, 0.0]).unwrap();
        assert!((r.statistic - 1.264_911).abs() < 1e-4);
        assert!((r.p_value - 0.242_876).abs() < 1e-3);
    }

    #[test]
    fn test_insufficient_data() {
        assert!(matches!(
            welch_t_test(&[1.0], &[0.0, 1.0]),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn test_mean_and_variance() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
        assert_eq!(sample_variance(&[1.0]), None);
        assert_eq!(sample_variance(&[2.0, 4.0]), Some(2.0));
    }
}
