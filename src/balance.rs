//! Balance scoring
//!
//! Reduces per-activity minute totals into a 0-100 score describing how evenly
//! time was spread. 100 is a perfectly even split, 0 is all time in a single
//! activity (or nothing but explicit zeros).

use crate::error::ComputeError;
use crate::types::{BalanceInput, BalanceScore};

/// Stateless balance calculator
pub struct BalanceScorer;

impl BalanceScorer {
    /// Score how evenly minutes are spread across the input's dimensions.
    ///
    /// Returns `NoData` when every dimension is absent. Absent dimensions are
    /// otherwise counted as zero minutes.
    ///
    /// # Errors
    /// * `EmptyDimensions` if the input has no dimensions
    /// * `OutOfDomain` for negative or non-finite minute values
    pub fn calculate_balance_score(input: &BalanceInput) -> Result<BalanceScore, ComputeError> {
        if input.is_empty() {
            return Err(ComputeError::EmptyDimensions);
        }

        for dim in &input.dimensions {
            if let Some(minutes) = dim.minutes {
                if !minutes.is_finite() || minutes < 0.0 {
                    return Err(ComputeError::OutOfDomain(format!(
                        "activity '{}' has invalid minute value {}",
                        dim.name, minutes
                    )));
                }
            }
        }

        if input.all_absent() {
            return Ok(BalanceScore::NoData);
        }

        let values: Vec<f64> = input
            .dimensions
            .iter()
            .map(|d| d.minutes.unwrap_or(0.0))
            .collect();

        Ok(BalanceScore::Score(score_values(&values)))
    }
}

/// Variance-to-ideal score over non-negative values with at least one element
fn score_values(values: &[f64]) -> f64 {
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        return 0.0;
    }

    let n = values.len() as f64;
    let ideal = 1.0 / n;

    let variance: f64 = values
        .iter()
        .map(|v| {
            let diff = v / total - ideal;
            diff * diff
        })
        .sum();

    // All time in one dimension
    let max_variance = (1.0 - ideal).powi(2) + (n - 1.0) * ideal.powi(2);

    // Single dimension: the only possible split is the ideal one
    if max_variance == 0.0 {
        return 100.0;
    }

    (100.0 * (1.0 - variance / max_variance)).clamp(0.0, 100.0)
}
