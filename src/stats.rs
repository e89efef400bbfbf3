//! Sparse row aggregation.
//!
//! Row summaries divide by the **full** input length, not by the count of
//! valid entries: a missing column contributes nothing to the sum but still
//! widens the denominator, so sparse rows average lower than dense ones.
//! `[Some(0.4), None]` averages to 0.2, not 0.4. That penalty is the
//! long-standing dashboard behavior and is pinned by tests; do not "fix" it
//! here without a product decision.

/// NaN-tolerant mean over the full input length.
///
/// NaN entries are excluded from the sum but counted in the denominator.
/// Empty input yields NaN ("nothing to average"), which the renderer shows
/// as a placeholder.
///
/// # Example
/// ```rust
/// let mean = trellis::stats::average(&[f64::NAN, 2.0, 4.0]);
/// assert_eq!(mean, 2.0); // (2 + 4) / 3
/// ```
#[must_use]
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = values.iter().filter(|v| !v.is_nan()).sum();
    sum / values.len() as f64
}

/// [`average`] over optional cells: `None` counts toward the denominator
/// and contributes nothing to the sum, exactly like NaN.
#[must_use]
pub fn average_defined(values: &[Option<f64>]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = values.iter().flatten().filter(|v| !v.is_nan()).sum();
    sum / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_nan() {
        assert!(average(&[]).is_nan());
        assert!(average_defined(&[]).is_nan());
    }

    #[test]
    fn single_value_is_itself() {
        assert_eq!(average(&[5.0]), 5.0);
    }

    #[test]
    fn nan_entries_widen_the_denominator() {
        assert_eq!(average(&[f64::NAN, 2.0, 4.0]), (2.0 + 4.0) / 3.0);
    }

    #[test]
    fn all_nan_averages_to_zero() {
        // Consequence of the full-length rule: empty sum over three slots.
        assert_eq!(average(&[f64::NAN, f64::NAN, f64::NAN]), 0.0);
    }

    #[test]
    fn missing_cells_penalize_the_mean() {
        assert_eq!(average_defined(&[Some(0.4), None]), 0.2);
        assert_eq!(average_defined(&[Some(0.8), Some(0.6)]), 0.7);
    }
}
