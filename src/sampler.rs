//! Target-rate generation and nearest-point curve sampling.
//!
//! Curve views ("precision at recall", "recall at precision") read a stored
//! precision-recall curve at a series of fixed target rates. This module
//! produces those rates and resolves each one to the nearest stored
//! operating point.
//!
//! # Example
//!
//! ```rust
//! use trellis::sampler::{closest_point, CurveAxis, CurveSampler};
//! use trellis::schema::CurvePoint;
//!
//! let sampler = CurveSampler::default();
//! assert_eq!(sampler.target_rates(0.8, 0.95), vec![0.8, 0.85, 0.9, 0.95]);
//!
//! let curve = vec![
//!     CurvePoint::new(0.7, 0.9, 0.5),
//!     CurvePoint::new(0.85, 0.6, 0.3),
//! ];
//! let point = closest_point(0.8, &curve, CurveAxis::Recall);
//! assert_eq!(point.y, Some(0.6));
//! ```

use crate::schema::CurvePoint;

// =============================================================================
// Curve Axes
// =============================================================================

/// Which curve coordinate a target rate is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveAxis {
    /// The `x` (recall) coordinate.
    Recall,
    /// The `y` (precision) coordinate.
    Precision,
}

impl CurveAxis {
    /// This axis's coordinate of a point.
    #[must_use]
    pub fn coordinate(&self, point: &CurvePoint) -> Option<f64> {
        match self {
            CurveAxis::Recall => point.x,
            CurveAxis::Precision => point.y,
        }
    }

    /// The other metric axis, read out after sampling along this one.
    #[must_use]
    pub fn complement(&self) -> CurveAxis {
        match self {
            CurveAxis::Recall => CurveAxis::Precision,
            CurveAxis::Precision => CurveAxis::Recall,
        }
    }
}

// =============================================================================
// Target-Rate Generation
// =============================================================================

/// Default spacing between target rates (five centiles).
pub const DEFAULT_RATE_STEP: f64 = 0.05;

/// Generates evenly spaced target rates over a requested range.
#[derive(Debug, Clone, Copy)]
pub struct CurveSampler {
    /// Spacing between consecutive target rates.
    pub step: f64,
}

impl Default for CurveSampler {
    fn default() -> Self {
        Self {
            step: DEFAULT_RATE_STEP,
        }
    }
}

impl CurveSampler {
    /// Sampler with a custom step. Non-positive steps fall back to the
    /// default rather than looping forever.
    #[must_use]
    pub fn new(step: f64) -> Self {
        if step > 0.0 {
            Self { step }
        } else {
            Self::default()
        }
    }

    /// Inclusive target rates from `min` to `max`.
    ///
    /// Bounds and step are rounded to whole centiles and the walk runs in
    /// integer space, so every emitted rate is an exact two-decimal value.
    /// `0.85` never comes back as `0.8500000000000001`, and the rates
    /// compare equal across repeated builds. Returns an empty list when
    /// `min > max`.
    #[must_use]
    pub fn target_rates(&self, min: f64, max: f64) -> Vec<f64> {
        let stride = ((self.step * 100.0).round() as i64).max(1);
        let start = (min * 100.0).round() as i64;
        let stop = (max * 100.0).round() as i64;

        let mut rates = Vec::new();
        let mut cur = start;
        while cur <= stop {
            rates.push(cur as f64 / 100.0);
            cur += stride;
        }
        rates
    }
}

// =============================================================================
// Nearest-Point Lookup
// =============================================================================

/// Degenerate stand-in for an empty curve: the sampled coordinate pinned to
/// 1.0, everything else absent. A "no data" marker for the renderer, not a
/// measurement.
#[must_use]
pub fn fallback_point(axis: CurveAxis) -> CurvePoint {
    match axis {
        CurveAxis::Recall => CurvePoint {
            x: Some(1.0),
            ..Default::default()
        },
        CurveAxis::Precision => CurvePoint {
            y: Some(1.0),
            ..Default::default()
        },
    }
}

/// The stored point whose `axis` coordinate is nearest to `target`.
///
/// Linear scan over the curve; on equal distance the earlier point wins.
/// Points missing the axis coordinate (or carrying NaN) never beat a usable
/// one. An empty curve yields [`fallback_point`].
#[must_use]
pub fn closest_point(target: f64, points: &[CurvePoint], axis: CurveAxis) -> CurvePoint {
    let mut best: Option<(f64, &CurvePoint)> = None;
    for point in points {
        let dist = axis
            .coordinate(point)
            .map(|c| (c - target).abs())
            .filter(|d| !d.is_nan())
            .unwrap_or(f64::INFINITY);
        best = match best {
            Some((best_dist, kept)) if best_dist <= dist => Some((best_dist, kept)),
            _ => Some((dist, point)),
        };
    }
    match best {
        Some((_, point)) => *point,
        None => fallback_point(axis),
    }
}

// =============================================================================
// Tests
// =============================================================================
