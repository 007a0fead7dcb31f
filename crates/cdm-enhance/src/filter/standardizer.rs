//! Standardization to zero mean and unit standard deviation.

use cdm_common::{names, Array, AttributeContainer};
use tracing::debug;

/// `(v - mean) / std_dev` with statistics fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardizer {
    mean: f64,
    std_dev: f64,
}

impl Standardizer {
    /// Whether the `standardize` attribute asks for standardization.
    pub fn is_requested(attributes: &AttributeContainer) -> bool {
        attributes.find_bool(names::STANDARDIZE).unwrap_or(false)
    }

    /// Compute statistics over the finite values of `data`.
    ///
    /// Returns `None` when no value is finite. A zero or non-finite standard
    /// deviation leaves values unscaled.
    pub fn from_values(data: &Array) -> Option<Self> {
        let (count, sum) = data
            .iter_f64()
            .filter(|v| v.is_finite())
            .fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + v));
        if count == 0 {
            debug!("no finite values, standardizer disabled");
            return None;
        }
        let mean = sum / count as f64;

        let variance = data
            .iter_f64()
            .filter(|v| v.is_finite())
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / count as f64;
        let std_dev = variance.sqrt();
        let std_dev = if std_dev.is_finite() && std_dev != 0.0 {
            std_dev
        } else {
            1.0
        };

        debug!(mean, std_dev, count, "standardizer enabled");
        Some(Self { mean, std_dev })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn apply_scalar(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }

    /// Standardize an array, keeping its element type.
    pub fn convert(&self, data: Array) -> Array {
        if !data.data_type().is_floating_point() {
            return data;
        }
        match data.map_f64(data.data_type(), |v| self.apply_scalar(v)) {
            Some(standardized) => standardized,
            None => data,
        }
    }
}
