//! Variance inflation factor (VIF) scoring and iterative removal of collinear features.
//!
//! A feature's VIF is `1 / (1 - R²)` of the least-squares regression of that
//! feature on every other current feature. By default the regression runs on
//! the raw design matrix without an intercept, so R² is the uncentred
//! coefficient of determination; [`VifOptions::with_fit_intercept`] centres
//! every column first, which is equivalent to adding a constant regressor.

mod reducer;
mod vif;

pub use reducer::{Reduction, ReductionStep, reduce_collinearity};
pub use vif::{DesignMatrix, VifReport, VifScore, vif_scores};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, WattcastResult};

/// Conventional VIF cut-off above which a feature is considered redundant.
pub const DEFAULT_VIF_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VifOptions {
    threshold: f64,
    fit_intercept: bool,
}

impl Default for VifOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_VIF_THRESHOLD,
            fit_intercept: false,
        }
    }
}

impl VifOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
    }

    /// A VIF is never below 1, so thresholds below 1 are meaningless.
    pub fn validate(&self) -> WattcastResult<()> {
        if !self.threshold.is_finite() || self.threshold < 1.0 {
            return Err(ConfigError::InvalidThreshold(self.threshold).into());
        }
        Ok(())
    }
}
