use ndarray::{Array2, Axis};
use polars::prelude::DataFrame;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    collinearity::VifOptions,
    error::{DataFormatError, WattcastResult},
    polars_ext::DataFrameExt,
};

/// Residual share at or below which a regression counts as a perfect fit (VIF = ∞).
const PERFECT_FIT_TOLERANCE: f64 = 1e-12;

/// Relative remainder below which a regressor adds no new direction and is skipped.
const RANK_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VifScore {
    pub feature: String,
    pub vif: f64,
}

/// Gram matrix `XᵀX` of a numeric feature frame.
///
/// Dropping a feature does not change the inner products of the others, so
/// one Gram matrix serves every iteration of the reducer; an iteration only
/// chooses which indices are active.
///
/// # Precision
///
/// Regressions are solved through the normal equations, which square the
/// condition number of the raw columns. Scores therefore resolve up to about
/// `1 / PERFECT_FIT_TOLERANCE` (1e12): any larger VIF saturates to
/// `f64::INFINITY`, and saturated features tie, so the reducer removes the
/// first of them in column order. Badly conditioned uncentred data can make
/// that order differ from an SVD-based solve; `fit_intercept` usually helps.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    names: Vec<String>,
    rows: usize,
    gram: Array2<f64>,
}

impl DesignMatrix {
    pub fn from_frame(df: &DataFrame, fit_intercept: bool) -> WattcastResult<Self> {
        let names = df.column_names();
        let rows = df.height();
        let mut data = Array2::<f64>::zeros((rows, names.len()));

        for (j, name) in names.iter().enumerate() {
            let values = df.float_values(name)?;
            for (i, value) in values.into_iter().enumerate() {
                if !value.is_finite() {
                    return Err(DataFormatError::NonFiniteValue {
                        column: name.clone(),
                        row: i,
                    }
                    .into());
                }
                data[[i, j]] = value;
            }
        }

        if fit_intercept {
            for mut column in data.axis_iter_mut(Axis(1)) {
                let mean = column.mean().unwrap_or(0.0);
                column.mapv_inplace(|v| v - mean);
            }
        }

        let width = names.len();
        let mut gram = Array2::<f64>::zeros((width, width));
        for i in 0..width {
            for j in i..width {
                let product = data.column(i).dot(&data.column(j));
                gram[[i, j]] = product;
                gram[[j, i]] = product;
            }
        }

        Ok(Self { names, rows, gram })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// VIF of `target` regressed on `regressors`.
    ///
    /// With no regressors the score is exactly 1. A regression whose residual
    /// vanishes, including an all-zero target, scores `f64::INFINITY`.
    pub fn vif(&self, target: usize, regressors: &[usize]) -> f64 {
        if regressors.is_empty() {
            return 1.0;
        }

        let total = self.gram[[target, target]];
        if total <= 0.0 {
            return f64::INFINITY;
        }

        let residual = self.residual_sum_of_squares(target, regressors);
        if residual <= PERFECT_FIT_TOLERANCE * total {
            f64::INFINITY
        } else {
            total / residual
        }
    }

    /// Scores every index in `active`, each regressed on the remaining active indices.
    ///
    /// Scores are computed in parallel; the result follows the order of `active`.
    pub fn scores(&self, active: &[usize]) -> Vec<f64> {
        active
            .par_iter()
            .enumerate()
            .map(|(position, &target)| {
                let regressors: Vec<usize> = active
                    .iter()
                    .enumerate()
                    .filter(|(p, _)| *p != position)
                    .map(|(_, &index)| index)
                    .collect();
                self.vif(target, &regressors)
            })
            .collect()
    }

    /// Residual sum of squares of the least-squares fit, via an incremental
    /// Cholesky factorisation of the regressors' Gram sub-matrix.
    ///
    /// Regressors that are linear combinations of earlier ones are skipped,
    /// which yields the same projection as a pseudo-inverse solve.
    fn residual_sum_of_squares(&self, target: usize, regressors: &[usize]) -> f64 {
        let mut basis: Vec<usize> = Vec::with_capacity(regressors.len());
        let mut factor: Vec<Vec<f64>> = Vec::with_capacity(regressors.len());

        for &candidate in regressors {
            let (mut row, remainder) = self.project(candidate, &basis, &factor);
            if remainder <= RANK_TOLERANCE * self.gram[[candidate, candidate]] {
                continue;
            }
            row.push(remainder.sqrt());
            basis.push(candidate);
            factor.push(row);
        }

        let (_, remainder) = self.project(target, &basis, &factor);
        remainder.max(0.0)
    }

    /// Cholesky row of `candidate` against the current basis, plus what remains
    /// of its squared norm after projection.
    fn project(&self, candidate: usize, basis: &[usize], factor: &[Vec<f64>]) -> (Vec<f64>, f64) {
        let mut row = Vec::with_capacity(basis.len() + 1);
        for (a, &member) in basis.iter().enumerate() {
            let partial: f64 = (0..a).map(|c| row[c] * factor[a][c]).sum();
            row.push((self.gram[[candidate, member]] - partial) / factor[a][a]);
        }
        let projected: f64 = row.iter().map(|v| v * v).sum();
        (row, self.gram[[candidate, candidate]] - projected)
    }
}

/// VIF of every column of `df`, in column order.
pub fn vif_scores(df: &DataFrame, options: &VifOptions) -> WattcastResult<Vec<VifScore>> {
    let design = DesignMatrix::from_frame(df, options.fit_intercept())?;
    let active: Vec<usize> = (0..design.width()).collect();

    Ok(design
        .scores(&active)
        .into_iter()
        .zip(design.names())
        .map(|(vif, feature)| VifScore {
            feature: feature.clone(),
            vif,
        })
        .collect())
}

/// Diagnostic table of VIF scores, most collinear first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VifReport {
    scores: Vec<VifScore>,
}

impl VifReport {
    pub fn compute(df: &DataFrame, options: &VifOptions) -> WattcastResult<Self> {
        Ok(Self::from_scores(vif_scores(df, options)?))
    }

    /// Sorts by descending score. Ties keep their column order.
    pub fn from_scores(mut scores: Vec<VifScore>) -> Self {
        scores.sort_by(|a, b| b.vif.total_cmp(&a.vif));
        Self { scores }
    }

    pub fn scores(&self) -> &[VifScore] {
        &self.scores
    }

    pub fn max(&self) -> Option<&VifScore> {
        self.scores.first()
    }

    pub fn exceeding(&self, threshold: f64) -> impl Iterator<Item = &VifScore> {
        self.scores.iter().take_while(move |s| s.vif > threshold)
    }
}
