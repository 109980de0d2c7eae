use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    collinearity::{VifOptions, vif::DesignMatrix},
    error::{DataFormatError, WattcastResult},
    polars_ext::polars_err,
};

/// One pass of the reducer: the scores of `feature_count` features were
/// computed, and the worst one was dropped if it exceeded the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionStep {
    pub iteration: usize,
    pub feature_count: usize,
    pub max_feature: String,
    pub max_vif: f64,
    pub removed: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Reduction {
    features: DataFrame,
    removed: Vec<String>,
    steps: Vec<ReductionStep>,
}

impl Reduction {
    pub fn features(&self) -> &DataFrame {
        &self.features
    }

    /// Removed feature names, in removal order.
    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    pub fn steps(&self) -> &[ReductionStep] {
        &self.steps
    }

    pub fn into_parts(self) -> (DataFrame, Vec<String>, Vec<ReductionStep>) {
        (self.features, self.removed, self.steps)
    }
}

/// Active feature indices for one iteration. Each iteration scores a fresh
/// snapshot; removal produces the next one instead of mutating in place.
#[derive(Debug, Clone)]
struct Snapshot {
    active: Vec<usize>,
}

impl Snapshot {
    fn full(width: usize) -> Self {
        Self {
            active: (0..width).collect(),
        }
    }

    fn without(&self, position: usize) -> Self {
        let mut active = self.active.clone();
        active.remove(position);
        Self { active }
    }

    fn len(&self) -> usize {
        self.active.len()
    }
}

/// Repeatedly drops the feature with the highest VIF until every remaining
/// feature scores at or below the threshold.
///
/// Ties go to the feature that comes first in the current column order. A
/// lone feature scores 1 and is never removed, so at least one column
/// survives a non-empty input. Surviving columns keep their relative order.
#[tracing::instrument(
    name = "VIF reduction",
    skip_all,
    fields(features = features.width(), rows = features.height(), threshold = options.threshold())
)]
pub fn reduce_collinearity(features: &DataFrame, options: VifOptions) -> WattcastResult<Reduction> {
    options.validate()?;

    if features.width() == 0 {
        return Ok(Reduction {
            features: features.clone(),
            removed: Vec::new(),
            steps: Vec::new(),
        });
    }
    if features.width() > 1 && features.height() == 0 {
        return Err(DataFormatError::InsufficientRows {
            rows: 0,
            required: 1,
        }
        .into());
    }

    let design = DesignMatrix::from_frame(features, options.fit_intercept())?;
    let mut snapshot = Snapshot::full(design.width());
    let mut removed = Vec::new();
    let mut steps = Vec::new();

    for iteration in 1.. {
        let scores = design.scores(&snapshot.active);
        let (position, max_vif) = first_max(&scores);
        let max_feature = design.names()[snapshot.active[position]].clone();

        debug!(
            iteration,
            features = snapshot.len(),
            max_vif,
            feature = %max_feature,
            "Scored features"
        );

        if max_vif <= options.threshold() || snapshot.len() == 1 {
            steps.push(ReductionStep {
                iteration,
                feature_count: snapshot.len(),
                max_feature,
                max_vif,
                removed: None,
            });
            break;
        }

        info!(feature = %max_feature, vif = max_vif, "Removing collinear feature");
        removed.push(max_feature.clone());
        steps.push(ReductionStep {
            iteration,
            feature_count: snapshot.len(),
            max_feature: max_feature.clone(),
            max_vif,
            removed: Some(max_feature),
        });
        snapshot = snapshot.without(position);
    }

    let kept: Vec<&str> = snapshot
        .active
        .iter()
        .map(|&i| design.names()[i].as_str())
        .collect();
    let features = features
        .select(kept)
        .map_err(|e| polars_err("selecting surviving features", e))?;

    info!(
        kept = features.width(),
        removed = removed.len(),
        "VIF reduction complete"
    );

    Ok(Reduction {
        features,
        removed,
        steps,
    })
}

/// Position and value of the largest score; the earliest wins a tie.
fn first_max(scores: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (position, &score) in scores.iter().enumerate() {
        if score > best.1 {
            best = (position, score);
        }
    }
    best
}
