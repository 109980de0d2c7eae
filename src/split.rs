use tracing::debug;

use crate::{
    error::{ConfigError, WattcastResult},
    pipeline::FeatureSet,
};

/// Share of rows used for training when nothing else is configured.
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

/// Splits a feature set chronologically: the first `floor(rows * train_fraction)`
/// rows train, the rest evaluate. Rows are never shuffled, so no later reading
/// can leak into the training half.
pub fn time_based_split(
    set: &FeatureSet,
    train_fraction: f64,
) -> WattcastResult<(FeatureSet, FeatureSet)> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(ConfigError::InvalidTrainFraction(train_fraction).into());
    }

    let rows = set.height();
    let cut = (rows as f64 * train_fraction).floor() as usize;
    debug!(rows, train = cut, test = rows - cut, "Time-based split");

    Ok((set.slice(0, cut), set.slice(cut, rows - cut)))
}
