use std::{collections::HashMap, fs, path::Path};

use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{FeatureMismatchError, IoError, WattcastResult},
    polars_ext::{DataFrameExt, polars_err},
};

/// Schema version of the serialized contract.
pub const CONTRACT_VERSION: u32 = 1;

/// The ordered feature-name list a trained model is bound to.
///
/// Immutable once built. Any feature vector handed to the model must carry
/// exactly these names in exactly this order; the helpers here enforce that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContract {
    version: u32,
    names: Vec<String>,
    fingerprint: String,
    created_at: DateTime<Utc>,
}

impl FeatureContract {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            version: CONTRACT_VERSION,
            fingerprint: fingerprint(&names),
            names,
            created_at: Utc::now(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// blake3 hex digest over the version and the ordered names.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> WattcastResult<()> {
        let raw = serde_json::to_string_pretty(self).map_err(IoError::Json)?;
        fs::write(path.as_ref(), raw).map_err(IoError::Io)?;
        debug!(path = %path.as_ref().display(), features = self.len(), "Saved feature contract");
        Ok(())
    }

    /// Reads a contract and checks its version and fingerprint.
    pub fn load_json(path: impl AsRef<Path>) -> WattcastResult<Self> {
        let raw = fs::read_to_string(path.as_ref()).map_err(IoError::Io)?;
        let contract: Self = serde_json::from_str(&raw).map_err(IoError::Json)?;

        if contract.version != CONTRACT_VERSION {
            return Err(FeatureMismatchError::UnsupportedVersion {
                expected: CONTRACT_VERSION,
                found: contract.version,
            }
            .into());
        }

        let computed = fingerprint(&contract.names);
        if computed != contract.fingerprint {
            return Err(FeatureMismatchError::FingerprintMismatch {
                expected: contract.fingerprint,
                found: computed,
            }
            .into());
        }

        Ok(contract)
    }

    /// Fails unless `names` equals the contract, position by position.
    pub fn validate_names<S: AsRef<str>>(&self, names: &[S]) -> WattcastResult<()> {
        if names.len() != self.names.len() {
            return Err(FeatureMismatchError::LengthMismatch {
                expected: self.names.len(),
                found: names.len(),
            }
            .into());
        }

        for (position, (expected, found)) in self.names.iter().zip(names).enumerate() {
            let found = found.as_ref();
            if expected == found {
                continue;
            }
            if !self.contains(found) {
                return Err(FeatureMismatchError::UnexpectedFeature(found.to_string()).into());
            }
            return Err(FeatureMismatchError::OrderMismatch {
                position,
                expected: expected.clone(),
                found: found.to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Builds a single feature vector in contract order from named values.
    ///
    /// Every contract name needs a finite value and no other names are allowed.
    pub fn assemble(&self, values: &HashMap<String, f64>) -> WattcastResult<Vec<f64>> {
        let mut unexpected: Vec<&String> = values.keys().filter(|k| !self.contains(k)).collect();
        unexpected.sort();
        if let Some(name) = unexpected.first() {
            return Err(FeatureMismatchError::UnexpectedFeature(name.to_string()).into());
        }

        self.names
            .iter()
            .map(|name| {
                let value = *values
                    .get(name)
                    .ok_or_else(|| FeatureMismatchError::MissingValue(name.clone()))?;
                if !value.is_finite() {
                    return Err(FeatureMismatchError::NonFiniteValue {
                        name: name.clone(),
                        value,
                    }
                    .into());
                }
                Ok(value)
            })
            .collect()
    }

    /// Reorders the columns of `df` into contract order.
    ///
    /// The frame must hold exactly the contract's columns, in any order.
    pub fn ordered_frame(&self, df: &DataFrame) -> WattcastResult<DataFrame> {
        let columns = df.column_names();
        if let Some(extra) = columns.iter().find(|c| !self.contains(c)) {
            return Err(FeatureMismatchError::UnexpectedFeature(extra.clone()).into());
        }
        if let Some(missing) = self.names.iter().find(|n| !columns.contains(*n)) {
            return Err(FeatureMismatchError::MissingValue(missing.clone()).into());
        }

        df.select(self.names.iter().map(String::as_str))
            .map_err(|e| polars_err("ordering features by contract", e))
    }
}

fn fingerprint(names: &[String]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&CONTRACT_VERSION.to_le_bytes());
    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    format!("{}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WattcastError;
    use polars::prelude::df;
    use tempfile::NamedTempFile;

    fn contract() -> FeatureContract {
        FeatureContract::new(vec![
            "RH_6".to_string(),
            "Windspeed".to_string(),
            "hour".to_string(),
            "hour_sin".to_string(),
            "hour_cos".to_string(),
        ])
    }

    #[test]
    fn fingerprint_depends_on_order() {
        let a = FeatureContract::new(vec!["x".into(), "y".into()]);
        let b = FeatureContract::new(vec!["y".into(), "x".into()]);
        let c = FeatureContract::new(vec!["x".into(), "y".into()]);

        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn json_round_trip_preserves_contract() {
        let file = NamedTempFile::new().expect("Failed to create temp file");
        let original = contract();

        original.save_json(file.path()).expect("Save failed");
        let loaded = FeatureContract::load_json(file.path()).expect("Load failed");

        assert_eq!(loaded, original);
    }

    #[test]
    fn tampered_names_fail_fingerprint_check() {
        let file = NamedTempFile::new().expect("Failed to create temp file");
        contract().save_json(file.path()).expect("Save failed");

        let raw = fs::read_to_string(file.path()).expect("Read failed");
        fs::write(file.path(), raw.replace("Windspeed", "Visibility")).expect("Write failed");

        assert!(matches!(
            FeatureContract::load_json(file.path()),
            Err(WattcastError::FeatureMismatch(
                FeatureMismatchError::FingerprintMismatch { .. }
            ))
        ));
    }

    #[test]
    fn validate_names_rejects_reordering() {
        let c = contract();

        assert!(c.validate_names(c.names()).is_ok());
        assert!(matches!(
            c.validate_names(&["RH_6", "hour", "Windspeed", "hour_sin", "hour_cos"]),
            Err(WattcastError::FeatureMismatch(FeatureMismatchError::OrderMismatch {
                position: 1,
                ..
            }))
        ));
        assert!(matches!(
            c.validate_names(&["RH_6", "Windspeed"]),
            Err(WattcastError::FeatureMismatch(FeatureMismatchError::LengthMismatch {
                expected: 5,
                found: 2
            }))
        ));
        assert!(matches!(
            c.validate_names(&["RH_6", "Windspeed", "hour", "hour_sin", "T_out"]),
            Err(WattcastError::FeatureMismatch(FeatureMismatchError::UnexpectedFeature(_)))
        ));
    }

    #[test]
    fn assemble_orders_values_and_rejects_gaps() {
        let c = contract();
        let mut values: HashMap<String, f64> = [
            ("hour_cos", 1.0),
            ("hour", 0.0),
            ("Windspeed", 4.5),
            ("RH_6", 84.2),
            ("hour_sin", 0.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let vector = c.assemble(&values).expect("Assemble failed");
        assert_eq!(vector, vec![84.2, 4.5, 0.0, 0.0, 1.0]);

        values.insert("T_out".to_string(), 5.0);
        assert!(matches!(
            c.assemble(&values),
            Err(WattcastError::FeatureMismatch(FeatureMismatchError::UnexpectedFeature(n))) if n == "T_out"
        ));

        values.remove("T_out");
        values.remove("hour");
        assert!(matches!(
            c.assemble(&values),
            Err(WattcastError::FeatureMismatch(FeatureMismatchError::MissingValue(n))) if n == "hour"
        ));

        values.insert("hour".to_string(), f64::NAN);
        assert!(matches!(
            c.assemble(&values),
            Err(WattcastError::FeatureMismatch(FeatureMismatchError::NonFiniteValue { .. }))
        ));
    }

    #[test]
    fn ordered_frame_reorders_columns() {
        let c = FeatureContract::new(vec!["a".into(), "b".into()]);
        let df = df!["b" => &[2.0], "a" => &[1.0]].expect("Failed to build frame");

        let ordered = c.ordered_frame(&df).expect("Ordering failed");
        assert_eq!(ordered.column_names(), vec!["a", "b"]);

        let extra = df!["a" => &[1.0], "b" => &[2.0], "c" => &[3.0]].expect("Failed to build frame");
        assert!(matches!(
            c.ordered_frame(&extra),
            Err(WattcastError::FeatureMismatch(FeatureMismatchError::UnexpectedFeature(_)))
        ));
    }
}
