#![allow(dead_code)]

use std::path::PathBuf;

/// Data rows (excluding the header) in `energy_small.csv`.
pub const FIXTURE_ROWS: usize = 72;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Three days of hourly readings in the appliances-energy layout.
///
/// `rv2` duplicates `rv1` exactly and `T2` tracks `T1` closely.
pub fn fixture_path() -> PathBuf {
    fixtures_dir().join("energy_small.csv")
}
