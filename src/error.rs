use thiserror::Error;

pub type WattcastResult<T> = Result<T, WattcastError>;

#[derive(Debug, Error)]
pub enum WattcastError {
    #[error(transparent)]
    DataFormat(#[from] DataFormatError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    FeatureMismatch(#[from] FeatureMismatchError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while reading or interpreting raw sensor data.
#[derive(Debug, Error)]
pub enum DataFormatError {
    #[error("Timestamp column '{0}' not found in input")]
    MissingTimestamp(String),

    #[error("Timestamp column '{column}' could not be parsed with format '{format}': {msg}")]
    UnparseableTimestamp {
        column: String,
        format: String,
        msg: String,
    },

    #[error("Timestamp column '{column}' has unsupported dtype {dtype}")]
    UnsupportedTimestampType { column: String, dtype: String },

    #[error("Timestamp column '{column}' contains {count} empty value(s)")]
    NullTimestamp { column: String, count: usize },

    #[error("Column '{column}' contains a non-finite value at row {row}")]
    NonFiniteValue { column: String, row: usize },

    #[error("Column '{column}' contains an unresolved value at row {row}")]
    UnresolvedValue { column: String, row: usize },

    #[error("Column '{column}' is not numeric (found {dtype})")]
    NonNumericColumn { column: String, dtype: String },

    #[error("Feature matrix has {rows} row(s); at least {required} required")]
    InsufficientRows { rows: usize, required: usize },

    #[error("Failed to read input: {0}")]
    Read(String),

    #[error("Data frame error: {0}")]
    DataFrame(String),
}

/// Errors raised when the table lacks a column the pipeline requires.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Target column '{0}' not found in dataset")]
    MissingTarget(String),

    #[error("Target column '{column}' is not numeric (found {dtype})")]
    NonNumericTarget { column: String, dtype: String },

    #[error("Column '{0}' not found")]
    MissingColumn(String),
}

/// Errors raised when a feature vector does not honour the published feature contract.
#[derive(Debug, Error)]
pub enum FeatureMismatchError {
    #[error("Expected {expected} feature(s), found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Feature order mismatch at position {position}: expected '{expected}', found '{found}'")]
    OrderMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Feature '{0}' is not part of the contract")]
    UnexpectedFeature(String),

    #[error("Missing value for feature '{0}'")]
    MissingValue(String),

    #[error("Feature '{name}' has a non-finite value: {value}")]
    NonFiniteValue { name: String, value: f64 },

    #[error("Contract fingerprint mismatch: stored {expected}, computed {found}")]
    FingerprintMismatch { expected: String, found: String },

    #[error("Unsupported contract version {found} (expected {expected})")]
    UnsupportedVersion { expected: u32, found: u32 },
}

/// Errors related to file I/O and serialization.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO operation failed")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write data: {0}")]
    WriteFailed(String),
}

/// Errors related to invalid pipeline or tariff configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid VIF threshold {0}: must be finite and >= 1")]
    InvalidThreshold(f64),

    #[error("Invalid lag period {0}: must be >= 1")]
    InvalidLagPeriod(u32),

    #[error("Column '{0}' cannot be lagged: it is the prediction target")]
    TargetLag(String),

    #[error("Column '{0}' cannot be lagged: it is the timestamp column")]
    TimestampLag(String),

    #[error("Invalid train fraction {0}: must lie strictly between 0 and 1")]
    InvalidTrainFraction(f64),

    #[error("Invalid tariff: {0}")]
    InvalidTariff(String),
}
