// 1. Traits
pub use crate::polars_ext::DataFrameExt;

// 2. Pipeline
pub use crate::config::PipelineConfig;
pub use crate::pipeline::{FeaturePipeline, FeatureSet, build_features};

// 3. Stages
pub use crate::collinearity::{
    DEFAULT_VIF_THRESHOLD, Reduction, ReductionStep, VifOptions, VifReport, VifScore,
    reduce_collinearity, vif_scores,
};
pub use crate::features::{
    DerivedCol, EnergyCol, FeatureTable,
    lag::{add_lag_features, lag_column_name},
    loader::{load_csv, load_frame},
    missing::drop_unresolved,
    selector::select_columns,
    time::{add_time_features, cyclical_hour},
};

// 4. Serving Contract
pub use crate::contract::{CONTRACT_VERSION, FeatureContract};
pub use crate::inference::InferenceFeatures;
pub use crate::metrics::{EnergyEstimate, Tariff};
pub use crate::split::{DEFAULT_TRAIN_FRACTION, time_based_split};

// 5. Errors
pub use crate::error::{
    ConfigError, DataFormatError, FeatureMismatchError, IoError, SchemaError, WattcastError,
    WattcastResult,
};
