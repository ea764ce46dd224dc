//! Config loading: `tombo.toml` plus `TOMBO_*` env overrides.

mod load;
mod schema;

pub use load::{apply_env_overrides, config_path, load, load_from};
pub use schema::{
    ActivityConfig, AllocationConfig, Config, LogFormat, LoggingConfig, ReadRetryConfig,
};
