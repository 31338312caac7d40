//! Core configuration and utilities for yinpin

mod config;
mod logging;

pub use config::{
    get_config_home, Config, LossyRewriteConfig, RenameConfig, CURRENT_CONFIG_VERSION,
    SUPPORTED_CONFIG_VERSIONS,
};
pub use logging::{init_logging, LOG_ENV, LOG_FILE_NAME};
