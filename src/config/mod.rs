//! 配置管理模块
//!
//! 提供 YAML 配置文件支持，所有字段都有默认值

mod path_utils;
mod types;
mod yaml;

pub use path_utils::expand_tilde;
pub use types::{AppConfig, LoggingConfig, ServerConfig, StorageConfig};
pub use yaml::{default_config_path, load_config, save_config, ConfigError};
