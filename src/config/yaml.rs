//! YAML 配置文件读写

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::AppConfig;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("解析配置文件失败: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// 默认配置文件路径：`<config_dir>/ocrchat/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ocrchat").join("config.yaml"))
}

/// 加载配置，文件不存在时使用默认配置
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("[Config] 配置文件不存在，使用默认配置: {:?}", path);
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config = serde_yaml::from_str(&content)?;
    tracing::info!("[Config] 已加载配置: {:?}", path);
    Ok(config)
}

/// 保存配置
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_yaml::to_string(config)?)?;
    Ok(())
}
