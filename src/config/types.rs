//! 配置类型定义

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::path_utils::expand_tilde;
use crate::asset_store::paths::DEFAULT_PUBLIC_PREFIX;

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 请求体大小上限（字节），批量上传的 Base64 图片可能较大
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

/// 资源存储配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 存储根目录，支持 `~` 开头
    pub root: String,
    /// 对外访问前缀
    pub public_prefix: String,
    /// 过期清理阈值（天）
    pub max_age_days: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "public/assets/ocr-images".to_string(),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
            max_age_days: 30,
        }
    }
}

impl StorageConfig {
    /// 展开 `~` 后的存储根目录
    pub fn root_path(&self) -> PathBuf {
        expand_tilde(&self.root)
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 默认日志级别，`RUST_LOG` 优先
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
