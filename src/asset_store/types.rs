//! 会话资源存储类型定义

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 已保存的图片资源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAsset {
    /// 存储 ID（文件名去掉扩展名）
    pub id: String,
    /// 调用方提供的原始 ID
    pub original_id: String,
    /// 磁盘上的绝对路径
    pub file_path: PathBuf,
    /// 对外访问路径
    pub public_path: String,
    /// MIME 类型
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl StoredAsset {
    /// 文件名（含扩展名）
    pub fn file_name(&self) -> Option<&str> {
        self.file_path.file_name().and_then(|n| n.to_str())
    }
}

/// 会话信息（`session-info.json`）
///
/// 每次批量写入都会整体覆盖，不与旧内容合并。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCatalog {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub image_count: usize,
}

impl SessionCatalog {
    pub fn new(session_id: String, image_count: usize) -> Self {
        Self {
            session_id,
            created_at: Utc::now(),
            image_count,
        }
    }
}

/// 单个资源写入失败的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFailure {
    pub logical_id: String,
    pub reason: String,
}

/// 批量写入结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// 实际使用的会话 ID（未提供时为新生成的 ID）
    pub session_id: String,
    /// 原始 ID -> 已保存资源，重复的原始 ID 保留最后一次写入
    pub assets: IndexMap<String, StoredAsset>,
    /// 写入失败的资源，不影响其他资源
    pub failures: Vec<AssetFailure>,
    /// 本批次实际写入磁盘的文件数
    pub stored_count: usize,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
