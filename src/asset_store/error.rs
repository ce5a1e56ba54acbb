//! 资源存储错误类型

use serde::Serialize;
use thiserror::Error;

/// 资源存储错误
///
/// 会话或目录不存在不属于错误，查询类操作直接返回空结果。
#[derive(Debug, Error)]
pub enum AssetError {
    /// Base64 数据格式错误
    #[error("解码图片数据失败: {0}")]
    Decode(#[from] base64::DecodeError),

    /// 磁盘读写失败
    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),

    /// 会话信息序列化/反序列化失败
    #[error("会话信息格式错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 不安全的会话 ID 或资源 ID
    #[error("无效的{kind}: {id:?} ({reason})")]
    InvalidId {
        kind: &'static str,
        id: String,
        reason: &'static str,
    },
}

impl AssetError {
    pub fn is_invalid_id(&self) -> bool {
        matches!(self, Self::InvalidId { .. })
    }
}

impl Serialize for AssetError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
