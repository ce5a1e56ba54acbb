//! 会话资源路径解析
//!
//! 所有磁盘路径都由 `存储根目录 / 会话 ID / 文件名` 组成，
//! 拼接前必须先通过 [`validate_session_id`] 和 [`validate_logical_id`]，
//! 保证路径不会逃逸出会话目录。

use std::path::{Path, PathBuf};

use super::error::AssetError;

/// 会话信息文件名
pub const CATALOG_FILE_NAME: &str = "session-info.json";

/// 默认对外访问前缀，需与静态文件服务挂载位置一致
pub const DEFAULT_PUBLIC_PREFIX: &str = "/assets/ocr-images";

/// 文件名随机后缀长度
pub const SUFFIX_LEN: usize = 8;

/// 文件名中原始 ID 与随机后缀之间的分隔符
pub const SUFFIX_SEPARATOR: char = '-';

/// 校验单个路径组件，拒绝分隔符、`..` 和隐藏文件名
fn validate_component(kind: &'static str, raw: &str) -> Result<(), AssetError> {
    let reject = |reason: &'static str| AssetError::InvalidId {
        kind,
        id: raw.to_string(),
        reason,
    };

    if raw.trim().is_empty() {
        return Err(reject("不能为空"));
    }
    if raw.contains('/') || raw.contains('\\') {
        return Err(reject("不能包含路径分隔符"));
    }
    if raw.contains('\0') {
        return Err(reject("不能包含 NUL 字符"));
    }
    if raw.contains("..") {
        return Err(reject("不能包含 .."));
    }
    if raw.starts_with('.') {
        return Err(reject("不能以 . 开头"));
    }
    Ok(())
}

/// 校验会话 ID（仅允许 ASCII 字母数字、`-` 和 `_`）
pub fn validate_session_id(session_id: &str) -> Result<(), AssetError> {
    validate_component("会话 ID", session_id)?;
    if session_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(AssetError::InvalidId {
            kind: "会话 ID",
            id: session_id.to_string(),
            reason: "只能包含字母、数字、- 和 _",
        })
    }
}

/// 校验调用方提供的资源 ID
pub fn validate_logical_id(logical_id: &str) -> Result<(), AssetError> {
    validate_component("资源 ID", logical_id)
}

/// 获取会话目录路径
pub fn session_dir(root: &Path, session_id: &str) -> PathBuf {
    root.join(session_id)
}

/// 获取会话信息文件路径
pub fn catalog_path(session_dir: &Path) -> PathBuf {
    session_dir.join(CATALOG_FILE_NAME)
}

/// 生成 `<logicalId>-<8 位随机后缀>.<ext>` 形式的文件名
pub fn asset_file_name(logical_id: &str, extension: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}{}{}.{}",
        logical_id,
        SUFFIX_SEPARATOR,
        &suffix[..SUFFIX_LEN],
        extension
    )
}

/// 生成对外访问路径，仅由会话 ID 和文件名决定
///
/// 资源 ID 可能含有 `#`、`?`、`%`、空格等字符，路径段需要百分号编码，
/// 静态文件服务会在查找文件前解码。
pub fn public_path(prefix: &str, session_id: &str, file_name: &str) -> String {
    format!(
        "{}/{}/{}",
        prefix.trim_end_matches('/'),
        urlencoding::encode(session_id),
        urlencoding::encode(file_name)
    )
}

/// 从文件名拆出 `(id, 扩展名)`，没有扩展名时扩展名为 `png`
pub fn split_file_name(file_name: &str) -> (&str, &str) {
    match file_name.rsplit_once('.') {
        Some((id, ext)) if !ext.is_empty() => (id, ext),
        Some((id, _)) => (id, super::codec::DEFAULT_EXTENSION),
        None => (file_name, super::codec::DEFAULT_EXTENSION),
    }
}

/// 从存储 ID 中去掉随机后缀还原原始 ID
///
/// 原始 ID 本身含有 `-` 时结果是有歧义的，只去掉最后一段。
pub fn original_id_of(id: &str) -> &str {
    match id.rsplit_once(SUFFIX_SEPARATOR) {
        Some((original, _)) if !original.is_empty() => original,
        _ => id,
    }
}
