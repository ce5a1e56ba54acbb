//! 会话资源存储服务
//!
//! 提供图片写入、按会话列举、整体删除和过期清理。

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};

use super::codec;
use super::error::AssetError;
use super::paths::{self, CATALOG_FILE_NAME, DEFAULT_PUBLIC_PREFIX};
use super::types::{AssetFailure, IngestReport, SessionCatalog, StoredAsset};

/// 默认存储目录（相对当前工作目录）
const DEFAULT_BASE_DIR: &str = "public/assets/ocr-images";

/// 会话资源存储服务
#[derive(Debug, Clone)]
pub struct SessionAssetStore {
    /// 存储根目录（绝对路径）
    base_dir: PathBuf,
    /// 对外访问前缀
    public_prefix: String,
}

impl SessionAssetStore {
    /// 创建新的存储服务
    ///
    /// 默认使用 `./public/assets/ocr-images` 目录
    pub fn new() -> Result<Self, AssetError> {
        Self::with_base_dir(PathBuf::from(DEFAULT_BASE_DIR))
    }

    /// 使用指定目录创建存储服务
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self, AssetError> {
        fs::create_dir_all(&base_dir)?;
        let base_dir = fs::canonicalize(&base_dir)?;
        Ok(Self {
            base_dir,
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
        })
    }

    /// 设置对外访问前缀，需与静态文件服务的挂载路径一致
    pub fn with_public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefix = prefix.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    // ========================================================================
    // 会话目录
    // ========================================================================

    /// 确保会话目录存在
    ///
    /// 未提供会话 ID 时生成新的 UUID。目录已存在不视为错误。
    pub fn ensure_session(&self, session_id: Option<&str>) -> Result<String, AssetError> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        paths::validate_session_id(&session_id)?;

        let session_dir = paths::session_dir(&self.base_dir, &session_id);
        fs::create_dir_all(&session_dir)?;

        tracing::debug!("[SessionAssetStore] 会话目录就绪: {:?}", session_dir);
        Ok(session_id)
    }

    /// 检查会话目录是否存在
    pub fn session_exists(&self, session_id: &str) -> bool {
        paths::validate_session_id(session_id).is_ok()
            && paths::session_dir(&self.base_dir, session_id).is_dir()
    }

    // ========================================================================
    // 批量写入
    // ========================================================================

    /// 将一批编码图片写入会话目录
    ///
    /// 单个资源解码或写入失败只会记录到 `failures`，不会中断整批处理。
    /// 处理完成后整体覆盖会话信息文件，`imageCount` 为本批次成功写入的文件数。
    pub fn ingest<I, K, V>(
        &self,
        assets: I,
        session_id: Option<&str>,
    ) -> Result<IngestReport, AssetError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let session_id = self.ensure_session(session_id)?;
        let session_dir = paths::session_dir(&self.base_dir, &session_id);

        let mut report = IngestReport {
            session_id: session_id.clone(),
            ..Default::default()
        };

        for (logical_id, encoded) in assets {
            let logical_id = logical_id.into();
            match self.store_one(&session_id, &session_dir, &logical_id, encoded.as_ref()) {
                Ok(asset) => {
                    tracing::debug!("[SessionAssetStore] 保存图片: {}", asset.public_path);
                    report.stored_count += 1;
                    report.assets.insert(logical_id, asset);
                }
                Err(e) => {
                    tracing::warn!("[SessionAssetStore] 保存图片 {} 失败: {}", logical_id, e);
                    report.failures.push(AssetFailure {
                        logical_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.write_catalog(&SessionCatalog::new(
            session_id.clone(),
            report.stored_count,
        ))?;

        tracing::info!(
            "[SessionAssetStore] 会话 {} 写入 {} 张图片，失败 {} 张",
            session_id,
            report.stored_count,
            report.failures.len()
        );
        Ok(report)
    }

    fn store_one(
        &self,
        session_id: &str,
        session_dir: &Path,
        logical_id: &str,
        encoded: &str,
    ) -> Result<StoredAsset, AssetError> {
        paths::validate_logical_id(logical_id)?;

        let mime_type = codec::media_type_of(encoded);
        let bytes = codec::decode_payload(encoded)?;
        let extension = codec::extension_for(&mime_type);

        let file_name = paths::asset_file_name(logical_id, &extension);
        let file_path = session_dir.join(&file_name);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)?;
        if let Err(e) = file.write_all(&bytes) {
            drop(file);
            let _ = fs::remove_file(&file_path);
            return Err(e.into());
        }

        let (id, _) = paths::split_file_name(&file_name);
        Ok(StoredAsset {
            id: id.to_string(),
            original_id: logical_id.to_string(),
            public_path: paths::public_path(&self.public_prefix, session_id, &file_name),
            file_path,
            mime_type,
            width: None,
            height: None,
        })
    }

    // ========================================================================
    // 会话信息
    // ========================================================================

    /// 覆盖写入会话信息文件
    ///
    /// 先写入隐藏的临时文件再重命名，并发写入时最后一次重命名生效，
    /// 读取方不会看到写了一半的内容。
    pub fn write_catalog(&self, catalog: &SessionCatalog) -> Result<(), AssetError> {
        paths::validate_session_id(&catalog.session_id)?;
        let session_dir = paths::session_dir(&self.base_dir, &catalog.session_id);
        let content = serde_json::to_string_pretty(catalog)?;

        let tmp_path = session_dir.join(format!(
            ".{}.{}.tmp",
            CATALOG_FILE_NAME,
            uuid::Uuid::new_v4().simple()
        ));
        fs::write(&tmp_path, content)?;
        if let Err(e) = fs::rename(&tmp_path, paths::catalog_path(&session_dir)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// 读取会话信息，会话或信息文件不存在时返回 `None`
    pub fn read_catalog(&self, session_id: &str) -> Result<Option<SessionCatalog>, AssetError> {
        paths::validate_session_id(session_id)?;
        let path = paths::catalog_path(&paths::session_dir(&self.base_dir, session_id));
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    // ========================================================================
    // 查询
    // ========================================================================

    /// 列出会话中的所有图片
    ///
    /// 会话不存在、没有会话信息文件或读取目录失败时返回空列表。
    /// 元数据完全由文件名还原，顺序不保证。
    pub fn list_assets(&self, session_id: &str) -> Vec<StoredAsset> {
        if paths::validate_session_id(session_id).is_err() {
            return Vec::new();
        }
        let session_dir = paths::session_dir(&self.base_dir, session_id);
        if !session_dir.is_dir() || !paths::catalog_path(&session_dir).is_file() {
            return Vec::new();
        }

        match self.scan_session_dir(session_id, &session_dir) {
            Ok(assets) => assets,
            Err(e) => {
                tracing::warn!("[SessionAssetStore] 读取会话 {} 失败: {}", session_id, e);
                Vec::new()
            }
        }
    }

    fn scan_session_dir(
        &self,
        session_id: &str,
        session_dir: &Path,
    ) -> Result<Vec<StoredAsset>, AssetError> {
        let mut assets = Vec::new();

        for entry in fs::read_dir(session_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if file_name == CATALOG_FILE_NAME || file_name.starts_with('.') {
                continue;
            }

            let (id, extension) = paths::split_file_name(&file_name);
            assets.push(StoredAsset {
                id: id.to_string(),
                original_id: paths::original_id_of(id).to_string(),
                file_path: entry.path(),
                public_path: paths::public_path(&self.public_prefix, session_id, &file_name),
                mime_type: codec::mime_type_for_extension(extension),
                width: None,
                height: None,
            });
        }

        Ok(assets)
    }

    /// 列出所有带会话信息的会话，按创建时间倒序
    pub fn list_sessions(&self) -> Vec<SessionCatalog> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("[SessionAssetStore] 读取存储目录失败: {}", e);
                return Vec::new();
            }
        };

        let mut sessions = Vec::new();
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let Some(session_id) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if session_id.starts_with('.') {
                continue;
            }
            match self.read_catalog(&session_id) {
                Ok(Some(catalog)) => sessions.push(catalog),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!("[SessionAssetStore] 跳过会话 {}: {}", session_id, e);
                }
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions
    }

    // ========================================================================
    // 清理
    // ========================================================================

    /// 删除会话目录（包括所有文件）
    ///
    /// 会话不存在时返回 `false`。删除过程会尝试每个条目，
    /// 任一条目失败则记录日志并返回 `false`，已删除的文件不会恢复。
    pub fn delete_session(&self, session_id: &str) -> bool {
        if let Err(e) = paths::validate_session_id(session_id) {
            tracing::warn!("[SessionAssetStore] 拒绝删除: {}", e);
            return false;
        }
        let session_dir = paths::session_dir(&self.base_dir, session_id);
        if !session_dir.is_dir() {
            return false;
        }

        let entries = match fs::read_dir(&session_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("[SessionAssetStore] 删除会话 {} 失败: {}", session_id, e);
                return false;
            }
        };

        let mut errors = Vec::new();
        for entry in entries {
            let result = entry.and_then(|entry| {
                let path = entry.path();
                let removed = if entry.file_type()?.is_dir() {
                    fs::remove_dir_all(&path)
                } else {
                    fs::remove_file(&path)
                };
                removed.map_err(|e| std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
            });
            if let Err(e) = result {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            if let Err(e) = fs::remove_dir(&session_dir) {
                errors.push(e);
            }
        }

        if !errors.is_empty() {
            let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            tracing::error!(
                "[SessionAssetStore] 删除会话 {} 失败 ({} 个错误): {}",
                session_id,
                errors.len(),
                details.join("; ")
            );
            return false;
        }

        tracing::info!("[SessionAssetStore] 删除会话目录: {:?}", session_dir);
        true
    }

    /// 清理过期会话，返回删除数量
    ///
    /// 阈值超出可表示的时间范围时视为没有会话过期。
    pub fn cleanup_expired(&self, max_age_days: u32) -> u32 {
        let Some(cutoff) = Duration::try_days(i64::from(max_age_days))
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            tracing::debug!("[SessionAssetStore] 过期阈值 {} 天超出范围，跳过清理", max_age_days);
            return 0;
        };
        let mut cleaned = 0;

        for session in self.list_sessions() {
            if session.created_at < cutoff && self.delete_session(&session.session_id) {
                cleaned += 1;
                tracing::info!("[SessionAssetStore] 清理过期会话: {}", session.session_id);
            }
        }

        cleaned
    }
}
