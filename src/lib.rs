//! OCR 文档聊天的图片资源服务
//!
//! - `asset_store`: 按会话保存、列举和清理 OCR 提取出的图片
//! - `config`: YAML 配置
//! - `server`: 静态资源访问与管理 API

pub mod asset_store;
pub mod config;
pub mod server;

pub use asset_store::{
    rewrite_image_references, AssetError, IngestReport, SessionAssetStore, SessionCatalog,
    StoredAsset,
};
pub use config::AppConfig;
