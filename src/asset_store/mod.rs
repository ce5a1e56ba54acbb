//! OCR 图片资源存储模块
//!
//! 按会话隔离保存文档解析出的图片，供聊天界面通过静态路径引用。
//!
//! ## 目录结构
//! ```text
//! <storage_root>/
//! ├── {session-id}/
//! │   ├── session-info.json       # 会话信息（每次写入整体覆盖）
//! │   ├── img-0-1a2b3c4d.jpeg     # {原始 ID}-{8 位随机后缀}.{扩展名}
//! │   └── ...
//! └── ...
//! ```
//!
//! 对外访问路径为 `/assets/ocr-images/{session-id}/{文件名}`。

pub mod codec;
pub mod error;
pub mod paths;
pub mod references;
pub mod storage;
pub mod types;

pub use error::AssetError;
pub use references::rewrite_image_references;
pub use storage::SessionAssetStore;
pub use types::*;
