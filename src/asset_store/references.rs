//! OCR Markdown 图片引用改写
//!
//! OCR 结果中的图片以 `![img-0.jpeg](img-0.jpeg)` 形式引用原始 ID，
//! 保存后需要替换为可访问的 `publicPath`。

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::types::StoredAsset;

static MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)\)").expect("markdown image pattern"));

/// 将 Markdown 中引用已保存资源的图片地址替换为对外访问路径
///
/// 未保存的引用（例如写入失败的图片）保持原样。
pub fn rewrite_image_references(markdown: &str, assets: &IndexMap<String, StoredAsset>) -> String {
    MARKDOWN_IMAGE
        .replace_all(markdown, |caps: &Captures| match assets.get(&caps[2]) {
            Some(asset) => format!("![{}]({})", &caps[1], asset.public_path),
            None => caps[0].to_string(),
        })
        .into_owned()
}
