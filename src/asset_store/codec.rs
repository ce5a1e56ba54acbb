//! 图片数据编解码
//!
//! 处理 OCR 结果中的 `data:<mime>;base64,<payload>` 或裸 Base64 字符串。

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;

use super::error::AssetError;

/// 未声明类型时使用的默认 MIME 类型
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// 无法推断扩展名时使用的默认扩展名
pub const DEFAULT_EXTENSION: &str = "png";

static DATA_URI_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:([a-zA-Z0-9]+/[a-zA-Z0-9\-.+]+);base64,").expect("data uri pattern")
});

/// OCR 引擎输出的 Base64 填充并不总是规范的，解码时不校验填充
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 从编码字符串中提取 MIME 类型
///
/// 没有 data URI 前缀或前缀格式不正确时返回 `image/png`，不会失败。
/// 与解码一致，忽略开头的空白。
pub fn media_type_of(encoded: &str) -> String {
    DATA_URI_PREFIX
        .captures(encoded.trim_start())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

/// 去掉 data URI 前缀，返回 Base64 部分
///
/// 前缀匹配与 [`media_type_of`] 使用同一规则，任意声明类型都会被剥离；
/// 没有前缀时原样返回。
pub fn payload_of(encoded: &str) -> &str {
    let encoded = encoded.trim_start();
    match DATA_URI_PREFIX.find(encoded) {
        Some(m) => &encoded[m.end()..],
        None => encoded,
    }
}

/// 将编码字符串解码为二进制数据
pub fn decode_payload(encoded: &str) -> Result<Vec<u8>, AssetError> {
    let payload = payload_of(encoded.trim());
    // data URI 中常见换行折行
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(LENIENT.decode(compact.as_bytes())?)
}

/// 根据 MIME 类型推断文件扩展名
///
/// 取子类型部分并去掉 `+xml` 这类结构化后缀，例如 `image/svg+xml` -> `svg`。
pub fn extension_for(media_type: &str) -> String {
    let subtype = media_type
        .split_once('/')
        .map(|(_, sub)| sub)
        .unwrap_or("");
    let ext = subtype.split('+').next().unwrap_or("").trim();

    if ext.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext.to_ascii_lowercase()
    }
}

/// 根据扩展名还原 MIME 类型（列举会话资源时使用）
pub fn mime_type_for_extension(extension: &str) -> String {
    format!("image/{}", extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use proptest::prelude::*;

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_media_type_from_data_uri() {
        assert_eq!(
            media_type_of("data:image/jpeg;base64,/9j/4AAQ"),
            "image/jpeg"
        );
        assert_eq!(
            media_type_of("data:image/svg+xml;base64,PHN2Zz4="),
            "image/svg+xml"
        );
    }

    #[test]
    fn test_media_type_defaults_to_png() {
        assert_eq!(media_type_of("iVBORw0KGgo="), "image/png");
        assert_eq!(media_type_of("data:;base64,AAAA"), "image/png");
        assert_eq!(media_type_of("data:image/png,AAAA"), "image/png");
        assert_eq!(media_type_of(""), "image/png");
    }

    #[test]
    fn test_leading_whitespace_is_ignored_consistently() {
        let encoded = " \n\tdata:image/jpeg;base64,/9j/4AAQ";
        assert_eq!(media_type_of(encoded), "image/jpeg");
        assert_eq!(payload_of(encoded), "/9j/4AAQ");
        assert_eq!(decode_payload(encoded).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);
    }

    #[test]
    fn test_payload_of_strips_prefix() {
        assert_eq!(payload_of("data:image/png;base64,iVBORw0KGgo="), "iVBORw0KGgo=");
        assert_eq!(payload_of("iVBORw0KGgo="), "iVBORw0KGgo=");
    }

    #[test]
    fn test_payload_of_strips_non_image_prefix() {
        assert_eq!(payload_of("data:application/pdf;base64,JVBERi0="), "JVBERi0=");
    }

    #[test]
    fn test_decode_png_signature() {
        let bytes = decode_payload("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(bytes, PNG_SIGNATURE);
    }

    #[test]
    fn test_decode_tolerates_missing_padding_and_newlines() {
        assert_eq!(decode_payload("iVBORw0KGgo").unwrap(), PNG_SIGNATURE);
        assert_eq!(decode_payload("iVBORw0K\nGgo=\n").unwrap(), PNG_SIGNATURE);
    }

    #[test]
    fn test_decode_rejects_malformed_base64() {
        let err = decode_payload("data:image/png;base64,not*valid*base64!!").unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/JPEG"), "jpeg");
        assert_eq!(extension_for("image/svg+xml"), "svg");
        assert_eq!(extension_for("image/"), "png");
        assert_eq!(extension_for("garbage"), "png");
    }

    proptest! {
        #[test]
        fn prop_bare_base64_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let encoded = STANDARD.encode(&bytes);
            prop_assert_eq!(decode_payload(&encoded).unwrap(), bytes);
        }

        #[test]
        fn prop_data_uri_round_trip(
            bytes in proptest::collection::vec(any::<u8>(), 0..512),
            subtype in "(png|jpeg|gif|webp|svg\\+xml)",
        ) {
            let encoded = format!("data:image/{};base64,{}", subtype, STANDARD.encode(&bytes));
            prop_assert_eq!(media_type_of(&encoded), format!("image/{}", subtype));
            prop_assert_eq!(decode_payload(&encoded).unwrap(), bytes);
        }
    }
}
