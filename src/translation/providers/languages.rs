//! 语言目录
//!
//! 界面上的语言用英文全名表示，在线翻译服务需要 ISO 639-1 代码。

use crate::translation::config::constants::SUPPORTED_LANGUAGES;

/// 界面可选的语言
pub fn supported_languages() -> &'static [&'static str] {
    SUPPORTED_LANGUAGES
}

/// 把语言名称转换为 ISO 639-1 代码
///
/// 已经是代码或无法识别的名称原样返回，由服务端决定是否接受。
pub fn to_iso_639_1(language: &str) -> String {
    let language = language.trim();

    if let Some(code) = isolang::Language::from_name(language).and_then(|l| l.to_639_1()) {
        return code.to_string();
    }

    // 兼容小写名称，例如 "spanish"
    let capitalized = capitalize(language);
    isolang::Language::from_name(&capitalized)
        .and_then(|l| l.to_639_1())
        .map(str::to_string)
        .unwrap_or_else(|| language.to_string())
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
