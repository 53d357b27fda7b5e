//! 在线翻译服务后端
//!
//! 把整段文本直接交给服务，只指定目标语言，不构造任何提示词。

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::Value;

use super::languages::to_iso_639_1;
use super::{LanguageRole, Provider, ProviderInfo};
use crate::translation::config::constants::{DEFAULT_GOOGLE_API_URL, DEFAULT_SIMPLE_TARGET_LANG};
use crate::translation::error::{helpers, TranslationResult};

/// 在线翻译服务后端
pub struct GoogleProvider {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// 构造查询地址
    fn request_url(&self, text: &str, target: &str) -> String {
        format!(
            "{}/translate_a/single?client=gtx&sl=auto&tl={}&dt=t&q={}",
            self.base_url,
            utf8_percent_encode(target, NON_ALPHANUMERIC),
            utf8_percent_encode(text, NON_ALPHANUMERIC)
        )
    }
}

impl Default for GoogleProvider {
    fn default() -> Self {
        Self::new(DEFAULT_GOOGLE_API_URL)
    }
}

/// 拼接响应中的译文片段
///
/// 服务按句子切分结果，形如 `[[["译文", "原文", ...], ...], ...]`。
pub(crate) fn parse_segments(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        None
    } else {
        Some(translated)
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Google",
            builds_prompt: false,
            language_role: LanguageRole::Target,
        }
    }

    async fn translate(
        &self,
        text: &str,
        _source_lang: Option<&str>,
        target_lang: Option<&str>,
        _endpoint: &str,
    ) -> TranslationResult<String> {
        let target = target_lang
            .map(to_iso_639_1)
            .unwrap_or_else(|| DEFAULT_SIMPLE_TARGET_LANG.to_string());

        tracing::debug!("请求在线翻译: {} 字符 -> {}", text.chars().count(), target);

        let response = self
            .client
            .get(self.request_url(text, &target))
            .header("User-Agent", "Mozilla/5.0")
            .send()
            .await
            .map_err(|e| helpers::transport_error(format!("翻译服务请求失败: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(helpers::transport_error(format!(
                "翻译服务返回错误 ({})",
                status.as_u16()
            )));
        }

        // 服务端的任何异常响应都按传输失败处理
        let body: Value = response
            .json()
            .await
            .map_err(|e| helpers::transport_error(format!("翻译服务响应无法解析: {}", e)))?;

        parse_segments(&body)
            .ok_or_else(|| helpers::transport_error("翻译服务响应中没有译文"))
    }
}
