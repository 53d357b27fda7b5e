//! 本地语言模型后端
//!
//! 根据源语言和目标语言构造一条指令式提示词，把原文原样嵌入，
//! 连同固定的生成参数一次性 POST 到生成接口，然后取出 `results[0].text`。
//! 不重试，不使用流式输出。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{LanguageRole, Provider, ProviderInfo};
use crate::translation::config::constants::DEFAULT_LLM_TARGET_LANG;
use crate::translation::error::{helpers, TranslationError, TranslationResult};

/// 生成结果在响应中的位置
const RESULT_POINTER: &str = "/results/0/text";

/// 语言模型生成参数
///
/// 这些值只是透传给生成接口的配置，调度器不会读取。
/// `max_length` 限制输出长度，不会随输入长度自动放大。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub max_context_length: u32,
    pub max_length: u32,
    pub quiet: bool,
    pub rep_pen: f32,
    pub rep_pen_range: u32,
    pub rep_pen_slope: f32,
    pub temperature: f32,
    pub tfs: f32,
    pub top_a: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub typical: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_context_length: 4096,
            max_length: 150,
            quiet: false,
            rep_pen: 1.1,
            rep_pen_range: 256,
            rep_pen_slope: 1.0,
            temperature: 0.5,
            tfs: 1.0,
            top_a: 0.0,
            top_k: 100,
            top_p: 1.0,
            typical: 1.0,
        }
    }
}

impl GenerationParams {
    pub fn validate(&self) -> TranslationResult<()> {
        if self.max_length == 0 {
            return Err(helpers::config_error("max_length 不能为0"));
        }

        if self.max_length >= self.max_context_length {
            return Err(helpers::config_error(format!(
                "max_length ({}) 必须小于 max_context_length ({})",
                self.max_length, self.max_context_length
            )));
        }

        if self.temperature < 0.0 {
            return Err(helpers::config_error("temperature 不能为负数"));
        }

        Ok(())
    }
}

/// 生成接口请求体
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    #[serde(flatten)]
    params: &'a GenerationParams,
}

/// 构造翻译提示词
///
/// 没有源语言时要求模型自动识别，目标语言缺省为英语。
pub fn build_prompt(text: &str, source_lang: Option<&str>, target_lang: Option<&str>) -> String {
    let source_part = match source_lang {
        Some(lang) if !lang.trim().is_empty() => {
            format!("{}-LANGUAGE TEXT", lang.trim().to_uppercase())
        }
        _ => "AUTO-DETECTED LANGUAGE TEXT".to_string(),
    };

    let target_part = target_lang
        .filter(|lang| !lang.trim().is_empty())
        .unwrap_or(DEFAULT_LLM_TARGET_LANG)
        .trim()
        .to_uppercase();

    format!(
        "Execute this translation task precisely:\n\
         \n\
         1. TRANSLATE THIS {source_part} TO {target_part}\n\
         PRESERVE NUMBERS/NAMES/SPECIAL TERMS AND USE NATURAL FLOW\n\
         2. OUTPUT MUST BE:\n\
         \x20  - PURE TRANSLATION ONLY\n\
         \x20  - NO EXPLANATIONS\n\
         \x20  - NO FORMATTING\n\
         \x20  - NO MARKDOWN\n\
         \x20  - NO QUOTES\n\
         3. IF INPUT IS ENGLISH, OUTPUT IDENTICAL TEXT\n\
         4. PRESERVE NUMBERS/NAMES/SPECIAL TERMS\n\
         5. RESPONSE MUST BE 1 PARAGRAPH, NO LINE BREAKS\n\
         \n\
         INPUT: \"{text}\"\n\
         \n\
         TRANSLATION OUTPUT: "
    )
}

/// 从生成接口的响应体中取出译文
pub fn extract_result(body: &str) -> TranslationResult<String> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| helpers::malformed_response(format!("响应不是合法的JSON: {}", e)))?;

    value
        .pointer(RESULT_POINTER)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| helpers::malformed_response(format!("响应中缺少 {}", RESULT_POINTER)))
}

/// 本地语言模型后端
pub struct KoboldCppProvider {
    client: reqwest::Client,
    params: GenerationParams,
}

impl KoboldCppProvider {
    pub fn new(params: GenerationParams) -> Self {
        Self {
            client: reqwest::Client::new(),
            params,
        }
    }
}

impl Default for KoboldCppProvider {
    fn default() -> Self {
        Self::new(GenerationParams::default())
    }
}

#[async_trait]
impl Provider for KoboldCppProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "KoboldCPP",
            builds_prompt: true,
            language_role: LanguageRole::Source,
        }
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: Option<&str>,
        endpoint: &str,
    ) -> TranslationResult<String> {
        let prompt = build_prompt(text, source_lang, target_lang);
        let body = GenerateRequest {
            prompt: &prompt,
            params: &self.params,
        };

        tracing::debug!("请求语言模型: {} (提示词 {} 字符)", endpoint, prompt.len());

        let response = self
            .client
            .post(endpoint)
            .json(&body)
            .send()
            .await
            .map_err(TranslationError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(helpers::transport_error(format!(
                "API request failed ({})",
                status.as_u16()
            )));
        }

        let payload = response.text().await.map_err(TranslationError::from)?;
        extract_result(&payload)
    }
}
