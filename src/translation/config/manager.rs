//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::providers::koboldcpp::GenerationParams;
use crate::translation::providers::RequestSettings;

/// 翻译配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 请求配置
    pub provider: String,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub llm_url: String,
    pub google_api_url: String,

    // 时序配置
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub cancel_superseded: bool,

    // 语言模型生成参数
    pub generation: GenerationParams,
}

impl TranslationConfig {
    /// 创建带指定语言模型地址的默认配置
    pub fn default_with_url(llm_url: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(url) = llm_url {
            config.llm_url = url.to_string();
        }
        config
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.provider.trim().is_empty() {
            return Err(TranslationError::ConfigError("后端标识不能为空".to_string()));
        }

        if self.debounce_ms == 0 {
            return Err(TranslationError::ConfigError("防抖静默期不能为0".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时不能为0".to_string()));
        }

        for url in [&self.llm_url, &self.google_api_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(TranslationError::ConfigError(format!(
                    "接口地址必须以 http:// 或 https:// 开头: {}",
                    url
                )));
            }
        }

        self.generation.validate()
    }

    /// 应用环境变量覆盖
    ///
    /// 只有显式设置的变量才会覆盖文件配置，无效值记录警告后忽略。
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{translation, EnvResult, EnvVar};

        fn explicit<T>(value: Option<EnvResult<T>>) -> Option<T> {
            match value? {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("忽略无效的环境变量: {}", e);
                    None
                }
            }
        }

        if let Some(provider) = explicit(translation::Provider::get_explicit()) {
            self.provider = provider;
        }

        if let Some(source_lang) = explicit(translation::SourceLang::get_explicit()) {
            self.source_lang = Some(source_lang);
        }

        if let Some(target_lang) = explicit(translation::TargetLang::get_explicit()) {
            self.target_lang = Some(target_lang);
        }

        if let Some(llm_url) = explicit(translation::LlmUrl::get_explicit()) {
            self.llm_url = llm_url;
            tracing::info!("环境变量覆盖语言模型地址: {}", self.llm_url);
        }

        if let Some(google_api_url) = explicit(translation::GoogleApiUrl::get_explicit()) {
            self.google_api_url = google_api_url;
        }

        if let Some(debounce) = explicit(translation::DebounceMs::get_explicit()) {
            self.debounce_ms = debounce.as_millis() as u64;
        }

        if let Some(timeout) = explicit(translation::RequestTimeout::get_explicit()) {
            self.request_timeout_secs = timeout.as_secs();
        }

        if let Some(cancel) = explicit(translation::CancelSuperseded::get_explicit()) {
            self.cancel_superseded = cancel;
        }
    }

    /// 转换为Duration类型
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 生成会话初始的请求设置
    pub fn request_settings(&self) -> RequestSettings {
        RequestSettings {
            provider_id: self.provider.clone(),
            source_lang: self.source_lang.clone(),
            target_lang: self.target_lang.clone(),
            endpoint: self.llm_url.clone(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: constants::DEFAULT_PROVIDER.to_string(),
            source_lang: None,
            target_lang: None,
            llm_url: constants::DEFAULT_LLM_URL.to_string(),
            google_api_url: constants::DEFAULT_GOOGLE_API_URL.to_string(),

            debounce_ms: constants::DEFAULT_DEBOUNCE.as_millis() as u64,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            cancel_superseded: true,

            generation: GenerationParams::default(),
        }
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定文件创建配置管理器
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();

        let expanded_path = shellexpand::tilde(path);
        let mut config = Self::load_from_file(&expanded_path)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 取出配置
    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    /// 从文件加载配置
    fn load_config() -> TranslationResult<TranslationConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        // 查找配置文件
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(TranslationConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        Self::parse_config(path, &content)
    }

    /// 按扩展名解析配置内容
    pub fn parse_config(path: &str, content: &str) -> TranslationResult<TranslationConfig> {
        let config = if path.ends_with(".json") {
            serde_json::from_str(content)?
        } else {
            toml::from_str(content)?
        };
        Ok(config)
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
