//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 后端标识
    pub const PROVIDER_GOOGLE: &str = "Google";
    pub const PROVIDER_KOBOLDCPP: &str = "KoboldCPP";
    pub const DEFAULT_PROVIDER: &str = PROVIDER_GOOGLE;

    // 默认接口地址
    pub const DEFAULT_LLM_URL: &str = "http://localhost:5001/api/v1/generate";
    pub const DEFAULT_GOOGLE_API_URL: &str = "https://translate.googleapis.com";

    // 语言设置
    pub const DEFAULT_LLM_TARGET_LANG: &str = "English";
    pub const DEFAULT_SIMPLE_TARGET_LANG: &str = "en";
    pub const SUPPORTED_LANGUAGES: &[&str] = &["English", "Spanish", "French", "German", "Chinese"];

    // 时序设置
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    // 界面提示
    pub const PENDING_MESSAGE: &str = "Translating...";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "autotranslate.toml",
        ".autotranslate.toml",
        "~/.config/autotranslate/config.toml",
        "/etc/autotranslate/config.toml",
    ];
}

/// 加载配置，失败时退回默认值
pub fn load_translation_config(llm_url: Option<&str>) -> TranslationConfig {
    match ConfigManager::new() {
        Ok(manager) => {
            let mut config = manager.get_config().clone();
            if let Some(url) = llm_url {
                config.llm_url = url.to_string();
            }
            config
        }
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            TranslationConfig::default_with_url(llm_url)
        }
    }
}
