//! 后端注册表
//!
//! 按标识字符串解析后端。未知标识是请求级错误，由调度器转成失败结果，
//! 不会在启动时报错。注册表构建完成后只读，可以在并发的工作任务之间共享。

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{GoogleProvider, KoboldCppProvider, Provider, ProviderInfo};
use crate::translation::config::constants::{PROVIDER_GOOGLE, PROVIDER_KOBOLDCPP};
use crate::translation::config::TranslationConfig;
use crate::translation::error::{TranslationError, TranslationResult};

/// 后端注册表
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 按配置注册内置后端
    pub fn with_defaults(config: &TranslationConfig) -> Self {
        let mut registry = Self::new();
        registry.register(
            PROVIDER_GOOGLE,
            Arc::new(GoogleProvider::new(&config.google_api_url)),
        );
        registry.register(
            PROVIDER_KOBOLDCPP,
            Arc::new(KoboldCppProvider::new(config.generation.clone())),
        );
        registry
    }

    /// 注册后端，同名标识会被替换
    pub fn register(&mut self, id: &str, provider: Arc<dyn Provider>) {
        if self.providers.insert(id.to_string(), provider).is_some() {
            tracing::debug!("替换已注册的后端: {}", id);
        }
    }

    /// 解析后端
    pub fn resolve(&self, id: &str) -> TranslationResult<Arc<dyn Provider>> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| TranslationError::UnknownProvider(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// 已注册的标识，按字母序
    pub fn ids(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// 指定后端的描述信息
    pub fn info(&self, id: &str) -> Option<ProviderInfo> {
        self.providers.get(id).map(|provider| provider.info())
    }
}
