//! 翻译后端提供者
//!
//! 每个后端实现同一个 [`Provider`] 能力，通过 [`ProviderRegistry`] 按标识解析。
//! 调度器只调用 `translate`，从不关心具体是哪一种后端。
//!
//! - `google` - 直接调用在线翻译服务，不构造提示词
//! - `koboldcpp` - 本地语言模型接口，需要构造提示词并解析生成结果
//! - `registry` - 标识到后端实例的映射
//! - `languages` - 可选语言目录和语言代码解析

pub mod google;
pub mod koboldcpp;
pub mod languages;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::translation::error::TranslationResult;

pub use google::GoogleProvider;
pub use koboldcpp::{GenerationParams, KoboldCppProvider};
pub use registry::ProviderRegistry;

/// 用户的语言选择对应请求中的哪个槽位
///
/// 在线翻译服务把界面上的语言当作目标语言，本地语言模型则把它当作源语言。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageRole {
    Source,
    Target,
}

/// 后端描述信息
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    /// 显示名称
    pub name: &'static str,
    /// 是否需要构造提示词
    pub builds_prompt: bool,
    /// 界面语言选择填入的槽位
    pub language_role: LanguageRole,
}

/// 翻译后端能力
#[async_trait]
pub trait Provider: Send + Sync {
    /// 获取后端描述信息
    fn info(&self) -> ProviderInfo;

    /// 翻译一段文本
    ///
    /// 返回的字符串就是后端给出的原文，不做裁剪。
    async fn translate(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: Option<&str>,
        endpoint: &str,
    ) -> TranslationResult<String>;
}

/// 一次请求使用的后端和语言设置
///
/// 会话持有当前设置，每次接受新的选区时复制进请求。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSettings {
    pub provider_id: String,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub endpoint: String,
}

impl RequestSettings {
    pub fn new(provider_id: &str, endpoint: &str) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            source_lang: None,
            target_lang: None,
            endpoint: endpoint.to_string(),
        }
    }

    /// 按后端的语言角色写入界面的语言选择
    pub fn with_language(mut self, role: LanguageRole, language: Option<&str>) -> Self {
        let language = language.map(str::to_string);
        match role {
            LanguageRole::Source => self.source_lang = language,
            LanguageRole::Target => self.target_lang = language,
        }
        self
    }
}
