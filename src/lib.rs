//! # Autotranslate Library
//!
//! 选区驱动的自动翻译：用户选中一段文本，静默期结束后自动向翻译后端发起请求，
//! 并且只把最新一次请求的结果交回给界面。
//!
//! ## 模块组织
//!
//! - `env` - 类型安全的环境变量访问
//! - `translation` - 翻译功能（防抖、调度、后端提供者、配置）

pub mod env;
pub mod translation;

// Re-export commonly used items for convenience
pub use translation::{
    Debouncer, Dispatcher, ProviderRegistry, RequestSettings, ResultSink, SessionEvent,
    TextSource, TranslationConfig, TranslationError, TranslationOutcome, TranslationSession,
};
