//! 翻译模块
//!
//! 采用清晰的模块化架构：
//! - **core**: 防抖、调度和会话事件循环
//! - **providers**: 翻译后端及其注册表
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use autotranslate::translation::{
//!     Debouncer, Dispatcher, DispatcherConfig, ProviderRegistry, ResultSink, SessionEvent,
//!     SharedSelection, TranslationConfig, TranslationOutcome, TranslationSession,
//! };
//!
//! struct Printer;
//!
//! impl ResultSink for Printer {
//!     fn show_pending(&mut self, _sequence: u64) {}
//!     fn show_result(&mut self, outcome: &TranslationOutcome) {
//!         println!("{}", outcome.display_text());
//!     }
//! }
//!
//! # async fn example() {
//! let config = TranslationConfig::default();
//! let registry = Arc::new(ProviderRegistry::with_defaults(&config));
//! let dispatcher = Dispatcher::new(
//!     registry,
//!     config.request_settings(),
//!     DispatcherConfig::from(&config),
//!     Printer,
//! );
//!
//! let selection = SharedSelection::new();
//! let session = TranslationSession::new(selection.clone(), Debouncer::new(config.debounce()), dispatcher);
//!
//! let (events, rx) = tokio::sync::mpsc::unbounded_channel();
//! selection.set("Hola mundo");
//! events.send(SessionEvent::SelectionChanged).ok();
//! drop(events);
//!
//! session.run(rx).await;
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块 - 后端、语言、时序和生成参数
pub mod config;

/// 核心模块 - 防抖、调度和会话
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 后端提供者模块 - 在线翻译服务与本地语言模型
pub mod providers;

// ============================================================================
// 公共API导出
// ============================================================================

pub use config::{ConfigManager, TranslationConfig};

pub use self::core::{
    Debouncer, Delivery, Dispatcher, DispatcherConfig, DispatcherState, DispatcherStats,
    DispatcherStatsSnapshot, OutcomeResult, ResultSink, SessionEvent, SharedSelection, TextSource,
    TranslationOutcome, TranslationRequest, TranslationSession,
};

pub use error::{FailureKind, ProviderErrorKind, TranslationError, TranslationResult};

pub use providers::{
    GenerationParams, GoogleProvider, KoboldCppProvider, LanguageRole, Provider, ProviderInfo,
    ProviderRegistry, RequestSettings,
};
