//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。所有错误都只终结它所属的那一次请求，
//! 不会让调度器本身失效。

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 后端提供者错误的细分类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderErrorKind {
    /// 网络/传输层失败，或服务返回非成功状态
    Transport,
    /// 响应体缺少预期字段或无法解析
    MalformedResponse,
    /// 超过单次请求时限
    Timeout,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderErrorKind::Transport => "transport",
            ProviderErrorKind::MalformedResponse => "malformed response",
            ProviderErrorKind::Timeout => "timeout",
        };
        write!(f, "{}", name)
    }
}

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 未注册的后端标识
    #[error("未知的翻译后端: {0}")]
    UnknownProvider(String),

    /// 后端调用失败
    #[error("翻译后端错误 ({kind}): {detail}")]
    Provider {
        kind: ProviderErrorKind,
        detail: String,
    },

    /// 选区为空（在创建请求前就被过滤，不会交给界面）
    #[error("选区为空")]
    EmptySelection,

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

/// 交给结果接收端的失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    UnknownProvider,
    Provider(ProviderErrorKind),
    EmptySelection,
    Configuration,
    Internal,
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl TranslationError {
    /// 创建后端错误
    pub fn provider<T: fmt::Display>(kind: ProviderErrorKind, detail: T) -> Self {
        TranslationError::Provider {
            kind,
            detail: detail.to_string(),
        }
    }

    /// 映射到结果中携带的失败类别
    pub fn kind(&self) -> FailureKind {
        match self {
            TranslationError::UnknownProvider(_) => FailureKind::UnknownProvider,
            TranslationError::Provider { kind, .. } => FailureKind::Provider(*kind),
            TranslationError::EmptySelection => FailureKind::EmptySelection,
            TranslationError::ConfigError(_) => FailureKind::Configuration,
            TranslationError::InternalError(_) => FailureKind::Internal,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::UnknownProvider(_) => ErrorSeverity::Error,
            TranslationError::Provider { kind, .. } => match kind {
                ProviderErrorKind::Transport => ErrorSeverity::Warning,
                ProviderErrorKind::Timeout => ErrorSeverity::Warning,
                ProviderErrorKind::MalformedResponse => ErrorSeverity::Error,
            },
            TranslationError::EmptySelection => ErrorSeverity::Info,
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::InternalError(_) => ErrorSeverity::Critical,
        }
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TranslationError::provider(ProviderErrorKind::Timeout, error)
        } else if error.is_decode() {
            TranslationError::provider(ProviderErrorKind::MalformedResponse, error)
        } else {
            TranslationError::provider(ProviderErrorKind::Transport, error)
        }
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        helpers::config_error(format!("JSON解析错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        helpers::config_error(format!("TOML解析错误: {}", error))
    }
}

impl From<tokio::time::error::Elapsed> for TranslationError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        helpers::timeout_error(format!("请求超时: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误，错误本身原样返回
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }
    }

    /// 创建传输错误
    pub fn transport_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::provider(ProviderErrorKind::Transport, msg)
    }

    /// 创建响应格式错误
    pub fn malformed_response<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::provider(ProviderErrorKind::MalformedResponse, msg)
    }

    /// 创建超时错误
    pub fn timeout_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::provider(ProviderErrorKind::Timeout, msg)
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }
}
