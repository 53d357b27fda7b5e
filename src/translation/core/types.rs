//! 请求、结果和调度状态

use serde::{Deserialize, Serialize};

use crate::translation::error::{FailureKind, TranslationError};
use crate::translation::providers::RequestSettings;

/// 一次被接受的翻译请求
///
/// 创建后不可变，只归执行它的工作任务所有。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// 会话内严格递增的序号，从1开始
    pub sequence: u64,
    /// 已裁剪的非空文本
    pub text: String,
    pub provider_id: String,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub endpoint: String,
}

impl TranslationRequest {
    pub fn new(sequence: u64, text: String, settings: &RequestSettings) -> Self {
        Self {
            sequence,
            text,
            provider_id: settings.provider_id.clone(),
            source_lang: settings.source_lang.clone(),
            target_lang: settings.target_lang.clone(),
            endpoint: settings.endpoint.clone(),
        }
    }
}

/// 请求的终态结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeResult {
    Translated(String),
    Failed { kind: FailureKind, message: String },
}

/// 对某个请求的唯一回答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationOutcome {
    pub sequence: u64,
    pub result: OutcomeResult,
}

impl TranslationOutcome {
    pub fn translated(sequence: u64, text: String) -> Self {
        Self {
            sequence,
            result: OutcomeResult::Translated(text),
        }
    }

    pub fn failed(sequence: u64, error: &TranslationError) -> Self {
        Self {
            sequence,
            result: OutcomeResult::Failed {
                kind: error.kind(),
                message: error.to_string(),
            },
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self.result, OutcomeResult::Translated(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.result {
            OutcomeResult::Failed { kind, .. } => Some(*kind),
            OutcomeResult::Translated(_) => None,
        }
    }

    /// 界面上显示的文本：译文，或 `Error: <消息>`
    pub fn display_text(&self) -> String {
        match &self.result {
            OutcomeResult::Translated(text) => text.clone(),
            OutcomeResult::Failed { message, .. } => format!("Error: {}", message),
        }
    }
}

/// 调度器的会话状态
///
/// 只在 `submit` 和结果合并点被修改，会话重置时整体清空。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatcherState {
    pub last_accepted_text: Option<String>,
    pub highest_issued_sequence: u64,
    pub highest_delivered_sequence: u64,
}

/// 结果送达情况
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// 已交给结果接收端
    Delivered,
    /// 已有更新的结果送达，本结果被丢弃
    Superseded,
}
