//! 翻译调度器
//!
//! 调度器是请求的唯一入口，也是结果的唯一合并点：
//!
//! 1. `submit` 过滤空文本和重复文本，分配递增序号，通知界面进入等待状态，
//!    然后把请求交给独立的工作任务执行
//! 2. 工作任务解析后端、在时限内调用 `translate`，并把结果（成功或失败）
//!    作为值返回，不直接触碰界面
//! 3. `deliver` 在会话的单一上下文中逐个处理结果：序号不高于已送达的最大序号
//!    的结果被丢弃，其余交给结果接收端
//!
//! 因此界面上显示的结果序号单调递增，旧请求晚到的结果不会覆盖新结果。
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use autotranslate::translation::{
//!     Dispatcher, DispatcherConfig, ProviderRegistry, ResultSink, TranslationConfig,
//!     TranslationOutcome,
//! };
//!
//! struct Printer;
//!
//! impl ResultSink for Printer {
//!     fn show_pending(&mut self, _sequence: u64) {
//!         println!("Translating...");
//!     }
//!     fn show_result(&mut self, outcome: &TranslationOutcome) {
//!         println!("{}", outcome.display_text());
//!     }
//! }
//!
//! # async fn example() {
//! let config = TranslationConfig::default();
//! let registry = Arc::new(ProviderRegistry::with_defaults(&config));
//! let mut dispatcher = Dispatcher::new(
//!     registry,
//!     config.request_settings(),
//!     DispatcherConfig::from(&config),
//!     Printer,
//! );
//!
//! dispatcher.submit("Hola mundo");
//! dispatcher.drain().await;
//! # }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{AbortHandle, Id, JoinSet};

use super::sink::ResultSink;
use super::types::{Delivery, DispatcherState, TranslationOutcome, TranslationRequest};
use crate::translation::config::constants::DEFAULT_REQUEST_TIMEOUT;
use crate::translation::config::TranslationConfig;
use crate::translation::error::{helpers, TranslationError};
use crate::translation::providers::{ProviderRegistry, RequestSettings};

/// 调度器配置
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// 单次后端调用的时限
    pub request_timeout: Duration,
    /// 较新的结果送达后，中止仍在执行的更旧请求
    pub cancel_superseded: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cancel_superseded: true,
        }
    }
}

impl From<&TranslationConfig> for DispatcherConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            cancel_superseded: config.cancel_superseded,
        }
    }
}

/// 调度统计
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// 已发出的请求
    pub issued: AtomicU64,
    /// 因与上一次接受的文本相同而被忽略的提交
    pub duplicates: AtomicU64,
    /// 空选区
    pub empty: AtomicU64,
    /// 已送达的结果
    pub delivered: AtomicU64,
    /// 其中失败的结果
    pub failed: AtomicU64,
    /// 晚到而被丢弃的结果
    pub superseded: AtomicU64,
    /// 被中止的工作任务
    pub cancelled: AtomicU64,
}

impl DispatcherStats {
    fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            issued: self.issued.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// 调度统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStatsSnapshot {
    pub issued: u64,
    pub duplicates: u64,
    pub empty: u64,
    pub delivered: u64,
    pub failed: u64,
    pub superseded: u64,
    pub cancelled: u64,
}

/// 翻译调度器
pub struct Dispatcher<S: ResultSink> {
    registry: Arc<ProviderRegistry>,
    settings: RequestSettings,
    config: DispatcherConfig,
    sink: S,
    state: DispatcherState,
    workers: JoinSet<TranslationOutcome>,
    in_flight: BTreeMap<u64, AbortHandle>,
    /// 工作任务标识到请求序号，任务异常退出时用来补发失败结果
    task_sequences: HashMap<Id, u64>,
    stats: DispatcherStats,
}

impl<S: ResultSink> Dispatcher<S> {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        settings: RequestSettings,
        config: DispatcherConfig,
        sink: S,
    ) -> Self {
        Self {
            registry,
            settings,
            config,
            sink,
            state: DispatcherState::default(),
            workers: JoinSet::new(),
            in_flight: BTreeMap::new(),
            task_sequences: HashMap::new(),
            stats: DispatcherStats::default(),
        }
    }

    /// 提交一段稳定下来的选区文本
    ///
    /// 返回分配的序号；空文本或与上一次接受的文本相同时返回 `None`，
    /// 此时不会创建请求，界面也不会收到任何通知。
    /// 必须在 tokio 运行时中调用。
    pub fn submit(&mut self, stable_text: &str) -> Option<u64> {
        let text = stable_text.trim();
        if text.is_empty() {
            DispatcherStats::inc(&self.stats.empty);
            tracing::trace!("忽略空选区");
            return None;
        }

        if self.state.last_accepted_text.as_deref() == Some(text) {
            DispatcherStats::inc(&self.stats.duplicates);
            tracing::debug!("选区未变化，跳过翻译");
            return None;
        }

        self.state.last_accepted_text = Some(text.to_string());
        self.state.highest_issued_sequence += 1;
        let sequence = self.state.highest_issued_sequence;

        let request = TranslationRequest::new(sequence, text.to_string(), &self.settings);
        tracing::info!(
            "发起翻译 #{}: 后端={}, {} 字符",
            sequence,
            request.provider_id,
            request.text.chars().count()
        );

        self.sink.show_pending(sequence);

        let registry = Arc::clone(&self.registry);
        let timeout = self.config.request_timeout;
        let handle = self
            .workers
            .spawn(async move { execute_request(&registry, request, timeout).await });
        self.task_sequences.insert(handle.id(), sequence);
        self.in_flight.insert(sequence, handle);
        DispatcherStats::inc(&self.stats.issued);

        Some(sequence)
    }

    /// 合并一个结果
    ///
    /// 序号不高于已送达最大序号的结果被丢弃。
    pub fn deliver(&mut self, outcome: TranslationOutcome) -> Delivery {
        let sequence = outcome.sequence;
        self.in_flight.remove(&sequence);

        if sequence <= self.state.highest_delivered_sequence {
            DispatcherStats::inc(&self.stats.superseded);
            tracing::debug!(
                "丢弃过期结果 #{} (已送达 #{})",
                sequence,
                self.state.highest_delivered_sequence
            );
            return Delivery::Superseded;
        }

        self.state.highest_delivered_sequence = sequence;

        if self.config.cancel_superseded {
            self.cancel_older_than(sequence);
        }

        DispatcherStats::inc(&self.stats.delivered);
        if !outcome.is_translated() {
            DispatcherStats::inc(&self.stats.failed);
        }
        tracing::debug!("送达结果 #{}", sequence);
        self.sink.show_result(&outcome);

        Delivery::Delivered
    }

    /// 等待下一个完成的工作任务
    ///
    /// 没有在途任务时立即返回 `None`。被中止的任务不产生结果；
    /// 异常退出的任务转换成内部错误的失败结果，照常参与合并。
    pub async fn next_outcome(&mut self) -> Option<TranslationOutcome> {
        loop {
            match self.workers.join_next_with_id().await? {
                Ok((id, outcome)) => {
                    self.task_sequences.remove(&id);
                    return Some(outcome);
                }
                Err(e) => {
                    let sequence = self.task_sequences.remove(&e.id());
                    if e.is_cancelled() {
                        continue;
                    }
                    tracing::error!("翻译任务异常退出: {}", e);
                    let Some(sequence) = sequence else {
                        continue;
                    };
                    let error = TranslationError::InternalError(format!(
                        "翻译任务 #{} 异常退出",
                        sequence
                    ));
                    return Some(TranslationOutcome::failed(sequence, &error));
                }
            }
        }
    }

    /// 等待并合并下一个结果
    pub async fn deliver_next(&mut self) -> Option<Delivery> {
        let outcome = self.next_outcome().await?;
        Some(self.deliver(outcome))
    }

    /// 合并所有在途请求的结果
    pub async fn drain(&mut self) {
        while self.deliver_next().await.is_some() {}
    }

    /// 重置会话状态
    ///
    /// 中止所有在途请求，它们的结果不会再被送达。序号重新从1开始，
    /// 重复检测也被清空。统计数据保留。
    pub fn reset(&mut self) {
        let aborted = self.abort_all();
        self.state = DispatcherState::default();
        tracing::info!("会话已重置，中止 {} 个在途请求", aborted);
    }

    /// 停止调度，中止所有在途请求
    pub fn shutdown(&mut self) {
        let aborted = self.abort_all();
        if aborted > 0 {
            tracing::debug!("关闭时中止 {} 个在途请求", aborted);
        }
    }

    /// 更新后续请求使用的后端和语言
    ///
    /// 已发出的请求不受影响。重复检测只比较文本，更换后端后再次选中
    /// 同一段文本不会重新翻译。
    pub fn set_settings(&mut self, settings: RequestSettings) {
        tracing::info!(
            "更新翻译设置: 后端={}, 源语言={:?}, 目标语言={:?}",
            settings.provider_id,
            settings.source_lang,
            settings.target_lang
        );
        self.settings = settings;
    }

    pub fn settings(&self) -> &RequestSettings {
        &self.settings
    }

    pub fn state(&self) -> &DispatcherState {
        &self.state
    }

    pub fn has_in_flight(&self) -> bool {
        !self.workers.is_empty()
    }

    pub fn in_flight_count(&self) -> usize {
        self.workers.len()
    }

    pub fn get_stats(&self) -> &DispatcherStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn cancel_older_than(&mut self, sequence: u64) {
        let newer = self.in_flight.split_off(&sequence);
        let older = std::mem::replace(&mut self.in_flight, newer);
        for (stale, handle) in older {
            handle.abort();
            DispatcherStats::inc(&self.stats.cancelled);
            tracing::debug!("中止过期请求 #{}", stale);
        }
    }

    fn abort_all(&mut self) -> usize {
        let count = self.workers.len();
        self.stats
            .cancelled
            .fetch_add(count as u64, Ordering::Relaxed);
        // 丢弃整个任务集合，已经完成但尚未取走的结果也一起丢弃
        self.workers = JoinSet::new();
        self.in_flight.clear();
        self.task_sequences.clear();
        count
    }
}

/// 在工作任务中执行一次请求
///
/// 所有失败都被转换成失败结果，不会向外传播。
pub async fn execute_request(
    registry: &ProviderRegistry,
    request: TranslationRequest,
    timeout: Duration,
) -> TranslationOutcome {
    let sequence = request.sequence;

    let result = match registry.resolve(&request.provider_id) {
        Ok(provider) => {
            let call = provider.translate(
                &request.text,
                request.source_lang.as_deref(),
                request.target_lang.as_deref(),
                &request.endpoint,
            );
            match tokio::time::timeout(timeout, call).await {
                Ok(result) => result,
                Err(elapsed) => Err(elapsed.into()),
            }
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(translated) => {
            tracing::debug!("翻译 #{} 完成", sequence);
            TranslationOutcome::translated(sequence, translated)
        }
        Err(e) => {
            helpers::log_error(&e);
            TranslationOutcome::failed(sequence, &e)
        }
    }
}
