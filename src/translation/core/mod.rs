//! 翻译系统核心模块
//!
//! 从选区变化到界面显示结果的完整链路：
//!
//! - **防抖** (`debouncer.rs`): 合并短时间内的连续选区变化
//! - **调度** (`dispatcher.rs`): 分配序号、过滤重复、并发执行请求，并在唯一的
//!   合并点丢弃过期结果
//! - **会话** (`session.rs`): 把界面事件、防抖触发和结果送达放进同一个事件循环
//! - **约定** (`sink.rs`): 界面一侧需要实现的选区来源和结果接收端
//! - **类型** (`types.rs`): 请求、结果和调度状态
//!
//! ## 主要特性
//!
//! - **单调送达**: 界面上显示的结果序号只增不减
//! - **失败即结果**: 后端错误、超时和未知后端都作为失败结果送达，调度器本身不失效
//! - **过期请求中止**: 新结果送达后可中止仍在执行的旧请求
//! - **性能统计**: 原子计数器记录发出、丢弃、失败等次数

pub mod debouncer;
pub mod dispatcher;
pub mod session;
pub mod sink;
pub mod types;

pub use debouncer::Debouncer;
pub use dispatcher::{
    execute_request, Dispatcher, DispatcherConfig, DispatcherStats, DispatcherStatsSnapshot,
};
pub use session::{SessionEvent, TranslationSession};
pub use sink::{stable_text, ResultSink, SharedSelection, TextSource};
pub use types::{Delivery, DispatcherState, OutcomeResult, TranslationOutcome, TranslationRequest};
