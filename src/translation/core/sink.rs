//! 与界面一侧的约定：选区来源和结果接收端

use std::sync::{Arc, RwLock};

use super::types::TranslationOutcome;

/// 结果接收端
///
/// 只在调度器的送达路径上被调用，且始终在会话所在的单一逻辑上下文中，
/// 两次调用不会并发。
pub trait ResultSink {
    /// 请求已发出，显示等待状态（不是终态）
    fn show_pending(&mut self, sequence: u64);

    /// 显示终态结果：译文或错误消息
    fn show_result(&mut self, outcome: &TranslationOutcome);
}

/// 选区来源
///
/// 防抖触发时才读取，读到的是触发那一刻的选区。
pub trait TextSource {
    fn current_selection_text(&self) -> String;
}

impl<F> TextSource for F
where
    F: Fn() -> String,
{
    fn current_selection_text(&self) -> String {
        self()
    }
}

/// 可在输入端和会话之间共享的选区
#[derive(Debug, Clone, Default)]
pub struct SharedSelection {
    inner: Arc<RwLock<String>>,
}

impl SharedSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, text: &str) {
        match self.inner.write() {
            Ok(mut selection) => *selection = text.to_string(),
            Err(poisoned) => *poisoned.into_inner() = text.to_string(),
        }
    }

    pub fn get(&self) -> String {
        match self.inner.read() {
            Ok(selection) => selection.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TextSource for SharedSelection {
    fn current_selection_text(&self) -> String {
        self.get()
    }
}

/// 把选区规整为可提交的文本：裁剪后为空则返回 `None`
pub fn stable_text<T: TextSource + ?Sized>(source: &T) -> Option<String> {
    let text = source.current_selection_text();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
