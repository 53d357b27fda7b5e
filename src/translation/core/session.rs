//! 翻译会话
//!
//! 把选区来源、防抖器和调度器放进同一个事件循环。界面事件、防抖触发和
//! 工作任务的结果都在这个循环里按到达顺序处理，所以结果接收端只会在
//! 这一个上下文中被调用。

use tokio::sync::mpsc;

use super::debouncer::Debouncer;
use super::dispatcher::Dispatcher;
use super::sink::{stable_text, ResultSink, TextSource};
use crate::translation::providers::RequestSettings;

/// 界面发给会话的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// 选区发生变化，文本在防抖触发时再读取
    SelectionChanged,
    /// 后端或语言选择发生变化
    SettingsChanged(RequestSettings),
    /// 清空会话状态，丢弃所有在途请求
    Reset,
    /// 窗口关闭，立即停止
    Close,
}

/// 翻译会话
pub struct TranslationSession<T: TextSource, S: ResultSink> {
    source: T,
    debouncer: Debouncer,
    dispatcher: Dispatcher<S>,
}

impl<T: TextSource, S: ResultSink> TranslationSession<T, S> {
    pub fn new(source: T, debouncer: Debouncer, dispatcher: Dispatcher<S>) -> Self {
        Self {
            source,
            debouncer,
            dispatcher,
        }
    }

    /// 运行事件循环
    ///
    /// 收到 `Close` 时立即返回，未到期的防抖计时和在途请求都被放弃。
    /// 事件通道关闭时不再接收新事件，但会等待未到期的防抖触发以及
    /// 所有在途请求送达后再返回。
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) -> Self {
        let mut input_open = true;

        loop {
            if !input_open && !self.debouncer.is_pending() && !self.dispatcher.has_in_flight() {
                tracing::debug!("输入已结束，会话退出");
                break;
            }

            tokio::select! {
                event = events.recv(), if input_open => match event {
                    Some(SessionEvent::Close) => {
                        self.close();
                        break;
                    }
                    Some(event) => self.handle_event(event),
                    None => input_open = false,
                },
                _ = self.debouncer.wait_stable() => {
                    self.on_stable();
                }
                // 只剩被中止的任务时得到 `None`，回到循环开头重新检查退出条件
                outcome = self.dispatcher.next_outcome(), if self.dispatcher.has_in_flight() => {
                    if let Some(outcome) = outcome {
                        self.dispatcher.deliver(outcome);
                    }
                }
            }
        }

        self
    }

    /// 处理除 `Close` 以外的事件
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SelectionChanged => self.debouncer.notify_changed(),
            SessionEvent::SettingsChanged(settings) => self.dispatcher.set_settings(settings),
            SessionEvent::Reset => {
                self.debouncer.cancel();
                self.dispatcher.reset();
            }
            SessionEvent::Close => self.close(),
        }
    }

    /// 防抖触发：读取当前选区并提交
    pub fn on_stable(&mut self) -> Option<u64> {
        let text = stable_text(&self.source)?;
        self.dispatcher.submit(&text)
    }

    fn close(&mut self) {
        tracing::info!("会话关闭");
        self.debouncer.cancel();
        self.dispatcher.shutdown();
    }

    pub fn dispatcher(&self) -> &Dispatcher<S> {
        &self.dispatcher
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }
}
