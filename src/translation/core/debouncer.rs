//! 选区防抖
//!
//! 每次选区变化都会取消尚未到期的计时并重新开始一个静默期。静默期内没有新的
//! 变化时触发一次。计时在会话的单一逻辑上下文中运行，不需要加锁。

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// 选区防抖器
#[derive(Debug)]
pub struct Debouncer {
    quiet_period: Duration,
    deadline: Option<Instant>,
    fired: u64,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            deadline: None,
            fired: 0,
        }
    }

    /// 选区发生变化：重新开始静默期
    pub fn notify_changed(&mut self) {
        self.deadline = Some(Instant::now() + self.quiet_period);
    }

    /// 取消尚未到期的计时，不会触发
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            tracing::trace!("取消未到期的防抖计时");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// 已触发的次数
    pub fn fire_count(&self) -> u64 {
        self.fired
    }

    /// 等待静默期结束
    ///
    /// 没有计时时永远挂起，便于放进 `tokio::select!`。在到期前被丢弃不会改变
    /// 状态，所以可以安全地反复调用。
    pub async fn wait_stable(&mut self) {
        let Some(deadline) = self.deadline else {
            return std::future::pending().await;
        };

        sleep_until(deadline).await;
        self.deadline = None;
        self.fired += 1;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(crate::translation::config::constants::DEFAULT_DEBOUNCE)
    }
}
