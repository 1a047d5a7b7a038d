//! 时钟抽象
//!
//! 握手与定频调度只通过 [`Clock`] 读取时间和睡眠：
//! - [`SystemClock`]：单调时钟 + `spin_sleep` 高精度睡眠
//! - [`ManualClock`]：虚拟时间，`sleep` 直接推进时间，用于确定性测试

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    /// 自时钟原点起经过的单调时间
    fn now(&self) -> Duration;

    fn sleep(&self, duration: Duration);
}

/// 系统单调时钟
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            spin_sleep::sleep(duration);
        }
    }
}

/// 虚拟时钟（克隆后共享同一时间线）
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Debug, Default)]
struct ManualState {
    now: Duration,
    sleeps: usize,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 手动推进时间
    pub fn advance(&self, duration: Duration) {
        self.inner.lock().now += duration;
    }

    /// `sleep` 被调用的次数
    pub fn sleep_count(&self) -> usize {
        self.inner.lock().sleeps
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.inner.lock().now
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.inner.lock();
        state.now += duration;
        state.sleeps += 1;
    }
}
