//! 固定频率调度器
//!
//! **循环锚点机制**：第 n 帧的目标时间是 `start + n / publish_hz`，
//! 由同一个起点直接计算，而不是累加每次的睡眠时长，因此单帧耗时的抖动不会累积成漂移。
//!
//! 每次迭代开始时依次检查取消令牌和运行时长，满足任一条件即退出，不会在帧中途停止。

use crate::control::CancellationToken;
use crate::error::ControlError;
use prohand_driver::Clock;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// 循环配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// 发布频率（Hz）
    pub publish_hz: f64,
    /// 运行时长；`None` 表示直到取消或回调要求退出
    pub duration: Option<Duration>,
}

impl LoopConfig {
    pub fn new(publish_hz: f64) -> Self {
        Self {
            publish_hz,
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// 发布周期；频率非法或周期超出 `Duration` 范围时返回错误
    pub fn period(&self) -> Result<Duration, ControlError> {
        self.validate()?;
        self.offset(1)
    }

    pub fn validate(&self) -> Result<(), ControlError> {
        if !self.publish_hz.is_finite() || self.publish_hz <= 0.0 {
            return Err(ControlError::InvalidConfig(format!(
                "publish rate must be a positive number, got {}",
                self.publish_hz
            )));
        }
        self.offset(1).map(|_| ())
    }

    /// 第 `index` 帧相对起点的目标时间
    fn offset(&self, index: u64) -> Result<Duration, ControlError> {
        Duration::try_from_secs_f64(index as f64 / self.publish_hz).map_err(|_| {
            ControlError::InvalidConfig(format!(
                "publish rate {} Hz gives a schedule beyond the representable time range",
                self.publish_hz
            ))
        })
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// 回调每帧收到的时间信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// 帧序号（从 0 开始）
    pub index: u64,
    /// 本帧开始时相对起点的时间
    pub elapsed: Duration,
}

/// 回调返回值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Break,
}

/// 循环结束时的统计
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunSummary {
    /// 已执行的帧数
    pub ticks: u64,
    pub elapsed: Duration,
    /// 是否因取消令牌退出
    pub cancelled: bool,
}

impl RunSummary {
    /// 合并连续执行的多段循环
    pub fn merge(self, other: RunSummary) -> RunSummary {
        RunSummary {
            ticks: self.ticks + other.ticks,
            elapsed: self.elapsed + other.elapsed,
            cancelled: self.cancelled || other.cancelled,
        }
    }
}

/// 以固定频率执行 `tick`
///
/// # Errors
/// - `ControlError::InvalidConfig`: 频率非法
/// - 回调返回的错误原样返回（循环立即终止）
pub fn run_fixed_rate<F>(
    clock: &dyn Clock,
    config: &LoopConfig,
    cancel: &CancellationToken,
    mut tick: F,
) -> Result<RunSummary, ControlError>
where
    F: FnMut(Tick) -> Result<LoopControl, ControlError>,
{
    let period = config.period()?;
    let start = clock.now();
    let mut index: u64 = 0;
    let mut cancelled = false;

    loop {
        if cancel.is_cancelled() {
            debug!("Fixed-rate loop cancelled after {} ticks", index);
            cancelled = true;
            break;
        }
        let elapsed = clock.now().saturating_sub(start);
        if let Some(duration) = config.duration
            && elapsed >= duration
        {
            break;
        }

        let control = tick(Tick { index, elapsed })?;
        index += 1;
        if control == LoopControl::Break {
            break;
        }

        // 睡眠到下一个锚点（自动扣除本帧耗时）
        let target = start + config.offset(index)?;
        let now = clock.now();
        if target > now {
            clock.sleep(target - now);
        } else if now - target > period {
            // 任务超时（Overrun）：不睡眠，下一帧仍以原锚点计算
            warn!(
                "Loop overrun: tick {} is {:?} behind schedule (period {:?})",
                index,
                now - target,
                period
            );
        }
    }

    Ok(RunSummary {
        ticks: index,
        elapsed: clock.now().saturating_sub(start),
        cancelled,
    })
}
