//! ProGlove 触觉手套客户端
//!
//! 手套只有状态通道（PUB/SUB），没有命令通道：链路确认方式是在限定时间内
//! 等到至少一帧触觉样本。

use crate::clock::{Clock, SystemClock};
use crate::error::DriverError;
use crate::hand::MAX_STATUS_DRAIN;
use prohand_protocol::{StatusMessage, TactileStatus, WireMessage};
use prohand_transport::{SubscribeChannel, Transport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// 左手手套默认状态端点
pub const DEFAULT_LEFT_GLOVE_ENDPOINT: &str = "ipc:///tmp/proglove-left-status.ipc";
/// 右手手套默认状态端点
pub const DEFAULT_RIGHT_GLOVE_ENDPOINT: &str = "ipc:///tmp/proglove-right-status.ipc";

/// ping 等待样本时的轮询间隔
const PING_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 触觉手套客户端
pub struct ProGlove {
    status: Option<Box<dyn SubscribeChannel>>,
    endpoint: String,
    clock: Arc<dyn Clock>,
    last_sample: Option<TactileStatus>,
}

impl ProGlove {
    /// 使用默认 ZeroMQ 后端连接
    pub fn connect(status_endpoint: &str) -> Result<Self, DriverError> {
        let transport = crate::builder::default_transport()?;
        Self::with_transport(
            status_endpoint,
            transport.as_ref(),
            Arc::new(SystemClock::new()),
        )
    }

    pub fn with_transport(
        status_endpoint: &str,
        transport: &dyn Transport,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DriverError> {
        if status_endpoint.trim().is_empty() {
            return Err(DriverError::InvalidArgument(
                "status endpoint is empty".to_string(),
            ));
        }
        let status = transport.open_subscribe(status_endpoint)?;
        info!("ProGlove client created (status: {})", status_endpoint);
        Ok(Self {
            status: Some(status),
            endpoint: status_endpoint.to_string(),
            clock,
            last_sample: None,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_some()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 等待至少一帧样本以确认链路，最多等待 `timeout`
    ///
    /// # Errors
    /// - `DriverError::Timeout`: 超时未收到样本
    pub fn ping(&mut self, timeout: Duration) -> Result<(), DriverError> {
        let start = self.clock.now();
        loop {
            if self.try_recv_status()?.is_some() {
                debug!("ProGlove ping answered by {}", self.endpoint);
                return Ok(());
            }
            let elapsed = self.clock.now().saturating_sub(start);
            if elapsed >= timeout {
                return Err(DriverError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            let remaining = timeout.saturating_sub(elapsed);
            self.clock.sleep(PING_POLL_INTERVAL.min(remaining));
        }
    }

    /// 非阻塞读取一帧触觉样本
    pub fn try_recv_status(&mut self) -> Result<Option<TactileStatus>, DriverError> {
        let channel = self.status.as_mut().ok_or(DriverError::NullHandle)?;
        while let Some(bytes) = channel.try_recv()? {
            match StatusMessage::decode(&bytes)? {
                StatusMessage::Tactile(frame) => {
                    let sample = TactileStatus::try_from(frame)?;
                    self.last_sample = Some(sample);
                    return Ok(Some(sample));
                },
                StatusMessage::Hand(_) => {
                    trace!("Ignoring hand status on glove channel");
                },
            }
        }
        Ok(None)
    }

    /// 读取已到达的样本（单次最多 `MAX_STATUS_DRAIN` 帧），返回最新一帧
    ///
    /// 没有新样本时返回上一帧；积压超过上限时剩余样本留到下次调用。
    pub fn latest(&mut self) -> Result<Option<TactileStatus>, DriverError> {
        for _ in 0..MAX_STATUS_DRAIN {
            if self.try_recv_status()?.is_none() {
                break;
            }
        }
        Ok(self.last_sample)
    }

    /// 释放状态通道（幂等）
    pub fn close(&mut self) {
        if self.status.take().is_some() {
            self.last_sample = None;
            info!("ProGlove client closed ({})", self.endpoint);
        }
    }
}

impl Drop for ProGlove {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ProGlove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProGlove")
            .field("connected", &self.is_connected())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::mock::SimulatedGlove;
    use crate::ErrorKind;
    use prohand_protocol::{TAXEL_COUNT, TaxelSegment};
    use prohand_transport::MockBus;

    fn setup() -> (ProGlove, SimulatedGlove, ManualClock, MockBus) {
        let sim = SimulatedGlove::new();
        let bus = MockBus::new(sim.clone());
        let clock = ManualClock::new();
        let glove = ProGlove::with_transport(
            DEFAULT_LEFT_GLOVE_ENDPOINT,
            &bus.transport(),
            Arc::new(clock.clone()),
        )
        .unwrap();
        (glove, sim, clock, bus)
    }

    #[test]
    fn test_ping_times_out_without_samples() {
        let (mut glove, _sim, clock, _bus) = setup();
        let err = glove.ping(Duration::from_millis(100)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(clock.now(), Duration::from_millis(100));
    }

    #[test]
    fn test_ping_succeeds_with_sample() {
        let (mut glove, sim, _clock, _bus) = setup();
        sim.push_sample(&TactileStatus::new(5, 1, [3; TAXEL_COUNT]));
        glove.ping(Duration::from_millis(100)).unwrap();
    }

    #[test]
    fn test_try_recv_is_non_blocking() {
        let (mut glove, sim, clock, _bus) = setup();
        assert!(glove.try_recv_status().unwrap().is_none());
        assert_eq!(clock.sleep_count(), 0);

        let mut taxels = [0u8; TAXEL_COUNT];
        taxels[TaxelSegment::ThumbDip.offset()] = 200;
        sim.push_sample(&TactileStatus::new(5, 42, taxels));

        let sample = glove.try_recv_status().unwrap().unwrap();
        assert_eq!(sample.uid, 42);
        assert_eq!(sample.segment(TaxelSegment::ThumbDip)[0], 200);
        assert_eq!(sample.total_pressure(), 200);
    }

    #[test]
    fn test_latest_returns_newest() {
        let (mut glove, sim, _clock, _bus) = setup();
        for uid in 1..=3 {
            sim.push_sample(&TactileStatus::new(uid, uid, [0; TAXEL_COUNT]));
        }
        assert_eq!(glove.latest().unwrap().unwrap().uid, 3);
        assert_eq!(sim.pending(), 0);
        // 没有新样本时保留上一帧
        assert_eq!(glove.latest().unwrap().unwrap().uid, 3);
    }

    #[test]
    fn test_latest_drain_is_bounded() {
        let (mut glove, sim, _clock, _bus) = setup();
        let queued = MAX_STATUS_DRAIN as u32 + 36;
        for uid in 1..=queued {
            sim.push_sample(&TactileStatus::new(uid, uid, [0; TAXEL_COUNT]));
        }

        let sample = glove.latest().unwrap().unwrap();
        assert_eq!(sample.uid, MAX_STATUS_DRAIN as u32);
        assert_eq!(sim.pending(), 36);

        // 下一次调用继续消费积压
        assert_eq!(glove.latest().unwrap().unwrap().uid, queued);
        assert_eq!(sim.pending(), 0);
    }

    #[test]
    fn test_malformed_sample_is_error() {
        let (mut glove, sim, _clock, _bus) = setup();
        sim.push_raw(vec![0xde, 0xad]);
        assert!(glove.try_recv_status().is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut glove, _sim, _clock, bus) = setup();
        glove.close();
        glove.close();
        assert!(!glove.is_connected());
        assert_eq!(bus.released_channels(), 1);
        assert!(matches!(
            glove.try_recv_status(),
            Err(DriverError::NullHandle)
        ));
    }
}
