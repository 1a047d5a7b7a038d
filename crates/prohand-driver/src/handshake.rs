//! 流式模式握手状态机
//!
//! ```text
//! Disabled ──enable──▶ Requesting ──settle──▶ Confirming ──running sample──▶ Running
//!                          ▲                      │
//!                          └──── retry_interval ──┘
//! Requesting / Confirming ──timeout──▶ Failed
//! Running ──disable──▶ Disabled
//! ```
//!
//! 驱动的模式切换与 PUB/SUB 链路就绪并不同步：订阅需要一段建立时间，
//! 驱动自身切换状态也可能需要多个控制周期。因此握手采用"重试直到确认"，
//! 而不是一次请求 / 应答。总等待时间由调用方给出的超时严格限定。

use crate::error::DriverError;
use crate::events::ClientEvent;
use crate::hand::ProHand;
use std::time::Duration;
use tracing::{info, warn};

/// 握手状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeState {
    #[default]
    Disabled,
    /// 已发送 set-streaming-mode(true)
    Requesting,
    /// 轮询状态通道等待确认
    Confirming,
    /// 驱动已确认运行状态，可以发送流式命令
    Running,
    /// 超时未确认
    Failed,
}

/// 握手配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandshakeConfig {
    /// 总超时（包含 settle 时间）
    pub timeout: Duration,
    /// 重发 set-streaming-mode(true) 的间隔
    pub retry_interval: Duration,
    /// 状态轮询间隔
    pub poll_interval: Duration,
    /// 首次请求后等待 PUB/SUB 建立的时间
    pub settle_delay: Duration,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            retry_interval: Duration::from_millis(300),
            poll_interval: Duration::from_millis(50),
            settle_delay: Duration::from_millis(200),
        }
    }
}

impl HandshakeConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), DriverError> {
        if self.poll_interval.is_zero() {
            return Err(DriverError::InvalidArgument(
                "handshake poll interval must be positive".to_string(),
            ));
        }
        if self.retry_interval.is_zero() {
            return Err(DriverError::InvalidArgument(
                "handshake retry interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl ProHand {
    /// 请求流式模式并等待驱动确认
    ///
    /// 返回 `Ok(true)` 表示已进入 `Running`；超时未确认返回 `Ok(false)`（状态 `Failed`），
    /// 这是正常的否定结果而不是错误。
    ///
    /// 每个请求的应答等待都截断到握手剩余时间，因此总耗时不超过
    /// `timeout + poll_interval`，与客户端的请求超时无关。
    ///
    /// # Errors
    /// - `DriverError::NullHandle`: 客户端已关闭
    /// - 首次 set-streaming-mode(true) 请求失败时原样返回；之后重试中的错误只记录日志
    pub fn enable_streaming(&mut self, config: &HandshakeConfig) -> Result<bool, DriverError> {
        config.validate()?;
        if !self.is_connected() {
            return Err(DriverError::NullHandle);
        }

        let clock = self.clock.clone();
        let start = clock.now();
        let remaining = || config.timeout.saturating_sub(clock.now().saturating_sub(start));

        self.handshake = HandshakeState::Requesting;
        let mut attempt = 1;
        self.emit(ClientEvent::StreamingRequested { attempt });
        if let Err(e) = self.set_streaming_mode_within(true, config.timeout) {
            self.handshake = HandshakeState::Failed;
            return Err(e);
        }
        let mut last_request = clock.now();

        clock.sleep(config.settle_delay.min(remaining()));
        self.handshake = HandshakeState::Confirming;

        loop {
            let elapsed = clock.now().saturating_sub(start);
            if elapsed >= config.timeout {
                break;
            }

            if self.is_running_state() {
                return Ok(self.confirm(elapsed));
            }

            if clock.now().saturating_sub(last_request) >= config.retry_interval {
                attempt += 1;
                self.handshake = HandshakeState::Requesting;
                self.emit(ClientEvent::StreamingRequested { attempt });
                if let Err(e) = self.set_streaming_mode_within(true, remaining()) {
                    warn!("Streaming mode retry {} failed: {}", attempt, e);
                }
                last_request = clock.now();
                self.handshake = HandshakeState::Confirming;
            }

            clock.sleep(config.poll_interval.min(remaining()));
        }

        // 超时前的最后一次检查
        if self.is_running_state() {
            let elapsed = clock.now().saturating_sub(start);
            return Ok(self.confirm(elapsed));
        }

        self.handshake = HandshakeState::Failed;
        warn!(
            "Driver did not confirm streaming mode within {:?} ({} requests)",
            config.timeout, attempt
        );
        self.emit(ClientEvent::StreamingFailed {
            timeout: config.timeout,
        });
        Ok(false)
    }

    fn confirm(&mut self, elapsed: Duration) -> bool {
        self.handshake = HandshakeState::Running;
        info!("Streaming mode confirmed after {:?}", elapsed);
        self.emit(ClientEvent::StreamingConfirmed { elapsed });
        true
    }

    /// 关闭流式模式（`Running` → `Disabled`）
    pub fn disable_streaming(&mut self) -> Result<(), DriverError> {
        self.set_streaming_mode(false)?;
        info!("Streaming mode disabled");
        self.emit(ClientEvent::StreamingDisabled);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{EndpointConfig, ProHandBuilder};
    use crate::clock::{Clock, ManualClock};
    use crate::events::ChannelEventSink;
    use crate::mock::{SimEntry, SimulatedHand};
    use prohand_protocol::{Request, ResultCode};
    use prohand_transport::{MockBus, MockRemote, TransportError};
    use std::sync::Arc;

    fn setup(sim: &SimulatedHand) -> (ProHand, ManualClock) {
        let clock = ManualClock::new();
        let bus = MockBus::new(sim.clone());
        let hand = ProHandBuilder::new()
            .endpoints(EndpointConfig::default())
            .transport(bus.transport())
            .clock(Arc::new(clock.clone()))
            .build()
            .unwrap();
        (hand, clock)
    }

    fn enable_requests(sim: &SimulatedHand) -> usize {
        sim.log()
            .iter()
            .filter(|e| **e == SimEntry::Request(Request::SetStreamingMode { enabled: true }))
            .count()
    }

    #[test]
    fn test_confirms_on_first_sample() {
        let sim = SimulatedHand::new();
        let (mut hand, clock) = setup(&sim);
        let (sink, events) = ChannelEventSink::bounded(16);
        hand.add_event_callback(Arc::new(sink));

        assert!(hand.enable_streaming(&HandshakeConfig::default()).unwrap());
        assert_eq!(hand.handshake_state(), HandshakeState::Running);
        assert_eq!(enable_requests(&sim), 1);
        // 只经过 settle 时间
        assert_eq!(clock.now(), Duration::from_millis(200));

        let events: Vec<_> = events.try_iter().collect();
        assert!(events.contains(&ClientEvent::StreamingRequested { attempt: 1 }));
        assert!(events.contains(&ClientEvent::StreamingConfirmed {
            elapsed: Duration::from_millis(200)
        }));
    }

    #[test]
    fn test_retries_until_confirmed() {
        let sim = SimulatedHand::new();
        // 第三次请求才生效（模拟前两次在 settle 窗口内丢失）
        sim.confirm_after(3);
        let (mut hand, clock) = setup(&sim);

        let config = HandshakeConfig::with_timeout(Duration::from_secs(2));
        assert!(hand.enable_streaming(&config).unwrap());
        assert_eq!(enable_requests(&sim), 3);
        // 请求发生在 0 / 300 / 600 ms，确认发生在下一次轮询
        assert_eq!(clock.now(), Duration::from_millis(650));
    }

    #[test]
    fn test_never_confirming_driver_fails_without_error() {
        let sim = SimulatedHand::new();
        sim.never_confirm();
        let (mut hand, clock) = setup(&sim);
        let config = HandshakeConfig::default();

        let confirmed = hand.enable_streaming(&config).unwrap();
        assert!(!confirmed);
        assert_eq!(hand.handshake_state(), HandshakeState::Failed);
        // 0 ms 首次请求，300 / 600 / 900 ms 重试
        assert_eq!(enable_requests(&sim), 4);
        assert!(clock.now() <= config.timeout + config.poll_interval);
    }

    #[test]
    fn test_bounded_for_various_timeouts() {
        for (timeout_ms, retry_ms) in [(10, 5), (100, 30), (1000, 300), (2500, 1000), (10_000, 300)]
        {
            let sim = SimulatedHand::new();
            sim.never_confirm();
            let (mut hand, clock) = setup(&sim);
            let config = HandshakeConfig {
                timeout: Duration::from_millis(timeout_ms),
                retry_interval: Duration::from_millis(retry_ms),
                ..HandshakeConfig::default()
            };
            assert!(!hand.enable_streaming(&config).unwrap());
            assert!(
                clock.now() <= config.timeout + config.poll_interval,
                "timeout {} ms took {:?}",
                timeout_ms,
                clock.now()
            );
        }
    }

    /// 首次请求正常应答，之后的请求一直阻塞到调用方给出的等待上限
    struct StallingDriver {
        sim: SimulatedHand,
        clock: ManualClock,
        requests: u32,
        waits: Arc<parking_lot::Mutex<Vec<Duration>>>,
    }

    impl MockRemote for StallingDriver {
        fn on_request(&mut self, endpoint: &str, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
            self.sim.on_request(endpoint, payload)
        }

        fn on_timed_request(
            &mut self,
            endpoint: &str,
            payload: &[u8],
            timeout: Duration,
        ) -> Result<Vec<u8>, TransportError> {
            self.requests += 1;
            self.waits.lock().push(timeout);
            if self.requests == 1 {
                return self.on_request(endpoint, payload);
            }
            self.clock.advance(timeout);
            Err(TransportError::timeout(timeout))
        }

        fn poll_status(&mut self, endpoint: &str) -> Option<Vec<u8>> {
            self.sim.poll_status(endpoint)
        }
    }

    #[test]
    fn test_blocking_retry_stays_within_timeout() {
        let sim = SimulatedHand::new();
        sim.never_confirm();
        let clock = ManualClock::new();
        let waits = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let bus = MockBus::new(StallingDriver {
            sim: sim.clone(),
            clock: clock.clone(),
            requests: 0,
            waits: waits.clone(),
        });
        let mut hand = ProHandBuilder::new()
            .endpoints(EndpointConfig::default())
            .transport(bus.transport())
            .clock(Arc::new(clock.clone()))
            .request_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        let config = HandshakeConfig::default();
        assert!(!hand.enable_streaming(&config).unwrap());
        assert_eq!(hand.handshake_state(), HandshakeState::Failed);
        assert!(
            clock.now() <= config.timeout + config.poll_interval,
            "handshake took {:?}",
            clock.now()
        );

        // 首次请求的等待以握手超时为上限，300 ms 处的重试只剩 700 ms
        let waits = waits.lock().clone();
        assert_eq!(waits[0], config.timeout);
        assert_eq!(waits[1], Duration::from_millis(700));
        assert_eq!(waits.len(), 2);
    }

    #[test]
    fn test_retry_errors_are_suppressed() {
        let sim = SimulatedHand::new();
        sim.confirm_after(3);
        let (mut hand, _clock) = setup(&sim);
        // 首次请求成功后，后续请求返回连接错误
        sim.fail_operation_after("set_streaming_mode", 1, ResultCode::Connection);

        let confirmed = hand.enable_streaming(&HandshakeConfig::default()).unwrap();
        assert!(!confirmed);
        assert_eq!(hand.handshake_state(), HandshakeState::Failed);
    }

    #[test]
    fn test_initial_request_error_propagates() {
        let sim = SimulatedHand::new();
        sim.fail_operation("set_streaming_mode", ResultCode::NotConnected);
        let (mut hand, _clock) = setup(&sim);

        let err = hand
            .enable_streaming(&HandshakeConfig::default())
            .unwrap_err();
        assert!(matches!(err, DriverError::NotConnected(_)));
        assert_eq!(hand.handshake_state(), HandshakeState::Failed);
    }

    #[test]
    fn test_disable_returns_to_disabled() {
        let sim = SimulatedHand::new();
        let (mut hand, _clock) = setup(&sim);
        assert!(hand.enable_streaming(&HandshakeConfig::default()).unwrap());

        hand.disable_streaming().unwrap();
        assert_eq!(hand.handshake_state(), HandshakeState::Disabled);
        assert_eq!(
            sim.log().last(),
            Some(&SimEntry::Request(Request::SetStreamingMode {
                enabled: false
            }))
        );
    }

    #[test]
    fn test_enable_after_close_is_null_handle() {
        let sim = SimulatedHand::new();
        let (mut hand, _clock) = setup(&sim);
        hand.close();
        assert!(matches!(
            hand.enable_streaming(&HandshakeConfig::default()),
            Err(DriverError::NullHandle)
        ));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let sim = SimulatedHand::new();
        let (mut hand, _clock) = setup(&sim);
        let config = HandshakeConfig {
            poll_interval: Duration::ZERO,
            ..HandshakeConfig::default()
        };
        assert!(matches!(
            hand.enable_streaming(&config),
            Err(DriverError::InvalidArgument(_))
        ));
        assert!(sim.log().is_empty());
    }
}
