//! ProHand 客户端
//!
//! 独占持有最多四个逻辑通道：
//!
//! | 通道 | 类型 | 用途 |
//! |------|------|------|
//! | command | REQ | ping、模式切换、绝对位置命令、零位标定 |
//! | status | SUB | 驱动发布的状态样本 |
//! | hand_stream | PUB | 高频手部命令（可选） |
//! | wrist_stream | PUB | 高频腕部命令（可选） |
//!
//! 客户端只能移动、不能复制；`close()` 或 drop 时释放全部通道且只释放一次，
//! 之后所有操作立即返回 [`DriverError::NullHandle`]，不会触碰传输层。

use crate::clock::Clock;
use crate::error::DriverError;
use crate::events::{ClientEvent, EventCallback, HookManager};
use crate::handshake::HandshakeState;
use crate::builder::EndpointConfig;
use prohand_protocol::*;
use prohand_transport::{PublishChannel, RequestChannel, SubscribeChannel, Transport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// 单次排空状态通道最多读取的样本数（保证非阻塞）
pub(crate) const MAX_STATUS_DRAIN: usize = 64;

struct Channels {
    command: Box<dyn RequestChannel>,
    status: Box<dyn SubscribeChannel>,
    hand_stream: Option<Box<dyn PublishChannel>>,
    wrist_stream: Option<Box<dyn PublishChannel>>,
}

/// 流式目标通道
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamTarget {
    Hand,
    Wrist,
}

/// 灵巧手客户端
///
/// # Example
///
/// ```no_run
/// use prohand_driver::{HandshakeConfig, ProHandBuilder};
/// use prohand_protocol::{JointCommand, WristCommand};
///
/// let mut hand = ProHandBuilder::new().build()?;
/// hand.ping()?;
/// if hand.enable_streaming(&HandshakeConfig::default())? {
///     hand.send_hand_stream(&JointCommand::zero())?;
///     hand.send_wrist_stream(&WristCommand::zero())?;
///     hand.disable_streaming()?;
/// }
/// # Ok::<(), prohand_driver::DriverError>(())
/// ```
pub struct ProHand {
    channels: Option<Channels>,
    endpoints: EndpointConfig,
    request_timeout: Duration,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) hooks: HookManager,
    pub(crate) handshake: HandshakeState,
    last_status: Option<HandStatus>,
}

impl ProHand {
    /// 创建全部通道
    ///
    /// 通道创建可能是异步的：返回时句柄可用，但链路不一定已建立，需要 `ping()` 确认。
    pub(crate) fn connect(
        endpoints: EndpointConfig,
        transport: &dyn Transport,
        request_timeout: Duration,
        clock: Arc<dyn Clock>,
        hooks: HookManager,
    ) -> Result<Self, DriverError> {
        let command = transport.open_request(&endpoints.command)?;
        let status = transport.open_subscribe(&endpoints.status)?;
        let hand_stream = endpoints
            .hand_stream
            .as_deref()
            .map(|e| transport.open_publish(e))
            .transpose()?;
        let wrist_stream = endpoints
            .wrist_stream
            .as_deref()
            .map(|e| transport.open_publish(e))
            .transpose()?;

        info!(
            "ProHand client created via {} (command: {}, status: {}, streaming: {})",
            transport.name(),
            endpoints.command,
            endpoints.status,
            endpoints.has_streaming()
        );

        let hand = Self {
            channels: Some(Channels {
                command,
                status,
                hand_stream,
                wrist_stream,
            }),
            endpoints,
            request_timeout,
            clock,
            hooks,
            handshake: HandshakeState::Disabled,
            last_status: None,
        };
        hand.emit(ClientEvent::Connected {
            command_endpoint: hand.endpoints.command.clone(),
            streaming: hand.endpoints.has_streaming(),
        });
        Ok(hand)
    }

    /// 句柄是否已初始化（不代表链路可用，需 `ping()` 确认）
    pub fn is_connected(&self) -> bool {
        self.channels.is_some()
    }

    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// 客户端使用的时钟（调度器共享同一时间源）
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn handshake_state(&self) -> HandshakeState {
        self.handshake
    }

    /// 注册事件回调
    pub fn add_event_callback(&mut self, callback: Arc<dyn EventCallback>) {
        self.hooks.add_callback(callback);
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        self.hooks.trigger_all(&event);
    }

    // ------------------------------------------------------------------
    // 可靠通道
    // ------------------------------------------------------------------

    fn request(&mut self, request: Request) -> Result<(), DriverError> {
        self.request_within(request, self.request_timeout)
    }

    /// 可靠请求，应答等待不超过 `timeout`
    fn request_within(&mut self, request: Request, timeout: Duration) -> Result<(), DriverError> {
        let operation = request.name();
        let channels = self.channels.as_mut().ok_or(DriverError::NullHandle)?;

        let payload = request.encode()?;
        trace!("-> {} ({} bytes)", operation, payload.len());

        let result = channels
            .command
            .request(&payload, timeout)
            .map_err(DriverError::from)
            .and_then(|bytes| Ok(Reply::decode(&bytes)?))
            .and_then(|reply| DriverError::check_reply(&reply));

        match &result {
            Ok(()) => {
                debug!("{} accepted", operation);
                self.emit(ClientEvent::CommandSent { operation });
            },
            Err(e) => {
                warn!("{} failed: {}", operation, e);
                self.emit(ClientEvent::Error {
                    operation,
                    message: e.to_string(),
                });
            },
        }
        result
    }

    /// 双向链路探测
    pub fn ping(&mut self) -> Result<(), DriverError> {
        self.request(Request::Ping)?;
        self.emit(ClientEvent::PingSucceeded);
        Ok(())
    }

    /// 原始模式切换命令（不等待确认）
    ///
    /// 需要确认运行状态时使用 [`ProHand::enable_streaming`]。
    pub fn set_streaming_mode(&mut self, enabled: bool) -> Result<(), DriverError> {
        self.set_streaming_mode_within(enabled, self.request_timeout)
    }

    /// 模式切换请求，应答等待取 `limit` 与客户端请求超时中较小者
    pub(crate) fn set_streaming_mode_within(
        &mut self,
        enabled: bool,
        limit: Duration,
    ) -> Result<(), DriverError> {
        let timeout = self.request_timeout.min(limit);
        self.request_within(Request::SetStreamingMode { enabled }, timeout)?;
        if enabled {
            if self.handshake != HandshakeState::Running {
                self.handshake = HandshakeState::Requesting;
            }
        } else {
            self.handshake = HandshakeState::Disabled;
            self.last_status = None;
        }
        Ok(())
    }

    pub fn send_rotary_command(&mut self, command: &RotaryCommand) -> Result<(), DriverError> {
        self.ensure_open()?;
        command.validate()?;
        self.request(Request::Rotary(*command))
    }

    pub fn send_linear_command(&mut self, command: &LinearCommand) -> Result<(), DriverError> {
        self.ensure_open()?;
        command.validate()?;
        self.request(Request::Linear(*command))
    }

    pub fn send_wrist_command(&mut self, command: &WristCommand) -> Result<(), DriverError> {
        self.ensure_open()?;
        command.validate()?;
        self.request(Request::Wrist(*command))
    }

    pub fn send_hand_command(&mut self, command: &JointCommand) -> Result<(), DriverError> {
        self.ensure_open()?;
        command.validate()?;
        self.request(Request::Hand(*command))
    }

    /// 零位标定（16 位掩码）
    pub fn send_zero_calibration(&mut self, mask: &CalibrationMask) -> Result<(), DriverError> {
        self.ensure_open()?;
        if mask.count() == 0 {
            return Err(DriverError::InvalidArgument(
                "calibration mask selects no joints".to_string(),
            ));
        }
        self.request(Request::ZeroCalibration(*mask))
    }

    /// 设置腕部运动规划限制
    ///
    /// 驱动未编译运动规划器时返回 [`DriverError::Unsupported`]。
    pub fn set_wrist_limits(&mut self, limits: &WristLimits) -> Result<(), DriverError> {
        self.ensure_open()?;
        limits.validate()?;
        self.request(Request::SetWristLimits(*limits))
    }

    // ------------------------------------------------------------------
    // 流式通道
    // ------------------------------------------------------------------

    fn stream(&mut self, target: StreamTarget, message: StreamMessage) -> Result<(), DriverError> {
        let running = self.handshake == HandshakeState::Running;
        let channels = self.channels.as_mut().ok_or(DriverError::NullHandle)?;
        let channel = match target {
            StreamTarget::Hand => channels.hand_stream.as_mut(),
            StreamTarget::Wrist => channels.wrist_stream.as_mut(),
        }
        .ok_or_else(|| {
            DriverError::NotConnected(format!("no {:?} streaming endpoint configured", target))
        })?;

        if !running {
            return Err(DriverError::NotConnected(
                "streaming mode has not been confirmed by the driver".to_string(),
            ));
        }

        let operation = message.name();
        let result = message
            .encode()
            .map_err(DriverError::from)
            .and_then(|payload| Ok(channel.publish(&payload)?));
        match &result {
            Ok(()) => self.emit(ClientEvent::StreamSent { operation }),
            Err(e) => {
                debug!("{} failed: {}", operation, e);
                self.emit(ClientEvent::Error {
                    operation,
                    message: e.to_string(),
                });
            },
        }
        result
    }

    pub fn send_rotary_stream(&mut self, command: &RotaryCommand) -> Result<(), DriverError> {
        self.ensure_open()?;
        command.validate()?;
        self.stream(StreamTarget::Hand, StreamMessage::Rotary(*command))
    }

    pub fn send_linear_stream(&mut self, command: &LinearCommand) -> Result<(), DriverError> {
        self.ensure_open()?;
        command.validate()?;
        self.stream(StreamTarget::Hand, StreamMessage::Linear(*command))
    }

    pub fn send_wrist_stream(&mut self, command: &WristCommand) -> Result<(), DriverError> {
        self.ensure_open()?;
        command.validate()?;
        self.stream(StreamTarget::Wrist, StreamMessage::Wrist(*command))
    }

    pub fn send_hand_stream(&mut self, command: &JointCommand) -> Result<(), DriverError> {
        self.ensure_open()?;
        command.validate()?;
        self.stream(StreamTarget::Hand, StreamMessage::Hand(*command))
    }

    // ------------------------------------------------------------------
    // 状态通道
    // ------------------------------------------------------------------

    /// 非阻塞读取一个状态样本；没有新样本时返回 `Ok(None)`
    pub fn try_recv_status(&mut self) -> Result<Option<HandStatus>, DriverError> {
        let channels = self.channels.as_mut().ok_or(DriverError::NullHandle)?;
        while let Some(bytes) = channels.status.try_recv()? {
            match StatusMessage::decode(&bytes)? {
                StatusMessage::Hand(status) => {
                    self.last_status = Some(status);
                    return Ok(Some(status));
                },
                StatusMessage::Tactile(_) => {
                    trace!("Ignoring tactile sample on hand status channel");
                },
            }
        }
        Ok(None)
    }

    /// 最近一次收到的状态样本
    pub fn last_status(&self) -> Option<&HandStatus> {
        self.last_status.as_ref()
    }

    /// 驱动是否处于流式运行状态
    ///
    /// 读取当前已到达的全部样本（有上限，不阻塞），依据最新样本判断。
    /// 读取失败或客户端已关闭时返回 `false`。
    pub fn is_running_state(&mut self) -> bool {
        for _ in 0..MAX_STATUS_DRAIN {
            match self.try_recv_status() {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(e) => {
                    debug!("Status poll failed: {}", e);
                    break;
                },
            }
        }
        let running = self
            .last_status
            .as_ref()
            .is_some_and(HandStatus::indicates_running);
        if running
            && matches!(
                self.handshake,
                HandshakeState::Requesting | HandshakeState::Confirming
            )
        {
            self.handshake = HandshakeState::Running;
        }
        running
    }

    // ------------------------------------------------------------------
    // 生命周期
    // ------------------------------------------------------------------

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.channels.is_some() {
            Ok(())
        } else {
            Err(DriverError::NullHandle)
        }
    }

    /// 释放全部通道（幂等）
    pub fn close(&mut self) {
        if let Some(channels) = self.channels.take() {
            drop(channels);
            self.handshake = HandshakeState::Disabled;
            self.last_status = None;
            info!("ProHand client closed ({})", self.endpoints.command);
            self.emit(ClientEvent::Closed);
        }
    }
}

impl Drop for ProHand {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ProHand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProHand")
            .field("connected", &self.is_connected())
            .field("endpoints", &self.endpoints)
            .field("handshake", &self.handshake)
            .finish()
    }
}
