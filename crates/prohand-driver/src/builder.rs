//! Builder 模式实现
//!
//! 提供链式构造 [`ProHand`] 实例的便捷方式。

use crate::clock::{Clock, SystemClock};
use crate::error::DriverError;
use crate::events::{EventCallback, HookManager};
use crate::hand::ProHand;
use prohand_transport::Transport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// 默认命令通道端点
pub const DEFAULT_COMMAND_ENDPOINT: &str = "ipc:///tmp/prohand-commands.ipc";
/// 默认状态通道端点
pub const DEFAULT_STATUS_ENDPOINT: &str = "ipc:///tmp/prohand-status.ipc";
/// 默认手部流式端点
pub const DEFAULT_HAND_STREAM_ENDPOINT: &str = "ipc:///tmp/prohand-hand-streaming.ipc";
/// 默认腕部流式端点
pub const DEFAULT_WRIST_STREAM_ENDPOINT: &str = "ipc:///tmp/prohand-wrist-streaming.ipc";

/// 可靠通道单次调用的默认超时
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(1000);

/// 端点配置（构造客户端后不可变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub command: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_stream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrist_stream: Option<String>,
}

impl EndpointConfig {
    /// 仅命令 + 状态通道（不支持流式发送）
    pub fn new(command: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            status: status.into(),
            hand_stream: None,
            wrist_stream: None,
        }
    }

    pub fn with_streaming(
        mut self,
        hand_stream: impl Into<String>,
        wrist_stream: impl Into<String>,
    ) -> Self {
        self.hand_stream = Some(hand_stream.into());
        self.wrist_stream = Some(wrist_stream.into());
        self
    }

    /// TCP 预设：命令 5562，状态 5561，手部流 5563，腕部流 5564
    pub fn tcp(host: &str) -> Self {
        Self::new(
            format!("tcp://{}:5562", host),
            format!("tcp://{}:5561", host),
        )
        .with_streaming(
            format!("tcp://{}:5563", host),
            format!("tcp://{}:5564", host),
        )
    }

    /// 本机 TCP 预设
    pub fn tcp_localhost() -> Self {
        Self::tcp("127.0.0.1")
    }

    pub fn has_streaming(&self) -> bool {
        self.hand_stream.is_some() || self.wrist_stream.is_some()
    }

    pub fn validate(&self) -> Result<(), DriverError> {
        let all = [
            Some(("command", &self.command)),
            Some(("status", &self.status)),
            self.hand_stream.as_ref().map(|e| ("hand_stream", e)),
            self.wrist_stream.as_ref().map(|e| ("wrist_stream", e)),
        ];
        for (name, endpoint) in all.into_iter().flatten() {
            if endpoint.trim().is_empty() {
                return Err(DriverError::InvalidArgument(format!(
                    "{} endpoint is empty",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_ENDPOINT, DEFAULT_STATUS_ENDPOINT)
            .with_streaming(DEFAULT_HAND_STREAM_ENDPOINT, DEFAULT_WRIST_STREAM_ENDPOINT)
    }
}

/// ProHand Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use prohand_driver::{EndpointConfig, ProHandBuilder};
/// use std::time::Duration;
///
/// let hand = ProHandBuilder::new()
///     .endpoints(EndpointConfig::tcp("127.0.0.1"))
///     .request_timeout(Duration::from_millis(500))
///     .build()
///     .unwrap();
/// assert!(hand.is_connected());
/// ```
pub struct ProHandBuilder {
    endpoints: EndpointConfig,
    request_timeout: Duration,
    transport: Option<Box<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    hooks: HookManager,
}

impl ProHandBuilder {
    pub fn new() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            transport: None,
            clock: None,
            hooks: HookManager::new(),
        }
    }

    /// 设置端点（默认为本机 IPC 路径）
    pub fn endpoints(mut self, endpoints: EndpointConfig) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// 可靠通道单次调用超时（默认 1s）
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// 指定传输后端（默认 ZeroMQ）
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// 指定时钟（默认系统时钟）
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// 注册事件回调
    pub fn on_event(mut self, callback: Arc<dyn EventCallback>) -> Self {
        self.hooks.add_callback(callback);
        self
    }

    /// 创建全部通道并返回客户端
    ///
    /// # Errors
    /// - `DriverError::InvalidArgument`: 端点为空，或超时为 0
    /// - `DriverError::Connection`: 通道创建失败
    /// - `DriverError::Unsupported`: 未指定传输后端且未启用 `zmq` feature
    pub fn build(self) -> Result<ProHand, DriverError> {
        self.endpoints.validate()?;
        if self.request_timeout.is_zero() {
            return Err(DriverError::InvalidArgument(
                "request timeout must be positive".to_string(),
            ));
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()) as Arc<dyn Clock>);

        ProHand::connect(
            self.endpoints,
            transport.as_ref(),
            self.request_timeout,
            clock,
            self.hooks,
        )
    }
}

impl Default for ProHandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "zmq")]
pub(crate) fn default_transport() -> Result<Box<dyn Transport>, DriverError> {
    Ok(Box::new(prohand_transport::ZmqTransport::new()))
}

#[cfg(not(feature = "zmq"))]
pub(crate) fn default_transport() -> Result<Box<dyn Transport>, DriverError> {
    Err(DriverError::Unsupported(
        "no transport backend compiled in; enable the `zmq` feature".to_string(),
    ))
}
