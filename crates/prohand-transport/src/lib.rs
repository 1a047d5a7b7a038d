//! # ProHand Transport Layer
//!
//! 消息总线适配层，提供统一的通道抽象：
//!
//! - [`RequestChannel`]：可靠的请求 / 应答（一次只有一个未完成请求）
//! - [`PublishChannel`]：单向发布，尽力而为
//! - [`SubscribeChannel`]：订阅，支持非阻塞读取
//!
//! 通道以字节为单位工作，消息编码由协议层负责。具体后端通过 [`Transport`]
//! 工厂创建：`zmq` feature 提供 ZeroMQ 实现，`mock` feature 提供进程内模拟总线。

use std::time::Duration;
use thiserror::Error;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(feature = "zmq")]
pub mod zmq;

#[cfg(any(test, feature = "mock"))]
pub use mock::{ChannelKind, Dispatch, MockBus, MockRemote, MockTransport};

#[cfg(feature = "zmq")]
pub use self::zmq::ZmqTransport;

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connect to {endpoint} failed: {message}")]
    ConnectFailed { endpoint: String, message: String },

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Channel closed")]
    Closed,

    #[cfg(feature = "zmq")]
    #[error("ZeroMQ error: {0}")]
    Zmq(#[from] ::zmq::Error),
}

impl TransportError {
    pub fn timeout(timeout: Duration) -> Self {
        TransportError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

/// 可靠请求 / 应答通道
///
/// 每次调用发送一个请求并阻塞到收到应答或超时。
pub trait RequestChannel: Send {
    fn request(&mut self, payload: &[u8], timeout: Duration) -> Result<Vec<u8>, TransportError>;

    fn endpoint(&self) -> &str;
}

/// 单向发布通道
///
/// 只保证本地发送成功，不保证对端收到。
pub trait PublishChannel: Send {
    fn publish(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    fn endpoint(&self) -> &str;
}

/// 订阅通道
pub trait SubscribeChannel: Send {
    /// 非阻塞读取：无数据时立即返回 `Ok(None)`
    fn try_recv(&mut self) -> Result<Option<Vec<u8>>, TransportError>;

    fn endpoint(&self) -> &str;
}

/// 通道工厂
///
/// 端点是不透明字符串（如 `ipc:///tmp/prohand-commands.ipc` 或 `tcp://127.0.0.1:5562`）。
/// 建立连接可以是异步的：返回的句柄立即可用，但链路可能尚未建立。
pub trait Transport: Send {
    fn open_request(&self, endpoint: &str) -> Result<Box<dyn RequestChannel>, TransportError>;

    fn open_publish(&self, endpoint: &str) -> Result<Box<dyn PublishChannel>, TransportError>;

    fn open_subscribe(&self, endpoint: &str) -> Result<Box<dyn SubscribeChannel>, TransportError>;

    /// 后端名称（用于日志）
    fn name(&self) -> &'static str;
}
