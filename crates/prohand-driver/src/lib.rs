//! # ProHand Driver
//!
//! 驱动层：管理与驱动进程之间的通道，提供
//! - 连接管理（通道的独占持有与一次性释放）
//! - 可靠命令分发（请求 / 应答，结果码映射为 [`DriverError`]）
//! - 流式命令分发（单向发布，尽力而为）
//! - 流式模式握手状态机（[`HandshakeState`]）
//! - 非阻塞状态轮询
//! - 触觉手套客户端（[`ProGlove`]）
//! - 事件钩子（[`events`]）
//!
//! 大多数用户应该使用 `prohand-client` 提供的类型状态接口。

mod builder;
pub mod clock;
mod error;
pub mod events;
mod glove;
mod hand;
mod handshake;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use builder::{
    DEFAULT_COMMAND_ENDPOINT, DEFAULT_HAND_STREAM_ENDPOINT, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_STATUS_ENDPOINT, DEFAULT_WRIST_STREAM_ENDPOINT, EndpointConfig, ProHandBuilder,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DriverError, ErrorKind};
pub use events::{ChannelEventSink, ClientEvent, EventCallback, HookManager};
pub use glove::{DEFAULT_LEFT_GLOVE_ENDPOINT, DEFAULT_RIGHT_GLOVE_ENDPOINT, ProGlove};
pub use hand::ProHand;
pub use handshake::{HandshakeConfig, HandshakeState};
