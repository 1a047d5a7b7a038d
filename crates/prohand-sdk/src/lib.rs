//! ProHand SDK - 灵巧手与触觉手套 Rust SDK
//!
//! 通过 ZeroMQ 消息总线与本地驱动进程通信，控制 ProHand 灵巧手并读取 ProGlove 触觉手套数据。
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 命令、状态和线上消息的数据模型
//! - **传输层** (`transport`): 请求 / 发布 / 订阅通道抽象，ZeroMQ 与内存实现
//! - **驱动层** (`driver`): 连接管理、命令分发、流式握手、状态轮询
//! - **工具层** (`tools`): 姿态库（TOML）
//! - **客户端层** (`client`): 类型安全的状态机、轨迹生成和固定频率循环
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use prohand_sdk::prelude::*;
//!
//! # fn main() -> Result<(), ControlError> {
//! prohand_sdk::init_logger();
//! let hand = Hand::connect(ProHandBuilder::new())?;
//! let mut hand = hand.enable_streaming(&HandshakeConfig::default())?.into_result()?;
//! let cancel = CancellationToken::new();
//! let loop_config = LoopConfig::new(100.0).with_duration(std::time::Duration::from_secs(5));
//! run_cyclic(&mut hand, &CyclicMotionConfig::default(), &loop_config, &cancel)?;
//! hand.park(std::time::Duration::from_millis(500))?;
//! # Ok(())
//! # }
//! ```

mod logging;
pub mod prelude;

pub use prohand_client as client;
pub use prohand_driver as driver;
pub use prohand_protocol as protocol;
pub use prohand_tools as tools;
pub use prohand_transport as transport;

pub use logging::{init_logger, try_init_logger};

// 客户端层（推荐使用）
pub use prohand_client::{ControlError, Hand, Standby, Streaming, StreamingOutcome};

// 驱动层
pub use prohand_driver::{DriverError, ErrorKind, ProGlove, ProHand, ProHandBuilder};

pub use prohand_protocol::ProtocolError;
pub use prohand_tools::PoseConfigError;
