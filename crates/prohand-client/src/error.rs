//! 客户端层错误类型

use prohand_driver::{DriverError, ErrorKind};
use prohand_tools::PoseConfigError;
use std::time::Duration;
use thiserror::Error;

/// 控制错误
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Pose configuration error: {0}")]
    Pose(#[from] PoseConfigError),

    /// 参数或配置非法（频率、时长等），在任何发送之前报告
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 驱动在超时内没有确认流式模式
    #[error("Streaming mode not confirmed within {timeout_ms}ms")]
    StreamingNotConfirmed { timeout_ms: u64 },

    /// 连续发送失败超过阈值
    #[error("Consecutive streaming failures: {count}, last error: {last_error}")]
    ConsecutiveFailures {
        count: u32,
        #[source]
        last_error: Box<DriverError>,
    },

    /// 客户端已在状态转换中被取走
    #[error("Hand was already released, cannot execute commands")]
    Released,
}

impl ControlError {
    pub(crate) fn not_confirmed(timeout: Duration) -> Self {
        ControlError::StreamingNotConfirmed {
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// 底层驱动错误类别（非驱动错误返回 `None`）
    pub fn driver_kind(&self) -> Option<ErrorKind> {
        match self {
            ControlError::Driver(e) => Some(e.kind()),
            ControlError::ConsecutiveFailures { last_error, .. } => Some(last_error.kind()),
            ControlError::StreamingNotConfirmed { .. } => Some(ErrorKind::Timeout),
            _ => None,
        }
    }

    /// 面向命令行用户的修正建议
    pub fn hint(&self) -> &'static str {
        match self {
            ControlError::Driver(e) => e.hint(),
            ControlError::ConsecutiveFailures { last_error, .. } => last_error.hint(),
            ControlError::Pose(_) => "check the pose configuration file and the gesture names",
            ControlError::InvalidConfig(_) => "check the command-line arguments",
            ControlError::StreamingNotConfirmed { .. } => {
                "the driver may be busy, the device may be disconnected, or it is not in Running state"
            },
            ControlError::Released => "reconnect to obtain a new hand handle",
        }
    }
}
