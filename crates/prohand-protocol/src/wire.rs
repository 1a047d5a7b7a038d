//! 线上消息定义与二进制编解码
//!
//! 三类消息分别对应三种通道：
//!
//! ```text
//! 命令通道（REQ/REP）  : Request  → Reply
//! 流式通道（PUB/SUB）  : StreamMessage（单向，无应答）
//! 状态通道（PUB/SUB）  : StatusMessage（驱动进程 → 客户端）
//! ```
//!
//! 编码使用 bincode（定长小端），编解码失败映射为 [`ProtocolError`]。

use crate::ProtocolError;
use crate::command::*;
use crate::feedback::HandStatus;
use crate::tactile::TactileFrame;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// 驱动进程返回的结果码
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum ResultCode {
    Success = 0,
    Null = -1,
    Connection = -2,
    InvalidArgument = -3,
    NotConnected = -4,
    Unsupported = -5,
    Other = -99,
}

/// 可靠通道请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    Ping,
    SetStreamingMode { enabled: bool },
    Rotary(RotaryCommand),
    Linear(LinearCommand),
    Wrist(WristCommand),
    Hand(JointCommand),
    ZeroCalibration(CalibrationMask),
    SetWristLimits(WristLimits),
}

impl Request {
    /// 用于日志的操作名
    pub fn name(&self) -> &'static str {
        match self {
            Request::Ping => "ping",
            Request::SetStreamingMode { .. } => "set_streaming_mode",
            Request::Rotary(_) => "send_rotary_command",
            Request::Linear(_) => "send_linear_command",
            Request::Wrist(_) => "send_wrist_command",
            Request::Hand(_) => "send_hand_command",
            Request::ZeroCalibration(_) => "send_zero_calibration",
            Request::SetWristLimits(_) => "set_wrist_limits",
        }
    }
}

/// 可靠通道应答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// 原始结果码（未知结果码也原样保留）
    pub code: i32,
    pub message: Option<String>,
}

impl Reply {
    pub fn success() -> Self {
        Self {
            code: ResultCode::Success.into(),
            message: None,
        }
    }

    pub fn error(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: Some(message.into()),
        }
    }

    /// 已知结果码；未知值返回 `None`
    pub fn result_code(&self) -> Option<ResultCode> {
        ResultCode::try_from(self.code).ok()
    }

    pub fn is_success(&self) -> bool {
        self.code == i32::from(ResultCode::Success)
    }
}

/// 流式通道消息（手部流与腕部流共用同一枚举，按端点分发）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamMessage {
    Rotary(RotaryCommand),
    Linear(LinearCommand),
    Wrist(WristCommand),
    Hand(JointCommand),
}

impl StreamMessage {
    pub fn name(&self) -> &'static str {
        match self {
            StreamMessage::Rotary(_) => "send_rotary_stream",
            StreamMessage::Linear(_) => "send_linear_stream",
            StreamMessage::Wrist(_) => "send_wrist_stream",
            StreamMessage::Hand(_) => "send_hand_stream",
        }
    }
}

/// 状态通道消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatusMessage {
    Hand(HandStatus),
    Tactile(TactileFrame),
}

/// 线上消息的编解码
pub trait WireMessage: Serialize + DeserializeOwned {
    fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serialize(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        bincode::deserialize(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

impl WireMessage for Request {}
impl WireMessage for Reply {}
impl WireMessage for StreamMessage {}
impl WireMessage for StatusMessage {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::RunState;

    #[test]
    fn test_result_code_values() {
        assert_eq!(i32::from(ResultCode::Success), 0);
        assert_eq!(i32::from(ResultCode::Null), -1);
        assert_eq!(i32::from(ResultCode::Unsupported), -5);
        assert_eq!(i32::from(ResultCode::Other), -99);
        assert_eq!(ResultCode::try_from(-4).unwrap(), ResultCode::NotConnected);
        assert!(ResultCode::try_from(-7).is_err());
    }

    #[test]
    fn test_reply_helpers() {
        assert!(Reply::success().is_success());
        let reply = Reply::error(ResultCode::Unsupported, "profiler disabled");
        assert!(!reply.is_success());
        assert_eq!(reply.result_code(), Some(ResultCode::Unsupported));

        let unknown = Reply {
            code: 42,
            message: None,
        };
        assert_eq!(unknown.result_code(), None);
    }

    #[test]
    fn test_hand_request_survives_codec() {
        let mut positions = [0.0f32; 20];
        positions[5] = 1.25;
        let request = Request::Hand(JointCommand::new(positions, 0.45));
        let bytes = request.encode().unwrap();
        assert_eq!(Request::decode(&bytes).unwrap(), request);
    }

    #[test]
    fn test_status_message_survives_codec() {
        let msg = StatusMessage::Hand(HandStatus::linear([0.5, 0.25], RunState::Running));
        let bytes = msg.encode().unwrap();
        assert_eq!(StatusMessage::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let err = Request::decode(&[0xff, 0xff, 0xff, 0xff, 0x01]).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
        assert!(StreamMessage::decode(&[]).is_err());
    }

    #[test]
    fn test_request_names() {
        assert_eq!(Request::Ping.name(), "ping");
        assert_eq!(
            Request::SetStreamingMode { enabled: true }.name(),
            "set_streaming_mode"
        );
        assert_eq!(
            Request::ZeroCalibration(CalibrationMask::all()).name(),
            "send_zero_calibration"
        );
    }
}
