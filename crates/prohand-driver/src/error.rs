//! 驱动层错误类型定义

use prohand_protocol::{ProtocolError, Reply, ResultCode};
use prohand_transport::TransportError;
use thiserror::Error;

/// 错误类别（不携带诊断信息，便于调用方分支处理）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NullHandle,
    Connection,
    InvalidArgument,
    NotConnected,
    Unsupported,
    Timeout,
    Unknown,
}

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 客户端已关闭或未初始化
    #[error("Client handle is closed or uninitialized")]
    NullHandle,

    /// 传输层失败
    #[error("Connection error: {0}")]
    Connection(String),

    /// 载荷形状 / 取值非法（发送前检出）
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 流式操作缺少流式端点，或握手未确认运行状态
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// 驱动端未编译对应功能
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// 可靠通道调用超时
    #[error("Operation timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// 线上消息编解码失败
    #[error("Protocol error: {0}")]
    Protocol(ProtocolError),

    /// 未映射的远端结果码
    #[error("Unknown error (code {code}): {message}")]
    Unknown { code: i32, message: String },
}

impl DriverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::NullHandle => ErrorKind::NullHandle,
            DriverError::Connection(_) => ErrorKind::Connection,
            DriverError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            DriverError::NotConnected(_) => ErrorKind::NotConnected,
            DriverError::Unsupported(_) => ErrorKind::Unsupported,
            DriverError::Timeout { .. } => ErrorKind::Timeout,
            DriverError::Protocol(_) | DriverError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// 是否值得重试
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Connection | ErrorKind::Timeout)
    }

    /// 给终端用户的修正建议
    pub fn hint(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NullHandle => "the client was closed; create a new connection",
            ErrorKind::Connection => {
                "check that the driver process is running and the endpoints are correct"
            },
            ErrorKind::InvalidArgument => "check command array lengths and value ranges",
            ErrorKind::NotConnected => {
                "configure streaming endpoints and enable streaming mode before streaming"
            },
            ErrorKind::Unsupported => "the driver was built without this feature",
            ErrorKind::Timeout => "the driver did not answer in time; check that it is running",
            ErrorKind::Unknown => "unexpected driver response; check the driver logs",
        }
    }

    /// 将远端应答映射为结果
    pub fn check_reply(reply: &Reply) -> Result<(), DriverError> {
        let message = reply.message.clone().unwrap_or_default();
        match reply.result_code() {
            Some(ResultCode::Success) => Ok(()),
            Some(ResultCode::Null) => Err(DriverError::NullHandle),
            Some(ResultCode::Connection) => Err(DriverError::Connection(message)),
            Some(ResultCode::InvalidArgument) => Err(DriverError::InvalidArgument(message)),
            Some(ResultCode::NotConnected) => Err(DriverError::NotConnected(message)),
            Some(ResultCode::Unsupported) => Err(DriverError::Unsupported(message)),
            Some(ResultCode::Other) | None => Err(DriverError::Unknown {
                code: reply.code,
                message,
            }),
        }
    }
}

impl From<ProtocolError> for DriverError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::InvalidLength { .. } | ProtocolError::InvalidValue { .. } => {
                DriverError::InvalidArgument(e.to_string())
            },
            ProtocolError::Encode(_) | ProtocolError::Decode(_) => DriverError::Protocol(e),
        }
    }
}

impl From<TransportError> for DriverError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout { timeout_ms } => DriverError::Timeout { timeout_ms },
            other => DriverError::Connection(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试 DriverError 的 Display 实现
    #[test]
    fn test_driver_error_display() {
        let msg = DriverError::NullHandle.to_string();
        assert_eq!(msg, "Client handle is closed or uninitialized");

        let msg = DriverError::InvalidArgument("hand positions".to_string()).to_string();
        assert!(msg.contains("Invalid argument") && msg.contains("hand positions"));

        let msg = DriverError::Timeout { timeout_ms: 1000 }.to_string();
        assert_eq!(msg, "Operation timed out after 1000 ms");

        let msg = DriverError::Unknown {
            code: -42,
            message: "boom".to_string(),
        }
        .to_string();
        assert!(msg.contains("-42") && msg.contains("boom"));
    }

    /// 测试结果码到错误的 1:1 映射
    #[test]
    fn test_check_reply_mapping() {
        assert!(DriverError::check_reply(&Reply::success()).is_ok());

        let cases = [
            (ResultCode::Null, ErrorKind::NullHandle),
            (ResultCode::Connection, ErrorKind::Connection),
            (ResultCode::InvalidArgument, ErrorKind::InvalidArgument),
            (ResultCode::NotConnected, ErrorKind::NotConnected),
            (ResultCode::Unsupported, ErrorKind::Unsupported),
            (ResultCode::Other, ErrorKind::Unknown),
        ];
        for (code, kind) in cases {
            let err = DriverError::check_reply(&Reply::error(code, "x")).unwrap_err();
            assert_eq!(err.kind(), kind, "{:?}", code);
        }

        // 未知结果码保留原值
        let reply = Reply {
            code: -17,
            message: None,
        };
        match DriverError::check_reply(&reply) {
            Err(DriverError::Unknown { code, .. }) => assert_eq!(code, -17),
            other => panic!("Expected Unknown, got {:?}", other),
        }
    }

    /// 测试 From<ProtocolError> 转换
    #[test]
    fn test_from_protocol_error() {
        let err: DriverError = ProtocolError::InvalidLength {
            field: "hand positions",
            expected: 20,
            actual: 19,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err: DriverError = ProtocolError::Decode("eof".to_string()).into();
        assert!(matches!(err, DriverError::Protocol(_)));
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    /// 测试 From<TransportError> 转换
    #[test]
    fn test_from_transport_error() {
        let err: DriverError = TransportError::Timeout { timeout_ms: 250 }.into();
        assert!(matches!(err, DriverError::Timeout { timeout_ms: 250 }));
        assert!(err.is_retryable());

        let err: DriverError = TransportError::Closed.into();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(!DriverError::NullHandle.is_retryable());
        assert!(!err.hint().is_empty());
    }
}
