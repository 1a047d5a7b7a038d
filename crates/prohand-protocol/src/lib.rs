//! # ProHand Protocol
//!
//! 灵巧手 / 触觉手套与驱动进程之间的数据模型与消息编码（无 I/O 依赖）
//!
//! ## 模块
//!
//! - `constants`: 关节数量、触觉点数量等协议常量
//! - `command`: 命令类型（关节空间 / 执行器空间 / 腕部 / 标定）
//! - `feedback`: 驱动进程发布的手部状态
//! - `tactile`: 手套触觉采样与静态 taxel 布局
//! - `wire`: 请求 / 应答 / 流式消息的二进制编解码
//!
//! 所有定长数组在构造时校验长度，长度不符返回 [`ProtocolError::InvalidLength`]，
//! 不做任何截断或补齐。

pub mod command;
pub mod constants;
pub mod feedback;
pub mod tactile;
pub mod wire;

// 重新导出常用类型
pub use command::*;
pub use constants::*;
pub use feedback::*;
pub use tactile::*;
pub use wire::*;

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid length for {field}: expected {expected}, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// 校验切片长度并拷贝为定长数组
pub(crate) fn to_array<T: Copy + Default, const N: usize>(
    field: &'static str,
    values: &[T],
) -> Result<[T; N], ProtocolError> {
    if values.len() != N {
        return Err(ProtocolError::InvalidLength {
            field,
            expected: N,
            actual: values.len(),
        });
    }
    let mut out = [T::default(); N];
    out.copy_from_slice(values);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_array_exact_length() {
        let arr: [f32; 3] = to_array("values", &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(arr, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_to_array_rejects_mismatch() {
        let err = to_array::<f32, 4>("values", &[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidLength {
                field: "values",
                expected: 4,
                actual: 2
            }
        );
        assert_eq!(
            err.to_string(),
            "Invalid length for values: expected 4, got 2"
        );
    }
}
