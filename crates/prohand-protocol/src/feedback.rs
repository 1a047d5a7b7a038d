//! 状态反馈类型
//!
//! 驱动进程在状态通道上周期性发布 [`HandStatus`]，客户端只读。

use crate::constants::*;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// 状态样本的类型判别
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    TryFromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum StatusKind {
    #[default]
    Unknown = 0,
    Rotary = 1,
    Linear = 2,
}

/// 驱动进程的运行状态
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    TryFromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum RunState {
    /// 空闲（只接受可靠通道命令）
    #[default]
    Idle = 0,
    /// 流式模式运行中
    Running = 1,
    /// 故障
    Fault = 2,
}

/// 手部状态样本
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandStatus {
    pub is_valid: bool,
    pub kind: StatusKind,
    pub run_state: RunState,
    pub rotary_positions: [f32; ROTARY_JOINT_COUNT],
    pub linear_positions: [f32; LINEAR_JOINT_COUNT],
}

impl HandStatus {
    /// 旋转执行器样本
    pub fn rotary(positions: [f32; ROTARY_JOINT_COUNT], run_state: RunState) -> Self {
        Self {
            is_valid: true,
            kind: StatusKind::Rotary,
            run_state,
            rotary_positions: positions,
            linear_positions: [0.0; LINEAR_JOINT_COUNT],
        }
    }

    /// 直线执行器样本
    pub fn linear(positions: [f32; LINEAR_JOINT_COUNT], run_state: RunState) -> Self {
        Self {
            is_valid: true,
            kind: StatusKind::Linear,
            run_state,
            rotary_positions: [0.0; ROTARY_JOINT_COUNT],
            linear_positions: positions,
        }
    }

    /// 该样本是否表明驱动已进入流式运行状态
    ///
    /// 需要同时满足：样本有效、类型已知、运行状态为 `Running`。
    pub fn indicates_running(&self) -> bool {
        self.is_valid
            && matches!(self.kind, StatusKind::Rotary | StatusKind::Linear)
            && self.run_state == RunState::Running
    }
}
