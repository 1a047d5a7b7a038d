//! # 姿态数据
//!
//! [`Pose`] 是手势序列的最小单元：每根手指 4 个关节角（弧度）加可选的腕部角度。
//! 姿态的存储格式由实现 [`PoseResolver`] 的一方决定，手势序列只依赖查询接口。

use prohand_protocol::{FINGER_COUNT, Finger, JOINTS_PER_FINGER, JointCommand, WRIST_JOINT_COUNT, WristCommand};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// 左手 / 右手
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandSide {
    #[default]
    Left,
    Right,
}

impl HandSide {
    pub const fn name(self) -> &'static str {
        match self {
            HandSide::Left => "left",
            HandSide::Right => "right",
        }
    }
}

impl fmt::Display for HandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HandSide {
    type Err = PoseConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(HandSide::Left),
            "right" | "r" => Ok(HandSide::Right),
            other => Err(PoseConfigError::InvalidSide(other.to_string())),
        }
    }
}

/// 姿态配置错误
#[derive(Error, Debug)]
pub enum PoseConfigError {
    #[error("Failed to read pose config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse pose config: {0}")]
    Parse(String),

    #[error("Pose config has no poses (missing 'hands' section)")]
    MissingHands,

    #[error("Pose '{name}' not found. Available: {}", available.join(", "))]
    UnknownPose { name: String, available: Vec<String> },

    #[error("Malformed pose '{pose}': {reason}")]
    Malformed { pose: String, reason: String },

    #[error("Torque level '{0}' is not defined in torque_map")]
    UnknownTorqueLevel(String),

    #[error("Invalid torque {value} for level '{level}' (expected 0.0..=1.0)")]
    InvalidTorque { level: String, value: f32 },

    #[error("Invalid hand side '{0}' (expected left or right)")]
    InvalidSide(String),
}

/// 单个姿态（弧度）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// 按 thumb, index, middle, ring, pinky 顺序
    pub fingers: [[f32; JOINTS_PER_FINGER]; FINGER_COUNT],
    /// 腕部两个关节；`None` 时发送零位
    pub wrist: Option<[f32; WRIST_JOINT_COUNT]>,
}

impl Pose {
    /// 全零姿态
    pub const fn zero() -> Self {
        Self {
            fingers: [[0.0; JOINTS_PER_FINGER]; FINGER_COUNT],
            wrist: None,
        }
    }

    pub fn finger(&self, finger: Finger) -> [f32; JOINTS_PER_FINGER] {
        self.fingers[finger.index()]
    }

    pub fn with_finger(mut self, finger: Finger, joints: [f32; JOINTS_PER_FINGER]) -> Self {
        self.fingers[finger.index()] = joints;
        self
    }

    pub fn with_wrist(mut self, wrist: [f32; WRIST_JOINT_COUNT]) -> Self {
        self.wrist = Some(wrist);
        self
    }

    /// 转换为 20 关节的手部命令
    pub fn to_joint_command(&self, torque: f32) -> JointCommand {
        let mut command = JointCommand::zero().with_torque(torque);
        for finger in Finger::ALL {
            command.set_finger(finger, self.finger(finger));
        }
        command
    }

    /// 转换为腕部命令（不使用运动规划器）
    pub fn to_wrist_command(&self) -> WristCommand {
        WristCommand::new(self.wrist.unwrap_or([0.0; WRIST_JOINT_COUNT]), false)
    }
}

/// 姿态查询接口
///
/// 手势序列执行前会先解析全部步骤，任何一步失败都不会开始运动。
pub trait PoseResolver {
    fn resolve(&self, name: &str, side: HandSide) -> Result<Pose, PoseConfigError>;
}

impl<R: PoseResolver + ?Sized> PoseResolver for &R {
    fn resolve(&self, name: &str, side: HandSide) -> Result<Pose, PoseConfigError> {
        (**self).resolve(name, side)
    }
}
