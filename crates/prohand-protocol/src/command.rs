//! 命令类型定义
//!
//! - 关节空间命令：[`JointCommand`]（20 个关节角 + 统一力矩）
//! - 执行器空间命令：[`RotaryCommand`] / [`LinearCommand`]
//! - 腕部命令：[`WristCommand`]，以及运动规划限制 [`WristLimits`]
//! - 零位标定：[`CalibrationMask`]
//!
//! 角度单位均为弧度。

use crate::constants::*;
use crate::{ProtocolError, to_array};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 手指（固定顺序：拇指 → 小指）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Finger {
    Thumb = 0,
    Index = 1,
    Middle = 2,
    Ring = 3,
    Pinky = 4,
}

impl Finger {
    /// 规范顺序
    pub const ALL: [Finger; FINGER_COUNT] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// 索引（0-4）
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 从索引构造
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Finger::Thumb),
            1 => Some(Finger::Index),
            2 => Some(Finger::Middle),
            3 => Some(Finger::Ring),
            4 => Some(Finger::Pinky),
            _ => None,
        }
    }

    /// 配置文件中使用的名称
    pub const fn name(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }

    /// 从名称解析（大小写不敏感）
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|finger| finger.name().eq_ignore_ascii_case(name))
    }

    pub const fn is_thumb(self) -> bool {
        matches!(self, Finger::Thumb)
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 手指内的关节（从掌侧到指尖）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FingerJoint {
    /// 掌指关节（非拇指手指上负责外展）
    Metacarpal = 0,
    Proximal = 1,
    Intermediate = 2,
    Distal = 3,
}

impl FingerJoint {
    pub const ALL: [FingerJoint; JOINTS_PER_FINGER] = [
        FingerJoint::Metacarpal,
        FingerJoint::Proximal,
        FingerJoint::Intermediate,
        FingerJoint::Distal,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(FingerJoint::Metacarpal),
            1 => Some(FingerJoint::Proximal),
            2 => Some(FingerJoint::Intermediate),
            3 => Some(FingerJoint::Distal),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FingerJoint::Metacarpal => "metacarpal",
            FingerJoint::Proximal => "proximal",
            FingerJoint::Intermediate => "intermediate",
            FingerJoint::Distal => "distal",
        }
    }
}

impl fmt::Display for FingerJoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 规范布局下的扁平索引：`finger * 4 + joint`
pub const fn joint_index(finger: Finger, joint: FingerJoint) -> usize {
    finger.index() * JOINTS_PER_FINGER + joint.index()
}

fn check_finite(field: &'static str, values: &[f32]) -> Result<(), ProtocolError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ProtocolError::InvalidValue {
            field,
            value: format!("non-finite value at index {}: {}", i, values[i]),
        }),
        None => Ok(()),
    }
}

/// 关节空间命令
///
/// 20 个关节角（弧度），按 {thumb, index, middle, ring, pinky} × {metacarpal, proximal,
/// intermediate, distal} 的规范顺序排列，外加一个统一施加的归一化力矩（0.0-1.0）。
///
/// 长度不变式由类型保证（`[f32; 20]`），从切片构造时长度不符直接报错。
///
/// # 示例
///
/// ```rust
/// use prohand_protocol::{Finger, FingerJoint, JointCommand};
///
/// let mut cmd = JointCommand::zero();
/// cmd.set_joint(Finger::Index, FingerJoint::Proximal, 0.5);
/// assert_eq!(cmd.joint(Finger::Index, FingerJoint::Proximal), 0.5);
///
/// assert!(JointCommand::from_slice(&[0.0; 19], 0.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointCommand {
    positions: [f32; HAND_JOINT_COUNT],
    torque: f32,
}

impl JointCommand {
    pub const fn new(positions: [f32; HAND_JOINT_COUNT], torque: f32) -> Self {
        Self { positions, torque }
    }

    /// 从任意长度切片构造（长度必须为 20）
    pub fn from_slice(positions: &[f32], torque: f32) -> Result<Self, ProtocolError> {
        Ok(Self::new(to_array("hand positions", positions)?, torque))
    }

    /// 全零位置、零力矩
    pub const fn zero() -> Self {
        Self::new([0.0; HAND_JOINT_COUNT], 0.0)
    }

    pub fn positions(&self) -> &[f32; HAND_JOINT_COUNT] {
        &self.positions
    }

    pub fn torque(&self) -> f32 {
        self.torque
    }

    pub fn with_torque(mut self, torque: f32) -> Self {
        self.torque = torque;
        self
    }

    pub fn joint(&self, finger: Finger, joint: FingerJoint) -> f32 {
        self.positions[joint_index(finger, joint)]
    }

    pub fn set_joint(&mut self, finger: Finger, joint: FingerJoint, value: f32) {
        self.positions[joint_index(finger, joint)] = value;
    }

    /// 单根手指的 4 个关节角
    pub fn finger(&self, finger: Finger) -> [f32; JOINTS_PER_FINGER] {
        let start = finger.index() * JOINTS_PER_FINGER;
        let mut out = [0.0; JOINTS_PER_FINGER];
        out.copy_from_slice(&self.positions[start..start + JOINTS_PER_FINGER]);
        out
    }

    pub fn set_finger(&mut self, finger: Finger, values: [f32; JOINTS_PER_FINGER]) {
        let start = finger.index() * JOINTS_PER_FINGER;
        self.positions[start..start + JOINTS_PER_FINGER].copy_from_slice(&values);
    }

    /// 发送前校验：所有值有限，力矩位于 [0, 1]
    pub fn validate(&self) -> Result<(), ProtocolError> {
        check_finite("hand positions", &self.positions)?;
        if !(0.0..=1.0).contains(&self.torque) {
            return Err(ProtocolError::InvalidValue {
                field: "hand torque",
                value: self.torque.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for JointCommand {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<&[f32]> for JointCommand {
    type Error = ProtocolError;

    /// 仅位置，力矩为 0
    fn try_from(positions: &[f32]) -> Result<Self, Self::Error> {
        Self::from_slice(positions, 0.0)
    }
}

/// 腕部命令：2 个关节角 + 是否启用远端运动规划（速度 / 加速度 / jerk 限制）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WristCommand {
    pub positions: [f32; WRIST_JOINT_COUNT],
    pub use_profiler: bool,
}

impl WristCommand {
    pub const fn new(positions: [f32; WRIST_JOINT_COUNT], use_profiler: bool) -> Self {
        Self {
            positions,
            use_profiler,
        }
    }

    pub fn from_slice(positions: &[f32], use_profiler: bool) -> Result<Self, ProtocolError> {
        Ok(Self::new(to_array("wrist positions", positions)?, use_profiler))
    }

    pub const fn zero() -> Self {
        Self::new([0.0; WRIST_JOINT_COUNT], false)
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        check_finite("wrist positions", &self.positions)
    }
}

/// 执行器空间：16 个旋转执行器的位置与力矩
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RotaryCommand {
    pub positions: [f32; ROTARY_JOINT_COUNT],
    pub torques: [f32; ROTARY_JOINT_COUNT],
}

impl RotaryCommand {
    pub const fn new(
        positions: [f32; ROTARY_JOINT_COUNT],
        torques: [f32; ROTARY_JOINT_COUNT],
    ) -> Self {
        Self { positions, torques }
    }

    pub fn from_slices(positions: &[f32], torques: &[f32]) -> Result<Self, ProtocolError> {
        Ok(Self::new(
            to_array("rotary positions", positions)?,
            to_array("rotary torques", torques)?,
        ))
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        check_finite("rotary positions", &self.positions)?;
        check_finite("rotary torques", &self.torques)
    }
}

/// 执行器空间：2 个直线执行器的位置与速度
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearCommand {
    pub positions: [f32; LINEAR_JOINT_COUNT],
    pub speeds: [f32; LINEAR_JOINT_COUNT],
}

impl LinearCommand {
    pub const fn new(
        positions: [f32; LINEAR_JOINT_COUNT],
        speeds: [f32; LINEAR_JOINT_COUNT],
    ) -> Self {
        Self { positions, speeds }
    }

    pub fn from_slices(positions: &[f32], speeds: &[f32]) -> Result<Self, ProtocolError> {
        Ok(Self::new(
            to_array("linear positions", positions)?,
            to_array("linear speeds", speeds)?,
        ))
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        check_finite("linear positions", &self.positions)?;
        check_finite("linear speeds", &self.speeds)
    }
}

/// 零位标定掩码：`true` 表示对应旋转执行器参与标定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalibrationMask(pub [bool; CALIBRATION_MASK_LEN]);

impl CalibrationMask {
    /// 所有执行器参与标定
    pub const fn all() -> Self {
        Self([true; CALIBRATION_MASK_LEN])
    }

    pub fn from_slice(mask: &[bool]) -> Result<Self, ProtocolError> {
        Ok(Self(to_array("calibration mask", mask)?))
    }

    /// 参与标定的执行器数量
    pub fn count(&self) -> usize {
        self.0.iter().filter(|selected| **selected).count()
    }
}

/// 腕部运动规划限制（需要驱动端编译了运动规划器）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WristLimits {
    pub max_velocity: [f32; WRIST_JOINT_COUNT],
    pub max_acceleration: [f32; WRIST_JOINT_COUNT],
    pub max_jerk: [f32; WRIST_JOINT_COUNT],
}

impl WristLimits {
    pub fn from_slices(
        max_velocity: &[f32],
        max_acceleration: &[f32],
        max_jerk: &[f32],
    ) -> Result<Self, ProtocolError> {
        Ok(Self {
            max_velocity: to_array("wrist max velocity", max_velocity)?,
            max_acceleration: to_array("wrist max acceleration", max_acceleration)?,
            max_jerk: to_array("wrist max jerk", max_jerk)?,
        })
    }

    /// 限制值必须为正的有限数
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let groups = [
            ("wrist max velocity", &self.max_velocity),
            ("wrist max acceleration", &self.max_acceleration),
            ("wrist max jerk", &self.max_jerk),
        ];
        for (field, values) in groups {
            check_finite(field, values)?;
            if let Some(v) = values.iter().find(|v| **v <= 0.0) {
                return Err(ProtocolError::InvalidValue {
                    field,
                    value: v.to_string(),
                });
            }
        }
        Ok(())
    }
}
