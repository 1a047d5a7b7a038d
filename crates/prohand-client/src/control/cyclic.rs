//! 周期运动轨迹
//!
//! [`cyclic_positions`] 是时间的纯函数：相同的 `t` 和参数总是得到逐位相同的输出。
//!
//! - 手指基础相位 `(finger / 5) * 2π`，形成跨手指的行波
//! - 关节相位偏移 `joint * 0.4`，沿手指传播
//! - 关节角 `0.5 * (1 + sin(2π f t + joint_offset + finger_phase)) * max_deg * amplitude`
//! - 腕部每个周期 `T = 1 / f` 切换一次活动关节，另一个关节保持 0
//!
//! 公式按角度计算，输出为弧度。

use crate::control::guard::StreamGuard;
use crate::control::{CancellationToken, LoopConfig, LoopControl, RunSummary, run_fixed_rate};
use crate::error::ControlError;
use crate::state::{Hand, Streaming};
use prohand_protocol::{
    FINGER_COUNT, Finger, FingerJoint, HAND_JOINT_COUNT, JOINTS_PER_FINGER, JointCommand,
    WRIST_JOINT_COUNT, WristCommand, joint_index,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::info;

/// 相邻关节之间的相位偏移（弧度）
pub const JOINT_PHASE_STEP: f64 = 0.4;

/// 周期运动参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CyclicMotionConfig {
    /// 运动频率（Hz）
    pub frequency_hz: f64,
    /// 幅值缩放（0.0 - 1.0）
    pub amplitude_scale: f64,
    pub include_thumb: bool,
    pub exclude_wrist: bool,
    /// 非拇指手指的掌骨关节（外展）是否参与运动
    pub include_abduction: bool,
    /// 统一力矩（0.0 - 1.0）
    pub torque: f32,
    /// 每个关节位置的最大角度（metacarpal, proximal, intermediate, distal）
    pub finger_max_deg: [f64; JOINTS_PER_FINGER],
    pub wrist_max_deg: [f64; WRIST_JOINT_COUNT],
}

impl Default for CyclicMotionConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 0.5,
            amplitude_scale: 0.8,
            include_thumb: false,
            exclude_wrist: false,
            include_abduction: false,
            torque: 1.0,
            finger_max_deg: [90.0; JOINTS_PER_FINGER],
            wrist_max_deg: [30.0, 65.0],
        }
    }
}

impl CyclicMotionConfig {
    pub fn validate(&self) -> Result<(), ControlError> {
        if !self.frequency_hz.is_finite() || self.frequency_hz <= 0.0 {
            return Err(ControlError::InvalidConfig(format!(
                "frequency must be positive, got {}",
                self.frequency_hz
            )));
        }
        if !self.amplitude_scale.is_finite() || self.amplitude_scale < 0.0 {
            return Err(ControlError::InvalidConfig(format!(
                "amplitude scale must be non-negative, got {}",
                self.amplitude_scale
            )));
        }
        if !(0.0..=1.0).contains(&self.torque) {
            return Err(ControlError::InvalidConfig(format!(
                "torque must be within 0.0..=1.0, got {}",
                self.torque
            )));
        }
        let mut limits = self.finger_max_deg.iter().chain(self.wrist_max_deg.iter());
        if limits.any(|deg| !deg.is_finite()) {
            return Err(ControlError::InvalidConfig(
                "joint limits must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// 主相位（角度，0 - 360）
    pub fn phase_deg(&self, t: f64) -> f64 {
        (TAU * self.frequency_hz * t).to_degrees().rem_euclid(360.0)
    }
}

/// 计算 `t` 秒时的手部和腕部命令
///
/// `include_thumb = false` 时只清零拇指的 1 - 3 号关节，0 号关节保持运动。
pub fn cyclic_positions(t: f64, config: &CyclicMotionConfig) -> (JointCommand, WristCommand) {
    let mut positions = [0.0f32; HAND_JOINT_COUNT];

    for finger in Finger::ALL {
        let finger_phase = finger.index() as f64 / FINGER_COUNT as f64 * TAU;
        for joint in FingerJoint::ALL {
            let j = joint.index();
            if !config.include_abduction && j == 0 && !finger.is_thumb() {
                continue;
            }
            if !config.include_thumb && finger.is_thumb() && j != 0 {
                continue;
            }
            let phase = TAU * config.frequency_hz * t + j as f64 * JOINT_PHASE_STEP + finger_phase;
            let s01 = 0.5 + 0.5 * phase.sin();
            let deg = s01 * config.finger_max_deg[j] * config.amplitude_scale;
            positions[joint_index(finger, joint)] = deg.to_radians() as f32;
        }
    }

    (
        JointCommand::new(positions, config.torque),
        WristCommand::new(wrist_positions(t, config), false),
    )
}

fn wrist_positions(t: f64, config: &CyclicMotionConfig) -> [f32; WRIST_JOINT_COUNT] {
    let mut out = [0.0f32; WRIST_JOINT_COUNT];
    if config.exclude_wrist {
        return out;
    }
    let period = 1.0 / config.frequency_hz.max(1e-6);
    let active = ((t / period).floor() as i64).rem_euclid(2) as usize;
    let local = TAU * (t.rem_euclid(period) / period);
    let deg = local.sin() * config.wrist_max_deg[active] * config.amplitude_scale;
    out[active] = deg.to_radians() as f32;
    out
}

/// 以固定频率流式发送周期运动
///
/// 每帧先发手部再发腕部。不负责回零，调用方随后使用 [`Hand::park`]。
pub fn run_cyclic(
    hand: &mut Hand<Streaming>,
    config: &CyclicMotionConfig,
    loop_config: &LoopConfig,
    cancel: &CancellationToken,
) -> Result<RunSummary, ControlError> {
    config.validate()?;
    loop_config.validate()?;
    let clock = hand.clock()?;
    let report_every = (loop_config.publish_hz.round() as u64).max(1);
    let mut guard = StreamGuard::new();

    info!(
        "Running cyclic motion: {} Hz, amplitude {}, publish {} Hz",
        config.frequency_hz, config.amplitude_scale, loop_config.publish_hz
    );

    run_fixed_rate(clock.as_ref(), loop_config, cancel, |tick| {
        let t = tick.elapsed.as_secs_f64();
        let (joint, wrist) = cyclic_positions(t, config);
        let sent = hand
            .stream_hand(&joint)
            .and_then(|()| hand.stream_wrist(&wrist));
        guard.record(sent)?;

        if tick.index > 0 && tick.index % report_every == 0 {
            info!("[{:6.2}s] Running... (phase: {:.1}°)", t, config.phase_deg(t));
        }
        Ok(LoopControl::Continue)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::streaming;
    use proptest::prelude::*;
    use prohand_protocol::StreamMessage;
    use std::time::Duration;

    #[test]
    fn test_index_metacarpal_scenario() {
        let config = CyclicMotionConfig {
            include_abduction: true,
            ..CyclicMotionConfig::default()
        };
        let (joint, _) = cyclic_positions(1.0, &config);
        let angle = joint.joint(Finger::Index, FingerJoint::Metacarpal);
        // phase = π + 2π/5 ≈ 4.398，s01 ≈ 0.0245，角度 ≈ 1.76° ≈ 0.0308 rad
        assert!((angle - 0.0309).abs() < 1e-3, "angle = {}", angle);
    }

    #[test]
    fn test_defaults() {
        let config = CyclicMotionConfig::default();
        assert_eq!(config.frequency_hz, 0.5);
        assert_eq!(config.amplitude_scale, 0.8);
        assert!(!config.include_thumb);
        assert!(!config.exclude_wrist);
        assert!(!config.include_abduction);
        assert_eq!(config.torque, 1.0);
        assert_eq!(config.wrist_max_deg, [30.0, 65.0]);
    }

    #[test]
    fn test_thumb_joint0_still_moves_when_thumb_excluded() {
        // 已知行为：排除拇指时 0 号关节不清零
        let (joint, _) = cyclic_positions(0.0, &CyclicMotionConfig::default());
        let thumb = joint.finger(Finger::Thumb);
        assert!(thumb[0] > 0.0);
        assert_eq!(&thumb[1..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_wrist_alternates_every_period() {
        let config = CyclicMotionConfig::default(); // T = 2s
        let (_, first) = cyclic_positions(0.5, &config);
        assert!(first.positions[0] > 0.0);
        assert_eq!(first.positions[1], 0.0);

        let (_, second) = cyclic_positions(2.5, &config);
        assert_eq!(second.positions[0], 0.0);
        assert!(second.positions[1] > 0.0);

        // 第二个关节幅值：65° * 0.8 = 52°
        let expected = (65.0f64 * 0.8).to_radians() as f32;
        assert!((second.positions[1] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let bad = [
            CyclicMotionConfig {
                frequency_hz: 0.0,
                ..CyclicMotionConfig::default()
            },
            CyclicMotionConfig {
                amplitude_scale: f64::NAN,
                ..CyclicMotionConfig::default()
            },
            CyclicMotionConfig {
                torque: 1.5,
                ..CyclicMotionConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(ControlError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_run_cyclic_streams_each_tick() {
        let (mut hand, sim, _clock) = streaming();
        let before = sim.streamed().len();
        let loop_config = LoopConfig::new(100.0).with_duration(Duration::from_millis(500));

        let summary = run_cyclic(
            &mut hand,
            &CyclicMotionConfig::default(),
            &loop_config,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(summary.ticks, 50);

        let all = sim.streamed();
        let streamed = &all[before..];
        assert_eq!(streamed.len(), 100);
        assert!(matches!(streamed[0], StreamMessage::Hand(_)));
        assert!(matches!(streamed[1], StreamMessage::Wrist(_)));
        hand.park(Duration::ZERO).unwrap();
    }

    #[test]
    fn test_run_cyclic_cancelled_then_parked() {
        let (mut hand, sim, _clock) = streaming();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let summary = run_cyclic(
            &mut hand,
            &CyclicMotionConfig::default(),
            &LoopConfig::new(100.0),
            &cancel,
        )
        .unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.ticks, 0);

        hand.park(Duration::ZERO).unwrap();
        let streamed = sim.streamed();
        assert_eq!(
            streamed.last(),
            Some(&StreamMessage::Hand(JointCommand::zero()))
        );
    }

    fn config_strategy() -> impl Strategy<Value = CyclicMotionConfig> {
        (
            0.05f64..5.0,
            0.0f64..1.0,
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(
                |(frequency_hz, amplitude_scale, include_thumb, exclude_wrist, include_abduction)| {
                    CyclicMotionConfig {
                        frequency_hz,
                        amplitude_scale,
                        include_thumb,
                        exclude_wrist,
                        include_abduction,
                        ..CyclicMotionConfig::default()
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn prop_deterministic(t in 0.0f64..1000.0, config in config_strategy()) {
            let (a_joint, a_wrist) = cyclic_positions(t, &config);
            let (b_joint, b_wrist) = cyclic_positions(t, &config);
            let a_bits: Vec<u32> = a_joint.positions().iter().map(|v| v.to_bits()).collect();
            let b_bits: Vec<u32> = b_joint.positions().iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(a_bits, b_bits);
            prop_assert_eq!(a_wrist.positions[0].to_bits(), b_wrist.positions[0].to_bits());
            prop_assert_eq!(a_wrist.positions[1].to_bits(), b_wrist.positions[1].to_bits());
        }

        #[test]
        fn prop_abduction_excluded_is_zero(t in 0.0f64..1000.0, config in config_strategy()) {
            let config = CyclicMotionConfig { include_abduction: false, ..config };
            let (joint, _) = cyclic_positions(t, &config);
            for finger in Finger::ALL.into_iter().filter(|f| !f.is_thumb()) {
                prop_assert_eq!(joint.joint(finger, FingerJoint::Metacarpal), 0.0);
            }
        }

        #[test]
        fn prop_thumb_excluded_joints_zero(t in 0.0f64..1000.0, config in config_strategy()) {
            let config = CyclicMotionConfig { include_thumb: false, ..config };
            let (joint, _) = cyclic_positions(t, &config);
            let thumb = joint.finger(Finger::Thumb);
            prop_assert_eq!(thumb[1], 0.0);
            prop_assert_eq!(thumb[2], 0.0);
            prop_assert_eq!(thumb[3], 0.0);
        }

        #[test]
        fn prop_wrist_single_active_joint(t in 0.0f64..1000.0, config in config_strategy()) {
            let (_, wrist) = cyclic_positions(t, &config);
            if config.exclude_wrist {
                prop_assert_eq!(wrist.positions, [0.0, 0.0]);
            } else {
                prop_assert!(wrist.positions[0] == 0.0 || wrist.positions[1] == 0.0);
            }
        }

        #[test]
        fn prop_within_limits_and_valid(t in 0.0f64..1000.0, config in config_strategy()) {
            let (joint, wrist) = cyclic_positions(t, &config);
            let max = (90.0 * config.amplitude_scale).to_radians() as f32 + 1e-6;
            for &value in joint.positions() {
                prop_assert!((0.0..=max).contains(&value));
            }
            prop_assert!(joint.validate().is_ok());
            prop_assert!(wrist.validate().is_ok());
        }
    }
}
