//! 单关节扫描测试
//!
//! 依次对每根手指的每个关节做往复运动（最大值 → 最小值），其余关节保持 0。
//! 测试非拇指手指的远端关节时，中间关节预先弯曲到 90°。

use crate::control::guard::StreamGuard;
use crate::control::{CancellationToken, RunSummary};
use crate::error::ControlError;
use crate::state::{Hand, Streaming};
use prohand_protocol::{Finger, FingerJoint, JointCommand, WristCommand};
use std::time::Duration;
use tracing::info;

/// 扫描参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepConfig {
    /// 每个目标位置的停留时间
    pub delay: Duration,
    /// 每个关节的往复次数
    pub cycles: u32,
    pub torque: f32,
    /// 开始前回零后的等待时间
    pub settle: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(200),
            cycles: 5,
            torque: 0.45,
            settle: Duration::from_secs(1),
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<(), ControlError> {
        if !(0.0..=1.0).contains(&self.torque) {
            return Err(ControlError::InvalidConfig(format!(
                "torque must be within 0.0..=1.0, got {}",
                self.torque
            )));
        }
        Ok(())
    }
}

/// 关节扫描范围（弧度，`(min, max)`）
///
/// 非拇指手指的掌骨关节是外展关节，范围 -30° - 30°；其余关节 0° - 90°。
pub fn sweep_range(finger: Finger, joint: FingerJoint) -> (f32, f32) {
    let (min, max) = if joint == FingerJoint::Metacarpal && !finger.is_thumb() {
        (-30.0f32, 30.0f32)
    } else {
        (0.0, 90.0)
    };
    (min.to_radians(), max.to_radians())
}

/// 扫描中的一个目标位置
#[derive(Debug, Clone, PartialEq)]
pub struct SweepStep {
    pub finger: Finger,
    pub joint: FingerJoint,
    pub cycle: u32,
    pub command: JointCommand,
}

/// 生成完整的扫描计划（纯函数）
pub fn sweep_plan(config: &SweepConfig) -> Vec<SweepStep> {
    let mut plan = Vec::new();
    for finger in Finger::ALL {
        for joint in FingerJoint::ALL {
            let (min, max) = sweep_range(finger, joint);
            for cycle in 0..config.cycles {
                for target in [max, min] {
                    let mut command = JointCommand::zero().with_torque(config.torque);
                    if joint == FingerJoint::Distal && !finger.is_thumb() {
                        command.set_joint(finger, FingerJoint::Intermediate, 90f32.to_radians());
                    }
                    command.set_joint(finger, joint, target);
                    plan.push(SweepStep {
                        finger,
                        joint,
                        cycle,
                        command,
                    });
                }
            }
        }
    }
    plan
}

/// 执行扫描测试
///
/// 开始前回零并等待 `settle`，结束（包括取消）后再次回零。
/// 等待使用客户端时钟。
pub fn run_sweep(
    hand: &mut Hand<Streaming>,
    config: &SweepConfig,
    cancel: &CancellationToken,
) -> Result<RunSummary, ControlError> {
    config.validate()?;
    let clock = hand.clock()?;
    let start = clock.now();
    let zero = JointCommand::zero().with_torque(config.torque);
    let wrist = WristCommand::zero();
    let mut guard = StreamGuard::new();

    hand.stream_pose(&zero, &wrist)?;
    clock.sleep(config.settle);

    let plan = sweep_plan(config);
    let mut sent = 0u64;
    let mut cancelled = false;
    let mut current = None;

    for step in &plan {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        if current != Some((step.finger, step.joint)) {
            current = Some((step.finger, step.joint));
            info!("Testing {} {}", step.finger.name(), step.joint.name());
        }
        let result = hand
            .stream_hand(&step.command)
            .and_then(|()| hand.stream_wrist(&wrist));
        guard.record(result)?;
        sent += 1;
        clock.sleep(config.delay);
    }

    info!("Returning to zero");
    hand.stream_pose(&zero, &wrist)?;

    Ok(RunSummary {
        ticks: sent,
        elapsed: clock.now().saturating_sub(start),
        cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::streaming;
    use prohand_protocol::StreamMessage;
    use prohand_driver::Clock;

    #[test]
    fn test_ranges() {
        let (min, max) = sweep_range(Finger::Index, FingerJoint::Metacarpal);
        assert!((min + 30f32.to_radians()).abs() < 1e-6);
        assert!((max - 30f32.to_radians()).abs() < 1e-6);

        assert_eq!(
            sweep_range(Finger::Thumb, FingerJoint::Metacarpal),
            (0.0, 90f32.to_radians())
        );
        assert_eq!(
            sweep_range(Finger::Ring, FingerJoint::Distal),
            (0.0, 90f32.to_radians())
        );
    }

    #[test]
    fn test_plan_size_and_order() {
        let config = SweepConfig::default();
        let plan = sweep_plan(&config);
        // 5 手指 × 4 关节 × 5 次 × 2 个目标
        assert_eq!(plan.len(), 200);

        let first = &plan[0];
        assert_eq!((first.finger, first.joint, first.cycle), (Finger::Thumb, FingerJoint::Metacarpal, 0));
        assert_eq!(first.command.joint(Finger::Thumb, FingerJoint::Metacarpal), 90f32.to_radians());
        assert_eq!(plan[1].command.joint(Finger::Thumb, FingerJoint::Metacarpal), 0.0);
        assert!(plan.iter().all(|s| s.command.torque() == 0.45));
    }

    #[test]
    fn test_distal_preflexes_intermediate() {
        let plan = sweep_plan(&SweepConfig {
            cycles: 1,
            ..SweepConfig::default()
        });
        let step = plan
            .iter()
            .find(|s| s.finger == Finger::Middle && s.joint == FingerJoint::Distal)
            .unwrap();
        assert_eq!(
            step.command.joint(Finger::Middle, FingerJoint::Intermediate),
            90f32.to_radians()
        );

        // 拇指远端关节不预弯
        let thumb = plan
            .iter()
            .find(|s| s.finger == Finger::Thumb && s.joint == FingerJoint::Distal)
            .unwrap();
        assert_eq!(thumb.command.joint(Finger::Thumb, FingerJoint::Intermediate), 0.0);
    }

    #[test]
    fn test_only_target_joint_moves() {
        let plan = sweep_plan(&SweepConfig {
            cycles: 1,
            ..SweepConfig::default()
        });
        for step in plan.iter().filter(|s| s.joint != FingerJoint::Distal) {
            let nonzero = step.command.positions().iter().filter(|v| **v != 0.0).count();
            assert!(nonzero <= 1);
        }
    }

    #[test]
    fn test_run_sweep_timing() {
        let (mut hand, sim, clock) = streaming();
        let before = sim.streamed().len();
        let start = clock.now();
        let config = SweepConfig {
            cycles: 1,
            ..SweepConfig::default()
        };

        let summary = run_sweep(&mut hand, &config, &CancellationToken::new()).unwrap();
        assert_eq!(summary.ticks, 40);
        assert!(!summary.cancelled);
        // 1s settle + 40 × 0.2s
        assert_eq!(clock.now() - start, Duration::from_secs(9));

        let all = sim.streamed();
        let streamed = &all[before..];
        // 开始回零 2 条 + 每步 2 条 + 结束回零 2 条
        assert_eq!(streamed.len(), 2 + 80 + 2);
        assert_eq!(
            streamed.last(),
            Some(&StreamMessage::Hand(JointCommand::zero().with_torque(0.45)))
        );
        hand.park(Duration::ZERO).unwrap();
    }

    #[test]
    fn test_cancelled_sweep_still_returns_to_zero() {
        let (mut hand, sim, _clock) = streaming();
        let before = sim.streamed().len();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = run_sweep(&mut hand, &SweepConfig::default(), &cancel).unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.ticks, 0);
        assert_eq!(sim.streamed().len() - before, 4);
    }
}
