//! 手势序列
//!
//! 序列由 (姿态名, 持续时间) 组成。[`GestureSequencer::new`] 先解析全部步骤，
//! 任何未知姿态或非法时长都会在开始运动之前报错。

use crate::control::guard::StreamGuard;
use crate::control::{CancellationToken, LoopConfig, LoopControl, RunSummary, run_fixed_rate};
use crate::error::ControlError;
use crate::state::{Hand, Streaming};
use prohand_protocol::{JointCommand, WristCommand};
use prohand_tools::{HandSide, PoseResolver};
use std::time::Duration;
use tracing::info;

/// 序列中的一步
#[derive(Debug, Clone, PartialEq)]
pub struct GestureStep {
    pub pose: String,
    pub duration: Duration,
}

impl GestureStep {
    pub fn new(pose: impl Into<String>, duration: Duration) -> Self {
        Self {
            pose: pose.into(),
            duration,
        }
    }

    /// 以秒为单位构造；负数、NaN、无穷大报错
    pub fn from_secs(pose: impl Into<String>, seconds: f64) -> Result<Self, ControlError> {
        let pose = pose.into();
        let duration = Duration::try_from_secs_f64(seconds).map_err(|_| {
            ControlError::InvalidConfig(format!(
                "invalid duration {} for gesture '{}'",
                seconds, pose
            ))
        })?;
        Ok(Self { pose, duration })
    }
}

/// Kapandji 对掌测试序列：拇指依次触碰各指尖，共 6 轮、48 步
///
/// 速度依次为 slow、medium、fast，之后三轮 fastest。
pub fn kapandji_sequence() -> Vec<GestureStep> {
    // (第一步时长, 其余步时长)，单位毫秒
    const ROUNDS: [(u64, u64); 6] = [
        (2000, 1000),
        (1250, 500),
        (500, 250),
        (250, 100),
        (250, 100),
        (250, 100),
    ];
    const ORDER: [usize; 8] = [0, 1, 2, 3, 4, 3, 2, 1];

    ROUNDS
        .iter()
        .flat_map(|&(first, rest)| {
            ORDER.iter().enumerate().map(move |(i, finger)| {
                let ms = if i == 0 { first } else { rest };
                GestureStep::new(format!("finger_down_{}", finger), Duration::from_millis(ms))
            })
        })
        .collect()
}

/// 已解析的步骤
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStep {
    pub pose: String,
    pub duration: Duration,
    pub hand: JointCommand,
    pub wrist: WristCommand,
}

/// 手势序列执行器
#[derive(Debug, Clone)]
pub struct GestureSequencer {
    steps: Vec<ResolvedStep>,
    publish_hz: f64,
}

impl GestureSequencer {
    /// 解析全部步骤
    ///
    /// # Errors
    /// - `ControlError::Pose`: 任一步骤的姿态无法解析
    /// - `ControlError::InvalidConfig`: 发布频率或力矩非法
    pub fn new<R: PoseResolver + ?Sized>(
        steps: &[GestureStep],
        resolver: &R,
        side: HandSide,
        torque: f32,
        publish_hz: f64,
    ) -> Result<Self, ControlError> {
        LoopConfig::new(publish_hz).validate()?;
        if !(0.0..=1.0).contains(&torque) {
            return Err(ControlError::InvalidConfig(format!(
                "torque must be within 0.0..=1.0, got {}",
                torque
            )));
        }

        let steps = steps
            .iter()
            .map(|step| {
                let pose = resolver.resolve(&step.pose, side)?;
                Ok(ResolvedStep {
                    pose: step.pose.clone(),
                    duration: step.duration,
                    hand: pose.to_joint_command(torque),
                    wrist: pose.to_wrist_command(),
                })
            })
            .collect::<Result<Vec<_>, ControlError>>()?;

        Ok(Self { steps, publish_hz })
    }

    pub fn steps(&self) -> &[ResolvedStep] {
        &self.steps
    }

    /// 序列总时长
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// 依次以固定频率流式发送每个姿态，每帧先腕部后手部
    ///
    /// 取消后立即返回，不负责回零。
    pub fn run(
        &self,
        hand: &mut Hand<Streaming>,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, ControlError> {
        let clock = hand.clock()?;
        let mut guard = StreamGuard::new();
        let mut summary = RunSummary::default();

        for (i, step) in self.steps.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            info!(
                "Gesture {}/{}: {} for {:.2}s",
                i + 1,
                self.steps.len(),
                step.pose,
                step.duration.as_secs_f64()
            );
            let config = LoopConfig::new(self.publish_hz).with_duration(step.duration);
            let result = run_fixed_rate(clock.as_ref(), &config, cancel, |_| {
                guard.record(hand.stream_pose(&step.hand, &step.wrist))?;
                Ok(LoopControl::Continue)
            })?;
            summary = summary.merge(result);
            if result.cancelled {
                break;
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::streaming;
    use prohand_protocol::{Finger, StreamMessage};
    use prohand_tools::{Pose, PoseConfigError, PoseLibrary};

    fn library() -> PoseLibrary {
        let mut library = PoseLibrary::new();
        for n in 0..5 {
            let pose = Pose::zero().with_finger(Finger::Thumb, [0.1 * n as f32, 0.0, 0.0, 0.0]);
            library.insert(format!("finger_down_{}", n), pose);
        }
        library.insert_for(HandSide::Right, "wave", Pose::zero().with_wrist([0.2, 0.0]));
        library
    }

    #[test]
    fn test_kapandji_has_48_steps() {
        let steps = kapandji_sequence();
        assert_eq!(steps.len(), 48);
        assert_eq!(steps[0], GestureStep::new("finger_down_0", Duration::from_secs(2)));
        assert_eq!(steps[4].pose, "finger_down_4");
        assert_eq!(steps[7].pose, "finger_down_1");
        assert_eq!(steps[8].duration, Duration::from_millis(1250));
        assert_eq!(steps[47].duration, Duration::from_millis(100));

        let total: Duration = steps.iter().map(|s| s.duration).sum();
        // 9 + 4.75 + 2.25 + 3 * 0.95
        assert_eq!(total, Duration::from_millis(18_850));
    }

    #[test]
    fn test_from_secs_rejects_bad_duration() {
        assert!(GestureStep::from_secs("open", 0.5).is_ok());
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                GestureStep::from_secs("open", bad),
                Err(ControlError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_unknown_pose_fails_before_motion() {
        let steps = vec![
            GestureStep::new("finger_down_0", Duration::from_millis(100)),
            GestureStep::new("fist", Duration::from_millis(100)),
        ];
        let result = GestureSequencer::new(&steps, &library(), HandSide::Left, 0.45, 60.0);
        match result {
            Err(ControlError::Pose(PoseConfigError::UnknownPose { name, .. })) => {
                assert_eq!(name, "fist")
            },
            other => panic!("unexpected: {:?}", other.map(|s| s.steps().len())),
        }
    }

    #[test]
    fn test_side_specific_pose() {
        let steps = vec![GestureStep::new("wave", Duration::from_millis(100))];
        assert!(GestureSequencer::new(&steps, &library(), HandSide::Right, 0.45, 60.0).is_ok());
        assert!(GestureSequencer::new(&steps, &library(), HandSide::Left, 0.45, 60.0).is_err());
    }

    #[test]
    fn test_invalid_rate_or_torque() {
        let steps = kapandji_sequence();
        assert!(GestureSequencer::new(&steps, &library(), HandSide::Left, 0.45, 0.0).is_err());
        assert!(GestureSequencer::new(&steps, &library(), HandSide::Left, 1.5, 60.0).is_err());
    }

    #[test]
    fn test_run_streams_each_pose_for_its_duration() {
        let (mut hand, sim, _clock) = streaming();
        let before = sim.streamed().len();
        let steps = vec![
            GestureStep::new("finger_down_1", Duration::from_millis(100)),
            GestureStep::new("finger_down_2", Duration::from_millis(50)),
        ];
        let sequencer =
            GestureSequencer::new(&steps, &library(), HandSide::Left, 0.45, 100.0).unwrap();
        assert_eq!(sequencer.total_duration(), Duration::from_millis(150));

        let summary = sequencer.run(&mut hand, &CancellationToken::new()).unwrap();
        assert_eq!(summary.ticks, 15);

        let all = sim.streamed();
        let streamed = &all[before..];
        assert_eq!(streamed.len(), 30);
        // 每帧先腕部后手部
        assert!(matches!(streamed[0], StreamMessage::Wrist(_)));
        match &streamed[1] {
            StreamMessage::Hand(cmd) => {
                assert_eq!(cmd.torque(), 0.45);
                assert_eq!(cmd.positions()[0], 0.1);
            },
            other => panic!("unexpected: {:?}", other),
        }
        match &streamed[29] {
            StreamMessage::Hand(cmd) => assert_eq!(cmd.positions()[0], 0.2),
            other => panic!("unexpected: {:?}", other),
        }
        hand.park(Duration::ZERO).unwrap();
    }

    #[test]
    fn test_cancelled_sequence_stops() {
        let (mut hand, _sim, _clock) = streaming();
        let sequencer =
            GestureSequencer::new(&kapandji_sequence(), &library(), HandSide::Left, 0.45, 60.0)
                .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let summary = sequencer.run(&mut hand, &cancel).unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.ticks, 0);
    }
}
