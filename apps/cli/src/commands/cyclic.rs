//! 周期运动命令

use crate::commands::config::CliConfig;
use crate::session::{ConnectionArgs, finish, run_blocking, start_streaming};
use anyhow::Result;
use clap::Args;
use prohand_client::{CyclicMotionConfig, LoopConfig, run_cyclic};
use prohand_sdk::driver::HandshakeConfig;
use std::time::Duration;

/// 周期运动参数
#[derive(Args, Debug)]
pub struct CyclicCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// 运行时长（秒）
    #[arg(short, long, default_value_t = 60.0)]
    pub duration: f64,

    /// 发布频率（Hz）
    #[arg(long, default_value_t = 100.0)]
    pub pub_hz: f64,

    /// 运动频率（Hz）
    #[arg(short, long, default_value_t = 0.5)]
    pub frequency: f64,

    /// 幅值缩放（0.0 - 1.0）
    #[arg(short, long, default_value_t = 0.8)]
    pub amplitude: f64,

    /// 力矩（0.0 - 1.0）
    #[arg(short, long, default_value_t = 1.0)]
    pub torque: f32,

    /// 拇指参与运动
    #[arg(long)]
    pub include_thumb: bool,

    /// 腕部保持 0
    #[arg(long)]
    pub exclude_wrist: bool,

    /// 非拇指手指的外展关节参与运动
    #[arg(long)]
    pub include_abduction: bool,

    /// 握手超时（秒）
    #[arg(long, default_value_t = 10.0)]
    pub handshake_timeout: f64,
}

impl CyclicCommand {
    pub fn motion(&self) -> CyclicMotionConfig {
        CyclicMotionConfig {
            frequency_hz: self.frequency,
            amplitude_scale: self.amplitude,
            include_thumb: self.include_thumb,
            exclude_wrist: self.exclude_wrist,
            include_abduction: self.include_abduction,
            torque: self.torque,
            ..CyclicMotionConfig::default()
        }
    }

    pub async fn execute(self) -> Result<()> {
        let config = CliConfig::load()?;
        let motion = self.motion();
        motion.validate()?;
        let loop_config =
            LoopConfig::new(self.pub_hz).with_duration(Duration::try_from_secs_f64(self.duration)?);
        loop_config.validate()?;
        let handshake =
            HandshakeConfig::with_timeout(Duration::try_from_secs_f64(self.handshake_timeout)?);
        let builder = self.connection.builder(&config);

        println!(
            "🔁 Cyclic motion: {} Hz, amplitude {}, {:.1}s at {} Hz (Ctrl-C to stop)",
            motion.frequency_hz, motion.amplitude_scale, self.duration, self.pub_hz
        );

        let summary = run_blocking(move |cancel| {
            let mut hand = start_streaming(builder, &handshake)?;
            let outcome = run_cyclic(&mut hand, &motion, &loop_config, &cancel);
            finish(hand, outcome)
        })
        .await?;

        println!(
            "✅ Sent {} frames in {:.2}s{}",
            summary.ticks,
            summary.elapsed.as_secs_f64(),
            if summary.cancelled { " (interrupted)" } else { "" }
        );
        Ok(())
    }
}
