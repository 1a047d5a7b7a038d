//! Kapandji 对掌测试命令

use crate::commands::config::CliConfig;
use crate::session::{ConnectionArgs, finish, run_blocking, start_streaming};
use anyhow::{Context, Result};
use clap::Args;
use prohand_client::{GestureSequencer, kapandji_sequence};
use prohand_sdk::driver::HandshakeConfig;
use prohand_tools::{HandSide, PoseLibrary};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_LIBRARY: &str = "config/kapandji.toml";

/// Kapandji 参数
#[derive(Args, Debug)]
pub struct KapandjiCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// 姿态库（TOML）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 手（left / right）
    #[arg(short, long)]
    pub side: Option<HandSide>,

    /// 发布频率（Hz）
    #[arg(long, default_value_t = 60.0)]
    pub pub_hz: f64,

    /// 覆盖姿态库中的力矩等级（0.0 - 1.0）
    #[arg(short, long)]
    pub torque: Option<f32>,

    /// 握手超时（秒）
    #[arg(long, default_value_t = 10.0)]
    pub handshake_timeout: f64,
}

impl KapandjiCommand {
    pub async fn execute(self) -> Result<()> {
        let config = CliConfig::load()?;
        let path = self
            .config
            .clone()
            .or_else(|| config.pose_library.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY));
        let side = self.side.or(config.side).unwrap_or_default();

        let library = PoseLibrary::load(&path)?;
        let torque = self.torque.unwrap_or_else(|| library.torque_level());

        // 运动前解析全部姿态
        let sequencer = GestureSequencer::new(&kapandji_sequence(), &library, side, torque, self.pub_hz)
            .with_context(|| format!("invalid pose library {}", path.display()))?;
        println!(
            "🖐  Kapandji sequence: {} steps, {:.2}s, {} hand, torque {}",
            sequencer.steps().len(),
            sequencer.total_duration().as_secs_f64(),
            side,
            torque
        );

        let handshake =
            HandshakeConfig::with_timeout(Duration::try_from_secs_f64(self.handshake_timeout)?);
        let builder = self.connection.builder(&config);

        let summary = run_blocking(move |cancel| {
            let mut hand = start_streaming(builder, &handshake)?;
            let outcome = sequencer.run(&mut hand, &cancel);
            finish(hand, outcome)
        })
        .await?;

        if summary.cancelled {
            println!("⚠️ Sequence interrupted after {} frames", summary.ticks);
        } else {
            println!("✅ Sequence complete ({} frames)", summary.ticks);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_library_covers_sequence() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").join(DEFAULT_LIBRARY);
        let library = PoseLibrary::load(&path).unwrap();
        for side in [HandSide::Left, HandSide::Right] {
            let sequencer =
                GestureSequencer::new(&kapandji_sequence(), &library, side, library.torque_level(), 60.0)
                    .unwrap();
            assert_eq!(sequencer.steps().len(), 48);
        }
    }
}
