//! 逐关节扫描测试命令

use crate::commands::config::CliConfig;
use crate::session::{ConnectionArgs, finish, run_blocking, start_streaming};
use anyhow::Result;
use clap::Args;
use prohand_client::{SweepConfig, run_sweep};
use prohand_sdk::driver::HandshakeConfig;
use std::time::Duration;

/// 扫描测试参数
#[derive(Args, Debug)]
pub struct TestHandCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// 每个目标位置的停留时间（秒）
    #[arg(short, long, default_value_t = 0.2)]
    pub delay: f64,

    /// 每个关节的往复次数
    #[arg(short, long, default_value_t = 5)]
    pub cycles: u32,

    /// 力矩（0.0 - 1.0）
    #[arg(short, long, default_value_t = 0.45)]
    pub torque: f32,

    /// 握手超时（秒）
    #[arg(long, default_value_t = 5.0)]
    pub handshake_timeout: f64,
}

impl TestHandCommand {
    pub async fn execute(self) -> Result<()> {
        let config = CliConfig::load()?;
        let sweep = SweepConfig {
            delay: Duration::try_from_secs_f64(self.delay)?,
            cycles: self.cycles,
            torque: self.torque,
            ..SweepConfig::default()
        };
        sweep.validate()?;
        let handshake =
            HandshakeConfig::with_timeout(Duration::try_from_secs_f64(self.handshake_timeout)?);
        let builder = self.connection.builder(&config);

        println!(
            "🧪 Joint sweep: {} cycles per joint, {:.2}s per move",
            sweep.cycles,
            sweep.delay.as_secs_f64()
        );

        let summary = run_blocking(move |cancel| {
            let mut hand = start_streaming(builder, &handshake)?;
            let outcome = run_sweep(&mut hand, &sweep, &cancel);
            finish(hand, outcome)
        })
        .await?;

        println!(
            "✅ Sweep {} after {} moves",
            if summary.cancelled { "interrupted" } else { "complete" },
            summary.ticks
        );
        Ok(())
    }
}
