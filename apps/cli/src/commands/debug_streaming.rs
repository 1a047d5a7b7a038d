//! 流式模式调试命令
//!
//! 逐步执行握手并打印每一步结果：连接 → ping → 请求流式模式 → 等待确认
//! → （可选）旋转执行器测试帧 → 关闭流式模式。

use crate::commands::config::CliConfig;
use crate::session::{ConnectionArgs, run_blocking};
use anyhow::{Context, Result, bail};
use clap::Args;
use prohand_client::{LoopConfig, LoopControl, run_fixed_rate};
use prohand_sdk::driver::{ClientEvent, HandshakeConfig, ProHand};
use prohand_sdk::protocol::{ROTARY_JOINT_COUNT, RotaryCommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// 调试参数
#[derive(Args, Debug)]
pub struct DebugStreamingCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// 握手超时（秒）
    #[arg(long, default_value_t = 5.0)]
    pub handshake_timeout: f64,

    /// 确认后发送的零位旋转执行器测试帧数量
    #[arg(long, default_value_t = 0)]
    pub rotary_frames: u64,
}

fn print_event(event: &ClientEvent) {
    println!("   · {:?}", event);
}

impl DebugStreamingCommand {
    pub async fn execute(self) -> Result<()> {
        let config = CliConfig::load()?;
        let handshake =
            HandshakeConfig::with_timeout(Duration::try_from_secs_f64(self.handshake_timeout)?);
        let builder = self
            .connection
            .builder(&config)
            .on_event(Arc::new(print_event));
        let rotary_frames = self.rotary_frames;

        run_blocking(move |cancel| {
            println!("[1/5] Creating channels");
            let mut hand: ProHand = builder.build().context("step 1 failed")?;
            println!("✅ Channels created ({:?})", hand.endpoints());

            println!("[2/5] Ping");
            hand.ping().context("step 2 failed")?;
            println!("✅ Driver answered");

            println!("[3/5] Streaming handshake");
            let confirmed = hand.enable_streaming(&handshake).context("step 3 failed")?;
            if !confirmed {
                if let Err(e) = hand.set_streaming_mode(false) {
                    warn!("Failed to disable streaming mode: {}", e);
                }
                bail!(
                    "driver did not confirm streaming mode within {:.1}s",
                    handshake.timeout.as_secs_f64()
                );
            }
            println!("✅ Running state confirmed");

            println!("[4/5] Rotary test frames: {}", rotary_frames);
            if rotary_frames > 0 {
                let zero = RotaryCommand::new([0.0; ROTARY_JOINT_COUNT], [0.0; ROTARY_JOINT_COUNT]);
                let clock = hand.clock();
                let loop_config = LoopConfig::new(50.0);
                let summary = run_fixed_rate(clock.as_ref(), &loop_config, &cancel, |tick| {
                    hand.send_rotary_stream(&zero)?;
                    if tick.index + 1 >= rotary_frames {
                        return Ok(LoopControl::Break);
                    }
                    Ok(LoopControl::Continue)
                })?;
                println!("✅ Sent {} frames", summary.ticks);
            }

            println!("[5/5] Disabling streaming mode");
            hand.disable_streaming().context("step 5 failed")?;
            hand.close();
            println!("✅ Done");
            Ok(())
        })
        .await
    }
}
