//! 触觉手套监控命令

use crate::session::run_blocking;
use anyhow::{Context, Result};
use clap::Args;
use prohand_client::{LoopConfig, LoopControl, run_fixed_rate};
use prohand_sdk::driver::{
    Clock, DEFAULT_LEFT_GLOVE_ENDPOINT, DEFAULT_RIGHT_GLOVE_ENDPOINT, ProGlove, SystemClock,
};
use prohand_sdk::protocol::{FINGER_COUNT, Finger, TactileStatus, TaxelSegment};
use prohand_tools::HandSide;
use std::time::Duration;

/// 手套监控参数
#[derive(Args, Debug)]
pub struct GloveCommand {
    /// 手（left / right）
    #[arg(short, long, default_value = "left")]
    pub side: HandSide,

    /// 状态端点（覆盖默认值）
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// 显示频率（Hz）
    #[arg(short, long, default_value_t = 10.0)]
    pub rate: f64,

    /// 监控时长（秒），缺省表示直到 Ctrl-C
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// 等待第一帧样本的超时（秒）
    #[arg(long, default_value_t = 2.0)]
    pub ping_timeout: f64,
}

impl GloveCommand {
    fn endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            match self.side {
                HandSide::Left => DEFAULT_LEFT_GLOVE_ENDPOINT,
                HandSide::Right => DEFAULT_RIGHT_GLOVE_ENDPOINT,
            }
            .to_string()
        })
    }

    pub async fn execute(self) -> Result<()> {
        let endpoint = self.endpoint();
        let mut loop_config = LoopConfig::new(self.rate);
        if let Some(seconds) = self.duration {
            loop_config = loop_config.with_duration(Duration::try_from_secs_f64(seconds)?);
        }
        loop_config.validate()?;
        let ping_timeout = Duration::try_from_secs_f64(self.ping_timeout)?;

        run_blocking(move |cancel| {
            println!("🔌 Glove endpoint: {}", endpoint);
            let mut glove = ProGlove::connect(&endpoint).context("failed to create glove client")?;
            glove.ping(ping_timeout).context("no tactile samples received")?;
            println!("✅ Receiving tactile samples (Ctrl-C to stop)");

            let clock = SystemClock::new();
            let mut last_uid = None;
            run_fixed_rate(&clock as &dyn Clock, &loop_config, &cancel, |_| {
                if let Some(sample) = glove.latest()?
                    && last_uid != Some(sample.uid)
                {
                    last_uid = Some(sample.uid);
                    println!("{}", format_sample(&sample));
                }
                Ok(LoopControl::Continue)
            })?;
            glove.close();
            Ok(())
        })
        .await
    }
}

/// 每根手指和手掌的压力总和
pub fn finger_pressures(sample: &TactileStatus) -> ([u32; FINGER_COUNT], u32) {
    let mut fingers = [0u32; FINGER_COUNT];
    let mut palm = 0;
    for segment in TaxelSegment::ALL {
        let pressure = sample.segment_pressure(segment);
        match segment.finger() {
            Some(finger) => fingers[finger.index()] += pressure,
            None => palm += pressure,
        }
    }
    (fingers, palm)
}

pub fn format_sample(sample: &TactileStatus) -> String {
    let (fingers, palm) = finger_pressures(sample);
    let per_finger: Vec<String> = Finger::ALL
        .iter()
        .map(|f| format!("{}={:>5}", f.name(), fingers[f.index()]))
        .collect();
    format!(
        "[{:>10} ms] total={:>6} {} palm={:>5}",
        sample.timestamp_ms,
        sample.total_pressure(),
        per_finger.join(" "),
        palm
    )
}
