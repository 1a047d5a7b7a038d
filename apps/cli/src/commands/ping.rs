//! 链路检查命令

use crate::commands::config::CliConfig;
use crate::session::{ConnectionArgs, run_blocking};
use anyhow::{Context, Result};
use clap::Args;
use prohand_client::Hand;
use std::time::Instant;

/// 链路检查参数
#[derive(Args, Debug)]
pub struct PingCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// 次数
    #[arg(short, long, default_value_t = 1)]
    pub count: u32,
}

impl PingCommand {
    pub async fn execute(self) -> Result<()> {
        let config = CliConfig::load()?;
        let builder = self.connection.builder(&config);
        let count = self.count.max(1);

        run_blocking(move |cancel| {
            let mut hand = Hand::connect(builder).context("failed to create client")?;
            for i in 0..count {
                if cancel.is_cancelled() {
                    break;
                }
                let start = Instant::now();
                hand.ping().context("ping failed")?;
                println!("✅ Ping {}/{}: {:.2} ms", i + 1, count, start.elapsed().as_secs_f64() * 1e3);
            }
            hand.close();
            Ok(())
        })
        .await
    }
}
