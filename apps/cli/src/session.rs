//! 会话辅助：连接参数、取消信号、阻塞任务隔离和错误报告

use crate::commands::config::CliConfig;
use anyhow::{Context, Result, anyhow};
use clap::Args;
use prohand_client::{CancellationToken, ControlError, Hand, Standby, Streaming};
use prohand_sdk::driver::{DriverError, EndpointConfig, HandshakeConfig, ProHandBuilder};
use std::time::Duration;

/// 回零后关闭流式模式前的等待时间
pub const PARK_SETTLE: Duration = Duration::from_millis(500);

/// 连接参数（命令行优先，其次配置文件）
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// 使用 TCP 端点（默认 IPC）
    #[arg(long)]
    pub tcp: bool,

    /// TCP 主机地址（隐含 --tcp）
    #[arg(long)]
    pub host: Option<String>,

    /// 可靠命令超时（毫秒）
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,
}

impl ConnectionArgs {
    pub fn endpoints(&self, config: &CliConfig) -> EndpointConfig {
        let host = self.host.as_deref().or(config.host.as_deref());
        let tcp = self.tcp || self.host.is_some() || config.tcp.unwrap_or(false);
        match (tcp, host) {
            (true, Some(host)) => EndpointConfig::tcp(host),
            (true, None) => EndpointConfig::tcp_localhost(),
            (false, _) => EndpointConfig::default(),
        }
    }

    pub fn builder(&self, config: &CliConfig) -> ProHandBuilder {
        let endpoints = self.endpoints(config);
        println!("🔌 Command endpoint: {}", endpoints.command);
        let mut builder = ProHandBuilder::new().endpoints(endpoints);
        if let Some(ms) = self.request_timeout_ms.or(config.request_timeout_ms) {
            builder = builder.request_timeout(Duration::from_millis(ms));
        }
        builder
    }
}

/// 在专用线程中运行阻塞的硬件循环，Ctrl-C 置位取消令牌
pub async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce(CancellationToken) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            println!("🛑 Stop requested, returning hand to zero...");
            signal.cancel();
        }
    });

    let result = tokio::task::spawn_blocking(move || task(cancel)).await;
    watcher.abort();
    result.map_err(|e| anyhow!("worker task failed: {}", e))?
}

/// 连接并完成流式握手
pub fn start_streaming(builder: ProHandBuilder, handshake: &HandshakeConfig) -> Result<Hand<Streaming>> {
    let hand: Hand<Standby> = Hand::connect(builder).context("failed to create client")?;
    println!(
        "⏳ Requesting streaming mode (timeout {:.1}s)...",
        handshake.timeout.as_secs_f64()
    );
    let hand = hand
        .enable_streaming(handshake)?
        .into_result()
        .context("streaming handshake failed")?;
    println!("✅ Streaming mode confirmed");
    Ok(hand)
}

/// 回零并关闭流式模式；运动循环的错误优先返回
pub fn finish<T>(hand: Hand<Streaming>, outcome: Result<T, ControlError>) -> Result<T> {
    let parked = hand.park(PARK_SETTLE);
    let value = outcome.context("motion loop failed")?;
    parked.context("failed to return hand to zero")?.close();
    println!("✅ Hand returned to zero, streaming disabled");
    Ok(value)
}

/// 错误链中第一个可识别错误的修正建议
pub fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<ControlError>() {
            Some(e.hint())
        } else {
            cause.downcast_ref::<DriverError>().map(DriverError::hint)
        }
    })
}

pub fn report_error(err: &anyhow::Error) {
    eprintln!("❌ Error: {:#}", err);
    if let Some(hint) = hint_for(err) {
        eprintln!("   Hint: {}", hint);
    }
}
