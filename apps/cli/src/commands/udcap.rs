//! 动捕手套遥操作命令
//!
//! UDP 接收在 tokio 任务中完成，映射后的最新命令通过 `watch` 通道交给
//! 专用线程中的固定频率发送循环。

use crate::commands::config::CliConfig;
use crate::session::{ConnectionArgs, finish, run_blocking, start_streaming};
use anyhow::{Context, Result};
use clap::Args;
use prohand_client::{ControlError, GloveDataMapper, LoopConfig, LoopControl, run_fixed_rate};
use prohand_sdk::driver::HandshakeConfig;
use prohand_sdk::protocol::JointCommand;
use prohand_tools::HandSide;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, warn};

/// 无数据告警阈值
const STALE_AFTER: Duration = Duration::from_secs(3);

/// 接收失败后的首次退避时间
const RECV_BACKOFF_START: Duration = Duration::from_millis(10);
/// 退避时间上限
const RECV_BACKOFF_MAX: Duration = Duration::from_millis(500);
/// 连续失败达到该次数后放弃接收
const MAX_RECV_FAILURES: u32 = 20;

/// UDP 接收失败的退避策略
#[derive(Debug, Default)]
struct RecvBackoff {
    failures: u32,
}

impl RecvBackoff {
    fn on_success(&mut self) {
        self.failures = 0;
    }

    /// 返回下一次接收前的等待时间；连续失败过多时返回错误
    fn on_failure(&mut self, err: std::io::Error) -> std::io::Result<Duration> {
        self.failures += 1;
        if self.failures >= MAX_RECV_FAILURES {
            return Err(std::io::Error::new(
                err.kind(),
                format!("UDP receive failed {} times in a row: {}", self.failures, err),
            ));
        }
        let delay = RECV_BACKOFF_START.saturating_mul(1 << (self.failures - 1).min(6));
        Ok(delay.min(RECV_BACKOFF_MAX))
    }
}

/// 遥操作参数
#[derive(Args, Debug)]
pub struct UdcapCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// UDP 监听地址
    #[arg(short, long, default_value = "0.0.0.0:5555")]
    pub udp: String,

    /// 手（left / right）
    #[arg(short, long)]
    pub side: Option<HandSide>,

    /// 力矩（0.0 - 1.0）
    #[arg(short, long, default_value_t = 0.8)]
    pub torque: f32,

    /// 发布频率（Hz）
    #[arg(long, default_value_t = 60.0)]
    pub pub_hz: f64,

    /// 握手超时（秒）
    #[arg(long, default_value_t = 2.0)]
    pub handshake_timeout: f64,
}

impl UdcapCommand {
    pub async fn execute(self) -> Result<()> {
        let config = CliConfig::load()?;
        if !(0.0..=1.0).contains(&self.torque) {
            anyhow::bail!("torque must be within 0.0..=1.0, got {}", self.torque);
        }
        let side = self.side.or(config.side).unwrap_or_default();
        let mapper = GloveDataMapper::new(side);
        let loop_config = LoopConfig::new(self.pub_hz);
        loop_config.validate()?;
        let handshake = HandshakeConfig {
            timeout: Duration::try_from_secs_f64(self.handshake_timeout)?,
            retry_interval: Duration::from_millis(200),
            ..HandshakeConfig::default()
        };
        let builder = self.connection.builder(&config);

        let socket = UdpSocket::bind(&self.udp)
            .await
            .with_context(|| format!("failed to bind UDP {}", self.udp))?;
        println!("📡 Listening for glove data on {} ({} hand)", self.udp, side);

        let (tx, rx) = watch::channel::<Option<JointCommand>>(None);
        let torque = self.torque;
        let receiver = tokio::spawn(async move {
            let mut buf = vec![0u8; 65_536];
            let mut backoff = RecvBackoff::default();
            loop {
                let len = match socket.recv(&mut buf).await {
                    Ok(len) => {
                        backoff.on_success();
                        len
                    },
                    Err(e) => {
                        warn!("UDP receive failed: {}", e);
                        tokio::time::sleep(backoff.on_failure(e)?).await;
                        continue;
                    },
                };
                match mapper.process(&buf[..len], torque) {
                    Some(command) => {
                        if tx.send(Some(command)).is_err() {
                            break;
                        }
                    },
                    None => debug!("Ignoring unparsable datagram ({} bytes)", len),
                }
            }
            Ok::<(), std::io::Error>(())
        });

        let result = run_blocking(move |cancel| {
            let mut hand = start_streaming(builder, &handshake)?;
            let clock = hand.clock()?;
            let outcome = run_fixed_rate(clock.as_ref(), &loop_config, &cancel, {
                let mut rx = rx;
                let mut last_data = Duration::ZERO;
                let mut warned = false;
                let hand = &mut hand;
                move |tick| {
                    match rx.has_changed() {
                        Ok(true) => {
                            last_data = tick.elapsed;
                            warned = false;
                        },
                        Ok(false) => {
                            if !warned && tick.elapsed.saturating_sub(last_data) >= STALE_AFTER {
                                warn!("No glove data for {:?}", STALE_AFTER);
                                warned = true;
                            }
                        },
                        Err(_) => {
                            warn!("Glove receiver stopped");
                            return Ok(LoopControl::Break);
                        },
                    }
                    let latest = *rx.borrow_and_update();
                    if let Some(command) = latest
                        && let Err(e) = hand.stream_hand(&command)
                    {
                        if !e.is_retryable() {
                            return Err(ControlError::from(e));
                        }
                        warn!("Transient streaming error: {}", e);
                    }
                    Ok(LoopControl::Continue)
                }
            });
            finish(hand, outcome)
        })
        .await;

        // 已结束的任务 abort 无效果，await 仍取回它的结果
        receiver.abort();
        let receive_error = receiver.await.ok().and_then(Result::err);
        let summary = result?;
        if let Some(e) = receive_error {
            return Err(e).context("glove data receiver stopped");
        }
        println!("✅ Teleoperation stopped after {} frames", summary.ticks);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_recv_backoff_grows_and_gives_up() {
        let mut backoff = RecvBackoff::default();
        let mut delays = Vec::new();
        for _ in 1..MAX_RECV_FAILURES {
            delays.push(backoff.on_failure(Error::from(ErrorKind::ConnectionReset)).unwrap());
        }
        assert_eq!(delays[0], RECV_BACKOFF_START);
        assert_eq!(delays[1], RECV_BACKOFF_START * 2);
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*delays.last().unwrap(), RECV_BACKOFF_MAX);

        let err = backoff
            .on_failure(Error::from(ErrorKind::ConnectionReset))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionReset);
    }

    #[test]
    fn test_recv_backoff_resets_on_success() {
        let mut backoff = RecvBackoff::default();
        for _ in 0..5 {
            backoff.on_failure(Error::from(ErrorKind::Other)).unwrap();
        }
        backoff.on_success();
        assert_eq!(
            backoff.on_failure(Error::from(ErrorKind::Other)).unwrap(),
            RECV_BACKOFF_START
        );
    }
}
