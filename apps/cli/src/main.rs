//! # ProHand CLI
//!
//! Command-line interface for ProHand dexterous hands and ProGlove tactile gloves.
//!
//! 每个命令独立执行：读取配置 → 连接驱动 → 执行操作 → 回零并断开。
//!
//! ```bash
//! # 配置默认端点
//! prohand-cli config set --tcp true --host 192.168.1.20
//!
//! # 检查链路
//! prohand-cli ping
//!
//! # 周期运动 30 秒
//! prohand-cli cyclic --duration 30 --include-thumb
//!
//! # Kapandji 对掌测试
//! prohand-cli kapandji --config config/kapandji.toml --side right
//! ```
//!
//! 所有运动命令都可以用 Ctrl-C 中断，中断后手会回到零位并关闭流式模式。

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod commands;
mod session;

use commands::{
    ConfigCommand, CyclicCommand, DebugStreamingCommand, GloveCommand, KapandjiCommand,
    PingCommand, TestHandCommand, UdcapCommand,
};

/// ProHand CLI - 灵巧手命令行工具
#[derive(Parser, Debug)]
#[command(name = "prohand-cli")]
#[command(about = "Command-line interface for ProHand dexterous hands", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 检查与驱动的链路
    Ping {
        #[command(flatten)]
        args: PingCommand,
    },

    /// 周期运动（手指行波 + 腕部交替摆动）
    Cyclic {
        #[command(flatten)]
        args: CyclicCommand,
    },

    /// Kapandji 对掌测试序列
    Kapandji {
        #[command(flatten)]
        args: KapandjiCommand,
    },

    /// 逐关节扫描测试
    TestHand {
        #[command(flatten)]
        args: TestHandCommand,
    },

    /// 逐步调试流式模式握手
    DebugStreaming {
        #[command(flatten)]
        args: DebugStreamingCommand,
    },

    /// 监控触觉手套
    Glove {
        #[command(flatten)]
        args: GloveCommand,
    },

    /// 动捕手套遥操作（UDP JSON → 关节命令）
    Udcap {
        #[command(flatten)]
        args: UdcapCommand,
    },
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Config(cmd) => cmd.execute(),
        Commands::Ping { args } => args.execute().await,
        Commands::Cyclic { args } => args.execute().await,
        Commands::Kapandji { args } => args.execute().await,
        Commands::TestHand { args } => args.execute().await,
        Commands::DebugStreaming { args } => args.execute().await,
        Commands::Glove { args } => args.execute().await,
        Commands::Udcap { args } => args.execute().await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // 初始化日志
    prohand_sdk::init_logger();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            session::report_error(&e);
            ExitCode::FAILURE
        },
    }
}
