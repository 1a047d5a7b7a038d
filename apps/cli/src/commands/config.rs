//! 配置管理命令
//!
//! 持久化默认值保存在 `~/.config/prohand/config.toml`，命令行参数优先。

use anyhow::{Context, Result};
use clap::Subcommand;
use prohand_tools::HandSide;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 配置文件路径
fn config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("cannot determine the user config directory")?;
    path.push("prohand");
    path.push("config.toml");
    Ok(path)
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// 使用 TCP 端点
    pub tcp: Option<bool>,
    /// TCP 主机
    pub host: Option<String>,
    /// 可靠命令超时（毫秒）
    pub request_timeout_ms: Option<u64>,
    /// 默认手
    pub side: Option<HandSide>,
    /// 默认姿态库
    pub pose_library: Option<PathBuf>,
}

impl CliConfig {
    /// 加载配置；文件不存在时返回默认值
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = config_file()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, format!("# ProHand CLI Configuration\n\n{}", content))
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 设置配置项
    Set {
        /// 默认使用 TCP 端点
        #[arg(long)]
        tcp: Option<bool>,

        /// TCP 主机地址
        #[arg(long)]
        host: Option<String>,

        /// 可靠命令超时（毫秒）
        #[arg(long)]
        request_timeout_ms: Option<u64>,

        /// 默认手（left / right）
        #[arg(long)]
        side: Option<HandSide>,

        /// 默认姿态库文件
        #[arg(long)]
        pose_library: Option<PathBuf>,
    },

    /// 显示当前配置
    Get,

    /// 显示配置文件路径并校验内容
    Check,
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Set {
                tcp,
                host,
                request_timeout_ms,
                side,
                pose_library,
            } => {
                let mut config = CliConfig::load()?;
                config.tcp = tcp.or(config.tcp);
                config.host = host.or(config.host);
                config.request_timeout_ms = request_timeout_ms.or(config.request_timeout_ms);
                config.side = side.or(config.side);
                config.pose_library = pose_library.or(config.pose_library);
                let path = config.save()?;
                println!("✅ Saved {}", path.display());
                Ok(())
            },

            ConfigCommand::Get => {
                let config = CliConfig::load()?;
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            },

            ConfigCommand::Check => {
                let path = config_file()?;
                println!("Config file: {}", path.display());
                let config = CliConfig::load_from(&path)?;
                if let Some(library) = &config.pose_library
                    && !library.exists()
                {
                    println!("⚠️  Pose library not found: {}", library.display());
                }
                println!("✅ Configuration is valid");
                Ok(())
            },
        }
    }
}
