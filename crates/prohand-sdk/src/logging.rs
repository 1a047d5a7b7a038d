//! 日志初始化
//!
//! 使用 `tracing-subscriber` 输出到 stderr，过滤规则来自 `RUST_LOG`（默认 `info`），
//! 并通过 `tracing-log` 把 `log` crate 的记录转发到 tracing。

use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 安装全局日志订阅者
///
/// `default_directive` 在 `RUST_LOG` 未设置或无法解析时使用。
/// 已经安装过订阅者时返回错误。
pub fn try_init_logger(default_directive: &str) -> Result<(), BoxError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

/// 以 `info` 为默认级别安装日志，重复调用无副作用
pub fn init_logger() {
    if let Err(e) = try_init_logger("info") {
        tracing::debug!("Logger already initialized: {}", e);
    }
}
