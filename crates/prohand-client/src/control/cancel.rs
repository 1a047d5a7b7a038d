//! 协作式取消令牌
//!
//! 长时间运行的循环在每次迭代开始时检查令牌；信号处理函数（Ctrl-C）只负责置位。
//!
//! ```rust
//! use prohand_client::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let handle = token.clone();
//! assert!(!token.is_cancelled());
//! handle.cancel();
//! assert!(token.is_cancelled());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 可克隆的取消令牌（克隆共享同一个标志）
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消（幂等）
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
