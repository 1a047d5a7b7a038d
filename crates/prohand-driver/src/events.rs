//! 事件钩子（Event Hooks）
//!
//! 核心层不做任何终端输出，只向注册的回调发出结构化事件，
//! 由展示层（CLI、日志、GUI）决定如何呈现。
//!
//! # 使用示例
//!
//! ```rust
//! use prohand_driver::events::{ChannelEventSink, ClientEvent, HookManager};
//! use std::sync::Arc;
//!
//! let mut hooks = HookManager::new();
//! let (sink, rx) = ChannelEventSink::bounded(16);
//! hooks.add_callback(Arc::new(sink));
//!
//! hooks.trigger_all(&ClientEvent::StreamingDisabled);
//! assert!(matches!(rx.try_recv(), Ok(ClientEvent::StreamingDisabled)));
//! ```

use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::time::Duration;

/// 客户端事件
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// 通道句柄已创建（链路可能尚未建立）
    Connected {
        command_endpoint: String,
        streaming: bool,
    },
    /// ping 成功，双向链路确认
    PingSucceeded,
    /// 已发出 set-streaming-mode(true)，`attempt` 从 1 开始计数
    StreamingRequested { attempt: u32 },
    /// 驱动确认进入运行状态
    StreamingConfirmed { elapsed: Duration },
    /// 握手超时未确认
    StreamingFailed { timeout: Duration },
    StreamingDisabled,
    /// 可靠通道命令已被驱动接受
    CommandSent { operation: &'static str },
    /// 流式命令已在本地发出（不代表驱动已收到）
    ///
    /// 按控制频率触发，回调应保持轻量。
    StreamSent { operation: &'static str },
    /// 操作失败
    Error {
        operation: &'static str,
        message: String,
    },
    Closed,
}

/// 事件回调
///
/// 回调在调用线程上同步执行，实现应尽量轻量（推荐转发到 channel）。
pub trait EventCallback: Send + Sync {
    fn on_event(&self, event: &ClientEvent);
}

impl<F> EventCallback for F
where
    F: Fn(&ClientEvent) + Send + Sync,
{
    fn on_event(&self, event: &ClientEvent) {
        self(event)
    }
}

/// 钩子管理器
#[derive(Default, Clone)]
pub struct HookManager {
    callbacks: Vec<Arc<dyn EventCallback>>,
}

impl HookManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_callback(&mut self, callback: Arc<dyn EventCallback>) {
        self.callbacks.push(callback);
    }

    pub fn trigger_all(&self, event: &ClientEvent) {
        for callback in &self.callbacks {
            callback.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
    }
}

impl std::fmt::Debug for HookManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookManager")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

/// 转发到 crossbeam channel 的回调
///
/// 使用 `try_send`：channel 满时丢弃事件，不阻塞控制循环。
pub struct ChannelEventSink {
    sender: Sender<ClientEvent>,
}

impl ChannelEventSink {
    pub fn bounded(capacity: usize) -> (Self, Receiver<ClientEvent>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl EventCallback for ChannelEventSink {
    fn on_event(&self, event: &ClientEvent) {
        let _ = self.sender.try_send(event.clone());
    }
}
