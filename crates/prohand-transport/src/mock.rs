//! 进程内模拟总线
//!
//! 所有通道共享一个 [`MockBus`]：
//! - 请求交给 [`MockRemote::on_request`] 同步应答
//! - 发布交给 [`MockRemote::on_publish`]
//! - 订阅从 [`MockRemote::poll_status`] 拉取
//!
//! 每次调用都按顺序记录到 dispatch 日志，测试可以据此断言命令顺序。

use crate::{PublishChannel, RequestChannel, SubscribeChannel, Transport, TransportError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// 通道类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Request,
    Publish,
    Subscribe,
}

/// 一次通道调用的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub endpoint: String,
    pub kind: ChannelKind,
    pub payload: Vec<u8>,
}

/// 模拟的远端（驱动进程）
pub trait MockRemote: Send {
    fn on_request(&mut self, endpoint: &str, payload: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// 带调用方等待上限的请求；需要模拟阻塞或超时的远端覆盖此方法
    fn on_timed_request(
        &mut self,
        endpoint: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let _ = timeout;
        self.on_request(endpoint, payload)
    }

    fn on_publish(&mut self, endpoint: &str, payload: &[u8]) {
        let _ = (endpoint, payload);
    }

    fn poll_status(&mut self, endpoint: &str) -> Option<Vec<u8>> {
        let _ = endpoint;
        None
    }
}

struct BusInner {
    remote: Box<dyn MockRemote>,
    log: Vec<Dispatch>,
    refuse_connect: bool,
    open_channels: usize,
    released_channels: usize,
}

/// 共享的模拟总线
#[derive(Clone)]
pub struct MockBus {
    inner: Arc<Mutex<BusInner>>,
}

impl MockBus {
    pub fn new(remote: impl MockRemote + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                remote: Box::new(remote),
                log: Vec::new(),
                refuse_connect: false,
                open_channels: 0,
                released_channels: 0,
            })),
        }
    }

    /// 之后的 `open_*` 调用全部失败
    pub fn refuse_connect(&self, refuse: bool) {
        self.inner.lock().refuse_connect = refuse;
    }

    /// 全部调用记录（按时间顺序）
    pub fn dispatch_log(&self) -> Vec<Dispatch> {
        self.inner.lock().log.clone()
    }

    pub fn clear_log(&self) {
        self.inner.lock().log.clear();
    }

    /// 当前仍存活的通道数量
    pub fn open_channels(&self) -> usize {
        self.inner.lock().open_channels
    }

    /// 已释放的通道数量
    pub fn released_channels(&self) -> usize {
        self.inner.lock().released_channels
    }

    pub fn transport(&self) -> MockTransport {
        MockTransport { bus: self.clone() }
    }

    fn open(&self, endpoint: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        if inner.refuse_connect {
            return Err(TransportError::ConnectFailed {
                endpoint: endpoint.to_string(),
                message: "connection refused by mock bus".to_string(),
            });
        }
        inner.open_channels += 1;
        Ok(())
    }

    fn release(&self) {
        let mut inner = self.inner.lock();
        inner.open_channels = inner.open_channels.saturating_sub(1);
        inner.released_channels += 1;
    }

    fn record(inner: &mut BusInner, endpoint: &str, kind: ChannelKind, payload: &[u8]) {
        inner.log.push(Dispatch {
            endpoint: endpoint.to_string(),
            kind,
            payload: payload.to_vec(),
        });
    }
}

/// 基于 [`MockBus`] 的通道工厂
#[derive(Clone)]
pub struct MockTransport {
    bus: MockBus,
}

impl MockTransport {
    pub fn bus(&self) -> &MockBus {
        &self.bus
    }
}

impl Transport for MockTransport {
    fn open_request(&self, endpoint: &str) -> Result<Box<dyn RequestChannel>, TransportError> {
        self.bus.open(endpoint)?;
        Ok(Box::new(MockChannel::new(self.bus.clone(), endpoint)))
    }

    fn open_publish(&self, endpoint: &str) -> Result<Box<dyn PublishChannel>, TransportError> {
        self.bus.open(endpoint)?;
        Ok(Box::new(MockChannel::new(self.bus.clone(), endpoint)))
    }

    fn open_subscribe(&self, endpoint: &str) -> Result<Box<dyn SubscribeChannel>, TransportError> {
        self.bus.open(endpoint)?;
        Ok(Box::new(MockChannel::new(self.bus.clone(), endpoint)))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

struct MockChannel {
    bus: MockBus,
    endpoint: String,
}

impl MockChannel {
    fn new(bus: MockBus, endpoint: &str) -> Self {
        Self {
            bus,
            endpoint: endpoint.to_string(),
        }
    }
}

impl Drop for MockChannel {
    fn drop(&mut self) {
        self.bus.release();
    }
}

impl RequestChannel for MockChannel {
    fn request(&mut self, payload: &[u8], timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let mut inner = self.bus.inner.lock();
        MockBus::record(&mut inner, &self.endpoint, ChannelKind::Request, payload);
        inner.remote.on_timed_request(&self.endpoint, payload, timeout)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PublishChannel for MockChannel {
    fn publish(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.bus.inner.lock();
        MockBus::record(&mut inner, &self.endpoint, ChannelKind::Publish, payload);
        inner.remote.on_publish(&self.endpoint, payload);
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SubscribeChannel for MockChannel {
    fn try_recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut inner = self.bus.inner.lock();
        let sample = inner.remote.poll_status(&self.endpoint);
        if let Some(bytes) = &sample {
            MockBus::record(&mut inner, &self.endpoint, ChannelKind::Subscribe, bytes);
        }
        Ok(sample)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
