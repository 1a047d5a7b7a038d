//! ZeroMQ 后端
//!
//! - 命令通道：REQ socket，`zmq::poll` 实现带超时的等待
//! - 流式通道：PUB socket，`DONTWAIT` 发送，高水位时由 ZeroMQ 丢弃
//! - 状态通道：SUB socket，订阅全部消息
//!
//! 驱动进程负责 bind，客户端一律 connect。

use crate::{PublishChannel, RequestChannel, SubscribeChannel, Transport, TransportError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 发送 / 接收高水位
const DEFAULT_HWM: i32 = 1000;

/// ZeroMQ 通道工厂（共享同一个 context）
#[derive(Clone)]
pub struct ZmqTransport {
    context: ::zmq::Context,
}

impl ZmqTransport {
    pub fn new() -> Self {
        Self {
            context: ::zmq::Context::new(),
        }
    }

    fn connect_socket(
        &self,
        kind: ::zmq::SocketType,
        endpoint: &str,
    ) -> Result<::zmq::Socket, TransportError> {
        let socket = self.context.socket(kind)?;
        socket.set_linger(0)?;
        socket.set_sndhwm(DEFAULT_HWM)?;
        socket.set_rcvhwm(DEFAULT_HWM)?;
        if kind == ::zmq::SUB {
            socket.set_subscribe(b"")?;
        }
        socket
            .connect(endpoint)
            .map_err(|e| TransportError::ConnectFailed {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;
        Ok(socket)
    }
}

impl Default for ZmqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ZmqTransport {
    fn open_request(&self, endpoint: &str) -> Result<Box<dyn RequestChannel>, TransportError> {
        let socket = self.connect_socket(::zmq::REQ, endpoint)?;
        info!("[ZMQ-REQ] Connected to {}", endpoint);
        Ok(Box::new(ZmqRequest {
            transport: self.clone(),
            endpoint: endpoint.to_string(),
            socket: Some(socket),
        }))
    }

    fn open_publish(&self, endpoint: &str) -> Result<Box<dyn PublishChannel>, TransportError> {
        let socket = self.connect_socket(::zmq::PUB, endpoint)?;
        info!("[ZMQ-PUB] Connected to {}", endpoint);
        Ok(Box::new(ZmqPublisher {
            endpoint: endpoint.to_string(),
            socket,
        }))
    }

    fn open_subscribe(&self, endpoint: &str) -> Result<Box<dyn SubscribeChannel>, TransportError> {
        let socket = self.connect_socket(::zmq::SUB, endpoint)?;
        info!("[ZMQ-SUB] Connected to {}", endpoint);
        Ok(Box::new(ZmqSubscriber {
            endpoint: endpoint.to_string(),
            socket,
        }))
    }

    fn name(&self) -> &'static str {
        "zmq"
    }
}

/// REQ 通道
///
/// REQ socket 在请求超时后处于等待应答状态，无法再次发送，
/// 因此超时后丢弃 socket，下次请求时重建。
struct ZmqRequest {
    transport: ZmqTransport,
    endpoint: String,
    socket: Option<::zmq::Socket>,
}

impl RequestChannel for ZmqRequest {
    fn request(&mut self, payload: &[u8], timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let socket = match self.socket.take() {
            Some(socket) => socket,
            None => {
                debug!("[ZMQ-REQ] Recreating socket for {}", self.endpoint);
                self.transport.connect_socket(::zmq::REQ, &self.endpoint)?
            }
        };

        socket
            .send(payload, 0)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        let readable = {
            let mut items = [socket.as_poll_item(::zmq::POLLIN)];
            ::zmq::poll(&mut items, timeout.as_millis() as i64)?;
            items[0].is_readable()
        };
        if !readable {
            warn!(
                "[ZMQ-REQ] No reply from {} within {:?}",
                self.endpoint, timeout
            );
            return Err(TransportError::timeout(timeout));
        }

        let reply = socket
            .recv_bytes(0)
            .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;
        self.socket = Some(socket);
        Ok(reply)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

struct ZmqPublisher {
    endpoint: String,
    socket: ::zmq::Socket,
}

impl PublishChannel for ZmqPublisher {
    fn publish(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        match self.socket.send(payload, ::zmq::DONTWAIT) {
            Ok(()) => Ok(()),
            // PUB 在高水位时直接丢弃，不视为错误
            Err(::zmq::Error::EAGAIN) => Ok(()),
            Err(e) => Err(TransportError::SendFailed(e.to_string())),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

struct ZmqSubscriber {
    endpoint: String,
    socket: ::zmq::Socket,
}

impl SubscribeChannel for ZmqSubscriber {
    fn try_recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        match self.socket.recv_bytes(::zmq::DONTWAIT) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(::zmq::Error::EAGAIN) => Ok(None),
            Err(e) => Err(TransportError::ReceiveFailed(e.to_string())),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
