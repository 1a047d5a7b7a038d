//! 模拟驱动进程
//!
//! 配合 `prohand_transport::MockBus` 使用，无需真实驱动即可测试完整的
//! 连接 → ping → 握手 → 流式发送 → 关闭 流程。
//!
//! ```rust,ignore
//! use prohand_driver::mock::SimulatedHand;
//! use prohand_driver::{HandshakeConfig, ProHandBuilder};
//! use prohand_transport::MockBus;
//!
//! let sim = SimulatedHand::new();
//! let bus = MockBus::new(sim.clone());
//! let mut hand = ProHandBuilder::new().transport(bus.transport()).build().unwrap();
//! hand.ping().unwrap();
//! assert_eq!(sim.log().len(), 1);
//! ```

use parking_lot::Mutex;
use prohand_protocol::*;
use prohand_transport::{MockRemote, TransportError};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// 模拟驱动收到的一条消息
#[derive(Debug, Clone, PartialEq)]
pub enum SimEntry {
    Request(Request),
    Stream {
        endpoint: String,
        message: StreamMessage,
    },
}

#[derive(Debug, Clone, Copy)]
struct ScriptedFailure {
    code: ResultCode,
    /// 前 `after` 次调用正常处理
    after: u32,
}

#[derive(Debug)]
struct SimState {
    run_state: RunState,
    /// 需要多少次 set-streaming-mode(true) 才进入运行状态；`None` 表示永不确认
    confirm_after: Option<u32>,
    enable_requests: u32,
    profiler_available: bool,
    publishing: bool,
    sample_pending: bool,
    rotary_positions: [f32; ROTARY_JOINT_COUNT],
    failures: HashMap<&'static str, ScriptedFailure>,
    calls: HashMap<&'static str, u32>,
    log: Vec<SimEntry>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            run_state: RunState::Idle,
            confirm_after: Some(1),
            enable_requests: 0,
            profiler_available: true,
            publishing: true,
            sample_pending: true,
            rotary_positions: [0.0; ROTARY_JOINT_COUNT],
            failures: HashMap::new(),
            calls: HashMap::new(),
            log: Vec::new(),
        }
    }
}

/// 模拟灵巧手驱动（克隆后共享状态，测试端保留一份用于检查）
#[derive(Debug, Clone, Default)]
pub struct SimulatedHand {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedHand {
    pub fn new() -> Self {
        Self::default()
    }

    /// 第 `n` 次 set-streaming-mode(true) 后进入运行状态
    pub fn confirm_after(&self, n: u32) {
        self.state.lock().confirm_after = Some(n.max(1));
    }

    /// 永远不进入运行状态
    pub fn never_confirm(&self) {
        self.state.lock().confirm_after = None;
    }

    /// 是否编译了腕部运动规划器
    pub fn set_profiler_available(&self, available: bool) {
        self.state.lock().profiler_available = available;
    }

    /// 是否发布状态样本
    pub fn set_publishing(&self, publishing: bool) {
        self.state.lock().publishing = publishing;
    }

    /// 指定操作始终返回错误码
    pub fn fail_operation(&self, operation: &'static str, code: ResultCode) {
        self.fail_operation_after(operation, 0, code);
    }

    /// 指定操作在前 `after` 次成功后返回错误码
    pub fn fail_operation_after(&self, operation: &'static str, after: u32, code: ResultCode) {
        let mut state = self.state.lock();
        let done = state.calls.get(operation).copied().unwrap_or(0);
        state.failures.insert(
            operation,
            ScriptedFailure {
                code,
                after: done + after,
            },
        );
    }

    pub fn run_state(&self) -> RunState {
        self.state.lock().run_state
    }

    /// 收到的全部请求和流式消息（按顺序）
    pub fn log(&self) -> Vec<SimEntry> {
        self.state.lock().log.clone()
    }

    /// 只保留流式消息
    pub fn streamed(&self) -> Vec<StreamMessage> {
        self.log()
            .into_iter()
            .filter_map(|entry| match entry {
                SimEntry::Stream { message, .. } => Some(message),
                SimEntry::Request(_) => None,
            })
            .collect()
    }

    fn handle(state: &mut SimState, request: &Request) -> Reply {
        let operation = request.name();
        let count = state.calls.entry(operation).or_insert(0);
        *count += 1;
        let count = *count;

        if let Some(failure) = state.failures.get(operation)
            && count > failure.after
        {
            return Reply::error(failure.code, format!("scripted failure for {}", operation));
        }

        match request {
            Request::SetStreamingMode { enabled: true } => {
                state.enable_requests += 1;
                if state
                    .confirm_after
                    .is_some_and(|n| state.enable_requests >= n)
                {
                    state.run_state = RunState::Running;
                }
            },
            Request::SetStreamingMode { enabled: false } => {
                state.run_state = RunState::Idle;
                state.enable_requests = 0;
            },
            Request::Rotary(cmd) => state.rotary_positions = cmd.positions,
            Request::SetWristLimits(_) if !state.profiler_available => {
                return Reply::error(ResultCode::Unsupported, "motion profiler not available");
            },
            _ => {},
        }
        Reply::success()
    }
}

impl MockRemote for SimulatedHand {
    fn on_request(&mut self, _endpoint: &str, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.lock();
        let reply = match Request::decode(payload) {
            Ok(request) => {
                let reply = Self::handle(&mut state, &request);
                state.log.push(SimEntry::Request(request));
                reply
            },
            Err(e) => Reply::error(ResultCode::InvalidArgument, e.to_string()),
        };
        reply
            .encode()
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn on_publish(&mut self, endpoint: &str, payload: &[u8]) {
        let mut state = self.state.lock();
        if let Ok(message) = StreamMessage::decode(payload) {
            if let StreamMessage::Rotary(cmd) = &message
                && state.run_state == RunState::Running
            {
                state.rotary_positions = cmd.positions;
            }
            state.log.push(SimEntry::Stream {
                endpoint: endpoint.to_string(),
                message,
            });
        }
    }

    /// 每两次轮询产生一个样本，模拟固定频率发布
    fn poll_status(&mut self, _endpoint: &str) -> Option<Vec<u8>> {
        let mut state = self.state.lock();
        if !state.publishing {
            return None;
        }
        if !state.sample_pending {
            state.sample_pending = true;
            return None;
        }
        state.sample_pending = false;
        let status = HandStatus::rotary(state.rotary_positions, state.run_state);
        StatusMessage::Hand(status).encode().ok()
    }
}

/// 模拟触觉手套驱动（只发布状态）
#[derive(Debug, Clone, Default)]
pub struct SimulatedGlove {
    samples: Arc<Mutex<VecDeque<Vec<u8>>>>,
}

impl SimulatedGlove {
    pub fn new() -> Self {
        Self::default()
    }

    /// 排队一帧触觉样本
    pub fn push_sample(&self, status: &TactileStatus) {
        if let Ok(bytes) = StatusMessage::Tactile(TactileFrame::from(status)).encode() {
            self.samples.lock().push_back(bytes);
        }
    }

    /// 排队任意原始字节（用于测试解码失败）
    pub fn push_raw(&self, bytes: Vec<u8>) {
        self.samples.lock().push_back(bytes);
    }

    pub fn pending(&self) -> usize {
        self.samples.lock().len()
    }
}

impl MockRemote for SimulatedGlove {
    fn on_request(&mut self, endpoint: &str, _payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::ConnectFailed {
            endpoint: endpoint.to_string(),
            message: "glove has no command channel".to_string(),
        })
    }

    fn poll_status(&mut self, _endpoint: &str) -> Option<Vec<u8>> {
        self.samples.lock().pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(sim: &mut SimulatedHand, request: Request) -> Reply {
        let bytes = sim.on_request("cmd", &request.encode().unwrap()).unwrap();
        Reply::decode(&bytes).unwrap()
    }

    #[test]
    fn test_enters_running_after_enable() {
        let mut sim = SimulatedHand::new();
        assert_eq!(sim.run_state(), RunState::Idle);
        assert!(roundtrip(&mut sim, Request::SetStreamingMode { enabled: true }).is_success());
        assert_eq!(sim.run_state(), RunState::Running);
        assert!(roundtrip(&mut sim, Request::SetStreamingMode { enabled: false }).is_success());
        assert_eq!(sim.run_state(), RunState::Idle);
    }

    #[test]
    fn test_scripted_failure_after_n_calls() {
        let mut sim = SimulatedHand::new();
        sim.fail_operation_after("ping", 2, ResultCode::Connection);
        assert!(roundtrip(&mut sim, Request::Ping).is_success());
        assert!(roundtrip(&mut sim, Request::Ping).is_success());
        let reply = roundtrip(&mut sim, Request::Ping);
        assert_eq!(reply.result_code(), Some(ResultCode::Connection));
    }

    #[test]
    fn test_poll_status_alternates() {
        let mut sim = SimulatedHand::new();
        assert!(sim.poll_status("status").is_some());
        assert!(sim.poll_status("status").is_none());
        assert!(sim.poll_status("status").is_some());
    }

    #[test]
    fn test_glove_queue() {
        let mut glove = SimulatedGlove::new();
        glove.push_sample(&TactileStatus::new(1, 1, [0; TAXEL_COUNT]));
        assert_eq!(glove.pending(), 1);
        assert!(glove.poll_status("status").is_some());
        assert!(glove.poll_status("status").is_none());
        assert!(glove.on_request("cmd", &[]).is_err());
    }
}
