//! 测试辅助：模拟驱动 + 虚拟时钟

use crate::state::{Hand, Standby, Streaming};
use prohand_driver::mock::SimulatedHand;
use prohand_driver::{HandshakeConfig, ManualClock, ProHandBuilder};
use prohand_transport::MockBus;
use std::sync::Arc;

/// 已连接、未握手
pub(crate) fn connected() -> (Hand<Standby>, SimulatedHand, ManualClock) {
    let sim = SimulatedHand::new();
    let bus = MockBus::new(sim.clone());
    let clock = ManualClock::new();
    let builder = ProHandBuilder::new()
        .transport(bus.transport())
        .clock(Arc::new(clock.clone()));
    let hand = Hand::connect(builder).unwrap();
    (hand, sim, clock)
}

/// 已确认流式模式（握手消耗的虚拟时间已计入时钟）
pub(crate) fn streaming() -> (Hand<Streaming>, SimulatedHand, ManualClock) {
    let (hand, sim, clock) = connected();
    let hand = hand
        .enable_streaming(&HandshakeConfig::default())
        .unwrap()
        .into_result()
        .unwrap();
    (hand, sim, clock)
}
