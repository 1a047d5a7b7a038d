//! 客户端接口模块
//!
//! 本模块提供 ProHand 灵巧手的用户友好接口，包括：
//! - Type State Pattern（`Hand<Standby>` / `Hand<Streaming>`，编译期保证只有握手成功后才能流式发送）
//! - 周期运动轨迹生成（纯函数）
//! - 手势序列（姿态 + 持续时间）
//! - 固定频率调度（绝对时间锚点，无累积漂移）
//! - 单关节扫描测试
//! - 动捕手套数据重定向（[`retarget`]）
//!
//! 所有长时间运行的循环都在每次迭代开始时检查 [`CancellationToken`]，
//! 退出时先发送零位命令再关闭流式模式。

pub mod control;
mod error;
pub mod retarget;
pub mod state;

#[cfg(test)]
mod test_support;

pub use control::{
    CancellationToken, CyclicMotionConfig, GestureSequencer, GestureStep, LoopConfig, LoopControl,
    ResolvedStep, RunSummary, SweepConfig, Tick, cyclic_positions, kapandji_sequence, run_cyclic,
    run_fixed_rate, run_sweep,
};
pub use error::ControlError;
pub use retarget::GloveDataMapper;
pub use state::{Hand, Standby, Streaming, StreamingOutcome};
