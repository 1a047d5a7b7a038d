//! 运动控制模块
//!
//! 提供流式运动的高级接口，包括：
//! - `run_fixed_rate` - 固定频率调度器（循环锚点机制）
//! - `CancellationToken` - 协作式取消令牌
//! - `cyclic_positions` / `run_cyclic` - 周期运动轨迹
//! - `GestureSequencer` - 手势序列（Kapandji 测试等）
//! - `run_sweep` - 单关节扫描测试

pub mod cancel;
pub mod cyclic;
pub mod gesture;
pub(crate) mod guard;
pub mod scheduler;
pub mod sweep;

// 重新导出常用类型
pub use cancel::CancellationToken;
pub use cyclic::{CyclicMotionConfig, cyclic_positions, run_cyclic};
pub use gesture::{GestureSequencer, GestureStep, ResolvedStep, kapandji_sequence};
pub use guard::MAX_CONSECUTIVE_FAILURES;
pub use scheduler::{LoopConfig, LoopControl, RunSummary, Tick, run_fixed_rate};
pub use sweep::{SweepConfig, SweepStep, run_sweep, sweep_plan, sweep_range};
