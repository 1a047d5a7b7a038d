//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use prohand_sdk::prelude::*;
//! ```

// 客户端层
pub use prohand_client::{
    CancellationToken, ControlError, CyclicMotionConfig, GestureSequencer, GestureStep,
    GloveDataMapper, Hand, LoopConfig, LoopControl, RunSummary, Standby, Streaming,
    StreamingOutcome, SweepConfig, cyclic_positions, kapandji_sequence, run_cyclic,
    run_fixed_rate, run_sweep,
};

// 驱动层
pub use prohand_driver::{
    ClientEvent, Clock, DriverError, EndpointConfig, ErrorKind, HandshakeConfig, HandshakeState,
    ProGlove, ProHand, ProHandBuilder, SystemClock,
};

// 数据模型
pub use prohand_protocol::{
    Finger, FingerJoint, HandStatus, JointCommand, RunState, TactileStatus, TaxelSegment,
    WristCommand,
};

// 姿态库
pub use prohand_tools::{HandSide, Pose, PoseLibrary, PoseResolver};
