//! # ProHand Tools - 姿态数据与配置
//!
//! **依赖原则**: 只依赖 `prohand-protocol`，不依赖驱动层和客户端层
//!
//! ## 包含模块
//!
//! - `pose` - 姿态数据结构与 [`PoseResolver`] 查询接口
//! - `library` - TOML 姿态库（[`PoseLibrary`]）
//!
//! ## 姿态库格式
//!
//! ```toml
//! default_torque_level = "medium"
//!
//! [torque_map]
//! low = 0.3
//! medium = 0.45
//!
//! [hands.finger_down_1]
//! thumb = [60.0, 20.0, 10.0, 10.0]
//! index = [0.0, 40.0, 40.0, 20.0]
//! wrist = [0.0, 0.0]
//!
//! # 可选：某一侧手的覆盖
//! [right.finger_down_1]
//! thumb = [55.0, 20.0, 10.0, 10.0]
//! ```
//!
//! 关节角以角度给出，加载时转换为弧度。

pub mod library;
pub mod pose;

pub use library::{DEFAULT_TORQUE_LEVEL, PoseLibrary};
pub use pose::{HandSide, Pose, PoseConfigError, PoseResolver};
