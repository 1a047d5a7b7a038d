//! 协议常量定义

/// 手指数量（拇指、食指、中指、无名指、小指）
pub const FINGER_COUNT: usize = 5;

/// 每根手指的关节数量（掌指、近节、中节、远节）
pub const JOINTS_PER_FINGER: usize = 4;

/// 关节空间命令的关节总数
pub const HAND_JOINT_COUNT: usize = FINGER_COUNT * JOINTS_PER_FINGER;

/// 旋转执行器数量
pub const ROTARY_JOINT_COUNT: usize = 16;

/// 直线执行器数量
pub const LINEAR_JOINT_COUNT: usize = 2;

/// 腕部关节数量
pub const WRIST_JOINT_COUNT: usize = 2;

/// 零位标定掩码长度（与旋转执行器一一对应）
pub const CALIBRATION_MASK_LEN: usize = ROTARY_JOINT_COUNT;

/// 单帧触觉采样的 taxel 总数
pub const TAXEL_COUNT: usize = 100;

/// 触觉分区数量（5 指 × 3 节 + 3 个掌区）
pub const TAXEL_SEGMENT_COUNT: usize = 18;
