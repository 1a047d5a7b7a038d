//! 动捕手套数据重定向
//!
//! 手套数据以 JSON 报文到达（报文前可能有非 JSON 前缀，从第一个 `{"` 开始解析），
//! 关节参数位于树中任意位置的 `"Parameter": [{"Name": "l0", "Value": 12.5}, ...]` 数组。
//!
//! 每个关节：夹紧到手套输入范围 → 归一化到 0 - 1 → 取反（拇指 0 号关节除外）
//! → 缩放到机械手范围 → 转换为弧度。缺失的关节输出 0。

use prohand_protocol::{FINGER_COUNT, Finger, HAND_JOINT_COUNT, JOINTS_PER_FINGER, JointCommand};
use prohand_tools::HandSide;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::trace;

type RangeTable = [[(f32, f32); JOINTS_PER_FINGER]; FINGER_COUNT];

/// 手套参数名（拇指 → 小指，每指 metacarpal → distal）
const LEFT_JOINT_MAP: [[&str; JOINTS_PER_FINGER]; FINGER_COUNT] = [
    ["l20", "l2", "l1", "l0"],
    ["l7", "l6", "l5", "l4"],
    ["l11", "l10", "l9", "l8"],
    ["l15", "l14", "l13", "l12"],
    ["l19", "l18", "l17", "l16"],
];

const RIGHT_JOINT_MAP: [[&str; JOINTS_PER_FINGER]; FINGER_COUNT] = [
    ["r20", "r2", "r1", "r0"],
    ["r7", "r6", "r5", "r4"],
    ["r11", "r10", "r9", "r8"],
    ["r15", "r14", "r13", "r12"],
    ["r19", "r18", "r17", "r16"],
];

/// 手套输入范围（度）
const GLOVE_RANGES_DEG: RangeTable = [
    [(0.0, 40.0), (-60.0, 0.0), (-60.0, 0.0), (-70.0, 10.0)],
    [(-25.0, 0.0), (-80.0, 0.0), (-100.0, 0.0), (-80.0, 0.0)],
    [(-4.5, 4.5), (-80.0, 0.0), (-100.0, 0.0), (-80.0, 0.0)],
    [(0.0, 15.0), (-80.0, 0.0), (-100.0, 0.0), (-80.0, 0.0)],
    [(0.0, 35.0), (-80.0, 0.0), (-100.0, 0.0), (-80.0, 0.0)],
];

/// 机械手输出范围（度）
const ROBOT_RANGES_DEG: RangeTable = [
    [(0.0, 130.0), (-30.0, 60.0), (-20.0, 90.0), (-15.0, 90.0)],
    [(-15.0, 30.0), (-20.0, 90.0), (-15.0, 90.0), (0.0, 90.0)],
    [(-15.0, 15.0), (-20.0, 90.0), (-15.0, 90.0), (0.0, 90.0)],
    [(-15.0, 15.0), (-20.0, 90.0), (-15.0, 90.0), (0.0, 90.0)],
    [(-30.0, 15.0), (-20.0, 90.0), (-15.0, 90.0), (0.0, 90.0)],
];

/// 手套参数 → 关节命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GloveDataMapper {
    side: HandSide,
}

impl GloveDataMapper {
    pub fn new(side: HandSide) -> Self {
        Self { side }
    }

    pub fn side(&self) -> HandSide {
        self.side
    }

    fn joint_map(&self) -> &'static [[&'static str; JOINTS_PER_FINGER]; FINGER_COUNT] {
        match self.side {
            HandSide::Left => &LEFT_JOINT_MAP,
            HandSide::Right => &RIGHT_JOINT_MAP,
        }
    }

    /// 是否保留该参数名（另一侧的前缀被丢弃，无前缀的名字保留）
    fn accepts(&self, name: &str) -> bool {
        match self.side {
            HandSide::Left => name.starts_with('l') || !name.starts_with('r'),
            HandSide::Right => name.starts_with('r') || !name.starts_with('l'),
        }
    }

    /// 从 JSON 树中收集本侧的 `Name -> Value`
    ///
    /// 按文档顺序深度优先遍历，重名时后出现的值覆盖先出现的。带 `Parameter`
    /// 数组的对象不再向下遍历。`Value` 可以是数字或数字字符串。
    pub fn extract_parameters(&self, root: &Value) -> BTreeMap<String, f32> {
        let mut params = BTreeMap::new();
        self.visit(root, &mut params);
        params
    }

    fn visit(&self, value: &Value, params: &mut BTreeMap<String, f32>) {
        match value {
            Value::Object(map) => match map.get("Parameter") {
                Some(Value::Array(entries)) => {
                    for entry in entries {
                        let name = entry.get("Name").and_then(Value::as_str);
                        let number = entry.get("Value").and_then(parameter_value);
                        if let (Some(name), Some(number)) = (name, number)
                            && self.accepts(name)
                        {
                            params.insert(name.to_string(), number);
                        }
                    }
                },
                _ => map.values().for_each(|child| self.visit(child, params)),
            },
            Value::Array(items) => items.iter().for_each(|item| self.visit(item, params)),
            _ => {},
        }
    }

    /// 参数映射为关节命令（弧度）
    pub fn map_parameters(&self, params: &BTreeMap<String, f32>, torque: f32) -> JointCommand {
        let mut positions = [0.0f32; HAND_JOINT_COUNT];
        for finger in Finger::ALL {
            let f = finger.index();
            for j in 0..JOINTS_PER_FINGER {
                let Some(&value) = params.get(self.joint_map()[f][j]) else {
                    continue;
                };
                let invert = !(finger.is_thumb() && j == 0);
                let deg = map_joint(value, GLOVE_RANGES_DEG[f][j], ROBOT_RANGES_DEG[f][j], invert);
                positions[f * JOINTS_PER_FINGER + j] = deg.to_radians();
            }
        }
        JointCommand::new(positions, torque)
    }

    /// 处理一个原始报文；无法解析时返回 `None`
    pub fn process(&self, datagram: &[u8], torque: f32) -> Option<JointCommand> {
        let root = parse_datagram(datagram)?;
        let params = self.extract_parameters(&root);
        trace!("Glove datagram with {} parameters", params.len());
        Some(self.map_parameters(&params, torque))
    }
}

/// 参数值：数字、数字字符串或布尔值
fn parameter_value(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// 从第一个 `{"` 开始解析第一个 JSON 值
pub fn parse_datagram(datagram: &[u8]) -> Option<Value> {
    let text = std::str::from_utf8(datagram).ok()?;
    let start = text.find("{\"")?;
    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<Value>()
        .next()?
        .ok()
}

fn map_joint(value: f32, input: (f32, f32), output: (f32, f32), invert: bool) -> f32 {
    let (in_min, in_max) = input;
    let span = in_max - in_min;
    let clamped = value.clamp(in_min, in_max);
    let mut s01 = if span.abs() < f32::EPSILON {
        0.0
    } else {
        (clamped - in_min) / span
    };
    if invert {
        s01 = 1.0 - s01;
    }
    let (out_min, out_max) = output;
    out_min + s01 * (out_max - out_min)
}
