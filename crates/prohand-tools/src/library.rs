//! # TOML 姿态库
//!
//! 加载时一次性校验并转换全部姿态（角度 → 弧度），之后的查询不会再出现格式错误。
//! 缺省关节补 0；数组超长直接报错，不做截断。

use crate::pose::{HandSide, Pose, PoseConfigError, PoseResolver};
use prohand_protocol::{FINGER_COUNT, Finger, JOINTS_PER_FINGER, WRIST_JOINT_COUNT};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// 配置未指定力矩档位时使用的力矩
pub const DEFAULT_TORQUE_LEVEL: f32 = 0.45;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPose {
    thumb: Option<Vec<f32>>,
    index: Option<Vec<f32>>,
    middle: Option<Vec<f32>>,
    ring: Option<Vec<f32>>,
    pinky: Option<Vec<f32>>,
    wrist: Option<Vec<f32>>,
}

impl RawPose {
    fn finger(&self, finger: Finger) -> Option<&[f32]> {
        let values = match finger {
            Finger::Thumb => &self.thumb,
            Finger::Index => &self.index,
            Finger::Middle => &self.middle,
            Finger::Ring => &self.ring,
            Finger::Pinky => &self.pinky,
        };
        values.as_deref()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawLibrary {
    default_torque_level: Option<String>,
    #[serde(default)]
    torque_map: BTreeMap<String, f32>,
    #[serde(default)]
    hands: BTreeMap<String, RawPose>,
    #[serde(default)]
    left: BTreeMap<String, RawPose>,
    #[serde(default)]
    right: BTreeMap<String, RawPose>,
}

/// 姿态库
///
/// 查询顺序：`[left.<name>]` / `[right.<name>]` 优先，其次 `[hands.<name>]`。
#[derive(Debug, Clone, PartialEq)]
pub struct PoseLibrary {
    shared: BTreeMap<String, Pose>,
    left: BTreeMap<String, Pose>,
    right: BTreeMap<String, Pose>,
    torque_level: f32,
}

impl Default for PoseLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseLibrary {
    /// 空姿态库（力矩为 [`DEFAULT_TORQUE_LEVEL`]）
    pub fn new() -> Self {
        Self {
            shared: BTreeMap::new(),
            left: BTreeMap::new(),
            right: BTreeMap::new(),
            torque_level: DEFAULT_TORQUE_LEVEL,
        }
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PoseConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| PoseConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> Result<Self, PoseConfigError> {
        let raw: RawLibrary =
            toml::from_str(content).map_err(|e| PoseConfigError::Parse(e.to_string()))?;

        if raw.hands.is_empty() && raw.left.is_empty() && raw.right.is_empty() {
            return Err(PoseConfigError::MissingHands);
        }

        let torque_level = match &raw.default_torque_level {
            Some(level) => {
                let value = *raw
                    .torque_map
                    .get(level)
                    .ok_or_else(|| PoseConfigError::UnknownTorqueLevel(level.clone()))?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(PoseConfigError::InvalidTorque {
                        level: level.clone(),
                        value,
                    });
                }
                value
            },
            None => DEFAULT_TORQUE_LEVEL,
        };

        Ok(Self {
            shared: convert_all(&raw.hands)?,
            left: convert_all(&raw.left)?,
            right: convert_all(&raw.right)?,
            torque_level,
        })
    }

    /// 添加两侧共用的姿态
    pub fn insert(&mut self, name: impl Into<String>, pose: Pose) {
        self.shared.insert(name.into(), pose);
    }

    /// 添加某一侧专用的姿态
    pub fn insert_for(&mut self, side: HandSide, name: impl Into<String>, pose: Pose) {
        self.side_map_mut(side).insert(name.into(), pose);
    }

    pub fn with_torque_level(mut self, torque: f32) -> Self {
        self.torque_level = torque;
        self
    }

    /// 姿态流使用的力矩（`torque_map[default_torque_level]`）
    pub fn torque_level(&self) -> f32 {
        self.torque_level
    }

    /// 全部姿态名（去重、排序）
    pub fn names(&self) -> Vec<String> {
        self.shared
            .keys()
            .chain(self.left.keys())
            .chain(self.right.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.is_empty() && self.left.is_empty() && self.right.is_empty()
    }

    fn side_map(&self, side: HandSide) -> &BTreeMap<String, Pose> {
        match side {
            HandSide::Left => &self.left,
            HandSide::Right => &self.right,
        }
    }

    fn side_map_mut(&mut self, side: HandSide) -> &mut BTreeMap<String, Pose> {
        match side {
            HandSide::Left => &mut self.left,
            HandSide::Right => &mut self.right,
        }
    }
}

impl PoseResolver for PoseLibrary {
    fn resolve(&self, name: &str, side: HandSide) -> Result<Pose, PoseConfigError> {
        self.side_map(side)
            .get(name)
            .or_else(|| self.shared.get(name))
            .copied()
            .ok_or_else(|| PoseConfigError::UnknownPose {
                name: name.to_string(),
                available: self.names(),
            })
    }
}

fn convert_all(raw: &BTreeMap<String, RawPose>) -> Result<BTreeMap<String, Pose>, PoseConfigError> {
    raw.iter()
        .map(|(name, pose)| Ok((name.clone(), convert_pose(name, pose)?)))
        .collect()
}

fn convert_pose(name: &str, raw: &RawPose) -> Result<Pose, PoseConfigError> {
    let mut fingers = [[0.0; JOINTS_PER_FINGER]; FINGER_COUNT];
    for finger in Finger::ALL {
        fingers[finger.index()] = degrees_to_radians::<JOINTS_PER_FINGER>(
            name,
            finger.name(),
            raw.finger(finger),
        )?;
    }
    let wrist = match raw.wrist.as_deref() {
        Some(values) => Some(degrees_to_radians::<WRIST_JOINT_COUNT>(
            name,
            "wrist",
            Some(values),
        )?),
        None => None,
    };
    Ok(Pose { fingers, wrist })
}

fn degrees_to_radians<const N: usize>(
    pose: &str,
    field: &str,
    values: Option<&[f32]>,
) -> Result<[f32; N], PoseConfigError> {
    let mut out = [0.0; N];
    let Some(values) = values else {
        return Ok(out);
    };
    if values.len() > N {
        return Err(PoseConfigError::Malformed {
            pose: pose.to_string(),
            reason: format!("{} has {} values, at most {} allowed", field, values.len(), N),
        });
    }
    for (slot, &deg) in out.iter_mut().zip(values) {
        if !deg.is_finite() {
            return Err(PoseConfigError::Malformed {
                pose: pose.to_string(),
                reason: format!("{} contains a non-finite angle", field),
            });
        }
        *slot = deg.to_radians();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
default_torque_level = "medium"

[torque_map]
low = 0.3
medium = 0.6

[hands.finger_down_0]
thumb = [90.0, 0.0, 0.0, 0.0]
index = [0.0, 45.0]

[hands.finger_down_1]
thumb = [60.0, 20.0, 10.0, 10.0]
wrist = [10.0]

[right.finger_down_1]
thumb = [30.0, 20.0, 10.0, 10.0]
"#;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_parse_converts_degrees_and_pads() {
        let library = PoseLibrary::from_toml_str(SAMPLE).unwrap();
        let pose = library.resolve("finger_down_0", HandSide::Left).unwrap();

        assert!(approx(pose.finger(Finger::Thumb)[0], std::f32::consts::FRAC_PI_2));
        // index 只给了两个值，其余补 0
        let index = pose.finger(Finger::Index);
        assert!(approx(index[1], std::f32::consts::FRAC_PI_4));
        assert_eq!(index[2], 0.0);
        assert_eq!(index[3], 0.0);
        // 未配置的手指全部为 0
        assert_eq!(pose.finger(Finger::Pinky), [0.0; 4]);
        assert_eq!(pose.wrist, None);
    }

    #[test]
    fn test_short_wrist_is_padded() {
        let library = PoseLibrary::from_toml_str(SAMPLE).unwrap();
        let pose = library.resolve("finger_down_1", HandSide::Left).unwrap();
        let wrist = pose.wrist.unwrap();
        assert!(approx(wrist[0], 10f32.to_radians()));
        assert_eq!(wrist[1], 0.0);
    }

    #[test]
    fn test_side_override_takes_precedence() {
        let library = PoseLibrary::from_toml_str(SAMPLE).unwrap();
        let left = library.resolve("finger_down_1", HandSide::Left).unwrap();
        let right = library.resolve("finger_down_1", HandSide::Right).unwrap();
        assert!(approx(left.finger(Finger::Thumb)[0], 60f32.to_radians()));
        assert!(approx(right.finger(Finger::Thumb)[0], 30f32.to_radians()));
        // 右手覆盖没有 wrist，不会回退到共用姿态的 wrist
        assert_eq!(right.wrist, None);
    }

    #[test]
    fn test_torque_level_from_map() {
        let library = PoseLibrary::from_toml_str(SAMPLE).unwrap();
        assert_eq!(library.torque_level(), 0.6);

        let library = PoseLibrary::from_toml_str("[hands.open]\n").unwrap();
        assert_eq!(library.torque_level(), DEFAULT_TORQUE_LEVEL);
    }

    #[test]
    fn test_unknown_torque_level_is_error() {
        let content = "default_torque_level = \"max\"\n[hands.open]\n";
        assert!(matches!(
            PoseLibrary::from_toml_str(content),
            Err(PoseConfigError::UnknownTorqueLevel(level)) if level == "max"
        ));

        let content = "default_torque_level = \"x\"\n[torque_map]\nx = 1.5\n[hands.open]\n";
        assert!(matches!(
            PoseLibrary::from_toml_str(content),
            Err(PoseConfigError::InvalidTorque { .. })
        ));
    }

    #[test]
    fn test_unknown_pose_lists_available() {
        let library = PoseLibrary::from_toml_str(SAMPLE).unwrap();
        match library.resolve("fist", HandSide::Left) {
            Err(PoseConfigError::UnknownPose { name, available }) => {
                assert_eq!(name, "fist");
                assert_eq!(available, vec!["finger_down_0", "finger_down_1"]);
            },
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_too_many_values_is_malformed() {
        let content = "[hands.bad]\nindex = [1.0, 2.0, 3.0, 4.0, 5.0]\n";
        assert!(matches!(
            PoseLibrary::from_toml_str(content),
            Err(PoseConfigError::Malformed { pose, .. }) if pose == "bad"
        ));

        let content = "[hands.bad]\nwrist = [1.0, 2.0, 3.0]\n";
        assert!(matches!(
            PoseLibrary::from_toml_str(content),
            Err(PoseConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn test_unknown_finger_key_is_parse_error() {
        let content = "[hands.bad]\nthumbs = [1.0]\n";
        assert!(matches!(
            PoseLibrary::from_toml_str(content),
            Err(PoseConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_hands_section() {
        assert!(matches!(
            PoseLibrary::from_toml_str("default_torque_level = \"low\"\n"),
            Err(PoseConfigError::MissingHands)
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let library = PoseLibrary::load(file.path()).unwrap();
        assert_eq!(library.names().len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PoseLibrary::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, PoseConfigError::Io { .. }));
    }

    #[test]
    fn test_programmatic_library() {
        let mut library = PoseLibrary::new().with_torque_level(0.2);
        library.insert("open", Pose::zero());
        library.insert_for(HandSide::Right, "pinch", Pose::zero().with_wrist([0.1, 0.0]));

        assert!(library.resolve("open", HandSide::Right).is_ok());
        assert!(library.resolve("pinch", HandSide::Right).is_ok());
        assert!(library.resolve("pinch", HandSide::Left).is_err());
        assert_eq!(library.names(), vec!["open", "pinch"]);
        assert_eq!(library.torque_level(), 0.2);
    }
}
