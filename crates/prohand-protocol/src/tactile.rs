//! 手套触觉采样
//!
//! 每帧采样 100 个 taxel，按静态布局划分为 18 个分区：
//!
//! | 分区 | DIP | MCP | PIP |
//! |------|-----|-----|-----|
//! | 拇指 | 6 | 10 | 4 |
//! | 其余四指 | 4 | 2 | 2 |
//!
//! 另有上 / 中 / 下三个掌区，各 16 个 taxel。每个 taxel 为 0-255 的压力值。

use crate::command::Finger;
use crate::constants::{TAXEL_COUNT, TAXEL_SEGMENT_COUNT};
use crate::{ProtocolError, to_array};
use serde::{Deserialize, Serialize};

/// 触觉分区（顺序即扁平布局顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaxelSegment {
    ThumbDip,
    ThumbMcp,
    ThumbPip,
    IndexDip,
    IndexMcp,
    IndexPip,
    MiddleDip,
    MiddleMcp,
    MiddlePip,
    RingDip,
    RingMcp,
    RingPip,
    PinkyDip,
    PinkyMcp,
    PinkyPip,
    UpperPalm,
    MiddlePalm,
    LowerPalm,
}

/// 静态 taxel 布局：(分区, 起始偏移, 长度)
const TAXEL_MAP: [(TaxelSegment, usize, usize); TAXEL_SEGMENT_COUNT] = [
    (TaxelSegment::ThumbDip, 0, 6),
    (TaxelSegment::ThumbMcp, 6, 10),
    (TaxelSegment::ThumbPip, 16, 4),
    (TaxelSegment::IndexDip, 20, 4),
    (TaxelSegment::IndexMcp, 24, 2),
    (TaxelSegment::IndexPip, 26, 2),
    (TaxelSegment::MiddleDip, 28, 4),
    (TaxelSegment::MiddleMcp, 32, 2),
    (TaxelSegment::MiddlePip, 34, 2),
    (TaxelSegment::RingDip, 36, 4),
    (TaxelSegment::RingMcp, 40, 2),
    (TaxelSegment::RingPip, 42, 2),
    (TaxelSegment::PinkyDip, 44, 4),
    (TaxelSegment::PinkyMcp, 48, 2),
    (TaxelSegment::PinkyPip, 50, 2),
    (TaxelSegment::UpperPalm, 52, 16),
    (TaxelSegment::MiddlePalm, 68, 16),
    (TaxelSegment::LowerPalm, 84, 16),
];

impl TaxelSegment {
    pub const ALL: [TaxelSegment; TAXEL_SEGMENT_COUNT] = {
        let mut all = [TaxelSegment::ThumbDip; TAXEL_SEGMENT_COUNT];
        let mut i = 0;
        while i < TAXEL_SEGMENT_COUNT {
            all[i] = TAXEL_MAP[i].0;
            i += 1;
        }
        all
    };

    /// 分区在扁平布局中的起始偏移
    pub const fn offset(self) -> usize {
        TAXEL_MAP[self as usize].1
    }

    /// 分区包含的 taxel 数量
    pub const fn len(self) -> usize {
        TAXEL_MAP[self as usize].2
    }

    /// 分区所属手指（掌区返回 `None`）
    pub const fn finger(self) -> Option<Finger> {
        Finger::from_index(self as usize / 3)
    }

    pub const fn name(self) -> &'static str {
        match self {
            TaxelSegment::ThumbDip => "t_dip",
            TaxelSegment::ThumbMcp => "t_mcp",
            TaxelSegment::ThumbPip => "t_pip",
            TaxelSegment::IndexDip => "i_dip",
            TaxelSegment::IndexMcp => "i_mcp",
            TaxelSegment::IndexPip => "i_pip",
            TaxelSegment::MiddleDip => "m_dip",
            TaxelSegment::MiddleMcp => "m_mcp",
            TaxelSegment::MiddlePip => "m_pip",
            TaxelSegment::RingDip => "r_dip",
            TaxelSegment::RingMcp => "r_mcp",
            TaxelSegment::RingPip => "r_pip",
            TaxelSegment::PinkyDip => "p_dip",
            TaxelSegment::PinkyMcp => "p_mcp",
            TaxelSegment::PinkyPip => "p_pip",
            TaxelSegment::UpperPalm => "upper_palm",
            TaxelSegment::MiddlePalm => "middle_palm",
            TaxelSegment::LowerPalm => "lower_palm",
        }
    }
}

/// 触觉采样（一帧）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TactileStatus {
    pub is_valid: bool,
    /// 毫秒时间戳（回绕）
    pub timestamp_ms: u32,
    /// 采样唯一 ID
    pub uid: u32,
    taxels: [u8; TAXEL_COUNT],
}

impl TactileStatus {
    pub const fn new(timestamp_ms: u32, uid: u32, taxels: [u8; TAXEL_COUNT]) -> Self {
        Self {
            is_valid: true,
            timestamp_ms,
            uid,
            taxels,
        }
    }

    /// 从扁平字节构造（长度必须为 100）
    pub fn from_flat(timestamp_ms: u32, uid: u32, taxels: &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self::new(timestamp_ms, uid, to_array("taxels", taxels)?))
    }

    /// 扁平布局的全部 taxel
    pub fn as_flat(&self) -> &[u8; TAXEL_COUNT] {
        &self.taxels
    }

    /// 某个分区的 taxel
    pub fn segment(&self, segment: TaxelSegment) -> &[u8] {
        let start = segment.offset();
        &self.taxels[start..start + segment.len()]
    }

    /// 分区压力总和
    pub fn segment_pressure(&self, segment: TaxelSegment) -> u32 {
        self.segment(segment).iter().map(|v| u32::from(*v)).sum()
    }

    /// 全部 taxel 压力总和
    pub fn total_pressure(&self) -> u32 {
        self.taxels.iter().map(|v| u32::from(*v)).sum()
    }
}

/// 触觉采样的线上格式（taxel 以变长字节串传输，解码时校验长度）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TactileFrame {
    pub is_valid: bool,
    pub timestamp_ms: u32,
    pub uid: u32,
    pub taxels: Vec<u8>,
}

impl From<&TactileStatus> for TactileFrame {
    fn from(status: &TactileStatus) -> Self {
        Self {
            is_valid: status.is_valid,
            timestamp_ms: status.timestamp_ms,
            uid: status.uid,
            taxels: status.taxels.to_vec(),
        }
    }
}

impl TryFrom<TactileFrame> for TactileStatus {
    type Error = ProtocolError;

    fn try_from(frame: TactileFrame) -> Result<Self, Self::Error> {
        let mut status = TactileStatus::from_flat(frame.timestamp_ms, frame.uid, &frame.taxels)?;
        status.is_valid = frame.is_valid;
        Ok(status)
    }
}
