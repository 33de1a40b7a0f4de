//! 数据包类型
//!
//! 定义网络数据包、IP 头部的 ECN 字段及其相关操作。

use serde::{Deserialize, Serialize};

use super::id::NodeId;
use super::transport::{TcpSegment, Transport};

/// IP 头部中的 ECN 字段（RFC 3168 §5）。
///
/// ```text
///   ECT   CE
///    0     0   Not-ECT
///    0     1   ECT(1)
///    1     0   ECT(0)
///    1     1   CE
/// ```
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ecn {
    #[default]
    NotEct = 0b00,
    Ect1 = 0b01,
    Ect0 = 0b10,
    Ce = 0b11,
}

impl Ecn {
    /// 从 IP 头部的两位 ECN 字段构造
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b01 => Ecn::Ect1,
            0b10 => Ecn::Ect0,
            0b11 => Ecn::Ce,
            _ => Ecn::NotEct,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// ECT(0) 或 ECT(1)：允许交换机改写为 CE
    pub fn is_ect(self) -> bool {
        matches!(self, Ecn::Ect0 | Ecn::Ect1)
    }

    pub fn is_ce(self) -> bool {
        self == Ecn::Ce
    }

    /// 发送端声明了 ECN 能力（ECT 或已被标记为 CE）
    pub fn is_ecn_capable(self) -> bool {
        self != Ecn::NotEct
    }
}

/// 网络数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub flow_id: u64,
    pub size_bytes: u32,
    pub src: NodeId,
    pub dst: NodeId,
    pub route: Vec<NodeId>,
    pub hop: usize, // 当前所在节点在 route 中的索引
    pub ecn: Ecn,
    pub transport: Transport,
}

impl Packet {
    /// 按预设路径创建数据包（route 至少包含源和目的两个节点）
    pub fn new(id: u64, flow_id: u64, size_bytes: u32, route: Vec<NodeId>) -> Self {
        let src = route.first().copied().unwrap_or(NodeId(0));
        let dst = route.last().copied().unwrap_or(src);
        Self {
            id,
            flow_id,
            size_bytes,
            src,
            dst,
            route,
            hop: 0,
            ecn: Ecn::NotEct,
            transport: Transport::None,
        }
    }

    /// 获取当前所在节点
    pub fn at(&self) -> NodeId {
        self.route.get(self.hop).copied().unwrap_or(self.dst)
    }

    /// 检查是否有下一跳
    pub fn has_next(&self) -> bool {
        self.hop + 1 < self.route.len()
    }

    /// 获取下一跳节点（如果有）
    pub fn next(&self) -> Option<NodeId> {
        self.route.get(self.hop + 1).copied()
    }

    /// 前进到下一跳
    pub fn advance(mut self) -> Self {
        self.hop += 1;
        self
    }

    pub fn tcp(&self) -> Option<&TcpSegment> {
        match &self.transport {
            Transport::Tcp(seg) => Some(seg),
            Transport::None => None,
        }
    }
}
