//! 链路类型
//!
//! 定义点对点单向链路、数据速率及其传输时延计算。

use std::fmt;
use std::str::FromStr;

use super::id::NodeId;
use crate::queue::{DropTailQueue, PacketQueue};
use crate::sim::{ScenarioError, SimTime};

/// 数据速率（bit/s），支持 `"5Mbps"`、`"1Gbps"`、`"64kbps"`、`"9600bps"` 写法。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DataRate(pub u64);

impl DataRate {
    pub fn from_mbps(m: u64) -> Self {
        DataRate(m.saturating_mul(1_000_000))
    }

    pub fn from_gbps(g: u64) -> Self {
        DataRate(g.saturating_mul(1_000_000_000))
    }

    pub fn bps(self) -> u64 {
        self.0
    }

    /// 以该速率发送 `bytes` 字节所需时间（向上取整到纳秒）
    pub fn tx_time(self, bytes: u64) -> SimTime {
        if self.0 == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bits = (bytes as u128).saturating_mul(8);
        let nanos = (bits.saturating_mul(1_000_000_000u128) + (self.0 as u128 - 1)) / self.0 as u128;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

impl FromStr for DataRate {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let split = t
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(t.len());
        let (num, unit) = t.split_at(split);
        let value: f64 = num
            .parse()
            .map_err(|_| ScenarioError::InvalidDataRate(s.to_string()))?;
        let scale = match unit.trim().to_ascii_lowercase().as_str() {
            "" | "bps" | "b/s" => 1.0,
            "kbps" | "kb/s" => 1e3,
            "mbps" | "mb/s" => 1e6,
            "gbps" | "gb/s" => 1e9,
            _ => return Err(ScenarioError::InvalidDataRate(s.to_string())),
        };
        Ok(DataRate((value * scale).round() as u64))
    }
}

/// 网络链路
#[derive(Debug)]
pub struct Link {
    pub from: NodeId,
    pub to: NodeId,
    pub latency: SimTime,
    pub rate: DataRate,
    /// 链路正在序列化一个 packet（直到下一次 `LinkReady`）
    pub busy: bool,
    /// ECN 标记阈值（bytes）。None 表示不开启 ECN 标记。
    pub ecn_threshold_bytes: Option<u64>,
    pub queue: Box<dyn PacketQueue>,
}

impl Link {
    /// 创建新链路（DropTail 队列，容量极大）
    pub fn new(from: NodeId, to: NodeId, latency: SimTime, rate: DataRate) -> Self {
        Self {
            from,
            to,
            latency,
            rate,
            busy: false,
            ecn_threshold_bytes: None,
            queue: Box::new(DropTailQueue::new(u64::MAX)),
        }
    }

    pub(crate) fn tx_time(&self, bytes: u32) -> SimTime {
        self.rate.tx_time(bytes as u64)
    }

    /// 入队后队列积压（含该 packet）达到阈值时，ECT 包应被改写为 CE
    pub(crate) fn should_mark_ce(&self, pkt_bytes: u32) -> bool {
        match self.ecn_threshold_bytes {
            Some(th) => self.queue.bytes().saturating_add(pkt_bytes as u64) >= th,
            None => false,
        }
    }
}
