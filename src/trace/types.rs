use serde::{Deserialize, Serialize};

use crate::ecn::EcnMode;
use crate::net::{Ecn, SegmentKind, TcpFlags, TcpSegment};

/// 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEventKind {
    /// 拓扑元信息（t=0 的第一条事件）
    Meta {
        nodes: Vec<TraceNodeInfo>,
        links: Vec<TraceLinkInfo>,
    },
    /// packet 出队并开始发送（抓包点）
    TxStart(CaptureRecord),
    /// 链路把 ECT 包改写为 CE
    CeMark {
        link_from: usize,
        link_to: usize,
        q_bytes: u64,
        threshold_bytes: u64,
    },
    /// DropTail 丢包
    Drop {
        link_from: usize,
        link_to: usize,
        q_bytes: u64,
        q_cap_bytes: u64,
    },
    /// packet 在目的节点交付
    Delivered { node: usize },
    /// 一端完成握手时的 ECN 协商结果
    EcnNegotiated {
        conn_id: u64,
        endpoint: TraceEndpoint,
        mode: EcnMode,
        negotiated: bool,
    },
    /// 定时记录的 socket EcnMode
    SocketEcnMode {
        conn_id: u64,
        endpoint: TraceEndpoint,
        mode: EcnMode,
    },
    /// 发送端 cwnd 变化
    TcpCwnd {
        conn_id: u64,
        cwnd_bytes: u64,
        ssthresh_bytes: u64,
        alpha: f64,
        reason: TraceCwndReason,
    },
    /// RTO 超时
    TcpRto { conn_id: u64, seq: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEndpoint {
    Sender,
    Receiver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceCwndReason {
    Init,
    Ack,
    EcnEcho,
    FastRetransmit,
    Rto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceNodeInfo {
    pub id: usize,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceLinkInfo {
    pub from: usize,
    pub to: usize,
    pub bandwidth_bps: u64,
    pub latency_ns: u64,
    pub q_cap_bytes: u64,
    pub ecn_threshold_bytes: Option<u64>,
}

/// TCP 头部快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceTcp {
    pub segment: SegmentKind,
    pub flags: TcpFlags,
    pub seq: u64,
    pub ack: u64,
    pub len: u32,
}

impl From<&TcpSegment> for TraceTcp {
    fn from(seg: &TcpSegment) -> Self {
        Self {
            segment: seg.kind(),
            flags: seg.flags,
            seq: seg.seq,
            ack: seg.ack,
            len: seg.len,
        }
    }
}

/// 一条抓包记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub link_from: usize,
    pub link_to: usize,
    pub depart_ns: u64,
    pub arrive_ns: u64,
    pub ip_ecn: Ecn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp: Option<TraceTcp>,
}

impl CaptureRecord {
    pub fn segment(&self) -> Option<SegmentKind> {
        self.tcp.map(|t| t.segment)
    }

    pub fn has_flag(&self, flag: TcpFlags) -> bool {
        self.tcp.is_some_and(|t| t.flags.contains(flag))
    }
}

/// 一个事件（JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// 仿真时间（纳秒，和 `SimTime.0` 同口径）
    pub t_ns: u64,
    pub pkt_id: Option<u64>,
    pub flow_id: Option<u64>,
    pub pkt_bytes: Option<u32>,
    #[serde(flatten)]
    pub kind: TraceEventKind,
}

/// 事件收集器（存内存，仿真结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct TraceLogger {
    pub events: Vec<TraceEvent>,
}

impl TraceLogger {
    pub fn push(&mut self, ev: TraceEvent) {
        self.events.push(ev);
    }

    /// 所有抓包记录（按发送顺序）
    pub fn captures(&self) -> impl Iterator<Item = &CaptureRecord> + '_ {
        self.events.iter().filter_map(|ev| match &ev.kind {
            TraceEventKind::TxStart(rec) => Some(rec),
            _ => None,
        })
    }

    /// 某类 TCP 段的第一条抓包记录
    pub fn first_capture_of(&self, kind: SegmentKind) -> Option<&CaptureRecord> {
        self.captures().find(|rec| rec.segment() == Some(kind))
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.events)
    }
}
