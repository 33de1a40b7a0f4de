//! 结构化事件记录（抓包 + ECN 状态）
//!
//! 仿真结束后以 JSON 数组导出，第一条为 `meta`。
//! `tx_start` 事件即链路上的抓包记录：每个开始序列化的 packet 一条，
//! 带 IP ECN 字段与 TCP 头部，用于离线检查 SYN-ACK 等控制包的标记。

mod types;

pub use types::{
    CaptureRecord, TraceCwndReason, TraceEndpoint, TraceEvent, TraceEventKind, TraceLinkInfo,
    TraceLogger, TraceNodeInfo, TraceTcp,
};
