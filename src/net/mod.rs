//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件：节点、链路、数据包（含 IP ECN 字段）、
//! 拓扑与转发，以及把到达的 TCP 段交给协议栈的分发逻辑。

mod api;
mod deliver_packet;
mod id;
mod link;
mod link_ready;
mod net_world;
mod network;
mod network_proto;
mod network_trace;
mod node;
mod packet;
mod proto_bridge;
mod stats;
mod transport;

pub use api::NetApi;
pub use deliver_packet::DeliverPacket;
pub use id::{LinkId, NodeId};
pub use link::{DataRate, Link};
pub use link_ready::LinkReady;
pub use net_world::NetWorld;
pub use network::Network;
pub use node::{Host, Node};
pub use packet::{Ecn, Packet};
pub(crate) use proto_bridge::with_tcp_stack;
pub use stats::Stats;
pub use transport::{SegmentKind, TcpFlags, TcpSegment, Transport};
