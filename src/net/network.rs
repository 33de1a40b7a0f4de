//! 网络拓扑管理
//!
//! 定义网络拓扑结构，包含节点、链路、数据包转发、CE 标记和统计信息。

use std::collections::HashMap;

use super::deliver_packet::DeliverPacket;
use super::id::{LinkId, NodeId};
use super::link::{DataRate, Link};
use super::link_ready::LinkReady;
use super::node::{Host, Node};
use super::packet::{Ecn, Packet};
use super::stats::Stats;
use crate::proto::tcp::TcpStack;
use crate::queue::DropTailQueue;
use crate::sim::{SimTime, Simulator};
use crate::trace::{CaptureRecord, TraceEventKind, TraceLogger, TraceTcp};
use tracing::{debug, trace, warn};

/// 网络拓扑
#[derive(Default)]
pub struct Network {
    nodes: Vec<Option<Box<dyn Node>>>,
    pub(crate) node_names: Vec<String>,
    pub(crate) links: Vec<Link>,
    edges: HashMap<(NodeId, NodeId), LinkId>,
    next_pkt_id: u64,
    pub stats: Stats,
    /// TCP 协议栈（连接工厂 + 连接表）
    pub tcp: TcpStack,
    /// 抓包/事件记录；None 表示关闭
    pub trace: Option<TraceLogger>,
}

impl Network {
    /// 添加主机节点
    pub fn add_host(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let name = name.into();
        self.node_names.push(name.clone());
        self.nodes.push(Some(Box::new(Host::new(id, name))));
        id
    }

    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        self.node_names.get(id.0).map(String::as_str)
    }

    /// 连接两个节点（创建单向链路）
    pub fn connect(&mut self, from: NodeId, to: NodeId, latency: SimTime, rate: DataRate) -> LinkId {
        let id = LinkId(self.links.len());
        self.links.push(Link::new(from, to, latency, rate));
        self.edges.insert((from, to), id);
        id
    }

    pub fn link_id(&self, from: NodeId, to: NodeId) -> Option<LinkId> {
        self.edges.get(&(from, to)).copied()
    }

    pub fn link(&self, from: NodeId, to: NodeId) -> Option<&Link> {
        self.link_id(from, to).map(|id| &self.links[id.0])
    }

    fn link_mut(&mut self, from: NodeId, to: NodeId) -> Option<&mut Link> {
        let id = self.link_id(from, to)?;
        self.links.get_mut(id.0)
    }

    /// 设置单向链路的发送队列容量（bytes），返回链路是否存在
    pub fn set_link_queue_capacity_bytes(&mut self, from: NodeId, to: NodeId, cap_bytes: u64) -> bool {
        match self.link_mut(from, to) {
            Some(link) => {
                link.queue = Box::new(DropTailQueue::new(cap_bytes));
                true
            }
            None => false,
        }
    }

    /// 设置单向链路的 CE 标记阈值（bytes），返回链路是否存在
    pub fn set_link_ecn_threshold_bytes(&mut self, from: NodeId, to: NodeId, threshold: u64) -> bool {
        match self.link_mut(from, to) {
            Some(link) => {
                link.ecn_threshold_bytes = Some(threshold);
                true
            }
            None => false,
        }
    }

    /// 创建数据包
    pub fn make_packet(&mut self, flow_id: u64, size_bytes: u32, route: Vec<NodeId>) -> Packet {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        Packet::new(id, flow_id, size_bytes, route)
    }

    /// 将数据包交付给节点处理
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id, to = ?to))]
    pub fn deliver(&mut self, to: NodeId, pkt: Packet, sim: &mut Simulator) {
        // 暂时把节点取出来，避免 &mut self 与 &mut node 的重叠借用。
        let Some(mut node) = self.nodes.get_mut(to.0).and_then(Option::take) else {
            warn!("目标节点不存在，丢弃数据包");
            self.stats.dropped_pkts += 1;
            self.stats.dropped_bytes += pkt.size_bytes as u64;
            return;
        };
        trace!(node_name = %node.name(), "取出节点");
        node.on_packet(pkt, sim, self);
        self.nodes[to.0] = Some(node);
    }

    /// 从指定节点把数据包放到通往下一跳的链路队列上
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id, from = ?from, hop = pkt.hop))]
    pub fn forward_from(&mut self, from: NodeId, mut pkt: Packet, sim: &mut Simulator) {
        let Some(to) = pkt.next() else {
            warn!("数据包没有下一跳，丢弃");
            self.stats.dropped_pkts += 1;
            self.stats.dropped_bytes += pkt.size_bytes as u64;
            return;
        };
        let Some(link_id) = self.link_id(from, to) else {
            warn!(to = ?to, "没有到下一跳的链路，丢弃");
            self.stats.dropped_pkts += 1;
            self.stats.dropped_bytes += pkt.size_bytes as u64;
            return;
        };
        let now = sim.now();
        let link = &mut self.links[link_id.0];

        let mut ce_mark = None;
        if pkt.ecn.is_ect() && link.should_mark_ce(pkt.size_bytes) {
            pkt.ecn = Ecn::Ce;
            ce_mark = Some((
                link.queue.bytes(),
                link.ecn_threshold_bytes.unwrap_or_default(),
            ));
        }

        let (pkt_id, flow_id, size) = (pkt.id, pkt.flow_id, pkt.size_bytes);
        let (q_bytes, q_cap) = (link.queue.bytes(), link.queue.capacity_bytes());
        let idle = !link.busy;
        match link.queue.enqueue(pkt) {
            Ok(()) => {
                if let Some((q_bytes, threshold_bytes)) = ce_mark {
                    self.stats.ce_marked_pkts += 1;
                    debug!(q_bytes, threshold_bytes, "🔥 ECT 包被标记为 CE");
                    self.trace_pkt(
                        now,
                        pkt_id,
                        flow_id,
                        size,
                        TraceEventKind::CeMark {
                            link_from: from.0,
                            link_to: to.0,
                            q_bytes,
                            threshold_bytes,
                        },
                    );
                }
                if idle {
                    self.start_tx(link_id, sim);
                }
            }
            Err(dropped) => {
                debug!(q_bytes, q_cap, "队列已满，尾丢弃");
                self.stats.dropped_pkts += 1;
                self.stats.dropped_bytes += dropped.size_bytes as u64;
                self.trace_pkt(
                    now,
                    pkt_id,
                    flow_id,
                    size,
                    TraceEventKind::Drop {
                        link_from: from.0,
                        link_to: to.0,
                        q_bytes,
                        q_cap_bytes: q_cap,
                    },
                );
            }
        }
    }

    /// 链路空闲时取队首 packet 开始序列化
    fn start_tx(&mut self, link_id: LinkId, sim: &mut Simulator) {
        let link = &mut self.links[link_id.0];
        let Some(pkt) = link.queue.dequeue() else {
            link.busy = false;
            return;
        };
        link.busy = true;
        let now = sim.now();
        let depart = now.saturating_add(link.tx_time(pkt.size_bytes));
        let arrive = depart.saturating_add(link.latency);
        let (from, to) = (link.from, link.to);

        trace!(depart = ?depart, arrive = ?arrive, "开始发送");

        if self.trace.is_some() {
            let rec = CaptureRecord {
                link_from: from.0,
                link_to: to.0,
                depart_ns: depart.0,
                arrive_ns: arrive.0,
                ip_ecn: pkt.ecn,
                tcp: pkt.tcp().map(TraceTcp::from),
            };
            self.trace_pkt(now, pkt.id, pkt.flow_id, pkt.size_bytes, TraceEventKind::TxStart(rec));
        }

        sim.schedule(depart, LinkReady { link_id });
        sim.schedule(arrive, DeliverPacket { to, pkt: pkt.advance() });
    }

    /// 链路完成一次序列化
    pub(crate) fn on_link_ready(&mut self, link_id: LinkId, sim: &mut Simulator) {
        let Some(link) = self.links.get_mut(link_id.0) else {
            return;
        };
        link.busy = false;
        if !link.queue.is_empty() {
            self.start_tx(link_id, sim);
        }
    }
}
