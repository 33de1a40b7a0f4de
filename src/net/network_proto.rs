//! Protocol dispatch hooks for the network.

use crate::sim::Simulator;
use crate::trace::TraceEventKind;
use tracing::{debug, info};

use super::{Network, NodeId, Packet, Transport};

impl Network {
    /// 数据包送达目的地时的处理
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id, flow_id = pkt.flow_id))]
    pub(crate) fn on_delivered(&mut self, at: NodeId, pkt: Packet, sim: &mut Simulator) {
        info!("✅ 数据包送达目的地");

        self.stats.delivered_pkts += 1;
        self.stats.delivered_bytes += pkt.size_bytes as u64;
        debug!(
            size_bytes = pkt.size_bytes,
            ip_ecn = ?pkt.ecn,
            delivered_pkts = self.stats.delivered_pkts,
            delivered_bytes = self.stats.delivered_bytes,
            "更新统计信息"
        );
        self.trace_pkt(
            sim.now(),
            pkt.id,
            pkt.flow_id,
            pkt.size_bytes,
            TraceEventKind::Delivered { node: at.0 },
        );

        // 传输层处理：接收端产生 ACK、发送端处理 ACK 驱动继续发送
        if let Transport::Tcp(seg) = pkt.transport {
            let mut tcp = std::mem::take(&mut self.tcp);
            tcp.on_tcp_segment(pkt.flow_id, at, seg, pkt.ecn, sim, self);
            self.tcp = tcp;
        }
    }
}
