//! Trace hooks for the network.

use crate::sim::SimTime;
use crate::trace::{TraceEvent, TraceEventKind, TraceLinkInfo, TraceLogger, TraceNodeInfo};

use super::Network;

impl Network {
    /// 打开事件记录并写入拓扑元信息（应在拓扑与队列设置完成后调用）
    pub fn enable_trace(&mut self) {
        self.trace = Some(TraceLogger::default());
        self.emit_trace_meta();
    }

    pub fn emit_trace_meta(&mut self) {
        if self.trace.is_none() {
            return;
        }
        let nodes = self
            .node_names
            .iter()
            .enumerate()
            .map(|(id, name)| TraceNodeInfo {
                id,
                name: name.clone(),
            })
            .collect::<Vec<_>>();
        let links = self
            .links
            .iter()
            .map(|l| TraceLinkInfo {
                from: l.from.0,
                to: l.to.0,
                bandwidth_bps: l.rate.bps(),
                latency_ns: l.latency.0,
                q_cap_bytes: l.queue.capacity_bytes(),
                ecn_threshold_bytes: l.ecn_threshold_bytes,
            })
            .collect::<Vec<_>>();
        self.trace_event(SimTime::ZERO, None, TraceEventKind::Meta { nodes, links });
    }

    pub(crate) fn trace_pkt(
        &mut self,
        now: SimTime,
        pkt_id: u64,
        flow_id: u64,
        pkt_bytes: u32,
        kind: TraceEventKind,
    ) {
        if let Some(t) = &mut self.trace {
            t.push(TraceEvent {
                t_ns: now.0,
                pkt_id: Some(pkt_id),
                flow_id: Some(flow_id),
                pkt_bytes: Some(pkt_bytes),
                kind,
            });
        }
    }

    pub(crate) fn trace_event(&mut self, now: SimTime, flow_id: Option<u64>, kind: TraceEventKind) {
        if let Some(t) = &mut self.trace {
            t.push(TraceEvent {
                t_ns: now.0,
                pkt_id: None,
                flow_id,
                pkt_bytes: None,
                kind,
            });
        }
    }
}
