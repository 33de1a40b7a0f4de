//! Network-facing API used by protocol stacks.

use crate::sim::{SimTime, Simulator};
use crate::trace::TraceEventKind;

use super::{NodeId, Packet};

/// Minimal network API for protocol stacks.
pub trait NetApi {
    fn make_packet(&mut self, flow_id: u64, size_bytes: u32, route: Vec<NodeId>) -> Packet;
    fn forward_from(&mut self, from: NodeId, pkt: Packet, sim: &mut Simulator);
    fn trace_event(&mut self, now: SimTime, flow_id: Option<u64>, kind: TraceEventKind);
}

impl NetApi for super::Network {
    fn make_packet(&mut self, flow_id: u64, size_bytes: u32, route: Vec<NodeId>) -> Packet {
        super::Network::make_packet(self, flow_id, size_bytes, route)
    }

    fn forward_from(&mut self, from: NodeId, pkt: Packet, sim: &mut Simulator) {
        super::Network::forward_from(self, from, pkt, sim)
    }

    fn trace_event(&mut self, now: SimTime, flow_id: Option<u64>, kind: TraceEventKind) {
        super::Network::trace_event(self, now, flow_id, kind)
    }
}
