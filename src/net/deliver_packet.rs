//! 数据包交付事件

use super::id::NodeId;
use super::net_world::NetWorld;
use super::packet::Packet;
use crate::sim::{Event, Simulator, World};
use tracing::{trace, warn};

/// 事件：把一个 packet 交给某个节点处理。
#[derive(Debug)]
pub struct DeliverPacket {
    pub to: NodeId,
    pub pkt: Packet,
}

impl Event for DeliverPacket {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverPacket { to, pkt } = *self;
        trace!(
            pkt_id = pkt.id,
            flow_id = pkt.flow_id,
            size_bytes = pkt.size_bytes,
            to = ?to,
            now = ?sim.now(),
            "📨 数据包到达节点"
        );
        let Some(w) = world.as_any_mut().downcast_mut::<NetWorld>() else {
            warn!("world is not a NetWorld; packet dropped");
            return;
        };
        w.net.deliver(to, pkt, sim);
    }
}
