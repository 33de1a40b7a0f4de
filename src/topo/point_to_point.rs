//! 点对点拓扑构建

use crate::net::{DataRate, NetWorld, NodeId};
use crate::sim::SimTime;

/// 点对点链路配置选项
#[derive(Debug, Clone)]
pub struct PointToPointOpts {
    pub rate: DataRate,
    pub delay: SimTime,
    /// 每方向发送队列容量（bytes）；None 表示几乎无限
    pub queue_bytes: Option<u64>,
    /// 每方向 CE 标记阈值（bytes）；None 表示不标记
    pub ecn_threshold_bytes: Option<u64>,
}

impl Default for PointToPointOpts {
    fn default() -> Self {
        Self {
            rate: DataRate::from_mbps(5),
            delay: SimTime::from_millis(2),
            queue_bytes: None,
            ecn_threshold_bytes: None,
        }
    }
}

/// 构建两节点点对点拓扑
///
/// 拓扑结构：n0 <-> n1
/// 返回：(发送端, 接收端, 路由路径)
pub fn build_point_to_point(world: &mut NetWorld, opts: &PointToPointOpts) -> (NodeId, NodeId, Vec<NodeId>) {
    let n0 = world.net.add_host("n0");
    let n1 = world.net.add_host("n1");

    world.net.connect(n0, n1, opts.delay, opts.rate);
    world.net.connect(n1, n0, opts.delay, opts.rate);

    for (a, b) in [(n0, n1), (n1, n0)] {
        if let Some(cap) = opts.queue_bytes {
            world.net.set_link_queue_capacity_bytes(a, b, cap);
        }
        if let Some(th) = opts.ecn_threshold_bytes {
            world.net.set_link_ecn_threshold_bytes(a, b, th);
        }
    }

    (n0, n1, vec![n0, n1])
}
