//! Helpers for accessing the TCP stack from the simulation world.

use crate::proto::tcp::TcpStack;
use crate::sim::World;

use super::{NetApi, NetWorld};

/// 把 TCP 栈暂时从网络中取出，使闭包能同时可变借用两者。
pub(crate) fn with_tcp_stack<F, R>(world: &mut dyn World, f: F) -> Option<R>
where
    F: FnOnce(&mut dyn NetApi, &mut TcpStack) -> R,
{
    let w = world.as_any_mut().downcast_mut::<NetWorld>()?;
    let mut tcp = std::mem::take(&mut w.net.tcp);
    let result = f(&mut w.net, &mut tcp);
    w.net.tcp = tcp;
    Some(result)
}
