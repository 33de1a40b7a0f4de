//! 网络世界实现
//!
//! 定义网络仿真的世界（World）实现，持有网络拓扑与 TCP 栈。

use super::network::Network;
use crate::proto::tcp::TcpStack;
use crate::sim::World;
use std::any::Any;

/// 默认的网络世界实现：持有 Network。
#[derive(Default)]
pub struct NetWorld {
    pub net: Network,
}

impl NetWorld {
    /// 使用给定的 TCP 栈（连接工厂）创建世界
    pub fn with_tcp(tcp: TcpStack) -> Self {
        let mut w = Self::default();
        w.net.tcp = tcp;
        w
    }
}

impl World for NetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
