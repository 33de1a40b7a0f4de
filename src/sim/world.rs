//! 世界 trait
//!
//! 仿真世界由业务层实现（这里是持有网络与 TCP 栈的 `NetWorld`），
//! 事件通过 `as_any_mut` 取回具体类型。

use super::simulator::Simulator;
use std::any::Any;

pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 每个事件执行完后回调
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
