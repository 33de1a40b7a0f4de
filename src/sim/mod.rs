//! 仿真核心模块
//!
//! 此模块包含事件驱动仿真的核心组件：仿真时间、事件、世界、仿真器，
//! 以及描述一次实验的场景配置。

mod event;
mod scenario;
mod scheduled_event;
mod simulator;
mod time;
mod world;

pub use event::Event;
pub use scenario::{AppSpec, LinkSpec, ScenarioError, ScenarioSpec};
pub use scheduled_event::ScheduledEvent;
pub use simulator::Simulator;
pub use time::SimTime;
pub use world::World;
