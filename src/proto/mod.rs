//! 传输层/协议模块
//!
//! 简化 TCP 实现（用于仿真实验），ECN 行为由 `crate::ecn` 决定。

pub mod tcp;

// Transport tag types live in `net::transport`.
