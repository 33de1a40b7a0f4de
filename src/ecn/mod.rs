//! ECN 控制路径
//!
//! 每连接的 ECN 模式（ClassicEcn / DctcpEcn / EcnPlus）与对应的
//! 握手协商、数据路径标记、CE 回显以及发送端拥塞响应。

mod controller;
mod error;
mod estimator;
mod mode;
mod state;

pub use controller::{AckInfo, EcnConfig, EcnController, EcnMarking};
pub use error::EcnError;
pub use estimator::{DctcpAlpha, MarkedFraction};
pub use mode::EcnMode;
pub use state::{ConnectionEcnState, EcnRole};
