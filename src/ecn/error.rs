use thiserror::Error;

use super::mode::EcnMode;

/// ECN 控制路径错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcnError {
    /// 非法或不支持的配置（未知模式字符串、握手开始后修改模式）
    #[error("invalid ECN config: {0}")]
    InvalidConfig(String),
    /// 协商完成前尝试做 ECN 标记；调用方应跳过标记并继续发送
    #[error("ECN not negotiated (mode {mode}); marking skipped")]
    NotNegotiated { mode: EcnMode },
}
