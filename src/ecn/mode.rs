//! ECN 模式
//!
//! 连接在握手前选定的 ECN 行为：经典 RFC 3168、DCTCP（RFC 8257）、
//! 以及 ECN+（RFC 5562，SYN-ACK 自身标记为 ECT）。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::EcnError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EcnMode {
    /// RFC 3168：ECE 锁存直到收到 CWR，每个窗口至多减半一次
    #[default]
    ClassicEcn,
    /// RFC 8257：ECE 逐包精确回显，发送端按标记比例缩减窗口
    DctcpEcn,
    /// RFC 5562：在经典 ECN 之上，SYN-ACK 也携带 ECT
    EcnPlus,
}

impl EcnMode {
    pub const ALL: [EcnMode; 3] = [EcnMode::ClassicEcn, EcnMode::DctcpEcn, EcnMode::EcnPlus];

    pub fn as_str(self) -> &'static str {
        match self {
            EcnMode::ClassicEcn => "ClassicEcn",
            EcnMode::DctcpEcn => "DctcpEcn",
            EcnMode::EcnPlus => "EcnPlus",
        }
    }

    /// 数值形式（与日志中 `EcnMode = N` 的输出一致）
    pub fn as_index(self) -> u8 {
        match self {
            EcnMode::ClassicEcn => 0,
            EcnMode::DctcpEcn => 1,
            EcnMode::EcnPlus => 2,
        }
    }

    pub fn is_dctcp(self) -> bool {
        self == EcnMode::DctcpEcn
    }

    /// 接收端是否锁存 ECE 直到收到 CWR
    pub(crate) fn latches_ece(self) -> bool {
        !self.is_dctcp()
    }
}

impl fmt::Display for EcnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EcnMode {
    type Err = EcnError;

    /// 接受 `ClassicEcn` / `classic_ecn` / `classic-ecn` 等写法（大小写不敏感）。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match norm.as_str() {
            "classicecn" | "classic" => Ok(EcnMode::ClassicEcn),
            "dctcpecn" | "dctcp" => Ok(EcnMode::DctcpEcn),
            "ecnplus" | "ecn+" => Ok(EcnMode::EcnPlus),
            _ => Err(EcnError::InvalidConfig(format!(
                "unknown ECN mode {s:?} (expected ClassicEcn, DctcpEcn or EcnPlus)"
            ))),
        }
    }
}
