//! 每连接端点的 ECN 状态

use super::error::EcnError;
use super::estimator::{DctcpAlpha, MarkedFraction};
use super::mode::EcnMode;

/// 端点在握手中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcnRole {
    /// 主动打开（发送 SYN）
    Client,
    /// 被动打开（回复 SYN-ACK）
    Server,
}

/// 一个连接端点的 ECN 状态。随连接创建，随连接销毁。
#[derive(Debug, Clone)]
pub struct ConnectionEcnState {
    pub(crate) mode: EcnMode,
    pub(crate) role: Option<EcnRole>,
    pub(crate) handshake_started: bool,
    pub(crate) handshake_done: bool,
    pub(crate) ect_negotiated: bool,
    pub(crate) ce_received: bool,
    pub(crate) last_ece_sent: bool,

    // server: 对端 SYN 是否为 ECN-setup SYN
    pub(crate) peer_ecn_setup: bool,
    // server (EcnPlus): 对端在握手 ACK 中回显了 SYN-ACK 上的 CE
    pub(crate) syn_ack_ce_echoed: bool,

    // sender
    pub(crate) cwr_pending: bool,
    pub(crate) recover: Option<u64>,
    pub(crate) alpha: DctcpAlpha,

    // receiver (DctcpEcn)
    pub(crate) marked: MarkedFraction,
}

impl ConnectionEcnState {
    pub(crate) fn new(mode: EcnMode, g: f64) -> Self {
        Self {
            mode,
            role: None,
            handshake_started: false,
            handshake_done: false,
            ect_negotiated: false,
            ce_received: false,
            last_ece_sent: false,
            peer_ecn_setup: false,
            syn_ack_ce_echoed: false,
            cwr_pending: false,
            recover: None,
            alpha: DctcpAlpha::new(g),
            marked: MarkedFraction::new(g),
        }
    }

    pub fn mode(&self) -> EcnMode {
        self.mode
    }

    /// 覆盖本连接的模式；握手开始后模式不可变。
    pub fn set_mode(&mut self, mode: EcnMode) -> Result<(), EcnError> {
        if self.handshake_started {
            return Err(EcnError::InvalidConfig(format!(
                "cannot change ECN mode to {mode}: handshake already started with {}",
                self.mode
            )));
        }
        self.mode = mode;
        Ok(())
    }

    pub fn role(&self) -> Option<EcnRole> {
        self.role
    }

    pub fn handshake_done(&self) -> bool {
        self.handshake_done
    }

    pub fn ect_negotiated(&self) -> bool {
        self.ect_negotiated
    }

    pub fn ce_received(&self) -> bool {
        self.ce_received
    }

    pub fn last_ece_sent(&self) -> bool {
        self.last_ece_sent
    }

    pub fn syn_ack_ce_echoed(&self) -> bool {
        self.syn_ack_ce_echoed
    }

    pub fn cwr_pending(&self) -> bool {
        self.cwr_pending
    }

    /// 接收端 CE 标记比例（仅 DctcpEcn 下更新）
    pub fn marked_fraction(&self) -> f64 {
        self.marked.value()
    }

    pub fn marked_estimator(&self) -> &MarkedFraction {
        &self.marked
    }

    /// 发送端 DCTCP alpha（仅 DctcpEcn 下更新）
    pub fn dctcp_alpha(&self) -> f64 {
        self.alpha.alpha()
    }
}
