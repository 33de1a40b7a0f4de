//! ECN 控制器
//!
//! 持有连接工厂的默认 ECN 模式，并在每个 TCP 控制路径事件
//! （SYN、SYN-ACK、数据发送/接收、ACK）上决定 IP 头部的 ECT/CE
//! 以及 TCP 头部的 ECE/CWR。
//!
//! 所有 hook 都是纯状态迁移：不做 I/O，由调用方把返回的 [`EcnMarking`]
//! 写进要发出的数据包。

use tracing::{debug, info};

use crate::net::{Ecn, Packet, TcpFlags, Transport};

use super::error::EcnError;
use super::mode::EcnMode;
use super::state::{ConnectionEcnState, EcnRole};

/// 控制器配置（显式传给连接工厂，而不是进程级全局默认值）
#[derive(Debug, Clone, Copy)]
pub struct EcnConfig {
    /// 新建连接的默认模式
    pub default_mode: EcnMode,
    /// DCTCP EWMA 增益 g（典型为 1/16）
    pub dctcp_g: f64,
}

impl Default for EcnConfig {
    fn default() -> Self {
        Self {
            default_mode: EcnMode::ClassicEcn,
            dctcp_g: 1.0 / 16.0,
        }
    }
}

impl EcnConfig {
    pub fn with_mode(mode: EcnMode) -> Self {
        Self {
            default_mode: mode,
            ..Self::default()
        }
    }
}

/// 一次发送需要施加的 ECN 标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EcnMarking {
    /// 追加到 TCP 头部的 ECE/CWR
    pub flags: TcpFlags,
    /// IP 头部 ECN 字段
    pub ip_ecn: Ecn,
}

impl EcnMarking {
    pub fn apply_to(self, pkt: &mut Packet) {
        pkt.ecn = self.ip_ecn;
        if let Transport::Tcp(seg) = &mut pkt.transport {
            seg.flags |= self.flags;
        }
    }
}

/// 发送端收到的一个 ACK
#[derive(Debug, Clone, Copy)]
pub struct AckInfo {
    pub ack: u64,
    pub newly_acked: u64,
    pub flags: TcpFlags,
    /// 当前已发送的最大序号（下一个待发字节）
    pub snd_nxt: u64,
}

#[derive(Debug, Clone, Default)]
pub struct EcnController {
    cfg: EcnConfig,
    handshakes_started: u64,
}

impl EcnController {
    pub fn new(cfg: EcnConfig) -> Self {
        Self {
            cfg,
            handshakes_started: 0,
        }
    }

    pub fn config(&self) -> &EcnConfig {
        &self.cfg
    }

    pub fn default_mode(&self) -> EcnMode {
        self.cfg.default_mode
    }

    /// 已开始握手的端点数
    pub fn handshakes_started(&self) -> u64 {
        self.handshakes_started
    }

    /// 修改新建连接的默认模式。一旦有连接开始握手，默认值即被冻结。
    pub fn configure(&mut self, mode: EcnMode) -> Result<(), EcnError> {
        if self.handshakes_started > 0 {
            return Err(EcnError::InvalidConfig(format!(
                "default ECN mode is frozen after {} handshake(s) started",
                self.handshakes_started
            )));
        }
        if mode != self.cfg.default_mode {
            info!(from = %self.cfg.default_mode, to = %mode, "默认 ECN 模式变更");
        }
        self.cfg.default_mode = mode;
        Ok(())
    }

    pub fn configure_str(&mut self, mode: &str) -> Result<EcnMode, EcnError> {
        let mode: EcnMode = mode.parse()?;
        self.configure(mode)?;
        Ok(mode)
    }

    /// 为新连接端点创建 ECN 状态；`mode` 为每连接覆盖值。
    pub fn new_connection(&self, mode: Option<EcnMode>) -> ConnectionEcnState {
        ConnectionEcnState::new(mode.unwrap_or(self.cfg.default_mode), self.cfg.dctcp_g)
    }

    pub fn mode(&self, st: &ConnectionEcnState) -> EcnMode {
        st.mode
    }

    fn start_handshake(&mut self, st: &mut ConnectionEcnState, role: EcnRole) {
        if !st.handshake_started {
            st.handshake_started = true;
            st.role = Some(role);
            self.handshakes_started = self.handshakes_started.saturating_add(1);
        }
    }

    /// 主动打开：Classic/Dctcp 发送 ECN-setup SYN（ECE+CWR）；EcnPlus 不做特殊标记。
    pub fn on_syn_send(&mut self, st: &mut ConnectionEcnState) -> EcnMarking {
        self.start_handshake(st, EcnRole::Client);
        let marking = match st.mode {
            EcnMode::ClassicEcn => EcnMarking {
                flags: TcpFlags::ECE | TcpFlags::CWR,
                ip_ecn: Ecn::NotEct,
            },
            // DCTCP 对所有包（含控制包）标记 ECT
            EcnMode::DctcpEcn => EcnMarking {
                flags: TcpFlags::ECE | TcpFlags::CWR,
                ip_ecn: Ecn::Ect0,
            },
            EcnMode::EcnPlus => EcnMarking::default(),
        };
        debug!(mode = %st.mode, flags = %marking.flags, ip_ecn = ?marking.ip_ecn, "SYN 标记");
        marking
    }

    /// 被动打开：记录对端 SYN 是否为 ECN-setup SYN。
    pub fn on_syn_received(&mut self, st: &mut ConnectionEcnState, flags: TcpFlags) {
        self.start_handshake(st, EcnRole::Server);
        st.peer_ecn_setup = flags.is_ecn_setup_syn();
        debug!(mode = %st.mode, peer_ecn_setup = st.peer_ecn_setup, "收到 SYN");
    }

    /// SYN-ACK：回显协商结果；EcnPlus 无条件把 SYN-ACK 标记为 ECT(0)。
    pub fn on_syn_ack_send(&self, st: &mut ConnectionEcnState) -> EcnMarking {
        let flags = if st.peer_ecn_setup {
            TcpFlags::ECE
        } else {
            TcpFlags::NONE
        };
        let ip_ecn = match st.mode {
            EcnMode::ClassicEcn => Ecn::NotEct,
            EcnMode::DctcpEcn if st.peer_ecn_setup => Ecn::Ect0,
            EcnMode::DctcpEcn => Ecn::NotEct,
            EcnMode::EcnPlus => Ecn::Ect0,
        };
        debug!(mode = %st.mode, flags = %flags, ip_ecn = ?ip_ecn, "SYN-ACK 标记");
        EcnMarking { flags, ip_ecn }
    }

    /// 主动端收到 SYN-ACK，握手在本端完成。
    pub fn on_syn_ack_received(&self, st: &mut ConnectionEcnState, flags: TcpFlags, ip_ecn: Ecn) {
        st.ect_negotiated = match st.mode {
            EcnMode::ClassicEcn | EcnMode::DctcpEcn => flags.is_ecn_setup_syn_ack(),
            EcnMode::EcnPlus => ip_ecn.is_ecn_capable() || flags.is_ecn_setup_syn_ack(),
        };
        // RFC 5562 §3.2：SYN-ACK 上的 CE 通过握手 ACK 的 ECE 回显
        if st.mode == EcnMode::EcnPlus && ip_ecn.is_ce() {
            st.ce_received = true;
        }
        st.handshake_done = true;
        info!(
            mode = %st.mode,
            negotiated = st.ect_negotiated,
            syn_ack_ecn = ?ip_ecn,
            "ECN 协商结果（主动端）"
        );
    }

    /// 被动端收到握手 ACK。返回 true 表示对端回显了 SYN-ACK 上的 CE。
    pub fn on_handshake_ack_received(&self, st: &mut ConnectionEcnState, flags: TcpFlags) -> bool {
        if st.handshake_done {
            return false;
        }
        st.ect_negotiated = match st.mode {
            EcnMode::ClassicEcn | EcnMode::DctcpEcn => st.peer_ecn_setup,
            EcnMode::EcnPlus => true,
        };
        st.handshake_done = true;
        let echoed = st.mode == EcnMode::EcnPlus && flags.contains(TcpFlags::ECE);
        st.syn_ack_ce_echoed = echoed;
        info!(
            mode = %st.mode,
            negotiated = st.ect_negotiated,
            syn_ack_ce_echoed = echoed,
            "ECN 协商结果（被动端）"
        );
        echoed
    }

    /// 新数据段：协商成功后标记 ECT(0)，并在窗口缩减后携带一次 CWR。
    pub fn on_data_send(&self, st: &mut ConnectionEcnState) -> Result<EcnMarking, EcnError> {
        if !st.handshake_done || !st.ect_negotiated {
            return Err(EcnError::NotNegotiated { mode: st.mode });
        }
        let mut flags = TcpFlags::NONE;
        if st.cwr_pending {
            flags.insert(TcpFlags::CWR);
            st.cwr_pending = false;
        }
        Ok(EcnMarking {
            flags,
            ip_ecn: Ecn::Ect0,
        })
    }

    /// 重传段不携带 ECT（RFC 3168 §6.1.5）
    pub fn on_retransmit_send(&self, _st: &mut ConnectionEcnState) -> EcnMarking {
        EcnMarking::default()
    }

    /// 接收端收到数据段
    pub fn on_data_received(&self, st: &mut ConnectionEcnState, ip_ecn: Ecn, flags: TcpFlags) {
        if !st.ect_negotiated {
            if ip_ecn.is_ce() {
                debug!(mode = %st.mode, "未协商 ECN，忽略 CE");
            }
            return;
        }
        if st.mode.latches_ece() && flags.contains(TcpFlags::CWR) {
            st.ce_received = false;
        }
        if ip_ecn.is_ce() {
            self.on_ce_received(st);
        } else if st.mode.is_dctcp() {
            st.ce_received = false;
            st.marked.observe(false);
        }
    }

    /// 收到 CE：下一个 ACK 携带 ECE；DctcpEcn 下同时更新标记比例估计。
    pub fn on_ce_received(&self, st: &mut ConnectionEcnState) {
        st.ce_received = true;
        if st.mode.is_dctcp() {
            st.marked.observe(true);
        }
        debug!(mode = %st.mode, marked_fraction = st.marked.value(), "收到 CE");
    }

    /// ACK：ECE 反映 `ce_received`；DctcpEcn 协商后纯 ACK 也标记 ECT(0)。
    pub fn on_ack_send(&self, st: &mut ConnectionEcnState) -> EcnMarking {
        let ece = st.ect_negotiated && st.ce_received;
        st.last_ece_sent = ece;
        EcnMarking {
            flags: if ece { TcpFlags::ECE } else { TcpFlags::NONE },
            ip_ecn: if st.mode.is_dctcp() && st.ect_negotiated {
                Ecn::Ect0
            } else {
                Ecn::NotEct
            },
        }
    }

    /// 发送端因丢包（快速重传或 RTO）已缩减窗口。ClassicEcn/EcnPlus 下
    /// 同一窗口内随后到达的 ECE 不再缩减，下一个新数据段携带 CWR。
    pub fn on_loss_reduction(&self, st: &mut ConnectionEcnState, snd_nxt: u64) {
        if !st.ect_negotiated || !st.mode.latches_ece() {
            return;
        }
        st.recover = Some(st.recover.map_or(snd_nxt, |r| r.max(snd_nxt)));
        st.cwr_pending = true;
        debug!(mode = %st.mode, recover = snd_nxt, "丢包缩减窗口，本窗口内忽略 ECE");
    }

    /// 发送端收到 ACK。返回 cwnd 缩减因子（若本次 ACK 触发了拥塞响应）。
    pub fn on_ack_received(&self, st: &mut ConnectionEcnState, info: AckInfo) -> Option<f64> {
        if !st.ect_negotiated {
            return None;
        }
        let ece = info.flags.contains(TcpFlags::ECE);
        let factor = match st.mode {
            EcnMode::DctcpEcn => st.alpha.on_ack(info.ack, info.newly_acked, ece, info.snd_nxt),
            EcnMode::ClassicEcn | EcnMode::EcnPlus => {
                if !ece {
                    return None;
                }
                // 每个窗口至多响应一次
                if st.recover.is_some_and(|r| info.ack <= r) {
                    return None;
                }
                st.recover = Some(info.snd_nxt);
                Some(0.5)
            }
        };
        if factor.is_some() {
            st.cwr_pending = true;
        }
        factor
    }
}
