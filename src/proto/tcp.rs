//! TCP（简化版）协议实现
//!
//! 目标：支持两节点 ECN 实验所需的功能：
//! - 三次握手（SYN / SYN-ACK / ACK），在握手中协商 ECN
//! - 数据段/ACK 段，ECN 标记由 [`EcnController`] 决定
//! - Reno 风格的拥塞控制（慢启动 + AIMD，含 3 dupACK 快速重传）
//! - 对 ECE 的拥塞响应（ClassicEcn/EcnPlus 每窗口减半，DctcpEcn 按 alpha 缩减）
//! - 超时重传（指数退避的 RTO），SYN 同样会重传
//!
//! 数据单向流动：`src` 为主动打开的发送端，`dst` 为被动打开的接收端。
//! 不实现窗口通告/选择确认/连接关闭。

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::ecn::{AckInfo, ConnectionEcnState, EcnConfig, EcnController, EcnError, EcnMarking, EcnMode};
use crate::net::{with_tcp_stack, DataRate, Ecn, NetApi, NodeId, TcpFlags, TcpSegment, Transport};
use crate::sim::{Event, SimTime, Simulator, World};
use crate::trace::{TraceCwndReason, TraceEndpoint, TraceEventKind};

/// 一个 TCP 连接的唯一标识（复用 `flow_id` 的语义）。
pub type TcpConnId = u64;

/// 建立连接时返回的类型化句柄，后续查询（模式、统计）都通过它进行。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TcpConnHandle(TcpConnId);

impl TcpConnHandle {
    pub fn id(self) -> TcpConnId {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// MSS（数据段载荷大小，字节）
    pub mss: u32,
    /// 控制包（SYN / SYN-ACK / ACK）大小（字节）
    pub ack_bytes: u32,
    /// 数据段的 IP+TCP 头部开销（字节）
    pub header_bytes: u32,
    /// 初始 cwnd（字节）
    pub init_cwnd_bytes: u64,
    /// 初始 ssthresh（字节）
    pub init_ssthresh_bytes: u64,
    /// 初始 RTO
    pub init_rto: SimTime,
    /// 最大 RTO（用于退避上限）
    pub max_rto: SimTime,
    /// 发送端 ECN 模式覆盖（None 表示使用工厂默认值）
    pub sender_ecn_mode: Option<EcnMode>,
    /// 接收端 ECN 模式覆盖
    pub receiver_ecn_mode: Option<EcnMode>,
}

impl Default for TcpConfig {
    fn default() -> Self {
        let mss = 536;
        Self {
            mss,
            ack_bytes: 60,
            header_bytes: 40,
            init_cwnd_bytes: (mss as u64).saturating_mul(10),
            init_ssthresh_bytes: u64::from(u32::MAX),
            init_rto: SimTime::from_secs(1),
            max_rto: SimTime::from_secs(60),
            sender_ecn_mode: None,
            receiver_ecn_mode: None,
        }
    }
}

/// 发送端应用
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TcpApp {
    /// 启动时一次性写入 `max_bytes`，全部确认后连接完成
    Bulk { max_bytes: u64 },
    /// 每隔 `pkt_bytes*8/rate` 写入 `pkt_bytes`，直到 `stop_at`
    OnOff {
        rate: DataRate,
        pkt_bytes: u32,
        stop_at: SimTime,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpState {
    Closed,
    Listen,
    SynSent,
    SynReceived,
    Established,
}

#[derive(Debug, Clone)]
struct SentSeg {
    len: u32,
}

/// 连接级计数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TcpConnStats {
    pub data_pkts_sent: u64,
    /// 带 ECT 发出的数据段
    pub data_pkts_ect: u64,
    pub retransmits: u64,
    pub rtos: u64,
    pub syn_retransmits: u64,
    /// 接收端收到的 CE 数据段
    pub ce_data_received: u64,
    /// 接收端发出的带 ECE 的 ACK
    pub ece_acks_sent: u64,
    /// 发送端收到的带 ECE 的 ACK
    pub ece_acks_received: u64,
    /// ECN 触发的 cwnd 缩减次数
    pub ecn_reductions: u64,
    /// 带 CWR 发出的数据段
    pub cwr_sent: u64,
}

#[derive(Debug, Clone)]
pub struct TcpConn {
    pub id: TcpConnId,
    pub src: NodeId,
    pub dst: NodeId,
    pub fwd_route: Vec<NodeId>,
    pub rev_route: Vec<NodeId>,
    pub app: TcpApp,
    pub cfg: TcpConfig,

    sender_state: TcpState,
    receiver_state: TcpState,
    sender_ecn: ConnectionEcnState,
    receiver_ecn: ConnectionEcnState,

    // app
    app_bytes: u64,

    // sender
    next_seq: u64,
    last_acked: u64,
    cwnd_bytes: u64,
    ssthresh_bytes: u64,
    dup_acks: u32,
    rto: SimTime,
    rto_epoch: u64,
    inflight: BTreeMap<u64, SentSeg>, // seq -> segment

    // receiver
    rcv_nxt: u64,

    // stats
    stats: TcpConnStats,
    start_at: Option<SimTime>,
    established_at: Option<SimTime>,
    done_at: Option<SimTime>,
}

impl TcpConn {
    fn new(
        id: TcpConnId,
        src: NodeId,
        dst: NodeId,
        fwd_route: Vec<NodeId>,
        app: TcpApp,
        cfg: TcpConfig,
        ecn: &EcnController,
    ) -> Self {
        let mut rev_route = fwd_route.clone();
        rev_route.reverse();
        let mss = cfg.mss.max(1) as u64;
        Self {
            id,
            src,
            dst,
            fwd_route,
            rev_route,
            app,
            sender_state: TcpState::Closed,
            receiver_state: TcpState::Listen,
            sender_ecn: ecn.new_connection(cfg.sender_ecn_mode),
            receiver_ecn: ecn.new_connection(cfg.receiver_ecn_mode),
            app_bytes: 0,
            next_seq: 0,
            last_acked: 0,
            cwnd_bytes: cfg.init_cwnd_bytes.max(mss),
            ssthresh_bytes: cfg.init_ssthresh_bytes.max(2 * mss),
            dup_acks: 0,
            rto: cfg.init_rto,
            rto_epoch: 0,
            inflight: BTreeMap::new(),
            rcv_nxt: 0,
            stats: TcpConnStats::default(),
            start_at: None,
            established_at: None,
            done_at: None,
            cfg,
        }
    }

    pub fn handle(&self) -> TcpConnHandle {
        TcpConnHandle(self.id)
    }

    pub fn bytes_acked(&self) -> u64 {
        self.last_acked
    }

    pub fn bytes_received(&self) -> u64 {
        self.rcv_nxt
    }

    pub fn is_done(&self) -> bool {
        self.done_at.is_some()
    }

    pub fn start_time(&self) -> Option<SimTime> {
        self.start_at
    }

    pub fn established_time(&self) -> Option<SimTime> {
        self.established_at
    }

    pub fn done_time(&self) -> Option<SimTime> {
        self.done_at
    }

    pub fn cwnd_bytes(&self) -> u64 {
        self.cwnd_bytes
    }

    pub fn ssthresh_bytes(&self) -> u64 {
        self.ssthresh_bytes
    }

    pub fn sender_state(&self) -> TcpState {
        self.sender_state
    }

    pub fn receiver_state(&self) -> TcpState {
        self.receiver_state
    }

    pub fn sender_ecn(&self) -> &ConnectionEcnState {
        &self.sender_ecn
    }

    pub fn receiver_ecn(&self) -> &ConnectionEcnState {
        &self.receiver_ecn
    }

    pub fn ecn_state(&self, endpoint: TraceEndpoint) -> &ConnectionEcnState {
        match endpoint {
            TraceEndpoint::Sender => &self.sender_ecn,
            TraceEndpoint::Receiver => &self.receiver_ecn,
        }
    }

    /// 覆盖某一端的 ECN 模式；握手开始后返回 `InvalidConfig`。
    pub fn set_ecn_mode(&mut self, endpoint: TraceEndpoint, mode: EcnMode) -> Result<(), EcnError> {
        match endpoint {
            TraceEndpoint::Sender => self.sender_ecn.set_mode(mode),
            TraceEndpoint::Receiver => self.receiver_ecn.set_mode(mode),
        }
    }

    pub fn stats(&self) -> &TcpConnStats {
        &self.stats
    }

    fn mss(&self) -> u64 {
        self.cfg.mss.max(1) as u64
    }

    fn total_bytes(&self) -> Option<u64> {
        match self.app {
            TcpApp::Bulk { max_bytes } => Some(max_bytes),
            TcpApp::OnOff { .. } => None,
        }
    }

    fn earliest_unacked_seq(&self) -> Option<u64> {
        self.inflight.keys().next().copied()
    }

    fn inflight_bytes(&self) -> u64 {
        self.inflight.values().map(|s| s.len as u64).sum()
    }

    fn send(
        &self,
        net: &mut dyn NetApi,
        sim: &mut Simulator,
        from_sender: bool,
        size_bytes: u32,
        seg: TcpSegment,
        marking: EcnMarking,
    ) {
        let (from, route) = if from_sender {
            (self.src, self.fwd_route.clone())
        } else {
            (self.dst, self.rev_route.clone())
        };
        let mut pkt = net.make_packet(self.id, size_bytes, route);
        pkt.transport = Transport::Tcp(seg);
        marking.apply_to(&mut pkt);
        net.forward_from(from, pkt, sim);
    }

    fn arm_rto(&mut self, sim: &mut Simulator) {
        self.rto_epoch = self.rto_epoch.wrapping_add(1);
        sim.schedule_in(
            self.rto,
            TcpRto {
                conn_id: self.id,
                epoch: self.rto_epoch,
            },
        );
    }

    fn backoff_rto(&mut self) {
        self.rto = SimTime(self.rto.0.saturating_mul(2).min(self.cfg.max_rto.0));
    }

    fn record_cwnd(&self, net: &mut dyn NetApi, now: SimTime, reason: TraceCwndReason) {
        net.trace_event(
            now,
            Some(self.id),
            TraceEventKind::TcpCwnd {
                conn_id: self.id,
                cwnd_bytes: self.cwnd_bytes,
                ssthresh_bytes: self.ssthresh_bytes,
                alpha: self.sender_ecn.dctcp_alpha(),
                reason,
            },
        );
    }

    fn record_negotiated(&self, net: &mut dyn NetApi, now: SimTime, endpoint: TraceEndpoint) {
        let st = self.ecn_state(endpoint);
        net.trace_event(
            now,
            Some(self.id),
            TraceEventKind::EcnNegotiated {
                conn_id: self.id,
                endpoint,
                mode: st.mode(),
                negotiated: st.ect_negotiated(),
            },
        );
    }

    fn send_syn(&mut self, ecn: &mut EcnController, sim: &mut Simulator, net: &mut dyn NetApi) {
        let marking = ecn.on_syn_send(&mut self.sender_ecn);
        debug!(conn_id = self.id, flags = %marking.flags, ip_ecn = ?marking.ip_ecn, "发送 SYN");
        let seg = TcpSegment::syn(TcpFlags::NONE);
        self.send(net, sim, true, self.cfg.ack_bytes, seg, marking);
        self.arm_rto(sim);
    }

    fn send_syn_ack(&mut self, ecn: &EcnController, sim: &mut Simulator, net: &mut dyn NetApi) {
        let marking = ecn.on_syn_ack_send(&mut self.receiver_ecn);
        debug!(conn_id = self.id, flags = %marking.flags, ip_ecn = ?marking.ip_ecn, "发送 SYN-ACK");
        let seg = TcpSegment::syn_ack(TcpFlags::NONE);
        self.send(net, sim, false, self.cfg.ack_bytes, seg, marking);
    }

    /// 发送端的纯 ACK（仅握手最后一步）
    fn send_handshake_ack(&mut self, ecn: &EcnController, sim: &mut Simulator, net: &mut dyn NetApi) {
        let marking = ecn.on_ack_send(&mut self.sender_ecn);
        let seg = TcpSegment::ack(0, TcpFlags::NONE);
        self.send(net, sim, true, self.cfg.ack_bytes, seg, marking);
    }

    /// 接收端的累计 ACK
    fn send_ack(&mut self, ecn: &EcnController, sim: &mut Simulator, net: &mut dyn NetApi) {
        let marking = ecn.on_ack_send(&mut self.receiver_ecn);
        if marking.flags.contains(TcpFlags::ECE) {
            self.stats.ece_acks_sent += 1;
        }
        let seg = TcpSegment::ack(self.rcv_nxt, TcpFlags::NONE);
        self.send(net, sim, false, self.cfg.ack_bytes, seg, marking);
    }

    fn retransmit(&mut self, seq: u64, ecn: &EcnController, sim: &mut Simulator, net: &mut dyn NetApi) {
        let Some(len) = self.inflight.get(&seq).map(|s| s.len) else {
            return;
        };
        self.stats.retransmits += 1;
        let marking = ecn.on_retransmit_send(&mut self.sender_ecn);
        let seg = TcpSegment::data(seq, len, TcpFlags::NONE);
        self.send(net, sim, true, len + self.cfg.header_bytes, seg, marking);
    }

    fn send_data_if_possible(&mut self, ecn: &EcnController, sim: &mut Simulator, net: &mut dyn NetApi) {
        if self.sender_state != TcpState::Established || self.done_at.is_some() {
            return;
        }
        let mss = self.mss();
        let mut avail = self.cwnd_bytes.saturating_sub(self.inflight_bytes());

        while avail > 0 && self.next_seq < self.app_bytes {
            let len = mss.min(self.app_bytes - self.next_seq).min(avail) as u32;
            let seq = self.next_seq;
            self.next_seq = self.next_seq.saturating_add(len as u64);
            avail = avail.saturating_sub(len as u64);

            let marking = match ecn.on_data_send(&mut self.sender_ecn) {
                Ok(m) => {
                    self.stats.data_pkts_ect += 1;
                    if m.flags.contains(TcpFlags::CWR) {
                        self.stats.cwr_sent += 1;
                    }
                    m
                }
                Err(e) => {
                    debug!(conn_id = self.id, seq, error = %e, "数据段不做 ECN 标记");
                    EcnMarking::default()
                }
            };
            self.stats.data_pkts_sent += 1;

            let seg = TcpSegment::data(seq, len, TcpFlags::NONE);
            self.send(net, sim, true, len + self.cfg.header_bytes, seg, marking);

            self.inflight.insert(seq, SentSeg { len });
            if self.inflight.len() == 1 {
                self.arm_rto(sim);
            }
        }
    }

    fn check_done(&mut self, now: SimTime) -> bool {
        let Some(total) = self.total_bytes() else {
            return false;
        };
        if self.done_at.is_none() && self.last_acked >= total {
            self.done_at = Some(now);
            info!(conn_id = self.id, acked = self.last_acked, done = ?now, "✅ 传输完成");
        }
        self.done_at.is_some()
    }

    /// 发送端 ACK 处理
    fn on_ack(&mut self, seg: TcpSegment, ecn: &EcnController, sim: &mut Simulator, net: &mut dyn NetApi) {
        let now = sim.now();
        let ack = seg.ack;
        let mss = self.mss();
        if seg.flags.contains(TcpFlags::ECE) {
            self.stats.ece_acks_received += 1;
        }

        let newly_acked = ack.saturating_sub(self.last_acked);
        let factor = ecn.on_ack_received(
            &mut self.sender_ecn,
            AckInfo {
                ack,
                newly_acked,
                flags: seg.flags,
                snd_nxt: self.next_seq,
            },
        );
        if let Some(f) = factor {
            let reduced = ((self.cwnd_bytes as f64) * f).floor() as u64;
            self.cwnd_bytes = reduced.max(mss);
            self.ssthresh_bytes = self.cwnd_bytes.max(2 * mss);
            self.stats.ecn_reductions += 1;
            info!(
                conn_id = self.id,
                mode = %self.sender_ecn.mode(),
                factor = f,
                cwnd = self.cwnd_bytes,
                "📉 ECE：缩减拥塞窗口"
            );
            self.record_cwnd(net, now, TraceCwndReason::EcnEcho);
        }

        if ack > self.last_acked {
            self.dup_acks = 0;
            self.last_acked = ack;
            let still_inflight = self.inflight.split_off(&ack);
            let partial = self
                .inflight
                .iter()
                .rev()
                .find(|(s, sent)| s.saturating_add(sent.len as u64) > ack)
                .map(|(s, sent)| (*s, sent.len));
            self.inflight = still_inflight;
            // 部分确认的段：剩余部分仍在途
            if let Some((s, len)) = partial {
                let remain = s.saturating_add(len as u64) - ack;
                self.inflight.insert(ack, SentSeg { len: remain as u32 });
            }

            if factor.is_none() {
                // 慢启动 / 拥塞避免
                if self.cwnd_bytes < self.ssthresh_bytes {
                    self.cwnd_bytes = self.cwnd_bytes.saturating_add(newly_acked.min(mss));
                } else {
                    let inc = (mss.saturating_mul(mss) / self.cwnd_bytes.max(1)).max(1);
                    self.cwnd_bytes = self.cwnd_bytes.saturating_add(inc);
                }
                self.record_cwnd(net, now, TraceCwndReason::Ack);
            }

            self.rto = self.cfg.init_rto;
            if self.check_done(now) {
                return;
            }
            if !self.inflight.is_empty() {
                self.arm_rto(sim);
            }
            self.send_data_if_possible(ecn, sim, net);
        } else if ack == self.last_acked && !self.inflight.is_empty() {
            self.dup_acks = self.dup_acks.saturating_add(1);
            if self.dup_acks == 3 {
                if let Some(seq0) = self.earliest_unacked_seq() {
                    // 同一个 ACK 已因 ECE 缩减过的窗口不再减半
                    if factor.is_none() {
                        self.ssthresh_bytes = (self.cwnd_bytes / 2).max(2 * mss);
                    }
                    self.cwnd_bytes = self.ssthresh_bytes.saturating_add(3 * mss);
                    ecn.on_loss_reduction(&mut self.sender_ecn, self.next_seq);
                    self.record_cwnd(net, now, TraceCwndReason::FastRetransmit);
                    self.retransmit(seq0, ecn, sim, net);
                }
            } else if self.dup_acks > 3 {
                self.cwnd_bytes = self.cwnd_bytes.saturating_add(mss);
                self.send_data_if_possible(ecn, sim, net);
            }
        }
    }
}

/// 一次定时记录的 socket EcnMode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcnModeSample {
    pub at: SimTime,
    pub conn: TcpConnHandle,
    pub endpoint: TraceEndpoint,
    pub mode: EcnMode,
}

/// TCP 协议栈：连接工厂（持有 ECN 配置）与连接表
#[derive(Debug)]
pub struct TcpStack {
    ecn: EcnController,
    conns: HashMap<TcpConnId, TcpConn>,
    next_id: TcpConnId,
    mode_log: Vec<EcnModeSample>,
}

impl Default for TcpStack {
    fn default() -> Self {
        Self::new(EcnConfig::default())
    }
}

impl TcpStack {
    pub fn new(ecn: EcnConfig) -> Self {
        Self {
            ecn: EcnController::new(ecn),
            conns: HashMap::new(),
            next_id: 1,
            mode_log: Vec::new(),
        }
    }

    pub fn ecn(&self) -> &EcnController {
        &self.ecn
    }

    /// 修改后续新建连接的默认 ECN 模式
    pub fn configure_ecn(&mut self, mode: EcnMode) -> Result<(), EcnError> {
        self.ecn.configure(mode)
    }

    /// 创建连接（此时尚未握手），返回类型化句柄。
    pub fn connect(
        &mut self,
        src: NodeId,
        dst: NodeId,
        route: Vec<NodeId>,
        app: TcpApp,
        cfg: TcpConfig,
    ) -> TcpConnHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let conn = TcpConn::new(id, src, dst, route, app, cfg, &self.ecn);
        info!(
            conn_id = id,
            src = ?src,
            dst = ?dst,
            sender_mode = %conn.sender_ecn.mode(),
            receiver_mode = %conn.receiver_ecn.mode(),
            "创建 TCP 连接"
        );
        self.conns.insert(id, conn);
        TcpConnHandle(id)
    }

    pub fn get(&self, h: TcpConnHandle) -> Option<&TcpConn> {
        self.conns.get(&h.0)
    }

    pub fn get_mut(&mut self, h: TcpConnHandle) -> Option<&mut TcpConn> {
        self.conns.get_mut(&h.0)
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// 读取某一端的 ECN 模式（用于日志/追踪）
    pub fn ecn_mode(&self, h: TcpConnHandle, endpoint: TraceEndpoint) -> Option<EcnMode> {
        self.get(h).map(|c| self.ecn.mode(c.ecn_state(endpoint)))
    }

    pub fn mode_log(&self) -> &[EcnModeSample] {
        &self.mode_log
    }

    /// 应用启动：发送 SYN，Bulk 应用一次性写入全部数据。
    #[tracing::instrument(skip(self, sim, net), fields(conn_id = h.0))]
    pub fn start(&mut self, h: TcpConnHandle, sim: &mut Simulator, net: &mut dyn NetApi) {
        let Self { ecn, conns, .. } = self;
        let Some(conn) = conns.get_mut(&h.0) else {
            warn!("未知连接");
            return;
        };
        if conn.sender_state != TcpState::Closed {
            return;
        }
        let now = sim.now();
        conn.start_at = Some(now);
        conn.sender_state = TcpState::SynSent;
        match conn.app {
            TcpApp::Bulk { max_bytes } => conn.app_bytes = max_bytes,
            TcpApp::OnOff { .. } => sim.schedule(now, TcpAppTick { conn_id: conn.id }),
        }
        conn.record_cwnd(net, now, TraceCwndReason::Init);
        conn.send_syn(ecn, sim, net);
    }

    /// 网络把一个 TCP 段交付到 `at` 节点
    pub fn on_tcp_segment(
        &mut self,
        conn_id: TcpConnId,
        at: NodeId,
        seg: TcpSegment,
        ip_ecn: Ecn,
        sim: &mut Simulator,
        net: &mut dyn NetApi,
    ) {
        let Self { ecn, conns, .. } = self;
        let Some(conn) = conns.get_mut(&conn_id) else {
            debug!(conn_id, "未知连接的段，忽略");
            return;
        };
        let now = sim.now();
        let syn = seg.flags.contains(TcpFlags::SYN);
        let ackf = seg.flags.contains(TcpFlags::ACK);

        if at == conn.dst {
            if syn && !ackf {
                match conn.receiver_state {
                    TcpState::Listen => {
                        ecn.on_syn_received(&mut conn.receiver_ecn, seg.flags);
                        conn.receiver_state = TcpState::SynReceived;
                    }
                    // 重传的 SYN：再回一次 SYN-ACK
                    TcpState::SynReceived => {}
                    _ => return,
                }
                conn.send_syn_ack(ecn, sim, net);
                return;
            }
            if conn.receiver_state == TcpState::SynReceived && !syn {
                let echoed = ecn.on_handshake_ack_received(&mut conn.receiver_ecn, seg.flags);
                conn.receiver_state = TcpState::Established;
                conn.record_negotiated(net, now, TraceEndpoint::Receiver);
                if echoed {
                    info!(conn_id, "对端回显了 SYN-ACK 上的 CE");
                }
            }
            if conn.receiver_state != TcpState::Established || seg.len == 0 {
                return;
            }

            ecn.on_data_received(&mut conn.receiver_ecn, ip_ecn, seg.flags);
            if ip_ecn.is_ce() {
                conn.stats.ce_data_received += 1;
            }
            if seg.seq == conn.rcv_nxt {
                conn.rcv_nxt = conn.rcv_nxt.saturating_add(seg.len as u64);
            }
            conn.send_ack(ecn, sim, net);
        } else if at == conn.src {
            if syn && ackf {
                match conn.sender_state {
                    TcpState::SynSent => {
                        ecn.on_syn_ack_received(&mut conn.sender_ecn, seg.flags, ip_ecn);
                        conn.sender_state = TcpState::Established;
                        conn.established_at = Some(now);
                        conn.rto = conn.cfg.init_rto;
                        // 让挂起的 SYN 定时器失效
                        conn.rto_epoch = conn.rto_epoch.wrapping_add(1);
                        conn.record_negotiated(net, now, TraceEndpoint::Sender);
                        conn.send_handshake_ack(ecn, sim, net);
                        conn.send_data_if_possible(ecn, sim, net);
                    }
                    // 握手 ACK 丢失导致的重复 SYN-ACK
                    TcpState::Established => conn.send_handshake_ack(ecn, sim, net),
                    _ => {}
                }
                return;
            }
            if conn.sender_state == TcpState::Established && ackf {
                conn.on_ack(seg, ecn, sim, net);
            }
        }
    }

    fn on_rto(&mut self, conn_id: TcpConnId, epoch: u64, sim: &mut Simulator, net: &mut dyn NetApi) {
        let Self { ecn, conns, .. } = self;
        let Some(conn) = conns.get_mut(&conn_id) else {
            return;
        };
        if conn.rto_epoch != epoch || conn.done_at.is_some() {
            return;
        }
        let now = sim.now();
        match conn.sender_state {
            TcpState::SynSent => {
                conn.stats.syn_retransmits += 1;
                net.trace_event(now, Some(conn_id), TraceEventKind::TcpRto { conn_id, seq: 0 });
                warn!(conn_id, rto = ?conn.rto, "SYN 超时，重传");
                conn.backoff_rto();
                conn.send_syn(ecn, sim, net);
            }
            TcpState::Established => {
                let Some(seq) = conn.earliest_unacked_seq() else {
                    return;
                };
                conn.stats.rtos += 1;
                net.trace_event(now, Some(conn_id), TraceEventKind::TcpRto { conn_id, seq });
                warn!(conn_id, seq, rto = ?conn.rto, "RTO 超时，重传");
                let mss = conn.mss();
                conn.ssthresh_bytes = (conn.cwnd_bytes / 2).max(2 * mss);
                conn.cwnd_bytes = mss;
                conn.dup_acks = 0;
                ecn.on_loss_reduction(&mut conn.sender_ecn, conn.next_seq);
                conn.backoff_rto();
                conn.record_cwnd(net, now, TraceCwndReason::Rto);
                conn.retransmit(seq, ecn, sim, net);
                conn.arm_rto(sim);
            }
            _ => {}
        }
    }

    fn on_app_tick(&mut self, conn_id: TcpConnId, sim: &mut Simulator, net: &mut dyn NetApi) {
        let Self { ecn, conns, .. } = self;
        let Some(conn) = conns.get_mut(&conn_id) else {
            return;
        };
        let TcpApp::OnOff {
            rate,
            pkt_bytes,
            stop_at,
        } = conn.app
        else {
            return;
        };
        let now = sim.now();
        if now >= stop_at {
            return;
        }
        conn.app_bytes = conn.app_bytes.saturating_add(pkt_bytes as u64);
        let gap = rate.tx_time(pkt_bytes as u64).max(SimTime(1));
        sim.schedule(now.saturating_add(gap), TcpAppTick { conn_id });
        conn.send_data_if_possible(ecn, sim, net);
    }

    fn log_mode(&mut self, h: TcpConnHandle, endpoint: TraceEndpoint, now: SimTime, net: &mut dyn NetApi) {
        let Some(mode) = self.ecn_mode(h, endpoint) else {
            warn!(conn_id = h.0, "无法记录 EcnMode：连接不存在");
            return;
        };
        info!(
            conn_id = h.0,
            endpoint = ?endpoint,
            "{}s: Socket EcnMode = {} ({})",
            now.as_secs_f64(),
            mode.as_index(),
            mode
        );
        self.mode_log.push(EcnModeSample {
            at: now,
            conn: h,
            endpoint,
            mode,
        });
        net.trace_event(
            now,
            Some(h.0),
            TraceEventKind::SocketEcnMode {
                conn_id: h.0,
                endpoint,
                mode,
            },
        );
    }
}

/// 启动一个 TCP 连接（发送 SYN）
#[derive(Debug)]
pub struct TcpStart {
    pub conn: TcpConnHandle,
}

impl Event for TcpStart {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TcpStart { conn } = *self;
        if with_tcp_stack(world, |net, tcp| tcp.start(conn, sim, net)).is_none() {
            warn!("world is not a NetWorld; TcpStart ignored");
        }
    }
}

/// RTO 事件：仅当 epoch 仍是最新一次布置的定时器时触发重传
#[derive(Debug)]
pub struct TcpRto {
    pub conn_id: TcpConnId,
    pub epoch: u64,
}

impl Event for TcpRto {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TcpRto { conn_id, epoch } = *self;
        let _ = with_tcp_stack(world, |net, tcp| tcp.on_rto(conn_id, epoch, sim, net));
    }
}

/// OnOff 应用写入一个 packet 的数据
#[derive(Debug)]
pub struct TcpAppTick {
    pub conn_id: TcpConnId,
}

impl Event for TcpAppTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TcpAppTick { conn_id } = *self;
        let _ = with_tcp_stack(world, |net, tcp| tcp.on_app_tick(conn_id, sim, net));
    }
}

/// 在指定时刻记录某一端 socket 的 EcnMode
#[derive(Debug)]
pub struct TcpLogEcnMode {
    pub conn: TcpConnHandle,
    pub endpoint: TraceEndpoint,
}

impl Event for TcpLogEcnMode {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TcpLogEcnMode { conn, endpoint } = *self;
        let now = sim.now();
        if with_tcp_stack(world, |net, tcp| tcp.log_mode(conn, endpoint, now, net)).is_none() {
            warn!("world is not a NetWorld; EcnMode not logged");
        }
    }
}
