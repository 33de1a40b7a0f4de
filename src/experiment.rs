//! 两节点 ECN 实验
//!
//! 把 [`ScenarioSpec`] 解析为类型化的实验参数，搭建 n0 <-> n1 点对点拓扑，
//! 在 n0 上启动发送端应用、n1 上被动接收，运行到停止时间。

use tracing::info;

use crate::ecn::{EcnConfig, EcnMode};
use crate::net::{DataRate, NetWorld, SegmentKind, Stats};
use crate::proto::tcp::{
    EcnModeSample, TcpApp, TcpConfig, TcpConn, TcpConnHandle, TcpLogEcnMode, TcpStack, TcpStart,
};
use crate::sim::{AppSpec, ScenarioError, ScenarioSpec, SimTime, Simulator};
use crate::topo::point_to_point::{build_point_to_point, PointToPointOpts};
use crate::trace::{CaptureRecord, TraceEndpoint, TraceLogger};

#[derive(Debug, Clone)]
pub struct Experiment {
    pub ecn: EcnConfig,
    pub link: PointToPointOpts,
    pub tcp: TcpConfig,
    pub app: TcpApp,
    pub start: SimTime,
    pub stop: SimTime,
    pub log_mode_at: Option<SimTime>,
    /// 记录抓包与 ECN 事件
    pub trace: bool,
}

impl Experiment {
    pub fn from_spec(spec: &ScenarioSpec) -> Result<Self, ScenarioError> {
        let mode: EcnMode = spec.ecn_mode.parse()?;
        let sender_mode = spec
            .sender_ecn_mode
            .as_deref()
            .map(str::parse::<EcnMode>)
            .transpose()?;
        let receiver_mode = spec
            .receiver_ecn_mode
            .as_deref()
            .map(str::parse::<EcnMode>)
            .transpose()?;

        let rate: DataRate = spec.link.data_rate.parse()?;
        if rate.bps() == 0 {
            return Err(ScenarioError::InvalidConfig("link data_rate must be > 0".into()));
        }
        let link = PointToPointOpts {
            rate,
            delay: spec.link.delay.parse()?,
            queue_bytes: spec.link.queue_bytes,
            ecn_threshold_bytes: spec.link.ecn_threshold_bytes,
        };

        let start: SimTime = spec.start.parse()?;
        let stop: SimTime = spec.stop.parse()?;
        if stop < start {
            return Err(ScenarioError::InvalidConfig(format!(
                "stop ({stop}) is before start ({start})"
            )));
        }
        let log_mode_at = spec
            .log_mode_at
            .as_deref()
            .map(str::parse::<SimTime>)
            .transpose()?;
        if let Some(at) = log_mode_at {
            if at > stop {
                return Err(ScenarioError::InvalidConfig(format!(
                    "log_mode_at ({at}) is after stop ({stop})"
                )));
            }
        }

        let mut tcp = TcpConfig {
            sender_ecn_mode: sender_mode,
            receiver_ecn_mode: receiver_mode,
            ..TcpConfig::default()
        };
        if let Some(mss) = spec.mss {
            if mss == 0 {
                return Err(ScenarioError::InvalidConfig("mss must be > 0".into()));
            }
            tcp.mss = mss;
            tcp.init_cwnd_bytes = (mss as u64).saturating_mul(10);
        }

        let app = match &spec.app {
            AppSpec::Bulk { max_bytes } => TcpApp::Bulk {
                max_bytes: *max_bytes,
            },
            AppSpec::OnOff {
                data_rate,
                packet_size,
            } => {
                let rate: DataRate = data_rate.parse()?;
                if rate.bps() == 0 || *packet_size == 0 {
                    return Err(ScenarioError::InvalidConfig(
                        "on_off app needs a non-zero data_rate and packet_size".into(),
                    ));
                }
                TcpApp::OnOff {
                    rate,
                    pkt_bytes: *packet_size,
                    stop_at: stop,
                }
            }
        };

        Ok(Self {
            ecn: EcnConfig::with_mode(mode),
            link,
            tcp,
            app,
            start,
            stop,
            log_mode_at,
            trace: false,
        })
    }

    pub fn run(&self) -> ExperimentReport {
        let mut sim = Simulator::default();
        let mut world = NetWorld::with_tcp(TcpStack::new(self.ecn));
        let (src, dst, route) = build_point_to_point(&mut world, &self.link);
        if self.trace {
            world.net.enable_trace();
        }

        let conn = world
            .net
            .tcp
            .connect(src, dst, route, self.app, self.tcp.clone());
        sim.schedule(self.start, TcpStart { conn });
        if let Some(at) = self.log_mode_at {
            sim.schedule(
                at,
                TcpLogEcnMode {
                    conn,
                    endpoint: TraceEndpoint::Sender,
                },
            );
        }

        info!(
            ecn_mode = %self.ecn.default_mode,
            rate = %self.link.rate,
            delay = %self.link.delay,
            stop = %self.stop,
            "开始两节点 ECN 实验"
        );
        sim.run_until(self.stop, &mut world);

        ExperimentReport {
            end: sim.now(),
            events: sim.events_executed(),
            conn,
            world,
        }
    }
}

/// 实验结束后的世界快照
pub struct ExperimentReport {
    pub end: SimTime,
    pub events: u64,
    pub conn: TcpConnHandle,
    pub world: NetWorld,
}

impl ExperimentReport {
    pub fn tcp(&self) -> Option<&TcpConn> {
        self.world.net.tcp.get(self.conn)
    }

    pub fn stats(&self) -> &Stats {
        &self.world.net.stats
    }

    pub fn mode_log(&self) -> &[EcnModeSample] {
        self.world.net.tcp.mode_log()
    }

    pub fn trace(&self) -> Option<&TraceLogger> {
        self.world.net.trace.as_ref()
    }

    /// 抓到的第一个 SYN-ACK
    pub fn syn_ack_capture(&self) -> Option<&CaptureRecord> {
        self.trace()?.first_capture_of(SegmentKind::SynAck)
    }
}
