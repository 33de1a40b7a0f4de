use crate::net::{DataRate, Ecn, NetWorld, NodeId, Packet};
use crate::sim::{SimTime, Simulator};
use crate::topo::point_to_point::{build_point_to_point, PointToPointOpts};
use crate::trace::TraceEventKind;

fn setup(opts: &PointToPointOpts) -> (NetWorld, NodeId, NodeId) {
    let mut world = NetWorld::default();
    let (n0, n1, _) = build_point_to_point(&mut world, opts);
    (world, n0, n1)
}

fn send(world: &mut NetWorld, sim: &mut Simulator, from: NodeId, to: NodeId, size: u32, ecn: Ecn) {
    let mut pkt: Packet = world.net.make_packet(7, size, vec![from, to]);
    pkt.ecn = ecn;
    world.net.forward_from(from, pkt, sim);
}

#[test]
fn point_to_point_builds_two_directed_links() {
    let opts = PointToPointOpts {
        ecn_threshold_bytes: Some(1_500),
        queue_bytes: Some(10_000),
        ..PointToPointOpts::default()
    };
    let (world, n0, n1) = setup(&opts);
    assert_eq!(world.net.node_name(n0), Some("n0"));
    assert_eq!(world.net.node_name(n1), Some("n1"));

    for (a, b) in [(n0, n1), (n1, n0)] {
        let link = world.net.link(a, b).expect("link");
        assert_eq!(link.rate, DataRate::from_mbps(5));
        assert_eq!(link.latency, SimTime::from_millis(2));
        assert_eq!(link.ecn_threshold_bytes, Some(1_500));
        assert_eq!(link.queue.capacity_bytes(), 10_000);
    }
}

#[test]
fn packet_arrives_after_serialization_plus_delay() {
    let (mut world, n0, n1) = setup(&PointToPointOpts::default());
    let mut sim = Simulator::default();
    send(&mut world, &mut sim, n0, n1, 60, Ecn::NotEct);
    sim.run(&mut world);

    // 60B @ 5Mbps = 96us，再加 2ms 传播时延
    assert_eq!(sim.now(), SimTime(96_000 + 2_000_000));
    assert_eq!(world.net.stats.delivered_pkts, 1);
    assert_eq!(world.net.stats.delivered_bytes, 60);
}

#[test]
fn ect_packets_are_marked_ce_above_threshold() {
    let opts = PointToPointOpts {
        ecn_threshold_bytes: Some(1_000),
        ..PointToPointOpts::default()
    };
    let (mut world, n0, n1) = setup(&opts);
    let mut sim = Simulator::default();
    // 第一个包立即出队；第二个入队后积压 500；第三个到达时 500+500 达到阈值
    for _ in 0..3 {
        send(&mut world, &mut sim, n0, n1, 500, Ecn::Ect0);
    }
    sim.run(&mut world);
    assert_eq!(world.net.stats.ce_marked_pkts, 1);
    assert_eq!(world.net.stats.delivered_pkts, 3);
}

#[test]
fn only_ect_packets_are_marked() {
    let opts = PointToPointOpts {
        ecn_threshold_bytes: Some(1),
        ..PointToPointOpts::default()
    };
    let (mut world, n0, n1) = setup(&opts);
    let mut sim = Simulator::default();
    send(&mut world, &mut sim, n0, n1, 500, Ecn::NotEct);
    send(&mut world, &mut sim, n0, n1, 500, Ecn::Ce);
    send(&mut world, &mut sim, n0, n1, 500, Ecn::Ect1);
    sim.run(&mut world);
    assert_eq!(world.net.stats.ce_marked_pkts, 1);
}

#[test]
fn unroutable_packets_count_dropped_bytes() {
    let (mut world, n0, n1) = setup(&PointToPointOpts::default());
    let mut sim = Simulator::default();

    // 路由在 n0 处结束，没有下一跳
    let pkt = world.net.make_packet(7, 300, vec![n0]);
    world.net.forward_from(n0, pkt, &mut sim);
    assert_eq!(world.net.stats.dropped_pkts, 1);
    assert_eq!(world.net.stats.dropped_bytes, 300);

    // 下一跳存在但两节点之间没有链路
    let pkt = world.net.make_packet(7, 200, vec![n1, NodeId(42)]);
    world.net.forward_from(n1, pkt, &mut sim);
    assert_eq!(world.net.stats.dropped_pkts, 2);
    assert_eq!(world.net.stats.dropped_bytes, 500);

    sim.run(&mut world);
    assert_eq!(world.net.stats.delivered_pkts, 0);
}

#[test]
fn full_queue_drops_tail() {
    let opts = PointToPointOpts {
        queue_bytes: Some(600),
        ..PointToPointOpts::default()
    };
    let (mut world, n0, n1) = setup(&opts);
    let mut sim = Simulator::default();
    for _ in 0..3 {
        send(&mut world, &mut sim, n0, n1, 500, Ecn::NotEct);
    }
    sim.run(&mut world);
    assert_eq!(world.net.stats.dropped_pkts, 1);
    assert_eq!(world.net.stats.dropped_bytes, 500);
    assert_eq!(world.net.stats.delivered_pkts, 2);
}

#[test]
fn trace_records_meta_first_and_captures_ce_marks() {
    let opts = PointToPointOpts {
        ecn_threshold_bytes: Some(1),
        ..PointToPointOpts::default()
    };
    let (mut world, n0, n1) = setup(&opts);
    world.net.enable_trace();
    let mut sim = Simulator::default();
    send(&mut world, &mut sim, n0, n1, 100, Ecn::Ect0);
    sim.run(&mut world);

    let trace = world.net.trace.as_ref().expect("trace enabled");
    match &trace.events[0].kind {
        TraceEventKind::Meta { nodes, links } => {
            assert_eq!(nodes.len(), 2);
            assert_eq!(links.len(), 2);
            assert_eq!(links[0].ecn_threshold_bytes, Some(1));
        }
        other => panic!("expected meta first, got {other:?}"),
    }
    assert!(trace
        .events
        .iter()
        .any(|e| matches!(e.kind, TraceEventKind::CeMark { .. })));
    let cap = trace.captures().next().expect("capture");
    assert_eq!(cap.ip_ecn, Ecn::Ce);
    assert!(cap.tcp.is_none());

    let json = trace.to_json_pretty().expect("json");
    let v: serde_json::Value = serde_json::from_str(&json).expect("parse");
    assert_eq!(v[0]["kind"], "meta");
    assert_eq!(v[1]["kind"], "ce_mark");
}

#[test]
fn data_rate_parses_and_computes_tx_time() {
    assert_eq!("5Mbps".parse::<DataRate>().unwrap(), DataRate::from_mbps(5));
    assert_eq!("1Gbps".parse::<DataRate>().unwrap(), DataRate::from_gbps(1));
    assert_eq!("64kbps".parse::<DataRate>().unwrap(), DataRate(64_000));
    assert_eq!("9600".parse::<DataRate>().unwrap(), DataRate(9_600));
    assert!("5 furlongs".parse::<DataRate>().is_err());
    assert_eq!(DataRate::from_mbps(5).tx_time(60), SimTime(96_000));
    assert_eq!(DataRate::from_mbps(1).tx_time(512), SimTime(4_096_000));
}
