use crate::net::{Ecn, NodeId, Packet, SegmentKind, TcpFlags, TcpSegment, Transport};

#[test]
fn packet_next_and_advance_walks_route() {
    let route = vec![NodeId(1), NodeId(2), NodeId(3)];
    let mut pkt = Packet::new(1, 10, 100, route);
    assert_eq!(pkt.src, NodeId(1));
    assert_eq!(pkt.dst, NodeId(3));
    assert_eq!(pkt.at(), NodeId(1));
    assert_eq!(pkt.next(), Some(NodeId(2)));
    assert!(pkt.has_next());

    pkt = pkt.advance();
    assert_eq!(pkt.at(), NodeId(2));
    assert_eq!(pkt.next(), Some(NodeId(3)));

    pkt = pkt.advance();
    assert_eq!(pkt.at(), NodeId(3));
    assert_eq!(pkt.next(), None);
    assert!(!pkt.has_next());
}

#[test]
fn packet_defaults_to_not_ect_without_transport() {
    let pkt = Packet::new(1, 10, 100, vec![NodeId(0), NodeId(1)]);
    assert_eq!(pkt.ecn, Ecn::NotEct);
    assert!(matches!(pkt.transport, Transport::None));
    assert!(pkt.tcp().is_none());
}

#[test]
fn ecn_codepoints_follow_ip_header_bits() {
    assert_eq!(Ecn::from_bits(0b00), Ecn::NotEct);
    assert_eq!(Ecn::from_bits(0b01), Ecn::Ect1);
    assert_eq!(Ecn::from_bits(0b10), Ecn::Ect0);
    assert_eq!(Ecn::from_bits(0b11), Ecn::Ce);
    // 只看低两位
    assert_eq!(Ecn::from_bits(0b1110), Ecn::Ect0);
    assert_eq!(Ecn::Ce.bits(), 0b11);
}

#[test]
fn ecn_helpers_match_expected_states() {
    assert!(Ecn::Ect0.is_ect());
    assert!(Ecn::Ect1.is_ect());
    assert!(!Ecn::NotEct.is_ect());
    assert!(!Ecn::Ce.is_ect());

    assert!(Ecn::Ce.is_ce());
    assert!(!Ecn::NotEct.is_ce());
    assert!(!Ecn::Ect0.is_ce());

    assert!(Ecn::Ce.is_ecn_capable());
    assert!(Ecn::Ect1.is_ecn_capable());
    assert!(!Ecn::NotEct.is_ecn_capable());
}

#[test]
fn tcp_flags_detect_ecn_setup_segments() {
    let syn = TcpSegment::syn(TcpFlags::ECE | TcpFlags::CWR);
    assert!(syn.flags.is_ecn_setup_syn());
    assert!(!syn.flags.is_ecn_setup_syn_ack());
    assert_eq!(syn.kind(), SegmentKind::Syn);

    let plain_syn = TcpSegment::syn(TcpFlags::ECE);
    assert!(!plain_syn.flags.is_ecn_setup_syn());

    let syn_ack = TcpSegment::syn_ack(TcpFlags::ECE);
    assert!(syn_ack.flags.is_ecn_setup_syn_ack());
    assert_eq!(syn_ack.kind(), SegmentKind::SynAck);

    // ECE+CWR 的 SYN-ACK 不是 ECN-setup SYN-ACK
    let both = TcpSegment::syn_ack(TcpFlags::ECE | TcpFlags::CWR);
    assert!(!both.flags.is_ecn_setup_syn_ack());
}

#[test]
fn tcp_flags_insert_remove_and_display() {
    let mut f = TcpFlags::NONE;
    assert!(f.is_empty());
    assert_eq!(f.to_string(), "-");

    f.insert(TcpFlags::ACK);
    f |= TcpFlags::ECE;
    assert_eq!(f.to_string(), "ACK|ECE");
    assert_eq!(f.bits(), 0x50);

    f.remove(TcpFlags::ECE);
    assert_eq!(f, TcpFlags::ACK);
    assert_eq!(TcpFlags::from_bits(0xff).to_string(), "SYN|ACK|ECE|CWR");
}

#[test]
fn segment_kind_depends_on_payload() {
    assert_eq!(TcpSegment::data(0, 536, TcpFlags::NONE).kind(), SegmentKind::Data);
    assert_eq!(TcpSegment::ack(536, TcpFlags::ECE).kind(), SegmentKind::Ack);
    assert!(TcpSegment::data(0, 1, TcpFlags::CWR).flags.contains(TcpFlags::ACK | TcpFlags::CWR));
}
