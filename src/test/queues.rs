use crate::net::{NodeId, Packet};
use crate::queue::{DropTailQueue, PacketQueue};

fn pkt(id: u64, size_bytes: u32) -> Packet {
    Packet::new(id, 0, size_bytes, vec![NodeId(0), NodeId(1)])
}

#[test]
fn droptail_queue_enforces_capacity_and_preserves_order() {
    let mut q = DropTailQueue::new(100);
    assert_eq!(q.capacity_bytes(), 100);
    assert_eq!(q.len(), 0);
    assert_eq!(q.bytes(), 0);
    assert!(q.is_empty());

    assert!(q.enqueue(pkt(1, 60)).is_ok());
    assert_eq!(q.len(), 1);
    assert_eq!(q.bytes(), 60);

    let dropped = q.enqueue(pkt(2, 50)).expect_err("should drop");
    assert_eq!(dropped.id, 2);
    assert_eq!(q.len(), 1);
    assert_eq!(q.bytes(), 60);

    assert!(q.enqueue(pkt(3, 40)).is_ok());
    assert_eq!(q.bytes(), 100);

    assert_eq!(q.dequeue().expect("pkt").id, 1);
    assert_eq!(q.dequeue().expect("pkt").id, 3);
    assert_eq!(q.len(), 0);
    assert_eq!(q.bytes(), 0);
    assert!(q.dequeue().is_none());
}

#[test]
fn droptail_queue_zero_sized_packets_do_not_consume_capacity() {
    let mut q = DropTailQueue::new(10);
    assert!(q.enqueue(pkt(1, 0)).is_ok());
    assert!(q.enqueue(pkt(2, 0)).is_ok());
    assert_eq!(q.len(), 2);
    assert_eq!(q.bytes(), 0);
    assert_eq!(q.dequeue().expect("pkt").id, 1);
    assert_eq!(q.dequeue().expect("pkt").id, 2);
    assert!(q.dequeue().is_none());
}

#[test]
fn droptail_queue_tracks_peak_backlog() {
    let mut q = DropTailQueue::new(1_000);
    assert!(q.enqueue(pkt(1, 300)).is_ok());
    assert!(q.enqueue(pkt(2, 400)).is_ok());
    let _ = q.dequeue();
    assert!(q.enqueue(pkt(3, 100)).is_ok());
    assert_eq!(q.bytes(), 500);
    assert_eq!(q.peak_bytes(), 700);
}
