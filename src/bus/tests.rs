use super::*;
use crate::model::{DoaHeatmap, DoaPeak};

fn heatmap(seq: u64) -> DoaHeatmap {
    DoaHeatmap {
        t_ns: seq * 1000,
        seq,
        bin_count: 4,
        bin_size_deg: 90.0,
        scores: vec![0.0; 4],
        peaks: vec![DoaPeak { angle_deg: 0.0, score: 0.0 }],
        confidence: 1.0,
        low_confidence: false,
    }
}

#[test]
fn delivers_in_publish_order() {
    let bus = Bus::new();
    let sub = bus.subscribe::<DoaHeatmap>(16, OverflowPolicy::DropNewest);
    for seq in 0..10 {
        bus.publish(heatmap(seq)).unwrap();
    }
    for expected in 0..10 {
        let msg = sub.recv().unwrap();
        assert_eq!(msg.seq, expected);
    }
}

#[test]
fn late_subscriber_does_not_see_backlog() {
    let bus = Bus::new();
    bus.publish(heatmap(0)).unwrap();
    let sub = bus.subscribe::<DoaHeatmap>(16, OverflowPolicy::DropNewest);
    bus.publish(heatmap(1)).unwrap();
    let msg = sub.recv().unwrap();
    assert_eq!(msg.seq, 1);
}

#[test]
fn drop_newest_keeps_the_first_n_messages() {
    let bus = Bus::new();
    let sub = bus.subscribe::<DoaHeatmap>(4, OverflowPolicy::DropNewest);
    for seq in 0..10 {
        bus.publish(heatmap(seq)).unwrap();
    }
    let mut seen = Vec::new();
    while let Some(msg) = sub.try_recv() {
        seen.push(msg.seq);
    }
    assert_eq!(seen, vec![0, 1, 2, 3]);
    assert_eq!(sub.dropped_total(), 6);
}

#[test]
fn drop_oldest_keeps_the_last_n_messages() {
    let bus = Bus::new();
    let sub = bus.subscribe::<DoaHeatmap>(4, OverflowPolicy::DropOldest);
    for seq in 0..10 {
        bus.publish(heatmap(seq)).unwrap();
    }
    let mut seen = Vec::new();
    while let Some(msg) = sub.try_recv() {
        seen.push(msg.seq);
    }
    assert_eq!(seen, vec![6, 7, 8, 9]);
    assert_eq!(sub.dropped_total(), 6);
}

#[test]
fn drop_events_are_reported_once_then_reset() {
    let bus = Bus::new();
    let _sub = bus.subscribe::<DoaHeatmap>(2, OverflowPolicy::DropNewest);
    for seq in 0..5 {
        bus.publish(heatmap(seq)).unwrap();
    }
    let records = bus.drain_drop_events();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].topic, "audio.doa_heatmap");
    assert_eq!(records[0].count, 3);

    // Draining again with no new drops yields nothing (coalesced, reset).
    assert!(bus.drain_drop_events().is_empty());
}

#[test]
fn independent_subscribers_each_get_every_message() {
    let bus = Bus::new();
    let a = bus.subscribe::<DoaHeatmap>(16, OverflowPolicy::DropNewest);
    let b = bus.subscribe::<DoaHeatmap>(16, OverflowPolicy::DropNewest);
    bus.publish(heatmap(1)).unwrap();
    assert_eq!(a.recv().unwrap().seq, 1);
    assert_eq!(b.recv().unwrap().seq, 1);
}

#[test]
fn shutdown_drains_then_disconnects() {
    let bus = Bus::new();
    let sub = bus.subscribe::<DoaHeatmap>(16, OverflowPolicy::DropNewest);
    bus.publish(heatmap(0)).unwrap();
    bus.publish(heatmap(1)).unwrap();
    bus.shutdown();

    assert_eq!(sub.recv().unwrap().seq, 0);
    assert_eq!(sub.recv().unwrap().seq, 1);
    assert_eq!(sub.recv(), None);
}

#[test]
fn publish_after_shutdown_is_a_no_op_error() {
    let bus = Bus::new();
    bus.shutdown();
    let err = bus.publish(heatmap(0)).unwrap_err();
    assert!(matches!(err, FocusFieldError::BusShutDown));
}

#[test]
fn capacity_is_enforced_strictly() {
    let bus = Bus::new();
    let sub = bus.subscribe::<DoaHeatmap>(2, OverflowPolicy::DropNewest);
    for seq in 0..100 {
        bus.publish(heatmap(seq)).unwrap();
    }
    let mut count = 0;
    while sub.try_recv().is_some() {
        count += 1;
    }
    assert!(count <= 2);
}
