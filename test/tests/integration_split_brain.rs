/// Split-brain and heal: two partitions each elect their own leader; when
/// the partitions merge, the globally oldest peer stays leader and the
/// younger leader steps down within one tick.
use windowmesh::{ManualClock, PeerId, Rect};
use windowmesh_test::helpers::{run_until, TestPeer};
use windowmesh_test::local_bus::LocalHub;

#[test]
fn test_partitions_elect_independent_leaders_then_heal_to_the_oldest() {
    let hub = LocalHub::new();
    let clock = ManualClock::new(0);

    // partition 1: A (oldest), B — partition 2: C, D
    let mut a = TestPeer::boot_in(&hub, &clock, "A", Rect::new(0.0, 0.0, 800.0, 600.0), 1);
    run_until(&clock, &mut [&mut a], 100, 100);
    let mut b = TestPeer::boot_in(&hub, &clock, "B", Rect::new(800.0, 0.0, 800.0, 600.0), 1);
    run_until(&clock, &mut [&mut a, &mut b], 200, 100);
    let mut c = TestPeer::boot_in(&hub, &clock, "C", Rect::new(0.0, 600.0, 800.0, 600.0), 2);
    run_until(&clock, &mut [&mut a, &mut b, &mut c], 300, 100);
    let mut d = TestPeer::boot_in(&hub, &clock, "D", Rect::new(800.0, 600.0, 800.0, 600.0), 2);

    let mut everyone = [&mut a, &mut b, &mut c, &mut d];
    run_until(&clock, &mut everyone, 11_000, 100);

    // each side is settled around its own leader
    assert!(everyone[0].is_leader(), "A leads partition 1");
    assert!(!everyone[1].is_leader());
    assert!(everyone[2].is_leader(), "C leads partition 2");
    assert!(!everyone[3].is_leader());
    for peer in everyone.iter() {
        assert_eq!(peer.screen_count(), 2, "each partition sees two screens");
    }
    assert_eq!(everyone[1].state().leader_id, Some(PeerId::from("A")));
    assert_eq!(everyone[3].state().leader_id, Some(PeerId::from("C")));

    // heal: everyone rejoins one partition
    hub.merge_all();
    run_until(&clock, &mut everyone, 13_000, 100);

    assert!(everyone[0].is_leader(), "the globally oldest peer keeps the lead");
    assert!(!everyone[1].is_leader());
    assert!(
        !everyone[2].is_leader(),
        "the younger leader stepped down after seeing an older candidate"
    );
    assert!(!everyone[3].is_leader());
    for peer in everyone.iter() {
        assert_eq!(peer.screen_count(), 4, "the healed canvas spans all four peers");
        assert_eq!(peer.state().leader_id, Some(PeerId::from("A")));
    }
}
