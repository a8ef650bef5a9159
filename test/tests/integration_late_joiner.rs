/// A newcomer joining a settled session must obtain the layout through its
/// immediate REQUEST_LAYOUT, without waiting for the leader's next
/// spontaneous heartbeat (which may be throttled).
use windowmesh::{Clock, ManualClock, Rect};
use windowmesh_test::helpers::{run_until, TestPeer};
use windowmesh_test::local_bus::LocalHub;

#[test]
fn test_late_joiner_receives_layout_before_next_heartbeat_tick() {
    let hub = LocalHub::new();
    let clock = ManualClock::new(0);
    let mut a = TestPeer::boot(&hub, &clock, "A", Rect::new(0.0, 0.0, 800.0, 600.0));

    // A settles as leader with a one-screen layout
    run_until(&clock, &mut [&mut a], 5000, 100);
    assert!(a.is_leader());
    assert_eq!(a.screen_count(), 1);

    // B boots one millisecond later; A's heartbeat timer has 999 ms to go,
    // so only the REQUEST_LAYOUT reply can deliver the layout in time
    clock.advance(1);
    let mut b = TestPeer::boot(&hub, &clock, "B", Rect::new(800.0, 0.0, 800.0, 600.0));
    a.engine.receive(); // HELLO + REQUEST_LAYOUT arrive; A replies at once
    b.engine.receive(); // LAYOUT_UPDATE lands

    assert!(clock.now_ms() < 5100);
    assert_eq!(b.screen_count(), 2, "B sees both screens before t=5100");
    assert!(!b.is_leader());
}

#[test]
fn test_request_layout_replays_shared_data_to_newcomers() {
    let hub = LocalHub::new();
    let clock = ManualClock::new(0);
    let mut a = TestPeer::boot(&hub, &clock, "A", Rect::new(0.0, 0.0, 800.0, 600.0));
    run_until(&clock, &mut [&mut a], 5000, 100);

    a.engine
        .set_shared_data("pointer-color", serde_json::json!("#ff8800"));
    a.engine.set_shared_data("tick-rate", serde_json::json!(60));

    clock.advance(1);
    let mut b = TestPeer::boot(&hub, &clock, "B", Rect::new(800.0, 0.0, 800.0, 600.0));
    a.engine.receive();
    b.engine.receive();

    let shared = b.state().shared_data;
    assert_eq!(shared["pointer-color"], serde_json::json!("#ff8800"));
    assert_eq!(shared["tick-rate"], serde_json::json!(60));
}
