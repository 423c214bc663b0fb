//! End-to-end exercise of the controller link over a scripted transport:
//! handshake, inbound frames into the store, outbound register writes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use helmsman::alarm::{self, AlarmState};
use helmsman::otto::{OttoLink, OttoState};
use helmsman::store::Store;
use helmsman::transport::MockTransport;

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

fn link_over(mock: &MockTransport, shutdown: &Arc<AtomicBool>) -> OttoLink {
    OttoLink::with_transport(
        Box::new(mock.clone()),
        Arc::clone(shutdown),
        Duration::from_secs(2),
    )
}

#[test]
fn test_handshake_completes_against_scripted_controller() {
    // The controller discards line noise until it has seen the challenge,
    // then acknowledges.
    let mock = MockTransport::new();
    mock.reply_after(b"@@CQ!", b"+CQOK\r\n");

    let shutdown = Arc::new(AtomicBool::new(false));
    let link = link_over(&mock, &shutdown);

    assert!(link.synchronize().unwrap());
    let written = mock.written();
    assert!(written.windows(7).any(|w| w == b"@@CQ!\r\n"));
}

#[test]
fn test_inbound_frames_reach_the_store() {
    let mock = MockTransport::new();
    let shutdown = Arc::new(AtomicBool::new(false));
    let store = Arc::new(Store::new());

    let mut link = link_over(&mock, &shutdown);
    link.start(Arc::clone(&store)).unwrap();

    let updates = store.subscribe::<OttoState>().unwrap();
    mock.inject(b"$0000:20C0:8133\r\n@00012C\r\n!02\r\n>4123\r\n*hello from otto\r\n");

    // One publish per state-bearing frame; the debug line publishes
    // nothing.
    for _ in 0..4 {
        updates.recv_timeout(TEST_TIMEOUT).expect("no publish");
    }

    let state = store.load::<OttoState>().unwrap();
    assert_eq!(state.actual_awa, 0x20);
    assert_eq!(state.actual_compass, 0xC0);
    assert_eq!(state.actual_rudder, 0x81);
    assert_eq!(state.actual_sail, 0x33);
    assert_eq!(state.otto_timestamp, 300);
    assert_eq!(state.mode, 2);
    assert_eq!(state.telemetry[4], 0x123);

    shutdown.store(true, Ordering::Relaxed);
    link.stop();
}

#[test]
fn test_uptime_regression_raises_restart() {
    let mock = MockTransport::new();
    let shutdown = Arc::new(AtomicBool::new(false));
    let store = Arc::new(Store::new());

    let mut link = link_over(&mock, &shutdown);
    link.start(Arc::clone(&store)).unwrap();

    let updates = store.subscribe::<OttoState>().unwrap();
    mock.inject(b"@000200\r\n@000005\r\n");
    for _ in 0..2 {
        updates.recv_timeout(TEST_TIMEOUT).expect("no publish");
    }

    let alarms = store.load::<AlarmState>().unwrap();
    assert_ne!(alarms.bitmap & alarm::OTTO_RESTART, 0);

    shutdown.store(true, Ordering::Relaxed);
    link.stop();
}

#[test]
fn test_register_writes_hit_the_wire_with_mode_rules() {
    let mock = MockTransport::new();
    let shutdown = Arc::new(AtomicBool::new(false));
    let store = Arc::new(Store::new());

    let mut link = link_over(&mock, &shutdown);
    let otto = link.start(Arc::clone(&store)).unwrap();

    otto.set_rudder(10.0).unwrap();
    otto.set_rudder(10.0).unwrap(); // suppressed
    otto.steer_compass(std::f64::consts::PI).unwrap();

    // Wait for the writer to drain the queue.
    let deadline = std::time::Instant::now() + TEST_TIMEOUT;
    loop {
        let written = String::from_utf8(mock.written()).unwrap();
        if written == "R2=1\r\nR4=a0\r\nR2=2\r\nR6=80\r\n" {
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "writer output never settled, got {:?}",
            written
        );
        std::thread::sleep(Duration::from_millis(10));
    }

    shutdown.store(true, Ordering::Relaxed);
    link.stop();
}

#[test]
fn test_malformed_frames_do_not_poison_the_link() {
    let mock = MockTransport::new();
    let shutdown = Arc::new(AtomicBool::new(false));
    let store = Arc::new(Store::new());

    let mut link = link_over(&mock, &shutdown);
    link.start(Arc::clone(&store)).unwrap();

    let updates = store.subscribe::<OttoState>().unwrap();
    mock.inject(b"#garbage\r\n$short\r\n!02\r\n");
    updates.recv_timeout(TEST_TIMEOUT).expect("no publish");

    assert_eq!(store.load::<OttoState>().unwrap().mode, 2);
    assert_eq!(store.counter::<OttoState>().unwrap(), 1);

    shutdown.store(true, Ordering::Relaxed);
    link.stop();
}
