use std::time::Duration;

use prop_monitor::Error;
use prop_monitor::MonitorError;
use prop_monitor::PropValue;
use prop_monitor::StopReason;
use prop_monitor::TransportError;
use prop_monitor::UpdateMonitor;
use tokio::time::timeout;
use tokio::time::Instant;

use crate::common::batch;
use crate::common::count;
use crate::common::recorder;
use crate::common::service_content;
use crate::common::update;
use crate::common::vm;
use crate::common::vm_monitor;
use crate::common::ScriptedCollector;
use crate::common::Step;
use crate::common::TEST_DEADLINE;

/// # Case 1: enter, empty wait, modify and leave, then stop
///
/// ## Validation criteria:
/// 1. cursors sent: none, v1, v1, v2
/// 2. handler sees vm-1 enter, vm-1 modify, vm-2 leave in that order
/// 3. stop ends the loop gracefully, destroys the filter and disconnects once
#[tokio::test]
async fn test_monitor_end_to_end_case1() {
    let collector = ScriptedCollector::new([
        batch("v1", vec![update(vm("vm-1"), "enter", &[("name", "web01".into())])]),
        Step::NoChange,
        batch(
            "v2",
            vec![
                update(vm("vm-1"), "modify", &[("runtime.powerState", "poweredOff".into())]),
                update(vm("vm-2"), "leave", &[]),
            ],
        ),
    ]);
    let monitor = vm_monitor(collector.clone());
    let (seen, handler) = recorder();

    let running = monitor.clone();
    let task = tokio::spawn(async move { running.monitor(handler).await });

    timeout(TEST_DEADLINE, collector.until_blocked()).await.expect("loop parked");
    assert!(monitor.is_running());
    monitor.stop().await;

    let reason = timeout(TEST_DEADLINE, task)
        .await
        .expect("loop ended")
        .expect("task joined")
        .expect("graceful stop");
    assert_eq!(reason, StopReason::Stopped);

    assert_eq!(
        collector.versions_seen(),
        vec![None, Some("v1".to_string()), Some("v1".to_string()), Some("v2".to_string())]
    );

    let seen = seen.lock();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].0, vm("vm-1"));
    assert_eq!(seen[0].1.as_ref().unwrap()["name"], PropValue::from("web01"));
    assert_eq!(seen[1].0, vm("vm-1"));
    assert_eq!(
        seen[1].1.as_ref().unwrap()["runtime.powerState"],
        PropValue::from("poweredOff")
    );
    assert_eq!(seen[2], (vm("vm-2"), None));

    assert_eq!(count(&collector.filters_created), 1);
    assert_eq!(count(&collector.filters_destroyed), 1);
    assert_eq!(count(&collector.disconnects), 1);
    assert!(!monitor.is_running());
}

/// # Case 2: receive timeouts on a live session do not disturb the cursor
#[tokio::test]
async fn test_monitor_retries_timeouts_case2() {
    let collector = ScriptedCollector::new([
        batch("v1", vec![update(vm("vm-1"), "enter", &[("name", "a".into())])]),
        Step::Timeout,
        Step::Timeout,
        batch("v2", vec![update(vm("vm-1"), "modify", &[("name", "b".into())])]),
        Step::Fault("InvalidCollectorVersion".to_string()),
    ]);
    let monitor = vm_monitor(collector.clone());
    let (seen, handler) = recorder();

    let result = timeout(TEST_DEADLINE, monitor.monitor(handler)).await.expect("loop ended");

    assert!(matches!(result, Err(Error::Transport(TransportError::Fault(_)))));
    assert_eq!(
        collector.versions_seen(),
        vec![
            None,
            Some("v1".to_string()),
            Some("v1".to_string()),
            Some("v1".to_string()),
            Some("v2".to_string())
        ]
    );
    assert_eq!(seen.lock().len(), 2);
    assert_eq!(count(&collector.filters_destroyed), 1);
    assert_eq!(count(&collector.disconnects), 1);
}

/// # Case 3: a timeout on a dead session is fatal and leaves the session alone
#[tokio::test]
async fn test_monitor_connection_lost_case3() {
    let collector = ScriptedCollector::new([
        batch("v1", vec![update(vm("vm-1"), "enter", &[("name", "a".into())])]),
        Step::Timeout,
    ]);
    collector.kill_session();
    let monitor = vm_monitor(collector.clone());
    let (seen, handler) = recorder();

    let result = timeout(TEST_DEADLINE, monitor.monitor(handler)).await.expect("loop ended");

    assert!(matches!(result, Err(Error::Monitor(MonitorError::ConnectionLost))));
    assert_eq!(seen.lock().len(), 1);
    assert_eq!(count(&collector.filters_destroyed), 0);
    assert_eq!(count(&collector.disconnects), 0);
    assert!(!monitor.is_alive().await);
}

#[tokio::test]
async fn test_monitor_absorbs_interrupt() {
    let collector = ScriptedCollector::new([Step::NoChange, Step::Interrupted]);
    let monitor = vm_monitor(collector.clone());
    let (_seen, handler) = recorder();

    let reason = timeout(TEST_DEADLINE, monitor.monitor(handler))
        .await
        .expect("loop ended")
        .expect("interrupt absorbed");

    assert_eq!(reason, StopReason::Interrupted);
    assert_eq!(count(&collector.filters_destroyed), 1);
    assert_eq!(count(&collector.disconnects), 1);
}

#[tokio::test]
async fn test_monitor_skips_unrecognized_kind() {
    let collector = ScriptedCollector::new([
        batch(
            "v1",
            vec![
                update(vm("vm-1"), "rename", &[("name", "a".into())]),
                update(vm("vm-2"), "modify", &[("name", "b".into())]),
            ],
        ),
        Step::Interrupted,
    ]);
    let monitor = vm_monitor(collector.clone());
    let (seen, handler) = recorder();

    timeout(TEST_DEADLINE, monitor.monitor(handler))
        .await
        .expect("loop ended")
        .expect("interrupt absorbed");

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, vm("vm-2"));
}

/// The delay applies after each applied batch and never after an empty wait.
#[tokio::test(start_paused = true)]
async fn test_monitor_update_delay() {
    let collector = ScriptedCollector::new([
        batch("v1", vec![update(vm("vm-1"), "enter", &[("name", "a".into())])]),
        Step::NoChange,
        batch("v2", vec![update(vm("vm-1"), "modify", &[("name", "b".into())])]),
        Step::Interrupted,
    ]);
    let monitor = UpdateMonitor::builder(collector.clone(), service_content())
        .property_map(prop_monitor::PropertyMap::new().with_all("VirtualMachine"))
        .update_delay(Duration::from_secs(5))
        .build()
        .expect("valid monitor");
    let (seen, handler) = recorder();

    let started = Instant::now();
    monitor.monitor(handler).await.expect("interrupt absorbed");

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(10), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(11), "elapsed {elapsed:?}");
    assert_eq!(seen.lock().len(), 2);
}
