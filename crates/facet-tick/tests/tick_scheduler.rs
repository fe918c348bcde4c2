//! Integration tests for the fixed-period tick scheduler.
//!
//! Uses `tokio::time::pause()` (via `start_paused`) so `sleep_until`
//! resolves deterministically as the clock auto-advances.

use std::time::Duration;

use facet_tick::TickScheduler;

fn scheduler_100ms() -> TickScheduler {
    TickScheduler::new(Duration::from_millis(100), Duration::ZERO)
}

#[test]
fn test_new_scheduler_is_disarmed() {
    let s = scheduler_100ms();
    assert!(!s.is_armed());
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.period(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_disarmed_scheduler_pends_forever() {
    let mut s = scheduler_100ms();
    let result =
        tokio::time::timeout(Duration::from_secs(5), s.wait_for_tick()).await;
    assert!(result.is_err(), "disarmed scheduler must pend");
}

#[tokio::test(start_paused = true)]
async fn test_armed_scheduler_fires_and_increments() {
    let mut s = scheduler_100ms();
    s.arm();

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
    assert_eq!(info.dt, Duration::from_millis(100));
    assert!(!info.overrun);
    assert_eq!(info.ticks_skipped, 0);
    assert_eq!(s.tick_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_increment_monotonically() {
    let mut s = scheduler_100ms();
    s.arm();
    for expected in 1..=5 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_disarm_stops_ticks() {
    let mut s = scheduler_100ms();
    s.arm();
    s.wait_for_tick().await;

    s.disarm();
    assert!(!s.is_armed());
    let result =
        tokio::time::timeout(Duration::from_secs(1), s.wait_for_tick()).await;
    assert!(result.is_err(), "disarmed scheduler must pend");
}

#[tokio::test(start_paused = true)]
async fn test_rearm_resumes_from_now() {
    let mut s = scheduler_100ms();
    s.arm();
    s.wait_for_tick().await;
    s.disarm();

    // A long gap while disarmed must not produce catch-up ticks.
    tokio::time::advance(Duration::from_secs(60)).await;
    s.arm();
    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 2);
    assert!(!info.overrun);
}

#[tokio::test]
async fn test_arm_disarm_idempotent() {
    let mut s = scheduler_100ms();
    s.arm();
    s.arm();
    assert!(s.is_armed());
    s.disarm();
    s.disarm();
    assert!(!s.is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    // Mirrors the session client's select loop: ticks interleave with
    // channel traffic until a stop command lands.
    let mut s = scheduler_100ms();
    s.arm();

    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(320)).await;
        tx.send("stop").await.ok();
    });

    let mut ticks_fired = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "stop");
                break;
            }
            info = s.wait_for_tick() => {
                ticks_fired += 1;
                assert_eq!(info.tick, ticks_fired);
            }
        }
    }

    assert!(ticks_fired >= 3, "expected at least 3 ticks, got {ticks_fired}");
}
