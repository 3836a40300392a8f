//! Idle behavior before any signal has been enabled. Nothing in this file
//! may call `signal::enable`: the interest flag is sticky for the process.

mod shared_runtime;
use shared_runtime::init_runtime;

use posix_rt::task::{self, Executor, Task};
use posix_rt::{idle, signal};
use std::time::{Duration, Instant};

#[test]
fn test_sleep_without_interest_waits_full_duration() {
    init_runtime();
    assert!(!signal::has_signals());

    let start = Instant::now();
    idle::sleep_for(Duration::from_millis(50));

    assert!(start.elapsed() >= Duration::from_millis(50));
    assert_eq!(signal::try_recv(), None);
}

#[test]
fn test_executor_sleeps_until_timer_deadline() {
    init_runtime();

    let mut executor = Executor::new();
    executor
        .spawn(Task::new(async {
            task::sleep(Duration::from_millis(40)).await;
            task::sleep(Duration::from_millis(20)).await;
        }))
        .unwrap();

    let start = Instant::now();
    executor.run();
    assert!(start.elapsed() >= Duration::from_millis(60));
    assert!(executor.is_empty());
}
