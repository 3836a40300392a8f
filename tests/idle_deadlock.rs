//! Waiting with nothing that could ever wake us. No signal is enabled in
//! this file.

mod shared_runtime;
use shared_runtime::init_runtime;

use posix_rt::idle;
use posix_rt::task::{Executor, Task};
use std::future::pending;

#[test]
#[should_panic(expected = "deadlocked: no event source")]
fn test_wait_forever_without_interest_is_fatal() {
    init_runtime();
    idle::wait_forever();
}

/// A task blocked on nothing leaves the executor with no event source
#[test]
#[should_panic(expected = "deadlocked: no event source")]
fn test_executor_with_stuck_task_is_fatal() {
    init_runtime();
    let mut executor = Executor::new();
    executor.spawn(Task::new(pending::<()>())).unwrap();
    executor.run();
}
