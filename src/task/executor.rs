use super::{timer, Task, TaskId};
use crate::config::DEFAULT_TASK_CAPACITY;
use crate::error::Error;
use crate::{idle, time};
use core::{
    sync::atomic::{AtomicBool, Ordering},
    task::{Context, Poll, Waker},
    time::Duration,
};
use crossbeam_queue::ArrayQueue;
use std::{collections::BTreeMap, sync::Arc, task::Wake};

pub struct Executor {
    tasks: BTreeMap<TaskId, Task>,
    task_queue: Arc<ArrayQueue<TaskId>>,
    waker_cache: BTreeMap<TaskId, Arc<TaskWaker>>,
}

impl Executor {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TASK_CAPACITY)
    }

    /// At most `capacity` tasks may be alive at once.
    pub fn with_capacity(capacity: usize) -> Self {
        Executor {
            tasks: BTreeMap::new(),
            task_queue: Arc::new(ArrayQueue::new(capacity.max(1))),
            waker_cache: BTreeMap::new(),
        }
    }

    pub fn spawn(&mut self, task: Task) -> Result<TaskId, Error> {
        let task_id = task.id;
        if self.tasks.len() >= self.task_queue.capacity() {
            return Err(Error::QueueFull);
        }
        if self.tasks.insert(task.id, task).is_some() {
            panic!("task with same ID already in tasks");
        }
        // Each live task is queued at most once, so this cannot overflow
        self.task_queue
            .push(task_id)
            .map_err(|_| Error::QueueFull)?;
        Ok(task_id)
    }

    /// Number of tasks not yet finished.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Poll every ready task once, including tasks woken while doing so.
    pub fn run_ready_tasks(&mut self) {
        // destructure `self` to avoid borrow checker errors
        let Self {
            tasks,
            task_queue,
            waker_cache,
        } = self;

        while let Some(task_id) = task_queue.pop() {
            let task = match tasks.get_mut(&task_id) {
                Some(task) => task,
                None => continue, // task no longer exists
            };
            let task_waker = waker_cache
                .entry(task_id)
                .or_insert_with(|| TaskWaker::new(task_id, task_queue.clone()));
            // Wakes from here on must requeue the task
            task_waker.queued.store(false, Ordering::Release);
            let waker = Waker::from(task_waker.clone());
            let mut context = Context::from_waker(&waker);
            match task.poll(&mut context) {
                Poll::Ready(()) => {
                    // task done -> remove it and its cached waker
                    tasks.remove(&task_id);
                    waker_cache.remove(&task_id);
                }
                Poll::Pending => {}
            }
        }
    }

    /// Suspend the process until a timer expires or a signal is delivered.
    ///
    /// Wakes nothing by itself: fired timers and drained signals requeue
    /// their tasks through the usual wakers.
    fn sleep_if_idle(&self) {
        let now = time::now_monotonic();
        if timer::fire_expired(now) > 0 || !self.task_queue.is_empty() {
            return;
        }
        match timer::next_deadline() {
            Some(deadline) => idle::sleep_for(Duration::from_nanos(deadline.saturating_sub(now))),
            None => idle::wait_forever(),
        }
    }

    /// Run until every spawned task has finished.
    ///
    /// Blocked tasks with neither a timer nor a captured signal to wake
    /// them are a deadlock, reported fatally by `idle::wait_forever`.
    pub fn run(&mut self) {
        log::debug!("executor: running {} task(s)", self.tasks.len());
        loop {
            self.run_ready_tasks();
            if self.tasks.is_empty() {
                break;
            }
            self.sleep_if_idle();
        }
        log::debug!("executor: all tasks finished");
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

struct TaskWaker {
    task_id: TaskId,
    task_queue: Arc<ArrayQueue<TaskId>>,
    queued: AtomicBool,
}

impl TaskWaker {
    fn new(task_id: TaskId, task_queue: Arc<ArrayQueue<TaskId>>) -> Arc<TaskWaker> {
        Arc::new(TaskWaker {
            task_id,
            task_queue,
            queued: AtomicBool::new(false),
        })
    }

    fn wake_task(&self) {
        if self.queued.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.task_queue.push(self.task_id).is_err() {
            log::warn!("executor: ready queue full, dropping wake for {:?}", self.task_id);
        }
    }
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.wake_task();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.wake_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{timer, yield_now};
    use std::{cell::RefCell, rc::Rc, time::Instant};

    #[test]
    fn test_run_returns_when_tasks_finish() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut executor = Executor::new();
        for n in 0..3 {
            let log = Rc::clone(&log);
            executor.spawn(Task::new(async move { log.borrow_mut().push(n) })).unwrap();
        }
        executor.run();
        assert!(executor.is_empty());
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_yield_interleaves_tasks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut executor = Executor::new();
        for name in ['a', 'b'] {
            let log = Rc::clone(&log);
            executor
                .spawn(Task::new(async move {
                    for _ in 0..2 {
                        log.borrow_mut().push(name);
                        yield_now().await;
                    }
                }))
                .unwrap();
        }
        executor.run();
        assert_eq!(*log.borrow(), vec!['a', 'b', 'a', 'b']);
    }

    #[test]
    fn test_spawn_beyond_capacity_fails() {
        let mut executor = Executor::with_capacity(1);
        executor.spawn(Task::new(async {})).unwrap();
        assert!(matches!(executor.spawn(Task::new(async {})), Err(Error::QueueFull)));
    }

    #[test]
    fn test_duplicate_wakes_queue_once() {
        let queue = Arc::new(ArrayQueue::new(1));
        let waker = Waker::from(TaskWaker::new(TaskId::new(), queue.clone()));
        waker.wake_by_ref();
        waker.wake_by_ref();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_timer_task_sleeps_then_completes() {
        let done = Rc::new(RefCell::new(false));
        let mut executor = Executor::new();
        {
            let done = Rc::clone(&done);
            executor
                .spawn(Task::new(async move {
                    timer::sleep(Duration::from_millis(30)).await;
                    *done.borrow_mut() = true;
                }))
                .unwrap();
        }
        let start = Instant::now();
        executor.run();
        assert!(*done.borrow());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
