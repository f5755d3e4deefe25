// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Fixed-size pool of OS threads pulling tasks from one shared FIFO queue.
//!
//! Tasks may be pinned to a single worker through [`Affinity`]. Which queued
//! task an idle worker may take is decided by the pool's
//! [`SchedulingPolicy`]; the default, [`SchedulingPolicy::StrictHeadAffinity`],
//! never looks past the queue head, so a head task pinned to a busy worker
//! blocks every other worker until that worker picks it up.
//!
//! [`ThreadPool::wait_all`] is a full barrier over every task in the pool,
//! regardless of who enqueued it. Neither `wait_all` nor `join` may be called
//! from inside a task.

use crate::config::Config;
use crate::error::PoolError;
use crate::scheduling::SchedulingPolicy;
use crate::task::{Affinity, Task};
use std::any::Any;
use std::cell::Cell;
use std::collections::VecDeque;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace};

thread_local! {
    static WORKER_ID: Cell<Option<usize>> = const { Cell::new(None) };
}

struct PoolState {
    queue: VecDeque<Task>,
    in_flight: usize,
    stopped: bool,
    /// Set once every worker thread has been joined
    joined: bool,
    panicked: usize,
}

impl PoolState {
    fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.in_flight == 0
    }
}

struct Shared {
    state: Mutex<PoolState>,
    /// Idle workers wait here for an eligible task or for shutdown
    work_available: Condvar,
    /// `wait_all` and `join` wait here for running tasks to finish
    drained: Condvar,
    policy: SchedulingPolicy,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // no task body ever runs while this lock is held
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wakes whoever may take the task now at the head of `queue`
    fn wake_for_head(&self, queue: &VecDeque<Task>) {
        match queue.front().map(Task::affinity) {
            None => {}
            Some(Affinity::Any) => self.work_available.notify_one(),
            Some(Affinity::Worker(_)) => self.work_available.notify_all(),
        }
    }
}

/// Bounded worker pool with affinity-aware dispatch and a drain barrier
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    thread_count: usize,
}

impl ThreadPool {
    /// Starts `thread_count` workers using strict head-of-line scheduling
    pub fn new(thread_count: usize) -> Result<Self, PoolError> {
        Self::with_policy(thread_count, SchedulingPolicy::default())
    }

    pub fn from_config(config: &Config) -> Result<Self, PoolError> {
        Self::new(config.thread_count)
    }

    pub fn with_policy(thread_count: usize, policy: SchedulingPolicy) -> Result<Self, PoolError> {
        if thread_count == 0 {
            return Err(PoolError::NoWorkers);
        }

        let pool = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    in_flight: 0,
                    stopped: false,
                    joined: false,
                    panicked: 0,
                }),
                work_available: Condvar::new(),
                drained: Condvar::new(),
                policy,
            }),
            workers: Mutex::new(Vec::with_capacity(thread_count)),
            thread_count,
        };

        for worker_id in 0..thread_count {
            let shared = Arc::clone(&pool.shared);
            // on failure, dropping `pool` joins the workers already started
            let handle = thread::Builder::new()
                .name(format!("map-reduce-worker-{}", worker_id))
                .spawn(move || run_worker(worker_id, &shared))
                .map_err(|source| PoolError::Spawn {
                    worker: worker_id,
                    source,
                })?;
            pool.lock_workers().push(handle);
        }

        debug!(thread_count, ?policy, "worker pool started");
        Ok(pool)
    }

    /// Appends a task to the tail of the queue and wakes an idle worker
    pub fn enqueue<F>(&self, affinity: Affinity, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Task::new(affinity, task))
    }

    pub fn submit(&self, task: Task) -> Result<(), PoolError> {
        let affinity = task.affinity();
        if let Affinity::Worker(worker) = affinity {
            if worker >= self.thread_count {
                return Err(PoolError::UnknownWorker {
                    worker,
                    thread_count: self.thread_count,
                });
            }
        }

        {
            let mut state = self.shared.lock();
            if state.stopped {
                return Err(PoolError::Stopped);
            }
            state.queue.push_back(task);
        }

        match affinity {
            // every waiting worker can take an unpinned task
            Affinity::Any => self.shared.work_available.notify_one(),
            // only one specific worker can, and notify_one might miss it
            Affinity::Worker(_) => self.shared.work_available.notify_all(),
        }
        Ok(())
    }

    /// Blocks until the queue is empty and no task is executing
    pub fn wait_all(&self) {
        let state = self.shared.lock();
        let _state = self
            .shared
            .drained
            .wait_while(state, |state| !state.is_drained())
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Stops the pool: lets running and queued work finish, then joins every
    /// worker thread. Later or concurrent calls block until the first one has
    /// joined the workers, then return.
    pub fn join(&self) {
        {
            let mut state = self.shared.lock();
            if state.stopped {
                let _state = self
                    .shared
                    .drained
                    .wait_while(state, |state| !state.joined)
                    .unwrap_or_else(PoisonError::into_inner);
                return;
            }
            state.stopped = true;
            let _state = self
                .shared
                .drained
                .wait_while(state, |state| state.in_flight > 0)
                .unwrap_or_else(PoisonError::into_inner);
        }
        self.shared.work_available.notify_all();

        let handles = mem::take(&mut *self.lock_workers());
        for (worker_id, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                error!(worker_id, "worker thread terminated abnormally");
            }
        }
        self.shared.lock().joined = true;
        self.shared.drained.notify_all();
        debug!("worker pool joined");
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn queued_tasks(&self) -> usize {
        self.shared.lock().queue.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.shared.lock().in_flight
    }

    /// Number of tasks whose body panicked
    pub fn panicked_tasks(&self) -> usize {
        self.shared.lock().panicked
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.lock().stopped
    }

    pub fn policy(&self) -> SchedulingPolicy {
        self.shared.policy
    }

    /// Id of the pool worker running the calling thread, `None` off-pool
    pub fn current_worker_id() -> Option<usize> {
        WORKER_ID.with(Cell::get)
    }

    fn lock_workers(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.join();
    }
}

fn run_worker(worker_id: usize, shared: &Shared) {
    WORKER_ID.with(|id| id.set(Some(worker_id)));
    debug!(worker_id, "worker started");

    loop {
        let task = {
            let mut state = shared.lock();
            loop {
                let selected = shared
                    .policy
                    .select(&state.queue, worker_id)
                    .and_then(|index| state.queue.remove(index));
                if let Some(task) = selected {
                    state.in_flight += 1;
                    trace!(worker_id, in_flight = state.in_flight, "task dequeued");
                    shared.wake_for_head(&state.queue);
                    break task;
                }
                if state.stopped && state.queue.is_empty() {
                    debug!(worker_id, "worker stopped");
                    return;
                }
                state = shared
                    .work_available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(task.into_body()));

        {
            let mut state = shared.lock();
            state.in_flight -= 1;
            if let Err(payload) = outcome {
                state.panicked += 1;
                error!(
                    worker_id,
                    message = %panic_message(payload.as_ref()),
                    "task panicked"
                );
            }
        }
        shared.work_available.notify_all();
        shared.drained.notify_all();
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_from_str_and_string() {
        let from_str: Box<dyn Any + Send> = Box::new("boom");
        let from_string: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(42_u32);

        assert_eq!(panic_message(from_str.as_ref()), "boom");
        assert_eq!(panic_message(from_string.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_current_worker_id_is_none_off_pool() {
        assert_eq!(ThreadPool::current_worker_id(), None);
    }
}
