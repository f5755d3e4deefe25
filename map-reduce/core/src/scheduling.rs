// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::task::Task;
use std::collections::VecDeque;

/// How an idle worker picks its next task from the shared queue
///
/// The policy changes observable scheduling behavior, so it is chosen
/// explicitly when the pool is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingPolicy {
    /// A worker only ever looks at the queue head.
    ///
    /// If the head task is pinned to a worker that is busy, every other idle
    /// worker stays blocked even when later entries are eligible for them
    /// (head-of-line blocking under affinity).
    #[default]
    StrictHeadAffinity,
    /// A worker takes the first queued task it is eligible for, skipping
    /// entries pinned to other workers.
    SkipAhead,
}

impl SchedulingPolicy {
    /// Queue index of the task `worker_id` should run next, if any
    pub fn select(&self, queue: &VecDeque<Task>, worker_id: usize) -> Option<usize> {
        match self {
            SchedulingPolicy::StrictHeadAffinity => queue
                .front()
                .filter(|task| task.affinity().admits(worker_id))
                .map(|_| 0),
            SchedulingPolicy::SkipAhead => queue
                .iter()
                .position(|task| task.affinity().admits(worker_id)),
        }
    }
}
