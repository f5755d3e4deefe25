// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::fmt;

/// Which worker may execute a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Affinity {
    /// Any worker
    #[default]
    Any,
    /// Only the worker with this id
    Worker(usize),
}

impl Affinity {
    pub fn admits(&self, worker_id: usize) -> bool {
        match self {
            Affinity::Any => true,
            Affinity::Worker(id) => *id == worker_id,
        }
    }
}

type TaskBody = Box<dyn FnOnce() + Send + 'static>;

/// A unit of work queued on the pool, consumed exactly once by one worker
pub struct Task {
    affinity: Affinity,
    body: TaskBody,
}

impl Task {
    pub fn new<F>(affinity: Affinity, body: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            affinity,
            body: Box::new(body),
        }
    }

    pub fn affinity(&self) -> Affinity {
        self.affinity
    }

    pub(crate) fn into_body(self) -> TaskBody {
        self.body
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("affinity", &self.affinity)
            .finish_non_exhaustive()
    }
}
