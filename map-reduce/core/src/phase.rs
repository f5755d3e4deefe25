// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Lifecycle of a single map-reduce run
///
/// `Created → Dividing → Mapping → MapBarrier → Grouping → Reducing →
/// ReduceBarrier → Done`. Any non-terminal phase may move to `Failed`. The
/// unimplemented distributed-main mode moves `Created → Done` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Created,
    Dividing,
    Mapping,
    MapBarrier,
    Grouping,
    Reducing,
    ReduceBarrier,
    Done,
    Failed,
}

impl JobPhase {
    /// The phase that follows this one on the success path
    pub fn next(self) -> Option<JobPhase> {
        match self {
            JobPhase::Created => Some(JobPhase::Dividing),
            JobPhase::Dividing => Some(JobPhase::Mapping),
            JobPhase::Mapping => Some(JobPhase::MapBarrier),
            JobPhase::MapBarrier => Some(JobPhase::Grouping),
            JobPhase::Grouping => Some(JobPhase::Reducing),
            JobPhase::Reducing => Some(JobPhase::ReduceBarrier),
            JobPhase::ReduceBarrier => Some(JobPhase::Done),
            JobPhase::Done | JobPhase::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Done | JobPhase::Failed)
    }

    pub fn can_advance_to(self, to: JobPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        match to {
            JobPhase::Failed => true,
            JobPhase::Done if self == JobPhase::Created => true,
            _ => self.next() == Some(to),
        }
    }
}
