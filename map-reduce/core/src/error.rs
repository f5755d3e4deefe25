// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::phase::JobPhase;
use thiserror::Error;

/// Result type returned by partitioning, mapping and reduction strategies
pub type StrategyResult<T> = Result<T, StrategyError>;

/// Errors loading or validating a job configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised by the worker pool
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("a worker pool needs at least one worker thread")]
    NoWorkers,

    #[error("failed to spawn worker thread {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("the worker pool has been stopped")]
    Stopped,

    /// A task pinned to a worker that does not exist would sit at the queue
    /// head forever
    #[error("no worker {worker} in a pool of {thread_count} threads")]
    UnknownWorker { worker: usize, thread_count: usize },
}

/// Validation failures signalled by a user-supplied strategy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },
}

/// Failure of a distributed hand-off hook
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandOffError {
    #[error("hand-off transport failed: {0}")]
    Transport(String),
}

/// Errors that abort a map-reduce run
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("partitioning failed: {0}")]
    Divide(#[source] StrategyError),

    #[error("map task for partition {partition} failed: {source}")]
    Map {
        partition: usize,
        #[source]
        source: StrategyError,
    },

    #[error("reduce task for key {key} failed: {source}")]
    Reduce {
        key: String,
        #[source]
        source: StrategyError,
    },

    #[error("{phase} task panicked: {message}")]
    TaskPanicked {
        phase: &'static str,
        message: String,
    },

    #[error(transparent)]
    HandOff(#[from] HandOffError),

    #[error("job already ran (current phase: {phase:?})")]
    AlreadyRun { phase: JobPhase },
}
