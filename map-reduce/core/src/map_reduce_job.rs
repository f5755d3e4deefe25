// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::{Config, ExecutionMode};
use crate::divider::Divider;
use crate::error::JobError;
use crate::hand_off::{HandOff, NoopHandOff};
use crate::mapper::Mapper;
use crate::phase::JobPhase;
use crate::reducer::Reducer;
use crate::shuffle::group_by_key;
use crate::task::Affinity;
use crate::thread_pool::{panic_message, ThreadPool};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, trace, warn};

/// How a run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every phase ran and the output holds the reduced pairs
    Completed,
    /// Distributed coordinator mode is not implemented; no output produced
    DistributedMainUnsupported,
}

/// Summary of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub status: RunStatus,
    pub partitions: usize,
    pub keys: usize,
    /// Pairs appended to the output
    pub reduced: usize,
    /// Keys dropped because no reducer was configured
    pub skipped_keys: usize,
}

impl RunReport {
    fn unsupported() -> Self {
        Self {
            status: RunStatus::DistributedMainUnsupported,
            partitions: 0,
            keys: 0,
            reduced: 0,
            skipped_keys: 0,
        }
    }
}

type FinalSort<K, V> = Box<dyn Fn(&(K, V), &(K, V)) -> Ordering + Send + Sync>;

/// Buffers written by map and reduce tasks, all behind one job-local lock
struct JobBuffers<K, V> {
    mapped: Vec<Vec<(K, V)>>,
    reduced: Vec<(K, V)>,
    skipped_keys: usize,
    failures: Vec<JobError>,
}

impl<K, V> JobBuffers<K, V> {
    fn with_capacity(partitions: usize) -> Self {
        Self {
            mapped: Vec::with_capacity(partitions),
            reduced: Vec::new(),
            skipped_keys: 0,
            failures: Vec::new(),
        }
    }

    /// Fails with the first recorded task error, logging the rest
    fn check_failures(&mut self) -> Result<(), JobError> {
        let mut failures = mem::take(&mut self.failures).into_iter();
        match failures.next() {
            None => Ok(()),
            Some(first) => {
                for other in failures {
                    error!(error = %other, "additional task failure");
                }
                Err(first)
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One divide → map → group → reduce run over a shared worker pool
///
/// The job owns its strategies; the pool is shared and outlives the job.
/// A job runs at most once.
pub struct MapReduceJob<K, V> {
    config: Config,
    pool: Arc<ThreadPool>,
    divider: Box<dyn Divider<K>>,
    mapper: Arc<dyn Mapper<K, V>>,
    reducer: Option<Arc<dyn Reducer<K, V>>>,
    hand_off: Box<dyn HandOff<K, V>>,
    final_sort: Option<FinalSort<K, V>>,
    phase: JobPhase,
}

impl<K, V> MapReduceJob<K, V>
where
    K: Eq + Hash + Debug + Send + 'static,
    V: Send + 'static,
{
    pub fn new<D, M, R>(
        config: Config,
        pool: Arc<ThreadPool>,
        divider: D,
        mapper: M,
        reducer: R,
    ) -> Self
    where
        D: Divider<K> + 'static,
        M: Mapper<K, V> + 'static,
        R: Reducer<K, V> + 'static,
    {
        Self::assemble(
            config,
            pool,
            Box::new(divider),
            Arc::new(mapper),
            Some(Arc::new(reducer)),
        )
    }

    /// A job with no reduction strategy: every key is logged and skipped
    pub fn without_reducer<D, M>(config: Config, pool: Arc<ThreadPool>, divider: D, mapper: M) -> Self
    where
        D: Divider<K> + 'static,
        M: Mapper<K, V> + 'static,
    {
        Self::assemble(config, pool, Box::new(divider), Arc::new(mapper), None)
    }

    fn assemble(
        config: Config,
        pool: Arc<ThreadPool>,
        divider: Box<dyn Divider<K>>,
        mapper: Arc<dyn Mapper<K, V>>,
        reducer: Option<Arc<dyn Reducer<K, V>>>,
    ) -> Self {
        Self {
            config,
            pool,
            divider,
            mapper,
            reducer,
            hand_off: Box::new(NoopHandOff),
            final_sort: None,
            phase: JobPhase::Created,
        }
    }

    /// Replaces the no-op distributed hand-off
    pub fn with_hand_off<H>(mut self, hand_off: H) -> Self
    where
        H: HandOff<K, V> + 'static,
    {
        self.hand_off = Box::new(hand_off);
        self
    }

    /// Sorts the reduced pairs with `compare` after the reduce barrier
    pub fn with_final_sort<F>(mut self, compare: F) -> Self
    where
        F: Fn(&(K, V), &(K, V)) -> Ordering + Send + Sync + 'static,
    {
        self.final_sort = Some(Box::new(compare));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    /// Runs the whole pipeline and appends the reduced pairs to `output`.
    ///
    /// Returns only after every phase and barrier has completed. On error
    /// `output` is left untouched and the job ends in [`JobPhase::Failed`].
    pub fn run(&mut self, input: &[K], output: &mut Vec<(K, V)>) -> Result<RunReport, JobError> {
        if self.phase != JobPhase::Created {
            return Err(JobError::AlreadyRun { phase: self.phase });
        }

        let result = self.dispatch(input, output);
        if let Err(err) = &result {
            error!(error = %err, phase = ?self.phase, "map-reduce run failed");
            if !self.phase.is_terminal() {
                self.advance(JobPhase::Failed);
            }
        }
        result
    }

    fn dispatch(&mut self, input: &[K], output: &mut Vec<(K, V)>) -> Result<RunReport, JobError> {
        self.config.validate_chunk_size()?;
        if self.config.thread_count != self.pool.thread_count() {
            warn!(
                configured = self.config.thread_count,
                pool = self.pool.thread_count(),
                "config thread_count differs from the shared pool size, using the pool"
            );
        }

        match self.config.mode() {
            ExecutionMode::Local => {
                info!("running in local mode");
                let (report, reduced) = self.run_local(input)?;
                output.extend(reduced);
                self.advance(JobPhase::Done);
                Ok(report)
            }
            ExecutionMode::DistributedMain => {
                warn!("distributed main mode is not implemented, no output produced");
                self.advance(JobPhase::Done);
                Ok(RunReport::unsupported())
            }
            ExecutionMode::DistributedWorker => {
                info!("running in distributed worker mode");
                let (report, reduced) = self.run_local(input)?;
                self.hand_off.send_to_main(&reduced)?;
                output.extend(reduced);
                self.advance(JobPhase::Done);
                Ok(report)
            }
        }
    }

    fn run_local(&mut self, input: &[K]) -> Result<(RunReport, Vec<(K, V)>), JobError> {
        self.advance(JobPhase::Dividing);
        let partitions = self
            .divider
            .divide(input, self.config.chunk_size)
            .map_err(JobError::Divide)?;
        let partition_count = partitions.len();
        debug!(inputs = input.len(), partitions = partition_count, "input divided");

        let buffers = Arc::new(Mutex::new(JobBuffers::with_capacity(partition_count)));

        self.advance(JobPhase::Mapping);
        let enqueued = self.enqueue_map_tasks(partitions, &buffers);
        self.advance(JobPhase::MapBarrier);
        self.pool.wait_all();
        enqueued?;
        let mapped = {
            let mut buffers = lock(&buffers);
            buffers.check_failures()?;
            mem::take(&mut buffers.mapped)
        };
        info!(partitions = mapped.len(), "mapping is complete");

        self.advance(JobPhase::Grouping);
        let grouped = group_by_key(mapped);
        let key_count = grouped.len();
        debug!(keys = key_count, "mapped pairs grouped");

        self.advance(JobPhase::Reducing);
        let enqueued = self.enqueue_reduce_tasks(grouped, &buffers);
        self.advance(JobPhase::ReduceBarrier);
        self.pool.wait_all();
        enqueued?;
        let (mut reduced, skipped_keys) = {
            let mut buffers = lock(&buffers);
            buffers.check_failures()?;
            (mem::take(&mut buffers.reduced), buffers.skipped_keys)
        };

        if let Some(compare) = &self.final_sort {
            reduced.sort_by(|a, b| compare(a, b));
        }

        let report = RunReport {
            status: RunStatus::Completed,
            partitions: partition_count,
            keys: key_count,
            reduced: reduced.len(),
            skipped_keys,
        };
        info!(
            reduced = report.reduced,
            skipped_keys = report.skipped_keys,
            "reduction is complete"
        );
        Ok((report, reduced))
    }

    fn enqueue_map_tasks(
        &self,
        partitions: Vec<Vec<K>>,
        buffers: &Arc<Mutex<JobBuffers<K, V>>>,
    ) -> Result<(), JobError> {
        for (index, partition) in partitions.into_iter().enumerate() {
            let mapper = Arc::clone(&self.mapper);
            let buffers = Arc::clone(buffers);
            self.pool.enqueue(Affinity::Any, move || {
                trace!(
                    partition = index,
                    worker = ?ThreadPool::current_worker_id(),
                    "map task started"
                );
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| mapper.map(&partition)));
                let mut buffers = lock(&buffers);
                match outcome {
                    Ok(Ok(pairs)) => buffers.mapped.push(pairs),
                    Ok(Err(source)) => buffers.failures.push(JobError::Map {
                        partition: index,
                        source,
                    }),
                    Err(payload) => buffers.failures.push(JobError::TaskPanicked {
                        phase: "map",
                        message: panic_message(payload.as_ref()),
                    }),
                }
            })?;
        }
        Ok(())
    }

    fn enqueue_reduce_tasks(
        &self,
        grouped: HashMap<K, Vec<V>>,
        buffers: &Arc<Mutex<JobBuffers<K, V>>>,
    ) -> Result<(), JobError> {
        for (key, values) in grouped {
            let reducer = self.reducer.clone();
            let buffers = Arc::clone(buffers);
            self.pool.enqueue(Affinity::Any, move || {
                let Some(reducer) = reducer else {
                    warn!(?key, "no reducer configured, skipping key");
                    lock(&buffers).skipped_keys += 1;
                    return;
                };
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| reducer.reduce(&key, &values)));
                let mut buffers = lock(&buffers);
                match outcome {
                    Ok(Ok(value)) => buffers.reduced.push((key, value)),
                    Ok(Err(source)) => buffers.failures.push(JobError::Reduce {
                        key: format!("{:?}", key),
                        source,
                    }),
                    Err(payload) => buffers.failures.push(JobError::TaskPanicked {
                        phase: "reduce",
                        message: panic_message(payload.as_ref()),
                    }),
                }
            })?;
        }
        Ok(())
    }

    fn advance(&mut self, to: JobPhase) {
        debug_assert!(
            self.phase.can_advance_to(to),
            "invalid job phase transition {:?} -> {:?}",
            self.phase,
            to
        );
        debug!(from = ?self.phase, to = ?to, "job phase");
        self.phase = to;
    }
}
