// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{StrategyError, StrategyResult};
use std::marker::PhantomData;

/// Partitioning strategy: splits the job input into map partitions
///
/// Every input element must appear in exactly one returned partition.
/// Partition count and sizing are up to the implementation; `chunk_size`
/// is a hint from the job config.
pub trait Divider<K>: Send {
    fn divide(&self, input: &[K], chunk_size: usize) -> StrategyResult<Vec<Vec<K>>>;
}

/// Splits input into contiguous partitions of at most `chunk_size` elements
#[derive(Debug, Clone, Copy)]
pub struct ChunkDivider<K> {
    _phantom: PhantomData<fn() -> K>,
}

impl<K> ChunkDivider<K> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<K> Default for ChunkDivider<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Divider<K> for ChunkDivider<K>
where
    K: Clone,
{
    fn divide(&self, input: &[K], chunk_size: usize) -> StrategyResult<Vec<Vec<K>>> {
        if chunk_size == 0 {
            return Err(StrategyError::InvalidInput(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        Ok(input.chunks(chunk_size).map(<[K]>::to_vec).collect())
    }
}
