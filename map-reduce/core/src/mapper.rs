// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::StrategyResult;

/// Mapping strategy: turns one partition into key/value pairs
///
/// Called concurrently from pool workers, one call per partition. A returned
/// error aborts the whole job.
pub trait Mapper<K, V>: Send + Sync {
    fn map(&self, partition: &[K]) -> StrategyResult<Vec<(K, V)>>;
}
