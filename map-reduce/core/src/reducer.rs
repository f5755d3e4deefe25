// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::StrategyResult;

/// Reduction strategy: folds every value emitted for one key
///
/// `values` is never empty when called by the job. Value order follows map
/// task completion order, not input order.
pub trait Reducer<K, V>: Send + Sync {
    fn reduce(&self, key: &K, values: &[V]) -> StrategyResult<V>;
}
