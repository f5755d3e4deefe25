// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::collections::HashMap;
use std::hash::Hash;

/// Groups every emitted pair by key, preserving the order values were seen
pub fn group_by_key<K, V, I, P>(mapped: I) -> HashMap<K, Vec<V>>
where
    K: Eq + Hash,
    I: IntoIterator<Item = P>,
    P: IntoIterator<Item = (K, V)>,
{
    let mut grouped: HashMap<K, Vec<V>> = HashMap::new();
    for (key, value) in mapped.into_iter().flatten() {
        grouped.entry(key).or_default().push(value);
    }
    grouped
}
