// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::divider::Divider;
use map_reduce_core::error::StrategyResult;
use map_reduce_core::mapper::Mapper;
use map_reduce_core::reducer::Reducer;

/// Word counting: maps text lines to `(word, 1)` and sums per word
///
/// Words are maximal runs of ASCII letters; everything else separates them.
/// Matching is case-sensitive.
pub struct WordCountMapper;

impl Mapper<String, usize> for WordCountMapper {
    fn map(&self, partition: &[String]) -> StrategyResult<Vec<(String, usize)>> {
        Ok(partition
            .iter()
            .flat_map(|line| tokenize(line))
            .map(|word| (word.to_string(), 1))
            .collect())
    }
}

pub struct WordCountReducer;

impl Reducer<String, usize> for WordCountReducer {
    fn reduce(&self, _key: &String, values: &[usize]) -> StrategyResult<usize> {
        Ok(values.iter().sum())
    }
}

/// Puts the whole input into one partition, ignoring the chunk size
pub struct WordDivider;

impl Divider<String> for WordDivider {
    fn divide(&self, input: &[String], _chunk_size: usize) -> StrategyResult<Vec<Vec<String>>> {
        Ok(vec![input.to_vec()])
    }
}

/// Splits a line into maximal runs of ASCII letters
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|word| !word.is_empty())
}
