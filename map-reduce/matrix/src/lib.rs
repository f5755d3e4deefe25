// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Dense matrix multiplication `A x B` as a map-reduce job.
//!
//! Each input element is one row of `A` tagged with its row index. Mappers
//! multiply their rows by `B`, keyed by row index; the reducer passes the
//! single product row through. Output order is restored with
//! [`by_row_index`] as the job's final sort.

use map_reduce_core::config::Config;
use map_reduce_core::divider::ChunkDivider;
use map_reduce_core::error::{JobError, StrategyError, StrategyResult};
use map_reduce_core::map_reduce_job::{MapReduceJob, RunStatus};
use map_reduce_core::mapper::Mapper;
use map_reduce_core::reducer::Reducer;
use map_reduce_core::thread_pool::ThreadPool;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub type Matrix = Vec<Vec<f64>>;

/// A matrix row tagged with its index in the source matrix
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    pub index: usize,
    pub values: Vec<f64>,
}

// rows compare by bit pattern so they can be used as keys
impl Eq for MatrixRow {}

impl Hash for MatrixRow {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        for value in &self.values {
            value.to_bits().hash(state);
        }
    }
}

impl MatrixRow {
    /// Key used for a product row: the row index with no values
    pub fn key(index: usize) -> Self {
        Self {
            index,
            values: Vec::new(),
        }
    }
}

pub fn indexed_rows(matrix: &[Vec<f64>]) -> Vec<MatrixRow> {
    matrix
        .iter()
        .enumerate()
        .map(|(index, values)| MatrixRow {
            index,
            values: values.clone(),
        })
        .collect()
}

fn check_width(rows: &[Vec<f64>], expected: usize, context: &str) -> StrategyResult<()> {
    match rows.iter().find(|row| row.len() != expected) {
        Some(row) => Err(StrategyError::DimensionMismatch {
            context: context.to_string(),
            expected,
            actual: row.len(),
        }),
        None => Ok(()),
    }
}

/// Multiplies rows of `A` by a fixed right-hand matrix `B`
pub struct MatrixMapper {
    rhs: Matrix,
}

impl MatrixMapper {
    pub fn new(rhs: Matrix) -> Self {
        Self { rhs }
    }

    fn rhs_columns(&self) -> StrategyResult<usize> {
        let columns = self.rhs.first().map_or(0, Vec::len);
        check_width(&self.rhs, columns, "row width of matrix B")?;
        Ok(columns)
    }
}

impl Mapper<MatrixRow, MatrixRow> for MatrixMapper {
    fn map(&self, partition: &[MatrixRow]) -> StrategyResult<Vec<(MatrixRow, MatrixRow)>> {
        let Some(first) = partition.first() else {
            return Ok(Vec::new());
        };
        let width = first.values.len();
        for row in partition {
            if row.values.len() != width {
                return Err(StrategyError::DimensionMismatch {
                    context: "row width of matrix A".to_string(),
                    expected: width,
                    actual: row.values.len(),
                });
            }
        }
        let columns = self.rhs_columns()?;
        if width != self.rhs.len() {
            return Err(StrategyError::DimensionMismatch {
                context: "columns of A against rows of B".to_string(),
                expected: self.rhs.len(),
                actual: width,
            });
        }

        Ok(partition
            .iter()
            .map(|row| {
                let product = (0..columns)
                    .map(|j| {
                        row.values
                            .iter()
                            .zip(&self.rhs)
                            .map(|(a, rhs_row)| a * rhs_row[j])
                            .sum()
                    })
                    .collect();
                (
                    MatrixRow::key(row.index),
                    MatrixRow {
                        index: row.index,
                        values: product,
                    },
                )
            })
            .collect())
    }
}

/// Passes the single product row for a key through
pub struct MatrixReducer;

impl Reducer<MatrixRow, MatrixRow> for MatrixReducer {
    fn reduce(&self, key: &MatrixRow, values: &[MatrixRow]) -> StrategyResult<MatrixRow> {
        match values {
            [row] => Ok(row.clone()),
            _ => Err(StrategyError::InvalidInput(format!(
                "row {} produced {} product rows, expected exactly one",
                key.index,
                values.len()
            ))),
        }
    }
}

/// Final-sort comparator restoring row order
pub fn by_row_index(a: &(MatrixRow, MatrixRow), b: &(MatrixRow, MatrixRow)) -> Ordering {
    a.1.index.cmp(&b.1.index)
}

/// Computes `lhs x rhs` on `pool`, `config.chunk_size` rows per map task.
///
/// The product is only meaningful when the status is
/// [`RunStatus::Completed`]; distributed main mode yields an empty matrix.
pub fn multiply(
    config: Config,
    pool: Arc<ThreadPool>,
    lhs: &[Vec<f64>],
    rhs: Matrix,
) -> Result<(RunStatus, Matrix), JobError> {
    let mut job = MapReduceJob::new(
        config,
        pool,
        ChunkDivider::new(),
        MatrixMapper::new(rhs),
        MatrixReducer,
    )
    .with_final_sort(by_row_index);

    let mut output = Vec::new();
    let report = job.run(&indexed_rows(lhs), &mut output)?;
    let product = output.into_iter().map(|(_, row)| row.values).collect();
    Ok((report.status, product))
}
