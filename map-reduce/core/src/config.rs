// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::thread;

/// Where a job runs, derived from the two distribution flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Single process, everything on the local pool
    Local,
    /// Distributed coordinator; not implemented
    DistributedMain,
    /// Distributed worker; runs the local pipeline then hands results off
    DistributedWorker,
}

/// Immutable job configuration, fixed for the lifetime of a job
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub is_distributed: bool,
    #[serde(default = "default_is_main")]
    pub is_main: bool,
    /// Number of worker threads in the pool built from this config
    #[serde(default = "default_thread_count")]
    pub thread_count: usize,
    /// Partition size hint handed to the partitioning strategy
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_is_main() -> bool {
    true
}

fn default_thread_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_chunk_size() -> usize {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            is_distributed: false,
            is_main: default_is_main(),
            thread_count: default_thread_count(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl Config {
    /// Local-mode config with the given pool size and chunk size
    pub fn local(thread_count: usize, chunk_size: usize) -> Self {
        Self {
            is_distributed: false,
            is_main: true,
            thread_count,
            chunk_size,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_count == 0 {
            return Err(ConfigError::Invalid(
                "thread_count must be greater than zero".to_string(),
            ));
        }
        self.validate_chunk_size()
    }

    /// The only check a job needs; its pool is sized independently
    pub fn validate_chunk_size(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn mode(&self) -> ExecutionMode {
        match (self.is_distributed, self.is_main) {
            (false, _) => ExecutionMode::Local,
            (true, true) => ExecutionMode::DistributedMain,
            (true, false) => ExecutionMode::DistributedWorker,
        }
    }
}
