// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::config::Config;
use map_reduce_core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Job config plus the sizes of the generated demo data
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    #[serde(flatten)]
    pub job: Config,
    #[serde(default = "default_num_sentences")]
    pub num_sentences: usize,
    #[serde(default = "default_max_words")]
    pub max_words_per_sentence: usize,
    #[serde(default = "default_max_word_length")]
    pub max_word_length: usize,
    /// Words printed after a word count run
    #[serde(default = "default_top_words")]
    pub top_words: usize,
    /// `A` is `matrix_rows x matrix_inner`, `B` is `matrix_inner x matrix_cols`
    #[serde(default = "default_matrix_rows")]
    pub matrix_rows: usize,
    #[serde(default = "default_matrix_inner")]
    pub matrix_inner: usize,
    #[serde(default = "default_matrix_cols")]
    pub matrix_cols: usize,
    /// Fixed RNG seed; fresh entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_num_sentences() -> usize {
    10_000
}

fn default_max_words() -> usize {
    12
}

fn default_max_word_length() -> usize {
    6
}

fn default_top_words() -> usize {
    10
}

fn default_matrix_rows() -> usize {
    64
}

fn default_matrix_inner() -> usize {
    32
}

fn default_matrix_cols() -> usize {
    16
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            job: Config::default(),
            num_sentences: default_num_sentences(),
            max_words_per_sentence: default_max_words(),
            max_word_length: default_max_word_length(),
            top_words: default_top_words(),
            matrix_rows: default_matrix_rows(),
            matrix_inner: default_matrix_inner(),
            matrix_cols: default_matrix_cols(),
            seed: None,
        }
    }
}

impl RunnerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: RunnerConfig = serde_json::from_str(&contents)?;
        config.job.validate()?;
        Ok(config)
    }

    pub fn print_summary(&self) {
        println!("Configuration:");
        println!("  Mode: {:?}", self.job.mode());
        println!("  Worker threads: {}", self.job.thread_count);
        println!("  Chunk size: {}", self.job.chunk_size);
        println!(
            "  Sentences: {} (up to {} words of up to {} letters)",
            self.num_sentences, self.max_words_per_sentence, self.max_word_length
        );
        println!(
            "  Matrices: {}x{} * {}x{}",
            self.matrix_rows, self.matrix_inner, self.matrix_inner, self.matrix_cols
        );
    }
}
