// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod config;

use clap::{Parser, ValueEnum};
use config::RunnerConfig;
use map_reduce_core::divider::ChunkDivider;
use map_reduce_core::error::{ConfigError, JobError, PoolError};
use map_reduce_core::map_reduce_job::{MapReduceJob, RunStatus};
use map_reduce_core::thread_pool::ThreadPool;
use map_reduce_core::utils::{generate_matrix, generate_sentences};
use map_reduce_matrix::multiply;
use map_reduce_word_count::{WordCountMapper, WordCountReducer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = JobKind::WordCount)]
    job: JobKind,

    /// Overrides `thread_count` from the config
    #[arg(long)]
    threads: Option<usize>,

    /// Overrides `chunk_size` from the config
    #[arg(long)]
    chunk_size: Option<usize>,

    /// -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum JobKind {
    WordCount,
    Matrix,
}

#[derive(Debug, Error)]
enum RunnerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("job failed: {0}")]
    Job(#[from] JobError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "map-reduce run aborted");
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 1)
        .with_thread_names(verbose >= 2)
        .init();

    debug!("logging initialized at verbosity {}", verbose);
}

fn run(cli: &Cli) -> Result<(), RunnerError> {
    let start_time = Instant::now();

    let mut config = match &cli.config {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };
    if let Some(threads) = cli.threads {
        config.job.thread_count = threads;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.job.chunk_size = chunk_size;
    }
    config.job.validate()?;

    println!("=== MAP-REDUCE ({:?}) ===", cli.job);
    config.print_summary();

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let pool = Arc::new(ThreadPool::from_config(&config.job)?);

    let result = match cli.job {
        JobKind::WordCount => run_word_count(&config, Arc::clone(&pool), &mut rng),
        JobKind::Matrix => run_matrix(&config, Arc::clone(&pool), &mut rng),
    };

    pool.join();
    if pool.panicked_tasks() > 0 {
        error!(panicked = pool.panicked_tasks(), "worker tasks panicked");
    }
    result?;

    println!("\nTotal time: {:?}", start_time.elapsed());
    Ok(())
}

fn run_word_count(
    config: &RunnerConfig,
    pool: Arc<ThreadPool>,
    rng: &mut StdRng,
) -> Result<(), RunnerError> {
    let input = generate_sentences(
        rng,
        config.num_sentences,
        config.max_words_per_sentence,
        config.max_word_length,
    );
    info!(sentences = input.len(), "generated input");

    let mut job = MapReduceJob::new(
        config.job,
        pool,
        ChunkDivider::new(),
        WordCountMapper,
        WordCountReducer,
    )
    .with_final_sort(|a: &(String, usize), b: &(String, usize)| {
        b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))
    });

    let mut output = Vec::new();
    let report = job.run(&input, &mut output)?;
    if report.status == RunStatus::DistributedMainUnsupported {
        println!("\nDistributed main mode produced no output");
        return Ok(());
    }

    println!(
        "\n=== RESULTS: {} distinct words from {} partitions ===",
        report.reduced, report.partitions
    );
    for (word, count) in output.iter().take(config.top_words) {
        println!("{:>12} {}", word, count);
    }
    Ok(())
}

fn run_matrix(
    config: &RunnerConfig,
    pool: Arc<ThreadPool>,
    rng: &mut StdRng,
) -> Result<(), RunnerError> {
    let lhs = generate_matrix(rng, config.matrix_rows, config.matrix_inner);
    let rhs = generate_matrix(rng, config.matrix_inner, config.matrix_cols);

    let (status, product) = multiply(config.job, pool, &lhs, rhs.clone())?;
    if status == RunStatus::DistributedMainUnsupported {
        println!("\nDistributed main mode produced no output");
        return Ok(());
    }

    let mismatched = product
        .iter()
        .zip(&lhs)
        .filter(|(row, lhs_row)| **row != row_times(lhs_row, &rhs))
        .count();
    println!(
        "\n=== RESULTS: {}x{} product, {} rows differ from sequential ===",
        product.len(),
        product.first().map_or(0, Vec::len),
        mismatched
    );
    for row in product.iter().take(3) {
        println!("{:?}", row);
    }
    Ok(())
}

fn row_times(row: &[f64], rhs: &[Vec<f64>]) -> Vec<f64> {
    let columns = rhs.first().map_or(0, Vec::len);
    (0..columns)
        .map(|j| row.iter().zip(rhs).map(|(a, rhs_row)| a * rhs_row[j]).sum())
        .collect()
}
