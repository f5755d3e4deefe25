// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::error::PoolError;
use map_reduce_core::scheduling::SchedulingPolicy;
use map_reduce_core::task::Affinity;
use map_reduce_core::thread_pool::ThreadPool;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Occupies `worker` until the returned sender is used or dropped
fn occupy_worker(pool: &ThreadPool, worker: usize) -> mpsc::Sender<()> {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel::<()>();
    pool.enqueue(Affinity::Worker(worker), move || {
        started_tx.send(()).unwrap();
        let _ = release_rx.recv();
    })
    .unwrap();
    started_rx.recv().unwrap();
    release_tx
}

#[test]
fn test_zero_threads_rejected() {
    // Act
    let result = ThreadPool::new(0);

    // Assert
    assert!(matches!(result, Err(PoolError::NoWorkers)));
}

#[test]
fn test_introspection_on_fresh_pool() {
    // Arrange
    let pool = ThreadPool::new(3).unwrap();

    // Assert
    assert_eq!(pool.thread_count(), 3);
    assert_eq!(pool.queued_tasks(), 0);
    assert_eq!(pool.in_flight_count(), 0);
    assert_eq!(pool.panicked_tasks(), 0);
    assert_eq!(pool.policy(), SchedulingPolicy::StrictHeadAffinity);
    assert!(!pool.is_stopped());
}

#[test]
fn test_enqueue_runs_every_task() {
    // Arrange
    let pool = ThreadPool::new(4).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    // Act
    for _ in 0..100 {
        let counter = Arc::clone(&counter);
        pool.enqueue(Affinity::Any, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }
    pool.wait_all();

    // Assert
    assert_eq!(counter.load(Ordering::SeqCst), 100);
}

#[test]
fn test_wait_all_on_idle_pool_returns() {
    // Arrange
    let pool = ThreadPool::new(2).unwrap();

    // Act
    pool.wait_all();

    // Assert
    assert_eq!(pool.queued_tasks(), 0);
}

#[test]
fn test_barrier_waits_for_running_tasks() {
    // Arrange
    let pool = ThreadPool::new(4).unwrap();
    let finished = Arc::new(AtomicUsize::new(0));

    // Act
    for i in 0..12 {
        let finished = Arc::clone(&finished);
        pool.enqueue(Affinity::Any, move || {
            thread::sleep(Duration::from_millis(5 * (i % 4)));
            finished.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }
    pool.wait_all();

    // Assert
    assert_eq!(finished.load(Ordering::SeqCst), 12);
    assert_eq!(pool.in_flight_count(), 0);
    assert_eq!(pool.queued_tasks(), 0);
}

#[test]
fn test_in_flight_count_tracks_running_task() {
    // Arrange
    let pool = ThreadPool::new(2).unwrap();

    // Act
    let release = occupy_worker(&pool, 1);

    // Assert
    assert_eq!(pool.in_flight_count(), 1);
    assert_eq!(pool.queued_tasks(), 0);

    release.send(()).unwrap();
    pool.wait_all();
    assert_eq!(pool.in_flight_count(), 0);
}

#[test]
fn test_pinned_tasks_run_on_their_worker() {
    // Arrange
    let pool = ThreadPool::new(4).unwrap();
    let observed = Arc::new(Mutex::new(Vec::new()));

    // Act
    for round in 0..3 {
        for worker in 0..4 {
            let observed = Arc::clone(&observed);
            pool.enqueue(Affinity::Worker(worker), move || {
                observed
                    .lock()
                    .unwrap()
                    .push((round, worker, ThreadPool::current_worker_id()));
            })
            .unwrap();
        }
    }
    pool.wait_all();

    // Assert
    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 12);
    for (_, expected, actual) in observed.iter() {
        assert_eq!(Some(*expected), *actual);
    }
}

#[test]
fn test_enqueue_to_unknown_worker_rejected() {
    // Arrange
    let pool = ThreadPool::new(2).unwrap();

    // Act
    let result = pool.enqueue(Affinity::Worker(2), || {});

    // Assert
    assert!(matches!(
        result,
        Err(PoolError::UnknownWorker {
            worker: 2,
            thread_count: 2
        })
    ));
    assert_eq!(pool.queued_tasks(), 0);
}

#[test]
fn test_head_of_line_blocking_under_strict_affinity() {
    // Arrange
    let pool = ThreadPool::new(4).unwrap();
    let release = occupy_worker(&pool, 0);
    let pinned_started = Arc::new(Mutex::new(None::<Instant>));
    let any_started = Arc::new(Mutex::new(Vec::<Instant>::new()));

    // Act
    {
        let pinned_started = Arc::clone(&pinned_started);
        pool.enqueue(Affinity::Worker(0), move || {
            *pinned_started.lock().unwrap() = Some(Instant::now());
            thread::sleep(Duration::from_millis(50));
        })
        .unwrap();
    }
    for _ in 0..10 {
        let any_started = Arc::clone(&any_started);
        pool.enqueue(Affinity::Any, move || {
            any_started.lock().unwrap().push(Instant::now());
        })
        .unwrap();
    }
    thread::sleep(Duration::from_millis(100));

    // Assert: three idle workers, yet nothing behind the pinned head started
    assert!(any_started.lock().unwrap().is_empty());
    assert_eq!(pool.queued_tasks(), 11);

    let released_at = Instant::now();
    release.send(()).unwrap();
    pool.wait_all();

    let pinned_started = pinned_started.lock().unwrap().unwrap();
    let any_started = any_started.lock().unwrap();
    assert!(pinned_started >= released_at);
    assert_eq!(any_started.len(), 10);
    assert!(any_started.iter().all(|started| *started >= released_at));
}

#[test]
fn test_unpinned_tasks_behind_taken_pinned_head_start_promptly() {
    // Arrange
    let pool = ThreadPool::new(4).unwrap();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (done_tx, done_rx) = mpsc::channel::<()>();

    // Act: worker 0 is idle, so it takes the pinned head and stays busy
    pool.enqueue(Affinity::Worker(0), move || {
        let _ = release_rx.recv();
    })
    .unwrap();
    for _ in 0..3 {
        let done_tx = done_tx.clone();
        pool.enqueue(Affinity::Any, move || {
            done_tx.send(()).unwrap();
        })
        .unwrap();
    }

    // Assert: the other workers drain the unpinned tasks while worker 0 runs
    for _ in 0..3 {
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
    assert_eq!(pool.queued_tasks(), 0);

    release_tx.send(()).unwrap();
    pool.wait_all();
}

#[test]
fn test_skip_ahead_runs_past_pinned_head() {
    // Arrange
    let pool = ThreadPool::with_policy(4, SchedulingPolicy::SkipAhead).unwrap();
    let release = occupy_worker(&pool, 0);
    let (done_tx, done_rx) = mpsc::channel::<()>();

    // Act
    pool.enqueue(Affinity::Worker(0), || {}).unwrap();
    for _ in 0..10 {
        let done_tx = done_tx.clone();
        pool.enqueue(Affinity::Any, move || {
            done_tx.send(()).unwrap();
        })
        .unwrap();
    }

    // Assert: every unpinned task completes while worker 0 is still busy
    for _ in 0..10 {
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
    assert_eq!(pool.queued_tasks(), 1);

    release.send(()).unwrap();
    pool.wait_all();
    assert_eq!(pool.queued_tasks(), 0);
}

#[test]
fn test_panicking_task_does_not_break_barrier() {
    // Arrange
    let pool = ThreadPool::new(2).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    // Act
    pool.enqueue(Affinity::Any, || panic!("task failure")).unwrap();
    for _ in 0..5 {
        let counter = Arc::clone(&counter);
        pool.enqueue(Affinity::Any, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }
    pool.wait_all();

    // Assert
    assert_eq!(pool.panicked_tasks(), 1);
    assert_eq!(pool.in_flight_count(), 0);
    assert_eq!(counter.load(Ordering::SeqCst), 5);
}

#[test]
fn test_join_drains_queued_tasks() {
    // Arrange
    let pool = ThreadPool::new(2).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..20 {
        let counter = Arc::clone(&counter);
        pool.enqueue(Affinity::Any, move || {
            thread::sleep(Duration::from_millis(1));
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    // Act
    pool.join();

    // Assert
    assert_eq!(counter.load(Ordering::SeqCst), 20);
    assert_eq!(pool.queued_tasks(), 0);
}

#[test]
fn test_join_is_idempotent() {
    // Arrange
    let pool = ThreadPool::new(3).unwrap();
    pool.enqueue(Affinity::Any, || {}).unwrap();

    // Act
    pool.join();
    pool.join();

    // Assert
    assert!(pool.is_stopped());
    assert_eq!(pool.in_flight_count(), 0);
    assert!(matches!(
        pool.enqueue(Affinity::Any, || {}),
        Err(PoolError::Stopped)
    ));
}

#[test]
fn test_concurrent_join_returns_after_workers_finish() {
    // Arrange
    let pool = Arc::new(ThreadPool::new(2).unwrap());
    let finished = Arc::new(AtomicBool::new(false));
    let (started_tx, started_rx) = mpsc::channel::<()>();
    {
        let finished = Arc::clone(&finished);
        pool.enqueue(Affinity::Any, move || {
            started_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(100));
            finished.store(true, Ordering::SeqCst);
        })
        .unwrap();
    }
    started_rx.recv().unwrap();

    // Act
    let joiners: Vec<_> = (0..3)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                pool.join();
                finished.load(Ordering::SeqCst)
            })
        })
        .collect();

    // Assert: no caller returns while the task is still running
    for joiner in joiners {
        assert!(joiner.join().unwrap());
    }
    assert!(pool.is_stopped());
    assert_eq!(pool.in_flight_count(), 0);
}

#[test]
fn test_drop_joins_workers() {
    // Arrange
    let counter = Arc::new(AtomicUsize::new(0));
    let pool = ThreadPool::new(2).unwrap();
    for _ in 0..8 {
        let counter = Arc::clone(&counter);
        pool.enqueue(Affinity::Any, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    // Act
    drop(pool);

    // Assert
    assert_eq!(counter.load(Ordering::SeqCst), 8);
}
