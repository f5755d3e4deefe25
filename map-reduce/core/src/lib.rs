// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod config;
pub mod divider;
pub mod error;
pub mod hand_off;
pub mod map_reduce_job;
pub mod mapper;
pub mod phase;
pub mod reducer;
pub mod scheduling;
pub mod shuffle;
pub mod task;
pub mod thread_pool;
pub mod utils;
