//! Job Scheduler worker-loop adapter (C8, §4.8).

mod worker_loop;

pub use worker_loop::{JobWorkerLoop, WorkerLoopConfig};
