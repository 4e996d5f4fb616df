//! Background workers consuming event buses.

pub mod grant_worker;

pub use grant_worker::{GrantWorker, RetryPolicy, WorkerHandle};
