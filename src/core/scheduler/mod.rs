//! Polling scheduler: independent per-domain timers plus the device sampler.

mod runtime;
mod tasks;

pub use runtime::{Scheduler, SchedulerHandle, DEVICE_METRICS_INTERVAL, MIN_POLL_INTERVAL};
pub use tasks::{device_metrics_task, domain_fetch_task, initial_fetch_task, DeviceSampler};
