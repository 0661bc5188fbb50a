//! Async tasks driven by the scheduler.
//!
//! Each domain runs in its own independent task with its own polling interval;
//! the device sampler runs on a fixed cadence. Every loop exits once its
//! cancellation token fires.

mod device;
mod domain;

pub use device::{device_metrics_task, DeviceSampler};
pub use domain::{domain_fetch_task, initial_fetch_task};
