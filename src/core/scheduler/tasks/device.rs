//! Process and runtime metrics sampler.

use std::sync::Arc;

use humansize::{format_size, BINARY};
use sysinfo::{CpuRefreshKind, Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::store::{DeviceMetrics, SnapshotStore};

/// Samples uptime, task count, memory and CPU count of this process.
pub struct DeviceSampler {
    system: System,
    pid: Option<Pid>,
    started: Instant,
    cpu_count: usize,
}

impl DeviceSampler {
    pub fn new(started: Instant) -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing()),
        );

        // Cache static values
        let cpu_count = match system.cpus().len() {
            0 => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            n => n,
        };
        let pid = sysinfo::get_current_pid().ok();

        Self {
            system,
            pid,
            started,
            cpu_count,
        }
    }

    /// Take a sample. Values that cannot be read are reported as zero.
    pub fn sample(&mut self) -> DeviceMetrics {
        let (mem_allocated_bytes, mem_reserved_bytes) = match self.pid {
            Some(pid) => {
                self.system.refresh_processes_specifics(
                    ProcessesToUpdate::Some(&[pid]),
                    true,
                    ProcessRefreshKind::nothing().with_memory(),
                );
                self.system
                    .process(pid)
                    .map(|p| (p.memory(), p.virtual_memory()))
                    .unwrap_or((0, 0))
            }
            None => (0, 0),
        };

        let task_count = tokio::runtime::Handle::try_current()
            .map(|handle| handle.metrics().num_alive_tasks())
            .unwrap_or(0);

        DeviceMetrics {
            uptime_secs: self.started.elapsed().as_secs(),
            task_count,
            mem_allocated_bytes,
            mem_reserved_bytes,
            cpu_count: self.cpu_count,
        }
    }
}

/// Task that writes a device sample into the store on every tick.
///
/// The first sample is taken immediately. Sampling has no failure path.
pub async fn device_metrics_task(
    store: Arc<SnapshotStore>,
    mut sampler: DeviceSampler,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                log::debug!("Device metrics task shutting down");
                break;
            }
            _ = ticker.tick() => {
                let sample = sampler.sample();
                log::debug!(
                    "Device sample: {} tasks, rss {}, virt {}",
                    sample.task_count,
                    format_size(sample.mem_allocated_bytes, BINARY),
                    format_size(sample.mem_reserved_bytes, BINARY)
                );
                store.update_device_metrics(sample);
            }
        }
    }
}
