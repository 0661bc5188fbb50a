//! Orchestrator for the polling tasks.
//!
//! Spawns one timer loop and one immediate fetch per domain plus the device
//! metrics sampler. All of them share one cancellation token.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::tasks::{device_metrics_task, domain_fetch_task, initial_fetch_task, DeviceSampler};
use crate::core::config::Config;
use crate::core::fetcher::{
    build_http_client, ElectricityFetcher, InstrumentedFetcher, TransportFetcher, WeatherFetcher,
};
use crate::core::store::SnapshotStore;
use crate::error::Result;

/// Cadence of the device metrics sampler
pub const DEVICE_METRICS_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest period accepted by the builder
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

// tokio intervals panic on a zero period
fn clamp_period(what: &str, period: Duration) -> Duration {
    if period < MIN_POLL_INTERVAL {
        log::warn!(
            "{} interval {:?} is too short, using {:?}",
            what,
            period,
            MIN_POLL_INTERVAL
        );
        MIN_POLL_INTERVAL
    } else {
        period
    }
}

struct PollJob {
    fetcher: Arc<InstrumentedFetcher>,
    interval: Duration,
}

/// Collects poll jobs and spawns them on the current tokio runtime.
pub struct Scheduler {
    store: Arc<SnapshotStore>,
    jobs: Vec<PollJob>,
    device_interval: Duration,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub fn new(store: Arc<SnapshotStore>, shutdown: CancellationToken) -> Self {
        Self {
            store,
            jobs: Vec::new(),
            device_interval: DEVICE_METRICS_INTERVAL,
            shutdown,
        }
    }

    /// Scheduler with the HSL, FMI and electricity fetchers from `config`.
    pub fn from_config(
        config: &Config,
        store: Arc<SnapshotStore>,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let client = build_http_client()?;

        let transport = TransportFetcher::new(client.clone(), config, store.clone());
        let weather = WeatherFetcher::new(client.clone(), config, store.clone());
        let electricity = ElectricityFetcher::new(client, config, store.clone());

        let mut scheduler = Self::new(store.clone(), shutdown);
        scheduler
            .add_job(
                InstrumentedFetcher::new(Box::new(transport), store.clone()),
                config.transport_interval(),
            )
            .add_job(
                InstrumentedFetcher::new(Box::new(weather), store.clone()),
                config.weather_interval(),
            )
            .add_job(
                InstrumentedFetcher::new(Box::new(electricity), store),
                config.electricity_interval(),
            );
        Ok(scheduler)
    }

    /// Register a fetcher. Periods below `MIN_POLL_INTERVAL` are raised to it.
    pub fn add_job(&mut self, fetcher: InstrumentedFetcher, interval: Duration) -> &mut Self {
        let interval = clamp_period(fetcher.name(), interval);
        self.jobs.push(PollJob {
            fetcher: Arc::new(fetcher),
            interval,
        });
        self
    }

    pub fn with_device_interval(mut self, interval: Duration) -> Self {
        self.device_interval = clamp_period("Device metrics", interval);
        self
    }

    /// Spawn every task. Must be called from within a tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let mut handles = Vec::with_capacity(self.jobs.len() * 2 + 1);

        for job in &self.jobs {
            handles.push(tokio::spawn(domain_fetch_task(
                job.fetcher.clone(),
                job.interval,
                self.shutdown.child_token(),
            )));
        }

        // Immediate fetches, racing with the timer loops
        for job in &self.jobs {
            handles.push(tokio::spawn(initial_fetch_task(
                job.fetcher.clone(),
                self.shutdown.child_token(),
            )));
        }

        handles.push(tokio::spawn(device_metrics_task(
            self.store.clone(),
            DeviceSampler::new(Instant::now()),
            self.device_interval,
            self.shutdown.child_token(),
        )));

        log::info!("Scheduler started with {} poll jobs", self.jobs.len());

        SchedulerHandle {
            handles,
            shutdown: self.shutdown,
        }
    }
}

/// Handles of the spawned tasks and the token that stops them.
pub struct SchedulerHandle {
    handles: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl SchedulerHandle {
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn task_count(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every task to finish. Loops only finish after cancellation.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                log::error!("Scheduler task failed: {}", e);
            }
        }
    }

    /// Cancel all loops and wait for them to exit.
    pub async fn shutdown(self) {
        self.cancel();
        self.join().await;
    }
}
