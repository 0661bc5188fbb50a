use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use rasp_info::core::scheduler::{domain_fetch_task, Scheduler};
use rasp_info::core::store::{CallOutcome, SnapshotStore};
use rasp_info::core::InstrumentedFetcher;

use super::support::{transport, ScriptedFetcher, StalledFetcher};

const FIVE_MINUTES: Duration = Duration::from_secs(300);

#[tokio::test(start_paused = true)]
async fn test_ticks_retry_after_failure() {
    let store = Arc::new(SnapshotStore::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let fetcher = ScriptedFetcher::new(
        "HSL",
        store.clone(),
        vec![
            Ok(transport("tick-1")),
            Err("network error".to_string()),
            Ok(transport("tick-3")),
        ],
    )
    .with_notify(tx);
    let wrapper = Arc::new(InstrumentedFetcher::new(Box::new(fetcher), store.clone()));
    let shutdown = CancellationToken::new();

    let start = Instant::now();
    let task = tokio::spawn(domain_fetch_task(wrapper, FIVE_MINUTES, shutdown.clone()));

    for expected in 1..=3 {
        assert_eq!(rx.recv().await, Some(expected));
    }
    shutdown.cancel();
    task.await.unwrap();

    assert!(start.elapsed() >= FIVE_MINUTES * 3);
    assert_eq!(store.get().transport.stops[0].stop_name, "tick-3");

    let outcomes: Vec<CallOutcome> = store
        .get_debug_view()
        .api_calls
        .into_iter()
        .map(|c| c.outcome)
        .collect();
    assert_eq!(
        outcomes,
        vec![CallOutcome::Success, CallOutcome::Error, CallOutcome::Success]
    );
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_waits_one_interval() {
    let store = Arc::new(SnapshotStore::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let fetcher =
        ScriptedFetcher::new("HSL", store.clone(), vec![Ok(transport("a"))]).with_notify(tx);
    let wrapper = Arc::new(InstrumentedFetcher::new(Box::new(fetcher), store.clone()));
    let shutdown = CancellationToken::new();

    let start = Instant::now();
    let task = tokio::spawn(domain_fetch_task(wrapper, FIVE_MINUTES, shutdown.clone()));
    rx.recv().await.unwrap();

    assert!(start.elapsed() >= FIVE_MINUTES);
    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_cancelled_loop_exits() {
    let store = Arc::new(SnapshotStore::new());
    let fetcher = ScriptedFetcher::new("HSL", store.clone(), Vec::new());
    let wrapper = Arc::new(InstrumentedFetcher::new(Box::new(fetcher), store.clone()));
    let shutdown = CancellationToken::new();

    let hour = Duration::from_secs(3600);
    let task = tokio::spawn(domain_fetch_task(wrapper, hour, shutdown.clone()));
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("loop should exit after cancellation")
        .unwrap();
    assert!(store.get_debug_view().api_calls.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_fetches_immediately_and_samples_device() {
    let store = Arc::new(SnapshotStore::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let fetcher = ScriptedFetcher::new("HSL", store.clone(), vec![Ok(transport("boot"))])
        .with_notify(tx);

    let mut scheduler = Scheduler::new(store.clone(), CancellationToken::new());
    scheduler.add_job(
        InstrumentedFetcher::new(Box::new(fetcher), store.clone()),
        FIVE_MINUTES,
    );
    let handle = scheduler.start();
    assert_eq!(handle.task_count(), 3);

    let start = Instant::now();
    assert_eq!(rx.recv().await, Some(1));
    assert!(start.elapsed() < FIVE_MINUTES);
    assert_eq!(store.get().transport.stops[0].stop_name, "boot");

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(store.get_debug_view().device.cpu_count >= 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failing_domain_does_not_stop_other_domain() {
    let store = Arc::new(SnapshotStore::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let failing = ScriptedFetcher::new(
        "FMI",
        store.clone(),
        vec![Err("down".to_string()), Err("down".to_string())],
    );
    let healthy = ScriptedFetcher::new(
        "HSL",
        store.clone(),
        vec![Ok(transport("first")), Ok(transport("second"))],
    )
    .with_notify(tx);

    let mut scheduler = Scheduler::new(store.clone(), CancellationToken::new());
    scheduler
        .add_job(
            InstrumentedFetcher::new(Box::new(failing), store.clone()),
            FIVE_MINUTES,
        )
        .add_job(
            InstrumentedFetcher::new(Box::new(healthy), store.clone()),
            FIVE_MINUTES,
        );
    let handle = scheduler.start();

    // startup fetch, then the first tick
    assert_eq!(rx.recv().await, Some(1));
    assert_eq!(rx.recv().await, Some(2));
    handle.shutdown().await;

    assert_eq!(store.get().transport.stops[0].stop_name, "second");
    let calls = store.get_debug_view().api_calls;
    assert!(calls
        .iter()
        .any(|c| c.source == "FMI" && c.outcome == CallOutcome::Error));
}

#[tokio::test(start_paused = true)]
async fn test_zero_periods_are_raised_to_minimum() {
    let store = Arc::new(SnapshotStore::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let fetcher = ScriptedFetcher::new(
        "HSL",
        store.clone(),
        vec![Ok(transport("boot")), Ok(transport("tick"))],
    )
    .with_notify(tx);

    let mut scheduler = Scheduler::new(store.clone(), CancellationToken::new());
    scheduler.add_job(
        InstrumentedFetcher::new(Box::new(fetcher), store.clone()),
        Duration::ZERO,
    );
    let handle = scheduler.with_device_interval(Duration::ZERO).start();

    // startup fetch, then a tick one minimum period later
    for expected in 1..=2 {
        let call = tokio::time::timeout(Duration::from_secs(60), rx.recv())
            .await
            .expect("polling loop should keep ticking");
        assert_eq!(call, Some(expected));
    }
    assert_eq!(store.get().transport.stops[0].stop_name, "tick");
    assert!(store.get_debug_view().device.cpu_count >= 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_abandons_stalled_startup_fetch() {
    let store = Arc::new(SnapshotStore::new());
    let mut scheduler = Scheduler::new(store.clone(), CancellationToken::new());
    scheduler.add_job(
        InstrumentedFetcher::new(Box::new(StalledFetcher), store.clone()),
        FIVE_MINUTES,
    );
    let handle = scheduler.start();

    tokio::time::sleep(Duration::from_millis(20)).await;
    tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
        .await
        .expect("shutdown should not wait for the startup fetch");

    assert!(store.get_debug_view().api_calls.is_empty());
}
