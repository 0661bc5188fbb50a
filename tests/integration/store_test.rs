use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use rasp_info::core::store::{
    CallOutcome, CallRecord, DomainRecord, SnapshotStore, WeatherData, WeatherPoint,
    APP_LOG_CAPACITY, CALL_HISTORY_CAPACITY,
};

use super::support::transport;

fn call_record(source: &str) -> CallRecord {
    CallRecord {
        timestamp: Utc::now(),
        duration: Duration::from_millis(5),
        source: source.to_string(),
        outcome: CallOutcome::Success,
        error: None,
    }
}

/// Weather record whose fields all derive from `n`, so a torn read is detectable
fn weather(n: u32) -> WeatherData {
    let point = WeatherPoint {
        temperature: n as f64,
        precipitation: n as f64,
        pop: n as f64,
        symbol: format!("s{}", n),
        time: None,
    };
    WeatherData {
        current: point.clone(),
        forecast: vec![point; (n % 5) as usize],
    }
}

fn is_consistent(data: &WeatherData) -> bool {
    let n = data.current.temperature;
    data.current.precipitation == n
        && data.current.pop == n
        && data.current.symbol == format!("s{}", n as u32)
        && data.forecast.len() == (n as u32 % 5) as usize
        && data.forecast.iter().all(|p| p.temperature == n)
}

#[test]
fn test_call_history_keeps_last_fifty_in_order() {
    let store = SnapshotStore::new();
    for i in 0..55 {
        store.append_call_record(call_record(&i.to_string()));
    }

    let calls = store.get_debug_view().api_calls;
    assert_eq!(calls.len(), CALL_HISTORY_CAPACITY);
    let sources: Vec<String> = calls.into_iter().map(|c| c.source).collect();
    let expected: Vec<String> = (5..55).map(|i| i.to_string()).collect();
    assert_eq!(sources, expected);
}

#[test]
fn test_app_log_keeps_last_hundred_in_order() {
    let store = SnapshotStore::new();
    for i in 0..105 {
        store.append_log_line(i.to_string());
    }

    let logs = store.get_debug_view().app_logs;
    assert_eq!(logs.len(), APP_LOG_CAPACITY);
    let messages: Vec<String> = logs.into_iter().map(|l| l.message).collect();
    let expected: Vec<String> = (5..105).map(|i| i.to_string()).collect();
    assert_eq!(messages, expected);
}

#[test]
fn test_log_timestamps_assigned_by_store() {
    let store = SnapshotStore::new();
    let before = Utc::now();
    store.append_log_line("hello");
    let after = Utc::now();

    let line = &store.get_debug_view().app_logs[0];
    assert!(line.timestamp >= before && line.timestamp <= after);
}

#[test]
fn test_get_is_idempotent() {
    let store = SnapshotStore::new();
    store.update_domain(DomainRecord::Transport(transport("Kamppi")));
    store.append_log_line("one");
    store.append_call_record(call_record("HSL"));

    assert_eq!(store.get(), store.get());
}

#[test]
fn test_snapshot_is_detached_from_store() {
    let store = SnapshotStore::new();
    store.update_domain(DomainRecord::Transport(transport("Kamppi")));

    let mut snapshot = store.get();
    snapshot.transport.stops.clear();

    assert_eq!(store.get().transport.stops.len(), 1);
}

#[test]
fn test_concurrent_updates_are_never_torn() {
    let store = Arc::new(SnapshotStore::new());
    store.update_domain(DomainRecord::Weather(weather(0)));

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    store.update_domain(DomainRecord::Weather(weather(w * 1000 + i)));
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    let snapshot = store.get();
                    assert!(is_consistent(&snapshot.weather), "torn read: {:?}", snapshot.weather);
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert!(is_consistent(&store.get().weather));
}

#[test]
fn test_concurrent_appends_respect_capacity() {
    let store = Arc::new(SnapshotStore::new());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    store.append_log_line(format!("{}-{}", t, i));
                    store.append_call_record(call_record(&t.to_string()));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let view = store.get_debug_view();
    assert_eq!(view.app_logs.len(), APP_LOG_CAPACITY);
    assert_eq!(view.api_calls.len(), CALL_HISTORY_CAPACITY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_simultaneous_domain_updates_both_land() {
    let store = Arc::new(SnapshotStore::new());

    let weather_task = {
        let store = store.clone();
        tokio::spawn(async move { store.update_domain(DomainRecord::Weather(weather(7))) })
    };
    let transport_task = {
        let store = store.clone();
        tokio::spawn(async move {
            store.update_domain(DomainRecord::Transport(transport("Pasila")))
        })
    };
    weather_task.await.unwrap();
    transport_task.await.unwrap();

    let snapshot = store.get();
    assert_eq!(snapshot.weather, weather(7));
    assert_eq!(snapshot.transport.stops[0].stop_name, "Pasila");
}
