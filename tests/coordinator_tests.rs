//! Integration Tests for the Request Coordinator
//!
//! Exercises caching, expiry and de-duplication through the public API,
//! with tokio's paused clock standing in for real time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{join_all, BoxFuture, FutureExt};
use salesboard::{FetchError, RequestCoordinator};
use serde_json::{json, Value};
use tokio::time::{advance, sleep};

// == Helper Functions ==

type Fetcher<V> = Box<dyn FnOnce() -> BoxFuture<'static, Result<V, FetchError>> + Send>;

/// Fetcher that counts its invocations and answers `value` after `delay`.
fn fetcher<V>(calls: &Arc<AtomicUsize>, value: V, delay: Duration) -> Fetcher<V>
where
    V: Send + 'static,
{
    let calls = Arc::clone(calls);
    Box::new(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            sleep(delay).await;
            Ok(value)
        }
        .boxed()
    })
}

/// Fetcher that counts its invocations and fails after `delay`.
fn failing<V>(calls: &Arc<AtomicUsize>, err: FetchError, delay: Duration) -> Fetcher<V>
where
    V: Send + 'static,
{
    let calls = Arc::clone(calls);
    Box::new(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            sleep(delay).await;
            Err(err)
        }
        .boxed()
    })
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

// == Caching ==

#[tokio::test(start_paused = true)]
async fn test_cache_hit_avoids_fetch() {
    let coordinator = RequestCoordinator::create();
    let (first_calls, second_calls) = (counter(), counter());

    let first = coordinator
        .resolve("k", fetcher(&first_calls, 1u32, Duration::ZERO), None)
        .await;
    let second = coordinator
        .resolve("k", fetcher(&second_calls, 2u32, Duration::ZERO), None)
        .await;

    assert_eq!(first, Ok(1));
    assert_eq!(second, Ok(1));
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ttl_expiry_triggers_fetch() {
    let coordinator = RequestCoordinator::create();
    let ttl = Duration::from_secs(15 * 60);
    let (first_calls, second_calls) = (counter(), counter());

    coordinator
        .resolve("k", fetcher(&first_calls, 1u32, Duration::ZERO), Some(ttl))
        .await
        .unwrap();

    advance(ttl - Duration::from_millis(1)).await;
    let still_cached = coordinator
        .resolve("k", fetcher(&second_calls, 2u32, Duration::ZERO), Some(ttl))
        .await;
    assert_eq!(still_cached, Ok(1));
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);

    advance(Duration::from_millis(2)).await;
    let refreshed = coordinator
        .resolve("k", fetcher(&second_calls, 2u32, Duration::ZERO), Some(ttl))
        .await;
    assert_eq!(refreshed, Ok(2));
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_default_ttl_is_twenty_minutes() {
    let coordinator = RequestCoordinator::create();
    let calls = counter();

    coordinator
        .resolve("k", fetcher(&calls, 1u32, Duration::ZERO), None)
        .await
        .unwrap();

    advance(Duration::from_secs(19 * 60)).await;
    coordinator
        .resolve("k", fetcher(&calls, 2u32, Duration::ZERO), None)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    advance(Duration::from_secs(60)).await;
    let value = coordinator
        .resolve("k", fetcher(&calls, 2u32, Duration::ZERO), None)
        .await;
    assert_eq!(value, Ok(2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_clear_invalidates() {
    let coordinator = RequestCoordinator::create();
    let calls = counter();

    coordinator
        .resolve("k", fetcher(&calls, 1u32, Duration::ZERO), None)
        .await
        .unwrap();
    coordinator.clear(Some("k"));

    let value = coordinator
        .resolve("k", fetcher(&calls, 2u32, Duration::ZERO), None)
        .await;

    assert_eq!(value, Ok(2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// == De-duplication ==

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_share_one_fetch() {
    let coordinator: RequestCoordinator<Value> = RequestCoordinator::create();
    let calls = counter();

    let callers = (0..3).map(|_| {
        coordinator.resolve(
            "hours:2025-09-13",
            fetcher(&calls, json!({"total": 500}), Duration::from_millis(50)),
            None,
        )
    });
    let results = join_all(callers).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for result in results {
        assert_eq!(result, Ok(json!({"total": 500})));
    }

    let stats = coordinator.stats();
    assert_eq!(stats.fetches, 1);
    assert_eq!(stats.joins, 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_share_one_failure() {
    let coordinator: RequestCoordinator<u32> = RequestCoordinator::create();
    let calls = counter();
    let timeout = FetchError::network("timeout");

    let callers = (0..4).map(|_| {
        coordinator.resolve(
            "day:X",
            failing(&calls, timeout.clone(), Duration::from_millis(20)),
            None,
        )
    });
    let results = join_all(callers).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| r == &Err(timeout.clone())));
}

#[tokio::test(start_paused = true)]
async fn test_spawned_callers_share_one_fetch() {
    let coordinator: RequestCoordinator<u32> = RequestCoordinator::create();
    let calls = counter();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let coordinator = coordinator.clone();
            let fetch = fetcher(&calls, i, Duration::from_millis(10));
            tokio::spawn(async move { coordinator.resolve("shared", fetch, None).await })
        })
        .collect();

    let mut values = Vec::new();
    for handle in handles {
        values.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(values.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_independent_keys_fetch_independently() {
    let coordinator = RequestCoordinator::create();
    let (calls_a, calls_b) = (counter(), counter());

    let (a, b) = tokio::join!(
        coordinator.resolve("k1", fetcher(&calls_a, 1u32, Duration::from_millis(30)), None),
        coordinator.resolve("k2", fetcher(&calls_b, 2u32, Duration::from_millis(30)), None),
    );

    assert_eq!(a, Ok(1));
    assert_eq!(b, Ok(2));
    assert_eq!(calls_a.load(Ordering::SeqCst), 1);
    assert_eq!(calls_b.load(Ordering::SeqCst), 1);
    assert_eq!(coordinator.size(), 2);
}

// == Failure Handling ==

#[tokio::test(start_paused = true)]
async fn test_failure_does_not_poison_cache() {
    let coordinator = RequestCoordinator::create();
    let (fail_calls, ok_calls) = (counter(), counter());

    let failed = coordinator
        .resolve(
            "day:X",
            failing(&fail_calls, FetchError::network("timeout"), Duration::ZERO),
            None,
        )
        .await;
    assert_eq!(failed, Err(FetchError::network("timeout")));

    let recovered = coordinator
        .resolve("day:X", fetcher(&ok_calls, 42u32, Duration::ZERO), None)
        .await;
    assert_eq!(recovered, Ok(42));
    assert_eq!(ok_calls.load(Ordering::SeqCst), 1);

    // And the recovered value is now cached
    let cached = coordinator
        .resolve("day:X", fetcher(&ok_calls, 43u32, Duration::ZERO), None)
        .await;
    assert_eq!(cached, Ok(42));
    assert_eq!(ok_calls.load(Ordering::SeqCst), 1);
}

// == Cancellation ==

#[tokio::test(start_paused = true)]
async fn test_abandoned_caller_still_fills_cache() {
    let coordinator = RequestCoordinator::create();
    let calls = counter();

    let abandoned = tokio::spawn({
        let coordinator = coordinator.clone();
        let fetch = fetcher(&calls, 7u32, Duration::from_millis(100));
        async move { coordinator.resolve("k", fetch, None).await }
    });
    sleep(Duration::from_millis(10)).await;
    abandoned.abort();

    sleep(Duration::from_millis(200)).await;

    assert!(coordinator.in_flight().is_empty());
    let value = coordinator
        .resolve("k", fetcher(&calls, 8u32, Duration::ZERO), None)
        .await;
    assert_eq!(value, Ok(7));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_one_caller_leaving_does_not_affect_others() {
    let coordinator = RequestCoordinator::create();
    let calls = counter();

    let leaving = tokio::spawn({
        let coordinator = coordinator.clone();
        let fetch = fetcher(&calls, 5u32, Duration::from_millis(100));
        async move { coordinator.resolve("k", fetch, None).await }
    });
    sleep(Duration::from_millis(10)).await;

    let staying = tokio::spawn({
        let coordinator = coordinator.clone();
        let fetch = fetcher(&calls, 6u32, Duration::from_millis(100));
        async move { coordinator.resolve("k", fetch, None).await }
    });
    sleep(Duration::from_millis(10)).await;
    leaving.abort();

    assert_eq!(staying.await.unwrap(), Ok(5));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
