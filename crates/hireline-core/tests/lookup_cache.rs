//! Integration tests for the lookup cache: coalescing, failure handling,
//! and composite-key isolation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use hireline_core::{LookupCache, LookupCategory, LookupKey};
use hireline_test_utils::{city_options, init_test_logging, state_options, ScriptedLookups};

#[tokio::test]
async fn concurrent_gets_for_one_key_issue_a_single_fetch() {
    init_test_logging();
    let fetcher = Arc::new(ScriptedLookups::new());
    fetcher.seed(LookupCategory::States, None, state_options());
    fetcher.hold(LookupCategory::States, None);

    let cache = Arc::new(LookupCache::new(fetcher.clone()));
    let key = LookupKey::plain(LookupCategory::States);

    let mut handles = Vec::new();
    for _ in 0..3 {
        let cache = Arc::clone(&cache);
        let key = key.clone();
        handles.push(tokio::spawn(async move { cache.get(&key).await }));
    }

    // Let all three getters reach the in-flight fetch.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(fetcher.fetches(LookupCategory::States, None), 1);

    fetcher.release(LookupCategory::States, None);
    for handle in handles {
        let options = handle.await.expect("task panicked");
        assert_eq!(options.len(), 3);
    }
    assert_eq!(fetcher.fetches(LookupCategory::States, None), 1);

    // A later get is served from cache.
    let options = cache.get(&key).await;
    assert_eq!(options.len(), 3);
    assert_eq!(fetcher.fetches(LookupCategory::States, None), 1);
}

#[tokio::test]
async fn failed_fetch_serves_empty_and_does_not_retry_until_invalidated() {
    init_test_logging();
    let fetcher = Arc::new(ScriptedLookups::new());
    fetcher.fail(LookupCategory::Qualifications, None, "backend down");

    let notified = Arc::new(AtomicU32::new(0));
    let sink_notified = Arc::clone(&notified);
    let cache = LookupCache::new(fetcher.clone()).with_error_sink(Arc::new(move |_, _| {
        sink_notified.fetch_add(1, Ordering::SeqCst);
    }));

    let key = LookupKey::plain(LookupCategory::Qualifications);
    assert!(cache.get(&key).await.is_empty());
    assert_eq!(notified.load(Ordering::SeqCst), 1);

    // Repeated gets serve the failed entry without new network calls.
    assert!(cache.get(&key).await.is_empty());
    assert!(cache.get(&key).await.is_empty());
    assert_eq!(fetcher.fetches(LookupCategory::Qualifications, None), 1);
    assert_eq!(notified.load(Ordering::SeqCst), 1);

    // Manual refresh makes the category retryable.
    fetcher.heal(LookupCategory::Qualifications, None);
    fetcher.seed(
        LookupCategory::Qualifications,
        None,
        vec![hireline_core::LookupOption::plain("Graduate")],
    );
    cache.invalidate(LookupCategory::Qualifications).await;
    let options = cache.get(&key).await;
    assert_eq!(options.len(), 1);
    assert_eq!(fetcher.fetches(LookupCategory::Qualifications, None), 2);
}

#[tokio::test]
async fn invalidate_during_fetch_is_not_overwritten_by_its_result() {
    init_test_logging();
    let fetcher = Arc::new(ScriptedLookups::new());
    fetcher.seed(LookupCategory::States, None, state_options());
    fetcher.hold(LookupCategory::States, None);

    let cache = Arc::new(LookupCache::new(fetcher.clone()));
    let key = LookupKey::plain(LookupCategory::States);

    let getter = {
        let cache = Arc::clone(&cache);
        let key = key.clone();
        tokio::spawn(async move { cache.get(&key).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(fetcher.fetches(LookupCategory::States, None), 1);

    // Manual refresh lands while the first fetch is still in flight.
    cache.invalidate(LookupCategory::States).await;
    fetcher.release(LookupCategory::States, None);

    // The initiating caller still gets its answer.
    let options = getter.await.expect("task panicked");
    assert_eq!(options.len(), 3);

    // But the superseded result was not committed: the next get issues a
    // fresh fetch instead of serving the pre-invalidate entry.
    assert_eq!(cache.settled_len().await, 0);
    let options = cache.get(&key).await;
    assert_eq!(options.len(), 3);
    assert_eq!(fetcher.fetches(LookupCategory::States, None), 2);
}

#[tokio::test]
async fn entries_for_different_parents_never_mix() {
    let fetcher = Arc::new(ScriptedLookups::new());
    fetcher.seed(LookupCategory::Cities, Some("MP"), city_options("MP"));
    fetcher.seed(LookupCategory::Cities, Some("MH"), city_options("MH"));

    let cache = LookupCache::new(fetcher.clone());

    let mp = cache
        .get(&LookupKey::scoped(LookupCategory::Cities, "MP"))
        .await;
    let mh = cache
        .get(&LookupKey::scoped(LookupCategory::Cities, "MH"))
        .await;

    assert!(mp.iter().any(|o| o.value == "Indore"));
    assert!(mp.iter().all(|o| o.value != "Mumbai"));
    assert!(mh.iter().any(|o| o.value == "Mumbai"));
    assert_eq!(fetcher.fetches(LookupCategory::Cities, Some("MP")), 1);
    assert_eq!(fetcher.fetches(LookupCategory::Cities, Some("MH")), 1);
}

#[tokio::test]
async fn invalidate_scopes_to_the_category() {
    let fetcher = Arc::new(ScriptedLookups::new());
    fetcher.seed(LookupCategory::States, None, state_options());
    fetcher.seed(LookupCategory::Cities, Some("MP"), city_options("MP"));

    let cache = LookupCache::new(fetcher.clone());
    let states = LookupKey::plain(LookupCategory::States);
    let cities = LookupKey::scoped(LookupCategory::Cities, "MP");

    let _ = cache.get(&states).await;
    let _ = cache.get(&cities).await;
    assert_eq!(cache.settled_len().await, 2);

    cache.invalidate(LookupCategory::Cities).await;
    assert_eq!(cache.settled_len().await, 1);

    let _ = cache.get(&states).await;
    assert_eq!(fetcher.fetches(LookupCategory::States, None), 1);
    let _ = cache.get(&cities).await;
    assert_eq!(fetcher.fetches(LookupCategory::Cities, Some("MP")), 2);
}
