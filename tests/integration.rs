//! Integration tests for the cache library.
//!
//! Timer-driven behaviour runs on tokio's paused clock, so sleeps advance
//! virtual time deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use adaptive_ttl_cache::{Cache, CacheConfig, CacheError, EntryState, Notify};
use tokio::time::sleep;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// 100ms default TTL, 50% margin, 50ms inactive grace: inactive at ~150ms,
/// evicted at ~200ms.
fn short_config() -> CacheConfig {
    CacheConfig::new()
        .default_ttl(ms(100))
        .grace_margin(0.5)
        .inactive_grace(ms(50))
}

fn with_counter(config: CacheConfig) -> (CacheConfig, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let config = config.on_mutation(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (config, calls)
}

#[tokio::test(start_paused = true)]
async fn test_basic_workflow() {
    let cache = Cache::new(CacheConfig::default()).unwrap();

    assert!(cache.is_empty().await);

    assert!(cache.set("key1".to_string(), "value1").await);
    assert!(!cache.set("key1".to_string(), "value1").await);
    assert_eq!(cache.len().await, 1);
    assert_eq!(cache.get("key1").await, Some("value1"));
    assert!(cache.contains("key1").await);
    assert!(!cache.contains("nonexistent").await);

    assert_eq!(cache.delete("key1").await, Some("value1"));
    assert!(!cache.contains("key1").await);
    assert_eq!(cache.delete("key1").await, None);

    cache.set("a".to_string(), "1").await;
    cache.set("b".to_string(), "2").await;
    cache.clear().await;
    assert!(cache.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_single_timer_per_key() {
    let cache = Cache::new(short_config()).unwrap();

    for round in 0..3 {
        cache.set("a", round).await;
        cache.set("b", round).await;
        cache.set("a", round + 10).await;
        assert_eq!(cache.pending_timers().await, 2);
    }

    cache.mark_inactive("a").await.unwrap();
    assert_eq!(cache.pending_timers().await, 2);
    assert!(cache.has_pending_timer("a").await);

    cache.delete("b").await;
    assert!(!cache.has_pending_timer("b").await);
    assert_eq!(cache.pending_timers().await, 1);

    // Every pending timer belongs to a live key.
    assert!(cache.pending_timers().await <= cache.len().await);
}

#[tokio::test(start_paused = true)]
async fn test_adaptive_ttl_converges() {
    let cache = Cache::new(CacheConfig::default()).unwrap();

    for i in 0..5 {
        if i > 0 {
            sleep(ms(200)).await;
        }
        cache.set("tick", i).await;
    }

    let entry = cache.get_entry("tick").await.unwrap();
    let ttl = entry.ttl().expect("estimate after repeated writes");
    let diff = (ttl.as_secs_f64() - 0.2).abs();
    assert!(diff < 0.02, "estimate {:?} not near 200ms", ttl);
    assert_eq!(entry.hit_count(), 5);
    assert_eq!(entry.state(), EntryState::Active);
}

#[tokio::test(start_paused = true)]
async fn test_adaptive_ttl_tracks_mean_of_varying_intervals() {
    let cache = Cache::new(CacheConfig::default()).unwrap();

    cache.set("k", ()).await;
    sleep(ms(100)).await;
    cache.set("k", ()).await;
    let seeded = cache.get_entry("k").await.unwrap().ttl().unwrap();
    assert!((seeded.as_secs_f64() - 0.1).abs() < 0.005, "got {:?}", seeded);

    sleep(ms(400)).await;
    cache.set("k", ()).await;
    // 100 - 100/3 + 400/3 = 200
    let ttl = cache.get_entry("k").await.unwrap().ttl().unwrap();
    assert!((ttl.as_secs_f64() - 0.2).abs() < 0.005, "got {:?}", ttl);
}

#[tokio::test(start_paused = true)]
async fn test_estimate_drives_deadline() {
    let (config, calls) = with_counter(CacheConfig::default());
    let cache = Cache::new(config).unwrap();

    cache.set("k", 1).await;
    sleep(ms(100)).await;
    cache.set("k", 2).await;
    // Deadline of that write still used the 10s default.
    sleep(ms(100)).await;
    cache.set("k", 3).await;
    // Now the estimate is 100ms, so the key goes inactive after ~150ms.
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    sleep(ms(140)).await;
    assert_eq!(cache.get_entry("k").await.unwrap().state(), EntryState::Active);

    sleep(ms(20)).await;
    assert_eq!(cache.get_entry("k").await.unwrap().state(), EntryState::Inactive);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_notification_dedup() {
    let (config, calls) = with_counter(CacheConfig::default());
    let cache = Cache::new(config).unwrap();

    cache.set("k", "v1").await;
    cache.set("k", "v2").await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    cache.set_with("k", "v3", Notify::from_flags(true, true)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    cache.set_with("fresh", "v", Notify::from_flags(false, false)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_two_phase_expiry() {
    let (config, calls) = with_counter(short_config());
    let cache = Cache::new(config).unwrap();

    cache.set("k", "v").await;
    assert_eq!(cache.get_entry("k").await.unwrap().state(), EntryState::Active);

    sleep(ms(140)).await;
    assert_eq!(cache.get_entry("k").await.unwrap().state(), EntryState::Active);

    sleep(ms(20)).await;
    let entry = cache.get_entry("k").await.unwrap();
    assert_eq!(entry.state(), EntryState::Inactive);
    assert_eq!(cache.get("k").await, Some("v"));
    assert!(cache.contains("k").await);

    sleep(ms(50)).await;
    assert_eq!(cache.get("k").await, None);
    assert!(!cache.contains("k").await);
    assert_eq!(cache.pending_timers().await, 0);

    // insert, inactive, evict
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let stats = cache.stats();
    assert_eq!(stats.inactivations, 1);
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.size, 0);
}

#[tokio::test(start_paused = true)]
async fn test_fixed_ttl_mode_expires_on_default() {
    let cache = Cache::new(short_config().adaptive_ttl(false)).unwrap();

    cache.set("k", 1).await;
    sleep(ms(20)).await;
    cache.set("k", 2).await;
    sleep(ms(20)).await;
    cache.set("k", 3).await;

    // Frequent writes do not shorten the TTL.
    sleep(ms(140)).await;
    assert_eq!(cache.get_entry("k").await.unwrap().state(), EntryState::Active);
    sleep(ms(20)).await;
    assert_eq!(cache.get_entry("k").await.unwrap().state(), EntryState::Inactive);
    assert!(cache.get_entry("k").await.unwrap().ttl().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_resurrection_cancels_eviction() {
    let cache = Cache::new(short_config()).unwrap();

    cache.set("k", 1).await;
    sleep(ms(160)).await;
    assert_eq!(cache.get_entry("k").await.unwrap().state(), EntryState::Inactive);

    cache.set("k", 2).await;
    let entry = cache.get_entry("k").await.unwrap();
    assert_eq!(entry.state(), EntryState::Active);
    assert_eq!(entry.hit_count(), 2);
    assert_eq!(cache.pending_timers().await, 1);

    // Past the point where the old eviction timer would have fired.
    sleep(ms(90)).await;
    assert_eq!(cache.get("k").await, Some(2));
    assert_eq!(cache.get_entry("k").await.unwrap().state(), EntryState::Active);
    assert_eq!(cache.stats().resurrections, 1);
    assert_eq!(cache.stats().evictions, 0);
}

#[tokio::test(start_paused = true)]
async fn test_manual_mark_inactive() {
    let (config, calls) = with_counter(short_config());
    let cache = Cache::new(config).unwrap();

    cache.set_with("k", 1, Notify::Never).await;
    cache.mark_inactive_with("k", false).await.unwrap();
    assert_eq!(cache.get_entry("k").await.unwrap().state(), EntryState::Inactive);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    sleep(ms(55)).await;
    assert!(!cache.contains("k").await);
    // The eviction itself notifies.
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let err = cache.mark_inactive("k").await.unwrap_err();
    assert!(matches!(err, CacheError::KeyNotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn test_delete_is_idempotent() {
    let (config, calls) = with_counter(short_config());
    let cache = Cache::new(config).unwrap();

    assert!(cache.delete_entry("nope", false).await.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    cache.set_with("k", 5, Notify::Never).await;
    assert_eq!(cache.delete("k").await, Some(5));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The deleted key's timer never fires.
    sleep(ms(300)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_clear_cancels_all_timers() {
    let (config, calls) = with_counter(short_config());
    let cache = Cache::new(config).unwrap();

    for i in 0..10 {
        cache.set(format!("key_{}", i), i).await;
    }
    cache.mark_inactive("key_0").await.unwrap();
    let before = calls.load(Ordering::SeqCst);
    assert_eq!(before, 11);

    cache.clear().await;
    assert!(cache.list().await.is_empty());
    assert_eq!(cache.pending_timers().await, 0);

    // Longer than any deadline plus two inactive grace periods.
    sleep(ms(150 + 2 * 50 + 50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), before);

    cache.clear_with(true).await;
    assert_eq!(calls.load(Ordering::SeqCst), before + 1);
}

#[tokio::test(start_paused = true)]
async fn test_mutation_channel_observer_can_reread() {
    let (config, mut notices) = short_config().mutation_channel();
    let cache = Cache::new(config).unwrap();

    let observer = cache.clone();
    let seen = tokio::spawn(async move {
        let mut sizes = Vec::new();
        while notices.recv().await.is_some() {
            sizes.push(observer.len().await);
            if sizes.len() == 3 {
                break;
            }
        }
        sizes
    });

    cache.set("k", 1).await;
    sleep(ms(210)).await;

    let sizes = seen.await.unwrap();
    // insert, inactive (still present), evicted
    assert_eq!(sizes, vec![1, 1, 0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_settle() {
    let config = CacheConfig::new()
        .default_ttl(ms(5))
        .inactive_grace(ms(5));
    let cache = Cache::new(config).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = cache.clone();
            tokio::spawn(async move {
                for i in 0..200 {
                    let key = format!("key_{}", i % 16);
                    match (t + i) % 5 {
                        0 => {
                            cache.delete(key.as_str()).await;
                        }
                        1 => {
                            let _ = cache.mark_inactive(key.as_str()).await;
                        }
                        _ => {
                            cache.set(key, i).await;
                        }
                    }
                    if i % 20 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("writer panicked");
    }

    assert!(cache.pending_timers().await <= cache.len().await);

    sleep(ms(500)).await;
    assert!(cache.is_empty().await);
    assert_eq!(cache.pending_timers().await, 0);
}
