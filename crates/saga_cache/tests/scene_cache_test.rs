//! Tests for the SceneCache implementation.

use rand::SeedableRng;
use rand::rngs::StdRng;
use saga_cache::{Always, CacheConfig, FixedProbability, Never, ReusePolicy, SceneCache, SceneKey};
use serde_json::json;
use std::time::Duration;

#[test]
fn test_cache_insert_and_get() {
    let config = CacheConfig::default().with_default_ttl(10).with_max_size(100);
    let mut cache = SceneCache::new(config);

    let key = SceneKey::new("Realm", 1, "Docks");
    cache.insert(key.clone(), json!({"description": "fog"}), None);

    let entry = cache.get(&key);
    assert!(entry.is_some());
    assert_eq!(entry.unwrap().value(), &json!({"description": "fog"}));

    assert!(cache.get(&SceneKey::new("Realm", 2, "Docks")).is_none());
}

#[test]
fn test_location_key_ignores_case() {
    let mut cache = SceneCache::new(CacheConfig::default());
    cache.insert(SceneKey::new("Realm", 1, "The Docks"), 1, None);

    assert!(cache.get(&SceneKey::new("Realm", 1, " the docks ")).is_some());
}

#[test]
fn test_cache_expiration() {
    let mut cache = SceneCache::new(CacheConfig::default());
    let key = SceneKey::new("Realm", 1, "Docks");

    cache.insert(key.clone(), "scene", Some(0));

    assert!(cache.get(&key).is_none());
    assert!(cache.is_empty());
}

#[test]
fn test_huge_ttl_never_expires() {
    let mut cache = SceneCache::new(CacheConfig::default().with_default_ttl(u64::MAX));
    let key = SceneKey::new("Realm", 1, "Docks");

    cache.insert(key.clone(), "scene", None);
    cache.insert(SceneKey::new("Realm", 1, "Gate"), "gate", Some(u64::MAX));

    assert_eq!(cache.cleanup_expired(), 0);
    assert_eq!(cache.get(&key).map(|e| *e.value()), Some("scene"));
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_cache_cleanup_expired_entries() {
    let mut cache = SceneCache::new(CacheConfig::default().with_default_ttl(1));
    cache.insert(SceneKey::new("Realm", 1, "Docks"), 1, Some(1));
    cache.insert(SceneKey::new("Realm", 1, "Market"), 2, Some(1));
    assert_eq!(cache.len(), 2);

    std::thread::sleep(Duration::from_millis(1100));

    assert_eq!(cache.cleanup_expired(), 2);
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_cache_lru_eviction() {
    let mut cache = SceneCache::new(CacheConfig::default().with_max_size(2));
    let docks = SceneKey::new("Realm", 1, "Docks");
    let market = SceneKey::new("Realm", 1, "Market");
    let keep = SceneKey::new("Realm", 1, "Keep");

    cache.insert(docks.clone(), 1, None);
    std::thread::sleep(Duration::from_millis(5));
    cache.insert(market.clone(), 2, None);
    std::thread::sleep(Duration::from_millis(5));

    // Touch docks so market becomes the least recently used
    assert!(cache.get(&docks).is_some());
    cache.insert(keep.clone(), 3, None);

    assert_eq!(cache.len(), 2);
    assert!(cache.get(&market).is_none());
    assert!(cache.get(&docks).is_some());
    assert!(cache.get(&keep).is_some());
}

#[test]
fn test_cache_clear() {
    let mut cache = SceneCache::new(CacheConfig::default());
    cache.insert(SceneKey::new("Realm", 1, "Docks"), 1, None);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_reuse_policies() {
    let mut rng = StdRng::seed_from_u64(7);

    assert!(Always.should_reuse(&mut rng));
    assert!(!Never.should_reuse(&mut rng));
    assert!(FixedProbability(1.0).should_reuse(&mut rng));
    assert!(!FixedProbability(0.0).should_reuse(&mut rng));

    let hits = (0..1000)
        .filter(|_| FixedProbability::default().should_reuse(&mut rng))
        .count();
    assert!((200..400).contains(&hits), "hits = {hits}");
}
