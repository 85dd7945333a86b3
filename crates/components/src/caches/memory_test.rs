//! Tests for the memory cache

use super::*;

fn value(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

#[tokio::test]
async fn set_get_delete() {
    let mut cache = MemoryCache::new(MemoryCacheConfig::default());

    assert_eq!(cache.get("k").await.unwrap(), None);

    cache.set("k", value("v1")).await.unwrap();
    assert_eq!(cache.get("k").await.unwrap(), Some(value("v1")));

    cache.set("k", value("v2")).await.unwrap();
    assert_eq!(cache.get("k").await.unwrap(), Some(value("v2")));

    cache.delete("k").await.unwrap();
    assert_eq!(cache.get("k").await.unwrap(), None);

    // Deleting a missing key is a no-op.
    cache.delete("k").await.unwrap();
}

#[tokio::test]
async fn add_refuses_existing_keys() {
    let mut cache = MemoryCache::new(MemoryCacheConfig::default());

    cache.add("k", value("v1")).await.unwrap();
    let err = cache.add("k", value("v2")).await.unwrap_err();
    assert!(matches!(err, ComponentError::KeyAlreadyExists));
    assert_eq!(cache.get("k").await.unwrap(), Some(value("v1")));
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let config = MemoryCacheConfig {
        default_ttl: Some(Duration::from_millis(30)),
        ..Default::default()
    };
    let mut cache = MemoryCache::new(config);

    cache.set("k", value("v")).await.unwrap();
    assert!(cache.get("k").await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(cache.get("k").await.unwrap(), None);

    // An expired entry no longer blocks add.
    cache.add("k", value("v2")).await.unwrap();
}

#[tokio::test]
async fn init_values_are_present() {
    let config = MemoryCacheConfig {
        init_values: [("seed".to_string(), "value".to_string())].into(),
        ..Default::default()
    };
    let mut cache = MemoryCache::new(config);
    assert_eq!(cache.get("seed").await.unwrap(), Some(value("value")));
}
