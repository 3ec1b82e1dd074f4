use std::sync::Arc;
use std::thread;

use image::DynamicImage;
use wallstash::cache::{CacheError, PhotoCache};
use wallstash::model::{CachedPhoto, PhotoDetails, PhotoRecord};

fn photo(id: &str) -> CachedPhoto {
    let record = PhotoRecord::full(
        id,
        format!("https://w.example.test/full/{id}.jpg"),
        None,
        PhotoDetails::default(),
    )
    .unwrap();
    CachedPhoto::new(record, DynamicImage::new_rgb8(1, 1))
}

#[test]
fn test_photo_cache_evicts_oldest() {
    let cache = PhotoCache::new(2);
    cache.insert(photo("a"));
    cache.insert(photo("b"));
    cache.insert(photo("c"));

    assert_eq!(cache.len(), 2);
    assert!(!cache.contains("a"));
    assert_eq!(cache.get("b").unwrap().id(), "b");
    assert_eq!(cache.ids(), vec!["b".to_string(), "c".to_string()]);
}

#[test]
fn test_photo_cache_get_does_not_refresh() {
    let cache = PhotoCache::new(2);
    cache.insert(photo("a"));
    cache.insert(photo("b"));
    assert!(cache.get("a").is_some());
    cache.insert(photo("c"));

    assert!(!cache.contains("a"));
    assert!(cache.contains("b"));
}

#[test]
fn test_photo_cache_batch_guard() {
    let cache = PhotoCache::new(2);
    cache.insert(photo("keep"));

    let err = cache
        .insert_all(vec![photo("x"), photo("y"), photo("z")])
        .unwrap_err();
    assert_eq!(
        err,
        CacheError::OversizedBatch {
            batch: 3,
            capacity: 2
        }
    );
    assert_eq!(cache.ids(), vec!["keep".to_string()]);

    cache.insert_all(vec![photo("x"), photo("y")]).unwrap();
    assert_eq!(cache.ids(), vec!["x".to_string(), "y".to_string()]);
}

#[test]
fn test_photo_cache_shares_pixels() {
    let cache = PhotoCache::new(1);
    cache.insert(photo("a"));

    let first = cache.get("a").unwrap();
    let second = cache.get("a").unwrap();
    assert!(std::ptr::eq(first.image(), second.image()));
}

#[test]
fn test_photo_cache_capacity_under_contention() {
    let cache = Arc::new(PhotoCache::new(10));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..100 {
                    cache.insert(photo(&format!("t{t}-{i}")));
                    assert!(cache.len() <= 10);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 10);
    assert_eq!(cache.capacity(), 10);
}
