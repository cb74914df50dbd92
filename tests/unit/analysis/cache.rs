use super::*;
use crate::{foundation::core::PaperSize, test_utils};

fn disc_png(radius: i32) -> Vec<u8> {
    test_utils::png_bytes(&test_utils::single_disc(96, radius))
}

#[test]
fn second_lookup_hits_and_shares_the_analysis() {
    let cache = ContourTreeCache::new(4);
    let bytes = disc_png(30);
    let cfg = PlanConfig::default();

    let a = cache.get_or_analyze(&bytes, &cfg).unwrap();
    let b = cache.get_or_analyze(&bytes, &cfg).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(
        cache.stats(),
        CacheStats {
            hits: 1,
            misses: 1,
            entries: 1
        }
    );
}

#[test]
fn paper_and_density_do_not_change_the_key() {
    let bytes = disc_png(30);
    let base = PlanConfig::default();
    let other = PlanConfig::new(PaperSize::Square, 16).unwrap();
    assert_eq!(
        AnalysisKey::new(&bytes, &base).unwrap(),
        AnalysisKey::new(&bytes, &other).unwrap()
    );

    let mut tuned = PlanConfig::default();
    tuned.extract.dilate_radius = 2;
    assert_ne!(
        AnalysisKey::new(&bytes, &base).unwrap(),
        AnalysisKey::new(&bytes, &tuned).unwrap()
    );
    assert_ne!(
        AnalysisKey::new(&bytes, &base).unwrap(),
        AnalysisKey::new(&disc_png(20), &base).unwrap()
    );
}

#[test]
fn oldest_entry_is_evicted_first() {
    let cache = ContourTreeCache::new(2);
    let cfg = PlanConfig::default();
    let images = [disc_png(20), disc_png(25), disc_png(30)];
    for img in &images {
        cache.get_or_analyze(img, &cfg).unwrap();
    }
    assert_eq!(cache.len(), 2);
    let first = AnalysisKey::new(&images[0], &cfg).unwrap();
    let last = AnalysisKey::new(&images[2], &cfg).unwrap();
    assert!(cache.get(&first).unwrap().is_none());
    assert!(cache.get(&last).unwrap().is_some());
}

#[test]
fn failures_are_not_cached() {
    let cache = ContourTreeCache::default();
    let blank = test_utils::png_bytes(&test_utils::canvas(32, 32));
    let err = cache
        .get_or_analyze(&blank, &PlanConfig::default())
        .unwrap_err();
    assert!(matches!(err, DrawStepsError::EmptyImage(_)));
    assert!(cache.is_empty());

    cache.clear();
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn cache_is_shareable_across_threads() {
    let cache = Arc::new(ContourTreeCache::new(8));
    let bytes = Arc::new(disc_png(30));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let bytes = Arc::clone(&bytes);
            std::thread::spawn(move || {
                cache
                    .get_or_analyze(&bytes, &PlanConfig::default())
                    .unwrap()
                    .contours
                    .len()
            })
        })
        .collect();
    let lens: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(lens.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(cache.len(), 1);
}
