use super::*;

fn budget(max_per_batch: usize, target_steps: usize) -> PhaseBudget {
    PhaseBudget {
        max_per_batch,
        target_steps,
    }
}

#[test]
fn empty_phase_has_no_batches() {
    assert_eq!(batch_count(0, budget(3, 2), 6), 0);
    assert!(batch_phase::<u32>(&[], budget(3, 2), 6).is_empty());
}

#[test]
fn remainder_goes_to_the_last_batch() {
    let items: Vec<u32> = (0..10).collect();
    let batches = batch_phase(&items, budget(3, 1), 6);
    assert_eq!(batches.len(), 4);
    let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 2, 2, 4]);
    let flat: Vec<u32> = batches.into_iter().flatten().collect();
    assert_eq!(flat, items);
}

#[test]
fn batch_count_is_capped_and_never_exceeds_items() {
    assert_eq!(batch_count(100, budget(1, 1), 6), 6);
    assert_eq!(batch_count(2, budget(1, 5), 6), 2);
    assert_eq!(batch_count(1, budget(10, 0), 6), 1);
    assert_eq!(batch_count(7, budget(10, 3), 6), 3);
}

#[test]
fn more_density_means_at_least_as_many_batches() {
    let cfg = crate::config::BatchConfig::default();
    for phase in crate::plan::phase::Phase::CONTOUR_PHASES {
        for n in [1usize, 5, 17, 60] {
            let mut prev = 0;
            for d in 4..=16 {
                let b = PhaseBudget::for_density(phase, d, &cfg).unwrap();
                let count = batch_count(n, b, cfg.max_steps_per_phase);
                assert!(count >= prev, "{phase} n={n} d={d}");
                prev = count;
            }
        }
    }
}
