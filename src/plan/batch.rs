use crate::plan::phase::PhaseBudget;

/// Number of batches for `n` items under `budget`, capped at `max_steps`.
pub fn batch_count(n: usize, budget: PhaseBudget, max_steps: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let by_size = n.div_ceil(budget.max_per_batch.max(1));
    budget
        .target_steps
        .max(by_size)
        .clamp(1, max_steps.max(1))
        .min(n)
}

/// Split ranked items into consecutive batches, preserving order.
///
/// Each batch takes `n / b` items and the last one also absorbs the remainder.
pub fn batch_phase<T: Clone>(items: &[T], budget: PhaseBudget, max_steps: usize) -> Vec<Vec<T>> {
    let n = items.len();
    let b = batch_count(n, budget, max_steps);
    if b == 0 {
        return Vec::new();
    }
    let per = n / b;
    let mut out = Vec::with_capacity(b);
    for i in 0..b {
        let start = i * per;
        let end = if i + 1 == b { n } else { start + per };
        out.push(items[start..end].to_vec());
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/plan/batch.rs"]
mod tests;
