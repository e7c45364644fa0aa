//! Per-type quota arithmetic
//!
//! Quotas are proportional to type counts, at least 1 and at most the
//! type's count. Rounding shortfalls go to the largest types first; overflow
//! from the minimum of 1 is taken back from the largest quotas.

use indexmap::IndexMap;
use tracing::{debug, warn};

/// Default allowed deviation between source and sampled type shares
pub const DEFAULT_TOLERANCE: f64 = 0.15;

/// Default extra slack absorbing quota rounding
pub const DEFAULT_ROUNDING_SLACK: f64 = 0.02;

/// Quotas per type for a sample of `sample_size` resources.
///
/// Types with a zero count are omitted. The quotas sum to
/// `min(sample_size, total)` unless there are more types than that, in
/// which case every type keeps a quota of 1. Deterministic for identical
/// inputs.
pub fn calculate_quotas(
    type_counts: &IndexMap<String, usize>,
    sample_size: usize,
) -> IndexMap<String, usize> {
    let counts: Vec<(&String, usize)> = type_counts
        .iter()
        .filter(|&(_, &count)| count > 0)
        .map(|(ty, &count)| (ty, count))
        .collect();
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    if total == 0 || sample_size == 0 {
        return IndexMap::new();
    }
    let target = sample_size.min(total);

    // Phase 1: proportional share, floored, clamped to [1, count]
    let mut quotas: IndexMap<String, usize> = counts
        .iter()
        .map(|&(ty, count)| {
            let share = (target as u128 * count as u128 / total as u128) as usize;
            (ty.clone(), share.max(1).min(count))
        })
        .collect();
    let mut sum: usize = quotas.values().sum();

    // Phase 2: hand out the shortfall, largest types first
    if sum < target {
        let mut order: Vec<(&String, usize)> = counts.clone();
        order.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        while sum < target {
            let mut progressed = false;
            for &(ty, count) in &order {
                if sum == target {
                    break;
                }
                let quota = &mut quotas[ty.as_str()];
                if *quota < count {
                    *quota += 1;
                    sum += 1;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    }

    // Phase 3: take back overflow from the largest quotas, never below 1
    while sum > target {
        let mut pick: Option<(&String, usize, usize)> = None;
        for &(ty, count) in &counts {
            let quota = quotas[ty.as_str()];
            if quota <= 1 {
                continue;
            }
            let better = match pick {
                None => true,
                Some((best_ty, best_quota, best_count)) => {
                    quota > best_quota
                        || (quota == best_quota && count < best_count)
                        || (quota == best_quota && count == best_count && ty < best_ty)
                }
            };
            if better {
                pick = Some((ty, quota, count));
            }
        }

        match pick {
            Some((ty, _, _)) => {
                quotas[ty.as_str()] -= 1;
                sum -= 1;
            }
            None => {
                warn!(
                    types = quotas.len(),
                    target_size = target,
                    sum,
                    "more resource types than sample slots; every type keeps one"
                );
                break;
            }
        }
    }

    debug!(target_size = target, sum, types = quotas.len(), "calculated quotas");
    quotas
}

/// Check sampled type shares against source shares with the default tolerance
pub fn validate_distribution(
    type_counts: &IndexMap<String, usize>,
    quotas: &IndexMap<String, usize>,
) -> bool {
    validate_distribution_within(type_counts, quotas, DEFAULT_TOLERANCE + DEFAULT_ROUNDING_SLACK)
}

/// Compare `count / total` with `quota / sum(quotas)` for every type.
///
/// Advisory only: any delta above `max_delta` is logged and yields false.
pub fn validate_distribution_within(
    type_counts: &IndexMap<String, usize>,
    quotas: &IndexMap<String, usize>,
    max_delta: f64,
) -> bool {
    let total: usize = type_counts.values().sum();
    let sampled: usize = quotas.values().sum();
    if total == 0 || sampled == 0 {
        return true;
    }

    let mut valid = true;
    for (ty, &count) in type_counts {
        let expected = count as f64 / total as f64;
        let actual = quotas.get(ty).copied().unwrap_or(0) as f64 / sampled as f64;
        let delta = (expected - actual).abs();
        if delta > max_delta {
            warn!(
                resource_type = %ty,
                expected_pct = expected * 100.0,
                actual_pct = actual * 100.0,
                "sampled distribution deviates beyond tolerance"
            );
            valid = false;
        }
    }
    valid
}
