//! Shared arithmetic for the statistics blocks.

/// Fold `value` into a running average over `count` samples.
///
/// `count` is the number of samples *including* `value`, so the first
/// sample (`count == 1`) replaces the average outright:
/// `avg' = avg + (value - avg) / count`.
pub fn running_average(avg: f64, value: f64, count: usize) -> f64 {
    if count == 0 {
        return avg;
    }
    avg + (value - avg) / count as f64
}
