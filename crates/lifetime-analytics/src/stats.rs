//! Descriptive statistics over lifetime samples.

/// Summary statistics for one bucket of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub median: f64,
    pub mean: f64,
    pub mode: f64,
}

impl Stats {
    /// Compute all statistics at once. `None` for an empty sample set.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let sorted = sorted(samples);
        Some(Self {
            count: sorted.len(),
            median: median_sorted(&sorted)?,
            mean: mean(&sorted)?,
            mode: mode_sorted(&sorted)?,
        })
    }
}

/// Middle value, or the mean of the two middle values for even counts.
pub fn median(samples: &[f64]) -> Option<f64> {
    median_sorted(&sorted(samples))
}

/// Arithmetic mean.
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Most frequent value. Ties go to the smallest value.
pub fn mode(samples: &[f64]) -> Option<f64> {
    mode_sorted(&sorted(samples))
}

fn sorted(samples: &[f64]) -> Vec<f64> {
    let mut values = samples.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

fn median_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

// Scans runs in ascending order and only replaces on a strictly longer run,
// so the first (smallest) value of a tied length is kept.
fn mode_sorted(sorted: &[f64]) -> Option<f64> {
    let first = *sorted.first()?;
    let (mut best, mut best_len) = (first, 0usize);
    let (mut current, mut current_len) = (first, 0usize);

    for &value in sorted {
        if value == current {
            current_len += 1;
        } else {
            current = value;
            current_len = 1;
        }
        if current_len > best_len {
            best = current;
            best_len = current_len;
        }
    }

    Some(best)
}
