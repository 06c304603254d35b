/// Numeric helpers for summarizing reaction-time samples (milliseconds).

pub fn mean_ms(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum: u64 = samples.iter().sum();
    Some(sum as f64 / samples.len() as f64)
}

pub fn median_ms(samples: &[u64]) -> Option<u64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    Some(sorted[sorted.len() / 2])
}

pub fn std_dev_ms(samples: &[u64]) -> Option<f64> {
    let mean = mean_ms(samples)?;
    let variance = samples
        .iter()
        .map(|&v| {
            let diff = mean - v as f64;
            diff * diff
        })
        .sum::<f64>()
        / samples.len() as f64;
    Some(variance.sqrt())
}
