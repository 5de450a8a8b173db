// Order statistics over repeated timing measurements.
use statrs::statistics::{Data, OrderStatistics};
use std::time::Duration;

pub fn percentile(numbers: &[f64], percentile: usize) -> f64 {
    let mut data = Data::new(numbers.to_vec());

    data.percentile(percentile)
}

pub fn median(numbers: &[f64]) -> f64 {
    percentile(numbers, 50)
}

/// Median of a set of elapsed times. `None` when there are no timings.
pub fn median_duration(timings: &[Duration]) -> Option<Duration> {
    if timings.is_empty() {
        return None;
    }
    let seconds = timings.iter().map(Duration::as_secs_f64).collect::<Vec<_>>();

    Some(Duration::from_secs_f64(median(&seconds)))
}
