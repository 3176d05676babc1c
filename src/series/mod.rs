//! Scalar time series and the helpers used to clean them up.
//!
//! Horizon finders write one sample per output iteration. Restarted runs
//! repeat part of the time range, so series read from several files go
//! through [`remove_duplicate_iters`] or [`combine`] before use.

pub mod combine;
pub mod smoothing;
pub mod timeseries;
pub mod window;

pub use combine::{combine, remove_duplicate_iters, sample_common, unfold_phase};
pub use timeseries::TimeSeries;

/// `n` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            values[n - 1] = end;
            values
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_endpoints() {
        let values = linspace(0.0, 1.0, 5);
        assert_eq!(values, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(2.0, 3.0, 0).is_empty());
    }
}
