use crate::series::{linspace, TimeSeries};
use crate::utils::error::{HorizonError, Result};
use std::cmp::Ordering;
use std::f64::consts::PI;

/// Drops samples overwritten by a later restart.
///
/// Only the last of overlapping segments survives: for times
/// `[1, 2, 3, 4, 2, 3]` the result keeps `[1, 2, 3]` from the first segment
/// and the values of the second one, the `4` is gone.
pub fn remove_duplicate_iters(t: &[f64], y: &[f64]) -> Result<TimeSeries> {
    if t.len() != y.len() {
        return Err(HorizonError::series(format!(
            "Times and values have different lengths ({} vs {})",
            t.len(),
            y.len()
        )));
    }
    if t.is_empty() {
        return Err(HorizonError::series("Time series cannot be empty"));
    }

    // 反向累積最小值
    let mut suffix_min = t.to_vec();
    for i in (0..t.len() - 1).rev() {
        suffix_min[i] = suffix_min[i].min(suffix_min[i + 1]);
    }

    let mut times = Vec::with_capacity(t.len());
    let mut values = Vec::with_capacity(t.len());
    for i in 0..t.len() {
        let keep = i == t.len() - 1 || t[i] < suffix_min[i + 1];
        if keep {
            times.push(t[i]);
            values.push(y[i]);
        }
    }
    TimeSeries::new(times, values)
}

/// Merges overlapping series into one.
///
/// With `prefer_late` the series that starts later wins where they overlap;
/// otherwise the earlier one does. Ties on the start time go to the longer
/// series.
pub fn combine(series: &[TimeSeries], prefer_late: bool) -> Result<TimeSeries> {
    if series.is_empty() {
        return Err(HorizonError::series("Nothing to combine"));
    }

    let mut ordered: Vec<&TimeSeries> = series.iter().collect();
    ordered.sort_by(|a, b| {
        let by_start = a.tmin().total_cmp(&b.tmin());
        let by_start = if prefer_late { by_start.reverse() } else { by_start };
        by_start.then(b.tmax().total_cmp(&a.tmax()))
    });

    let mut times: Vec<f64> = Vec::new();
    let mut values: Vec<f64> = Vec::new();

    if prefer_late {
        // 從最晚的開始，往回只補更早的時間
        for s in ordered {
            let limit = times.last().copied().unwrap_or(f64::INFINITY);
            for (t, y) in s.iter().collect::<Vec<_>>().into_iter().rev() {
                if t < limit {
                    times.push(t);
                    values.push(y);
                }
            }
        }
        times.reverse();
        values.reverse();
    } else {
        for s in ordered {
            let limit = times.last().copied().unwrap_or(f64::NEG_INFINITY);
            for (t, y) in s.iter() {
                if t > limit {
                    times.push(t);
                    values.push(y);
                }
            }
        }
    }

    TimeSeries::new(times, values)
}

/// Resamples every series on the interval they all cover, with as many
/// evenly spaced points as the shortest one.
pub fn sample_common(series: &[TimeSeries]) -> Result<Vec<TimeSeries>> {
    if series.is_empty() {
        return Err(HorizonError::series("Nothing to resample"));
    }

    let tmin = series
        .iter()
        .map(TimeSeries::tmin)
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .unwrap_or(f64::NAN);
    let tmax = series
        .iter()
        .map(TimeSeries::tmax)
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .unwrap_or(f64::NAN);
    let n = series.iter().map(TimeSeries::len).min().unwrap_or(0);

    if tmin.partial_cmp(&tmax) != Some(Ordering::Less) {
        return Err(HorizonError::series(format!(
            "Series do not share a common time interval ({} >= {})",
            tmin, tmax
        )));
    }

    let times = linspace(tmin, tmax, n);
    series.iter().map(|s| s.resampled(&times)).collect()
}

/// Adds multiples of `2π` so that consecutive angles never jump by more
/// than `π`.
pub fn unfold_phase(phase: &[f64]) -> Vec<f64> {
    let mut winding = 0.0;
    let mut out = Vec::with_capacity(phase.len());
    for (i, &p) in phase.iter().enumerate() {
        if i > 0 {
            winding += ((phase[i - 1] - p) / (2.0 * PI)).round_ties_even();
        }
        out.push(p + 2.0 * PI * winding);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(t: &[f64]) -> TimeSeries {
        TimeSeries::new(t.to_vec(), t.iter().map(|x| x * 10.0).collect()).unwrap()
    }

    #[test]
    fn test_remove_duplicate_iters_keeps_last_segment() {
        let t = [1.0, 2.0, 3.0, 4.0, 2.0, 3.0];
        let y = [10.0, 20.0, 30.0, 40.0, 21.0, 31.0];
        let cleaned = remove_duplicate_iters(&t, &y).unwrap();
        assert_eq!(cleaned.t(), &[1.0, 2.0, 3.0]);
        assert_eq!(cleaned.y(), &[10.0, 21.0, 31.0]);
    }

    #[test]
    fn test_remove_duplicate_iters_no_overlap() {
        let t = [0.0, 1.0, 2.0];
        let cleaned = remove_duplicate_iters(&t, &[5.0, 6.0, 7.0]).unwrap();
        assert_eq!(cleaned.t(), &t);
        assert!(remove_duplicate_iters(&[], &[]).is_err());
        assert!(remove_duplicate_iters(&[1.0], &[]).is_err());
    }

    #[test]
    fn test_combine_prefer_late() {
        let first = ts(&[1.0, 2.0, 3.0]);
        let second = TimeSeries::new(vec![2.0, 3.0, 4.0], vec![-2.0, -3.0, -4.0]).unwrap();
        let combined = combine(&[first.clone(), second.clone()], true).unwrap();
        assert_eq!(combined.t(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(combined.y(), &[10.0, -2.0, -3.0, -4.0]);

        let early = combine(&[second, first], false).unwrap();
        assert_eq!(early.t(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(early.y(), &[10.0, 20.0, 30.0, -4.0]);
    }

    #[test]
    fn test_combine_same_start_prefers_longer() {
        let short = ts(&[0.0, 1.0]);
        let long = TimeSeries::new(vec![0.0, 1.0, 2.0], vec![1.0, 1.0, 1.0]).unwrap();
        let combined = combine(&[short.clone(), long.clone()], true).unwrap();
        assert_eq!(combined.y(), &[1.0, 1.0, 1.0]);
        let combined = combine(&[short, long], false).unwrap();
        assert_eq!(combined.y(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_sample_common() {
        let a = ts(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let b = ts(&[1.0, 2.0, 5.0]);
        let common = sample_common(&[a, b]).unwrap();
        assert_eq!(common[0].t(), &[1.0, 2.5, 4.0]);
        assert_eq!(common[1].t(), &[1.0, 2.5, 4.0]);
        assert_eq!(common[0].y(), &[10.0, 25.0, 40.0]);

        let disjoint = sample_common(&[ts(&[0.0, 1.0]), ts(&[2.0, 3.0])]);
        assert!(disjoint.is_err());
    }

    #[test]
    fn test_unfold_phase() {
        let phase = [0.0, 3.0, -3.0, -1.0];
        let unfolded = unfold_phase(&phase);
        assert_eq!(unfolded[0], 0.0);
        assert_eq!(unfolded[1], 3.0);
        assert!((unfolded[2] - (2.0 * PI - 3.0)).abs() < 1e-12);
        assert!((unfolded[3] - (2.0 * PI - 1.0)).abs() < 1e-12);
    }
}
