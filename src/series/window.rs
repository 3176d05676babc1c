//! Symmetric window functions, `n` points each.

use std::f64::consts::PI;

pub fn hamming(n: usize) -> Vec<f64> {
    cosine_sum(n, &[0.54, 0.46])
}

pub fn blackman(n: usize) -> Vec<f64> {
    cosine_sum(n, &[0.42, 0.5, 0.08])
}

pub fn hann(n: usize) -> Vec<f64> {
    cosine_sum(n, &[0.5, 0.5])
}

/// Tapered cosine window. `alpha <= 0` is rectangular, `alpha >= 1` is Hann.
pub fn tukey(n: usize, alpha: f64) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    if alpha <= 0.0 {
        return vec![1.0; n];
    }
    if alpha >= 1.0 {
        return hann(n);
    }

    let m = (n - 1) as f64;
    let width = (alpha * m / 2.0).floor() as usize;
    (0..n)
        .map(|i| {
            let x = i as f64;
            if i <= width {
                0.5 * (1.0 + (PI * (-1.0 + 2.0 * x / (alpha * m))).cos())
            } else if i < n - width - 1 {
                1.0
            } else {
                0.5 * (1.0 + (PI * (-2.0 / alpha + 1.0 + 2.0 * x / (alpha * m))).cos())
            }
        })
        .collect()
}

// a0 - a1 cos(2πk/(n-1)) + a2 cos(4πk/(n-1)) - ...
fn cosine_sum(n: usize, coefficients: &[f64]) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let m = (n - 1) as f64;
    (0..n)
        .map(|i| {
            coefficients
                .iter()
                .enumerate()
                .map(|(k, a)| {
                    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                    sign * a * (2.0 * PI * k as f64 * i as f64 / m).cos()
                })
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_windows_are_symmetric() {
        for window in [hamming(11), blackman(11), tukey(11, 0.5)] {
            for i in 0..11 {
                assert_relative_eq!(window[i], window[10 - i], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_window_peaks() {
        assert_relative_eq!(hamming(11)[5], 1.0, epsilon = 1e-12);
        assert_relative_eq!(blackman(11)[5], 1.0, epsilon = 1e-12);
        assert_relative_eq!(blackman(11)[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tukey_limits() {
        assert_eq!(tukey(5, 0.0), vec![1.0; 5]);
        assert_eq!(tukey(5, 1.0), hann(5));
        let w = tukey(11, 0.5);
        assert_relative_eq!(w[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(w[5], 1.0, epsilon = 1e-12);
        assert_eq!(tukey(1, 0.5), vec![1.0]);
    }
}
