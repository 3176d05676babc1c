use crate::utils::error::{HorizonError, Result};

/// Savitzky-Golay filter. Points closer than `window / 2` to an edge take
/// the value of the polynomial fitted to the first (or last) window.
pub fn savgol_filter(data: &[f64], window: usize, order: usize) -> Result<Vec<f64>> {
    if window % 2 == 0 {
        return Err(HorizonError::series("Savgol window must be odd"));
    }
    if window <= order {
        return Err(HorizonError::series(format!(
            "Savgol window ({}) must be larger than the polynomial order ({})",
            window, order
        )));
    }
    if window > data.len() {
        return Err(HorizonError::series(format!(
            "Savgol window ({}) longer than the series ({} points)",
            window,
            data.len()
        )));
    }

    let n = data.len();
    let half = window / 2;
    let center = fit_coefficients(window, order, 0.0)?;
    let mut out = Vec::with_capacity(n);

    for i in 0..n {
        let value = if i < half {
            let coefficients = fit_coefficients(window, order, i as f64 - half as f64)?;
            dot(&coefficients, &data[..window])
        } else if i + half >= n {
            let start = n - window;
            let coefficients =
                fit_coefficients(window, order, (i - start) as f64 - half as f64)?;
            dot(&coefficients, &data[start..])
        } else {
            dot(&center, &data[i - half..=i + half])
        };
        out.push(value);
    }
    Ok(out)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Weights `h` such that `h · window` is the least squares polynomial of
/// degree `order` evaluated at offset `position` from the window center.
fn fit_coefficients(window: usize, order: usize, position: f64) -> Result<Vec<f64>> {
    let half = (window / 2).max(1) as f64;
    let cols = order + 1;
    // 以 half 縮放偏移量，避免高次方時矩陣病態
    let design: Vec<Vec<f64>> = (0..window)
        .map(|i| {
            let x = (i as f64 - (window / 2) as f64) / half;
            (0..cols).map(|j| x.powi(j as i32)).collect()
        })
        .collect();

    let mut normal = vec![vec![0.0; cols]; cols];
    for row in &design {
        for a in 0..cols {
            for b in 0..cols {
                normal[a][b] += row[a] * row[b];
            }
        }
    }

    let p = position / half;
    let rhs: Vec<f64> = (0..cols).map(|j| p.powi(j as i32)).collect();
    let solution = solve(normal, rhs)?;

    Ok(design.iter().map(|row| dot(row, &solution)).collect())
}

// Gaussian elimination with partial pivoting.
fn solve(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Result<Vec<f64>> {
    let n = rhs.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);
        if matrix[pivot][col].abs() < 1e-14 {
            return Err(HorizonError::series("Singular system in savgol fit"));
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| matrix[row][k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / matrix[row][row];
    }
    Ok(x)
}
