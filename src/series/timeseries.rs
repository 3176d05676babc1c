use crate::series::{linspace, smoothing, window};
use crate::utils::error::{HorizonError, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// allclose 的預設容差
const DT_RTOL: f64 = 1e-5;
const DT_ATOL: f64 = 1e-8;
/// Upper bound on the points produced by fixed frequency resampling.
pub const MAX_RESAMPLED_POINTS: usize = 1 << 24;

/// Real valued samples `(t, y)` with strictly increasing times.
///
/// ```
/// use horizon_scan::series::TimeSeries;
///
/// let ts = TimeSeries::new(vec![0.0, 1.0, 2.0], vec![1.0, 3.0, 5.0]).unwrap();
/// assert_eq!(ts.value_at(1.5).unwrap(), 4.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    t: Vec<f64>,
    y: Vec<f64>,
}

impl TimeSeries {
    pub fn new(t: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if t.is_empty() {
            return Err(HorizonError::series("Time series cannot be empty"));
        }
        if t.len() != y.len() {
            return Err(HorizonError::series(format!(
                "Times and values have different lengths ({} vs {})",
                t.len(),
                y.len()
            )));
        }
        if t.windows(2).any(|w| w[1] - w[0] <= 0.0) {
            return Err(HorizonError::series("Time not monotonically increasing"));
        }
        Ok(Self { t, y })
    }

    pub fn t(&self) -> &[f64] {
        &self.t
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.t.iter().copied().zip(self.y.iter().copied())
    }

    pub fn tmin(&self) -> f64 {
        self.t[0]
    }

    pub fn tmax(&self) -> f64 {
        self.t[self.t.len() - 1]
    }

    pub fn time_length(&self) -> f64 {
        self.tmax() - self.tmin()
    }

    pub fn mean(&self) -> f64 {
        self.y.iter().sum::<f64>() / self.y.len() as f64
    }

    /// Time step of a regularly sampled series.
    pub fn dt(&self) -> Result<f64> {
        if self.len() < 2 {
            return Err(HorizonError::series(
                "Timeseries with a single point has no time step",
            ));
        }
        let dt0 = self.t[1] - self.t[0];
        let regular = self
            .t
            .windows(2)
            .all(|w| ((w[1] - w[0]) - dt0).abs() <= DT_ATOL + DT_RTOL * dt0.abs());
        if !regular {
            return Err(HorizonError::series("Timeseries is not regularly sampled"));
        }
        Ok(dt0)
    }

    /// Linear interpolation inside `[tmin, tmax]`.
    pub fn value_at(&self, time: f64) -> Result<f64> {
        let eps = 1e-12 * self.time_length().abs().max(1.0);
        if time < self.tmin() - eps || time > self.tmax() + eps {
            return Err(HorizonError::series(format!(
                "Time {} outside of the series range [{}, {}]",
                time,
                self.tmin(),
                self.tmax()
            )));
        }
        let time = time.clamp(self.tmin(), self.tmax());

        let idx = self.t.partition_point(|&x| x < time);
        if idx < self.len() && self.t[idx] == time {
            return Ok(self.y[idx]);
        }
        // idx 必定在 1..len 之間
        let (t0, t1) = (self.t[idx - 1], self.t[idx]);
        let (y0, y1) = (self.y[idx - 1], self.y[idx]);
        Ok(y0 + (y1 - y0) * (time - t0) / (t1 - t0))
    }

    pub fn resampled(&self, new_times: &[f64]) -> Result<Self> {
        let values = new_times
            .iter()
            .map(|&time| self.value_at(time))
            .collect::<Result<Vec<_>>>()?;
        Self::new(new_times.to_vec(), values)
    }

    pub fn resample(&mut self, new_times: &[f64]) -> Result<()> {
        *self = self.resampled(new_times)?;
        Ok(())
    }

    /// Same number of points, evenly spaced between `tmin` and `tmax`.
    pub fn regular_resampled(&self) -> Result<Self> {
        self.resampled(&linspace(self.tmin(), self.tmax(), self.len()))
    }

    pub fn regular_resample(&mut self) -> Result<()> {
        *self = self.regular_resampled()?;
        Ok(())
    }

    /// Keeps `tmin`; `tmax` moves down when the duration is not a multiple
    /// of `1 / frequency`.
    pub fn fixed_frequency_resampled(&self, frequency: f64) -> Result<Self> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(HorizonError::series("Frequency must be positive and finite"));
        }
        let dt = 1.0 / frequency;
        if dt > self.time_length() {
            return Err(HorizonError::series("Frequency too short for resampling"));
        }
        let steps = (self.time_length() / dt).floor();
        if steps >= MAX_RESAMPLED_POINTS as f64 {
            return Err(HorizonError::series(format!(
                "Frequency {} would produce more than {} points",
                frequency, MAX_RESAMPLED_POINTS
            )));
        }
        let n = steps as usize;
        let new_times: Vec<f64> = (0..=n).map(|k| self.tmin() + k as f64 * dt).collect();
        self.resampled(&new_times)
    }

    pub fn fixed_frequency_resample(&mut self, frequency: f64) -> Result<()> {
        *self = self.fixed_frequency_resampled(frequency)?;
        Ok(())
    }

    pub fn fixed_timestep_resampled(&self, timestep: f64) -> Result<Self> {
        if !timestep.is_finite() || timestep <= 0.0 {
            return Err(HorizonError::series("Timestep must be positive and finite"));
        }
        if timestep > self.time_length() {
            return Err(HorizonError::series(
                "Timestep larger then duration of the TimeSeries",
            ));
        }
        self.fixed_frequency_resampled(1.0 / timestep)
    }

    pub fn fixed_timestep_resample(&mut self, timestep: f64) -> Result<()> {
        *self = self.fixed_timestep_resampled(timestep)?;
        Ok(())
    }

    /// Pads with trailing zeros up to `n` points. Needs regular sampling.
    pub fn zero_padded(&self, n: usize) -> Result<Self> {
        if n < self.len() {
            return Err(HorizonError::series(
                "Zero-padding cannot decrease the number of points",
            ));
        }
        let dt = self.dt()?;
        let extra = n - self.len();
        let tmax = self.tmax();

        let mut t = self.t.clone();
        t.extend((1..=extra).map(|k| tmax + k as f64 * dt));
        let mut y = self.y.clone();
        y.resize(n, 0.0);
        Self::new(t, y)
    }

    pub fn zero_pad(&mut self, n: usize) -> Result<()> {
        *self = self.zero_padded(n)?;
        Ok(())
    }

    pub fn mean_removed(&self) -> Self {
        let mean = self.mean();
        self.map_values(|v| v - mean)
    }

    pub fn mean_remove(&mut self) {
        *self = self.mean_removed();
    }

    /// What was at `t = 0` ends up at `t = shift`.
    pub fn time_shifted(&self, shift: f64) -> Self {
        Self {
            t: self.t.iter().map(|t| t + shift).collect(),
            y: self.y.clone(),
        }
    }

    pub fn time_shift(&mut self, shift: f64) {
        *self = self.time_shifted(shift);
    }

    /// `t -> t / unit`, or `t -> t * unit` with `inverse`.
    pub fn time_unit_changed(&self, unit: f64, inverse: bool) -> Result<Self> {
        if unit <= 0.0 {
            return Err(HorizonError::series("Time unit must be positive"));
        }
        let factor = if inverse { unit } else { 1.0 / unit };
        Ok(Self {
            t: self.t.iter().map(|t| t * factor).collect(),
            y: self.y.clone(),
        })
    }

    pub fn time_unit_change(&mut self, unit: f64, inverse: bool) -> Result<()> {
        *self = self.time_unit_changed(unit, inverse)?;
        Ok(())
    }

    /// Stretches time by `1 + z`.
    pub fn redshifted(&self, z: f64) -> Result<Self> {
        self.time_unit_changed(1.0 + z, true)
    }

    pub fn redshift(&mut self, z: f64) -> Result<()> {
        *self = self.redshifted(z)?;
        Ok(())
    }

    pub fn windowed(&self, window: &[f64]) -> Result<Self> {
        if window.len() != self.len() {
            return Err(HorizonError::series(format!(
                "Window has {} points, series has {}",
                window.len(),
                self.len()
            )));
        }
        Ok(Self {
            t: self.t.clone(),
            y: self.y.iter().zip(window).map(|(y, w)| y * w).collect(),
        })
    }

    pub fn window(&mut self, window: &[f64]) -> Result<()> {
        *self = self.windowed(window)?;
        Ok(())
    }

    pub fn tukey_windowed(&self, alpha: f64) -> Result<Self> {
        self.windowed(&window::tukey(self.len(), alpha))
    }

    pub fn tukey_window(&mut self, alpha: f64) -> Result<()> {
        *self = self.tukey_windowed(alpha)?;
        Ok(())
    }

    pub fn hamming_windowed(&self) -> Result<Self> {
        self.windowed(&window::hamming(self.len()))
    }

    pub fn hamming_window(&mut self) -> Result<()> {
        *self = self.hamming_windowed()?;
        Ok(())
    }

    pub fn blackman_windowed(&self) -> Result<Self> {
        self.windowed(&window::blackman(self.len()))
    }

    pub fn blackman_window(&mut self) -> Result<()> {
        *self = self.blackman_windowed()?;
        Ok(())
    }

    /// First time derivative. Second order in the interior, first order at
    /// the two ends; works on non uniform grids.
    pub fn derived(&self) -> Result<Self> {
        let n = self.len();
        if n < 2 {
            return Err(HorizonError::series(
                "At least two points are needed to take a derivative",
            ));
        }
        let (t, y) = (&self.t, &self.y);
        let mut dy = vec![0.0; n];
        dy[0] = (y[1] - y[0]) / (t[1] - t[0]);
        dy[n - 1] = (y[n - 1] - y[n - 2]) / (t[n - 1] - t[n - 2]);
        for i in 1..n - 1 {
            let hs = t[i] - t[i - 1];
            let hd = t[i + 1] - t[i];
            dy[i] = (hs * hs * y[i + 1] + (hd * hd - hs * hs) * y[i] - hd * hd * y[i - 1])
                / (hs * hd * (hd + hs));
        }
        Ok(Self { t: t.clone(), y: dy })
    }

    pub fn derive(&mut self) -> Result<()> {
        *self = self.derived()?;
        Ok(())
    }

    /// Savitzky-Golay smoothing over `window` points (odd, larger than `order`).
    pub fn savgol_smoothed(&self, window: usize, order: usize) -> Result<Self> {
        let y = smoothing::savgol_filter(&self.y, window, order)?;
        Ok(Self {
            t: self.t.clone(),
            y,
        })
    }

    pub fn savgol_smooth(&mut self, window: usize, order: usize) -> Result<()> {
        *self = self.savgol_smoothed(window, order)?;
        Ok(())
    }

    /// Resamples to uniform steps, then smooths over a window `tsmooth` long.
    pub fn savgol_smoothed_time(&self, tsmooth: f64, order: usize) -> Result<Self> {
        let regular = self.regular_resampled()?;
        if regular.len() < 2 {
            return Err(HorizonError::series(
                "At least two points are needed to smooth in time",
            ));
        }
        let dt = regular.t[1] - regular.t[0];
        let mut window = (tsmooth / dt).round_ties_even().max(1.0) as usize;
        if window % 2 == 0 {
            window += 1;
        }
        regular.savgol_smoothed(window, order)
    }

    pub fn savgol_smooth_time(&mut self, tsmooth: f64, order: usize) -> Result<()> {
        *self = self.savgol_smoothed_time(tsmooth, order)?;
        Ok(())
    }

    /// Removes `2π` jumps from a series of angles.
    pub fn unfolded(&self) -> Self {
        Self {
            t: self.t.clone(),
            y: super::unfold_phase(&self.y),
        }
    }

    pub fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            t: self.t.clone(),
            y: self.y.iter().map(|&v| f(v)).collect(),
        }
    }
}

impl Add<f64> for TimeSeries {
    type Output = TimeSeries;

    fn add(self, rhs: f64) -> Self::Output {
        self.map_values(|v| v + rhs)
    }
}

impl Sub<f64> for TimeSeries {
    type Output = TimeSeries;

    fn sub(self, rhs: f64) -> Self::Output {
        self.map_values(|v| v - rhs)
    }
}

impl Mul<f64> for TimeSeries {
    type Output = TimeSeries;

    fn mul(self, rhs: f64) -> Self::Output {
        self.map_values(|v| v * rhs)
    }
}

impl Div<f64> for TimeSeries {
    type Output = TimeSeries;

    fn div(self, rhs: f64) -> Self::Output {
        self.map_values(|v| v / rhs)
    }
}
