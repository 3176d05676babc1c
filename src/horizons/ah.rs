//! AHFinderDirect output: `BH_diagnostics.ah<N>.gp` and `h.t<it>.ah<N>.gp`.

use crate::horizons::shape::{Patch, Shape};
use crate::horizons::{parse_numbers, RawSamples};
use crate::utils::error::{HorizonError, Result};
use std::collections::BTreeMap;

/// Column names of `BH_diagnostics`, in file order.
pub const DIAGNOSTIC_COLUMNS: [&str; 40] = [
    "cctk_iteration",
    "cctk_time",
    "centroid_x",
    "centroid_y",
    "centroid_z",
    "min_radius",
    "max_radius",
    "mean_radius",
    "quadrupole_xx",
    "quadrupole_xy",
    "quadrupole_xz",
    "quadrupole_yy",
    "quadrupole_yz",
    "quadrupole_zz",
    "min_x",
    "max_x",
    "min_y",
    "max_y",
    "min_z",
    "max_z",
    "xy_plane_circumference",
    "xz_plane_circumference",
    "yz_plane_circumference",
    "ratio_xz_xy_circumference",
    "ratio_yz_xy_circumference",
    "area",
    "m_irreducible",
    "areal_radius",
    "expansion",
    "inner_expansion",
    "product_of_expansions",
    "mean_curvature",
    "gradient_areal_radius",
    "gradient_expansion",
    "gradient_inner_expansion",
    "gradient_product_of_expansions",
    "gradient_mean_curvature",
    "min_mean_curvature",
    "max_mean_curvature",
    "integral_mean_curvature",
];

const TIME_COLUMN: usize = 1;

pub fn column_name(index: usize) -> String {
    DIAGNOSTIC_COLUMNS
        .get(index)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("column_{}", index + 1))
}

/// Every column except the time, sampled against `cctk_time`.
pub fn parse_diagnostics(path: &str, content: &str) -> Result<BTreeMap<String, RawSamples>> {
    let mut columns: Vec<RawSamples> = Vec::new();
    let mut width: Option<usize> = None;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let row = parse_numbers(path, line_no, trimmed)?;
        let expected = *width.get_or_insert(row.len());
        if row.len() != expected {
            return Err(HorizonError::parse(
                path,
                line_no,
                format!("expected {} columns, found {}", expected, row.len()),
            ));
        }
        if row.len() <= TIME_COLUMN {
            return Err(HorizonError::parse(
                path,
                line_no,
                "need at least iteration and time columns",
            ));
        }
        if columns.is_empty() {
            columns = vec![RawSamples::default(); row.len()];
        }

        let time = row[TIME_COLUMN];
        for (column, value) in columns.iter_mut().zip(&row) {
            column.push(time, *value);
        }
    }

    Ok(columns
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| *idx != TIME_COLUMN)
        .map(|(idx, samples)| (column_name(idx), samples))
        .collect())
}

struct PatchBuilder {
    label: String,
    rows: Vec<Vec<[f64; 3]>>,
    current: Vec<[f64; 3]>,
}

impl PatchBuilder {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            rows: Vec::new(),
            current: Vec::new(),
        }
    }

    fn end_row(&mut self) {
        if !self.current.is_empty() {
            self.rows.push(std::mem::take(&mut self.current));
        }
    }

    fn finish(mut self) -> Option<Patch> {
        self.end_row();
        if self.rows.is_empty() {
            return None;
        }
        let grid = |axis: usize| -> Vec<Vec<f64>> {
            self.rows
                .iter()
                .map(|row| row.iter().map(|p| p[axis]).collect())
                .collect()
        };
        Some(Patch {
            label: self.label.clone(),
            x: grid(0),
            y: grid(1),
            z: grid(2),
        })
    }
}

fn patch_label(comment: &str) -> Option<&str> {
    let rest = comment.strip_prefix("###")?.trim();
    let label = rest.strip_suffix("patch")?.trim();
    (!label.is_empty()).then_some(label)
}

/// Reads a gnuplot shape file. Data lines are `dpx dpy r x y z`; a blank
/// line closes a grid row, a `### <label> patch` comment opens a patch.
pub fn parse_shape(path: &str, iteration: u64, content: &str) -> Result<Shape> {
    let mut patches = Vec::new();
    let mut builder: Option<PatchBuilder> = None;
    let mut line_count = 0;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        line_count = line_no;
        let trimmed = line.trim();

        if trimmed.starts_with('#') {
            if let Some(label) = patch_label(trimmed) {
                if let Some(done) = builder.take().and_then(PatchBuilder::finish) {
                    patches.push(done);
                }
                builder = Some(PatchBuilder::new(label));
            }
            continue;
        }
        if trimmed.is_empty() {
            if let Some(b) = builder.as_mut() {
                b.end_row();
            }
            continue;
        }

        let row = parse_numbers(path, line_no, trimmed)?;
        if row.len() < 6 {
            return Err(HorizonError::parse(
                path,
                line_no,
                format!("expected at least 6 columns, found {}", row.len()),
            ));
        }
        builder
            .get_or_insert_with(|| PatchBuilder::new("all"))
            .current
            .push([row[3], row[4], row[5]]);
    }

    if let Some(done) = builder.and_then(PatchBuilder::finish) {
        patches.push(done);
    }

    if patches.is_empty() {
        return Err(HorizonError::parse(path, line_count, "shape file has no points"));
    }

    tracing::debug!("Parsed shape {} with {} patches", path, patches.len());
    Ok(Shape { iteration, patches })
}
