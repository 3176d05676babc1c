use crate::utils::error::{HorizonError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DEDUP_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl FromStr for Axis {
    type Err = HorizonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(HorizonError::InvalidCut {
                message: format!("Unknown axis '{}'", other),
            }),
        }
    }
}

/// Per-axis filter: `None` leaves the axis free, `Some(v)` fixes it at `v`.
///
/// Parses `z=0`, `x=1.5,y=0`, or the positional `_,_,0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CutSpec(pub [Option<f64>; 3]);

impl CutSpec {
    pub fn new(x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Self {
        Self([x, y, z])
    }

    pub fn fixed_axes(&self) -> Vec<(Axis, f64)> {
        Axis::ALL
            .iter()
            .filter_map(|&axis| self.0[axis.index()].map(|v| (axis, v)))
            .collect()
    }

    pub fn free_axes(&self) -> Vec<Axis> {
        Axis::ALL
            .iter()
            .copied()
            .filter(|axis| self.0[axis.index()].is_none())
            .collect()
    }

    /// Short form usable in file names, e.g. `z0` or `x1.5_y0`.
    pub fn label(&self) -> String {
        let fixed = self.fixed_axes();
        if fixed.is_empty() {
            return "full".to_string();
        }
        fixed
            .iter()
            .map(|(axis, value)| format!("{}{}", axis.name(), value))
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl fmt::Display for CutSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|v| match v {
                Some(v) => v.to_string(),
                None => "_".to_string(),
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for CutSpec {
    type Err = HorizonError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(HorizonError::InvalidCut {
                message: "Empty cut".to_string(),
            });
        }

        let parse_value = |text: &str| {
            text.trim().parse::<f64>().map_err(|_| HorizonError::InvalidCut {
                message: format!("'{}' is not a number", text.trim()),
            })
        };

        let mut cut = [None; 3];
        if s.contains('=') {
            for assignment in s.split(',') {
                let (axis, value) =
                    assignment
                        .split_once('=')
                        .ok_or_else(|| HorizonError::InvalidCut {
                            message: format!("Expected axis=value, got '{}'", assignment),
                        })?;
                let axis: Axis = axis.parse()?;
                if cut[axis.index()].is_some() {
                    return Err(HorizonError::InvalidCut {
                        message: format!("Axis {} given twice", axis.name()),
                    });
                }
                cut[axis.index()] = Some(parse_value(value)?);
            }
        } else {
            let parts: Vec<&str> = s.split(',').collect();
            if parts.len() != 3 {
                return Err(HorizonError::InvalidCut {
                    message: format!("Expected three elements, got {}", parts.len()),
                });
            }
            for (slot, part) in cut.iter_mut().zip(parts) {
                *slot = match part.trim() {
                    "" | "_" | "*" | "None" | "none" => None,
                    value => Some(parse_value(value)?),
                };
            }
        }
        Ok(CutSpec(cut))
    }
}

/// One patch of a multi-patch surface: three grids of equal shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub label: String,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<Vec<f64>>,
    pub z: Vec<Vec<f64>>,
}

impl Patch {
    pub fn len(&self) -> usize {
        self.x.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn point(&self, row: usize, col: usize) -> [f64; 3] {
        [self.x[row][col], self.y[row][col], self.z[row][col]]
    }

    /// `(row, column, [x, y, z])` for every grid point.
    pub fn points(&self) -> impl Iterator<Item = (usize, usize, [f64; 3])> + '_ {
        self.x.iter().enumerate().flat_map(move |(row, cols)| {
            (0..cols.len()).map(move |col| (row, col, self.point(row, col)))
        })
    }

    // 相鄰點組成的邊（沿列與沿行）
    fn edges(&self) -> Vec<([f64; 3], [f64; 3])> {
        let mut edges = Vec::new();
        for row in 0..self.x.len() {
            let width = self.x[row].len();
            for col in 0..width {
                let p = self.point(row, col);
                if col + 1 < width {
                    edges.push((p, self.point(row, col + 1)));
                }
                if row + 1 < self.x.len() && col < self.x[row + 1].len() {
                    edges.push((p, self.point(row + 1, col)));
                }
            }
        }
        edges
    }
}

/// A horizon surface at one iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub iteration: u64,
    pub patches: Vec<Patch>,
}

impl Shape {
    pub fn len(&self) -> usize {
        self.patches.iter().map(Patch::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn patch(&self, label: &str) -> Option<&Patch> {
        self.patches.iter().find(|p| p.label == label)
    }

    /// `(min, max)` along each axis.
    pub fn extent(&self) -> [(f64, f64); 3] {
        let mut extent = [(f64::INFINITY, f64::NEG_INFINITY); 3];
        for patch in &self.patches {
            for (_, _, point) in patch.points() {
                for (range, value) in extent.iter_mut().zip(point) {
                    range.0 = range.0.min(value);
                    range.1 = range.1.max(value);
                }
            }
        }
        extent
    }

    pub fn outline(&self, cut: &CutSpec) -> Result<Outline> {
        let fixed = cut.fixed_axes();
        match fixed.as_slice() {
            [] => Ok(self.all_points()),
            [(axis, value)] => Ok(self.plane_section(*axis, *value)),
            [(first, first_value), (second, second_value)] => {
                Ok(self.line_section(*first, *first_value, *second, *second_value))
            }
            _ => Err(HorizonError::InvalidCut {
                message: format!("Cut {} fixes every axis, nothing left to draw", cut),
            }),
        }
    }

    fn all_points(&self) -> Outline {
        let mut coordinates = vec![Vec::with_capacity(self.len()); 3];
        for patch in &self.patches {
            for (_, _, point) in patch.points() {
                for (axis, value) in coordinates.iter_mut().zip(point) {
                    axis.push(value);
                }
            }
        }
        Outline {
            axes: Axis::ALL.to_vec(),
            coordinates,
        }
    }

    /// Closed polygon where the surface meets the plane `axis = value`,
    /// projected on the other two axes.
    fn plane_section(&self, axis: Axis, value: f64) -> Outline {
        let free: Vec<Axis> = Axis::ALL.iter().copied().filter(|a| *a != axis).collect();
        let (a, b) = (free[0].index(), free[1].index());
        let k = axis.index();

        let mut crossings: Vec<(f64, f64)> = Vec::new();
        for patch in &self.patches {
            for (_, _, point) in patch.points() {
                if point[k] == value {
                    crossings.push((point[a], point[b]));
                }
            }
            for (p, q) in patch.edges() {
                let (dp, dq) = (p[k] - value, q[k] - value);
                if dp * dq < 0.0 {
                    let s = dp / (dp - dq);
                    crossings.push((p[a] + s * (q[a] - p[a]), p[b] + s * (q[b] - p[b])));
                }
            }
        }

        crossings.sort_by(|p, q| p.0.total_cmp(&q.0).then(p.1.total_cmp(&q.1)));
        crossings.dedup_by(|p, q| {
            (p.0 - q.0).abs() < DEDUP_TOLERANCE && (p.1 - q.1).abs() < DEDUP_TOLERANCE
        });

        if !crossings.is_empty() {
            let n = crossings.len() as f64;
            let ca = crossings.iter().map(|p| p.0).sum::<f64>() / n;
            let cb = crossings.iter().map(|p| p.1).sum::<f64>() / n;
            crossings.sort_by(|p, q| {
                let ap = (p.1 - cb).atan2(p.0 - ca);
                let aq = (q.1 - cb).atan2(q.0 - ca);
                ap.total_cmp(&aq)
            });
        }

        Outline {
            axes: free,
            coordinates: vec![
                crossings.iter().map(|p| p.0).collect(),
                crossings.iter().map(|p| p.1).collect(),
            ],
        }
    }

    /// Where the line with two fixed coordinates pierces the surface.
    fn line_section(&self, first: Axis, first_value: f64, second: Axis, second_value: f64) -> Outline {
        let section = self.plane_section(first, first_value);
        let free = Axis::ALL
            .iter()
            .copied()
            .find(|a| *a != first && *a != second)
            .unwrap_or(Axis::Z);

        let position = |axis: Axis| section.axes.iter().position(|a| *a == axis);
        let (Some(j), Some(k)) = (position(second), position(free)) else {
            return Outline {
                axes: vec![free],
                coordinates: vec![Vec::new()],
            };
        };
        let along = &section.coordinates[j];
        let values = &section.coordinates[k];

        let mut hits = Vec::new();
        let n = along.len();
        for i in 0..n {
            let next = (i + 1) % n;
            let (dp, dq) = (along[i] - second_value, along[next] - second_value);
            if dp == 0.0 {
                hits.push(values[i]);
            } else if dp * dq < 0.0 {
                let s = dp / (dp - dq);
                hits.push(values[i] + s * (values[next] - values[i]));
            }
        }
        hits.sort_by(f64::total_cmp);
        hits.dedup_by(|p, q| (*p - *q).abs() < DEDUP_TOLERANCE);

        Outline {
            axes: vec![free],
            coordinates: vec![hits],
        }
    }
}

/// Coordinates of a cut, one vector per free axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub axes: Vec<Axis>,
    pub coordinates: Vec<Vec<f64>>,
}

impl Outline {
    pub fn len(&self) -> usize {
        self.coordinates.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn along(&self, axis: Axis) -> Option<&[f64]> {
        self.axes
            .iter()
            .position(|a| *a == axis)
            .map(|i| self.coordinates[i].as_slice())
    }
}
