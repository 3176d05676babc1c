use crate::horizons::shape::{CutSpec, Outline, Shape};
use crate::horizons::{ah, QuantityMap, ShapeFiles};
use crate::series::TimeSeries;
use crate::utils::error::{HorizonError, Result};
use std::fmt;
use std::sync::Arc;

/// AHFinderDirect quantities of a horizon.
#[derive(Debug, Clone, Default)]
pub struct AhQuantities {
    index: Option<usize>,
    series: Option<Arc<QuantityMap>>,
}

impl AhQuantities {
    pub fn quantity(&self, name: &str) -> Result<&TimeSeries> {
        self.series
            .as_ref()
            .and_then(|series| series.get(name))
            .ok_or_else(|| HorizonError::QuantityNotFound {
                namespace: match self.index {
                    Some(index) => format!("apparent horizon {}", index),
                    None => "apparent horizon (none selected)".to_string(),
                },
                name: name.to_string(),
            })
    }

    pub fn available_quantities(&self) -> Vec<String> {
        self.series
            .as_ref()
            .map(|series| series.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.series.as_ref().map_or(true, |series| series.is_empty())
    }
}

/// One horizon: QLM quantities at the top level, AHFinderDirect ones under
/// [`Horizon::ah`], plus the surface shapes.
#[derive(Debug, Clone)]
pub struct Horizon {
    qlm_index: Option<usize>,
    ah_index: Option<usize>,
    qlm: Option<Arc<QuantityMap>>,
    ah: AhQuantities,
    shapes: Option<Arc<ShapeFiles>>,
}

impl Horizon {
    pub(crate) fn new(
        qlm_index: Option<usize>,
        ah_index: Option<usize>,
        qlm: Option<Arc<QuantityMap>>,
        ah_series: Option<Arc<QuantityMap>>,
        shapes: Option<Arc<ShapeFiles>>,
    ) -> Self {
        Self {
            qlm_index,
            ah_index,
            qlm,
            ah: AhQuantities {
                index: ah_index,
                series: ah_series,
            },
            shapes,
        }
    }

    pub fn qlm_index(&self) -> Option<usize> {
        self.qlm_index
    }

    pub fn ah_index(&self) -> Option<usize> {
        self.ah_index
    }

    pub fn has_qlm(&self) -> bool {
        self.qlm.as_ref().is_some_and(|q| !q.is_empty())
    }

    pub fn has_ah(&self) -> bool {
        !self.ah.is_empty()
    }

    /// QLM quantity by name, e.g. `mass` or `qlm_mass`.
    pub fn quantity(&self, name: &str) -> Result<&TimeSeries> {
        let key = name.strip_prefix("qlm_").unwrap_or(name);
        self.qlm
            .as_ref()
            .and_then(|series| series.get(key))
            .ok_or_else(|| HorizonError::QuantityNotFound {
                namespace: match self.qlm_index {
                    Some(index) => format!("QLM horizon {}", index),
                    None => "QLM horizon (none selected)".to_string(),
                },
                name: name.to_string(),
            })
    }

    pub fn available_quantities(&self) -> Vec<String> {
        self.qlm
            .as_ref()
            .map(|series| series.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn ah(&self) -> &AhQuantities {
        &self.ah
    }

    /// First time the apparent horizon was found.
    pub fn formation_time(&self) -> Option<f64> {
        let series = self.ah.series.as_ref()?;
        series
            .get("area")
            .or_else(|| series.values().next())
            .map(TimeSeries::tmin)
    }

    pub fn shape_iterations(&self) -> Vec<u64> {
        self.shapes
            .as_ref()
            .map(|shapes| shapes.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn shape_available(&self) -> bool {
        self.shapes.as_ref().is_some_and(|shapes| !shapes.is_empty())
    }

    fn iteration_not_found(&self, iteration: u64) -> HorizonError {
        HorizonError::IterationNotFound {
            ah: self.ah_index,
            iteration,
        }
    }

    /// Simulation time of a shape iteration, from the diagnostics output.
    pub fn shape_time_at_iteration(&self, iteration: u64) -> Result<f64> {
        let iterations = self
            .ah
            .quantity(ah::DIAGNOSTIC_COLUMNS[0])
            .map_err(|_| self.iteration_not_found(iteration))?;
        iterations
            .iter()
            .find(|(_, it)| *it == iteration as f64)
            .map(|(t, _)| t)
            .ok_or_else(|| self.iteration_not_found(iteration))
    }

    /// Reads the surface at `iteration`. With several restarts writing the
    /// same iteration, the last one wins.
    pub fn shape_at_iteration(&self, iteration: u64) -> Result<Shape> {
        let path = self
            .shapes
            .as_ref()
            .and_then(|shapes| shapes.get(&iteration))
            .and_then(|paths| paths.last())
            .ok_or_else(|| self.iteration_not_found(iteration))?;

        tracing::debug!("Loading shape from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        ah::parse_shape(&path.display().to_string(), iteration, &content)
    }

    pub fn shape_outline_at_iteration(&self, iteration: u64, cut: &CutSpec) -> Result<Outline> {
        self.shape_at_iteration(iteration)?.outline(cut)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = |i: Option<usize>| i.map_or("-".to_string(), |i| i.to_string());
        writeln!(
            f,
            "Horizon (qlm: {}, ah: {})",
            index(self.qlm_index),
            index(self.ah_index)
        )?;
        if self.has_qlm() {
            writeln!(f, "  QLM quantities: {}", self.available_quantities().join(", "))?;
        }
        if self.has_ah() {
            writeln!(f, "  AH quantities: {}", self.ah.available_quantities().join(", "))?;
            if let Some(t) = self.formation_time() {
                writeln!(f, "  Formation time: {}", t)?;
            }
        }
        let iterations = self.shape_iterations();
        match (iterations.first(), iterations.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "  Shapes: {} iterations ({} to {})",
                iterations.len(),
                first,
                last
            ),
            _ => write!(f, "  Shapes: none"),
        }
    }
}
