use ndarray::{Array2, Array3};

use crate::constants::{HS, NUM_VARS};

/// The conserved fluid state over a padded local grid: (variable, z, x).
///
/// Values are *perturbations* from the hydrostatic background for density
/// and density*theta; momenta are stored in full (background momentum is
/// zero everywhere). See [`crate::hydrostatic::HydrostaticProfile`] for the
/// background these perturbations are relative to.
pub type StateArray = Array3<f64>;

/// Cell-centered and cell-interface hydrostatic background profiles,
/// computed once at init and read-only thereafter.
#[derive(Debug, Clone)]
pub struct HydrostaticProfile {
    /// Cell-averaged density, length `nz + 2*HS`.
    pub cell_dens: Vec<f64>,
    /// Cell-averaged density*theta, length `nz + 2*HS`.
    pub cell_dens_theta: Vec<f64>,
    /// Interface density, length `nz + 1`.
    pub iface_dens: Vec<f64>,
    /// Interface density*theta, length `nz + 1`.
    pub iface_dens_theta: Vec<f64>,
    /// Interface pressure, length `nz + 1`.
    pub iface_pressure: Vec<f64>,
}

/// The scratch buffers the stencil kernels write into every sub-stage; no
/// meaning persists across stages.
pub struct Scratch {
    /// Interface fluxes: (variable, z interface, x interface), shape
    /// `(NUM_VARS, nz+1, nx+1)`.
    pub flux: StateArray,
    /// Cell tendencies: (variable, z, x), shape `(NUM_VARS, nz, nx)`.
    pub tend: StateArray,
}

impl Scratch {
    pub fn new(nx: usize, nz: usize) -> Self {
        Self {
            flux: StateArray::zeros((NUM_VARS, nz + 1, nx + 1)),
            tend: StateArray::zeros((NUM_VARS, nz, nx)),
        }
    }
}

/// Allocates a zeroed padded state array for a local grid of `nx` by `nz`
/// interior cells.
pub fn new_state_array(nx: usize, nz: usize) -> StateArray {
    StateArray::zeros((NUM_VARS, nz + 2 * HS, nx + 2 * HS))
}

/// A single output snapshot: cell-centered perturbation density, diagnostic
/// winds, and theta perturbation over this rank's local interior, plus the
/// elapsed time it was taken at. Shapes are `(nz, nx)`.
///
/// This is the only thing the core library hands to an output collaborator
/// — it performs no I/O itself.
#[derive(Debug, Clone)]
pub struct OutputSnapshot {
    pub etime: f64,
    pub i_beg: usize,
    pub nx: usize,
    pub nz: usize,
    pub dens: Array2<f64>,
    pub uwnd: Array2<f64>,
    pub wwnd: Array2<f64>,
    pub theta: Array2<f64>,
}

/// Consumes [`OutputSnapshot`]s produced during a run. The library ships a
/// no-op implementation (used when output is disabled or no sink is
/// supplied); `miniweather-cli` provides a concrete `.npz`-backed one.
pub trait OutputSink {
    fn emit(&mut self, snapshot: &OutputSnapshot) -> Result<(), crate::error::MiniWeatherError>;
}

/// An `OutputSink` that discards every snapshot. Used when output is disabled.
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _snapshot: &OutputSnapshot) -> Result<(), crate::error::MiniWeatherError> {
        Ok(())
    }
}
