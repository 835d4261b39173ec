use serde::{Deserialize, Serialize};

use crate::constants::{HV_BETA, XLEN, ZLEN};
use crate::error::MiniWeatherError;

/// Which closed-form scenario seeds the initial condition.
///
/// Numeric values match the original `data_spec` convention: 1=collision,
/// 2=thermal, 3=gravity_waves, 5=density_current, 6=injection. The value 4
/// is intentionally absent — some upstream scenario tables reserve it but
/// never define it, so it is treated as a configuration error here too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSpec {
    Collision,
    Thermal,
    GravityWaves,
    DensityCurrent,
    Injection,
}

impl DataSpec {
    pub fn from_code(code: u32) -> Result<Self, MiniWeatherError> {
        match code {
            1 => Ok(Self::Collision),
            2 => Ok(Self::Thermal),
            3 => Ok(Self::GravityWaves),
            5 => Ok(Self::DensityCurrent),
            6 => Ok(Self::Injection),
            other => Err(MiniWeatherError::Config {
                message: format!("unknown data_spec {other} (expected one of 1, 2, 3, 5, 6)"),
            }),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Collision => 1,
            Self::Thermal => 2,
            Self::GravityWaves => 3,
            Self::DensityCurrent => 5,
            Self::Injection => 6,
        }
    }
}

/// Validated run configuration: everything needed to build a [`crate::Simulation`]
/// other than the rank's slice of the [`crate::topology::Topology`] ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Global number of cells in x. Recommended `nx_glob` ~= `2 * nz_glob`.
    pub nx_glob: usize,
    /// Global number of cells in z.
    pub nz_glob: usize,
    /// Simulated seconds to run for.
    pub sim_time: f64,
    /// Seconds between output snapshots; negative disables output entirely.
    pub output_freq: f64,
    /// Which scenario seeds the initial condition.
    pub data_spec: DataSpec,
    /// Number of simulated ranks (OS threads standing in for MPI ranks).
    #[serde(default = "default_nranks")]
    pub nranks: usize,
    /// Hyper-viscosity coefficient scale.
    #[serde(default = "default_hv_beta")]
    pub hv_beta: f64,
    /// Fail fast on the first non-finite cell value at a step boundary,
    /// rather than silently propagating it (the spec's optional production
    /// safeguard; the CFL+hyper-viscosity combination is assumed stable
    /// by default).
    #[serde(default = "default_check_finite")]
    pub check_finite: bool,
}

fn default_nranks() -> usize {
    1
}

fn default_hv_beta() -> f64 {
    HV_BETA
}

fn default_check_finite() -> bool {
    false
}

impl Config {
    /// Validate the configuration, returning the grid cell sizes on success.
    ///
    /// Checked here rather than in `Simulation::new` so a bad config is
    /// caught before any rank thread is spawned (the "abort all ranks after
    /// a synchronization barrier" requirement from the error-handling design
    /// — with no rank started yet, there is nothing to straggle).
    pub fn validate(&self) -> Result<(f64, f64), MiniWeatherError> {
        if self.nx_glob == 0 || self.nz_glob == 0 {
            return Err(MiniWeatherError::Config {
                message: format!(
                    "grid extents must be positive, got nx_glob={}, nz_glob={}",
                    self.nx_glob, self.nz_glob
                ),
            });
        }
        if !(self.sim_time.is_finite() && self.sim_time > 0.0) {
            return Err(MiniWeatherError::Config {
                message: format!("sim_time must be finite and positive, got {}", self.sim_time),
            });
        }
        if !self.output_freq.is_finite() {
            return Err(MiniWeatherError::Config {
                message: format!("output_freq must be finite, got {}", self.output_freq),
            });
        }
        if self.nranks == 0 {
            return Err(MiniWeatherError::RankLayout {
                message: "nranks must be at least 1".to_string(),
            });
        }
        if self.nranks > self.nx_glob {
            return Err(MiniWeatherError::RankLayout {
                message: format!(
                    "nranks ({}) exceeds nx_glob ({}); every rank needs at least one column",
                    self.nranks, self.nx_glob
                ),
            });
        }

        let dx = XLEN / self.nx_glob as f64;
        let dz = ZLEN / self.nz_glob as f64;
        Ok((dx, dz))
    }
}
