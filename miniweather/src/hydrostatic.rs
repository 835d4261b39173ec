//! Precomputation of the hydrostatic background profile this rank's local
//! grid sits in, at cell centers and cell interfaces.

use crate::config::DataSpec;
use crate::constants::{C0, GAMMA, GLL_POINTS, GLL_WEIGHTS, HS};
use crate::scenarios::background_profile;
use crate::state::HydrostaticProfile;

/// Build the hydrostatic profile for a rank spanning local z-rows
/// `[0, nz + 2*HS)` starting at global row `k_beg` (always 0 — z is never
/// decomposed), with vertical cell size `dz`.
pub fn build(spec: DataSpec, k_beg: usize, nz: usize, dz: f64) -> HydrostaticProfile {
    let mut cell_dens = vec![0.0; nz + 2 * HS];
    let mut cell_dens_theta = vec![0.0; nz + 2 * HS];

    for (k, (dens, dens_theta)) in cell_dens.iter_mut().zip(cell_dens_theta.iter_mut()).enumerate() {
        let mut rho_acc = 0.0;
        let mut rho_theta_acc = 0.0;
        for (q, weight) in GLL_POINTS.iter().zip(GLL_WEIGHTS.iter()) {
            let z = (k_beg as f64 + k as f64 - HS as f64 + q) * dz;
            let (rho, theta) = background_profile(spec, z);
            rho_acc += weight * rho;
            rho_theta_acc += weight * rho * theta;
        }
        *dens = rho_acc;
        *dens_theta = rho_theta_acc;
    }

    let mut iface_dens = vec![0.0; nz + 1];
    let mut iface_dens_theta = vec![0.0; nz + 1];
    let mut iface_pressure = vec![0.0; nz + 1];

    for k in 0..=nz {
        let z = (k_beg + k) as f64 * dz;
        let (rho, theta) = background_profile(spec, z);
        let rho_theta = rho * theta;
        iface_dens[k] = rho;
        iface_dens_theta[k] = rho_theta;
        iface_pressure[k] = C0 * rho_theta.powf(GAMMA);
    }

    HydrostaticProfile {
        cell_dens,
        cell_dens_theta,
        iface_dens,
        iface_dens_theta,
        iface_pressure,
    }
}
