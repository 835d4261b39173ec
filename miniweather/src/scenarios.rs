//! Closed-form initial-condition scenarios.
//!
//! Each scenario is a pure function of physical (x, z) returning a
//! perturbation from, and the value of, the hydrostatic background. The
//! background itself only depends on z and is shared by the cell-averaging
//! and the hydrostatic-profile precomputation (`hydrostatic.rs`).

use std::f64::consts::PI;

use crate::config::DataSpec;
use crate::constants::{CP, GAMMA, GRAV, P0, RD, XLEN, C0};

/// Brunt-Vaisala frequency used by the gravity_waves base profile [1/s].
const BVFREQ_GRAVITY_WAVES: f64 = 0.02;
/// Reference surface potential temperature for the constant-theta profile [K].
const THETA0: f64 = 300.0;
/// Uniform background wind for the gravity_waves scenario [m/s].
const GRAVITY_WAVES_U: f64 = 15.0;

/// The gravity_waves scenario's localized vertical-velocity forcing, a
/// single elliptical cosine bump independent of the initial condition,
/// added to the WMOM tendency every substage.
const GRAVITY_WAVES_FORCING: Bump = Bump {
    amp: 0.01,
    x0: XLEN / 8.0,
    z0: 1000.0,
    xrad: 500.0,
    zrad: 500.0,
};

/// Vertical-velocity perturbation injected by the gravity_waves scenario's
/// standing forcing at physical point (x, z); zero for every other scenario.
pub fn gravity_waves_wpert(spec: DataSpec, x: f64, z: f64) -> f64 {
    match spec {
        DataSpec::GravityWaves => elliptical_cosine_bump(x, z, &GRAVITY_WAVES_FORCING),
        _ => 0.0,
    }
}

struct Bump {
    amp: f64,
    x0: f64,
    z0: f64,
    xrad: f64,
    zrad: f64,
}

/// amp * cos^2(d*pi/2) for d <= 1, else 0, where d is the elliptical
/// distance of (x, z) from (x0, z0) scaled by (xrad, zrad).
fn elliptical_cosine_bump(x: f64, z: f64, bump: &Bump) -> f64 {
    let dx = (x - bump.x0) / bump.xrad;
    let dz = (z - bump.z0) / bump.zrad;
    let d = (dx * dx + dz * dz).sqrt();
    if d <= 1.0 {
        bump.amp * (d * PI / 2.0).cos().powi(2)
    } else {
        0.0
    }
}

fn bumps_for(spec: DataSpec) -> &'static [Bump] {
    match spec {
        DataSpec::Thermal => &[Bump {
            amp: 3.0,
            x0: XLEN / 2.0,
            z0: 2000.0,
            xrad: 2000.0,
            zrad: 2000.0,
        }],
        DataSpec::Collision => &[
            Bump {
                amp: 20.0,
                x0: XLEN / 2.0,
                z0: 2000.0,
                xrad: 2000.0,
                zrad: 2000.0,
            },
            Bump {
                amp: -20.0,
                x0: XLEN / 2.0,
                z0: 8000.0,
                xrad: 2000.0,
                zrad: 2000.0,
            },
        ],
        DataSpec::DensityCurrent => &[Bump {
            amp: -20.0,
            x0: XLEN / 2.0,
            z0: 5000.0,
            xrad: 4000.0,
            zrad: 2000.0,
        }],
        DataSpec::GravityWaves | DataSpec::Injection => &[],
    }
}

/// Hydrostatic background (rho_bkg, theta_bkg) at height z, analytically
/// solved from vertical force balance. Does not depend on x.
pub fn background_profile(spec: DataSpec, z: f64) -> (f64, f64) {
    match spec {
        DataSpec::GravityWaves => const_bvfreq_profile(z, BVFREQ_GRAVITY_WAVES),
        DataSpec::Thermal | DataSpec::Collision | DataSpec::DensityCurrent | DataSpec::Injection => {
            const_theta_profile(z)
        }
    }
}

fn const_theta_profile(z: f64) -> (f64, f64) {
    let exner = 1.0 - GRAV * z / (CP * THETA0);
    let p = P0 * exner.powf(CP / RD);
    let rho_theta = (p / C0).powf(1.0 / GAMMA);
    let rho = rho_theta / THETA0;
    (rho, THETA0)
}

fn const_bvfreq_profile(z: f64, bvfreq: f64) -> (f64, f64) {
    let theta = THETA0 * (bvfreq * bvfreq * z / GRAV).exp();
    let exner = 1.0 - (GRAV * GRAV) / (CP * bvfreq * bvfreq) * (theta - THETA0) / (theta * THETA0);
    let p = P0 * exner.powf(CP / RD);
    let rho_theta = (p / C0).powf(1.0 / GAMMA);
    let rho = rho_theta / theta;
    (rho, theta)
}

/// A single sample of the initial condition at physical point (x, z):
/// background (rho_bkg, theta_bkg) and perturbation (rho_pert, u, w,
/// theta_pert).
pub struct Sample {
    pub rho_bkg: f64,
    pub theta_bkg: f64,
    pub rho_pert: f64,
    pub u: f64,
    pub w: f64,
    pub theta_pert: f64,
}

pub fn sample(spec: DataSpec, x: f64, z: f64) -> Sample {
    let (rho_bkg, theta_bkg) = background_profile(spec, z);
    let mut theta_pert = 0.0;
    for bump in bumps_for(spec) {
        theta_pert += elliptical_cosine_bump(x, z, bump);
    }
    let u = match spec {
        DataSpec::GravityWaves => GRAVITY_WAVES_U,
        _ => 0.0,
    };
    Sample {
        rho_bkg,
        theta_bkg,
        rho_pert: 0.0,
        u,
        w: 0.0,
        theta_pert,
    }
}
