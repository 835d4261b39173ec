//! Fixed physical and numerical constants.
//!
//! None of these are configurable at runtime: the scheme (4th-order finite
//! volume, RK3, Strang splitting) is baked in, only the grid size, scenario
//! and run length vary. See `Config` for what *is* configurable.

/// Number of conserved variables: density, x-momentum, z-momentum, density*theta.
pub const NUM_VARS: usize = 4;
/// Index of density perturbation within a state vector.
pub const DENS: usize = 0;
/// Index of x-momentum within a state vector.
pub const UMOM: usize = 1;
/// Index of z-momentum within a state vector.
pub const WMOM: usize = 2;
/// Index of density*theta perturbation within a state vector.
pub const RHOT: usize = 3;

/// Halo width: ghost cells needed on each side for a 4-cell reconstruction stencil.
pub const HS: usize = 2;

/// Domain length in the x direction [m].
pub const XLEN: f64 = 2.0e4;
/// Domain length in the z direction [m].
pub const ZLEN: f64 = 1.0e4;

/// Gravitational acceleration [m/s^2].
pub const GRAV: f64 = 9.8;
/// Specific heat of dry air at constant pressure [J/(kg*K)].
pub const CP: f64 = 1004.0;
/// Specific heat of dry air at constant volume [J/(kg*K)].
pub const CV: f64 = 717.0;
/// Gas constant for dry air [J/(kg*K)].
pub const RD: f64 = 287.0;
/// Reference surface pressure [Pa].
pub const P0: f64 = 1.0e5;
/// p = C0 * (rho*theta)^gamma
pub const C0: f64 = 27.562_941_092_972_592_131_057_297_448_2;
/// cp / cv, the ratio of specific heats used in the equation of state above.
pub const GAMMA: f64 = 1.400_278_940_027_894_002_789_400_278_94;

/// CFL stability factor.
pub const CFL: f64 = 1.5;
/// Upper-bound wave speed used to derive the fixed time step [m/s].
pub const MAX_SPEED: f64 = 450.0;

/// Hyper-viscosity coefficient scale, default value.
pub const HV_BETA: f64 = 0.05;

/// 3-point Gauss-Legendre quadrature points on [0, 1].
pub const GLL_POINTS: [f64; 3] = [0.112_701_665_379_258_3, 0.5, 0.887_298_334_620_741_7];
/// 3-point Gauss-Legendre quadrature weights, matching `GLL_POINTS`.
pub const GLL_WEIGHTS: [f64; 3] = [0.277_777_777_777_777_8, 0.444_444_444_444_444_4, 0.277_777_777_777_777_8];
