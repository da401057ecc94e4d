/// Default convergence threshold on the Newton step length, in grid pixels.
pub const DEFAULT_STEP_TOLERANCE: f64 = 1e-6;

/// Default iteration budget for Newton refinement.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Default Gaussian width (pixels) of the correlation template.
pub const DEFAULT_SPOT_SIGMA: f64 = 2.0;

/// Default iteration budget for the Gaussian spot maximizer.
pub const DEFAULT_SPOT_MAX_ITERATIONS: usize = 100;

/// Default relative objective change at which the spot maximizer stops.
pub const DEFAULT_SPOT_TOLERANCE: f64 = 1e-6;

/// Absolute tolerance below which a re-queried fitter position counts as unchanged.
pub const POSITION_TOLERANCE: f64 = 1e-9;

/// Initial Levenberg-Marquardt damping factor.
pub const LM_INITIAL_LAMBDA: f64 = 1.0;

/// Damping growth on a rejected step.
pub const LM_LAMBDA_UP: f64 = 2.0;

/// Damping decay on an accepted step.
pub const LM_LAMBDA_DOWN: f64 = 0.9;
