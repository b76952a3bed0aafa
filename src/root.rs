//! Derivative-free root finding for the six-equation constraint system.
//!
//! The residual's Jacobian is not available analytically (the deflection
//! field is an external black box), so the finder builds a forward-difference
//! Jacobian and takes damped Gauss–Newton steps: solve
//! `(JᵀJ + λI)·δ = −Jᵀr`, accept the step if the residual norm drops,
//! otherwise raise λ and retry. The identity damping also absorbs the rank
//! deficiency introduced by each family's deliberately insensitive vector
//! slot — the step simply has a zero component along any null direction.
//!
//! The iteration is best-effort, like the classic MINPACK hybrid solver it
//! replaces: stalling never raises. Callers inspect the returned residual if
//! they need a convergence guarantee.

use nalgebra::Matrix6;
use tracing::trace;

use crate::error::SolveError;
use crate::Vector6;

/// Historic MINPACK/fsolve default for the relative step tolerance.
pub const DEFAULT_XTOL: f64 = 1.49012e-10;

/// Tuning knobs for the root finder.
#[derive(Debug, Clone)]
pub struct RootConfig {
    /// Relative step-size tolerance: the iteration stops once an accepted
    /// step satisfies `‖δ‖ ≤ xtol·(‖x‖ + xtol)`.
    pub xtol: f64,
    /// Maximum number of outer (Jacobian) iterations.
    pub max_iterations: u32,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            xtol: DEFAULT_XTOL,
            max_iterations: 100,
        }
    }
}

/// Final iterate of a root-finding run.
#[derive(Debug, Clone)]
pub struct RootSolution {
    /// Final parameter vector (best-effort if the iteration stalled).
    pub x: Vector6,
    /// Residual at `x`.
    pub residual: Vector6,
    /// Outer iterations performed.
    pub iterations: u32,
    /// Whether the iteration terminated by its own step criterion.
    /// Note this does *not* certify a small residual.
    pub step_converged: bool,
}

/// Forward-difference Jacobian of `f` at `x`, reusing the residual `r0`
/// already evaluated there. Step size is `√ε·max(|xᵢ|, 1)` per column.
fn forward_jacobian<F>(f: &mut F, x: &Vector6, r0: &Vector6) -> Result<Matrix6<f64>, SolveError>
where
    F: FnMut(&Vector6) -> Result<Vector6, SolveError>,
{
    let sqrt_eps = f64::EPSILON.sqrt();
    let mut jac = Matrix6::zeros();
    for col in 0..6 {
        let h = sqrt_eps * x[col].abs().max(1.0);
        let mut xh = *x;
        xh[col] += h;
        let rh = f(&xh)?;
        jac.set_column(col, &((rh - r0) / h));
    }
    Ok(jac)
}

/// Drive `f` toward zero from `x0` using damped Gauss–Newton iterations.
///
/// Errors from `f` (evaluator failures, codec errors) propagate immediately;
/// numerical stalls do not — the last iterate is returned with
/// `step_converged = false`.
pub fn find_root<F>(mut f: F, x0: Vector6, config: &RootConfig) -> Result<RootSolution, SolveError>
where
    F: FnMut(&Vector6) -> Result<Vector6, SolveError>,
{
    const LAMBDA_INIT: f64 = 1e-3;
    const LAMBDA_MIN: f64 = 1e-12;
    const LAMBDA_MAX: f64 = 1e12;

    let mut x = x0;
    let mut r = f(&x)?;
    let mut lambda = LAMBDA_INIT;
    let mut step_converged = false;
    let mut iterations = 0u32;

    for iter in 0..config.max_iterations {
        iterations = iter + 1;

        // Already at a root (within floating noise): nothing to do.
        if r.norm() <= 1e-15 {
            step_converged = true;
            break;
        }

        let jac = forward_jacobian(&mut f, &x, &r)?;
        let grad = jac.transpose() * &r;
        let hess = jac.transpose() * jac;

        let mut accepted = false;
        while lambda <= LAMBDA_MAX {
            let damped = hess + Matrix6::identity() * lambda;
            let step = match damped.lu().solve(&(-grad)) {
                Some(s) => s,
                None => {
                    lambda *= 10.0;
                    continue;
                }
            };

            let trial = x + step;
            let r_trial = f(&trial)?;

            // NaN norms compare false, so a non-finite trial is rejected.
            if r_trial.norm() < r.norm() {
                trace!(
                    "iter {}: accepted step |δ|={:.3e}, residual {:.3e} → {:.3e}, λ={:.1e}",
                    iter,
                    step.norm(),
                    r.norm(),
                    r_trial.norm(),
                    lambda,
                );
                let small = step.norm() <= config.xtol * (x.norm() + config.xtol);
                x = trial;
                r = r_trial;
                lambda = (lambda * 0.25).max(LAMBDA_MIN);
                accepted = true;
                if small {
                    step_converged = true;
                }
                break;
            }
            lambda *= 10.0;
        }

        if step_converged {
            break;
        }
        if !accepted {
            // Stalled: no damping level improves the residual. Best-effort
            // return of the current iterate.
            trace!("iter {}: stalled at residual {:.3e}", iter, r.norm());
            break;
        }
    }

    Ok(RootSolution {
        x,
        residual: r,
        iterations,
        step_converged,
    })
}
