//! Four-point solve orchestration.
//!
//! [`FourPointSolver`] ties the pieces together: encode the initial guess
//! from the primary component, compute the decoupling offset once, drive the
//! root finder over the residual builder, then decode the final vector into a
//! clone of the caller's record. The caller's own record is never written.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::SolverFamily;
use crate::constraint::{decoupling_offset, residual, QuadImages};
use crate::deflection::DeflectionField;
use crate::error::SolveError;
use crate::params::ComponentParams;
use crate::root::{find_root, RootConfig, DEFAULT_XTOL};
use crate::Vector6;

// ── Configuration ───────────────────────────────────────────────────────────

/// Tolerances for one solve call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveConfig {
    /// Relative step-size tolerance handed to the root finder.
    /// Default `1.49012e-10` (the historic MINPACK/fsolve default).
    pub xtol: f64,
    /// Residual-norm threshold for reporting [`SolveStatus::Converged`].
    /// Default `1e-8`.
    pub residual_tol: f64,
    /// Maximum root-finder iterations. Default 100.
    pub max_iterations: u32,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            xtol: DEFAULT_XTOL,
            residual_tol: 1e-8,
            max_iterations: 100,
        }
    }
}

// ── Result ──────────────────────────────────────────────────────────────────

/// Outcome classification of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The final residual norm is within `residual_tol`.
    Converged,
    /// The root finder returned a best-effort iterate whose residual exceeds
    /// `residual_tol`. The parameters are still the best found.
    NotConverged,
}

/// Result of a four-point solve.
#[derive(Debug, Clone)]
pub struct SolveResult {
    /// Updated component record: a clone of the input with the primary
    /// component's parameters replaced by the solution.
    pub components: Vec<ComponentParams>,
    /// Final solver-space parameter vector.
    pub vector: Vector6,
    /// Final residual (six reference-differenced source-plane offsets).
    pub residual: Vector6,
    /// Euclidean norm of the final residual.
    pub residual_norm: f64,
    /// Root-finder iterations performed.
    pub iterations: u32,
    /// Whether the residual met the requested tolerance.
    pub status: SolveStatus,
}

// ── Solver ──────────────────────────────────────────────────────────────────

/// Fits the six free parameters of the primary lens-mass component so that
/// four observed image positions back-project to one source position.
///
/// The solver family, deflection evaluator, and decoupling flag are fixed at
/// construction. A single instance may serve concurrent solves: each call
/// works on its own scratch copy of the component record.
#[derive(Debug, Clone)]
pub struct FourPointSolver<E> {
    evaluator: E,
    family: SolverFamily,
    decoupling: bool,
}

impl<E: DeflectionField> FourPointSolver<E> {
    /// Create a solver for a known family.
    pub fn new(evaluator: E, family: SolverFamily, decoupling: bool) -> Self {
        Self {
            evaluator,
            family,
            decoupling,
        }
    }

    /// Create a solver from a primary-component model name, rejecting
    /// unsupported names eagerly.
    pub fn for_model(evaluator: E, model: &str, decoupling: bool) -> Result<Self, SolveError> {
        Ok(Self::new(
            evaluator,
            SolverFamily::from_model(model)?,
            decoupling,
        ))
    }

    /// Family this solver was constructed for.
    pub fn family(&self) -> SolverFamily {
        self.family
    }

    /// Whether non-primary components are held fixed via the decoupling
    /// approximation.
    pub fn decoupling(&self) -> bool {
        self.decoupling
    }

    /// Borrow the underlying deflection evaluator.
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Solve for the primary component's parameters.
    ///
    /// `components` supplies both the nominal parameters (initial guess and
    /// decoupling reference) and the fixed non-primary components. The
    /// returned record is a clone with the primary entry updated.
    ///
    /// Structural problems (unknown or mismatched family, missing fields)
    /// are hard errors. Numerical non-convergence is not: check
    /// [`SolveResult::status`].
    pub fn solve(
        &self,
        images: &QuadImages,
        components: &[ComponentParams],
        config: &SolveConfig,
    ) -> Result<SolveResult, SolveError> {
        let primary = components.first().ok_or(SolveError::EmptyRecord)?;
        let x0 = self.family.encode(primary)?;

        // Non-primary influence, frozen at the nominal parameters.
        let offset = decoupling_offset(&self.evaluator, images, components, self.decoupling)?;

        debug!(
            "4-point solve: family {:?}, decoupling {}, x0 = {:?}",
            self.family,
            self.decoupling,
            x0.as_slice(),
        );

        let mut scratch = components.to_vec();
        let root_config = RootConfig {
            xtol: config.xtol,
            max_iterations: config.max_iterations,
        };
        let solution = find_root(
            |x| {
                residual(
                    &self.evaluator,
                    self.family,
                    images,
                    x,
                    &mut scratch,
                    &offset,
                    self.decoupling,
                )
            },
            x0,
            &root_config,
        )?;

        let mut updated = components.to_vec();
        self.family.decode(&solution.x, &mut updated[0])?;

        let residual_norm = solution.residual.norm();
        let status = if residual_norm <= config.residual_tol {
            SolveStatus::Converged
        } else {
            SolveStatus::NotConverged
        };
        debug!(
            "4-point solve done: {} iterations, residual {:.3e}, {:?}",
            solution.iterations, residual_norm, status,
        );

        Ok(SolveResult {
            components: updated,
            vector: solution.x,
            residual: solution.residual,
            residual_norm,
            iterations: solution.iterations,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deflection::ComponentSelect;

    /// Singular isothermal sphere centered on (center_x, center_y); every
    /// non-primary component is ignored.
    struct SisField;

    impl DeflectionField for SisField {
        fn deflection(
            &self,
            xs: &[f64],
            ys: &[f64],
            components: &[ComponentParams],
            _select: ComponentSelect,
        ) -> Result<(Vec<f64>, Vec<f64>), SolveError> {
            let primary = &components[0];
            let theta_e = primary.require_scalar("theta_E")?;
            let cx = primary.require_scalar("center_x")?;
            let cy = primary.require_scalar("center_y")?;
            let mut ax = Vec::with_capacity(xs.len());
            let mut ay = Vec::with_capacity(xs.len());
            for (x, y) in xs.iter().zip(ys) {
                let dx = x - cx;
                let dy = y - cy;
                let r = (dx * dx + dy * dy).sqrt().max(1e-12);
                ax.push(theta_e * dx / r);
                ay.push(theta_e * dy / r);
            }
            Ok((ax, ay))
        }
    }

    fn sie_record(theta_e: f64, cx: f64, cy: f64) -> ComponentParams {
        ComponentParams::new("SIE")
            .with("theta_E", theta_e)
            .with("q", 1.0)
            .with("phi_G", 0.0)
            .with("center_x", cx)
            .with("center_y", cy)
    }

    #[test]
    fn test_symmetric_cross_is_self_consistent() {
        // Circular theta_E = 1 lens with images on the Einstein ring: the
        // nominal guess already zeroes the constraint.
        let images = QuadImages::new([1.0, -1.0, 0.0, 0.0], [0.0, 0.0, 1.0, -1.0]);
        let components = vec![sie_record(1.0, 0.0, 0.0)];
        let solver = FourPointSolver::new(SisField, SolverFamily::EllipticalPowerLaw, false);

        let result = solver.solve(&images, &components, &SolveConfig::default()).unwrap();
        assert_eq!(result.status, SolveStatus::Converged);
        assert!(result.residual_norm < 1e-8, "residual {:.3e}", result.residual_norm);
        assert!((result.components[0].scalar("theta_E").unwrap() - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_caller_record_never_mutated() {
        let images = QuadImages::new([1.0, -1.0, 0.0, 0.0], [0.0, 0.0, 1.0, -1.0]);
        let components = vec![sie_record(0.9, 0.02, -0.01)];
        let before = components.clone();
        let solver = FourPointSolver::new(SisField, SolverFamily::EllipticalPowerLaw, false);

        let _ = solver.solve(&images, &components, &SolveConfig::default()).unwrap();
        assert_eq!(components, before);
    }

    #[test]
    fn test_empty_record() {
        let images = QuadImages::new([1.0, -1.0, 0.0, 0.0], [0.0, 0.0, 1.0, -1.0]);
        let solver = FourPointSolver::new(SisField, SolverFamily::EllipticalPowerLaw, false);
        assert!(matches!(
            solver.solve(&images, &[], &SolveConfig::default()),
            Err(SolveError::EmptyRecord)
        ));
    }

    #[test]
    fn test_for_model_rejects_unknown() {
        assert!(matches!(
            FourPointSolver::for_model(SisField, "POINT_MASS", true),
            Err(SolveError::UnsupportedModel(_))
        ));
        let solver = FourPointSolver::for_model(SisField, "SPEMD", true).unwrap();
        assert_eq!(solver.family(), SolverFamily::EllipticalPowerLaw);
        assert!(solver.decoupling());
    }

    #[test]
    fn test_family_mismatch_is_hard_error() {
        let images = QuadImages::new([1.0, -1.0, 0.0, 0.0], [0.0, 0.0, 1.0, -1.0]);
        let components = vec![sie_record(1.0, 0.0, 0.0)];
        let solver = FourPointSolver::new(SisField, SolverFamily::NfwElliptical, false);
        assert!(matches!(
            solver.solve(&images, &components, &SolveConfig::default()),
            Err(SolveError::ModelMismatch { .. })
        ));
    }
}
