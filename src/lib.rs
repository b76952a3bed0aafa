//! # quadlens
//!
//! A **four-image gravitational-lens constraint solver**.
//!
//! Given the observed sky positions of four images produced by a single
//! background source, `quadlens` fits the six free parameters of the lens
//! model's primary (index 0) mass component so that all four images
//! back-project — via the lens equation — to the same source position.
//!
//! The deflection field itself is *not* computed here: callers plug in any
//! multi-component evaluator behind the [`DeflectionField`] trait, and the
//! solver drives it through a derivative-free nonlinear root finder.
//!
//! ## Features
//!
//! - **Three primary-component families** — elliptical power-law profiles
//!   (`SPEP`/`SPEMD`/`SIE`/`COMPOSITE`), elliptical NFW (`NFW_ELLIPSE`), and
//!   Cartesian shapelets (`SHAPELETS_CART`), dispatched through a closed enum
//!   that rejects anything else at construction time
//! - **Decoupling** — the non-primary components' deflection is folded into a
//!   correction vector computed once per solve, so solver iterations only
//!   re-evaluate the primary component
//! - **Smooth ellipticity parametrization** — the root finder works on a
//!   Cartesian `(e1, e2)` pair instead of the wrapped position angle
//! - **Honest convergence reporting** — the root finder is best-effort, and
//!   the result carries an explicit [`SolveStatus`] from an end-of-solve
//!   residual check
//!
//! ## Example
//!
//! ```
//! use quadlens::{
//!     ComponentParams, ComponentSelect, DeflectionField, FourPointSolver, QuadImages,
//!     SolveConfig, SolveError, SolveStatus,
//! };
//!
//! /// Singular isothermal sphere: α = θ_E · r̂ about the component center.
//! struct Sis;
//!
//! impl DeflectionField for Sis {
//!     fn deflection(
//!         &self,
//!         xs: &[f64],
//!         ys: &[f64],
//!         components: &[ComponentParams],
//!         _select: ComponentSelect,
//!     ) -> Result<(Vec<f64>, Vec<f64>), SolveError> {
//!         let primary = &components[0];
//!         let theta_e = primary.require_scalar("theta_E")?;
//!         let cx = primary.require_scalar("center_x")?;
//!         let cy = primary.require_scalar("center_y")?;
//!         let mut ax = Vec::with_capacity(xs.len());
//!         let mut ay = Vec::with_capacity(xs.len());
//!         for (x, y) in xs.iter().zip(ys) {
//!             let (dx, dy) = (x - cx, y - cy);
//!             let r = (dx * dx + dy * dy).sqrt().max(1e-12);
//!             ax.push(theta_e * dx / r);
//!             ay.push(theta_e * dy / r);
//!         }
//!         Ok((ax, ay))
//!     }
//! }
//!
//! # fn main() -> Result<(), SolveError> {
//! // An Einstein cross: four images on the θ_E = 1 ring
//! let images = QuadImages::new([1.0, -1.0, 0.0, 0.0], [0.0, 0.0, 1.0, -1.0]);
//! let components = vec![ComponentParams::new("SIE")
//!     .with("theta_E", 1.0)
//!     .with("q", 1.0)
//!     .with("phi_G", 0.0)
//!     .with("center_x", 0.0)
//!     .with("center_y", 0.0)];
//!
//! let solver = FourPointSolver::for_model(Sis, "SIE", false)?;
//! let result = solver.solve(&images, &components, &SolveConfig::default())?;
//!
//! assert_eq!(result.status, SolveStatus::Converged);
//! assert!(result.residual_norm < 1e-8);
//! # Ok(())
//! # }
//! ```
//!
//! ## How it works
//!
//! 1. **Encode** — the primary component's named parameters become a compact
//!    6-element vector (layout depends on the family; see [`SolverFamily`])
//! 2. **Decoupling offset** — with decoupling enabled, the differential
//!    deflection of the non-primary components is evaluated once at the
//!    nominal parameters and reduced to a fixed 6-vector
//! 3. **Root finding** — a damped Gauss–Newton iteration with a
//!    forward-difference Jacobian drives the six image-consistency equations
//!    (source-plane positions of images 2–4 differenced against image 1, on
//!    each axis) toward zero
//! 4. **Decode** — the solution vector is written back into a clone of the
//!    component record; the final residual is checked against the requested
//!    tolerance
//!
//! Four images are not a tunable: six unknowns require exactly four
//! two-dimensional image constraints reduced to six independent pairwise
//! differences. [`QuadImages`] makes the precondition explicit.

pub mod codec;
pub mod constraint;
pub mod deflection;
pub mod ellipticity;
pub mod error;
pub mod params;
pub mod root;
pub mod solve;

pub use codec::SolverFamily;
pub use constraint::{decoupling_offset, QuadImages, NUM_IMAGES};
pub use deflection::{ComponentSelect, DeflectionField};
pub use ellipticity::{ellipticity_to_phi_q, phi_q_to_ellipticity};
pub use error::SolveError;
pub use params::{ComponentParams, ParamValue};
pub use root::{find_root, RootConfig, RootSolution, DEFAULT_XTOL};
pub use solve::{FourPointSolver, SolveConfig, SolveResult, SolveStatus};

/// The solver's parameter and residual vectors are always 6-dimensional.
pub type Vector6 = nalgebra::Vector6<f64>;
