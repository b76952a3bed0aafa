//! Ellipticity-angle parametrization.
//!
//! The solver works on a Cartesian ellipticity pair `(e1, e2)` so that the
//! root finder sees a smooth, unbounded parametrization, while lens-model
//! records carry the physical position angle `phi` and axis ratio `q`.
//!
//! The mapping is
//!
//! ```text
//! e1 = (1 - q)/(1 + q) · cos(2φ)
//! e2 = (1 - q)/(1 + q) · sin(2φ)
//! ```
//!
//! which is a bijection for `q ∈ (0, 1]`, `φ ∈ [0, π)` onto the open unit
//! disk. The inverse is only meaningful for `√(e1² + e2²) < 1`; no clamping
//! is applied.

/// Convert position angle `phi` (radians) and axis ratio `q` to the
/// Cartesian ellipticity pair `(e1, e2)`.
#[inline]
pub fn phi_q_to_ellipticity(phi: f64, q: f64) -> (f64, f64) {
    let m = (1.0 - q) / (1.0 + q);
    (m * (2.0 * phi).cos(), m * (2.0 * phi).sin())
}

/// Convert a Cartesian ellipticity pair `(e1, e2)` back to position angle
/// `phi ∈ (-π/2, π/2]` and axis ratio `q`.
#[inline]
pub fn ellipticity_to_phi_q(e1: f64, e2: f64) -> (f64, f64) {
    let phi = e2.atan2(e1) / 2.0;
    let r = (e1 * e1 + e2 * e2).sqrt();
    let q = (1.0 - r) / (1.0 + r);
    (phi, q)
}
