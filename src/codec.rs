//! Parameter codec: bidirectional mapping between the solver's 6-element
//! parameter vector and the primary component's named parameters.
//!
//! The vector layout depends on the solver family:
//!
//! | Family | Vector layout |
//! |---|---|
//! | `EllipticalPowerLaw` | `[theta_E, e1, e2, center_x, center_y, unused]` |
//! | `NfwElliptical` | `[theta_Rs, e1, e2, center_x, center_y, unused]` |
//! | `ShapeletCartesian` | `[unused, c10, c01, c20, c11, c02]` |
//!
//! Every family carries exactly one insensitive slot so the residual function
//! has the same 6-slot shape for all of them. The ellipticity pair `(e1, e2)`
//! is converted to the record's `(phi_G, q)` via the bijection in
//! [`crate::ellipticity`].

use serde::{Deserialize, Serialize};

use crate::ellipticity::{ellipticity_to_phi_q, phi_q_to_ellipticity};
use crate::error::SolveError;
use crate::params::ComponentParams;
use crate::Vector6;

/// Number of shapelet coefficients carried in the solver vector
/// (coefficient-list indices 1..=5; index 0 is deflection-insensitive).
const SHAPELET_SLOTS: usize = 5;

/// Closed set of primary-component families the four-point solver supports.
///
/// Selected once at solver construction; unknown model names are rejected
/// eagerly by [`SolverFamily::from_model`] rather than at first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverFamily {
    /// Elliptical power-law-like profiles: `SPEP`, `SPEMD`, `SIE`, `COMPOSITE`.
    EllipticalPowerLaw,
    /// Elliptical NFW profiles: `NFW_ELLIPSE`.
    NfwElliptical,
    /// Cartesian shapelet potentials: `SHAPELETS_CART`.
    ShapeletCartesian,
}

impl SolverFamily {
    /// Resolve a lens-model name into its solver family.
    ///
    /// Unrecognized names fail with [`SolveError::UnsupportedModel`].
    pub fn from_model(model: &str) -> Result<Self, SolveError> {
        match model {
            "SPEP" | "SPEMD" | "SIE" | "COMPOSITE" => Ok(Self::EllipticalPowerLaw),
            "NFW_ELLIPSE" => Ok(Self::NfwElliptical),
            // Both spellings appeared historically; accept either.
            "SHAPELETS_CART" | "SHAPELET_CART" => Ok(Self::ShapeletCartesian),
            other => Err(SolveError::UnsupportedModel(other.to_string())),
        }
    }

    /// Whether this family accepts the given model name.
    pub fn accepts(self, model: &str) -> bool {
        matches!(Self::from_model(model), Ok(f) if f == self)
    }

    /// Name of the radial-scale parameter (`theta_E` or `theta_Rs`) for the
    /// analytic families.
    fn radial_name(self) -> &'static str {
        match self {
            Self::NfwElliptical => "theta_Rs",
            _ => "theta_E",
        }
    }

    /// Reject records whose declared model does not belong to this family.
    fn check_model(self, primary: &ComponentParams) -> Result<(), SolveError> {
        let declared = SolverFamily::from_model(primary.model())?;
        if declared != self {
            return Err(SolveError::ModelMismatch {
                family: self,
                model: primary.model().to_string(),
            });
        }
        Ok(())
    }

    /// Write a candidate parameter vector into the primary component's record.
    ///
    /// Only the primary component's named parameters are touched. Fails
    /// (leaving the record unmodified) if the model name does not belong to
    /// this family or a required field is missing.
    pub fn decode(self, x: &Vector6, primary: &mut ComponentParams) -> Result<(), SolveError> {
        self.check_model(primary)?;
        match self {
            Self::EllipticalPowerLaw | Self::NfwElliptical => {
                let (phi, q) = ellipticity_to_phi_q(x[1], x[2]);
                primary.set_scalar(self.radial_name(), x[0]);
                primary.set_scalar("q", q);
                primary.set_scalar("phi_G", phi);
                primary.set_scalar("center_x", x[3]);
                primary.set_scalar("center_y", x[4]);
                // x[5] is the insensitive slot
                Ok(())
            }
            Self::ShapeletCartesian => {
                let existing = primary.require_coeffs("coeffs")?;
                if existing.len() < 1 + SHAPELET_SLOTS {
                    return Err(SolveError::CoefficientCount(existing.len()));
                }
                let mut coeffs = existing.to_vec();
                // Vector slot 0 mirrors the deflection-insensitive constant
                // term and is not written back.
                coeffs[1..=SHAPELET_SLOTS].copy_from_slice(&[x[1], x[2], x[3], x[4], x[5]]);
                primary.set_coeffs("coeffs", coeffs);
                Ok(())
            }
        }
    }

    /// Extract the initial parameter vector from the primary component.
    ///
    /// Inverse of [`SolverFamily::decode`] (exactly, when the ellipticity
    /// round-trip is exact). Insensitive slots are filled with zero.
    pub fn encode(self, primary: &ComponentParams) -> Result<Vector6, SolveError> {
        self.check_model(primary)?;
        match self {
            Self::EllipticalPowerLaw | Self::NfwElliptical => {
                let radial = primary.require_scalar(self.radial_name())?;
                let q = primary.require_scalar("q")?;
                let phi = primary.require_scalar("phi_G")?;
                let cx = primary.require_scalar("center_x")?;
                let cy = primary.require_scalar("center_y")?;
                let (e1, e2) = phi_q_to_ellipticity(phi, q);
                Ok(Vector6::new(radial, e1, e2, cx, cy, 0.0))
            }
            Self::ShapeletCartesian => {
                let coeffs = primary.require_coeffs("coeffs")?;
                if coeffs.len() < 1 + SHAPELET_SLOTS {
                    return Err(SolveError::CoefficientCount(coeffs.len()));
                }
                Ok(Vector6::new(
                    0.0, coeffs[1], coeffs[2], coeffs[3], coeffs[4], coeffs[5],
                ))
            }
        }
    }
}
