//! Named-parameter records for lens-mass components.
//!
//! A lens model is an ordered list of components, each described by a model
//! name (e.g. `"SPEP"`, `"SHEAR"`) and a set of named parameters. The solver
//! only ever *writes* the primary (index 0) component; the rest are opaque
//! data interpreted by the external deflection evaluator.
//!
//! Parameters are either scalars (`theta_E`, `q`, `phi_G`, ...) or a
//! coefficient list (`coeffs` for shapelet models).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SolveError;

/// Value of a single named parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// A single real-valued parameter.
    Scalar(f64),
    /// An ordered coefficient list (shapelet expansions).
    Coeffs(Vec<f64>),
}

/// Named-parameter record for one lens-mass component.
///
/// Construction is builder-style:
///
/// ```
/// use quadlens::ComponentParams;
///
/// let primary = ComponentParams::new("SPEP")
///     .with("theta_E", 1.2)
///     .with("q", 0.8)
///     .with("phi_G", 0.3)
///     .with("center_x", 0.01)
///     .with("center_y", -0.02);
/// assert_eq!(primary.scalar("q"), Some(0.8));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentParams {
    model: String,
    values: BTreeMap<String, ParamValue>,
}

impl ComponentParams {
    /// Create an empty record for the given model name.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            values: BTreeMap::new(),
        }
    }

    /// Model name this record was declared with.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Builder-style scalar insertion.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), ParamValue::Scalar(value));
        self
    }

    /// Builder-style coefficient-list insertion.
    pub fn with_coeffs(mut self, name: impl Into<String>, coeffs: Vec<f64>) -> Self {
        self.values.insert(name.into(), ParamValue::Coeffs(coeffs));
        self
    }

    /// Look up a scalar parameter. Returns `None` if absent or not a scalar.
    pub fn scalar(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ParamValue::Scalar(v)) => Some(*v),
            _ => None,
        }
    }

    /// Look up a coefficient list. Returns `None` if absent or not a list.
    pub fn coeffs(&self, name: &str) -> Option<&[f64]> {
        match self.values.get(name) {
            Some(ParamValue::Coeffs(c)) => Some(c.as_slice()),
            _ => None,
        }
    }

    /// Set (or overwrite) a scalar parameter in place.
    pub fn set_scalar(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), ParamValue::Scalar(value));
    }

    /// Set (or overwrite) a coefficient list in place.
    pub fn set_coeffs(&mut self, name: impl Into<String>, coeffs: Vec<f64>) {
        self.values.insert(name.into(), ParamValue::Coeffs(coeffs));
    }

    /// Fetch a scalar parameter, failing fast if it is absent or the wrong kind.
    pub fn require_scalar(&self, name: &'static str) -> Result<f64, SolveError> {
        match self.values.get(name) {
            Some(ParamValue::Scalar(v)) => Ok(*v),
            Some(ParamValue::Coeffs(_)) => Err(SolveError::WrongParameterKind {
                model: self.model.clone(),
                name,
                expected: "scalar",
            }),
            None => Err(SolveError::MissingParameter {
                model: self.model.clone(),
                name,
            }),
        }
    }

    /// Fetch a coefficient list, failing fast if it is absent or the wrong kind.
    pub fn require_coeffs(&self, name: &'static str) -> Result<&[f64], SolveError> {
        match self.values.get(name) {
            Some(ParamValue::Coeffs(c)) => Ok(c.as_slice()),
            Some(ParamValue::Scalar(_)) => Err(SolveError::WrongParameterKind {
                model: self.model.clone(),
                name,
                expected: "coefficient list",
            }),
            None => Err(SolveError::MissingParameter {
                model: self.model.clone(),
                name,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_accessors() {
        let p = ComponentParams::new("SIE")
            .with("theta_E", 1.5)
            .with_coeffs("coeffs", vec![0.0, 1.0, 2.0]);

        assert_eq!(p.model(), "SIE");
        assert_eq!(p.scalar("theta_E"), Some(1.5));
        assert_eq!(p.coeffs("coeffs"), Some(&[0.0, 1.0, 2.0][..]));

        // Wrong-kind lookups return None from the soft accessors
        assert_eq!(p.scalar("coeffs"), None);
        assert_eq!(p.coeffs("theta_E"), None);
    }

    #[test]
    fn test_require_scalar_missing() {
        let p = ComponentParams::new("SPEP").with("theta_E", 1.0);
        let err = p.require_scalar("center_x").unwrap_err();
        match err {
            SolveError::MissingParameter { model, name } => {
                assert_eq!(model, "SPEP");
                assert_eq!(name, "center_x");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_require_scalar_wrong_kind() {
        let p = ComponentParams::new("SHAPELETS_CART").with_coeffs("coeffs", vec![0.0; 6]);
        assert!(matches!(
            p.require_coeffs("coeffs"),
            Ok(c) if c.len() == 6
        ));
        assert!(matches!(
            p.require_scalar("coeffs"),
            Err(SolveError::WrongParameterKind { .. })
        ));
    }

    #[test]
    fn test_set_overwrites() {
        let mut p = ComponentParams::new("SPEP").with("theta_E", 1.0);
        p.set_scalar("theta_E", 2.0);
        assert_eq!(p.scalar("theta_E"), Some(2.0));
    }
}
