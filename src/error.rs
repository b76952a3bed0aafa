//! Error types for the four-point solver.
//!
//! Structural problems (unknown model family, missing named parameters, wrong
//! image counts) are hard errors and always surface to the caller. Numerical
//! non-convergence is deliberately *not* an error: the root finder is
//! best-effort, and [`SolveResult::status`](crate::SolveResult) reports whether
//! the final residual met the requested tolerance.

use thiserror::Error;

/// Errors raised by the four-point solver and its parameter codec.
#[derive(Debug, Clone, Error)]
pub enum SolveError {
    /// The primary component's model name is not one of the recognized
    /// solver families.
    #[error("lens model `{0}` is not supported by the 4-point solver")]
    UnsupportedModel(String),

    /// The primary component's model belongs to a recognized family, but not
    /// the one this solver was constructed for.
    #[error("solver family {family:?} does not accept primary lens model `{model}`")]
    ModelMismatch {
        /// Family the solver was constructed for.
        family: crate::SolverFamily,
        /// Model name declared by the primary component.
        model: String,
    },

    /// The component record holds no entries, so there is no primary
    /// component to fit.
    #[error("component record is empty; a primary component is required")]
    EmptyRecord,

    /// The image-position arrays did not contain exactly four entries.
    #[error("expected exactly 4 image positions, got {0}")]
    ImageCount(usize),

    /// A component record is missing a named parameter its family requires.
    #[error("lens model `{model}` is missing required parameter `{name}`")]
    MissingParameter {
        /// Model name of the offending component.
        model: String,
        /// Name of the absent parameter.
        name: &'static str,
    },

    /// A named parameter exists but holds the wrong kind of value
    /// (scalar where a coefficient list is required, or vice versa).
    #[error("lens model `{model}`: parameter `{name}` has the wrong kind (expected {expected})")]
    WrongParameterKind {
        /// Model name of the offending component.
        model: String,
        /// Name of the offending parameter.
        name: &'static str,
        /// Human-readable expected kind.
        expected: &'static str,
    },

    /// A shapelet coefficient list is too short to carry the solver vector.
    #[error("shapelet coefficient list needs at least 6 entries, got {0}")]
    CoefficientCount(usize),

    /// The external deflection evaluator reported a failure.
    #[error("deflection evaluator: {0}")]
    Evaluator(String),
}
