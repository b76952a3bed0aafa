//! External deflection-field evaluator interface.
//!
//! The four-point solver never computes deflection angles itself. Callers
//! supply an implementation of [`DeflectionField`] — typically a thin adapter
//! over a multi-component lens-model library — and the solver drives it
//! through this trait.
//!
//! Evaluations may be restricted to a single component via
//! [`ComponentSelect::Only`]; the decoupling correction relies on comparing
//! `Only(0)` against `All`.

use crate::error::SolveError;
use crate::params::ComponentParams;

/// Which lens-mass components participate in an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentSelect {
    /// Sum over every component in the record.
    All,
    /// Restrict to the single component at this index.
    Only(usize),
}

/// Multi-component deflection-field evaluator.
///
/// `xs` and `ys` are image-plane positions (angular coordinates on the sky);
/// implementations must return one deflection sample per input position, in
/// order. Evaluators are immutable during a solve and may be shared across
/// concurrent solves.
pub trait DeflectionField {
    /// Total deflection angle `(αx, αy)` at each given position, optionally
    /// restricted to a single component.
    fn deflection(
        &self,
        xs: &[f64],
        ys: &[f64],
        components: &[ComponentParams],
        select: ComponentSelect,
    ) -> Result<(Vec<f64>, Vec<f64>), SolveError>;

    /// Back-project image positions to the source plane via the lens
    /// equation `β = θ − α(θ)`.
    ///
    /// The provided implementation derives this from
    /// [`deflection`](DeflectionField::deflection); override it if the
    /// underlying library exposes ray-shooting directly.
    fn ray_shoot(
        &self,
        xs: &[f64],
        ys: &[f64],
        components: &[ComponentParams],
        select: ComponentSelect,
    ) -> Result<(Vec<f64>, Vec<f64>), SolveError> {
        let (ax, ay) = self.deflection(xs, ys, components, select)?;
        let bx = xs.iter().zip(&ax).map(|(x, a)| x - a).collect();
        let by = ys.iter().zip(&ay).map(|(y, a)| y - a).collect();
        Ok((bx, by))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Point-mass-free toy: constant deflection per component.
    struct ConstantField;

    impl DeflectionField for ConstantField {
        fn deflection(
            &self,
            xs: &[f64],
            _ys: &[f64],
            components: &[ComponentParams],
            select: ComponentSelect,
        ) -> Result<(Vec<f64>, Vec<f64>), SolveError> {
            let (ax, ay) = match select {
                ComponentSelect::All => components
                    .iter()
                    .map(|c| (c.scalar("ax").unwrap_or(0.0), c.scalar("ay").unwrap_or(0.0)))
                    .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y)),
                ComponentSelect::Only(k) => (
                    components[k].scalar("ax").unwrap_or(0.0),
                    components[k].scalar("ay").unwrap_or(0.0),
                ),
            };
            Ok((vec![ax; xs.len()], vec![ay; xs.len()]))
        }
    }

    #[test]
    fn test_ray_shoot_default_impl() {
        let components = vec![
            ComponentParams::new("CONST").with("ax", 0.25).with("ay", -0.5),
            ComponentParams::new("CONST").with("ax", 0.75).with("ay", 0.5),
        ];
        let xs = [1.0, 2.0];
        let ys = [3.0, 4.0];

        let (bx, by) = ConstantField
            .ray_shoot(&xs, &ys, &components, ComponentSelect::All)
            .unwrap();
        assert_eq!(bx, vec![0.0, 1.0]);
        assert_eq!(by, vec![3.0, 4.0]);

        let (bx, by) = ConstantField
            .ray_shoot(&xs, &ys, &components, ComponentSelect::Only(0))
            .unwrap();
        assert_eq!(bx, vec![0.75, 1.75]);
        assert_eq!(by, vec![3.5, 4.5]);
    }
}
