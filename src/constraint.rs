//! Constraint construction: image positions, decoupling correction, and the
//! six-equation residual.
//!
//! Four two-dimensional image positions give eight constraints on the source
//! position; differencing images 2–4 against image 1 on each axis removes the
//! (unknown) common source point and leaves six independent equations — the
//! square system the root finder needs for six unknowns. This 4-image/6-slot
//! structure is a domain constraint, not a tunable.
//!
//! The decoupling correction captures the non-primary components' influence
//! once, at the nominal parameters, so that solver iterations only ever
//! re-evaluate the primary component.

use tracing::debug;

use crate::codec::SolverFamily;
use crate::deflection::{ComponentSelect, DeflectionField};
use crate::error::SolveError;
use crate::params::ComponentParams;
use crate::Vector6;

/// Number of lensed images the solver is built around.
pub const NUM_IMAGES: usize = 4;

/// The four observed image positions of one lensed source.
///
/// Image 0 is the reference against which images 1–3 are differenced.
/// Ordering is significant and fixed for the duration of a solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadImages {
    /// x (first sky axis) coordinate of each image.
    pub x: [f64; NUM_IMAGES],
    /// y (second sky axis) coordinate of each image.
    pub y: [f64; NUM_IMAGES],
}

impl QuadImages {
    /// Construct from per-axis coordinate arrays.
    pub fn new(x: [f64; NUM_IMAGES], y: [f64; NUM_IMAGES]) -> Self {
        Self { x, y }
    }

    /// Construct from slices, failing with [`SolveError::ImageCount`] unless
    /// both hold exactly four entries.
    pub fn from_slices(x: &[f64], y: &[f64]) -> Result<Self, SolveError> {
        if x.len() != NUM_IMAGES {
            return Err(SolveError::ImageCount(x.len()));
        }
        if y.len() != NUM_IMAGES {
            return Err(SolveError::ImageCount(y.len()));
        }
        let mut img = Self::new([0.0; NUM_IMAGES], [0.0; NUM_IMAGES]);
        img.x.copy_from_slice(x);
        img.y.copy_from_slice(y);
        Ok(img)
    }
}

/// Reduce per-image values to the six reference-differenced slots:
/// `out[j-1] = v_x[0] - v_x[j]`, `out[j+2] = v_y[0] - v_y[j]` for `j = 1..4`.
fn difference_against_reference(vx: &[f64], vy: &[f64]) -> Vector6 {
    let mut out = Vector6::zeros();
    for j in 1..NUM_IMAGES {
        out[j - 1] = vx[0] - vx[j];
        out[j + 2] = vy[0] - vy[j];
    }
    out
}

/// Compute the decoupling correction vector.
///
/// With decoupling enabled, the per-image source term is
/// `alpha(primary only) - alpha(all components)` — the negative of the
/// combined non-primary deflection — evaluated once at the nominal
/// parameters. It is reduced with the same reference-differencing as the
/// residual so that it cancels the non-primary contribution to the
/// image-to-image differences. With decoupling disabled the correction is
/// identically zero.
pub fn decoupling_offset<E: DeflectionField>(
    evaluator: &E,
    images: &QuadImages,
    components: &[ComponentParams],
    decoupling: bool,
) -> Result<Vector6, SolveError> {
    if !decoupling {
        return Ok(Vector6::zeros());
    }

    let (full_x, full_y) =
        evaluator.deflection(&images.x, &images.y, components, ComponentSelect::All)?;
    let (prim_x, prim_y) =
        evaluator.deflection(&images.x, &images.y, components, ComponentSelect::Only(0))?;

    let sub_x: Vec<f64> = prim_x.iter().zip(&full_x).map(|(p, f)| p - f).collect();
    let sub_y: Vec<f64> = prim_y.iter().zip(&full_y).map(|(p, f)| p - f).collect();

    // Same difference structure as the residual, negated: a = -(sub_0 - sub_j)
    let offset = -difference_against_reference(&sub_x, &sub_y);
    debug!("decoupling offset: {:?}", offset.as_slice());
    Ok(offset)
}

/// Evaluate the six-equation residual for a candidate parameter vector.
///
/// Decodes `x` into the primary entry of `scratch` (a per-solve copy of the
/// caller's record), back-projects all four images — through the primary
/// component alone when decoupling is enabled, through the full model
/// otherwise — and returns the reference-differenced source positions minus
/// the precomputed correction. Zero means all four images land on one source
/// point.
pub fn residual<E: DeflectionField>(
    evaluator: &E,
    family: SolverFamily,
    images: &QuadImages,
    x: &Vector6,
    scratch: &mut [ComponentParams],
    offset: &Vector6,
    decoupling: bool,
) -> Result<Vector6, SolveError> {
    family.decode(x, &mut scratch[0])?;

    let select = if decoupling {
        ComponentSelect::Only(0)
    } else {
        ComponentSelect::All
    };
    let (beta_x, beta_y) = evaluator.ray_shoot(&images.x, &images.y, scratch, select)?;

    Ok(difference_against_reference(&beta_x, &beta_y) - offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ShearOnly;

    // Pure external shear: alpha = (g1 x + g2 y, g2 x - g1 y) per component.
    impl DeflectionField for ShearOnly {
        fn deflection(
            &self,
            xs: &[f64],
            ys: &[f64],
            components: &[ComponentParams],
            select: ComponentSelect,
        ) -> Result<(Vec<f64>, Vec<f64>), SolveError> {
            let indices: Vec<usize> = match select {
                ComponentSelect::All => (0..components.len()).collect(),
                ComponentSelect::Only(k) => vec![k],
            };
            let mut ax = vec![0.0; xs.len()];
            let mut ay = vec![0.0; xs.len()];
            for k in indices {
                let g1 = components[k].scalar("e1").unwrap_or(0.0);
                let g2 = components[k].scalar("e2").unwrap_or(0.0);
                for i in 0..xs.len() {
                    ax[i] += g1 * xs[i] + g2 * ys[i];
                    ay[i] += g2 * xs[i] - g1 * ys[i];
                }
            }
            Ok((ax, ay))
        }
    }

    fn cross() -> QuadImages {
        QuadImages::new([1.0, -1.0, 0.0, 0.0], [0.0, 0.0, 1.0, -1.0])
    }

    #[test]
    fn test_from_slices_counts() {
        assert!(QuadImages::from_slices(&[0.0; 4], &[0.0; 4]).is_ok());
        assert!(matches!(
            QuadImages::from_slices(&[0.0; 3], &[0.0; 4]),
            Err(SolveError::ImageCount(3))
        ));
        assert!(matches!(
            QuadImages::from_slices(&[0.0; 4], &[0.0; 5]),
            Err(SolveError::ImageCount(5))
        ));
    }

    #[test]
    fn test_zero_offset_when_decoupling_disabled() {
        let components = vec![
            ComponentParams::new("SHEAR").with("e1", 0.3).with("e2", -0.2),
            ComponentParams::new("SHEAR").with("e1", -0.1).with("e2", 0.4),
        ];
        let offset = decoupling_offset(&ShearOnly, &cross(), &components, false).unwrap();
        assert_eq!(offset, Vector6::zeros());
    }

    #[test]
    fn test_offset_is_negated_secondary_difference() {
        // Primary contributes nothing; the secondary is a pure shear, so the
        // offset must equal the reference-differenced secondary deflection.
        let components = vec![
            ComponentParams::new("SHEAR").with("e1", 0.0).with("e2", 0.0),
            ComponentParams::new("SHEAR").with("e1", 0.05).with("e2", 0.02),
        ];
        let images = cross();
        let offset = decoupling_offset(&ShearOnly, &images, &components, true).unwrap();

        let (sx, sy) = ShearOnly
            .deflection(&images.x, &images.y, &components, ComponentSelect::Only(1))
            .unwrap();
        let expected = difference_against_reference(&sx, &sy);
        assert!((offset - expected).norm() < 1e-15);
    }

    #[test]
    fn test_offset_single_component_is_zero() {
        // With only the primary present, full == primary-only.
        let components =
            vec![ComponentParams::new("SHEAR").with("e1", 0.3).with("e2", -0.1)];
        let offset = decoupling_offset(&ShearOnly, &cross(), &components, true).unwrap();
        assert!(offset.norm() < 1e-15);
    }

    #[test]
    fn test_difference_structure() {
        let vx = [10.0, 1.0, 2.0, 3.0];
        let vy = [20.0, 4.0, 5.0, 6.0];
        let d = difference_against_reference(&vx, &vy);
        assert_eq!(d.as_slice(), &[9.0, 8.0, 7.0, 16.0, 15.0, 14.0]);
    }
}
