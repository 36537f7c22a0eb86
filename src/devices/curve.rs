//! Tabulated curves with bounded linear interpolation.

use serde::Serialize;

use crate::error::{ConvlossError, Result};

/// Linearly interpolate `x` on the polyline through `(xs[k], ys[k])`.
///
/// `xs` must be sorted ascending. Queries outside `[xs[0], xs[n-1]]` are
/// rejected with [`ConvlossError::InterpolationDomain`]; the curve is never
/// extrapolated.
pub fn interpolate(x: f64, xs: &[f64], ys: &[f64]) -> Result<f64> {
    let (Some(&min), Some(&max)) = (xs.first(), xs.last()) else {
        return Err(ConvlossError::InterpolationDomain {
            value: x,
            min: f64::NAN,
            max: f64::NAN,
        });
    };

    if !(min..=max).contains(&x) {
        return Err(ConvlossError::InterpolationDomain { value: x, min, max });
    }
    if ys.len() != xs.len() {
        return Err(ConvlossError::invalid_model(
            "curve",
            format!("{} currents but {} energies", xs.len(), ys.len()),
        ));
    }
    if xs.len() == 1 {
        return Ok(ys[0]);
    }

    // First knot strictly above x, clamped so [k-1, k] is a valid segment
    let k = xs.partition_point(|&knot| knot <= x).clamp(1, xs.len() - 1);
    let (x0, x1) = (xs[k - 1], xs[k]);
    let (y0, y1) = (ys[k - 1], ys[k]);

    if x1 == x0 {
        return Ok(y0);
    }
    let alpha = (x - x0) / (x1 - x0);
    Ok(y0 + alpha * (y1 - y0))
}

/// A measured curve `y(x)` sampled at strictly increasing `x`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Curve {
    /// Build a curve from `(x, y)` knots.
    ///
    /// Requires at least two knots with finite, strictly increasing `x`.
    pub fn new(points: &[(f64, f64)]) -> Result<Self> {
        if points.len() < 2 {
            return Err(ConvlossError::invalid_model(
                "curve",
                "needs at least two points",
            ));
        }
        if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(ConvlossError::invalid_model("curve", "points must be finite"));
        }
        if points.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(ConvlossError::invalid_model(
                "curve",
                "currents must be strictly increasing",
            ));
        }

        Ok(Self::from_knots(points))
    }

    /// Build a curve from trusted built-in knots.
    pub(crate) fn from_knots(points: &[(f64, f64)]) -> Self {
        Self {
            x: points.iter().map(|p| p.0).collect(),
            y: points.iter().map(|p| p.1).collect(),
        }
    }

    /// Evaluate the curve at `x`.
    pub fn at(&self, x: f64) -> Result<f64> {
        interpolate(x, &self.x, &self.y)
    }

    /// Tabulated domain `(min, max)`.
    pub fn domain(&self) -> (f64, f64) {
        (
            self.x.first().copied().unwrap_or(f64::NAN),
            self.x.last().copied().unwrap_or(f64::NAN),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interpolate_inside() {
        let xs = [0.0, 10.0, 20.0];
        let ys = [0.0, 1.0, 4.0];
        assert_relative_eq!(interpolate(5.0, &xs, &ys).unwrap(), 0.5);
        assert_relative_eq!(interpolate(15.0, &xs, &ys).unwrap(), 2.5);
        assert_relative_eq!(interpolate(20.0, &xs, &ys).unwrap(), 4.0);
        assert_relative_eq!(interpolate(0.0, &xs, &ys).unwrap(), 0.0);
        assert_relative_eq!(interpolate(10.0, &xs, &ys).unwrap(), 1.0);
    }

    #[test]
    fn test_interpolate_rejects_extrapolation() {
        let xs = [0.0, 10.0];
        let ys = [0.0, 1.0];
        match interpolate(10.5, &xs, &ys) {
            Err(ConvlossError::InterpolationDomain { value, min, max }) => {
                assert_eq!((value, min, max), (10.5, 0.0, 10.0));
            }
            other => panic!("expected domain error, got {:?}", other),
        }
        assert!(interpolate(-0.1, &xs, &ys).is_err());
        assert!(interpolate(f64::NAN, &xs, &ys).is_err());
        assert!(interpolate(1.0, &[], &[]).is_err());
    }

    #[test]
    fn test_curve_validation() {
        assert!(Curve::new(&[(0.0, 0.0)]).is_err());
        assert!(Curve::new(&[(0.0, 0.0), (0.0, 1.0)]).is_err());
        let curve = Curve::new(&[(0.0, 0.0), (2.0, 4.0)]).unwrap();
        assert_eq!(curve.domain(), (0.0, 2.0));
        assert_relative_eq!(curve.at(1.0).unwrap(), 2.0);
    }
}
