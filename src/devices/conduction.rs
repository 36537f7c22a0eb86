//! Conduction loss model.
//!
//! The on-state voltage comes from a curve fit of the datasheet `v(i)`
//! characteristic above a knee current, and from a fixed threshold voltage
//! below it:
//!
//! ```text
//! v_on(i) = vth                     i <  knee
//!         = max(vth, fit(i))        i >= knee
//! E(i)    = v_on(i) * i * T_s
//! ```
//!
//! Keeping `v_on` at or above `vth` makes `E(i)` non-decreasing across the
//! knee, where the fitted curves dip slightly below the threshold.

use serde::Serialize;

use crate::error::{ConvlossError, Result};

/// Curve fit of the forward characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OnVoltageFit {
    /// `i = a*v^2 + b*v + c`, solved for the larger root in `v`.
    Quadratic { a: f64, b: f64, c: f64 },
    /// `v = p0 + p1*x + p2*x^2 + p3*x^3 + p4*x^4` with `x = log10(i)`.
    LogPolynomial { coefficients: [f64; 5] },
}

impl OnVoltageFit {
    /// On-state voltage at `current`. NaN where the fit is undefined.
    pub fn voltage(&self, current: f64) -> f64 {
        match *self {
            OnVoltageFit::Quadratic { a, b, c } => {
                let discriminant = b * b - 4.0 * a * (c - current);
                (-b + discriminant.sqrt()) / (2.0 * a)
            }
            OnVoltageFit::LogPolynomial { coefficients } => {
                let x = current.log10();
                // Horner, highest order first
                coefficients.iter().rev().fold(0.0, |acc, &p| acc * x + p)
            }
        }
    }
}

/// Conduction loss model of one device family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConductionModel {
    pub fit: OnVoltageFit,
    /// Current below which `threshold` is used instead of the fit (A)
    pub knee: f64,
    /// On-state voltage floor (V)
    pub threshold: f64,
}

impl ConductionModel {
    /// Create a model, checking that the fit is defined from the knee upwards.
    pub fn new(fit: OnVoltageFit, knee: f64, threshold: f64) -> Result<Self> {
        let model = Self {
            fit,
            knee,
            threshold,
        };
        model.validate()?;
        Ok(model)
    }

    /// Check the model parameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.knee.is_finite() && self.knee > 0.0) {
            return Err(ConvlossError::invalid_model(
                "conduction",
                format!("knee current must be positive, got {}", self.knee),
            ));
        }
        if !(self.threshold.is_finite() && self.threshold >= 0.0) {
            return Err(ConvlossError::invalid_model(
                "conduction",
                format!("threshold voltage must be non-negative, got {}", self.threshold),
            ));
        }
        if let OnVoltageFit::Quadratic { a, .. } = self.fit {
            if !(a.is_finite() && a > 0.0) {
                return Err(ConvlossError::invalid_model(
                    "conduction",
                    format!("quadratic coefficient a must be positive, got {}", a),
                ));
            }
        }
        if !self.fit.voltage(self.knee).is_finite() {
            return Err(ConvlossError::invalid_model(
                "conduction",
                format!("fit is undefined at the knee current {} A", self.knee),
            ));
        }
        Ok(())
    }

    /// On-state voltage at `current` (A, non-negative).
    pub fn on_voltage(&self, current: f64) -> f64 {
        if current < self.knee {
            self.threshold
        } else {
            self.fit.voltage(current).max(self.threshold)
        }
    }

    /// Conduction energy over one switching period `period` (J).
    pub fn energy(&self, current: f64, period: f64) -> f64 {
        self.on_voltage(current) * current * period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn igbt() -> ConductionModel {
        ConductionModel::new(
            OnVoltageFit::Quadratic {
                a: 34.494,
                b: -45.751198,
                c: 15.3045316,
            },
            0.2,
            0.707,
        )
        .unwrap()
    }

    #[test]
    fn test_quadratic_root() {
        let model = igbt();
        // v = 1.0 V => i = a - 45.75 + 15.30 = 4.047 A
        let i = 34.494 - 45.751198 + 15.3045316;
        assert_relative_eq!(model.on_voltage(i), 1.0, epsilon = 1e-9);
        assert_relative_eq!(model.energy(i, 1e-4), i * 1e-4, epsilon = 1e-12);
    }

    #[test]
    fn test_threshold_below_knee() {
        let model = igbt();
        assert_relative_eq!(model.on_voltage(0.1), 0.707);
        assert_eq!(model.energy(0.0, 1e-4), 0.0);
    }

    #[test]
    fn test_log_polynomial() {
        let fit = OnVoltageFit::LogPolynomial {
            coefficients: [1.12748, 0.432774, 0.229932, 0.159803, 0.0430482],
        };
        // log10(1) = 0
        assert_relative_eq!(fit.voltage(1.0), 1.12748);
        // log10(10) = 1: sum of the coefficients
        assert_relative_eq!(fit.voltage(10.0), 1.9930372, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_undefined_knee() {
        // Discriminant is negative below ~1.205 A for this diode fit
        let fit = OnVoltageFit::Quadratic {
            a: 33.050759762,
            b: -48.682061178,
            c: 19.131811979,
        };
        assert!(ConductionModel::new(fit, 1.0, 0.8).is_err());
        assert!(ConductionModel::new(fit, 1.3, 0.8).is_ok());
    }

    #[test]
    fn test_energy_monotonic_across_knee() {
        let model = ConductionModel::new(
            OnVoltageFit::Quadratic {
                a: 33.050759762,
                b: -48.682061178,
                c: 19.131811979,
            },
            1.3,
            0.8,
        )
        .unwrap();
        let mut previous = 0.0;
        for k in 0..=2000 {
            let i = k as f64 * 0.005;
            let e = model.energy(i, 1.0);
            assert!(e >= previous, "energy decreased at {} A", i);
            previous = e;
        }
    }
}
