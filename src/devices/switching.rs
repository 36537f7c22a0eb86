//! Switching and reverse-recovery loss models.

use serde::Serialize;

use crate::error::{ConvlossError, Result};

use super::curve::Curve;

/// Measured `Eon + Eoff` switching energy of a controllable switch.
///
/// The curve is tabulated in amperes and millijoules, as read off the
/// datasheet; `scale` corrects for a gate resistance different from the
/// datasheet test circuit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyCurve {
    pub curve: Curve,
    pub scale: f64,
}

impl EnergyCurve {
    pub fn new(curve: Curve, scale: f64) -> Result<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConvlossError::invalid_model(
                "switching",
                format!("energy scale must be positive, got {}", scale),
            ));
        }
        Ok(Self { curve, scale })
    }

    /// Energy of one switching transition pair at `current` (J).
    pub fn energy(&self, current: f64) -> Result<f64> {
        Ok(self.curve.at(current)? / 1000.0 * self.scale)
    }
}

/// Diode reverse-recovery energy model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecoveryModel {
    /// `E = V * Qrr`
    Charge { qrr: f64 },
    /// Triangular recovery current: `E = V * trr * Irr / 2`
    Triangular { trr: f64, irr: f64 },
}

impl RecoveryModel {
    /// Recovery energy when the diode turns off against `blocked_voltage` (J).
    pub fn energy(&self, blocked_voltage: f64) -> f64 {
        match *self {
            RecoveryModel::Charge { qrr } => blocked_voltage * qrr,
            RecoveryModel::Triangular { trr, irr } => blocked_voltage * trr * irr / 2.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let values: &[(&str, f64)] = match self {
            RecoveryModel::Charge { qrr } => &[("qrr", *qrr)],
            RecoveryModel::Triangular { trr, irr } => &[("trr", *trr), ("irr", *irr)],
        };
        for &(name, value) in values {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConvlossError::invalid_model(
                    "recovery",
                    format!("{} must be non-negative, got {}", name, value),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_curve_scaling() {
        let curve = Curve::new(&[(0.0, 0.0), (10.0, 2.0)]).unwrap();
        let model = EnergyCurve::new(curve, 1.5).unwrap();
        // 1 mJ at 5 A, scaled by 1.5
        assert_relative_eq!(model.energy(5.0).unwrap(), 1.5e-3);
        assert!(model.energy(11.0).is_err());
    }

    #[test]
    fn test_recovery_models() {
        let charge = RecoveryModel::Charge { qrr: 300e-9 };
        assert_relative_eq!(charge.energy(100.0), 30e-6);

        let triangular = RecoveryModel::Triangular {
            trr: 75e-9,
            irr: 0.25,
        };
        assert_relative_eq!(triangular.energy(300.0), 300.0 * 75e-9 * 0.125);
        assert!(RecoveryModel::Charge { qrr: -1.0 }.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_scale() {
        let curve = Curve::new(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        assert!(EnergyCurve::new(curve, 0.0).is_err());
    }
}
