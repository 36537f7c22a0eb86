//! Operating point validation.

use std::f64::consts::{FRAC_PI_2, SQRT_2};
use std::fmt;

use serde::Serialize;

use crate::error::{ConvlossError, Result};

use super::{CurrentShape, OperatingPoint};

/// How violated operating point invariants are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Log each violation as a warning and keep computing.
    #[default]
    Lenient,
    /// Reject the operating point.
    Strict,
}

/// A violated operating point invariant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigWarning {
    /// `V1 < V2` does not hold
    BusOrdering { v1: f64, v2: f64 },
    /// `Ar <= V1 + V2` does not hold
    AmplitudeAboveBus { ar: f64, limit: f64 },
    /// `Ar > V2` does not hold, so the upper levels are never reached
    AmplitudeBelowUpperBus { ar: f64, v2: f64 },
    /// `fp > fr` does not hold
    CarrierBelowFundamental { fp: f64, fr: f64 },
    /// Linear current phase outside `[-pi/2, pi/2]`
    PhaseOutOfRange { phase: f64 },
    /// Non-linear crest factor below `sqrt(2)`
    CrestFactorTooLow { crest_factor: f64 },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::BusOrdering { v1, v2 } => {
                write!(f, "V1 ({v1} V) must be lower than V2 ({v2} V)")
            }
            ConfigWarning::AmplitudeAboveBus { ar, limit } => {
                write!(f, "Ar ({ar} V) exceeds V1 + V2 ({limit} V)")
            }
            ConfigWarning::AmplitudeBelowUpperBus { ar, v2 } => {
                write!(f, "Ar ({ar} V) must exceed V2 ({v2} V) to use seven levels")
            }
            ConfigWarning::CarrierBelowFundamental { fp, fr } => {
                write!(f, "fp ({fp} Hz) must exceed fr ({fr} Hz)")
            }
            ConfigWarning::PhaseOutOfRange { phase } => {
                write!(f, "current phase ({phase} rad) outside [-pi/2, pi/2]")
            }
            ConfigWarning::CrestFactorTooLow { crest_factor } => {
                write!(f, "crest factor ({crest_factor}) below sqrt(2)")
            }
        }
    }
}

/// Collect every violated operating point invariant.
pub fn validate_operating_point(op: &OperatingPoint) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if !(op.v1 < op.v2) {
        warnings.push(ConfigWarning::BusOrdering { v1: op.v1, v2: op.v2 });
    }
    if !(op.ar <= op.v1 + op.v2) {
        warnings.push(ConfigWarning::AmplitudeAboveBus {
            ar: op.ar,
            limit: op.v1 + op.v2,
        });
    }
    if !(op.ar > op.v2) {
        warnings.push(ConfigWarning::AmplitudeBelowUpperBus { ar: op.ar, v2: op.v2 });
    }
    if !(op.fp > op.fr) {
        warnings.push(ConfigWarning::CarrierBelowFundamental { fp: op.fp, fr: op.fr });
    }

    match op.current {
        CurrentShape::Linear { phase } => {
            if !(-FRAC_PI_2..=FRAC_PI_2).contains(&phase) {
                warnings.push(ConfigWarning::PhaseOutOfRange { phase });
            }
        }
        CurrentShape::NonLinear { crest_factor } => {
            // Tolerate the rounding of a typed-in sqrt(2)
            if crest_factor < SQRT_2 - 1e-9 {
                warnings.push(ConfigWarning::CrestFactorTooLow { crest_factor });
            }
        }
    }

    warnings
}

/// Reject operating points the loss computation cannot evaluate at all.
///
/// These are independent of the validation mode: non-positive frequencies,
/// bus voltages or amplitude, and amplitudes below a bus voltage (no
/// boundary angle exists).
pub fn check_computable(op: &OperatingPoint) -> Result<()> {
    let positive = [
        ("v1", op.v1),
        ("v2", op.v2),
        ("ar", op.ar),
        ("fr", op.fr),
        ("fp", op.fp),
    ];
    for (name, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConvlossError::invalid_parameter(
                name,
                format!("must be a positive finite number, got {value}"),
            ));
        }
    }

    if !(op.ief.is_finite() && op.ief >= 0.0) {
        return Err(ConvlossError::invalid_parameter(
            "ief",
            format!("must be a non-negative finite number, got {}", op.ief),
        ));
    }

    if op.ar < op.v1.max(op.v2) {
        return Err(ConvlossError::invalid_parameter(
            "ar",
            format!(
                "amplitude {} V is below a bus voltage, level boundaries are undefined",
                op.ar
            ),
        ));
    }

    match op.current {
        CurrentShape::Linear { phase } if !phase.is_finite() => Err(
            ConvlossError::invalid_parameter("phase", "must be a finite number"),
        ),
        CurrentShape::NonLinear { crest_factor }
            if !(crest_factor.is_finite() && crest_factor > 0.0) =>
        {
            Err(ConvlossError::invalid_parameter(
                "crest",
                format!("must be a positive finite number, got {crest_factor}"),
            ))
        }
        _ => Ok(()),
    }
}

/// Validate an operating point under the given mode.
///
/// Returns the violated invariants in lenient mode; strict mode turns any
/// violation into [`ConvlossError::ConfigurationInvalid`].
pub fn check_operating_point(
    op: &OperatingPoint,
    mode: ValidationMode,
) -> Result<Vec<ConfigWarning>> {
    check_computable(op)?;

    let warnings = validate_operating_point(op);
    if warnings.is_empty() {
        return Ok(warnings);
    }

    match mode {
        ValidationMode::Strict => Err(ConvlossError::ConfigurationInvalid { warnings }),
        ValidationMode::Lenient => {
            for warning in &warnings {
                tracing::warn!("operating point out of limits: {}", warning);
            }
            Ok(warnings)
        }
    }
}
