//! Converter operating point.

use std::f64::consts::SQRT_2;

use serde::{Deserialize, Serialize};

use crate::dsl::{CurrentMode, DescriptionAst};
use crate::error::{ConvlossError, Result};
use crate::CARRIER_COUNT;

/// Shape of the load current.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CurrentShape {
    /// Sinusoid shifted by `phase` radians from the reference voltage.
    Linear { phase: f64 },
    /// Half-sine pulses centered on the voltage peaks, with the given crest factor.
    NonLinear { crest_factor: f64 },
}

impl Default for CurrentShape {
    fn default() -> Self {
        CurrentShape::Linear { phase: 0.0 }
    }
}

impl CurrentShape {
    /// Crest factor (peak / RMS) of the normalized current.
    pub fn crest_factor(&self) -> f64 {
        match *self {
            CurrentShape::Linear { .. } => SQRT_2,
            CurrentShape::NonLinear { crest_factor } => crest_factor,
        }
    }
}

/// Electrical operating point of the converter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    /// Lower DC source voltage (V)
    pub v1: f64,
    /// Upper DC source voltage (V)
    pub v2: f64,
    /// Amplitude of the synthesized reference voltage (V)
    pub ar: f64,
    /// RMS output current (A)
    pub ief: f64,
    /// Fundamental (reference) frequency (Hz)
    pub fr: f64,
    /// Carrier / switching frequency (Hz)
    pub fp: f64,
    /// Load current model
    pub current: CurrentShape,
}

impl Default for OperatingPoint {
    fn default() -> Self {
        Self {
            v1: 100.0,
            v2: 200.0,
            ar: 300.0,
            ief: 4.25,
            fr: 60.0,
            fp: 21_600.0,
            current: CurrentShape::default(),
        }
    }
}

impl OperatingPoint {
    /// Frequency modulation ratio `fp / fr`.
    pub fn mf(&self) -> f64 {
        self.fp / self.fr
    }

    /// Amplitude modulation index for six level-shifted carriers of amplitude `V1`.
    pub fn ma(&self) -> f64 {
        2.0 * self.ar / (CARRIER_COUNT * self.v1)
    }

    /// Duration of one switching period (s).
    pub fn switching_period(&self) -> f64 {
        1.0 / self.fp
    }

    /// Number of whole switching periods evaluated per fundamental cycle.
    pub fn sub_periods(&self) -> usize {
        let mf = self.mf();
        if mf.is_finite() && mf >= 1.0 {
            mf.floor() as usize
        } else {
            0
        }
    }

    /// Build an operating point from a parsed description.
    ///
    /// Parameters missing from the description keep their default values.
    pub fn from_ast(ast: &DescriptionAst) -> Result<Self> {
        let mut op = Self::default();

        for param in &ast.params {
            let slot = match param.name.as_str() {
                "v1" => &mut op.v1,
                "v2" => &mut op.v2,
                "ar" => &mut op.ar,
                "ief" => &mut op.ief,
                "fr" => &mut op.fr,
                "fp" => &mut op.fp,
                _ => {
                    return Err(ConvlossError::UnknownParameter {
                        name: param.name.clone(),
                        line: param.line,
                    })
                }
            };
            *slot = param.value;
        }

        if let Some(current) = &ast.current {
            let allowed = match current.mode {
                CurrentMode::Linear => "phase",
                CurrentMode::NonLinear => "crest",
            };
            if let Some(key) = current.params.keys().find(|k| k.as_str() != allowed) {
                return Err(ConvlossError::UnknownParameter {
                    name: key.clone(),
                    line: current.line,
                });
            }

            op.current = match current.mode {
                CurrentMode::Linear => CurrentShape::Linear {
                    phase: current.params.get("phase").copied().unwrap_or(0.0),
                },
                CurrentMode::NonLinear => CurrentShape::NonLinear {
                    crest_factor: current.params.get("crest").copied().unwrap_or(SQRT_2),
                },
            };
        }

        Ok(op)
    }
}
