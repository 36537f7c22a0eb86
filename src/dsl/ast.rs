//! Abstract Syntax Tree types for the operating point description language.

use std::collections::HashMap;

use crate::converter::DeviceFamily;

/// Complete AST representation of a parsed description.
#[derive(Debug, Clone, Default)]
pub struct DescriptionAst {
    /// Operating point parameters in file order
    pub params: Vec<ParamDef>,
    /// Load current model, if given
    pub current: Option<CurrentDef>,
    /// Device model definitions
    pub models: HashMap<String, ModelDef>,
    /// Switching energy curves, keyed by model name
    pub curves: HashMap<String, CurveDef>,
    /// Model assignments to device families
    pub assignments: Vec<UseDef>,
}

impl DescriptionAst {
    /// Create a new empty description AST.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A `.param <name> <value>` line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    /// Lowercased parameter name
    pub name: String,
    pub value: f64,
    /// Source line number for error reporting
    pub line: usize,
}

/// Load current waveform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentMode {
    /// Phase-shifted sinusoid
    Linear,
    /// Crest-factor-limited pulses
    NonLinear,
}

impl CurrentMode {
    /// Parse a current mode keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "linear" | "lin" | "sine" => Some(Self::Linear),
            "nonlinear" | "nonlin" | "pulse" => Some(Self::NonLinear),
            _ => None,
        }
    }
}

/// A `.current <mode> [key=value ...]` line.
#[derive(Debug, Clone)]
pub struct CurrentDef {
    pub mode: CurrentMode,
    pub params: HashMap<String, f64>,
    pub line: usize,
}

/// A device model definition (`.model <name> <type> (key=value ...)`).
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// Model name
    pub name: String,
    /// Model type (switch or diode)
    pub model_type: ModelType,
    /// Model parameters, lowercased keys
    pub params: HashMap<String, f64>,
    /// Source line number
    pub line: usize,
}

/// Model types accepted by `.model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// Controllable switch (IGBT / MOSFET)
    Switch,
    /// Diode
    Diode,
}

impl ModelType {
    /// Parse a model type from string.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SW" | "SWITCH" | "IGBT" | "Q" => Some(Self::Switch),
            "D" | "DIODE" => Some(Self::Diode),
            _ => None,
        }
    }
}

/// A `.curve <model> <i0> <e0> <i1> <e1> ...` line.
///
/// Currents in amperes, energies in millijoules.
#[derive(Debug, Clone)]
pub struct CurveDef {
    pub model: String,
    pub points: Vec<(f64, f64)>,
    pub line: usize,
}

/// A `.use <family> <model>` line.
#[derive(Debug, Clone)]
pub struct UseDef {
    pub family: DeviceFamily,
    pub model: String,
    pub line: usize,
}
