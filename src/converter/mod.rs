//! Converter description: topology identifiers, operating point and its validation.
//!
//! The seven-level topology combines two DC sources (`V1 < V2`), four
//! unidirectional switches `S1`..`S4` with anti-parallel diodes and two
//! bidirectional switches `S5`, `S6`. This module names those devices and
//! holds the [`OperatingPoint`] the loss engine evaluates.

mod operating_point;
mod types;
mod validate;

pub use operating_point::{CurrentShape, OperatingPoint};
pub use types::*;
pub use validate::{
    check_computable, check_operating_point, validate_operating_point, ConfigWarning,
    ValidationMode,
};
