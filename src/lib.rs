//! # Convloss Core
//!
//! Conduction and switching loss calculator for a seven-level PWM converter.
//!
//! This library provides:
//! - A small description language for the operating point and device models
//! - Datasheet-based loss models for IGBTs, fast diodes and bridge rectifiers
//! - Interval classification and loss attribution over one fundamental cycle
//! - Per-device losses and efficiency for two realizations of the
//!   bidirectional switches (diode bridge and anti-series pair)
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`dsl`] - Parser for the operating point description language
//! - [`converter`] - Topology identifiers, operating point and its validation
//! - [`devices`] - Semiconductor loss models and the built-in model library
//! - [`engine`] - Waveforms, interval classifier, dispatch table and cycle aggregation
//! - [`report`] - Text and waveform table output (CLI only)
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! convloss demos/seven_level.cnv --series > series.tsv
//! RUST_LOG=debug convloss --json
//! ```
//!
//! ### Library
//!
//! ```no_run
//! use convloss_core::{LossCalculator, OperatingPoint, Realization};
//!
//! let report = LossCalculator::new(OperatingPoint::default())?.run()?;
//! let bridge = report.realization(Realization::DiodeBridge).unwrap();
//! println!("{:.2} W, {:.2} %", bridge.total_loss, bridge.efficiency);
//! # Ok::<(), convloss_core::ConvlossError>(())
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmLossCalc } from 'convloss_core';
//!
//! const calc = new WasmLossCalc(".param ief 6\n.param fp 10k");
//! console.log(calc.efficiency_bridge(), calc.efficiency_series());
//! ```
//!
//! ## Loss Calculation Method
//!
//! The fundamental cycle is split into `floor(fp / fr)` switching periods.
//! For each period, evaluated at its midpoint angle:
//!
//! 1. Compute the reference voltage and the load current
//! 2. Find the conduction interval, duty ratio and blocked voltage
//! 3. Evaluate conduction and switching energy of every device family
//! 4. Attribute the energies to the devices conducting (weighted by their
//!    share of the period) and commutating (once per period)
//!
//! Summed energies times `fr` give the average loss power of every device.

pub mod converter;
pub mod devices;
pub mod dsl;
pub mod engine;
pub mod error;

#[cfg(feature = "cli")]
pub mod report;

// Re-export main types for convenience
pub use converter::{OperatingPoint, Realization, ValidationMode};
pub use engine::{CalculatorConfig, CycleReport, LossCalculator};
pub use error::{ConvlossError, Result};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmLossCalc;

/// Number of level-shifted carriers (three per half cycle, amplitude `V1`)
pub const CARRIER_COUNT: f64 = 6.0;

/// Convert radians to degrees.
pub fn rad_to_deg(rad: f64) -> f64 {
    rad.to_degrees()
}

/// Convert degrees to radians.
pub fn deg_to_rad(deg: f64) -> f64 {
    deg.to_radians()
}

/// Parse a description and run the loss calculation with the given configuration.
pub fn calculate(description: &str, config: CalculatorConfig) -> Result<CycleReport> {
    let ast = dsl::parse(description)?;
    LossCalculator::from_ast(&ast, config)?.run()
}
