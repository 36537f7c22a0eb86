//! WASM bindings for Convloss Core.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmLossCalc } from 'convloss_core';
//!
//! await init();
//!
//! const description = `
//!   .param v1 100
//!   .param v2 200
//!   .param ar 300
//!   .param ief 4.25
//!   .current linear phase=-0.2
//! `;
//!
//! const calc = new WasmLossCalc(description);
//! const report = JSON.parse(calc.report_json());
//! ```

use wasm_bindgen::prelude::*;

use crate::converter::Realization;
use crate::dsl;
use crate::engine::{CalculatorConfig, CycleReport, LossCalculator};
use crate::error::ConvlossError;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(e: ConvlossError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-compatible loss calculator.
///
/// The calculation runs once in the constructor; the accessors read the
/// stored report.
#[wasm_bindgen]
pub struct WasmLossCalc {
    report: CycleReport,
}

#[wasm_bindgen]
impl WasmLossCalc {
    /// Run the calculation for a description string.
    ///
    /// # Arguments
    /// * `description` - Operating point and device models in the description language
    ///
    /// # Returns
    /// A new `WasmLossCalc` instance or an error if the description is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new(description: &str) -> Result<WasmLossCalc, JsValue> {
        Self::with_validation(description, false)
    }

    /// Run the calculation, optionally rejecting operating points outside the converter limits.
    #[wasm_bindgen]
    pub fn with_validation(description: &str, strict: bool) -> Result<WasmLossCalc, JsValue> {
        let ast = dsl::parse(description).map_err(to_js)?;

        let validation = if strict {
            crate::ValidationMode::Strict
        } else {
            crate::ValidationMode::Lenient
        };
        let config = CalculatorConfig::new().with_validation(validation);

        let report = LossCalculator::from_ast(&ast, config)
            .and_then(|calc| calc.run())
            .map_err(to_js)?;

        Ok(WasmLossCalc { report })
    }

    fn efficiency(&self, realization: Realization) -> f64 {
        self.report
            .realization(realization)
            .map_or(f64::NAN, |r| r.efficiency)
    }

    /// Efficiency (%) with diode-bridge bidirectional switches.
    #[wasm_bindgen]
    pub fn efficiency_bridge(&self) -> f64 {
        self.efficiency(Realization::DiodeBridge)
    }

    /// Efficiency (%) with anti-series bidirectional switches.
    #[wasm_bindgen]
    pub fn efficiency_series(&self) -> f64 {
        self.efficiency(Realization::AntiSeries)
    }

    /// Output power (W).
    #[wasm_bindgen(getter)]
    pub fn output_power(&self) -> f64 {
        self.report.output_power
    }

    /// The full report as a JSON string.
    #[wasm_bindgen]
    pub fn report_json(&self) -> Result<String, JsValue> {
        self.report.to_json().map_err(to_js)
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
