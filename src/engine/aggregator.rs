//! Cycle aggregation: sample one fundamental cycle, evaluate and attribute
//! losses, and reduce them to powers and efficiencies.

use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

use serde::Serialize;

use crate::converter::{
    check_operating_point, ConfigWarning, Device, DeviceFamily, OperatingPoint, Polarity,
    Realization, ValidationMode,
};
use crate::devices::DeviceLibrary;
use crate::dsl::DescriptionAst;
use crate::error::{ConvlossError, Result};
use crate::rad_to_deg;

use super::classifier::{Classifier, Interval};
use super::dispatch::DispatchTable;
use super::waveform::Waveform;

/// Configuration for the loss calculator.
#[derive(Debug, Clone, Default)]
pub struct CalculatorConfig {
    /// How operating point violations are handled.
    pub validation: ValidationMode,
    /// Device models used for every family.
    pub library: DeviceLibrary,
}

impl CalculatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validation mode.
    pub fn with_validation(mut self, validation: ValidationMode) -> Self {
        self.validation = validation;
        self
    }

    /// Replace the device models.
    pub fn with_library(mut self, library: DeviceLibrary) -> Self {
        self.library = library;
        self
    }
}

/// One switching period of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleSample {
    pub index: usize,
    /// Midpoint angle of the switching period (rad)
    pub angle: f64,
    pub interval: Interval,
    pub duty: f64,
    pub reference_voltage: f64,
    pub current: f64,
    pub polarity: Polarity,
    pub blocked_voltage: f64,
}

/// Per-sample series kept for plotting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WaveformSeries {
    pub angle: Vec<f64>,
    pub duty_percent: Vec<f64>,
    pub current: Vec<f64>,
    pub reference_voltage: Vec<f64>,
    pub instantaneous_power: Vec<f64>,
}

impl WaveformSeries {
    fn with_capacity(n: usize) -> Self {
        Self {
            angle: Vec::with_capacity(n),
            duty_percent: Vec::with_capacity(n),
            current: Vec::with_capacity(n),
            reference_voltage: Vec::with_capacity(n),
            instantaneous_power: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, sample: &CycleSample) {
        self.angle.push(sample.angle);
        self.duty_percent.push(sample.duty * 100.0);
        self.current.push(sample.current);
        self.reference_voltage.push(sample.reference_voltage);
        self.instantaneous_power
            .push(sample.reference_voltage * sample.current);
    }

    pub fn len(&self) -> usize {
        self.angle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angle.is_empty()
    }
}

/// Losses of one device over the cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceReport {
    pub device: Device,
    pub label: String,
    /// Physical devices represented by this entry
    pub multiplicity: usize,
    /// Conduction energy per fundamental cycle (J)
    pub conduction_energy: f64,
    /// Switching energy per fundamental cycle (J)
    pub switching_energy: f64,
    /// Average loss power (W)
    pub power: f64,
    /// Current averaged over the cycle (A)
    pub mean_current: f64,
}

impl DeviceReport {
    /// Total energy per fundamental cycle (J).
    pub fn energy(&self) -> f64 {
        self.conduction_energy + self.switching_energy
    }
}

/// Totals for one realization of the bidirectional switches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealizationReport {
    pub realization: Realization,
    pub devices: Vec<DeviceReport>,
    /// Conduction loss, every physical device counted (W)
    pub conduction_loss: f64,
    /// Switching loss, every physical device counted (W)
    pub switching_loss: f64,
    pub total_loss: f64,
    /// Output power minus losses (W)
    pub delivered_power: f64,
    /// `(Pout - Ploss) / Pout` in percent
    pub efficiency: f64,
}

impl RealizationReport {
    pub fn device(&self, device: Device) -> Option<&DeviceReport> {
        self.devices.iter().find(|d| d.device == device)
    }
}

/// Theoretical and sampled RMS values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RmsCheck {
    pub theoretical_current: f64,
    pub realized_current: f64,
    pub theoretical_voltage: f64,
    pub realized_voltage: f64,
}

/// Modulation quantities derived from the operating point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModulationReport {
    pub mf: f64,
    pub ma: f64,
    pub sub_periods: usize,
    /// Level-crossing angles (degrees)
    pub boundary_angles: [f64; 11],
    /// Level-crossing angles rounded to the switching grid (degrees)
    pub rounded_angles: [f64; 11],
    /// Switching periods in intervals A..F
    pub switching_counts: [i64; 6],
}

/// Result of a loss calculation over one fundamental cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub operating_point: OperatingPoint,
    pub models: BTreeMap<String, String>,
    pub warnings: Vec<ConfigWarning>,
    pub modulation: ModulationReport,
    pub rms: RmsCheck,
    /// Mean of `vref * i` over the cycle (W)
    pub output_power: f64,
    pub realizations: Vec<RealizationReport>,
    pub series: WaveformSeries,
}

impl CycleReport {
    pub fn realization(&self, realization: Realization) -> Option<&RealizationReport> {
        self.realizations
            .iter()
            .find(|r| r.realization == realization)
    }

    /// Serialize the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct DeviceTotals {
    conduction: f64,
    switching: f64,
    current: f64,
}

/// Accumulators of one run, one set per realization.
struct RunAccumulators {
    totals: [BTreeMap<Device, DeviceTotals>; 2],
}

impl RunAccumulators {
    fn new() -> Self {
        Self {
            totals: Realization::ALL.map(|r| {
                r.devices()
                    .into_iter()
                    .map(|d| (d, DeviceTotals::default()))
                    .collect()
            }),
        }
    }

    fn entry(&mut self, realization: Realization, device: Device) -> &mut DeviceTotals {
        self.totals[realization.index()].entry(device).or_default()
    }
}

/// Loss calculator for one operating point.
#[derive(Debug, Clone)]
pub struct LossCalculator {
    op: OperatingPoint,
    library: DeviceLibrary,
    warnings: Vec<ConfigWarning>,
    waveform: Waveform,
    classifier: Classifier,
    table: DispatchTable,
}

impl LossCalculator {
    /// Create a calculator with the default configuration.
    pub fn new(op: OperatingPoint) -> Result<Self> {
        Self::with_config(op, CalculatorConfig::default())
    }

    /// Create a calculator with a custom configuration.
    pub fn with_config(op: OperatingPoint, config: CalculatorConfig) -> Result<Self> {
        let warnings = check_operating_point(&op, config.validation)?;
        config.library.validate()?;

        let classifier = Classifier::new(&op)?;
        let table = DispatchTable::new()?;

        tracing::debug!(
            "mf = {:.3}, ma = {:.4}, {} switching periods per cycle",
            op.mf(),
            op.ma(),
            op.sub_periods()
        );

        Ok(Self {
            waveform: Waveform::new(&op),
            op,
            library: config.library,
            warnings,
            classifier,
            table,
        })
    }

    /// Create a calculator from a parsed description.
    ///
    /// `.model`/`.use` lines in the description replace the configured
    /// models of the families they name.
    pub fn from_ast(ast: &DescriptionAst, mut config: CalculatorConfig) -> Result<Self> {
        let op = OperatingPoint::from_ast(ast)?;
        if !ast.assignments.is_empty() || !ast.models.is_empty() {
            config.library = DeviceLibrary::from_ast(ast)?;
        }
        Self::with_config(op, config)
    }

    pub fn operating_point(&self) -> &OperatingPoint {
        &self.op
    }

    pub fn library(&self) -> &DeviceLibrary {
        &self.library
    }

    /// Operating point violations tolerated in lenient mode.
    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    /// Evaluate the `k`-th switching period of the cycle.
    pub fn sample(&self, k: usize) -> Result<CycleSample> {
        let n = self.op.sub_periods();
        if n == 0 {
            return Err(ConvlossError::EmptyCycle { mf: self.op.mf() });
        }

        let angle = TAU * k as f64 / n as f64 + PI / self.op.mf();
        let classification = self.classifier.classify(angle)?;
        let current = self.waveform.current(angle);

        Ok(CycleSample {
            index: k,
            angle,
            interval: classification.interval,
            duty: classification.duty,
            reference_voltage: classification.reference_voltage,
            current,
            polarity: Polarity::of(current),
            blocked_voltage: classification.blocked_voltage,
        })
    }

    /// Run the calculation over one fundamental cycle.
    pub fn run(&self) -> Result<CycleReport> {
        let n = self.op.sub_periods();
        if n == 0 {
            return Err(ConvlossError::EmptyCycle { mf: self.op.mf() });
        }

        let period = self.op.switching_period();
        let mut accumulators = RunAccumulators::new();
        let mut series = WaveformSeries::with_capacity(n);

        for k in 0..n {
            let sample = self.sample(k)?;
            let losses = self
                .library
                .evaluate(sample.current, sample.blocked_voltage, period)?;

            for realization in Realization::ALL {
                let increments = self.table.attribute(
                    sample.interval,
                    sample.polarity,
                    realization,
                    sample.duty,
                    sample.current.abs(),
                    &losses,
                );
                for inc in increments {
                    let totals = accumulators.entry(realization, inc.device);
                    totals.conduction += inc.conduction;
                    totals.switching += inc.switching;
                    totals.current += inc.current;
                }
            }
            series.push(&sample);
        }

        let output_power = mean(&series.instantaneous_power);
        // Quadrature current leaves only rounding noise in the mean
        let noise_floor = 1e-9 * (self.op.ar * self.op.ief).abs();
        if !output_power.is_finite() || output_power <= noise_floor {
            return Err(ConvlossError::ZeroOutputPower);
        }

        let realizations: Vec<RealizationReport> = Realization::ALL
            .into_iter()
            .map(|r| self.reduce(r, &accumulators, n, output_power))
            .collect();

        for r in &realizations {
            tracing::info!(
                "{}: {:.2} W loss, {:.2} % efficiency",
                r.realization,
                r.total_loss,
                r.efficiency
            );
        }

        let angles = self.classifier.angles();
        let modulation = ModulationReport {
            mf: self.op.mf(),
            ma: self.op.ma(),
            sub_periods: n,
            boundary_angles: angles.theoretical().map(rad_to_deg),
            rounded_angles: angles.rounded().map(rad_to_deg),
            switching_counts: angles.switching_counts(),
        };

        let rms = RmsCheck {
            theoretical_current: self.waveform.theoretical_current_rms(),
            realized_current: rms(&series.current),
            theoretical_voltage: self.waveform.theoretical_voltage_rms(),
            realized_voltage: rms(&series.reference_voltage),
        };

        let models = DeviceFamily::ALL
            .into_iter()
            .map(|f| (f.to_string(), self.library.model_name(f).to_string()))
            .collect();

        Ok(CycleReport {
            operating_point: self.op,
            models,
            warnings: self.warnings.clone(),
            modulation,
            rms,
            output_power,
            realizations,
            series,
        })
    }

    fn reduce(
        &self,
        realization: Realization,
        accumulators: &RunAccumulators,
        n: usize,
        output_power: f64,
    ) -> RealizationReport {
        let fr = self.op.fr;
        let devices: Vec<DeviceReport> = accumulators.totals[realization.index()]
            .iter()
            .map(|(device, totals)| DeviceReport {
                device: *device,
                label: device.to_string(),
                multiplicity: device.multiplicity(),
                conduction_energy: totals.conduction,
                switching_energy: totals.switching,
                power: (totals.conduction + totals.switching) * fr,
                mean_current: totals.current / n as f64,
            })
            .collect();

        let counted = |energy: fn(&DeviceReport) -> f64| -> f64 {
            devices
                .iter()
                .map(|d| energy(d) * d.multiplicity as f64)
                .sum::<f64>()
                * fr
        };
        let conduction_loss = counted(|d: &DeviceReport| d.conduction_energy);
        let switching_loss = counted(|d: &DeviceReport| d.switching_energy);
        let total_loss = conduction_loss + switching_loss;

        RealizationReport {
            realization,
            devices,
            conduction_loss,
            switching_loss,
            total_loss,
            delivered_power: output_power - total_loss,
            efficiency: (output_power - total_loss) / output_power * 100.0,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn rms(values: &[f64]) -> f64 {
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{CurrentShape, Element, Leg};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn default_report() -> CycleReport {
        LossCalculator::new(OperatingPoint::default())
            .unwrap()
            .run()
            .unwrap()
    }

    #[test]
    fn test_sample_midpoints() {
        let calc = LossCalculator::new(OperatingPoint::default()).unwrap();
        let first = calc.sample(0).unwrap();
        assert_relative_eq!(first.angle, PI / 360.0);
        assert_eq!(first.interval, Interval::A);
        assert_eq!(first.polarity, Polarity::Positive);
        assert_relative_eq!(first.blocked_voltage, 100.0);

        let last = calc.sample(359).unwrap();
        assert!(last.angle < TAU);
        assert_eq!(last.interval, Interval::D);
        assert_eq!(last.polarity, Polarity::Negative);
    }

    #[test]
    fn test_output_power_and_rms() {
        let report = default_report();
        // Ar * Ief * sqrt(2) / 2 for an in-phase current
        assert_relative_eq!(
            report.output_power,
            300.0 * 4.25 / 2f64.sqrt(),
            max_relative = 1e-9
        );
        assert_relative_eq!(report.rms.realized_current, 4.25, max_relative = 1e-9);
        assert_relative_eq!(
            report.rms.realized_voltage,
            report.rms.theoretical_voltage,
            max_relative = 1e-9
        );
        assert_eq!(report.series.len(), 360);
    }

    #[test]
    fn test_totals_count_bridge_diodes_twice() {
        let report = default_report();
        let bridge = report.realization(Realization::DiodeBridge).unwrap();
        let by_device: f64 = bridge
            .devices
            .iter()
            .map(|d| d.power * d.multiplicity as f64)
            .sum();
        assert_relative_eq!(bridge.total_loss, by_device, max_relative = 1e-12);

        let dp = bridge
            .device(Device::new(Leg::S5, Element::BridgeDiodePositive))
            .unwrap();
        assert_eq!(dp.multiplicity, 2);
        assert!(dp.power > 0.0);
    }

    #[test]
    fn test_devices_default_to_zero() {
        // In-phase current never flows backwards through S1, so its diode idles
        let report = default_report();
        let series = report.realization(Realization::AntiSeries).unwrap();
        assert_eq!(series.devices.len(), 16);
        let s1d = series.device(Device::new(Leg::S1, Element::Diode)).unwrap();
        assert_eq!(s1d.energy(), 0.0);
        assert_eq!(s1d.mean_current, 0.0);
    }

    #[test]
    fn test_unidirectional_devices_shared_by_realizations() {
        let report = default_report();
        let bridge = report.realization(Realization::DiodeBridge).unwrap();
        let series = report.realization(Realization::AntiSeries).unwrap();
        for leg in [Leg::S1, Leg::S2, Leg::S3, Leg::S4] {
            for element in [Element::Switch, Element::Diode] {
                let device = Device::new(leg, element);
                assert_eq!(bridge.device(device), series.device(device));
            }
        }
    }

    #[test]
    fn test_empty_cycle() {
        let op = OperatingPoint {
            fp: 30.0,
            ..OperatingPoint::default()
        };
        let calc = LossCalculator::new(op).unwrap();
        assert_eq!(calc.warnings().len(), 1);
        assert!(matches!(calc.run(), Err(ConvlossError::EmptyCycle { .. })));
        assert!(calc.sample(0).is_err());
    }

    #[test]
    fn test_zero_output_power() {
        let op = OperatingPoint {
            ief: 0.0,
            ..OperatingPoint::default()
        };
        let calc = LossCalculator::new(op).unwrap();
        assert!(matches!(calc.run(), Err(ConvlossError::ZeroOutputPower)));
    }

    #[test]
    fn test_quadrature_current_has_no_output_power() {
        for phase in [FRAC_PI_2, -FRAC_PI_2] {
            let op = OperatingPoint {
                current: CurrentShape::Linear { phase },
                ..OperatingPoint::default()
            };
            let calc = LossCalculator::new(op).unwrap();
            assert!(calc.warnings().is_empty());
            assert!(matches!(calc.run(), Err(ConvlossError::ZeroOutputPower)));
        }
    }

    #[test]
    fn test_reversed_power_flow_rejected() {
        let op = OperatingPoint {
            current: CurrentShape::Linear { phase: 2.5 },
            ..OperatingPoint::default()
        };
        let calc = LossCalculator::new(op).unwrap();
        assert!(matches!(calc.run(), Err(ConvlossError::ZeroOutputPower)));
    }

    #[test]
    fn test_strict_config() {
        let op = OperatingPoint {
            current: CurrentShape::Linear { phase: 2.0 },
            ..OperatingPoint::default()
        };
        let config = CalculatorConfig::new().with_validation(ValidationMode::Strict);
        assert!(LossCalculator::with_config(op, config).is_err());
        assert!(LossCalculator::new(op).is_ok());
    }

    #[test]
    fn test_report_json() {
        let json = default_report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["modulation"]["sub_periods"], 360);
        assert_eq!(value["realizations"].as_array().unwrap().len(), 2);
        assert_eq!(value["models"]["switch"], "IRG4PC50UD");
    }
}
