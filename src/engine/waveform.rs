//! Reference voltage and load current waveforms over one fundamental cycle.

use std::f64::consts::{FRAC_PI_2, PI, SQRT_2, TAU};

use crate::converter::{CurrentShape, OperatingPoint};

/// Load current normalized to 1 A RMS at `angle` (rad, `0..2pi`).
///
/// The linear shape is a sinusoid shifted by `phase`. The non-linear shape
/// draws a half-cosine pulse of peak `C` and width `2pi / C^2` around each
/// voltage peak, positive at `pi/2` and negative at `3pi/2`, and zero
/// elsewhere. Below a crest factor of `sqrt(2)` the pulses would overlap;
/// each is then cut at the edges of its own half cycle.
pub fn normalized_current(angle: f64, shape: CurrentShape) -> f64 {
    match shape {
        CurrentShape::Linear { phase } => SQRT_2 * (angle + phase).sin(),
        CurrentShape::NonLinear { crest_factor } => {
            let width = TAU / (crest_factor * crest_factor);
            let half_width = (width / 2.0).min(FRAC_PI_2);
            let pulse = |center: f64| {
                let offset = angle - center;
                (offset.abs() < half_width).then(|| crest_factor * (PI * offset / width).cos())
            };
            pulse(FRAC_PI_2)
                .or_else(|| pulse(PI + FRAC_PI_2).map(|v| -v))
                .unwrap_or(0.0)
        }
    }
}

/// Waveforms of one operating point.
#[derive(Debug, Clone, Copy)]
pub struct Waveform {
    amplitude: f64,
    rms_current: f64,
    shape: CurrentShape,
}

impl Waveform {
    pub fn new(op: &OperatingPoint) -> Self {
        Self {
            amplitude: op.ar,
            rms_current: op.ief,
            shape: op.current,
        }
    }

    /// Reference voltage `Ar * sin(angle)` (V).
    pub fn reference_voltage(&self, angle: f64) -> f64 {
        self.amplitude * angle.sin()
    }

    /// Instantaneous load current (A).
    pub fn current(&self, angle: f64) -> f64 {
        self.rms_current * normalized_current(angle, self.shape)
    }

    /// RMS of the reference voltage for a sampled sinusoid (V).
    pub fn theoretical_voltage_rms(&self) -> f64 {
        self.amplitude / SQRT_2
    }

    pub fn theoretical_current_rms(&self) -> f64 {
        self.rms_current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rms(shape: CurrentShape, samples: usize) -> f64 {
        let sum: f64 = (0..samples)
            .map(|k| {
                let angle = TAU * (k as f64 + 0.5) / samples as f64;
                normalized_current(angle, shape).powi(2)
            })
            .sum();
        (sum / samples as f64).sqrt()
    }

    #[test]
    fn test_linear_current() {
        let shape = CurrentShape::Linear { phase: 0.0 };
        assert_relative_eq!(normalized_current(FRAC_PI_2, shape), SQRT_2);
        assert_relative_eq!(rms(shape, 3600), 1.0, epsilon = 1e-9);

        let lagging = CurrentShape::Linear { phase: -FRAC_PI_2 };
        assert_relative_eq!(normalized_current(FRAC_PI_2, lagging), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nonlinear_pulses() {
        let shape = CurrentShape::NonLinear { crest_factor: 2.0 };
        // Width pi/2: pulses span pi/4..3pi/4 and 5pi/4..7pi/4
        assert_relative_eq!(normalized_current(FRAC_PI_2, shape), 2.0);
        assert_relative_eq!(normalized_current(PI + FRAC_PI_2, shape), -2.0);
        assert_eq!(normalized_current(0.1, shape), 0.0);
        assert_eq!(normalized_current(PI, shape), 0.0);
        assert_relative_eq!(rms(shape, 36_000), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_wide_pulses_stay_in_their_half_cycle() {
        // Crest factor 1.2 gives a pulse wider than pi
        let shape = CurrentShape::NonLinear { crest_factor: 1.2 };
        assert!(normalized_current(PI - 0.1, shape) > 0.0);
        assert!(normalized_current(PI + 0.1, shape) < 0.0);
        assert!(normalized_current(0.1, shape) > 0.0);
        assert!(normalized_current(TAU - 0.1, shape) < 0.0);
        assert_relative_eq!(
            normalized_current(PI + 0.1, shape),
            -normalized_current(0.1, shape),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_scaled_waveform() {
        let op = OperatingPoint::default();
        let wave = Waveform::new(&op);
        assert_relative_eq!(wave.reference_voltage(FRAC_PI_2), 300.0);
        assert_relative_eq!(wave.current(FRAC_PI_2), 4.25 * SQRT_2);
        assert_relative_eq!(wave.theoretical_voltage_rms(), 300.0 / SQRT_2);
    }
}
