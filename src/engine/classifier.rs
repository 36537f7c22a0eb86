//! Conduction interval classification.
//!
//! The reference `Ar * sin(theta)` crosses the source levels `V1` and `V2`
//! at the boundary angles
//!
//! ```text
//! theta1 = asin(V1 / Ar)     theta5 = pi + theta1
//! theta2 = asin(V2 / Ar)     theta6 = pi + theta2
//! theta3 = pi - theta2       theta7 = 2pi - theta2
//! theta4 = pi - theta1       theta8 = 2pi - theta1
//! ```
//!
//! which split the cycle into `A B C B A | D E F E D`. Angles are compared
//! with `<=`, so a sample sitting exactly on a boundary belongs to the
//! earlier interval.

use std::f64::consts::{PI, TAU};
use std::fmt;

use serde::Serialize;

use crate::converter::OperatingPoint;
use crate::error::{ConvlossError, Result};

/// Tolerance absorbing floating point noise when snapping angles to the switching grid.
const GRID_TOLERANCE: f64 = 1e-9;

/// Interval of the modulation cycle, named by the pair of output levels it
/// switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Interval {
    /// `0` and `+V1`
    A,
    /// `+V1` and `+V2`
    B,
    /// `+V2` and `+(V1 + V2)`
    C,
    /// `-V1` and `0`
    D,
    /// `-V2` and `-V1`
    E,
    /// `-(V1 + V2)` and `-V2`
    F,
}

impl Interval {
    pub const ALL: [Interval; 6] = [
        Interval::A,
        Interval::B,
        Interval::C,
        Interval::D,
        Interval::E,
        Interval::F,
    ];

    pub fn index(self) -> usize {
        match self {
            Interval::A => 0,
            Interval::B => 1,
            Interval::C => 2,
            Interval::D => 3,
            Interval::E => 4,
            Interval::F => 5,
        }
    }

    /// Output levels `(low, high)` the converter switches between.
    pub fn levels(self, v1: f64, v2: f64) -> (f64, f64) {
        match self {
            Interval::A => (0.0, v1),
            Interval::B => (v1, v2),
            Interval::C => (v2, v1 + v2),
            Interval::D => (-v1, 0.0),
            Interval::E => (-v2, -v1),
            Interval::F => (-(v1 + v2), -v2),
        }
    }

    /// Voltage commutated by the devices that switch in this interval.
    pub fn blocked_voltage(self, v1: f64, v2: f64) -> f64 {
        match self {
            Interval::A | Interval::D => v1,
            Interval::B | Interval::E => v2,
            Interval::C | Interval::F => v1 + v2,
        }
    }

    /// Duty ratio of the high level needed to synthesize `vref` on average.
    pub fn duty_ratio(self, vref: f64, v1: f64, v2: f64) -> f64 {
        match self {
            Interval::A => vref / v1,
            Interval::B => (vref - v1) / (v2 - v1),
            Interval::C => (vref - v2) / v1,
            Interval::D => 1.0 - (-vref) / v1,
            Interval::E => 1.0 - (-vref - v1) / (v2 - v1),
            Interval::F => 1.0 - (-vref - v2) / v1,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interval::A => "A",
            Interval::B => "B",
            Interval::C => "C",
            Interval::D => "D",
            Interval::E => "E",
            Interval::F => "F",
        };
        f.write_str(name)
    }
}

/// Interval following each boundary of [`BoundaryAngles::theoretical`].
const SEQUENCE: [Interval; 10] = [
    Interval::A,
    Interval::B,
    Interval::C,
    Interval::B,
    Interval::A,
    Interval::D,
    Interval::E,
    Interval::F,
    Interval::E,
    Interval::D,
];

/// Level-crossing angles of the reference and their switching-grid counterparts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryAngles {
    bounds: [f64; 11],
    /// Angle covered by one switching period (rad)
    quantum: f64,
}

impl BoundaryAngles {
    /// Compute the boundaries for sources `v1 < v2`, amplitude `ar` and
    /// frequency modulation ratio `mf`.
    pub fn new(v1: f64, v2: f64, ar: f64, mf: f64) -> Result<Self> {
        let theta1 = (v1 / ar).asin();
        let theta2 = (v2 / ar).asin();
        if !(theta1.is_finite() && theta2.is_finite()) {
            return Err(ConvlossError::invalid_parameter(
                "ar",
                format!("amplitude {} V does not reach V1 = {} V and V2 = {} V", ar, v1, v2),
            ));
        }
        if !(mf.is_finite() && mf > 0.0) {
            return Err(ConvlossError::invalid_parameter(
                "fp",
                format!("frequency modulation ratio must be positive, got {}", mf),
            ));
        }

        let bounds = [
            0.0,
            theta1,
            theta2,
            PI - theta2,
            PI - theta1,
            PI,
            PI + theta1,
            PI + theta2,
            TAU - theta2,
            TAU - theta1,
            TAU,
        ];
        Ok(Self {
            bounds,
            quantum: TAU / mf,
        })
    }

    /// `[0, theta1, theta2, theta3, theta4, pi, theta5, theta6, theta7, theta8, 2pi]`
    pub fn theoretical(&self) -> [f64; 11] {
        self.bounds
    }

    /// Index of the first switching period starting at or after each boundary.
    pub fn grid_indices(&self) -> [i64; 11] {
        self.bounds
            .map(|angle| (angle / self.quantum - GRID_TOLERANCE).ceil() as i64)
    }

    /// Boundaries rounded up to the start of the next switching period.
    pub fn rounded(&self) -> [f64; 11] {
        self.grid_indices().map(|k| k as f64 * self.quantum)
    }

    /// Number of switching periods spent in each interval, in [`Interval::ALL`] order.
    pub fn switching_counts(&self) -> [i64; 6] {
        let mut counts = [0; 6];
        let grid = self.grid_indices();
        for (k, interval) in SEQUENCE.iter().enumerate() {
            counts[interval.index()] += grid[k + 1] - grid[k];
        }
        counts
    }

    /// Interval containing `angle` (rad, `0..=2pi`).
    pub fn interval_at(&self, angle: f64) -> Result<Interval> {
        if !(0.0..=TAU).contains(&angle) {
            return Err(ConvlossError::IntervalGap { angle });
        }
        self.bounds[1..]
            .iter()
            .zip(SEQUENCE)
            .find(|(&upper, _)| angle <= upper)
            .map(|(_, interval)| interval)
            .ok_or(ConvlossError::IntervalGap { angle })
    }
}

/// Result of classifying one sample of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub interval: Interval,
    pub duty: f64,
    pub blocked_voltage: f64,
    pub reference_voltage: f64,
}

/// Maps angles of the cycle to intervals, duty ratios and blocked voltages.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    v1: f64,
    v2: f64,
    ar: f64,
    angles: BoundaryAngles,
}

impl Classifier {
    pub fn new(op: &OperatingPoint) -> Result<Self> {
        let angles = BoundaryAngles::new(op.v1, op.v2, op.ar, op.mf())?;
        tracing::debug!(
            "boundary angles (rad): {:?}",
            angles.theoretical()
        );
        Ok(Self {
            v1: op.v1,
            v2: op.v2,
            ar: op.ar,
            angles,
        })
    }

    pub fn angles(&self) -> &BoundaryAngles {
        &self.angles
    }

    pub fn interval_at(&self, angle: f64) -> Result<Interval> {
        self.angles.interval_at(angle)
    }

    /// Classify the sample at `angle`.
    pub fn classify(&self, angle: f64) -> Result<Classification> {
        let interval = self.interval_at(angle)?;
        let reference_voltage = self.ar * angle.sin();
        Ok(Classification {
            interval,
            duty: interval.duty_ratio(reference_voltage, self.v1, self.v2),
            blocked_voltage: interval.blocked_voltage(self.v1, self.v2),
            reference_voltage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn default_angles() -> BoundaryAngles {
        BoundaryAngles::new(100.0, 200.0, 300.0, 360.0).unwrap()
    }

    #[test]
    fn test_theoretical_angles() {
        let theta = default_angles().theoretical();
        assert_relative_eq!(theta[1], 0.3398, epsilon = 1e-4);
        assert_relative_eq!(theta[2], 0.7297, epsilon = 1e-4);
        assert_relative_eq!(theta[3] + theta[2], PI);
        assert_relative_eq!(theta[9] + theta[1], TAU);
    }

    #[test]
    fn test_rounded_angles() {
        let grid = default_angles().grid_indices();
        // One switching period per degree
        assert_eq!(grid, [0, 20, 42, 139, 161, 180, 200, 222, 319, 341, 360]);
        let rounded = default_angles().rounded();
        assert_relative_eq!(rounded[5], PI, epsilon = 1e-12);
    }

    #[test]
    fn test_switching_counts() {
        let counts = default_angles().switching_counts();
        assert_eq!(counts, [39, 44, 97, 39, 44, 97]);
        assert_eq!(counts.iter().sum::<i64>(), 360);
    }

    #[test]
    fn test_interval_sequence() {
        let angles = default_angles();
        let expected = [
            (0.1, Interval::A),
            (0.5, Interval::B),
            (1.5, Interval::C),
            (2.6, Interval::B),
            (3.0, Interval::A),
            (3.3, Interval::D),
            (3.7, Interval::E),
            (4.7, Interval::F),
            (5.7, Interval::E),
            (6.2, Interval::D),
        ];
        for (angle, interval) in expected {
            assert_eq!(angles.interval_at(angle).unwrap(), interval, "angle {}", angle);
        }
    }

    #[test]
    fn test_ties_go_to_earlier_interval() {
        let angles = default_angles();
        let theta = angles.theoretical();
        assert_eq!(angles.interval_at(theta[1]).unwrap(), Interval::A);
        assert_eq!(angles.interval_at(PI).unwrap(), Interval::A);
        assert_eq!(angles.interval_at(0.0).unwrap(), Interval::A);
        assert_eq!(angles.interval_at(TAU).unwrap(), Interval::D);
    }

    #[test]
    fn test_every_boundary_hands_over_to_next_interval() {
        let angles = default_angles();
        let theta = angles.theoretical();
        for k in 1..10 {
            assert_eq!(
                angles.interval_at(theta[k]).unwrap(),
                SEQUENCE[k - 1],
                "theta{}",
                k
            );
            assert_eq!(
                angles.interval_at(theta[k] + 1e-12).unwrap(),
                SEQUENCE[k],
                "just past theta{}",
                k
            );
        }
    }

    #[test]
    fn test_out_of_cycle_angles() {
        let angles = default_angles();
        for angle in [-0.01, TAU + 0.01, f64::NAN] {
            assert!(matches!(
                angles.interval_at(angle),
                Err(ConvlossError::IntervalGap { .. })
            ));
        }
    }

    #[test]
    fn test_duty_synthesizes_reference() {
        let classifier = Classifier::new(&OperatingPoint::default()).unwrap();
        for k in 0..720 {
            let angle = TAU * (k as f64 + 0.5) / 720.0;
            let c = classifier.classify(angle).unwrap();
            let (low, high) = c.interval.levels(100.0, 200.0);
            assert!((-1e-9..=1.0 + 1e-9).contains(&c.duty), "duty {} at {}", c.duty, angle);
            assert_relative_eq!(low + c.duty * (high - low), c.reference_voltage, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_boundary_continuity() {
        // Either side of theta1 synthesizes the same voltage V1
        let vref = 100.0;
        let below = Interval::A.duty_ratio(vref, 100.0, 200.0);
        let above = Interval::B.duty_ratio(vref, 100.0, 200.0);
        assert_relative_eq!(below, 1.0);
        assert_relative_eq!(above, 0.0);
        assert_eq!(Interval::A.levels(100.0, 200.0).1, Interval::B.levels(100.0, 200.0).0);
    }

    #[test]
    fn test_blocked_voltage() {
        assert_eq!(Interval::A.blocked_voltage(100.0, 200.0), 100.0);
        assert_eq!(Interval::E.blocked_voltage(100.0, 200.0), 200.0);
        assert_eq!(Interval::F.blocked_voltage(100.0, 200.0), 300.0);
    }

    #[test]
    fn test_unreachable_level() {
        assert!(BoundaryAngles::new(100.0, 200.0, 150.0, 360.0).is_err());
    }
}
