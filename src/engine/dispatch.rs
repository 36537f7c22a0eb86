//! Loss attribution to the conducting and commutating devices.
//!
//! In every interval the output alternates between two conduction paths,
//! the high-level path for a fraction `d` of the switching period and the
//! low-level path for `1 - d`. Each path crosses two switch positions:
//!
//! | Interval | share `d`  | share `1 - d` |
//! |----------|------------|---------------|
//! | A        | S3, S5     | S3, S4        |
//! | B        | S1, S6     | S3, S5        |
//! | C        | S1, S3     | S1, S6        |
//! | D        | S3, S4     | S4, S6        |
//! | E        | S4, S6     | S2, S5        |
//! | F        | S2, S5     | S2, S4        |
//!
//! A position on both paths conducts for the whole period and never
//! switches. A position on one path conducts for that path's share and
//! pays its family's switching energy once per period. The current
//! direction then picks which semiconductor inside the position carries
//! the current.

use crate::converter::{Device, Element, Leg, Polarity, Realization};
use crate::devices::InstantLosses;
use crate::error::{ConvlossError, Result};

use super::classifier::Interval;

/// Fraction of the switching period a device conducts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Share {
    /// Whole period
    Full,
    /// `d`
    Duty,
    /// `1 - d`
    Complement,
}

impl Share {
    pub fn weight(self, duty: f64) -> f64 {
        match self {
            Share::Full => 1.0,
            Share::Duty => duty,
            Share::Complement => 1.0 - duty,
        }
    }
}

/// A conduction path and the share of the period it is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Path {
    pub share: Share,
    pub legs: [Leg; 2],
}

/// The two conduction paths of `interval`, high level first.
pub fn conduction_paths(interval: Interval) -> [Path; 2] {
    use Leg::*;

    let (high, low) = match interval {
        Interval::A => ([S3, S5], [S3, S4]),
        Interval::B => ([S1, S6], [S3, S5]),
        Interval::C => ([S1, S3], [S1, S6]),
        Interval::D => ([S3, S4], [S4, S6]),
        Interval::E => ([S4, S6], [S2, S5]),
        Interval::F => ([S2, S5], [S2, S4]),
    };
    [
        Path {
            share: Share::Duty,
            legs: high,
        },
        Path {
            share: Share::Complement,
            legs: low,
        },
    ]
}

/// Semiconductors of `leg` that carry a current of the given direction.
pub fn conducting_elements(
    leg: Leg,
    polarity: Polarity,
    realization: Realization,
) -> &'static [Element] {
    match (leg, polarity, realization) {
        (Leg::S1 | Leg::S3, Polarity::Positive, _)
        | (Leg::S2 | Leg::S4, Polarity::Negative, _) => &[Element::Switch],
        (Leg::S1 | Leg::S3, Polarity::Negative, _)
        | (Leg::S2 | Leg::S4, Polarity::Positive, _) => &[Element::Diode],
        (_, Polarity::Positive, Realization::DiodeBridge) => {
            &[Element::Switch, Element::BridgeDiodePositive]
        }
        (_, Polarity::Negative, Realization::DiodeBridge) => {
            &[Element::Switch, Element::BridgeDiodeNegative]
        }
        (_, Polarity::Positive, Realization::AntiSeries) => {
            &[Element::SwitchPositive, Element::DiodePositive]
        }
        (_, Polarity::Negative, Realization::AntiSeries) => {
            &[Element::SwitchNegative, Element::DiodeNegative]
        }
    }
}

/// One device's part in an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribution {
    pub device: Device,
    pub share: Share,
    /// Whether the device commutates once per switching period
    pub switches: bool,
}

/// Energy and current picked up by one device during one switching period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossIncrement {
    pub device: Device,
    /// Conduction energy (J)
    pub conduction: f64,
    /// Switching energy (J)
    pub switching: f64,
    /// Current averaged over the period (A)
    pub current: f64,
}

fn row_index(interval: Interval, polarity: Polarity, realization: Realization) -> usize {
    (interval.index() * 2 + polarity.index()) * 2 + realization.index()
}

/// Attribution rows for every `(interval, polarity, realization)`.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    rows: Vec<Vec<Attribution>>,
}

impl DispatchTable {
    /// Build the table and check that every row is consistent.
    pub fn new() -> Result<Self> {
        let mut rows = vec![Vec::new(); Interval::ALL.len() * 4];
        for interval in Interval::ALL {
            for polarity in Polarity::ALL {
                for realization in Realization::ALL {
                    let row = build_row(interval, polarity, realization);
                    validate_row(interval, polarity, realization, &row)?;
                    rows[row_index(interval, polarity, realization)] = row;
                }
            }
        }
        Ok(Self { rows })
    }

    pub fn row(
        &self,
        interval: Interval,
        polarity: Polarity,
        realization: Realization,
    ) -> &[Attribution] {
        &self.rows[row_index(interval, polarity, realization)]
    }

    /// Distribute one sample's candidate energies over the devices of a row.
    ///
    /// `current` is the magnitude of the load current.
    pub fn attribute<'a>(
        &'a self,
        interval: Interval,
        polarity: Polarity,
        realization: Realization,
        duty: f64,
        current: f64,
        losses: &'a InstantLosses,
    ) -> impl Iterator<Item = LossIncrement> + 'a {
        self.row(interval, polarity, realization)
            .iter()
            .map(move |attribution| {
                let weight = attribution.share.weight(duty);
                let family = losses.family(attribution.device.family());
                LossIncrement {
                    device: attribution.device,
                    conduction: family.conduction * weight,
                    switching: if attribution.switches {
                        family.switching
                    } else {
                        0.0
                    },
                    current: current * weight,
                }
            })
    }
}

fn build_row(interval: Interval, polarity: Polarity, realization: Realization) -> Vec<Attribution> {
    let paths = conduction_paths(interval);
    let mut row: Vec<Attribution> = Vec::new();

    for path in &paths {
        for &leg in &path.legs {
            for &element in conducting_elements(leg, polarity, realization) {
                let device = Device::new(leg, element);
                match row.iter_mut().find(|a| a.device == device) {
                    // Conducts on both paths
                    Some(existing) => {
                        existing.share = Share::Full;
                        existing.switches = false;
                    }
                    None => row.push(Attribution {
                        device,
                        share: path.share,
                        switches: true,
                    }),
                }
            }
        }
    }

    row
}

fn validate_row(
    interval: Interval,
    polarity: Polarity,
    realization: Realization,
    row: &[Attribution],
) -> Result<()> {
    let fail = |message: String| ConvlossError::DispatchInconsistent {
        interval: interval.to_string(),
        polarity: polarity.to_string(),
        message,
    };

    let paths = conduction_paths(interval);
    // Probe duty ratio, chosen away from 0, 1/2 and 1
    let duty = 0.37;
    let total: f64 = paths.iter().map(|p| p.share.weight(duty)).sum();
    if (total - 1.0).abs() > 1e-12 {
        return Err(fail(format!("path shares sum to {}", total)));
    }

    let devices = realization.devices();
    for path in &paths {
        if path.legs[0] == path.legs[1] {
            return Err(fail(format!("path crosses {} twice", path.legs[0])));
        }
    }

    for attribution in row {
        let device = attribution.device;
        if !devices.contains(&device) {
            return Err(fail(format!("{} is not part of the {} realization", device, realization)));
        }
        if device.element.polarity().is_some_and(|p| p != polarity) {
            return Err(fail(format!("{} cannot carry {} current", device, polarity)));
        }
        if attribution.switches != (attribution.share != Share::Full) {
            return Err(fail(format!("{} switches without a partial share", device)));
        }

        // Each element of a position conducts exactly when its position does
        let expected: f64 = paths
            .iter()
            .filter(|p| p.legs.contains(&device.leg))
            .map(|p| p.share.weight(duty))
            .sum();
        let weight = attribution.share.weight(duty);
        if (weight - expected).abs() > 1e-12 {
            return Err(fail(format!(
                "{} conducts {} of the period instead of {}",
                device, weight, expected
            )));
        }
    }

    for path in &paths {
        for &leg in &path.legs {
            if !row.iter().any(|a| a.device.leg == leg) {
                return Err(fail(format!("no device of {} conducts", leg)));
            }
        }
    }

    Ok(())
}
