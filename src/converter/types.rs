//! Core types naming the converter's semiconductors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A switch position of the seven-level topology.
///
/// `S1`..`S4` are unidirectional switches with an anti-parallel diode,
/// `S5` and `S6` are bidirectional switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Leg {
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
}

impl Leg {
    /// All switch positions in topology order.
    pub const ALL: [Leg; 6] = [Leg::S1, Leg::S2, Leg::S3, Leg::S4, Leg::S5, Leg::S6];

    /// Check if this position holds a bidirectional switch.
    pub fn is_bidirectional(self) -> bool {
        matches!(self, Leg::S5 | Leg::S6)
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Leg::S1 => "S1",
            Leg::S2 => "S2",
            Leg::S3 => "S3",
            Leg::S4 => "S4",
            Leg::S5 => "S5",
            Leg::S6 => "S6",
        };
        f.write_str(name)
    }
}

/// Direction of the load current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    /// Both polarities.
    pub const ALL: [Polarity; 2] = [Polarity::Positive, Polarity::Negative];

    /// Polarity of an instantaneous current. Zero counts as positive.
    pub fn of(current: f64) -> Self {
        if current >= 0.0 {
            Polarity::Positive
        } else {
            Polarity::Negative
        }
    }

    /// Dense index, used to address tables.
    pub fn index(self) -> usize {
        match self {
            Polarity::Positive => 0,
            Polarity::Negative => 1,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Positive => f.write_str("positive"),
            Polarity::Negative => f.write_str("negative"),
        }
    }
}

/// Circuit realization of the bidirectional switches `S5` and `S6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Realization {
    /// One controllable switch embedded in a four-diode bridge.
    DiodeBridge,
    /// Two switch + diode pairs in anti-series, one per current direction.
    AntiSeries,
}

impl Realization {
    /// Every supported realization.
    pub const ALL: [Realization; 2] = [Realization::DiodeBridge, Realization::AntiSeries];

    /// Dense index, used to address tables.
    pub fn index(self) -> usize {
        match self {
            Realization::DiodeBridge => 0,
            Realization::AntiSeries => 1,
        }
    }

    /// Every device of the converter when built with this realization.
    pub fn devices(self) -> Vec<Device> {
        let unidirectional = [Leg::S1, Leg::S2, Leg::S3, Leg::S4]
            .into_iter()
            .flat_map(|leg| [Element::Switch, Element::Diode].map(|e| Device::new(leg, e)));

        let bidirectional_elements: &[Element] = match self {
            Realization::DiodeBridge => &[
                Element::Switch,
                Element::BridgeDiodePositive,
                Element::BridgeDiodeNegative,
            ],
            Realization::AntiSeries => &[
                Element::SwitchPositive,
                Element::SwitchNegative,
                Element::DiodePositive,
                Element::DiodeNegative,
            ],
        };
        let bidirectional = [Leg::S5, Leg::S6].into_iter().flat_map(move |leg| {
            bidirectional_elements
                .iter()
                .map(move |&e| Device::new(leg, e))
        });

        unidirectional.chain(bidirectional).collect()
    }
}

impl fmt::Display for Realization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Realization::DiodeBridge => f.write_str("diode bridge"),
            Realization::AntiSeries => f.write_str("anti-series"),
        }
    }
}

/// Semiconductor family, selecting which loss model applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    /// Controllable main switch (IGBT)
    Switch,
    /// Fast diode co-packaged with the switch
    Diode,
    /// Steering diode of a bidirectional diode bridge
    BridgeDiode,
}

impl DeviceFamily {
    pub const ALL: [DeviceFamily; 3] = [
        DeviceFamily::Switch,
        DeviceFamily::Diode,
        DeviceFamily::BridgeDiode,
    ];

    /// Parse a family from its DSL keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "switch" | "sw" | "q" => Some(Self::Switch),
            "diode" | "d" => Some(Self::Diode),
            "bridge" | "bridge_diode" => Some(Self::BridgeDiode),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFamily::Switch => f.write_str("switch"),
            DeviceFamily::Diode => f.write_str("diode"),
            DeviceFamily::BridgeDiode => f.write_str("bridge diode"),
        }
    }
}

/// A semiconductor inside a switch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    /// Main switch (`S1`..`S4`, or the bridge-embedded switch of `S5`/`S6`)
    Switch,
    /// Anti-parallel diode of `S1`..`S4`
    Diode,
    /// Bridge diode pair conducting positive current
    BridgeDiodePositive,
    /// Bridge diode pair conducting negative current
    BridgeDiodeNegative,
    /// Anti-series switch conducting positive current
    SwitchPositive,
    /// Anti-series switch conducting negative current
    SwitchNegative,
    /// Anti-series diode conducting positive current
    DiodePositive,
    /// Anti-series diode conducting negative current
    DiodeNegative,
}

impl Element {
    /// Loss model family of this element.
    pub fn family(self) -> DeviceFamily {
        match self {
            Element::Switch | Element::SwitchPositive | Element::SwitchNegative => {
                DeviceFamily::Switch
            }
            Element::Diode | Element::DiodePositive | Element::DiodeNegative => DeviceFamily::Diode,
            Element::BridgeDiodePositive | Element::BridgeDiodeNegative => {
                DeviceFamily::BridgeDiode
            }
        }
    }

    /// Number of identical physical devices one accumulator stands for.
    ///
    /// Bridge current always crosses two diodes of the same pair.
    pub fn multiplicity(self) -> usize {
        match self {
            Element::BridgeDiodePositive | Element::BridgeDiodeNegative => 2,
            _ => 1,
        }
    }

    /// Current direction this element is restricted to, if any.
    pub fn polarity(self) -> Option<Polarity> {
        match self {
            Element::BridgeDiodePositive | Element::SwitchPositive | Element::DiodePositive => {
                Some(Polarity::Positive)
            }
            Element::BridgeDiodeNegative | Element::SwitchNegative | Element::DiodeNegative => {
                Some(Polarity::Negative)
            }
            Element::Switch | Element::Diode => None,
        }
    }

    /// Short schematic label.
    pub fn label(self) -> &'static str {
        match self {
            Element::Switch => "Q",
            Element::Diode => "D",
            Element::BridgeDiodePositive | Element::DiodePositive => "Dp",
            Element::BridgeDiodeNegative | Element::DiodeNegative => "Dn",
            Element::SwitchPositive => "Qp",
            Element::SwitchNegative => "Qn",
        }
    }
}

/// A single loss accumulator: one element of one switch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Device {
    pub leg: Leg,
    pub element: Element,
}

impl Device {
    /// Create a device identifier.
    pub const fn new(leg: Leg, element: Element) -> Self {
        Self { leg, element }
    }

    /// Loss model family.
    pub fn family(&self) -> DeviceFamily {
        self.element.family()
    }

    /// Number of physical devices this accumulator represents.
    pub fn multiplicity(&self) -> usize {
        self.element.multiplicity()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.leg, self.element.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realization_device_sets() {
        let bridge = Realization::DiodeBridge.devices();
        let series = Realization::AntiSeries.devices();
        assert_eq!(bridge.len(), 8 + 6);
        assert_eq!(series.len(), 8 + 8);
        assert!(bridge.contains(&Device::new(Leg::S5, Element::BridgeDiodeNegative)));
        assert!(!series.contains(&Device::new(Leg::S5, Element::Switch)));
    }

    #[test]
    fn test_device_labels() {
        assert_eq!(Device::new(Leg::S3, Element::Diode).to_string(), "S3 D");
        assert_eq!(Device::new(Leg::S6, Element::SwitchNegative).to_string(), "S6 Qn");
        assert_eq!(Element::BridgeDiodePositive.multiplicity(), 2);
    }

    #[test]
    fn test_zero_current_is_positive() {
        assert_eq!(Polarity::of(0.0), Polarity::Positive);
        assert_eq!(Polarity::of(-1e-12), Polarity::Negative);
    }
}
