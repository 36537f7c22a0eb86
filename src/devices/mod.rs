//! Semiconductor loss models.
//!
//! Every model is a pure function of the instantaneous current (and, for
//! diode recovery, the blocked voltage):
//!
//! - [`ConductionModel`] - on-state voltage fit, energy per switching period
//! - [`EnergyCurve`] - measured `Eon + Eoff` of a switch, energy per transition pair
//! - [`RecoveryModel`] - diode reverse-recovery energy
//!
//! [`DeviceLibrary`] groups one model per device family and evaluates all of
//! them at once into [`InstantLosses`].

mod conduction;
mod curve;
mod library;
mod switching;

pub use conduction::{ConductionModel, OnVoltageFit};
pub use curve::{interpolate, Curve};
pub use library::{DeviceLibrary, DiodeModel, SwitchModel};
pub use switching::{EnergyCurve, RecoveryModel};

use crate::converter::DeviceFamily;

/// Conduction and switching energy of one device family for one switching period (J).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FamilyLosses {
    pub conduction: f64,
    pub switching: f64,
}

/// Candidate energies of every family at one sample of the cycle.
///
/// The dispatcher decides which devices actually pick them up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InstantLosses {
    pub switch: FamilyLosses,
    pub diode: FamilyLosses,
    pub bridge_diode: FamilyLosses,
}

impl InstantLosses {
    /// Energies of `family`.
    pub fn family(&self, family: DeviceFamily) -> FamilyLosses {
        match family {
            DeviceFamily::Switch => self.switch,
            DeviceFamily::Diode => self.diode,
            DeviceFamily::BridgeDiode => self.bridge_diode,
        }
    }
}
