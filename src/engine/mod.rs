//! Loss engine.
//!
//! One run walks the `floor(mf)` switching periods of a fundamental cycle:
//!
//! 1. [`Waveform`] gives the reference voltage and load current at the
//!    period's midpoint angle.
//! 2. [`Classifier`] places the angle in an [`Interval`] and derives the
//!    duty ratio and blocked voltage.
//! 3. The [`DeviceLibrary`](crate::devices::DeviceLibrary) evaluates every
//!    family's conduction and switching energy at that current.
//! 4. The [`DispatchTable`] hands those energies to the devices that
//!    conduct or commutate, for both realizations of `S5`/`S6`.
//!
//! [`LossCalculator::run`] reduces the accumulated energies to a [`CycleReport`].

mod aggregator;
mod classifier;
mod dispatch;
mod waveform;

pub use aggregator::{
    CalculatorConfig, CycleReport, CycleSample, DeviceReport, LossCalculator, ModulationReport,
    RealizationReport, RmsCheck, WaveformSeries,
};
pub use classifier::{BoundaryAngles, Classification, Classifier, Interval};
pub use dispatch::{
    conducting_elements, conduction_paths, Attribution, DispatchTable, LossIncrement, Path, Share,
};
pub use waveform::{normalized_current, Waveform};
