use approx::assert_relative_eq;

use convloss_core::converter::{ConfigWarning, CurrentShape, Device, Element, Leg};
use convloss_core::{
    calculate, CalculatorConfig, ConvlossError, LossCalculator, OperatingPoint, Realization,
    ValidationMode,
};

const DEMO: &str = include_str!("../demos/seven_level.cnv");

fn run(op: OperatingPoint) -> convloss_core::CycleReport {
    LossCalculator::new(op).unwrap().run().unwrap()
}

#[test]
fn test_default_scenario() {
    let report = run(OperatingPoint::default());

    assert_relative_eq!(report.modulation.mf, 360.0);
    assert_relative_eq!(report.modulation.ma, 1.0);
    assert_relative_eq!(
        report.modulation.boundary_angles[1].to_radians(),
        0.3398,
        epsilon = 1e-4
    );
    assert_eq!(report.modulation.switching_counts, [39, 44, 97, 39, 44, 97]);

    for realization in Realization::ALL {
        let r = report.realization(realization).unwrap();
        assert!(
            r.total_loss > 30.0 && r.total_loss < 60.0,
            "{}: {} W",
            realization,
            r.total_loss
        );
        assert!(r.efficiency > 95.0, "{}: {} %", realization, r.efficiency);
        assert_relative_eq!(
            r.delivered_power + r.total_loss,
            report.output_power,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            r.conduction_loss + r.switching_loss,
            r.total_loss,
            max_relative = 1e-12
        );
    }
}

#[test]
fn test_half_cycle_symmetry() {
    let report = run(OperatingPoint::default());
    let bridge = report.realization(Realization::DiodeBridge).unwrap();
    let power = |leg, element| bridge.device(Device::new(leg, element)).unwrap().power;

    for element in [Element::Switch, Element::Diode] {
        assert_relative_eq!(
            power(Leg::S1, element),
            power(Leg::S2, element),
            max_relative = 1e-6
        );
        assert_relative_eq!(
            power(Leg::S3, element),
            power(Leg::S4, element),
            max_relative = 1e-6
        );
    }
    // The inner switches carry current for the whole cycle, the outer ones only near the peaks
    assert!(power(Leg::S3, Element::Switch) > power(Leg::S1, Element::Switch));
}

#[test]
fn test_rms_round_trip() {
    for current in [
        CurrentShape::Linear { phase: 0.0 },
        CurrentShape::Linear { phase: -0.6 },
        CurrentShape::NonLinear { crest_factor: 2.0 },
    ] {
        let report = run(OperatingPoint {
            current,
            ..OperatingPoint::default()
        });
        assert_relative_eq!(report.rms.realized_current, 4.25, max_relative = 0.01);
        assert_relative_eq!(report.rms.realized_voltage, 300.0 / 2f64.sqrt(), max_relative = 0.01);
    }
}

#[test]
fn test_lagging_current_uses_diodes() {
    let in_phase = run(OperatingPoint::default());
    let lagging = run(OperatingPoint {
        current: CurrentShape::Linear { phase: -0.6 },
        ..OperatingPoint::default()
    });

    assert!(lagging.output_power < in_phase.output_power);
    let bridge = lagging.realization(Realization::DiodeBridge).unwrap();
    let s3_diode = bridge.device(Device::new(Leg::S3, Element::Diode)).unwrap();
    assert!(s3_diode.power > 0.0);
    assert!(s3_diode.mean_current > 0.0);
}

#[test]
fn test_carrier_below_fundamental() {
    let op = OperatingPoint {
        fp: 50.0,
        ..OperatingPoint::default()
    };

    let calc = LossCalculator::new(op).unwrap();
    assert!(calc
        .warnings()
        .contains(&ConfigWarning::CarrierBelowFundamental { fp: 50.0, fr: 60.0 }));
    assert_eq!(op.sub_periods(), 0);
    assert!(matches!(calc.run(), Err(ConvlossError::EmptyCycle { .. })));

    let strict = CalculatorConfig::new().with_validation(ValidationMode::Strict);
    assert!(matches!(
        LossCalculator::with_config(op, strict),
        Err(ConvlossError::ConfigurationInvalid { .. })
    ));
}

#[test]
fn test_demo_description_matches_defaults() {
    let from_file = calculate(DEMO, CalculatorConfig::default()).unwrap();
    let defaults = run(OperatingPoint::default());

    assert_eq!(from_file.operating_point, defaults.operating_point);
    for realization in Realization::ALL {
        assert_relative_eq!(
            from_file.realization(realization).unwrap().efficiency,
            defaults.realization(realization).unwrap().efficiency,
            max_relative = 1e-12
        );
    }
    assert_eq!(from_file.models["bridge diode"], "UF5408");
}

#[test]
fn test_description_overrides() {
    let description = "\
.param ief 6
.param fp 10k
.model SLOWQ SW (scale=2)
.use switch SLOWQ
";
    let report = calculate(description, CalculatorConfig::default()).unwrap();
    assert_eq!(report.modulation.sub_periods, 166);
    assert_eq!(report.models["switch"], "SLOWQ");

    let baseline = calculate(".param ief 6\n.param fp 10k", CalculatorConfig::default()).unwrap();
    let slow = report.realization(Realization::AntiSeries).unwrap();
    let fast = baseline.realization(Realization::AntiSeries).unwrap();
    assert!(slow.switching_loss > fast.switching_loss);
    assert_relative_eq!(slow.conduction_loss, fast.conduction_loss, max_relative = 1e-12);
}

#[test]
fn test_description_errors() {
    let config = CalculatorConfig::default;
    assert!(matches!(
        calculate(".param vdc 400", config()),
        Err(ConvlossError::UnknownParameter { .. })
    ));
    assert!(matches!(
        calculate(".use bridge MISSING", config()),
        Err(ConvlossError::UndefinedModel { .. })
    ));
    assert!(matches!(
        calculate(".param ar 150", config()),
        Err(ConvlossError::InvalidParameter { .. })
    ));
    // A current beyond the measured switching curve is never extrapolated
    assert!(matches!(
        calculate(".param ief 50", config()),
        Err(ConvlossError::InterpolationDomain { .. })
    ));
}
