//! Device model knowledge base.
//!
//! A [`DeviceLibrary`] holds one model per [`DeviceFamily`]. The built-in
//! set is the datasheet data of an IRG4PC50UD IGBT with its co-packaged
//! diode and a UF5408 ultrafast rectifier for the bridge; a description
//! file can replace any of them with `.model` / `.curve` / `.use`.

use std::collections::HashMap;

use serde::Serialize;

use crate::converter::DeviceFamily;
use crate::dsl::{CurveDef, DescriptionAst, ModelDef, ModelType};
use crate::error::{ConvlossError, Result};

use super::conduction::{ConductionModel, OnVoltageFit};
use super::curve::Curve;
use super::switching::{EnergyCurve, RecoveryModel};
use super::{FamilyLosses, InstantLosses};

/// Gate resistance correction applied to the IRG4PC50UD datasheet curve.
const IRG4PC50UD_GATE_SCALE: f64 = 2.65279 / 1.58282;

/// IRG4PC50UD `Eon + Eoff` (A, mJ).
const IRG4PC50UD_SWITCHING: [(f64, f64); 5] = [
    (0.0, 0.0),
    (13.554, 1.1391),
    (25.114, 2.3747),
    (39.409, 4.484),
    (54.093, 6.5859),
];

const SWITCH_KEYS: [&str; 6] = ["a", "b", "c", "knee", "vth", "scale"];
const DIODE_KEYS: [&str; 13] = [
    "a", "b", "c", "p0", "p1", "p2", "p3", "p4", "knee", "vth", "qrr", "trr", "irr",
];

/// A controllable switch: conduction fit and switching energy curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchModel {
    pub name: String,
    pub conduction: ConductionModel,
    pub switching: EnergyCurve,
}

impl SwitchModel {
    /// IRG4PC50UD, 600 V / 27 A UltraFast IGBT.
    pub fn irg4pc50ud() -> Self {
        Self {
            name: "IRG4PC50UD".to_string(),
            conduction: ConductionModel {
                fit: OnVoltageFit::Quadratic {
                    a: 34.494,
                    b: -45.751198,
                    c: 15.3045316,
                },
                knee: 0.2,
                threshold: 0.707,
            },
            switching: EnergyCurve {
                curve: Curve::from_knots(&IRG4PC50UD_SWITCHING),
                scale: IRG4PC50UD_GATE_SCALE,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.conduction
            .validate()
            .map_err(|e| rename_model_error(e, &self.name))?;
        EnergyCurve::new(self.switching.curve.clone(), self.switching.scale)
            .map_err(|e| rename_model_error(e, &self.name))?;
        Ok(())
    }
}

/// A diode: conduction fit and reverse-recovery model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiodeModel {
    pub name: String,
    pub conduction: ConductionModel,
    pub recovery: RecoveryModel,
}

impl DiodeModel {
    /// Anti-parallel diode co-packaged with the IRG4PC50UD.
    pub fn irg4pc50ud_diode() -> Self {
        Self {
            name: "IRG4PC50UD_D".to_string(),
            conduction: ConductionModel {
                fit: OnVoltageFit::Quadratic {
                    a: 33.050759762,
                    b: -48.682061178,
                    c: 19.131811979,
                },
                knee: 1.3,
                threshold: 0.8,
            },
            recovery: RecoveryModel::Charge { qrr: 300e-9 },
        }
    }

    /// UF5408, 3 A ultrafast rectifier used as bridge diode.
    pub fn uf5408() -> Self {
        Self {
            name: "UF5408".to_string(),
            conduction: ConductionModel {
                fit: OnVoltageFit::LogPolynomial {
                    coefficients: [1.12748, 0.432774, 0.229932, 0.159803, 0.0430482],
                },
                knee: 0.01,
                threshold: 0.6,
            },
            recovery: RecoveryModel::Triangular {
                trr: 75e-9,
                irr: 0.25,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.conduction
            .validate()
            .and_then(|_| self.recovery.validate())
            .map_err(|e| rename_model_error(e, &self.name))
    }
}

/// Models used for each device family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceLibrary {
    pub switch: SwitchModel,
    pub diode: DiodeModel,
    pub bridge_diode: DiodeModel,
}

impl Default for DeviceLibrary {
    fn default() -> Self {
        Self {
            switch: SwitchModel::irg4pc50ud(),
            diode: DiodeModel::irg4pc50ud_diode(),
            bridge_diode: DiodeModel::uf5408(),
        }
    }
}

impl DeviceLibrary {
    /// Build a library from the `.model`, `.curve` and `.use` lines of a description.
    ///
    /// Families without a `.use` line keep their built-in model; parameters
    /// missing from a `.model` line are taken from the built-in model of the
    /// family it is assigned to.
    pub fn from_ast(ast: &DescriptionAst) -> Result<Self> {
        for curve in ast.curves.values() {
            match ast.models.get(&curve.model) {
                None => {
                    return Err(ConvlossError::UndefinedModel {
                        model: curve.model.clone(),
                        line: curve.line,
                    })
                }
                Some(model) if model.model_type != ModelType::Switch => {
                    return Err(ConvlossError::invalid_model(
                        &curve.model,
                        "switching curves only apply to switch models",
                    ))
                }
                Some(_) => {}
            }
        }

        let mut library = Self::default();
        for assignment in &ast.assignments {
            let model = ast.models.get(&assignment.model).ok_or_else(|| {
                ConvlossError::UndefinedModel {
                    model: assignment.model.clone(),
                    line: assignment.line,
                }
            })?;

            let expected = match assignment.family {
                DeviceFamily::Switch => ModelType::Switch,
                DeviceFamily::Diode | DeviceFamily::BridgeDiode => ModelType::Diode,
            };
            if model.model_type != expected {
                return Err(ConvlossError::parse(
                    assignment.line,
                    format!(
                        "model '{}' cannot be used as {}",
                        model.name, assignment.family
                    ),
                ));
            }

            match assignment.family {
                DeviceFamily::Switch => {
                    library.switch =
                        switch_from_def(model, ast.curves.get(&model.name), &library.switch)?;
                }
                DeviceFamily::Diode => {
                    library.diode = diode_from_def(model, &library.diode)?;
                }
                DeviceFamily::BridgeDiode => {
                    library.bridge_diode = diode_from_def(model, &library.bridge_diode)?;
                }
            }
            tracing::debug!("{} model set to {}", assignment.family, model.name);
        }

        Ok(library)
    }

    /// Check every model of the library.
    pub fn validate(&self) -> Result<()> {
        self.switch.validate()?;
        self.diode.validate()?;
        self.bridge_diode.validate()
    }

    /// Name of the model used for `family`.
    pub fn model_name(&self, family: DeviceFamily) -> &str {
        match family {
            DeviceFamily::Switch => &self.switch.name,
            DeviceFamily::Diode => &self.diode.name,
            DeviceFamily::BridgeDiode => &self.bridge_diode.name,
        }
    }

    /// Evaluate every family's losses for one switching period.
    ///
    /// `current` is the instantaneous load current (its magnitude is used),
    /// `blocked_voltage` the voltage commutated in the active interval and
    /// `period` the switching period.
    pub fn evaluate(
        &self,
        current: f64,
        blocked_voltage: f64,
        period: f64,
    ) -> Result<InstantLosses> {
        let i = current.abs();
        Ok(InstantLosses {
            switch: FamilyLosses {
                conduction: self.switch.conduction.energy(i, period),
                switching: self.switch.switching.energy(i)?,
            },
            diode: FamilyLosses {
                conduction: self.diode.conduction.energy(i, period),
                switching: self.diode.recovery.energy(blocked_voltage),
            },
            bridge_diode: FamilyLosses {
                conduction: self.bridge_diode.conduction.energy(i, period),
                switching: self.bridge_diode.recovery.energy(blocked_voltage),
            },
        })
    }
}

fn rename_model_error(err: ConvlossError, name: &str) -> ConvlossError {
    match err {
        ConvlossError::InvalidModel { message, .. } => ConvlossError::invalid_model(name, message),
        other => other,
    }
}

fn check_keys(model: &ModelDef, allowed: &[&str]) -> Result<()> {
    let mut keys: Vec<&String> = model.params.keys().collect();
    keys.sort();
    match keys.into_iter().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(ConvlossError::invalid_model(
            &model.name,
            format!("unknown parameter '{}'", key),
        )),
        None => Ok(()),
    }
}

fn has_any(params: &HashMap<String, f64>, keys: &[&str]) -> bool {
    keys.iter().any(|k| params.contains_key(*k))
}

/// Resolve the on-voltage fit of a model, filling gaps from `fallback`.
fn fit_from_def(model: &ModelDef, fallback: OnVoltageFit) -> Result<OnVoltageFit> {
    let params = &model.params;
    let quadratic = has_any(params, &["a", "b", "c"]);
    let polynomial = has_any(params, &["p0", "p1", "p2", "p3", "p4"]);

    let missing = |key: &str| {
        ConvlossError::invalid_model(&model.name, format!("missing parameter '{}'", key))
    };

    match (quadratic, polynomial) {
        (true, true) => Err(ConvlossError::invalid_model(
            &model.name,
            "give either a quadratic fit (a b c) or a log polynomial (p0..p4), not both",
        )),
        (true, false) => {
            let base = match fallback {
                OnVoltageFit::Quadratic { a, b, c } => Some([a, b, c]),
                OnVoltageFit::LogPolynomial { .. } => None,
            };
            let mut values = [0.0; 3];
            for (k, key) in ["a", "b", "c"].into_iter().enumerate() {
                values[k] = match (params.get(key), base) {
                    (Some(&v), _) => v,
                    (None, Some(base)) => base[k],
                    (None, None) => return Err(missing(key)),
                };
            }
            Ok(OnVoltageFit::Quadratic {
                a: values[0],
                b: values[1],
                c: values[2],
            })
        }
        (false, true) => {
            let base = match fallback {
                OnVoltageFit::LogPolynomial { coefficients } => Some(coefficients),
                OnVoltageFit::Quadratic { .. } => None,
            };
            let mut coefficients = [0.0; 5];
            for (k, key) in ["p0", "p1", "p2", "p3", "p4"].into_iter().enumerate() {
                coefficients[k] = match (params.get(key), base) {
                    (Some(&v), _) => v,
                    (None, Some(base)) => base[k],
                    (None, None) => return Err(missing(key)),
                };
            }
            Ok(OnVoltageFit::LogPolynomial { coefficients })
        }
        (false, false) => Ok(fallback),
    }
}

fn conduction_from_def(model: &ModelDef, fallback: &ConductionModel) -> Result<ConductionModel> {
    let fit = fit_from_def(model, fallback.fit)?;
    let knee = model.params.get("knee").copied().unwrap_or(fallback.knee);
    let threshold = model.params.get("vth").copied().unwrap_or(fallback.threshold);
    ConductionModel::new(fit, knee, threshold).map_err(|e| rename_model_error(e, &model.name))
}

fn switch_from_def(
    model: &ModelDef,
    curve: Option<&CurveDef>,
    fallback: &SwitchModel,
) -> Result<SwitchModel> {
    check_keys(model, &SWITCH_KEYS)?;

    let conduction = conduction_from_def(model, &fallback.conduction)?;
    let curve = match curve {
        Some(def) => Curve::new(&def.points).map_err(|e| rename_model_error(e, &model.name))?,
        None => fallback.switching.curve.clone(),
    };
    let scale = model.params.get("scale").copied().unwrap_or(fallback.switching.scale);
    let switching = EnergyCurve::new(curve, scale).map_err(|e| rename_model_error(e, &model.name))?;

    Ok(SwitchModel {
        name: model.name.clone(),
        conduction,
        switching,
    })
}

fn diode_from_def(model: &ModelDef, fallback: &DiodeModel) -> Result<DiodeModel> {
    check_keys(model, &DIODE_KEYS)?;

    let conduction = conduction_from_def(model, &fallback.conduction)?;
    let params = &model.params;
    let recovery = match (params.get("qrr"), has_any(params, &["trr", "irr"])) {
        (Some(_), true) => {
            return Err(ConvlossError::invalid_model(
                &model.name,
                "give either qrr or trr/irr, not both",
            ))
        }
        (Some(&qrr), false) => RecoveryModel::Charge { qrr },
        (None, true) => {
            let (base_trr, base_irr) = match fallback.recovery {
                RecoveryModel::Triangular { trr, irr } => (Some(trr), Some(irr)),
                RecoveryModel::Charge { .. } => (None, None),
            };
            let trr = params.get("trr").copied().or(base_trr);
            let irr = params.get("irr").copied().or(base_irr);
            match (trr, irr) {
                (Some(trr), Some(irr)) => RecoveryModel::Triangular { trr, irr },
                (None, _) => {
                    return Err(ConvlossError::invalid_model(
                        &model.name,
                        "missing parameter 'trr'",
                    ))
                }
                (_, None) => {
                    return Err(ConvlossError::invalid_model(
                        &model.name,
                        "missing parameter 'irr'",
                    ))
                }
            }
        }
        (None, false) => fallback.recovery,
    };
    recovery
        .validate()
        .map_err(|e| rename_model_error(e, &model.name))?;

    Ok(DiodeModel {
        name: model.name.clone(),
        conduction,
        recovery,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn library(input: &str) -> Result<DeviceLibrary> {
        DeviceLibrary::from_ast(&crate::dsl::parse(input).unwrap())
    }

    #[test]
    fn test_builtin_models_are_valid() {
        DeviceLibrary::default().validate().unwrap();
    }

    #[test]
    fn test_builtin_switching_energy() {
        let lib = DeviceLibrary::default();
        // First knot: 1.1391 mJ at 13.554 A
        let e = lib.switch.switching.energy(13.554).unwrap();
        assert_relative_eq!(e, 1.1391e-3 * IRG4PC50UD_GATE_SCALE, epsilon = 1e-12);
    }

    #[test]
    fn test_evaluate_uses_magnitude() {
        let lib = DeviceLibrary::default();
        let pos = lib.evaluate(5.0, 200.0, 1.0 / 21_600.0).unwrap();
        let neg = lib.evaluate(-5.0, 200.0, 1.0 / 21_600.0).unwrap();
        assert_eq!(pos, neg);
        assert_relative_eq!(pos.diode.switching, 200.0 * 300e-9);
        assert_relative_eq!(pos.bridge_diode.switching, 200.0 * 75e-9 * 0.25 / 2.0);
        assert!(pos.switch.conduction > 0.0);
    }

    #[test]
    fn test_evaluate_rejects_current_beyond_curve() {
        let lib = DeviceLibrary::default();
        assert!(matches!(
            lib.evaluate(60.0, 100.0, 1e-4),
            Err(ConvlossError::InterpolationDomain { .. })
        ));
    }

    #[test]
    fn test_override_from_description() {
        let lib = library(
            "\
.model FAST D (qrr=100n)
.model Q2 SW (scale=1)
.curve Q2 0 0 100 10
.use diode FAST
.use switch Q2
",
        )
        .unwrap();
        assert_eq!(lib.diode.name, "FAST");
        match lib.diode.recovery {
            RecoveryModel::Charge { qrr } => assert_relative_eq!(qrr, 100e-9),
            other => panic!("expected charge recovery, got {:?}", other),
        }
        // Conduction fit inherited from the co-packaged diode
        assert_eq!(lib.diode.conduction, DiodeModel::irg4pc50ud_diode().conduction);
        assert_relative_eq!(lib.switch.switching.energy(50.0).unwrap(), 5e-3);
        assert_eq!(lib.bridge_diode.name, "UF5408");
    }

    #[test]
    fn test_fit_kind_switch() {
        let lib = library(".model BR D (a=30 b=-40 c=15 knee=2)\n.use bridge BR").unwrap();
        assert!(matches!(
            lib.bridge_diode.conduction.fit,
            OnVoltageFit::Quadratic { a, .. } if a == 30.0
        ));
        // Bridge template is a polynomial: a partial quadratic has nothing to inherit
        assert!(library(".model BR D (a=30 knee=1.5)\n.use bridge BR").is_err());
    }

    #[test]
    fn test_invalid_descriptions() {
        assert!(matches!(
            library(".use switch NOPE"),
            Err(ConvlossError::UndefinedModel { .. })
        ));
        assert!(library(".model D1 D\n.use switch D1").is_err());
        assert!(library(".model D1 D (rds=1)\n.use diode D1").is_err());
        assert!(library(".model D1 D\n.curve D1 0 0 1 1").is_err());
        assert!(library(".curve X 0 0 1 1").is_err());
        assert!(library(".model D1 D (qrr=1n trr=5n)\n.use diode D1").is_err());
    }
}
