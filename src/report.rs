//! Plain-text report output for the CLI frontend.

use std::io::Write;

use crate::converter::{CurrentShape, Realization};
use crate::engine::{CycleReport, Interval, RealizationReport};
use crate::error::{ConvlossError, Result};
use crate::rad_to_deg;

fn output_error(e: std::io::Error) -> ConvlossError {
    ConvlossError::OutputError {
        message: e.to_string(),
    }
}

/// Write the human-readable summary of a run.
pub fn write_text<W: Write>(report: &CycleReport, out: &mut W) -> Result<()> {
    write_summary(report, out).map_err(output_error)
}

fn write_summary<W: Write>(report: &CycleReport, out: &mut W) -> std::io::Result<()> {
    let op = &report.operating_point;
    let rms = &report.rms;

    writeln!(out, "Operating point:")?;
    writeln!(out, "  V1            = {} V", op.v1)?;
    writeln!(out, "  V2            = {} V", op.v2)?;
    writeln!(out, "  Ar            = {} V", op.ar)?;
    writeln!(
        out,
        "  Vref rms      = {:.3} V (sampled {:.3} V)",
        rms.theoretical_voltage, rms.realized_voltage
    )?;
    writeln!(
        out,
        "  Ief           = {} A (sampled {:.3} A)",
        rms.theoretical_current, rms.realized_current
    )?;
    match op.current {
        CurrentShape::Linear { phase } => writeln!(
            out,
            "  Current       = linear, phase {} rad ({:.2} deg)",
            phase,
            rad_to_deg(phase)
        )?,
        CurrentShape::NonLinear { crest_factor } => writeln!(
            out,
            "  Current       = non-linear, crest factor {}",
            crest_factor
        )?,
    }
    writeln!(out, "  fr            = {} Hz", op.fr)?;
    writeln!(out, "  fp            = {} Hz", op.fp)?;

    let modulation = &report.modulation;
    writeln!(out)?;
    writeln!(out, "Modulation:")?;
    writeln!(out, "  ma            = {:.4}", modulation.ma)?;
    writeln!(out, "  mf            = {:.3}", modulation.mf)?;
    writeln!(out, "  periods/cycle = {}", modulation.sub_periods)?;
    let angles: Vec<String> = modulation
        .rounded_angles
        .iter()
        .map(|a| format!("{:.1}", a))
        .collect();
    writeln!(out, "  Boundaries    = {} deg", angles.join(", "))?;
    let counts: Vec<String> = Interval::ALL
        .iter()
        .map(|i| format!("{}={}", i, modulation.switching_counts[i.index()]))
        .collect();
    writeln!(out, "  Periods       = {}", counts.join(" "))?;

    if !report.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Warnings:")?;
        for warning in &report.warnings {
            writeln!(out, "  {}", warning)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Output power    = {:.2} W", report.output_power)?;

    for realization in &report.realizations {
        writeln!(out)?;
        write_realization(realization, report, out)?;
    }

    Ok(())
}

fn write_realization<W: Write>(
    r: &RealizationReport,
    report: &CycleReport,
    out: &mut W,
) -> std::io::Result<()> {
    let heading = match r.realization {
        Realization::DiodeBridge => "Bidirectional switches as diode bridge",
        Realization::AntiSeries => "Bidirectional switches as anti-series pair",
    };
    writeln!(out, "{}:", heading)?;
    writeln!(
        out,
        "  {:<7} {:>12} {:>12} {:>10} {:>10}",
        "Device", "Econd (mJ)", "Esw (mJ)", "P (W)", "Imean (A)"
    )?;
    for d in &r.devices {
        let label = if d.multiplicity > 1 {
            format!("{} x{}", d.label, d.multiplicity)
        } else {
            d.label.clone()
        };
        writeln!(
            out,
            "  {:<7} {:>12.4} {:>12.4} {:>10.3} {:>10.4}",
            label,
            d.conduction_energy * 1e3,
            d.switching_energy * 1e3,
            d.power,
            d.mean_current
        )?;
    }
    writeln!(out, "  Conduction loss = {:.2} W", r.conduction_loss)?;
    writeln!(out, "  Switching loss  = {:.2} W", r.switching_loss)?;
    writeln!(out, "  Total loss      = {:.2} W", r.total_loss)?;
    writeln!(
        out,
        "  Delivered       = {:.2} W of {:.2} W",
        r.delivered_power, report.output_power
    )?;
    writeln!(out, "  Efficiency      = {:.2} %", r.efficiency)?;
    Ok(())
}

/// Write the per-period waveform table as tab separated columns.
pub fn write_series<W: Write>(report: &CycleReport, out: &mut W) -> Result<()> {
    let series = &report.series;
    let mut write_rows = || -> std::io::Result<()> {
        writeln!(out, "angle_deg\tduty_pct\tcurrent_a\tvref_v\tpower_w")?;
        for k in 0..series.len() {
            writeln!(
                out,
                "{:.4}\t{:.4}\t{:.6}\t{:.4}\t{:.4}",
                rad_to_deg(series.angle[k]),
                series.duty_percent[k],
                series.current[k],
                series.reference_voltage[k],
                series.instantaneous_power[k]
            )?;
        }
        Ok(())
    };
    write_rows().map_err(output_error)
}
