//! # Power Formulas
//!
//! Stateless energy, backup-time, degradation and line-loss calculations.
//!
//! These functions do no bounds checking. Negative power or resistance is
//! passed straight through the arithmetic; callers validate input (see
//! [`crate::calculator`]).

/// Energy in kWh consumed by a load of `power_w` running for `hours`.
pub fn energy_kwh(power_w: f64, hours: f64) -> f64 {
    power_w * hours / 1000.0
}

/// Total energy in kWh over a sequence of `(power_w, hours)` pairs.
pub fn total_energy_kwh<I>(loads: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let watt_hours: f64 = loads.into_iter().map(|(power_w, hours)| power_w * hours).sum();
    watt_hours / 1000.0
}

/// Hours a battery holding `battery_wh` can sustain `consumption_w`.
///
/// Returns `0.0` when consumption is zero or negative instead of dividing.
pub fn backup_time_hours(battery_wh: f64, consumption_w: f64) -> f64 {
    if consumption_w > 0.0 {
        battery_wh / consumption_w
    } else {
        0.0
    }
}

/// Usable energy after `years` of calendar degradation.
///
/// `initial_wh * efficiency * (1 - degradation_per_year)^years`
pub fn simulate_discharge(
    initial_wh: f64,
    efficiency: f64,
    degradation_per_year: f64,
    years: u32,
) -> f64 {
    let retained = (1.0 - degradation_per_year).powi(years.min(i32::MAX as u32) as i32);
    initial_wh * efficiency * retained
}

/// Resistive (I²R) loss in watts.
pub fn line_loss_watts(current_a: f64, resistance_ohm: f64) -> f64 {
    current_a * current_a * resistance_ohm
}
