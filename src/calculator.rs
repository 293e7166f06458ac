//! # Calculator Input
//!
//! Turns free-text form fields into numbers for the formula functions.
//! Text that does not parse never reaches [`crate::formulas`].

use thiserror::Error;

use crate::formulas;

/// Advisory shown when a field does not hold a number
pub const NOT_A_NUMBER_MESSAGE: &str = "Please enter a number";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter a number")]
    NotANumber { field: String },
    #[error("Please enter a whole number of years")]
    NotWholeYears { field: String },
}

impl InputError {
    pub fn field(&self) -> &str {
        match self {
            InputError::NotANumber { field } | InputError::NotWholeYears { field } => field,
        }
    }
}

/// Parse a finite number, ignoring surrounding whitespace.
pub fn parse_number(field: &str, text: &str) -> Result<f64, InputError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InputError::NotANumber {
            field: field.to_string(),
        })
}

/// For screens that treat an unreadable field as zero.
pub fn parse_or_zero(text: &str) -> f64 {
    parse_number("", text).unwrap_or(0.0)
}

fn parse_years(field: &str, text: &str) -> Result<u32, InputError> {
    text.trim().parse::<u32>().map_err(|_| InputError::NotWholeYears {
        field: field.to_string(),
    })
}

pub fn energy_from_input(power_w: &str, hours: &str) -> Result<f64, InputError> {
    Ok(formulas::energy_kwh(
        parse_number("power_w", power_w)?,
        parse_number("hours", hours)?,
    ))
}

/// Sum of `(power_w, hours)` rows. The first bad field aborts the sum.
pub fn total_energy_from_input(rows: &[(&str, &str)]) -> Result<f64, InputError> {
    let pairs = rows
        .iter()
        .map(|(power, hours)| Ok((parse_number("power_w", power)?, parse_number("hours", hours)?)))
        .collect::<Result<Vec<_>, InputError>>()?;
    Ok(formulas::total_energy_kwh(pairs))
}

pub fn backup_time_from_input(battery_wh: &str, consumption_w: &str) -> Result<f64, InputError> {
    Ok(formulas::backup_time_hours(
        parse_number("battery_wh", battery_wh)?,
        parse_number("consumption_w", consumption_w)?,
    ))
}

pub fn discharge_from_input(
    initial_wh: &str,
    efficiency: &str,
    degradation_per_year: &str,
    years: &str,
) -> Result<f64, InputError> {
    Ok(formulas::simulate_discharge(
        parse_number("initial_wh", initial_wh)?,
        parse_number("efficiency", efficiency)?,
        parse_number("degradation_per_year", degradation_per_year)?,
        parse_years("years", years)?,
    ))
}

pub fn line_loss_from_input(current_a: &str, resistance_ohm: &str) -> Result<f64, InputError> {
    Ok(formulas::line_loss_watts(
        parse_number("current_a", current_a)?,
        parse_number("resistance_ohm", resistance_ohm)?,
    ))
}
