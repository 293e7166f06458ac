use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of power source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Mains,
    Battery,
    Generator,
    Blackout,
}

/// Common contract for everything that can feed the load.
///
/// Implemented by exactly four types: [`super::Mains`], [`super::Battery`],
/// [`super::Generator`] and [`Blackout`]. A failed supply attempt is a
/// `false` return and must leave the source untouched.
pub trait PowerSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn name(&self) -> &str;

    /// Current ceiling on instantaneous deliverable power.
    fn rated_output_watts(&self) -> f64;

    /// Try to carry `load_watts`. Depletes the source's resource on success.
    fn attempt_supply(&mut self, load_watts: f64) -> bool;

    fn describe_status(&self) -> String;
}

/// Whether a source rated at `rated_output_watts` may take `load_watts`.
///
/// Negative and NaN loads are refused.
pub(crate) fn within_rating(rated_output_watts: f64, load_watts: f64) -> bool {
    load_watts >= 0.0 && rated_output_watts >= load_watts
}

/// Status text reported while no source can carry the load.
pub const BLACKOUT_STATUS: &str = "No power: system de-energized";

/// Terminal pseudo-source used when every real source has failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blackout;

impl PowerSource for Blackout {
    fn kind(&self) -> SourceKind {
        SourceKind::Blackout
    }

    fn name(&self) -> &str {
        "Blackout"
    }

    fn rated_output_watts(&self) -> f64 {
        0.0
    }

    fn attempt_supply(&mut self, _load_watts: f64) -> bool {
        false
    }

    fn describe_status(&self) -> String {
        BLACKOUT_STATUS.to_string()
    }
}
