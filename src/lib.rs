//! Emergency power supply simulator.
//!
//! A failover controller switches a load between mains, battery and
//! generator, while simulated devices stream classified telemetry to a
//! dashboard.

pub mod calculator;
pub mod config;
pub mod controller;
pub mod domain;
pub mod formulas;
pub mod simulation;
pub mod telemetry;
pub mod utils;
