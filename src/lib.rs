//! A logit market-share allocation engine for the subsectors of an energy-economy model.
//!
//! For each model period, a sector's demand is split between competing subsectors, and within
//! each subsector between vintaged technologies, according to cost and calibrated share weights.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod calibration;
pub mod cli;
pub mod competition;
pub mod dependency;
pub mod economy;
pub mod id;
pub mod input;
pub mod interpolation;
pub mod investment;
pub mod log;
pub mod model;
pub mod period;
pub mod sector;
pub mod settings;
pub mod share_weight;
pub mod simulation;
pub mod subsector;
pub mod technology;
pub mod technology_database;
pub mod units;
pub mod vintage;
pub mod visitor;

#[cfg(test)]
mod fixture;

/// Get the directory where program configuration files are stored
pub fn get_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("subsector");

    path
}
