//! Multi-echelon inventory network simulation.
//!
//! Raw-material nodes feed a single sub-assembly node. Every node carries an
//! MDP state (inventory, backorders, remaining time, phase) and an optional
//! replenishment policy; [`simulation::engine::EpisodeSimulator`] advances all
//! nodes period by period under Poisson demand and random lead times.

pub mod error;
pub mod io;
pub mod model;
pub mod simulation;
pub mod strategy;

pub use error::{ConfigError, ReportError, SimError, SimResult};
