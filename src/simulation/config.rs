// src/simulation/config.rs

use crate::error::ConfigError;
use crate::io::demand::{check_rate, LeadTimeRange};
use crate::model::network::Network;
use crate::model::node::NodeId;
use std::collections::BTreeMap;

/// Where raw-material nodes get their period demand from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawDemandMode {
    /// Each raw node draws from its own `demand_rate`.
    #[default]
    External,
    /// The sub-assembly's pull counts as demand, plus an independent draw at
    /// `external_demand_rate`.
    AssemblyPlusExternal,
}

/// Per-node stochastic settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeProfile {
    pub demand_rate: f64,
    pub external_demand_rate: f64,
    /// Falls back to [`SimulationConfig::default_lead_time`] when unset.
    pub lead_time: Option<LeadTimeRange>,
}

impl Default for NodeProfile {
    fn default() -> Self {
        Self {
            demand_rate: 5.0,
            external_demand_rate: 0.0,
            lead_time: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub horizon: u32,
    pub seed: u64,
    pub final_demand_rate: f64,
    pub raw_demand_mode: RawDemandMode,
    pub default_lead_time: LeadTimeRange,
    pub profiles: BTreeMap<NodeId, NodeProfile>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon: 20,
            seed: 42,
            final_demand_rate: 5.0,
            raw_demand_mode: RawDemandMode::External,
            default_lead_time: LeadTimeRange::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl SimulationConfig {
    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_final_demand_rate(mut self, rate: f64) -> Self {
        self.final_demand_rate = rate;
        self
    }

    pub fn with_raw_demand_mode(mut self, mode: RawDemandMode) -> Self {
        self.raw_demand_mode = mode;
        self
    }

    pub fn with_default_lead_time(mut self, lead_time: LeadTimeRange) -> Self {
        self.default_lead_time = lead_time;
        self
    }

    pub fn with_profile(mut self, node: NodeId, profile: NodeProfile) -> Self {
        self.profiles.insert(node, profile);
        self
    }

    /// Profile of a node, or the default profile if none was given.
    pub fn profile(&self, node: NodeId) -> NodeProfile {
        self.profiles.get(&node).copied().unwrap_or_default()
    }

    pub fn lead_time(&self, node: NodeId) -> LeadTimeRange {
        self.profile(node).lead_time.unwrap_or(self.default_lead_time)
    }

    pub fn validate(&self, network: &Network) -> Result<(), ConfigError> {
        if self.horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        check_rate("final demand rate", self.final_demand_rate)?;
        self.default_lead_time.validate()?;

        for (&id, profile) in &self.profiles {
            if network.node(id).is_none() {
                return Err(ConfigError::UnknownNode(id));
            }
            check_rate(format!("demand rate of node {}", id), profile.demand_rate)?;
            check_rate(
                format!("external demand rate of node {}", id),
                profile.external_demand_rate,
            )?;
            if let Some(lead_time) = profile.lead_time {
                lead_time.validate()?;
            }
        }
        Ok(())
    }
}
