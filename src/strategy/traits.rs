// src/strategy/traits.rs

use crate::error::SimResult;
use crate::model::node::{Node, NodeId};
use crate::model::pipeline::Order;
use rand::RngCore;

/// Parameter changes for a policy. Unset fields are left alone.
///
/// Setting a field the policy variant does not own is a misconfiguration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolicyUpdate {
    pub target_inventory: Option<u32>,
    pub safety_stock: Option<u32>,
    pub min_inventory: Option<u32>,
    pub max_inventory: Option<u32>,
    pub order_quantity: Option<u32>,
    pub price_per_unit: Option<f64>,
}

impl PolicyUpdate {
    pub fn target_inventory(mut self, value: u32) -> Self {
        self.target_inventory = Some(value);
        self
    }

    pub fn safety_stock(mut self, value: u32) -> Self {
        self.safety_stock = Some(value);
        self
    }

    pub fn min_inventory(mut self, value: u32) -> Self {
        self.min_inventory = Some(value);
        self
    }

    pub fn max_inventory(mut self, value: u32) -> Self {
        self.max_inventory = Some(value);
        self
    }

    pub fn order_quantity(mut self, value: u32) -> Self {
        self.order_quantity = Some(value);
        self
    }

    pub fn price_per_unit(mut self, value: f64) -> Self {
        self.price_per_unit = Some(value);
        self
    }
}

/// Replenishment decision logic for one node.
///
/// The policy never owns its node: the simulator passes the bound node's
/// current state in on every call.
pub trait ReplenishmentPolicy {
    /// Id of the node this policy decides for.
    fn node(&self) -> NodeId;

    /// How much to order this period, given what is already in transit.
    fn decide_order_quantity(&self, node: &Node, pending: &[Order]) -> SimResult<u32>;

    /// Single-period profit estimate under one Poisson demand draw.
    fn evaluate(&self, node: &Node, demand_rate: f64, rng: &mut dyn RngCore) -> SimResult<f64>;

    /// Applies a parameter update.
    fn configure(&mut self, update: PolicyUpdate) -> SimResult<()>;
}
