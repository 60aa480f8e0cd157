// src/strategy/implementations.rs

use crate::error::{SimError, SimResult};
use crate::io::demand::sample_poisson;
use crate::model::node::{Node, NodeId};
use crate::model::pipeline::{total_quantity, Order};
use crate::strategy::optimization::optimal_base_stock;
use crate::strategy::traits::{PolicyUpdate, ReplenishmentPolicy};
use rand::RngCore;

const DEFAULT_PRICE_PER_UNIT: f64 = 20.0;

fn check_binding(bound: NodeId, node: &Node) -> SimResult<()> {
    if bound != node.id() {
        return Err(SimError::PolicyBinding {
            bound,
            requested: node.id(),
        });
    }
    Ok(())
}

fn misconfigured(node: NodeId, message: impl Into<String>) -> SimError {
    SimError::PolicyMisconfiguration {
        node,
        message: message.into(),
    }
}

/// Rejects update fields the variant does not own.
fn reject_foreign(node: NodeId, variant: &str, fields: &[(&str, bool)]) -> SimResult<()> {
    let foreign: Vec<&str> = fields
        .iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| *name)
        .collect();
    if foreign.is_empty() {
        Ok(())
    } else {
        Err(misconfigured(
            node,
            format!("{} has no parameter(s) {}", variant, foreign.join(", ")),
        ))
    }
}

fn check_price(node: NodeId, price: Option<f64>) -> SimResult<()> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => {
            Err(misconfigured(node, format!("price per unit must be non-negative, got {}", p)))
        }
        _ => Ok(()),
    }
}

/// Profit of one period with a single Poisson demand draw.
///
/// Sales earn `price`; unsold stock and open backorders both cost the node's
/// holding rate.
fn single_period_profit(
    node: &Node,
    price: f64,
    demand_rate: f64,
    rng: &mut dyn RngCore,
) -> SimResult<f64> {
    if !(demand_rate.is_finite() && demand_rate >= 0.0) {
        return Err(misconfigured(
            node.id(),
            format!("demand rate must be non-negative, got {}", demand_rate),
        ));
    }
    let demand = sample_poisson(rng, demand_rate);
    let sales = node.inventory().min(demand);
    let h = node.config().holding_cost();

    let revenue = sales as f64 * price;
    let holding = (node.inventory() - sales) as f64 * h;
    let backorder = node.backorders() as f64 * h;
    Ok(revenue - holding - backorder)
}

// =========================================================================
// 1. Base Stock Policy (Order-Up-To)
// =========================================================================

/// Orders back up to `target_inventory + safety_stock`.
///
/// Order = max(0, Level - (Inventory + Pending)), capped by free capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseStockPolicy {
    node: NodeId,
    target_inventory: Option<u32>,
    safety_stock: u32,
    price_per_unit: f64,
}

impl BaseStockPolicy {
    /// A policy with no target yet; it must be configured before first use.
    pub fn unconfigured(node: NodeId) -> Self {
        Self {
            node,
            target_inventory: None,
            safety_stock: 0,
            price_per_unit: DEFAULT_PRICE_PER_UNIT,
        }
    }

    pub fn new(node: NodeId, target_inventory: u32, safety_stock: u32) -> Self {
        Self {
            target_inventory: Some(target_inventory),
            safety_stock,
            ..Self::unconfigured(node)
        }
    }

    /// Sizes the level with the newsvendor model for Poisson demand.
    pub fn with_optimal_target(
        node: NodeId,
        backorder_cost: f64,
        holding_cost: f64,
        demand_rate: f64,
        lead_time: u32,
    ) -> Self {
        let level = optimal_base_stock(backorder_cost, holding_cost, demand_rate, lead_time);
        Self::new(node, level.target_inventory, level.safety_stock)
    }

    pub fn base_stock_level(&self) -> Option<u32> {
        self.target_inventory
            .map(|target| target.saturating_add(self.safety_stock))
    }
}

impl ReplenishmentPolicy for BaseStockPolicy {
    fn node(&self) -> NodeId {
        self.node
    }

    fn decide_order_quantity(&self, node: &Node, pending: &[Order]) -> SimResult<u32> {
        check_binding(self.node, node)?;
        let level = self
            .base_stock_level()
            .ok_or_else(|| misconfigured(self.node, "base-stock policy has no target inventory"))?;

        let position = node.inventory().saturating_add(total_quantity(pending));
        let order = level.saturating_sub(position);
        Ok(order.min(node.headroom()))
    }

    fn evaluate(&self, node: &Node, demand_rate: f64, rng: &mut dyn RngCore) -> SimResult<f64> {
        check_binding(self.node, node)?;
        single_period_profit(node, self.price_per_unit, demand_rate, rng)
    }

    fn configure(&mut self, update: PolicyUpdate) -> SimResult<()> {
        reject_foreign(
            self.node,
            "base-stock",
            &[
                ("min_inventory", update.min_inventory.is_some()),
                ("max_inventory", update.max_inventory.is_some()),
                ("order_quantity", update.order_quantity.is_some()),
            ],
        )?;
        check_price(self.node, update.price_per_unit)?;

        if let Some(target) = update.target_inventory {
            self.target_inventory = Some(target);
        }
        if let Some(safety) = update.safety_stock {
            self.safety_stock = safety;
        }
        if let Some(price) = update.price_per_unit {
            self.price_per_unit = price;
        }
        Ok(())
    }
}

// =========================================================================
// 2. Min-Max Policy
// =========================================================================

/// Orders up to `max_inventory` once the inventory position drops below
/// `min_inventory`; does nothing inside the band.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxPolicy {
    node: NodeId,
    min_inventory: Option<u32>,
    max_inventory: Option<u32>,
    price_per_unit: f64,
}

impl MinMaxPolicy {
    pub fn unconfigured(node: NodeId) -> Self {
        Self {
            node,
            min_inventory: None,
            max_inventory: None,
            price_per_unit: DEFAULT_PRICE_PER_UNIT,
        }
    }

    pub fn new(node: NodeId, min_inventory: u32, max_inventory: u32) -> Self {
        Self {
            min_inventory: Some(min_inventory),
            max_inventory: Some(max_inventory),
            ..Self::unconfigured(node)
        }
    }

    fn bounds(&self) -> SimResult<(u32, u32)> {
        match (self.min_inventory, self.max_inventory) {
            (Some(min), Some(max)) if min <= max => Ok((min, max)),
            (Some(min), Some(max)) => Err(misconfigured(
                self.node,
                format!("min inventory {} is above max inventory {}", min, max),
            )),
            _ => Err(misconfigured(self.node, "min-max policy needs both bounds")),
        }
    }
}

impl ReplenishmentPolicy for MinMaxPolicy {
    fn node(&self) -> NodeId {
        self.node
    }

    fn decide_order_quantity(&self, node: &Node, pending: &[Order]) -> SimResult<u32> {
        check_binding(self.node, node)?;
        let (min, max) = self.bounds()?;

        let in_transit = total_quantity(pending);
        let position = node.inventory().saturating_add(in_transit);

        if position >= max {
            return Ok(0);
        }
        // dead zone between the bounds
        if position >= min {
            return Ok(0);
        }
        let available = node.headroom().saturating_sub(in_transit);
        Ok((max - position).min(available))
    }

    fn evaluate(&self, node: &Node, demand_rate: f64, rng: &mut dyn RngCore) -> SimResult<f64> {
        check_binding(self.node, node)?;
        single_period_profit(node, self.price_per_unit, demand_rate, rng)
    }

    fn configure(&mut self, update: PolicyUpdate) -> SimResult<()> {
        reject_foreign(
            self.node,
            "min-max",
            &[
                ("target_inventory", update.target_inventory.is_some()),
                ("safety_stock", update.safety_stock.is_some()),
                ("order_quantity", update.order_quantity.is_some()),
            ],
        )?;
        check_price(self.node, update.price_per_unit)?;

        if let Some(min) = update.min_inventory {
            self.min_inventory = Some(min);
        }
        if let Some(max) = update.max_inventory {
            self.max_inventory = Some(max);
        }
        if let Some(price) = update.price_per_unit {
            self.price_per_unit = price;
        }
        Ok(())
    }
}

// =========================================================================
// 3. Fixed Order Policy
// =========================================================================

/// Orders the same quantity every period, limited by capacity net of what is
/// already in transit.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedOrderPolicy {
    node: NodeId,
    order_quantity: Option<u32>,
    price_per_unit: f64,
}

impl FixedOrderPolicy {
    pub fn unconfigured(node: NodeId) -> Self {
        Self {
            node,
            order_quantity: None,
            price_per_unit: DEFAULT_PRICE_PER_UNIT,
        }
    }

    pub fn new(node: NodeId, order_quantity: u32) -> Self {
        Self {
            order_quantity: Some(order_quantity),
            ..Self::unconfigured(node)
        }
    }
}

impl ReplenishmentPolicy for FixedOrderPolicy {
    fn node(&self) -> NodeId {
        self.node
    }

    fn decide_order_quantity(&self, node: &Node, pending: &[Order]) -> SimResult<u32> {
        check_binding(self.node, node)?;
        let quantity = self
            .order_quantity
            .ok_or_else(|| misconfigured(self.node, "fixed-order policy has no order quantity"))?;

        let available = node.headroom().saturating_sub(total_quantity(pending));
        Ok(quantity.min(available))
    }

    fn evaluate(&self, node: &Node, demand_rate: f64, rng: &mut dyn RngCore) -> SimResult<f64> {
        check_binding(self.node, node)?;
        single_period_profit(node, self.price_per_unit, demand_rate, rng)
    }

    fn configure(&mut self, update: PolicyUpdate) -> SimResult<()> {
        reject_foreign(
            self.node,
            "fixed-order",
            &[
                ("target_inventory", update.target_inventory.is_some()),
                ("safety_stock", update.safety_stock.is_some()),
                ("min_inventory", update.min_inventory.is_some()),
                ("max_inventory", update.max_inventory.is_some()),
            ],
        )?;
        check_price(self.node, update.price_per_unit)?;

        if let Some(quantity) = update.order_quantity {
            self.order_quantity = Some(quantity);
        }
        if let Some(price) = update.price_per_unit {
            self.price_per_unit = price;
        }
        Ok(())
    }
}

// =========================================================================
// Closed set of policies the simulator dispatches over
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Policy {
    BaseStock(BaseStockPolicy),
    MinMax(MinMaxPolicy),
    FixedOrder(FixedOrderPolicy),
}

impl Policy {
    fn inner(&self) -> &dyn ReplenishmentPolicy {
        match self {
            Policy::BaseStock(p) => p,
            Policy::MinMax(p) => p,
            Policy::FixedOrder(p) => p,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ReplenishmentPolicy {
        match self {
            Policy::BaseStock(p) => p,
            Policy::MinMax(p) => p,
            Policy::FixedOrder(p) => p,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Policy::BaseStock(_) => "base-stock",
            Policy::MinMax(_) => "min-max",
            Policy::FixedOrder(_) => "fixed-order",
        }
    }
}

impl ReplenishmentPolicy for Policy {
    fn node(&self) -> NodeId {
        self.inner().node()
    }

    fn decide_order_quantity(&self, node: &Node, pending: &[Order]) -> SimResult<u32> {
        self.inner().decide_order_quantity(node, pending)
    }

    fn evaluate(&self, node: &Node, demand_rate: f64, rng: &mut dyn RngCore) -> SimResult<f64> {
        self.inner().evaluate(node, demand_rate, rng)
    }

    fn configure(&mut self, update: PolicyUpdate) -> SimResult<()> {
        self.inner_mut().configure(update)
    }
}

impl From<BaseStockPolicy> for Policy {
    fn from(policy: BaseStockPolicy) -> Self {
        Policy::BaseStock(policy)
    }
}

impl From<MinMaxPolicy> for Policy {
    fn from(policy: MinMaxPolicy) -> Self {
        Policy::MinMax(policy)
    }
}

impl From<FixedOrderPolicy> for Policy {
    fn from(policy: FixedOrderPolicy) -> Self {
        Policy::FixedOrder(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{NodeConfig, NodeKind, NodeState};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ID: NodeId = NodeId(1);

    fn node_with(inventory: u32, backorders: u32) -> Node {
        let config = NodeConfig::new(ID, "raw", NodeKind::RawMaterial, 100).with_holding_cost(1.0);
        Node::new(config, NodeState::initial(inventory, backorders, 10)).unwrap()
    }

    #[test]
    fn base_stock_restores_level() {
        let policy = BaseStockPolicy::new(ID, 50, 10);
        assert_eq!(policy.decide_order_quantity(&node_with(40, 0), &[]).unwrap(), 20);
    }

    #[test]
    fn base_stock_counts_pending_and_caps_by_capacity() {
        let policy = BaseStockPolicy::new(ID, 150, 10);
        let pending = [Order::new(30, 2)];
        // level 160, position 70 -> 90, but only 60 units of room
        assert_eq!(policy.decide_order_quantity(&node_with(40, 0), &pending).unwrap(), 60);

        let policy = BaseStockPolicy::new(ID, 50, 10);
        assert_eq!(policy.decide_order_quantity(&node_with(40, 0), &pending).unwrap(), 0);
    }

    #[test]
    fn min_max_orders_below_min() {
        let policy = MinMaxPolicy::new(ID, 20, 80);
        assert_eq!(policy.decide_order_quantity(&node_with(15, 0), &[]).unwrap(), 65);
    }

    #[test]
    fn min_max_dead_zone_and_above_max() {
        let policy = MinMaxPolicy::new(ID, 20, 80);
        assert_eq!(policy.decide_order_quantity(&node_with(50, 0), &[]).unwrap(), 0);
        assert_eq!(policy.decide_order_quantity(&node_with(90, 0), &[]).unwrap(), 0);
        // pending orders lift the position into the band
        let pending = [Order::new(10, 1)];
        assert_eq!(policy.decide_order_quantity(&node_with(15, 0), &pending).unwrap(), 0);
    }

    #[test]
    fn min_max_is_capped_net_of_pending() {
        let policy = MinMaxPolicy::new(ID, 50, 200);
        let pending = [Order::new(20, 3)];
        // position 30, wants 170, room is 100 - 10 - 20 = 70
        assert_eq!(policy.decide_order_quantity(&node_with(10, 0), &pending).unwrap(), 70);
    }

    #[test]
    fn fixed_order_is_capped_by_remaining_capacity() {
        let policy = FixedOrderPolicy::new(ID, 30);
        let pending = [Order::new(5, 2)];
        assert_eq!(policy.decide_order_quantity(&node_with(90, 0), &pending).unwrap(), 5);
        assert_eq!(policy.decide_order_quantity(&node_with(10, 0), &[]).unwrap(), 30);
        let full = [Order::new(20, 1)];
        assert_eq!(policy.decide_order_quantity(&node_with(90, 0), &full).unwrap(), 0);
    }

    #[test]
    fn missing_parameters_fail_at_first_use() {
        let node = node_with(10, 0);
        for policy in [
            Policy::from(BaseStockPolicy::unconfigured(ID)),
            Policy::from(MinMaxPolicy::unconfigured(ID)),
            Policy::from(FixedOrderPolicy::unconfigured(ID)),
        ] {
            assert!(matches!(
                policy.decide_order_quantity(&node, &[]),
                Err(SimError::PolicyMisconfiguration { .. })
            ));
        }

        let inverted = MinMaxPolicy::new(ID, 80, 20);
        assert!(inverted.decide_order_quantity(&node, &[]).is_err());
    }

    #[test]
    fn configure_fills_in_parameters() {
        let mut policy = Policy::from(MinMaxPolicy::unconfigured(ID));
        policy
            .configure(PolicyUpdate::default().min_inventory(20).max_inventory(80))
            .unwrap();
        assert_eq!(policy.decide_order_quantity(&node_with(15, 0), &[]).unwrap(), 65);

        let mut policy = Policy::from(BaseStockPolicy::unconfigured(ID));
        policy
            .configure(PolicyUpdate::default().target_inventory(50).safety_stock(10))
            .unwrap();
        assert_eq!(policy.decide_order_quantity(&node_with(40, 0), &[]).unwrap(), 20);
    }

    #[test]
    fn configure_rejects_foreign_parameters() {
        let mut policy = Policy::from(FixedOrderPolicy::new(ID, 30));
        let err = policy
            .configure(PolicyUpdate::default().target_inventory(5))
            .unwrap_err();
        assert!(matches!(err, SimError::PolicyMisconfiguration { .. }));

        let err = policy
            .configure(PolicyUpdate::default().price_per_unit(-1.0))
            .unwrap_err();
        assert!(matches!(err, SimError::PolicyMisconfiguration { .. }));
    }

    #[test]
    fn policies_only_decide_for_their_node() {
        let policy = FixedOrderPolicy::new(NodeId(2), 30);
        let err = policy.decide_order_quantity(&node_with(10, 0), &[]).unwrap_err();
        assert_eq!(err, SimError::PolicyBinding { bound: NodeId(2), requested: ID });
    }

    #[test]
    fn evaluate_with_empty_shelf_only_charges_backorders() {
        let policy = Policy::from(BaseStockPolicy::new(ID, 50, 10));
        let mut rng = StdRng::seed_from_u64(5);
        let profit = policy.evaluate(&node_with(0, 4), 5.0, &mut rng).unwrap();
        assert_eq!(profit, -4.0);
    }

    #[test]
    fn evaluate_stays_within_analytic_bounds() {
        let policy = Policy::from(FixedOrderPolicy::new(ID, 10));
        let node = node_with(8, 2);
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..100 {
            let profit = policy.evaluate(&node, 5.0, &mut rng).unwrap();
            // all eight sold vs. nothing sold
            assert!(profit <= 8.0 * 20.0 - 2.0);
            assert!(profit >= -8.0 - 2.0);
        }
    }

    #[test]
    fn evaluate_with_zero_rate_sells_nothing() {
        let policy = Policy::from(FixedOrderPolicy::new(ID, 10));
        let mut rng = StdRng::seed_from_u64(5);
        // no demand: all 8 units are held, 1 is owed
        assert_eq!(policy.evaluate(&node_with(8, 1), 0.0, &mut rng).unwrap(), -9.0);
    }

    #[test]
    fn evaluate_rejects_negative_rate() {
        let policy = Policy::from(FixedOrderPolicy::new(ID, 10));
        let mut rng = StdRng::seed_from_u64(5);
        assert!(policy.evaluate(&node_with(8, 0), -1.0, &mut rng).is_err());
        assert!(policy.evaluate(&node_with(8, 0), f64::NAN, &mut rng).is_err());
    }

    #[test]
    fn optimal_target_builds_a_usable_policy() {
        let policy = BaseStockPolicy::with_optimal_target(ID, 9.0, 1.0, 5.0, 3);
        assert_eq!(policy.base_stock_level(), Some(26));
    }
}
