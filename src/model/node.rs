// src/model/node.rs

use crate::error::{ConfigError, SimError, SimResult};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    RawMaterial,
    SubAssembly,
}

/// MDP phase of a node within a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StateCategory {
    AwaitEvent,
    AwaitAction,
    Final,
}

/// Static identity of a node. Fields are only readable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    id: NodeId,
    name: String,
    kind: NodeKind,
    capacity: u32,
    holding_cost: f64,
    unit_cost: f64,
    upstream: Vec<NodeId>,
    downstream: Vec<NodeId>,
}

impl NodeConfig {
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind, capacity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            capacity,
            holding_cost: 0.0,
            unit_cost: 1.0,
            upstream: Vec::new(),
            downstream: Vec::new(),
        }
    }

    pub fn with_holding_cost(mut self, holding_cost: f64) -> Self {
        self.holding_cost = holding_cost;
        self
    }

    pub fn with_unit_cost(mut self, unit_cost: f64) -> Self {
        self.unit_cost = unit_cost;
        self
    }

    pub fn with_upstream(mut self, upstream: impl IntoIterator<Item = NodeId>) -> Self {
        self.upstream = upstream.into_iter().collect();
        self
    }

    pub fn with_downstream(mut self, downstream: impl IntoIterator<Item = NodeId>) -> Self {
        self.downstream = downstream.into_iter().collect();
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn holding_cost(&self) -> f64 {
        self.holding_cost
    }

    pub fn unit_cost(&self) -> f64 {
        self.unit_cost
    }

    pub fn upstream(&self) -> &[NodeId] {
        &self.upstream
    }

    pub fn downstream(&self) -> &[NodeId] {
        &self.downstream
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity(self.id));
        }
        for (what, value) in [("holding cost", self.holding_cost), ("unit cost", self.unit_cost)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidCost {
                    what: format!("{} of node {}", what, self.id),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Mutable MDP state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeState {
    pub inventory: u32,
    pub backorders: u32,
    pub remaining_time: u32,
    pub category: StateCategory,
}

impl NodeState {
    /// Fresh state at the start of an episode.
    pub fn initial(inventory: u32, backorders: u32, remaining_time: u32) -> Self {
        Self {
            inventory,
            backorders,
            remaining_time,
            category: StateCategory::AwaitEvent,
        }
    }
}

/// Read-only view handed to the visualization collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub name: String,
    pub inventory: u32,
    pub backorders: u32,
    pub remaining_time: u32,
}

/// A node of the inventory network: write-once identity plus MDP state.
///
/// State only changes through [`Node::set_state`], [`Node::apply_event`] and
/// [`Node::apply_action`], each of which checks the capacity bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    config: NodeConfig,
    state: NodeState,
}

impl Node {
    pub fn new(config: NodeConfig, state: NodeState) -> Result<Self, ConfigError> {
        config.validate()?;
        if state.inventory > config.capacity {
            return Err(ConfigError::InitialState {
                node: config.id,
                message: format!(
                    "inventory {} exceeds capacity {}",
                    state.inventory, config.capacity
                ),
            });
        }
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn id(&self) -> NodeId {
        self.config.id
    }

    pub fn capacity(&self) -> u32 {
        self.config.capacity
    }

    pub fn inventory(&self) -> u32 {
        self.state.inventory
    }

    pub fn backorders(&self) -> u32 {
        self.state.backorders
    }

    pub fn remaining_time(&self) -> u32 {
        self.state.remaining_time
    }

    pub fn category(&self) -> StateCategory {
        self.state.category
    }

    pub fn is_final(&self) -> bool {
        self.state.category == StateCategory::Final
    }

    /// Free space before the capacity bound.
    pub fn headroom(&self) -> u32 {
        self.config.capacity - self.state.inventory
    }

    /// Overwrites the whole MDP state after checking the capacity bound.
    pub fn set_state(
        &mut self,
        inventory: u32,
        backorders: u32,
        remaining_time: u32,
        category: StateCategory,
    ) -> SimResult<()> {
        if inventory > self.config.capacity {
            return Err(SimError::InvariantViolation {
                node: self.config.id,
                message: format!(
                    "inventory {} exceeds capacity {}",
                    inventory, self.config.capacity
                ),
            });
        }
        self.state = NodeState {
            inventory,
            backorders,
            remaining_time,
            category,
        };
        Ok(())
    }

    /// Exogenous demand arrival. Moves AwaitEvent -> AwaitAction (or Final).
    ///
    /// Returns the quantity fulfilled from inventory; the rest is backordered.
    pub fn apply_event(&mut self, demand: u32) -> SimResult<u32> {
        self.expect_phase(StateCategory::AwaitEvent, "apply_event")?;

        let fulfilled = demand.min(self.state.inventory);
        let backorders = self
            .state
            .backorders
            .checked_add(demand - fulfilled)
            .ok_or_else(|| self.overflow("backorders"))?;

        self.state.inventory -= fulfilled;
        self.state.backorders = backorders;
        self.state.remaining_time -= 1;
        self.state.category = if self.state.remaining_time == 0 {
            StateCategory::Final
        } else {
            StateCategory::AwaitAction
        };
        Ok(fulfilled)
    }

    /// Order decision. Moves AwaitAction -> AwaitEvent (or Final).
    ///
    /// Receives as much of `order_amount` as capacity allows and returns the
    /// purchase cost of the received units.
    pub fn apply_action(&mut self, order_amount: u32) -> SimResult<f64> {
        self.expect_phase(StateCategory::AwaitAction, "apply_action")?;

        let received = order_amount.min(self.headroom());
        self.state.inventory += received;
        self.state.remaining_time -= 1;
        self.state.category = if self.state.remaining_time == 0 {
            StateCategory::Final
        } else {
            StateCategory::AwaitEvent
        };
        Ok(self.config.unit_cost * received as f64)
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            id: self.config.id,
            name: self.config.name.clone(),
            inventory: self.state.inventory,
            backorders: self.state.backorders,
            remaining_time: self.state.remaining_time,
        }
    }

    fn expect_phase(&self, expected: StateCategory, operation: &'static str) -> SimResult<()> {
        if self.state.category != expected || self.state.remaining_time == 0 {
            return Err(SimError::InvalidTransition {
                node: self.config.id,
                operation,
                category: self.state.category,
                remaining_time: self.state.remaining_time,
            });
        }
        Ok(())
    }

    fn overflow(&self, field: &str) -> SimError {
        SimError::InvariantViolation {
            node: self.config.id,
            message: format!("{} overflowed", field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn node(inventory: u32, backorders: u32, remaining_time: u32) -> Node {
        let config = NodeConfig::new(NodeId(1), "Node_A", NodeKind::RawMaterial, 100)
            .with_holding_cost(0.5);
        Node::new(config, NodeState::initial(inventory, backorders, remaining_time)).unwrap()
    }

    #[test]
    fn rejects_initial_inventory_above_capacity() {
        let config = NodeConfig::new(NodeId(1), "Node_A", NodeKind::RawMaterial, 10);
        let err = Node::new(config, NodeState::initial(11, 0, 3)).unwrap_err();
        assert!(matches!(err, ConfigError::InitialState { .. }));
    }

    #[test]
    fn rejects_zero_capacity() {
        let config = NodeConfig::new(NodeId(4), "empty", NodeKind::RawMaterial, 0);
        let err = Node::new(config, NodeState::initial(0, 0, 3)).unwrap_err();
        assert_eq!(err, ConfigError::InvalidCapacity(NodeId(4)));
    }

    #[test]
    fn set_state_overwrites_everything() {
        let mut n = node(50, 10, 5);
        n.set_state(60, 5, 4, StateCategory::AwaitAction).unwrap();
        assert_eq!(n.inventory(), 60);
        assert_eq!(n.backorders(), 5);
        assert_eq!(n.remaining_time(), 4);
        assert_eq!(n.category(), StateCategory::AwaitAction);
    }

    #[test]
    fn set_state_rejects_inventory_over_capacity() {
        let mut n = node(50, 0, 5);
        let err = n.set_state(101, 0, 4, StateCategory::AwaitEvent).unwrap_err();
        assert!(matches!(err, SimError::InvariantViolation { .. }));
        assert_eq!(n.inventory(), 50);
    }

    #[test]
    fn event_backorders_unmet_demand() {
        let mut n = node(5, 2, 3);
        let fulfilled = n.apply_event(8).unwrap();
        assert_eq!(fulfilled, 5);
        assert_eq!(n.inventory(), 0);
        assert_eq!(n.backorders(), 5);
        assert_eq!(n.remaining_time(), 2);
        assert_eq!(n.category(), StateCategory::AwaitAction);
    }

    #[test]
    fn action_is_capped_by_capacity_and_costed() {
        let mut n = node(90, 0, 3);
        n.apply_event(0).unwrap();
        let cost = n.apply_action(30).unwrap();
        assert_eq!(n.inventory(), 100);
        assert_eq!(cost, 10.0);
        assert_eq!(n.category(), StateCategory::AwaitEvent);
    }

    #[test]
    fn two_period_horizon_walks_the_phases() {
        let mut n = node(10, 0, 2);
        assert_eq!(n.category(), StateCategory::AwaitEvent);
        n.apply_event(3).unwrap();
        assert_eq!(n.category(), StateCategory::AwaitAction);
        n.apply_action(0).unwrap();
        assert_eq!(n.category(), StateCategory::Final);
        assert_eq!(n.remaining_time(), 0);

        // with one more period the last event is still allowed
        let mut n = node(10, 0, 3);
        n.apply_event(3).unwrap();
        n.apply_action(4).unwrap();
        assert_eq!(n.category(), StateCategory::AwaitEvent);
        n.apply_event(1).unwrap();
        assert_eq!(n.category(), StateCategory::Final);
    }

    #[test]
    fn wrong_phase_is_rejected() {
        let mut n = node(10, 0, 4);
        assert!(matches!(
            n.apply_action(5),
            Err(SimError::InvalidTransition { operation: "apply_action", .. })
        ));
        n.apply_event(1).unwrap();
        assert!(matches!(
            n.apply_event(1),
            Err(SimError::InvalidTransition { operation: "apply_event", .. })
        ));
    }

    #[test]
    fn final_node_accepts_no_transitions() {
        let mut n = node(10, 0, 1);
        n.apply_event(1).unwrap();
        assert!(n.is_final());
        assert!(n.apply_event(1).is_err());
        assert!(n.apply_action(1).is_err());
    }

    #[test]
    fn random_transitions_keep_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let capacity = rng.gen_range(1..=200);
            let config = NodeConfig::new(NodeId(9), "prop", NodeKind::RawMaterial, capacity);
            let start = rng.gen_range(0..=capacity);
            let horizon = rng.gen_range(1..=40);
            let mut n = Node::new(config, NodeState::initial(start, 0, horizon)).unwrap();

            while !n.is_final() {
                let result = match n.category() {
                    StateCategory::AwaitEvent => n.apply_event(rng.gen_range(0..=250)).map(|_| ()),
                    StateCategory::AwaitAction => n.apply_action(rng.gen_range(0..=250)).map(|_| ()),
                    StateCategory::Final => unreachable!(),
                };
                result.unwrap();
                assert!(n.inventory() <= n.capacity());
            }
            assert_eq!(n.remaining_time(), 0);
        }
    }

    #[test]
    fn snapshot_exposes_display_fields() {
        let n = node(12, 3, 7);
        let snap = n.snapshot();
        assert_eq!(snap.id, NodeId(1));
        assert_eq!(snap.name, "Node_A");
        assert_eq!((snap.inventory, snap.backorders, snap.remaining_time), (12, 3, 7));
    }
}
