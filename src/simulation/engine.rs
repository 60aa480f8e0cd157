// src/simulation/engine.rs

use crate::error::{ConfigError, SimError, SimResult};
use crate::io::demand::sample_poisson;
use crate::io::reporting::period_summary;
use crate::model::network::{GraphView, Network};
use crate::model::node::{Node, NodeId, StateCategory};
use crate::model::pipeline::OrderPipeline;
use crate::simulation::assembly::{apply_production, resolve_inputs};
use crate::simulation::config::{RawDemandMode, SimulationConfig};
use crate::strategy::implementations::Policy;
use crate::strategy::traits::{PolicyUpdate, ReplenishmentPolicy};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;

/// One node's outcome for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRecord {
    pub period: u32,
    pub node: NodeId,
    pub name: String,
    pub inventory: u32,
    pub backorders: u32,
    pub remaining_time: u32,
    pub demand: u32,
    pub fulfilled: u32,
    pub arrived: u32,
    pub overflow: u32,
    pub ordered: u32,
    pub cost: f64,
}

/// Scratch state of one node while a period is being resolved.
#[derive(Debug, Clone, Copy, Default)]
struct PeriodWork {
    inventory: u32,
    backorders: u32,
    demand: u32,
    fulfilled: u32,
    arrived: u32,
    overflow: u32,
    ordered: u32,
}

impl PeriodWork {
    fn start(node: &Node) -> Self {
        Self {
            inventory: node.inventory(),
            backorders: node.backorders(),
            ..Self::default()
        }
    }

    /// Settles open backorders from stock, then serves `demand`.
    fn serve(&mut self, demand: u32) {
        let settled = self.backorders.min(self.inventory);
        self.inventory -= settled;
        self.backorders -= settled;

        let shipped = demand.min(self.inventory);
        self.inventory -= shipped;
        self.backorders = self.backorders.saturating_add(demand - shipped);
        self.fulfilled = self.fulfilled.saturating_add(settled + shipped);
    }
}

/// Runs an episode over a fixed horizon, advancing every node in lock-step.
///
/// The simulator owns the nodes (through the [`Network`]), their order
/// pipelines, the policies and the random source. Each period resolves all
/// supply (arrivals, assembly pull, raw demand) for every node before any
/// policy is asked for an order. The random source is cloned while a period
/// is staged, hence the `Clone` bound.
pub struct EpisodeSimulator<R = StdRng> {
    config: SimulationConfig,
    network: Network,
    pipelines: Vec<OrderPipeline>,
    policies: BTreeMap<NodeId, Policy>,
    rng: R,
    current_period: u32,
    history: Vec<PeriodRecord>,
}

impl EpisodeSimulator<StdRng> {
    /// Simulator seeded from `config.seed`.
    pub fn new(
        network: Network,
        policies: BTreeMap<NodeId, Policy>,
        config: SimulationConfig,
    ) -> SimResult<Self> {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(network, policies, config, rng)
    }
}

impl<R: Rng + Clone> EpisodeSimulator<R> {
    pub fn with_rng(
        network: Network,
        policies: BTreeMap<NodeId, Policy>,
        config: SimulationConfig,
        rng: R,
    ) -> SimResult<Self> {
        config.validate(&network)?;
        for (&id, policy) in &policies {
            if network.node(id).is_none() {
                return Err(ConfigError::UnknownNode(id).into());
            }
            if policy.node() != id {
                return Err(SimError::PolicyBinding {
                    bound: policy.node(),
                    requested: id,
                });
            }
        }

        let pipelines = vec![OrderPipeline::new(); network.nodes().len()];
        Ok(Self {
            config,
            network,
            pipelines,
            policies,
            rng,
            current_period: 0,
            history: Vec::new(),
        })
    }

    pub fn run(&mut self) -> SimResult<u32> {
        while !self.is_finished() {
            self.step()?;
        }
        info!(
            "episode finished after {} periods, total cost {:.2}",
            self.current_period,
            self.total_cost()
        );
        Ok(self.current_period)
    }

    pub fn is_finished(&self) -> bool {
        self.current_period >= self.config.horizon || self.network.nodes().iter().all(Node::is_final)
    }

    /// Advances every node by one period.
    ///
    /// The period runs in five phases:
    /// 1. pipeline arrivals credit inventory (clamped to capacity),
    /// 2. the sub-assembly pulls parts for the final demand and builds,
    /// 3. raw-material nodes settle old backorders, then serve new demand,
    /// 4. policies decide orders against the post-demand state,
    /// 5. every node gets `remaining_time = H - t - 1` and its next phase.
    ///
    /// All work is staged on copies of the nodes, pipelines and RNG and only
    /// committed once every phase succeeded, so a failed period leaves the
    /// simulator exactly as it was.
    ///
    /// # Errors
    /// Any policy or state-transition error aborts the period.
    pub fn step(&mut self) -> SimResult<()> {
        let period = self.current_period;
        let mut nodes: Vec<Node> = self.network.nodes().to_vec();
        let mut pipelines = self.pipelines.clone();
        let mut rng = self.rng.clone();
        let mut work: Vec<PeriodWork> = nodes.iter().map(PeriodWork::start).collect();

        // =================================================================
        // 1. Arrivals
        // =================================================================
        for (idx, node) in nodes.iter().enumerate() {
            let arrived = pipelines[idx].advance();
            let w = &mut work[idx];
            let room = node.capacity() - w.inventory;
            w.arrived = arrived.min(room);
            w.overflow = arrived - w.arrived;
            w.inventory += w.arrived;
            if w.overflow > 0 {
                warn!(
                    "period {}: node {} dropped {} arriving units over capacity {}",
                    period,
                    node.id(),
                    w.overflow,
                    node.capacity()
                );
            }
        }

        // =================================================================
        // 2. Sub-assembly pull and production
        // =================================================================
        let raw = self.network.raw_material_indices();
        let mut pulled = vec![0u32; work.len()];
        if let Some(asm) = self.network.sub_assembly_index() {
            let final_demand = sample_poisson(&mut rng, self.config.final_demand_rate);
            let inventories: Vec<u32> = raw.iter().map(|&i| work[i].inventory).collect();
            let inputs = resolve_inputs(self.network.requirements(), &inventories, final_demand);

            for (pos, &i) in raw.iter().enumerate() {
                let w = &mut work[i];
                w.inventory -= inputs.received[pos];
                w.backorders = w.backorders.saturating_add(inputs.shortfall[pos]);
                w.fulfilled = w.fulfilled.saturating_add(inputs.received[pos]);
                pulled[i] = inputs.requested[pos];
            }

            let capacity = nodes[asm].capacity();
            let w = &mut work[asm];
            let outcome = apply_production(
                w.inventory,
                w.backorders,
                capacity,
                inputs.producible,
                final_demand,
            );
            w.inventory = outcome.inventory;
            w.backorders = outcome.backorders;
            w.demand = final_demand;
            w.fulfilled = w.fulfilled.saturating_add(outcome.settled + outcome.fulfilled);
            w.overflow = w.overflow.saturating_add(outcome.overflow);

            debug!(
                "period {}: final demand {}, requested {:?}, received {:?}, produced {}",
                period, final_demand, inputs.requested, inputs.received, inputs.producible
            );
            if outcome.overflow > 0 {
                warn!(
                    "period {}: sub-assembly dropped {} produced units over capacity {}",
                    period, outcome.overflow, capacity
                );
            }
        }

        // =================================================================
        // 3. Raw-material demand
        // =================================================================
        for &i in raw {
            let id = nodes[i].id();
            let profile = self.config.profile(id);
            let w = &mut work[i];
            match self.config.raw_demand_mode {
                RawDemandMode::External => {
                    let demand = sample_poisson(&mut rng, profile.demand_rate);
                    w.serve(demand);
                    w.demand = demand;
                }
                RawDemandMode::AssemblyPlusExternal => {
                    // the pull was already shipped in phase 2
                    let external = sample_poisson(&mut rng, profile.external_demand_rate);
                    w.serve(external);
                    w.demand = pulled[i].saturating_add(external);
                }
            }
            debug!(
                "period {}: node {} demand {} -> inventory {}, backorders {}",
                period, id, w.demand, w.inventory, w.backorders
            );
        }

        // Policies see post-demand stock.
        for (node, w) in nodes.iter_mut().zip(&work) {
            let remaining = node.remaining_time();
            node.set_state(w.inventory, w.backorders, remaining, StateCategory::AwaitAction)?;
        }

        // =================================================================
        // 4. Ordering decisions
        // =================================================================
        for (idx, node) in nodes.iter().enumerate() {
            let Some(policy) = self.policies.get(&node.id()) else {
                continue;
            };
            let pipeline = &mut pipelines[idx];
            let quantity = policy.decide_order_quantity(node, pipeline.pending())?;
            if quantity > 0 {
                let lead_time = self.config.lead_time(node.id()).sample(&mut rng);
                pipeline.place(quantity, lead_time);
                debug!(
                    "period {}: node {} ({}) ordered {} arriving in {} periods",
                    period,
                    node.id(),
                    policy.name(),
                    quantity,
                    lead_time
                );
            }
            work[idx].ordered = quantity;
        }

        // =================================================================
        // 5. State transition
        // =================================================================
        let remaining_time = self.config.horizon.saturating_sub(period + 1);
        let category = if remaining_time > 0 {
            StateCategory::AwaitEvent
        } else {
            StateCategory::Final
        };
        for (node, w) in nodes.iter_mut().zip(&work) {
            node.set_state(w.inventory, w.backorders, remaining_time, category)?;
        }

        // Commit.
        for (slot, node) in self.network.nodes_mut().iter_mut().zip(nodes) {
            *slot = node;
        }
        self.pipelines = pipelines;
        self.rng = rng;

        self.record(period, &work);
        let latest = &self.history[self.history.len() - work.len()..];
        info!("period {}: {}", period, period_summary(latest, period));

        self.current_period += 1;
        Ok(())
    }

    fn record(&mut self, period: u32, work: &[PeriodWork]) {
        for (node, w) in self.network.nodes().iter().zip(work) {
            let config = node.config();
            let holding = config.holding_cost() * (w.inventory as f64 + w.backorders as f64);
            let purchasing = config.unit_cost() * w.ordered as f64;
            self.history.push(PeriodRecord {
                period,
                node: node.id(),
                name: config.name().to_string(),
                inventory: w.inventory,
                backorders: w.backorders,
                remaining_time: node.remaining_time(),
                demand: w.demand,
                fulfilled: w.fulfilled,
                arrived: w.arrived,
                overflow: w.overflow,
                ordered: w.ordered,
                cost: holding + purchasing,
            });
        }
    }

    pub fn configure_policy(&mut self, node: NodeId, update: PolicyUpdate) -> SimResult<()> {
        self.policies
            .get_mut(&node)
            .ok_or(SimError::UnknownNode(node))?
            .configure(update)
    }

    /// Profit estimate for a node's policy, drawing from the simulator's RNG.
    pub fn evaluate_policy(&mut self, node: NodeId, demand_rate: f64) -> SimResult<f64> {
        let policy = self.policies.get(&node).ok_or(SimError::UnknownNode(node))?;
        let state = self.network.node(node).ok_or(SimError::UnknownNode(node))?;
        policy.evaluate(state, demand_rate, &mut self.rng)
    }

    pub fn current_period(&self) -> u32 {
        self.current_period
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.network.node(id)
    }

    pub fn pipeline(&self, id: NodeId) -> Option<&OrderPipeline> {
        self.network.index_of(id).map(|idx| &self.pipelines[idx])
    }

    pub fn graph_view(&self) -> GraphView {
        self.network.graph_view()
    }

    pub fn history(&self) -> &[PeriodRecord] {
        &self.history
    }

    /// Total cost for a single node across all recorded periods.
    pub fn total_cost_for_node(&self, id: NodeId) -> f64 {
        self.history
            .iter()
            .filter(|record| record.node == id)
            .map(|record| record.cost)
            .sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.history.iter().map(|record| record.cost).sum()
    }

    /// Cost per node name, in network order.
    pub fn cost_breakdown(&self) -> Vec<(String, f64)> {
        self.network
            .nodes()
            .iter()
            .map(|node| (node.config().name().to_string(), self.total_cost_for_node(node.id())))
            .collect()
    }
}
