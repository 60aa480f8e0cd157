use echelon_sim::io::demand::LeadTimeRange;
use echelon_sim::io::reporting;
use echelon_sim::model::network::Network;
use echelon_sim::model::node::{Node, NodeConfig, NodeId, NodeKind, NodeState};
use echelon_sim::simulation::config::{NodeProfile, RawDemandMode, SimulationConfig};
use echelon_sim::simulation::engine::EpisodeSimulator;
use echelon_sim::strategy::implementations::{
    BaseStockPolicy, FixedOrderPolicy, MinMaxPolicy, Policy,
};
use std::collections::BTreeMap;
use std::error::Error;

const HORIZON: u32 = 20;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Simulation failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    println!("=== Multi-Echelon Inventory Simulation ===");

    // 1. NETWORK
    // Three raw materials feed one sub-assembly; each assembled unit needs
    // 2 x steel, 1 x motor, 3 x bolts.
    let assembly_id = NodeId(10);
    let raw_ids = [NodeId(1), NodeId(2), NodeId(3)];
    let names = ["Steel", "Motors", "Bolts"];

    let mut nodes = Vec::new();
    for (id, name) in raw_ids.iter().zip(names) {
        let config = NodeConfig::new(*id, name, NodeKind::RawMaterial, 200)
            .with_holding_cost(0.5)
            .with_downstream([assembly_id]);
        nodes.push(Node::new(config, NodeState::initial(100, 0, HORIZON))?);
    }
    let assembly = NodeConfig::new(assembly_id, "Gearbox", NodeKind::SubAssembly, 100)
        .with_holding_cost(1.0)
        .with_upstream(raw_ids);
    nodes.push(Node::new(assembly, NodeState::initial(10, 0, HORIZON))?);

    let network = Network::new(nodes, vec![2, 1, 3])?;

    // 2. POLICIES
    let mut policies: BTreeMap<NodeId, Policy> = BTreeMap::new();
    policies.insert(
        raw_ids[0],
        BaseStockPolicy::with_optimal_target(raw_ids[0], 2.0, 0.5, 12.0, 2).into(),
    );
    policies.insert(raw_ids[1], MinMaxPolicy::new(raw_ids[1], 20, 80).into());
    policies.insert(raw_ids[2], FixedOrderPolicy::new(raw_ids[2], 18).into());

    // 3. CONFIGURATION
    let quiet = NodeProfile {
        demand_rate: 1.0,
        external_demand_rate: 1.0,
        lead_time: None,
    };
    let config = SimulationConfig::default()
        .with_horizon(HORIZON)
        .with_seed(7)
        .with_final_demand_rate(5.0)
        .with_raw_demand_mode(RawDemandMode::AssemblyPlusExternal)
        .with_default_lead_time(LeadTimeRange::new(1, 3)?)
        .with_profile(raw_ids[0], quiet)
        .with_profile(raw_ids[1], quiet)
        .with_profile(raw_ids[2], quiet);

    // 4. RUN
    let mut sim = EpisodeSimulator::new(network, policies, config)?;
    let periods = sim.run()?;
    println!("Ran {} periods.", periods);

    // 5. FINAL STATE
    println!("\n=== Final Node State ===");
    for snap in sim.graph_view().nodes {
        println!(
            "{} ({}): inventory={}, backorders={}, remaining_time={}",
            snap.name, snap.id, snap.inventory, snap.backorders, snap.remaining_time
        );
    }

    // 6. COST ANALYSIS
    println!("\n=== Cost Analysis ===");
    for (name, cost) in sim.cost_breakdown() {
        println!("{}: ${:.2}", name, cost);
    }
    println!("Total Network Cost: ${:.2}", sim.total_cost());

    if log::log_enabled!(log::Level::Debug) {
        log::debug!("history:\n{}", reporting::render_csv(sim.history())?);
    }
    Ok(())
}
