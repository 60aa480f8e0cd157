// src/simulation/assembly.rs

//! Sub-assembly production for one period, kept free of RNG and node types so
//! it can be checked in isolation.

/// What each raw-material input was asked for and what it could ship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputResolution {
    pub requested: Vec<u32>,
    pub received: Vec<u32>,
    /// Requested minus received; becomes the raw node's backorder.
    pub shortfall: Vec<u32>,
    /// Whole assemblies the received parts allow.
    pub producible: u32,
}

/// Splits `final_demand` into per-input requests and ships what inventory allows.
///
/// # Arguments
/// * `requirements` - Units of each raw input per assembled unit (all >= 1,
///   enforced by `Network`).
/// * `inventories` - On-hand stock of each raw input, same order.
/// * `final_demand` - Assembled units wanted this period.
///
/// Every received part is consumed, including parts left over when another
/// input limits `producible`.
pub fn resolve_inputs(requirements: &[u32], inventories: &[u32], final_demand: u32) -> InputResolution {
    let requested: Vec<u32> = requirements
        .iter()
        .map(|&req| final_demand.saturating_mul(req))
        .collect();
    let received: Vec<u32> = requested
        .iter()
        .zip(inventories)
        .map(|(&want, &have)| want.min(have))
        .collect();
    let shortfall = requested
        .iter()
        .zip(&received)
        .map(|(&want, &got)| want - got)
        .collect();
    let producible = received
        .iter()
        .zip(requirements)
        .map(|(&got, &req)| got / req.max(1))
        .min()
        .unwrap_or(0);

    InputResolution {
        requested,
        received,
        shortfall,
        producible,
    }
}

/// Sub-assembly stock after production and final demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyOutcome {
    pub inventory: u32,
    pub backorders: u32,
    /// Produced units that went straight to old backorders.
    pub settled: u32,
    /// Units of this period's final demand shipped from stock.
    pub fulfilled: u32,
    /// Produced units that did not fit under capacity.
    pub overflow: u32,
}

/// Produced units settle outstanding backorders first; the remainder goes to
/// inventory (up to capacity), then this period's final demand is served from
/// inventory and the rest is backordered.
pub fn apply_production(
    inventory: u32,
    backorders: u32,
    capacity: u32,
    produced: u32,
    final_demand: u32,
) -> AssemblyOutcome {
    let settled = produced.min(backorders);
    let mut backorders = backorders - settled;
    let remainder = produced - settled;

    let room = capacity.saturating_sub(inventory);
    let stocked = remainder.min(room);
    let overflow = remainder - stocked;
    let mut inventory = inventory + stocked;

    let fulfilled = final_demand.min(inventory);
    inventory -= fulfilled;
    backorders = backorders.saturating_add(final_demand - fulfilled);

    AssemblyOutcome {
        inventory,
        backorders,
        settled,
        fulfilled,
        overflow,
    }
}
