// src/strategy/optimization.rs

//! Newsvendor sizing for base-stock levels under Poisson demand.

/// Critical ratio (target service level) balancing backorder against holding cost.
///
/// Formula: CR = BackorderCost / (BackorderCost + HoldingCost)
pub fn critical_ratio(backorder_cost: f64, holding_cost: f64) -> f64 {
    if backorder_cost + holding_cost <= 0.0 {
        return 0.0;
    }
    backorder_cost / (backorder_cost + holding_cost)
}

/// Approximate standard normal quantile (Abramowitz and Stegun 26.2.23).
///
/// Absolute error below 4.5e-4. Clamped to +/- 5 sigma at the tails.
fn inverse_normal_cdf(p: f64) -> f64 {
    if p >= 1.0 {
        return 5.0;
    }
    if p <= 0.0 {
        return -5.0;
    }
    if p == 0.5 {
        return 0.0;
    }

    let q = if p < 0.5 { p } else { 1.0 - p };
    let t = (-2.0 * q.ln()).sqrt();

    let (c0, c1, c2) = (2.515517, 0.802853, 0.010328);
    let (d1, d2, d3) = (1.432788, 0.189269, 0.001308);

    let x = t - (c0 + c1 * t + c2 * t * t) / (1.0 + d1 * t + d2 * t * t + d3 * t * t * t);

    if p < 0.5 {
        -x
    } else {
        x
    }
}

/// Split of a base-stock level into cycle stock and safety stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseStockLevel {
    pub target_inventory: u32,
    pub safety_stock: u32,
}

/// Base-stock level covering lead time plus one review period.
///
/// # Formula
/// Target = rate * (L + 1)
/// Safety = Z * sqrt(rate * (L + 1))
///
/// Poisson demand has variance equal to its mean, so the standard deviation
/// over the risk horizon is the square root of the horizon mean. Z comes from
/// the critical ratio. Negative safety stock is floored at zero.
///
/// # Arguments
/// * `backorder_cost` - Cost per unit owed per period.
/// * `holding_cost` - Cost per unit held per period.
/// * `demand_rate` - Poisson mean demand per period.
/// * `lead_time` - Periods between placing and receiving an order.
pub fn optimal_base_stock(
    backorder_cost: f64,
    holding_cost: f64,
    demand_rate: f64,
    lead_time: u32,
) -> BaseStockLevel {
    let z = inverse_normal_cdf(critical_ratio(backorder_cost, holding_cost));
    let horizon_mean = demand_rate.max(0.0) * (lead_time as f64 + 1.0);

    let safety = z * horizon_mean.sqrt();

    BaseStockLevel {
        target_inventory: to_units(horizon_mean),
        safety_stock: to_units(safety),
    }
}

fn to_units(value: f64) -> u32 {
    if value <= 0.0 || !value.is_finite() {
        0
    } else if value >= u32::MAX as f64 {
        u32::MAX
    } else {
        value.round() as u32
    }
}
