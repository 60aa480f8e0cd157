// src/model/pipeline.rs

use serde::Serialize;

/// A replenishment order in transit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Order {
    pub quantity: u32,
    pub remaining_lead_time: u32,
}

impl Order {
    pub fn new(quantity: u32, lead_time: u32) -> Self {
        Self {
            quantity,
            remaining_lead_time: lead_time,
        }
    }
}

/// In-flight orders of a single node, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPipeline {
    orders: Vec<Order>,
}

impl OrderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step 1 of a period: age every order by one period.
    ///
    /// Orders whose lead time hits zero are removed and their quantities
    /// returned as the period's arrivals.
    pub fn advance(&mut self) -> u32 {
        let mut arrived: u32 = 0;
        self.orders.retain_mut(|order| {
            order.remaining_lead_time = order.remaining_lead_time.saturating_sub(1);
            if order.remaining_lead_time == 0 {
                arrived = arrived.saturating_add(order.quantity);
                false
            } else {
                true
            }
        });
        arrived
    }

    /// Step 4 of a period: a zero quantity never enters the pipeline.
    pub fn place(&mut self, quantity: u32, lead_time: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        self.orders.push(Order::new(quantity, lead_time));
        true
    }

    pub fn pending(&self) -> &[Order] {
        &self.orders
    }

    /// Quantity ordered but not yet arrived.
    pub fn total_pending(&self) -> u32 {
        total_quantity(&self.orders)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

pub fn total_quantity(orders: &[Order]) -> u32 {
    orders
        .iter()
        .fold(0u32, |acc, order| acc.saturating_add(order.quantity))
}
