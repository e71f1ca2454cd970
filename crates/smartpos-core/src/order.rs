//! # Purchase-Order Lifecycle
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   pending ──approve──► approved ──► sent ──► received                  │
//! │                            │                     │                      │
//! │                            │                     └── stock += qty for  │
//! │                            │                         every order item  │
//! │                            └── approved_by / approved_at recorded      │
//! │                                                                         │
//! │   Only the immediate successor is accepted. Skipping a step, going     │
//! │   back, or repeating a state is rejected, so a received order can      │
//! │   never restock twice.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both `approve_order` and `update_order_status` use
//! [`OrderStatus::transition_to`].

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{OrderStatus, Product};
use crate::validation::{
    amount_out_of_range, validate_line_count, validate_price_cents, validate_quantity,
};

// =============================================================================
// Status Transitions
// =============================================================================

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Approved,
        OrderStatus::Sent,
        OrderStatus::Received,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Sent => "sent",
            OrderStatus::Received => "received",
        }
    }

    /// The only status this one may move to, if any.
    pub const fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Approved),
            OrderStatus::Approved => Some(OrderStatus::Sent),
            OrderStatus::Sent => Some(OrderStatus::Received),
            OrderStatus::Received => None,
        }
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.next() == Some(to)
    }

    /// Validates a move from `self` to `to` for the given order.
    ///
    /// ## Example
    /// ```rust
    /// use smartpos_core::OrderStatus;
    ///
    /// assert!(OrderStatus::Pending.transition_to(1, OrderStatus::Approved).is_ok());
    /// assert!(OrderStatus::Pending.transition_to(1, OrderStatus::Received).is_err());
    /// assert!(OrderStatus::Received.transition_to(1, OrderStatus::Received).is_err());
    /// ```
    pub fn transition_to(&self, order_id: i64, to: OrderStatus) -> CoreResult<OrderStatus> {
        if !self.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                order_id,
                from: *self,
                to,
            });
        }

        Ok(to)
    }

    /// Entering this status records who approved the order.
    pub const fn records_approval(&self) -> bool {
        matches!(self, OrderStatus::Approved)
    }

    /// Entering this status adds the ordered quantities to stock.
    pub const fn restocks(&self) -> bool {
        matches!(self, OrderStatus::Received)
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| CoreError::InvalidOrderStatus(s.to_string()))
    }
}

// =============================================================================
// Order Planning
// =============================================================================

/// One requested line of a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Input to `create_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderRequest {
    pub supplier_id: i64,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOrderLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlan {
    pub supplier_id: i64,
    pub lines: Vec<PlannedOrderLine>,
    pub total_cents: i64,
}

impl OrderPlan {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Prices a purchase order. Every product must exist; stock is not checked.
pub fn plan_order(request: &OrderRequest, products: &HashMap<i64, Product>) -> CoreResult<OrderPlan> {
    validate_line_count(request.items.len())?;
    for line in &request.items {
        validate_quantity(line.quantity)?;
        validate_price_cents("unit_price", line.unit_price_cents)?;
    }

    let mut total = Money::zero();
    let mut lines = Vec::with_capacity(request.items.len());

    for line in &request.items {
        if !products.contains_key(&line.product_id) {
            return Err(CoreError::not_found("Product", line.product_id));
        }

        let subtotal = Money::from_cents(line.unit_price_cents)
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| amount_out_of_range("subtotal"))?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| amount_out_of_range("total"))?;

        lines.push(PlannedOrderLine {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
            subtotal_cents: subtotal.cents(),
        });
    }

    Ok(OrderPlan {
        supplier_id: request.supplier_id,
        lines,
        total_cents: total.cents(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
