//! # Sale Planning
//!
//! Turns a sale request into a priced, stock-checked plan before anything
//! is written.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleRequest { items, payment_method, customer }                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  plan_sale() ← THIS MODULE (pure)                                      │
//! │       │  1. validate every line (qty range, price ≥ 0)                 │
//! │       │  2. walk lines in input order:                                 │
//! │       │     ├── product missing?            → NotFound                 │
//! │       │     └── Σ qty for product > stock?  → InsufficientStock        │
//! │       │  3. subtotal = price × qty, total = Σ subtotal                 │
//! │       ▼                                                                 │
//! │  SalePlan ──► smartpos-db: insert + guarded stock decrement (1 tx)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock check here is advisory; the database re-checks each decrement
//! inside the write transaction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, Product};
use crate::validation::{
    amount_out_of_range, validate_email, validate_line_count, validate_price_cents,
    validate_quantity,
};

/// One requested line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price charged, in cents.
    pub price_cents: i64,
}

/// Input to `record_sale`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRequest {
    pub items: Vec<SaleLine>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_mobile: Option<String>,
}

impl SaleRequest {
    /// Checks shape only; product lookups happen in [`plan_sale`].
    pub fn validate(&self) -> CoreResult<()> {
        validate_line_count(self.items.len())?;

        for line in &self.items {
            validate_quantity(line.quantity)?;
            validate_price_cents("price", line.price_cents)?;
        }

        if let Some(email) = self.customer_email.as_deref().filter(|e| !e.trim().is_empty()) {
            validate_email(email)?;
        }

        Ok(())
    }
}

/// A priced line with the product identity frozen for the receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSaleLine {
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub price_cents: i64,
    pub subtotal_cents: i64,
}

/// The result of planning: lines in input order plus the grand total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlan {
    pub lines: Vec<PlannedSaleLine>,
    pub total_cents: i64,
}

impl SalePlan {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Total quantity per product, in first-seen order.
    pub fn demand(&self) -> Vec<(i64, i64)> {
        let mut demand: Vec<(i64, i64)> = Vec::new();

        for line in &self.lines {
            match demand.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, qty)) => *qty += line.quantity,
                None => demand.push((line.product_id, line.quantity)),
            }
        }

        demand
    }
}

/// Prices and stock-checks a sale request against the current products.
///
/// ## Arguments
/// * `request` - The requested lines
/// * `products` - Every product the request references, keyed by id
///
/// ## Errors
/// The first failing line (in input order) aborts planning:
/// `NotFound` for an unknown product, `InsufficientStock` when the running
/// total for a product exceeds its stock.
pub fn plan_sale(request: &SaleRequest, products: &HashMap<i64, Product>) -> CoreResult<SalePlan> {
    request.validate()?;

    let mut requested: HashMap<i64, i64> = HashMap::new();
    let mut lines = Vec::with_capacity(request.items.len());
    let mut total = Money::zero();

    for line in &request.items {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| CoreError::not_found("Product", line.product_id))?;

        let running = requested.entry(product.id).or_insert(0);
        *running += line.quantity;

        if *running > product.stock {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: *running,
            });
        }

        let subtotal = Money::from_cents(line.price_cents)
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| amount_out_of_range("subtotal"))?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| amount_out_of_range("total"))?;

        lines.push(PlannedSaleLine {
            product_id: product.id,
            sku: product.sku.clone(),
            name: product.name.clone(),
            quantity: line.quantity,
            price_cents: line.price_cents,
            subtotal_cents: subtotal.cents(),
        });
    }

    Ok(SalePlan {
        lines,
        total_cents: total.cents(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
