//! # Analytics
//!
//! Aggregations over transactions and products for the manager dashboard.
//!
//! ## Sales Analytics
//! ```text
//! transactions in [start, end]
//!      │
//!      ├── total_sales          = Σ total
//!      ├── total_transactions   = count
//!      ├── average_transaction  = total_sales / count  (0 when empty)
//!      ├── top_products         = group items by product,
//!      │                          sort by revenue desc (stable), take 10
//!      └── sales_by_day         = group by UTC date, ascending
//! ```
//!
//! ## Inventory Analytics
//! ```text
//! products
//!      ├── total_products, low_stock_products
//!      ├── total_value   = Σ stock × cost
//!      └── turnover_rate = total_products / Σ stock × 100  (0 when no stock)
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Product, Transaction};

/// Number of entries returned in `top_products`.
pub const TOP_PRODUCTS_LIMIT: usize = 10;

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive time window for sales analytics. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Parses optional bounds given as RFC 3339 timestamps or `YYYY-MM-DD`.
    ///
    /// A bare date as `end` covers that whole day.
    ///
    /// ## Example
    /// ```rust
    /// use smartpos_core::analytics::DateRange;
    ///
    /// let range = DateRange::parse(Some("2026-03-01"), Some("2026-03-31")).unwrap();
    /// assert_eq!(range.end.unwrap().to_rfc3339(), "2026-03-31T23:59:59.999999999+00:00");
    /// assert!(DateRange::parse(Some("yesterday"), None).is_err());
    /// ```
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, ValidationError> {
        let start = start
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound("start_date", s, false))
            .transpose()?;
        let end = end
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound("end_date", s, true))
            .transpose()?;

        Ok(DateRange { start, end })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at <= e)
    }
}

fn parse_bound(field: &str, raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, ValidationError> {
    let raw = raw.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected RFC 3339 timestamp or YYYY-MM-DD".to_string(),
    };

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let at = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };

    at.map(|naive| naive.and_utc()).ok_or_else(invalid)
}

// =============================================================================
// Sales Analytics
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSales {
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    pub total_quantity: i64,
    pub total_revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySales {
    /// ISO date (`YYYY-MM-DD`, UTC).
    pub date: String,
    pub total_cents: i64,
    pub transactions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesAnalytics {
    pub total_sales_cents: i64,
    pub total_transactions: i64,
    /// Rounded to the nearest cent.
    pub average_transaction_cents: i64,
    pub top_products: Vec<ProductSales>,
    pub sales_by_day: Vec<DailySales>,
}

/// Aggregates transactions (with items loaded) that fall inside `range`.
///
/// `products` supplies current names for the top-products table; items whose
/// product has since been deleted fall back to their sale-time snapshot.
pub fn sales_analytics(
    transactions: &[Transaction],
    products: &HashMap<i64, Product>,
    range: &DateRange,
) -> SalesAnalytics {
    let in_range: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| range.contains(t.created_at))
        .collect();

    let total_sales: Money = in_range.iter().map(|t| t.total()).sum();
    let count = in_range.len() as i64;

    // Group items by product, remembering first-seen order for a stable sort
    let mut order: Vec<i64> = Vec::new();
    let mut by_product: HashMap<i64, ProductSales> = HashMap::new();
    for item in in_range.iter().flat_map(|t| t.items.iter()) {
        let entry = by_product.entry(item.product_id).or_insert_with(|| {
            order.push(item.product_id);
            let (sku, name) = products
                .get(&item.product_id)
                .map(|p| (p.sku.clone(), p.name.clone()))
                .unwrap_or_else(|| (item.sku_snapshot.clone(), item.name_snapshot.clone()));
            ProductSales {
                product_id: item.product_id,
                sku,
                name,
                total_quantity: 0,
                total_revenue_cents: 0,
            }
        });
        entry.total_quantity = entry.total_quantity.saturating_add(item.quantity);
        entry.total_revenue_cents = entry.total_revenue_cents.saturating_add(item.subtotal_cents);
    }

    let mut top_products: Vec<ProductSales> = order
        .into_iter()
        .filter_map(|id| by_product.remove(&id))
        .collect();
    // sort_by is stable: equal revenue keeps first-seen order
    top_products.sort_by(|a, b| b.total_revenue_cents.cmp(&a.total_revenue_cents));
    top_products.truncate(TOP_PRODUCTS_LIMIT);

    let mut by_day: BTreeMap<NaiveDate, DailySales> = BTreeMap::new();
    for t in &in_range {
        let day = t.created_at.date_naive();
        let entry = by_day.entry(day).or_insert_with(|| DailySales {
            date: day.format("%Y-%m-%d").to_string(),
            total_cents: 0,
            transactions: 0,
        });
        entry.total_cents = entry.total_cents.saturating_add(t.total_cents);
        entry.transactions += 1;
    }

    SalesAnalytics {
        total_sales_cents: total_sales.cents(),
        total_transactions: count,
        average_transaction_cents: total_sales.average(count).cents(),
        top_products,
        sales_by_day: by_day.into_values().collect(),
    }
}

// =============================================================================
// Inventory Analytics
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryAnalytics {
    pub total_products: i64,
    pub low_stock_products: i64,
    /// Σ stock × cost, in cents.
    pub total_value_cents: i64,
    pub turnover_rate: f64,
}

pub fn inventory_analytics(products: &[Product]) -> InventoryAnalytics {
    let total_products = products.len() as i64;
    let low_stock_products = products.iter().filter(|p| p.is_low_stock()).count() as i64;
    let total_value: Money = products.iter().map(Product::stock_value).sum();
    let total_stock = products.iter().fold(0i64, |acc, p| acc.saturating_add(p.stock));

    let turnover_rate = if total_stock > 0 {
        total_products as f64 / total_stock as f64 * 100.0
    } else {
        0.0
    };

    InventoryAnalytics {
        total_products,
        low_stock_products,
        total_value_cents: total_value.cents(),
        turnover_rate,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
