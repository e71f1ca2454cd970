//! Sales and inventory reporting. Manager and above.

use serde::Deserialize;
use smartpos_core::access::require_min_role;
use smartpos_core::analytics::{
    inventory_analytics as summarize_inventory, sales_analytics as summarize_sales, DateRange,
    InventoryAnalytics, SalesAnalytics,
};
use smartpos_core::{Actor, RoleName};
use tracing::debug;

use crate::error::ApiResult;
use crate::AppState;

/// Optional bounds, RFC 3339 or `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn sales_analytics(
    state: &AppState,
    actor: Option<&Actor>,
    query: DateRangeQuery,
) -> ApiResult<SalesAnalytics> {
    require_min_role(actor, RoleName::Manager)?;
    let range = DateRange::parse(query.start_date.as_deref(), query.end_date.as_deref())?;

    let transactions = state.db.transactions().list_in_range(&range).await?;
    let mut ids: Vec<i64> = transactions
        .iter()
        .flat_map(|t| t.items.iter().map(|item| item.product_id))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    let products = state.db.products().get_many(&ids).await?;

    debug!(transactions = transactions.len(), products = products.len(), "Computing sales analytics");
    Ok(summarize_sales(&transactions, &products, &range))
}

pub async fn inventory_analytics(
    state: &AppState,
    actor: Option<&Actor>,
) -> ApiResult<InventoryAnalytics> {
    require_min_role(actor, RoleName::Manager)?;
    let products = state.db.products().list().await?;
    Ok(summarize_inventory(&products))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::pos::record_sale;
    use crate::services::testing::{actor, product, state, supplier};
    use smartpos_core::sale::{SaleLine, SaleRequest};
    use smartpos_core::PaymentMethod;

    fn sale(product_id: i64, quantity: i64, price_cents: i64) -> SaleRequest {
        SaleRequest {
            items: vec![SaleLine { product_id, quantity, price_cents }],
            payment_method: PaymentMethod::Cash,
            customer_name: None,
            customer_email: None,
            customer_mobile: None,
        }
    }

    #[tokio::test]
    async fn test_sales_analytics_totals() {
        let (state, _) = state().await;
        let cashier = actor(&state, "cashier@pos.com", RoleName::Cashier).await;
        let manager = actor(&state, "manager@pos.com", RoleName::Manager).await;
        let vendor = supplier(&state, "TechWorld").await;
        let mouse = product(&state, vendor.id, "TECH-001", 50, 1).await;
        let cable = product(&state, vendor.id, "TECH-002", 50, 1).await;

        record_sale(&state, Some(&cashier), sale(mouse.id, 2, 1000)).await.unwrap();
        record_sale(&state, Some(&cashier), sale(cable.id, 1, 500)).await.unwrap();

        let report = sales_analytics(&state, Some(&manager), DateRangeQuery::default())
            .await
            .unwrap();
        assert_eq!(report.total_sales_cents, 2500);
        assert_eq!(report.total_transactions, 2);
        assert_eq!(report.average_transaction_cents, 1250);
        assert_eq!(report.top_products[0].product_id, mouse.id);
        assert_eq!(report.top_products[0].total_quantity, 2);
        assert_eq!(report.sales_by_day.len(), 1);

        let err = sales_analytics(&state, Some(&cashier), DateRangeQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_sales_analytics_range_and_bad_dates() {
        let (state, _) = state().await;
        let manager = actor(&state, "manager@pos.com", RoleName::Manager).await;
        let vendor = supplier(&state, "TechWorld").await;
        let mouse = product(&state, vendor.id, "TECH-001", 50, 1).await;
        record_sale(&state, Some(&manager), sale(mouse.id, 1, 1000)).await.unwrap();

        let past = DateRangeQuery {
            start_date: Some("2000-01-01".to_string()),
            end_date: Some("2000-12-31".to_string()),
        };
        let report = sales_analytics(&state, Some(&manager), past).await.unwrap();
        assert_eq!(report.total_transactions, 0);
        assert_eq!(report.average_transaction_cents, 0);

        let bad = DateRangeQuery {
            start_date: Some("last week".to_string()),
            end_date: None,
        };
        let err = sales_analytics(&state, Some(&manager), bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadUserInput);
    }

    #[tokio::test]
    async fn test_inventory_analytics() {
        let (state, _) = state().await;
        let manager = actor(&state, "manager@pos.com", RoleName::Manager).await;

        let empty = inventory_analytics(&state, Some(&manager)).await.unwrap();
        assert_eq!(empty.total_products, 0);
        assert_eq!(empty.turnover_rate, 0.0);

        let vendor = supplier(&state, "TechWorld").await;
        product(&state, vendor.id, "TECH-001", 10, 2).await;
        product(&state, vendor.id, "TECH-002", 2, 5).await;

        let report = inventory_analytics(&state, Some(&manager)).await.unwrap();
        assert_eq!(report.total_products, 2);
        assert_eq!(report.low_stock_products, 1);
        assert_eq!(report.total_value_cents, 12 * 600);
    }
}
