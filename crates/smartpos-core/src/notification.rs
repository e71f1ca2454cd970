//! # Notification Messages
//!
//! Builds the plain-text e-mails the API hands to its notifier. Delivery
//! (outbox, SMTP relay) is not this crate's business.
//!
//! | Message        | To                | Cc       | Trigger                       |
//! |----------------|-------------------|----------|-------------------------------|
//! | Low stock      | manager           |          | sale leaves stock ≤ threshold |
//! | Order approval | supplier          | manager  | order approved                |
//! | Receipt        | customer          |          | `send_receipt_email`          |

use std::collections::HashMap;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::receipt::Receipt;
use crate::types::{NotificationKind, Order, Product, Supplier};

/// A fully rendered outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub kind: NotificationKind,
    pub recipient: String,
    pub cc: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Alert sent to the manager when a sale leaves a product at or below its
/// threshold.
pub fn low_stock_alert(
    product: &Product,
    supplier: Option<&Supplier>,
    manager_email: &str,
) -> OutboundMessage {
    let mut body = String::new();
    let _ = writeln!(body, "Stock for {} has reached its reorder level.", product.name);
    let _ = writeln!(body);
    let _ = writeln!(body, "SKU:             {}", product.sku);
    let _ = writeln!(body, "Current stock:   {}", product.stock);
    let _ = writeln!(body, "Threshold:       {}", product.low_stock_threshold);
    if let Some(supplier) = supplier {
        let _ = writeln!(body, "Supplier:        {} <{}>", supplier.name, supplier.email);
    }
    let _ = writeln!(body);
    let _ = writeln!(body, "Please raise a purchase order to restock.");

    OutboundMessage {
        kind: NotificationKind::LowStock,
        recipient: manager_email.to_string(),
        cc: None,
        subject: format!("Low Stock Alert: {}", product.name),
        body,
    }
}

/// Purchase order sent to the supplier once a manager approves it.
///
/// `product_names` maps item product ids to display names; unknown ids are
/// listed as `Product #<id>`.
pub fn order_approval(
    order: &Order,
    supplier: &Supplier,
    product_names: &HashMap<i64, String>,
    manager_email: Option<&str>,
    currency: &str,
) -> OutboundMessage {
    let mut body = String::new();
    let _ = writeln!(body, "Dear {},", supplier.contact);
    let _ = writeln!(body);
    let _ = writeln!(body, "Please supply the following items for purchase order #{}:", order.id);
    let _ = writeln!(body);
    for item in &order.items {
        let name = product_names
            .get(&item.product_id)
            .cloned()
            .unwrap_or_else(|| format!("Product #{}", item.product_id));
        let _ = writeln!(
            body,
            "- {} - Quantity: {} @ {} = {}",
            name,
            item.quantity,
            Money::from_cents(item.unit_price_cents).format_with(currency),
            Money::from_cents(item.subtotal_cents).format_with(currency),
        );
    }
    let _ = writeln!(body);
    let _ = writeln!(body, "Order total: {}", order.total().format_with(currency));

    OutboundMessage {
        kind: NotificationKind::OrderApproval,
        recipient: supplier.email.clone(),
        cc: manager_email.map(str::to_string),
        subject: format!("Purchase Order #{} - {}", order.id, supplier.name),
        body,
    }
}

/// Receipt copy for a customer.
pub fn receipt_message(receipt: &Receipt, customer_email: &str) -> OutboundMessage {
    let currency = receipt.currency.as_str();
    let transaction = &receipt.transaction;

    let mut body = String::new();
    let _ = writeln!(body, "{}", receipt.store_name);
    let _ = writeln!(body, "{}", receipt.store_address);
    let _ = writeln!(body);
    let _ = writeln!(body, "Receipt: {}", receipt.receipt_number);
    let _ = writeln!(body, "Date:    {}", transaction.created_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(body);
    for item in &transaction.items {
        let _ = writeln!(
            body,
            "{} x{} @ {} = {}",
            item.name_snapshot,
            item.quantity,
            Money::from_cents(item.price_cents).format_with(currency),
            item.subtotal().format_with(currency),
        );
    }
    let _ = writeln!(body);
    let _ = writeln!(body, "Total: {}", transaction.total().format_with(currency));
    let _ = writeln!(body);
    let _ = writeln!(body, "{}", receipt.footer);

    OutboundMessage {
        kind: NotificationKind::Receipt,
        recipient: customer_email.to_string(),
        cc: None,
        subject: format!("Receipt - {}", receipt.receipt_number),
        body,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::StoreSettings;
    use crate::types::{OrderItem, OrderStatus, PaymentMethod, Transaction, TransactionItem};
    use chrono::Utc;

    fn supplier() -> Supplier {
        Supplier {
            id: 1,
            name: "Fresh Foods Ltd".to_string(),
            contact: "Priya".to_string(),
            email: "orders@freshfoods.example".to_string(),
            phone: "555-0100".to_string(),
            address: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_low_stock_alert() {
        let product = Product {
            id: 3,
            name: "Milk 1L".to_string(),
            sku: "MILK-1L".to_string(),
            description: None,
            price_cents: 120,
            cost_cents: 80,
            stock: 2,
            low_stock_threshold: 5,
            supplier_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let message = low_stock_alert(&product, Some(&supplier()), "manager@pos.com");
        assert_eq!(message.kind, NotificationKind::LowStock);
        assert_eq!(message.recipient, "manager@pos.com");
        assert_eq!(message.subject, "Low Stock Alert: Milk 1L");
        assert!(message.body.contains("Current stock:   2"));
        assert!(message.body.contains("Fresh Foods Ltd"));
    }

    #[test]
    fn test_order_approval_goes_to_supplier_with_manager_cc() {
        let order = Order {
            id: 12,
            supplier_id: 1,
            status: OrderStatus::Approved,
            total_cents: 1000,
            approved_by: Some(2),
            approved_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            items: vec![OrderItem {
                id: 1,
                order_id: 12,
                product_id: 3,
                quantity: 10,
                unit_price_cents: 100,
                subtotal_cents: 1000,
            }],
        };
        let names: HashMap<i64, String> = [(3, "Milk 1L".to_string())].into();

        let message = order_approval(&order, &supplier(), &names, Some("manager@pos.com"), "USD");
        assert_eq!(message.recipient, "orders@freshfoods.example");
        assert_eq!(message.cc.as_deref(), Some("manager@pos.com"));
        assert_eq!(message.subject, "Purchase Order #12 - Fresh Foods Ltd");
        assert!(message.body.contains("- Milk 1L - Quantity: 10 @ USD 1.00 = USD 10.00"));
    }

    #[test]
    fn test_receipt_message() {
        let transaction = Transaction {
            id: 42,
            user_id: 3,
            total_cents: 300,
            payment_method: PaymentMethod::Cash,
            customer_name: None,
            customer_email: None,
            customer_mobile: None,
            created_at: Utc::now(),
            items: vec![TransactionItem {
                id: 1,
                transaction_id: 42,
                product_id: 1,
                sku_snapshot: "COLA".to_string(),
                name_snapshot: "Cola".to_string(),
                quantity: 2,
                price_cents: 150,
                subtotal_cents: 300,
            }],
        };
        let receipt = Receipt::build(transaction, &StoreSettings::default());

        let message = receipt_message(&receipt, "jane@example.com");
        assert_eq!(message.subject, "Receipt - RCP-000042");
        assert_eq!(message.recipient, "jane@example.com");
        assert!(message.body.contains("Cola x2 @ USD 1.50 = USD 3.00"));
        assert!(message.body.contains("Thank you for your business!"));
    }
}
