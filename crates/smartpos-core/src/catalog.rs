//! # Catalog Inputs
//!
//! Request shapes for creating and editing products and suppliers.
//!
//! Updates are partial: `None` leaves the stored value alone. The update
//! types apply themselves to a loaded record so the repository can write the
//! merged row back in one statement.

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::types::{Product, Supplier};
use crate::validation::{
    validate_email, validate_name, validate_price_cents, validate_sku, validate_stock_level,
};

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    pub cost_cents: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
    pub supplier_id: i64,
}

fn default_low_stock_threshold() -> i64 {
    10
}

impl NewProduct {
    pub fn validate(&self) -> CoreResult<()> {
        validate_name("name", &self.name)?;
        validate_sku(&self.sku)?;
        validate_price_cents("price_cents", self.price_cents)?;
        validate_price_cents("cost_cents", self.cost_cents)?;
        validate_stock_level("stock", self.stock)?;
        validate_stock_level("low_stock_threshold", self.low_stock_threshold)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_cents: Option<i64>,
    pub stock: Option<i64>,
    pub low_stock_threshold: Option<i64>,
    pub supplier_id: Option<i64>,
}

impl ProductUpdate {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(sku) = &self.sku {
            validate_sku(sku)?;
        }
        if let Some(price) = self.price_cents {
            validate_price_cents("price_cents", price)?;
        }
        if let Some(cost) = self.cost_cents {
            validate_price_cents("cost_cents", cost)?;
        }
        if let Some(stock) = self.stock {
            validate_stock_level("stock", stock)?;
        }
        if let Some(threshold) = self.low_stock_threshold {
            validate_stock_level("low_stock_threshold", threshold)?;
        }
        Ok(())
    }

    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.trim().to_string();
        }
        if let Some(sku) = &self.sku {
            product.sku = sku.trim().to_string();
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(price) = self.price_cents {
            product.price_cents = price;
        }
        if let Some(cost) = self.cost_cents {
            product.cost_cents = cost;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(threshold) = self.low_stock_threshold {
            product.low_stock_threshold = threshold;
        }
        if let Some(supplier_id) = self.supplier_id {
            product.supplier_id = supplier_id;
        }
    }
}

// =============================================================================
// Suppliers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub contact: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewSupplier {
    pub fn validate(&self) -> CoreResult<()> {
        validate_name("name", &self.name)?;
        validate_name("contact", &self.contact)?;
        validate_email(&self.email)?;
        validate_name("phone", &self.phone)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierUpdate {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl SupplierUpdate {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(contact) = &self.contact {
            validate_name("contact", contact)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(phone) = &self.phone {
            validate_name("phone", phone)?;
        }
        Ok(())
    }

    pub fn apply_to(&self, supplier: &mut Supplier) {
        if let Some(name) = &self.name {
            supplier.name = name.trim().to_string();
        }
        if let Some(contact) = &self.contact {
            supplier.contact = contact.trim().to_string();
        }
        if let Some(email) = &self.email {
            supplier.email = email.trim().to_string();
        }
        if let Some(phone) = &self.phone {
            supplier.phone = phone.trim().to_string();
        }
        if let Some(address) = &self.address {
            supplier.address = Some(address.clone());
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
