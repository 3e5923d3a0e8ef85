//! Base records read from the business store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bizops_core::{ExpenseId, Money, ProductId, SaleId};

/// A completed sale of one product line.
///
/// `total_price` is stored alongside the unit price (the store keeps both), and
/// revenue is always summed from `total_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: SaleId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    pub sale_date: DateTime<Utc>,
}

impl SaleRecord {
    /// Build a sale with `total_price = quantity × unit_price`.
    pub fn new(
        id: SaleId,
        product_id: ProductId,
        quantity: i64,
        unit_price: Money,
        sale_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_id,
            quantity,
            unit_price,
            total_price: unit_price.times(quantity),
            sale_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub amount: Money,
    pub expense_date: DateTime<Utc>,
}

impl ExpenseRecord {
    pub fn new(id: ExpenseId, amount: Money, expense_date: DateTime<Utc>) -> Self {
        Self {
            id,
            amount,
            expense_date,
        }
    }
}

/// A catalog product with its current stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    /// Units currently in stock.
    pub quantity: i64,
    pub cost_price: Money,
}

impl ProductRecord {
    pub fn new(id: ProductId, name: impl Into<String>, quantity: i64, cost_price: Money) -> Self {
        Self {
            id,
            name: name.into(),
            quantity,
            cost_price,
        }
    }

    /// Value of the stock on hand at cost.
    pub fn stock_value(&self) -> Money {
        self.cost_price.times(self.quantity)
    }

    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}
