//! Aggregation engine: the four investor views, computed on read.
//!
//! Each public operation reads the tables it needs from the [`RecordStore`]
//! and folds them with one of the pure functions at the bottom of this module.
//! An empty store is valid input and yields zeros / empty sequences.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use bizops_core::{Money, ProductId, StoreResult};

use crate::month::YearMonth;
use crate::records::{ExpenseRecord, ProductRecord, SaleRecord};
use crate::store::RecordStore;

/// Products with fewer units than this (but at least one) count as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Whole-business totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub total_revenue: Money,
    pub total_expenses: Money,
    /// Always exactly `total_revenue - total_expenses`.
    pub net_profit: Money,
    /// Products with stock on hand.
    pub active_product_count: u64,
    /// Number of sale records.
    pub transaction_count: u64,
    /// Σ stock × cost price.
    pub inventory_value: Money,
}

/// One calendar month of the trend report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPerformance {
    pub month: YearMonth,
    pub revenue: Money,
    pub expenses: Money,
    pub net_profit: Money,
}

/// Sales performance of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPerformance {
    pub id: ProductId,
    pub name: String,
    pub units_sold: i64,
    pub revenue: Money,
    /// Units sold valued at the product's current cost price.
    pub cost: Money,
    pub profit: Money,
    pub current_stock: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevels {
    /// Products with `0 < quantity < LOW_STOCK_THRESHOLD`.
    pub low_stock_count: u64,
    pub out_of_stock_count: u64,
}

/// Read-only analytics over a record store.
#[derive(Debug, Clone)]
pub struct AggregationEngine<S> {
    store: S,
}

impl<S: RecordStore> AggregationEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn summary(&self) -> StoreResult<AggregateSummary> {
        let sales = self.store.sales()?;
        let expenses = self.store.expenses()?;
        let products = self.store.products()?;

        Ok(summarize(&sales, &expenses, &products))
    }

    /// Most recent month first, at most `months_limit` rows.
    pub fn monthly_performance(&self, months_limit: usize) -> StoreResult<Vec<MonthlyPerformance>> {
        let sales = self.store.sales()?;
        let expenses = self.store.expenses()?;

        let rows = monthly(&sales, &expenses, months_limit);
        tracing::debug!(months_limit, rows = rows.len(), "monthly performance computed");
        Ok(rows)
    }

    /// Best performers by profit, at most `limit` rows.
    pub fn top_products(&self, limit: usize) -> StoreResult<Vec<ProductPerformance>> {
        let sales = self.store.sales()?;
        let products = self.store.products()?;

        let rows = rank_products(&sales, &products, limit);
        tracing::debug!(limit, rows = rows.len(), "top products computed");
        Ok(rows)
    }

    pub fn stock_levels(&self) -> StoreResult<StockLevels> {
        Ok(stock_levels(&self.store.products()?))
    }

    /// Summary and stock levels from a single read of each table.
    pub fn health_inputs(&self) -> StoreResult<(AggregateSummary, StockLevels)> {
        let sales = self.store.sales()?;
        let expenses = self.store.expenses()?;
        let products = self.store.products()?;

        Ok((summarize(&sales, &expenses, &products), stock_levels(&products)))
    }
}

pub fn summarize(
    sales: &[SaleRecord],
    expenses: &[ExpenseRecord],
    products: &[ProductRecord],
) -> AggregateSummary {
    let total_revenue: Money = sales.iter().map(|s| s.total_price).sum();
    let total_expenses: Money = expenses.iter().map(|e| e.amount).sum();

    AggregateSummary {
        total_revenue,
        total_expenses,
        net_profit: total_revenue - total_expenses,
        active_product_count: products.iter().filter(|p| p.in_stock()).count() as u64,
        transaction_count: sales.len() as u64,
        inventory_value: products.iter().map(ProductRecord::stock_value).sum(),
    }
}

pub fn monthly(
    sales: &[SaleRecord],
    expenses: &[ExpenseRecord],
    months_limit: usize,
) -> Vec<MonthlyPerformance> {
    // (revenue, expenses) per month. Expenses land in their own month whether
    // or not anything sold that month.
    let mut buckets: BTreeMap<YearMonth, (Money, Money)> = BTreeMap::new();

    for sale in sales {
        let bucket = buckets.entry(YearMonth::of(sale.sale_date)).or_default();
        bucket.0 = bucket.0 + sale.total_price;
    }
    for expense in expenses {
        let bucket = buckets.entry(YearMonth::of(expense.expense_date)).or_default();
        bucket.1 = bucket.1 + expense.amount;
    }

    buckets
        .into_iter()
        .rev()
        .take(months_limit)
        .map(|(month, (revenue, expenses))| MonthlyPerformance {
            month,
            revenue,
            expenses,
            net_profit: revenue - expenses,
        })
        .collect()
}

pub fn rank_products(
    sales: &[SaleRecord],
    products: &[ProductRecord],
    limit: usize,
) -> Vec<ProductPerformance> {
    let catalog: HashMap<ProductId, &ProductRecord> = products.iter().map(|p| (p.id, p)).collect();

    // (units, revenue) per product that has a catalog entry.
    let mut sold: HashMap<ProductId, (i64, Money)> = HashMap::new();
    for sale in sales.iter().filter(|s| catalog.contains_key(&s.product_id)) {
        let entry = sold.entry(sale.product_id).or_default();
        entry.0 = entry.0.saturating_add(sale.quantity);
        entry.1 = entry.1 + sale.total_price;
    }

    let mut ranked: Vec<ProductPerformance> = sold
        .into_iter()
        .filter_map(|(id, (units_sold, revenue))| {
            let product = catalog.get(&id)?;
            let cost = product.cost_price.times(units_sold);
            Some(ProductPerformance {
                id,
                name: product.name.clone(),
                units_sold,
                revenue,
                cost,
                profit: revenue - cost,
                current_stock: product.quantity,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.profit.cmp(&a.profit).then_with(|| a.id.cmp(&b.id)));
    ranked.truncate(limit);
    ranked
}

pub fn stock_levels(products: &[ProductRecord]) -> StockLevels {
    products.iter().fold(StockLevels::default(), |mut acc, p| {
        if p.quantity == 0 {
            acc.out_of_stock_count += 1;
        } else if p.quantity > 0 && p.quantity < LOW_STOCK_THRESHOLD {
            acc.low_stock_count += 1;
        }
        acc
    })
}
