use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bizops_core::{ProductId, StoreResult};

use crate::records::{ExpenseRecord, ProductRecord, SaleRecord};

/// Read-only access to the business records the reports are built from.
///
/// Each call returns a consistent view of one table. Consistency across
/// tables within one report is not guaranteed.
pub trait RecordStore: Send + Sync {
    fn sales(&self) -> StoreResult<Vec<SaleRecord>>;
    fn expenses(&self) -> StoreResult<Vec<ExpenseRecord>>;
    fn products(&self) -> StoreResult<Vec<ProductRecord>>;
}

impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    fn sales(&self) -> StoreResult<Vec<SaleRecord>> {
        (**self).sales()
    }

    fn expenses(&self) -> StoreResult<Vec<ExpenseRecord>> {
        (**self).expenses()
    }

    fn products(&self) -> StoreResult<Vec<ProductRecord>> {
        (**self).products()
    }
}

#[derive(Debug, Default)]
struct Tables {
    sales: Vec<SaleRecord>,
    expenses: Vec<ExpenseRecord>,
    products: BTreeMap<ProductId, ProductRecord>,
}

/// In-memory record store for tests/dev.
///
/// The write methods stand in for the CRUD side of the application, which
/// owns these tables in production.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    inner: RwLock<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_sale(&self, sale: SaleRecord) {
        self.write().sales.push(sale);
    }

    pub fn insert_expense(&self, expense: ExpenseRecord) {
        self.write().expenses.push(expense);
    }

    pub fn upsert_product(&self, product: ProductRecord) {
        self.write().products.insert(product.id, product);
    }

    // A panicked writer leaves whole rows behind, never half-written ones, so
    // the tables stay usable after poisoning.
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn sales(&self) -> StoreResult<Vec<SaleRecord>> {
        Ok(self.read().sales.clone())
    }

    fn expenses(&self) -> StoreResult<Vec<ExpenseRecord>> {
        Ok(self.read().expenses.clone())
    }

    fn products(&self) -> StoreResult<Vec<ProductRecord>> {
        Ok(self.read().products.values().cloned().collect())
    }
}
