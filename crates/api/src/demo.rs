//! Sample data for running the API locally without a real database.

use chrono::{DateTime, Datelike, Duration, Months, Utc};

use bizops_auth::{AccountRecord, AccountStatus, InMemoryAccountDirectory, Role};
use bizops_core::{AccountId, ExpenseId, Money, ProductId, SaleId};
use bizops_reporting::{ExpenseRecord, InMemoryRecordStore, ProductRecord, SaleRecord};

pub const DEMO_INVESTOR: AccountId = AccountId::new(1);
pub const DEMO_CLIENT: AccountId = AccountId::new(2);

/// Seed six months of trading ending at `now`, plus one active investor and
/// one active client account.
pub fn seed(records: &InMemoryRecordStore, accounts: &InMemoryAccountDirectory, now: DateTime<Utc>) {
    accounts.upsert(AccountRecord {
        id: DEMO_INVESTOR,
        role: Role::Investor,
        status: AccountStatus::Active,
    });
    accounts.upsert(AccountRecord {
        id: DEMO_CLIENT,
        role: Role::Client,
        status: AccountStatus::Active,
    });

    let catalog = [
        (1, "Espresso machine", 4, 18_000),
        (2, "Burr grinder", 12, 6_500),
        (3, "Milk jug", 0, 900),
        (4, "Descaler", 40, 350),
    ];
    for (id, name, quantity, cost_cents) in catalog {
        records.upsert_product(ProductRecord::new(
            ProductId::new(id),
            name,
            quantity,
            Money::from_minor(cost_cents),
        ));
    }

    let mut sale_id = 0;
    let mut expense_id = 0;
    for back in 0..6u32 {
        let Some(month) = now.checked_sub_months(Months::new(back)) else {
            continue;
        };
        let day = month - Duration::days(i64::from(month.day0()));

        for (product, quantity, unit_cents) in [(1, 2, 32_000), (2, 5, 11_000), (4, 20, 900)] {
            sale_id += 1;
            records.insert_sale(SaleRecord::new(
                SaleId::new(sale_id),
                ProductId::new(product),
                quantity + i64::from(back),
                Money::from_minor(unit_cents),
                day,
            ));
        }

        expense_id += 1;
        records.insert_expense(ExpenseRecord::new(
            ExpenseId::new(expense_id),
            Money::from_major(450),
            day + Duration::days(1),
        ));
    }

    tracing::info!(sales = sale_id, expenses = expense_id, "demo data seeded");
}
