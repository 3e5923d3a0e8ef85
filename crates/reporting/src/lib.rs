//! `bizops-reporting`: investor analytics over sales, expenses and stock.
//!
//! Everything here is recomputed from the [`RecordStore`] on every call;
//! nothing derived is cached or written back.

pub mod engine;
pub mod health;
pub mod month;
pub mod records;
pub mod store;

pub use engine::{AggregateSummary, AggregationEngine, MonthlyPerformance, ProductPerformance, StockLevels};
pub use health::{HealthMetrics, HealthScorer, HealthStatus, Ratio};
pub use month::YearMonth;
pub use records::{ExpenseRecord, ProductRecord, SaleRecord};
pub use store::{InMemoryRecordStore, RecordStore};
