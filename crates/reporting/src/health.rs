//! Financial health indicators derived from the summary.

use serde::Serialize;

use bizops_core::Money;

use crate::engine::{AggregateSummary, StockLevels};

/// A ratio that may be undefined because its denominator is zero.
///
/// Serializes as a JSON number, or `null` when undefined. Never NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ratio(Option<f64>);

impl Ratio {
    pub const fn undefined() -> Self {
        Self(None)
    }

    pub const fn of(value: f64) -> Self {
        Self(Some(value))
    }

    /// `numerator / denominator`, undefined when the denominator is zero.
    pub fn between(numerator: Money, denominator: Money) -> Self {
        if denominator.is_zero() {
            return Self::undefined();
        }
        Self(Some(numerator.minor_units() as f64 / denominator.minor_units() as f64))
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }

    pub fn is_undefined(&self) -> bool {
        self.0.is_none()
    }
}

/// Qualitative classification of the profit margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Excellent,
    Good,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    /// No revenue yet, so there is no margin to classify.
    Unknown,
}

impl HealthStatus {
    /// Margins strictly above this are excellent.
    pub const EXCELLENT_ABOVE: f64 = 0.20;
    /// Margins strictly above this (and not excellent) are good.
    pub const GOOD_ABOVE: f64 = 0.10;

    pub fn classify(profit_margin: Ratio) -> Self {
        match profit_margin.value() {
            None => HealthStatus::Unknown,
            Some(m) if m > Self::EXCELLENT_ABOVE => HealthStatus::Excellent,
            Some(m) if m > Self::GOOD_ABOVE => HealthStatus::Good,
            Some(_) => HealthStatus::NeedsImprovement,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "Excellent",
            HealthStatus::Good => "Good",
            HealthStatus::NeedsImprovement => "Needs Improvement",
            HealthStatus::Unknown => "Unknown",
        }
    }
}

impl core::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub profit_margin: Ratio,
    /// Inventory value relative to revenue.
    pub inventory_turnover: Ratio,
    pub expense_ratio: Ratio,
    pub low_stock_count: u64,
    /// Reported only; does not feed the classification.
    pub out_of_stock_count: u64,
    pub health_status: HealthStatus,
}

/// Derives [`HealthMetrics`] from aggregation output. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthScorer;

impl HealthScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, summary: &AggregateSummary, stock: &StockLevels) -> HealthMetrics {
        let revenue = summary.total_revenue;
        let profit_margin = Ratio::between(summary.net_profit, revenue);

        HealthMetrics {
            profit_margin,
            inventory_turnover: Ratio::between(summary.inventory_value, revenue),
            expense_ratio: Ratio::between(summary.total_expenses, revenue),
            low_stock_count: stock.low_stock_count,
            out_of_stock_count: stock.out_of_stock_count,
            health_status: HealthStatus::classify(profit_margin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(revenue: i64, expenses: i64, inventory: i64) -> AggregateSummary {
        let total_revenue = Money::from_minor(revenue);
        let total_expenses = Money::from_minor(expenses);
        AggregateSummary {
            total_revenue,
            total_expenses,
            net_profit: total_revenue - total_expenses,
            active_product_count: 0,
            transaction_count: 0,
            inventory_value: Money::from_minor(inventory),
        }
    }

    #[test]
    fn zero_revenue_leaves_every_ratio_undefined() {
        let metrics = HealthScorer::new().score(&summary(0, 500, 1_000), &StockLevels::default());

        assert!(metrics.profit_margin.is_undefined());
        assert!(metrics.inventory_turnover.is_undefined());
        assert!(metrics.expense_ratio.is_undefined());
        assert_eq!(metrics.health_status, HealthStatus::Unknown);
    }

    #[test]
    fn undefined_ratios_serialize_as_null() {
        let metrics = HealthScorer::new().score(&summary(0, 0, 0), &StockLevels::default());
        let json = serde_json::to_value(&metrics).unwrap();

        assert!(json["profitMargin"].is_null());
        assert!(json["inventoryTurnover"].is_null());
        assert!(json["expenseRatio"].is_null());
        assert_eq!(json["healthStatus"], "Unknown");
    }

    #[test]
    fn ratios_are_relative_to_revenue() {
        let stock = StockLevels {
            low_stock_count: 3,
            out_of_stock_count: 1,
        };
        let metrics = HealthScorer::new().score(&summary(10_000, 7_500, 5_000), &stock);

        assert_eq!(metrics.profit_margin, Ratio::of(0.25));
        assert_eq!(metrics.inventory_turnover, Ratio::of(0.5));
        assert_eq!(metrics.expense_ratio, Ratio::of(0.75));
        assert_eq!(metrics.low_stock_count, 3);
        assert_eq!(metrics.out_of_stock_count, 1);
        assert_eq!(metrics.health_status, HealthStatus::Excellent);
    }

    #[test]
    fn classification_thresholds_are_strict() {
        assert_eq!(HealthStatus::classify(Ratio::of(0.2000001)), HealthStatus::Excellent);
        assert_eq!(HealthStatus::classify(Ratio::of(0.20)), HealthStatus::Good);
        assert_eq!(HealthStatus::classify(Ratio::of(0.1000001)), HealthStatus::Good);
        assert_eq!(HealthStatus::classify(Ratio::of(0.10)), HealthStatus::NeedsImprovement);
        assert_eq!(HealthStatus::classify(Ratio::of(-0.4)), HealthStatus::NeedsImprovement);
        assert_eq!(HealthStatus::classify(Ratio::undefined()), HealthStatus::Unknown);
    }

    #[test]
    fn exact_twenty_percent_margin_from_money_is_good() {
        let metrics = HealthScorer::new().score(&summary(100_000, 80_000, 0), &StockLevels::default());
        assert_eq!(metrics.profit_margin, Ratio::of(0.2));
        assert_eq!(metrics.health_status, HealthStatus::Good);
    }

    #[test]
    fn out_of_stock_does_not_change_status() {
        let none_out = HealthScorer::new().score(&summary(1_000, 500, 0), &StockLevels::default());
        let many_out = HealthScorer::new().score(
            &summary(1_000, 500, 0),
            &StockLevels {
                low_stock_count: 0,
                out_of_stock_count: 40,
            },
        );
        assert_eq!(none_out.health_status, many_out.health_status);
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(
            serde_json::to_value(HealthStatus::NeedsImprovement).unwrap(),
            serde_json::json!("Needs Improvement")
        );
    }
}
