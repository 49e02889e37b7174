//! Recorded strategy series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metric type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricType {
    /// Counter metric (monotonically increasing)
    Counter,
    /// Gauge metric (can go up or down)
    Gauge,
}

/// One recorded value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyMetric {
    /// Simulated date the value was recorded on
    pub date: NaiveDate,

    /// Strategy ID
    pub strategy_id: String,

    /// Metric type
    pub metric_type: MetricType,

    /// Metric name (e.g., "rotation.leverage")
    pub metric_name: String,

    /// Metric value
    pub value: f64,

    /// Additional labels for dimensions
    pub labels: HashMap<String, String>,
}

impl StrategyMetric {
    /// Create a new counter metric
    pub fn counter(
        date: NaiveDate,
        strategy_id: String,
        name: String,
        value: f64,
        labels: HashMap<String, String>,
    ) -> Self {
        Self {
            date,
            strategy_id,
            metric_type: MetricType::Counter,
            metric_name: name,
            value,
            labels,
        }
    }

    /// Create a new gauge metric
    pub fn gauge(
        date: NaiveDate,
        strategy_id: String,
        name: String,
        value: f64,
        labels: HashMap<String, String>,
    ) -> Self {
        Self {
            date,
            strategy_id,
            metric_type: MetricType::Gauge,
            metric_name: name,
            value,
            labels,
        }
    }
}

/// Standard rotation metric names
pub mod metric_names {
    /// Number of open positions
    pub const POSITIONS: &str = "rotation.positions";

    /// Current portfolio leverage
    pub const LEVERAGE: &str = "rotation.leverage";

    /// Highest leverage seen so far, recorded only when it rises
    pub const MAX_LEVERAGE: &str = "rotation.max_leverage";

    /// One per rebalance
    pub const REBALANCES: &str = "rotation.rebalances";

    /// One per non-zero target weight, valued at that weight
    pub const ORDERS_PLACED: &str = "rotation.orders_placed";

    /// Selected member with no tradable data on the rebalance day
    pub const MISSING_TRADE_DATA: &str = "rotation.missing_trade_data";

    /// Current member with no dividend yield figure
    pub const MISSING_FUNDAMENTALS: &str = "rotation.missing_fundamentals";

    /// Dividend yield of a selected member
    pub const SELECTED_YIELD: &str = "rotation.selected_yield";
}

/// Helper to create common rotation metrics
#[derive(Debug, Clone)]
pub struct MetricBuilder {
    strategy_id: String,
}

impl MetricBuilder {
    /// Create a new metric builder
    pub fn new(strategy_id: String) -> Self {
        Self { strategy_id }
    }

    /// Build a rebalance counter
    pub fn rebalance(&self, date: NaiveDate, selected: usize) -> StrategyMetric {
        let mut labels = HashMap::new();
        labels.insert("selected".to_string(), selected.to_string());

        StrategyMetric::counter(
            date,
            self.strategy_id.clone(),
            metric_names::REBALANCES.to_string(),
            1.0,
            labels,
        )
    }

    /// Build an order placed metric
    pub fn order_placed(&self, date: NaiveDate, security: &str, weight: f64) -> StrategyMetric {
        let mut labels = HashMap::new();
        labels.insert("security".to_string(), security.to_string());

        StrategyMetric::counter(
            date,
            self.strategy_id.clone(),
            metric_names::ORDERS_PLACED.to_string(),
            weight,
            labels,
        )
    }

    /// Build a selected-yield metric
    pub fn selected_yield(&self, date: NaiveDate, security: &str, dividend_yield: f64) -> StrategyMetric {
        let mut labels = HashMap::new();
        labels.insert("security".to_string(), security.to_string());

        StrategyMetric::gauge(
            date,
            self.strategy_id.clone(),
            metric_names::SELECTED_YIELD.to_string(),
            dividend_yield,
            labels,
        )
    }

    /// Build a skipped-member counter for `name`
    pub fn missing(&self, date: NaiveDate, name: &str, security: &str) -> StrategyMetric {
        let mut labels = HashMap::new();
        labels.insert("security".to_string(), security.to_string());

        StrategyMetric::counter(
            date,
            self.strategy_id.clone(),
            name.to_string(),
            1.0,
            labels,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2000, 1, 3).unwrap()
    }

    #[test]
    fn test_metric_creation() {
        let metric = StrategyMetric::gauge(
            date(),
            "test_strategy".to_string(),
            "test.metric".to_string(),
            42.0,
            HashMap::new(),
        );

        assert_eq!(metric.strategy_id, "test_strategy");
        assert_eq!(metric.metric_name, "test.metric");
        assert_eq!(metric.value, 42.0);
        assert_eq!(metric.metric_type, MetricType::Gauge);
    }

    #[test]
    fn test_metric_builder() {
        let builder = MetricBuilder::new("dow_yield".to_string());

        let rebalance = builder.rebalance(date(), 10);
        assert_eq!(rebalance.metric_name, metric_names::REBALANCES);
        assert_eq!(rebalance.metric_type, MetricType::Counter);
        assert_eq!(rebalance.labels.get("selected"), Some(&"10".to_string()));

        let selected = builder.selected_yield(date(), "KO", 0.031);
        assert_eq!(selected.metric_name, metric_names::SELECTED_YIELD);
        assert_eq!(selected.labels.get("security"), Some(&"KO".to_string()));

        let missing = builder.missing(date(), metric_names::MISSING_TRADE_DATA, "EK");
        assert_eq!(missing.value, 1.0);
    }

    #[test]
    fn test_order_placed_carries_weight() {
        let builder = MetricBuilder::new("dow_yield".to_string());

        let order = builder.order_placed(date(), "MO", 0.1);
        assert_eq!(order.metric_name, metric_names::ORDERS_PLACED);
        assert_eq!(order.metric_type, MetricType::Counter);
        assert_eq!(order.value, 0.1);
        assert_eq!(order.labels.get("security"), Some(&"MO".to_string()));
    }
}
