//! Strategy execution context

use crate::config::ExecutionConfig;
use crate::execution::ExecutionSimulator;
use crate::fundamentals::FundamentalsProvider;
use crate::metrics::StrategyMetric;
use crate::types::{Fundamentals, MemberSet, PortfolioSnapshot, SecurityId, TargetWeightRequest};
use crate::{StrategyError, StrategyParams, StrategyResult};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-run handle passed into every strategy hook
///
/// Gives strategies access to execution, fundamentals and recording, and
/// keeps the log of instructions issued during the run.
pub struct StrategyContext {
    /// Unique strategy identifier
    pub strategy_id: String,

    /// Execution simulator, shared with whoever drives the run
    exec_engine: Arc<Mutex<dyn ExecutionSimulator>>,

    /// Fundamentals source
    fundamentals: Arc<dyn FundamentalsProvider>,

    /// Strategy parameters
    pub params: StrategyParams,

    /// Simulated date of the hook being run
    current_date: Option<NaiveDate>,

    /// Every target-weight request issued, in order
    order_log: Vec<TargetWeightRequest>,

    /// Recorded series
    metrics_buffer: Vec<StrategyMetric>,
}

impl StrategyContext {
    /// Create a new strategy context
    pub fn new(
        strategy_id: String,
        exec_engine: Arc<Mutex<dyn ExecutionSimulator>>,
        fundamentals: Arc<dyn FundamentalsProvider>,
        params: StrategyParams,
    ) -> Self {
        Self {
            strategy_id,
            exec_engine,
            fundamentals,
            params,
            current_date: None,
            order_log: Vec::new(),
            metrics_buffer: Vec::new(),
        }
    }

    /// Advance the simulated clock
    pub fn set_date(&mut self, date: NaiveDate) {
        self.current_date = Some(date);
    }

    pub fn current_date(&self) -> Option<NaiveDate> {
        self.current_date
    }

    fn require_date(&self) -> StrategyResult<NaiveDate> {
        self.current_date.ok_or(StrategyError::NotInitialized)
    }

    /// Pass execution settings to the simulator
    pub fn configure_execution(&mut self, config: &ExecutionConfig) -> StrategyResult<()> {
        self.exec_engine.lock().configure(config)
    }

    /// Request that `security` be held at `weight` of portfolio value
    ///
    /// `weight` must be a finite value in `[0, 1]`.
    pub async fn order_target_percent(
        &mut self,
        security: &SecurityId,
        weight: f64,
        price: Option<f64>,
    ) -> StrategyResult<()> {
        if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
            return Err(StrategyError::InvalidParameter(format!(
                "target weight for {} must be in [0, 1], got {}",
                security, weight
            )));
        }

        let request = TargetWeightRequest {
            date: self.require_date()?,
            security: security.clone(),
            weight,
            price,
        };

        {
            let mut exec_engine = self.exec_engine.lock();
            exec_engine.set_target_weight(&request)?;
        }

        self.order_log.push(request);
        Ok(())
    }

    /// Figures for `securities` as of `as_of`
    pub fn fetch_fundamentals(
        &self,
        securities: &MemberSet,
        as_of: NaiveDate,
    ) -> StrategyResult<HashMap<SecurityId, Fundamentals>> {
        self.fundamentals.fetch(securities, as_of)
    }

    /// Current positions and leverage
    pub fn portfolio(&self) -> PortfolioSnapshot {
        self.exec_engine.lock().portfolio()
    }

    /// Record a gauge value for the current date
    pub fn record(&mut self, name: &str, value: f64) -> StrategyResult<()> {
        let date = self.require_date()?;
        self.metrics_buffer.push(StrategyMetric::gauge(
            date,
            self.strategy_id.clone(),
            name.to_string(),
            value,
            HashMap::new(),
        ));
        Ok(())
    }

    /// Record a prepared metric
    pub fn emit_metric(&mut self, metric: StrategyMetric) {
        self.metrics_buffer.push(metric);
    }

    /// Get strategy parameter as typed value
    ///
    /// A key that is set but does not parse as `T` is a `ConfigError`.
    pub fn get_param<T: std::str::FromStr>(&self, key: &str) -> StrategyResult<Option<T>> {
        match self.params.get(key) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                StrategyError::ConfigError(format!("parameter {} has invalid value {:?}", key, raw))
            }),
        }
    }

    /// Instructions issued so far
    pub fn order_log(&self) -> &[TargetWeightRequest] {
        &self.order_log
    }

    /// Recorded metrics
    pub fn get_metrics_buffer(&self) -> &[StrategyMetric] {
        &self.metrics_buffer
    }

    /// Values recorded under `name`, in order
    pub fn series(&self, name: &str) -> Vec<(NaiveDate, f64)> {
        self.metrics_buffer
            .iter()
            .filter(|m| m.metric_name == name)
            .map(|m| (m.date, m.value))
            .collect()
    }

    /// Clear metrics buffer
    pub fn clear_metrics_buffer(&mut self) {
        self.metrics_buffer.clear();
    }

    /// Hand the recorded state to the caller at the end of a run
    pub fn into_parts(self) -> (Vec<TargetWeightRequest>, Vec<StrategyMetric>) {
        (self.order_log, self.metrics_buffer)
    }
}
