//! Backtesting engine implementation

use crate::execution::ExecutionSimulator;
use crate::fundamentals::FundamentalsProvider;
use crate::metrics::{metric_names, StrategyMetric};
use crate::types::{Position, SessionData, TargetWeightRequest};
use crate::{Strategy, StrategyContext, StrategyError, StrategyParams, StrategyResult};
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Backtesting result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Strategy name from metadata
    pub strategy: String,

    /// First simulated day
    pub start: NaiveDate,

    /// Last simulated day
    pub end: NaiveDate,

    /// Number of simulated days
    pub trading_days: usize,

    /// Days on which the strategy rebalanced
    pub rebalance_dates: Vec<NaiveDate>,

    /// Every target-weight request, in order
    pub orders: Vec<TargetWeightRequest>,

    /// Highest leverage recorded by the strategy
    pub max_leverage: f64,

    /// Leverage after the last day
    pub final_leverage: f64,

    /// Open positions after the last day, by instrument
    pub final_positions: Vec<Position>,

    /// Recorded series
    pub metrics: Vec<StrategyMetric>,
}

impl BacktestResult {
    /// Values recorded under `name`, in order
    pub fn series(&self, name: &str) -> Vec<(NaiveDate, f64)> {
        self.metrics
            .iter()
            .filter(|m| m.metric_name == name)
            .map(|m| (m.date, m.value))
            .collect()
    }
}

/// Day-by-day replay clock
///
/// Drives one strategy through a chronological list of sessions. Any hook
/// error stops the run and is returned as is.
pub struct BacktestEngine {
    strategy_id: String,
    exec_engine: Arc<Mutex<dyn ExecutionSimulator>>,
    fundamentals: Arc<dyn FundamentalsProvider>,
}

impl BacktestEngine {
    /// Create a new backtest engine
    pub fn new(
        exec_engine: Arc<Mutex<dyn ExecutionSimulator>>,
        fundamentals: Arc<dyn FundamentalsProvider>,
    ) -> Self {
        Self {
            strategy_id: "backtest_strategy".to_string(),
            exec_engine,
            fundamentals,
        }
    }

    /// Identifier given to the strategy context
    pub fn with_strategy_id(mut self, strategy_id: impl Into<String>) -> Self {
        self.strategy_id = strategy_id.into();
        self
    }

    /// Run backtest for a strategy
    ///
    /// # Arguments
    /// * `strategy` - Strategy to backtest
    /// * `sessions` - Trading days, strictly increasing by date
    /// * `params` - Strategy parameters
    pub async fn run_backtest(
        &mut self,
        mut strategy: Box<dyn Strategy>,
        sessions: Vec<SessionData>,
        params: StrategyParams,
    ) -> StrategyResult<BacktestResult> {
        let (start, end) = match (sessions.first(), sessions.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => {
                return Err(StrategyError::InsufficientData(
                    "No trading sessions provided".to_string(),
                ))
            }
        };

        if let Some(pair) = sessions.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(StrategyError::BacktestError(format!(
                "sessions out of order: {} follows {}",
                pair[1].date, pair[0].date
            )));
        }

        let metadata = strategy.metadata();
        tracing::info!(
            strategy = %metadata.name,
            %start,
            %end,
            days = sessions.len(),
            "Starting backtest"
        );

        let mut ctx = StrategyContext::new(
            self.strategy_id.clone(),
            self.exec_engine.clone(),
            self.fundamentals.clone(),
            params,
        );

        ctx.set_date(start);
        strategy.initialize(&mut ctx).await?;

        for session in &sessions {
            ctx.set_date(session.date);
            strategy.before_trading_start(session.date, &mut ctx).await?;
            strategy.on_session(session, &mut ctx).await?;
            strategy.handle_data(session, &mut ctx).await?;
        }

        strategy.shutdown(&mut ctx).await?;

        let portfolio = ctx.portfolio();
        let mut final_positions: Vec<Position> = portfolio
            .positions
            .into_values()
            .filter(|p| !p.is_flat())
            .collect();
        final_positions.sort_by(|a, b| a.security.cmp(&b.security));
        let (orders, metrics) = ctx.into_parts();

        let rebalance_dates: Vec<NaiveDate> = metrics
            .iter()
            .filter(|m| m.metric_name == metric_names::REBALANCES)
            .map(|m| m.date)
            .collect();

        let max_leverage = metrics
            .iter()
            .filter(|m| m.metric_name == metric_names::MAX_LEVERAGE)
            .map(|m| m.value)
            .fold(0.0, f64::max);

        tracing::info!(
            rebalances = rebalance_dates.len(),
            orders = orders.len(),
            max_leverage,
            "Backtest complete"
        );

        Ok(BacktestResult {
            strategy: metadata.name,
            start,
            end,
            trading_days: sessions.len(),
            rebalance_dates,
            orders,
            max_leverage,
            final_leverage: portfolio.leverage,
            final_positions,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::PaperExecution;
    use crate::fundamentals::StaticFundamentals;
    use crate::types::SecurityId;
    use crate::StrategyMetadata;
    use async_trait::async_trait;

    /// Buys one instrument on the first session and counts hook calls
    #[derive(Default)]
    struct CountingStrategy {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Strategy for CountingStrategy {
        async fn initialize(&mut self, _ctx: &mut StrategyContext) -> StrategyResult<()> {
            self.calls.lock().push("initialize".to_string());
            Ok(())
        }

        async fn before_trading_start(
            &mut self,
            date: NaiveDate,
            _ctx: &mut StrategyContext,
        ) -> StrategyResult<()> {
            self.calls.lock().push(format!("pre {}", date));
            Ok(())
        }

        async fn on_session(
            &mut self,
            session: &SessionData,
            ctx: &mut StrategyContext,
        ) -> StrategyResult<()> {
            self.calls.lock().push(format!("session {}", session.date));
            if ctx.order_log().is_empty() {
                let a = SecurityId::from("A");
                ctx.order_target_percent(&a, 0.5, session.price(&a)).await?;
            }
            Ok(())
        }

        async fn handle_data(
            &mut self,
            session: &SessionData,
            _ctx: &mut StrategyContext,
        ) -> StrategyResult<()> {
            self.calls.lock().push(format!("data {}", session.date));
            Ok(())
        }

        async fn shutdown(&mut self, _ctx: &mut StrategyContext) -> StrategyResult<()> {
            self.calls.lock().push("shutdown".to_string());
            Ok(())
        }

        fn metadata(&self) -> StrategyMetadata {
            StrategyMetadata {
                name: "Counting".to_string(),
                version: "1.0.0".to_string(),
                description: "Test".to_string(),
                benchmark: None,
            }
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn engine() -> BacktestEngine {
        BacktestEngine::new(
            Arc::new(Mutex::new(PaperExecution::new())),
            Arc::new(StaticFundamentals::new()),
        )
    }

    #[tokio::test]
    async fn test_hooks_called_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let strategy = CountingStrategy {
            calls: calls.clone(),
        };
        let sessions = vec![
            SessionData::new(date(2000, 1, 3)).with_bar("A", 10.0, 100.0),
            SessionData::new(date(2000, 1, 4)).with_bar("A", 11.0, 100.0),
        ];

        let result = engine()
            .run_backtest(Box::new(strategy), sessions, StrategyParams::new())
            .await
            .unwrap();

        assert_eq!(
            *calls.lock(),
            vec![
                "initialize",
                "pre 2000-01-03",
                "session 2000-01-03",
                "data 2000-01-03",
                "pre 2000-01-04",
                "session 2000-01-04",
                "data 2000-01-04",
                "shutdown",
            ]
        );
        assert_eq!(result.trading_days, 2);
        assert_eq!(result.orders.len(), 1);
        assert_eq!(result.final_positions.len(), 1);
        assert_eq!(result.final_leverage, 0.5);
        assert_eq!(result.strategy, "Counting");
    }

    #[tokio::test]
    async fn test_empty_sessions_rejected() {
        let result = engine()
            .run_backtest(Box::new(CountingStrategy::default()), vec![], StrategyParams::new())
            .await;
        assert!(matches!(result, Err(StrategyError::InsufficientData(_))));
    }

    #[tokio::test]
    async fn test_out_of_order_sessions_rejected() {
        let sessions = vec![
            SessionData::new(date(2000, 1, 4)),
            SessionData::new(date(2000, 1, 3)),
        ];
        let result = engine()
            .run_backtest(Box::new(CountingStrategy::default()), sessions, StrategyParams::new())
            .await;
        assert!(matches!(result, Err(StrategyError::BacktestError(_))));
    }
}
