//! # ag-dow-yield: Dow 30 Dividend-Yield Rotation
//!
//! A buy-and-hold rotation strategy for backtesting against the historical Dow
//! Jones Industrial Average universe: once a year it holds the ten highest
//! dividend yielders among the index members of that day, at equal weight.
//!
//! ## Core Components
//!
//! - **MembershipTimeline**: point-in-time index membership replayed from a dated add/remove log
//! - **DividendYieldRotation**: yearly selection and target-weight rebalancing
//! - **StrategyContext**: per-run handle to execution, fundamentals and recorded series
//! - **BacktestEngine**: day-by-day replay clock driving the strategy hooks
//!
//! Order execution, costs and fundamentals data live behind the
//! [`ExecutionSimulator`] and [`FundamentalsProvider`] traits.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ag_dow_yield::{
//!     BacktestEngine, DividendYieldRotation, PaperExecution, RotationConfig,
//!     SessionData, StaticFundamentals, StrategyParams,
//! };
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! # async fn run(sessions: Vec<SessionData>, fundamentals: StaticFundamentals) -> Result<(), ag_dow_yield::StrategyError> {
//! let strategy = DividendYieldRotation::from_config(RotationConfig::default())?;
//! let exec = Arc::new(Mutex::new(PaperExecution::new()));
//! let mut engine = BacktestEngine::new(exec, Arc::new(fundamentals));
//!
//! let result = engine
//!     .run_backtest(Box::new(strategy), sessions, StrategyParams::new())
//!     .await?;
//! println!("rebalanced on {:?}", result.rebalance_dates);
//! # Ok(())
//! # }
//! ```

pub mod backtest;
pub mod config;
pub mod context;
pub mod error;
pub mod execution;
pub mod fundamentals;
pub mod membership;
pub mod metrics;
pub mod rotation;
pub mod types;

// Re-export main types
pub use backtest::{BacktestEngine, BacktestResult};
pub use config::{CommissionModel, ExecutionConfig, MembershipSource, NoDataPolicy, RotationConfig, SlippageModel};
pub use context::StrategyContext;
pub use error::{StrategyError, StrategyResult};
pub use execution::{ExecutionSimulator, PaperExecution};
pub use fundamentals::{FundamentalsProvider, StaticFundamentals};
pub use membership::{MembershipEvent, MembershipTimeline};
pub use metrics::{MetricType, StrategyMetric};
pub use rotation::{DividendYieldRotation, RebalancePhase, RebalanceReport, RebalanceWarning, RotationState};
pub use types::{
    Bar, Fundamentals, MemberSet, MembershipAction, PortfolioSnapshot, Position, RankedMember,
    SecurityId, SessionData, StrategyMetadata, StrategyParams, TargetWeightRequest,
};

use async_trait::async_trait;
use chrono::NaiveDate;

/// Hooks a simulation clock calls on a strategy
///
/// For every simulated trading day, in date order, the clock calls
/// `before_trading_start`, then `on_session`, then `handle_data`. Calls are
/// never concurrent.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Initialize the strategy
    ///
    /// Called once before the first simulated day.
    async fn initialize(&mut self, ctx: &mut StrategyContext) -> StrategyResult<()>;

    /// Pre-market step
    ///
    /// Called before the session opens, with no price data.
    async fn before_trading_start(
        &mut self,
        date: NaiveDate,
        ctx: &mut StrategyContext,
    ) -> StrategyResult<()>;

    /// Main session step
    ///
    /// `session` lists every instrument tradable today with its price.
    async fn on_session(
        &mut self,
        session: &SessionData,
        ctx: &mut StrategyContext,
    ) -> StrategyResult<()>;

    /// End-of-step bookkeeping, called every day
    async fn handle_data(
        &mut self,
        session: &SessionData,
        ctx: &mut StrategyContext,
    ) -> StrategyResult<()>;

    /// Shutdown the strategy
    async fn shutdown(&mut self, ctx: &mut StrategyContext) -> StrategyResult<()>;

    /// Get strategy metadata
    fn metadata(&self) -> StrategyMetadata;
}
