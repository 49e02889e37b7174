//! Execution collaborator
//!
//! Fills, commission and slippage belong to the simulator behind this trait.
//! [`PaperExecution`] only remembers what it was asked to do.

use crate::config::ExecutionConfig;
use crate::error::{StrategyError, StrategyResult};
use crate::types::{PortfolioSnapshot, Position, SecurityId, TargetWeightRequest};
use std::collections::HashMap;

/// Target-weight execution and portfolio state
pub trait ExecutionSimulator: Send {
    /// Apply benchmark, cost and missing-data settings
    fn configure(&mut self, config: &ExecutionConfig) -> StrategyResult<()>;

    /// Move the holding in `request.security` to `request.weight` of portfolio value
    fn set_target_weight(&mut self, request: &TargetWeightRequest) -> StrategyResult<()>;

    /// Current positions and leverage
    fn portfolio(&self) -> PortfolioSnapshot;
}

/// Execution stand-in that treats every target weight as immediately held
///
/// Leverage is the sum of absolute held weights.
#[derive(Debug, Default)]
pub struct PaperExecution {
    config: Option<ExecutionConfig>,
    positions: HashMap<SecurityId, Position>,
    requests: Vec<TargetWeightRequest>,
}

impl PaperExecution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings passed to [`ExecutionSimulator::configure`], if any
    pub fn config(&self) -> Option<&ExecutionConfig> {
        self.config.as_ref()
    }

    /// Every request received, in order
    pub fn requests(&self) -> &[TargetWeightRequest] {
        &self.requests
    }

    pub fn position(&self, security: &SecurityId) -> Option<&Position> {
        self.positions.get(security)
    }
}

impl ExecutionSimulator for PaperExecution {
    fn configure(&mut self, config: &ExecutionConfig) -> StrategyResult<()> {
        tracing::debug!(
            benchmark = config.benchmark.as_deref().unwrap_or("none"),
            commission = ?config.commission,
            slippage = ?config.slippage,
            "Paper execution configured"
        );
        self.config = Some(config.clone());
        Ok(())
    }

    fn set_target_weight(&mut self, request: &TargetWeightRequest) -> StrategyResult<()> {
        if !request.weight.is_finite() {
            return Err(StrategyError::ExecutionError(format!(
                "non-finite target weight for {}",
                request.security
            )));
        }

        self.requests.push(request.clone());

        if request.weight.abs() < 1e-12 {
            self.positions.remove(&request.security);
            return Ok(());
        }

        let position = self
            .positions
            .entry(request.security.clone())
            .or_insert_with(|| Position::new(request.security.clone()));
        position.weight = request.weight;
        if request.price.is_some() {
            position.last_price = request.price;
        }
        Ok(())
    }

    fn portfolio(&self) -> PortfolioSnapshot {
        let leverage = self.positions.values().map(|p| p.weight.abs()).sum();
        PortfolioSnapshot {
            positions: self.positions.clone(),
            leverage,
        }
    }
}
