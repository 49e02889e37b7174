//! Yearly dividend-yield rotation across current index members
//!
//! Once per calendar year the strategy takes the index members as of the
//! day, keeps the `top_n` highest dividend yields, and targets an equal
//! weight in each of them and zero in every other tradable instrument.

use crate::config::RotationConfig;
use crate::fundamentals::rank_by_dividend_yield;
use crate::membership::MembershipTimeline;
use crate::metrics::{metric_names, MetricBuilder};
use crate::types::{RankedMember, SecurityId, SessionData, TargetWeightRequest};
use crate::{Strategy, StrategyContext, StrategyError, StrategyMetadata, StrategyResult};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Where the strategy is within a rebalance cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalancePhase {
    #[default]
    Idle,
    /// Selection made pre-market; orders go out in the next session
    PendingRebalance,
}

/// Non-fatal condition met while rebalancing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceWarning {
    /// Selected member has no tradable data on the rebalance day; not ordered
    MissingData { security: SecurityId },
    /// Current member has no dividend yield figure; excluded from ranking
    MissingFundamentals { security: SecurityId },
}

/// Outcome of one rebalance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceReport {
    /// Session the orders were issued in
    pub date: NaiveDate,
    /// Ranked selection, highest yield first
    pub selected: Vec<RankedMember>,
    /// One instruction per tradable instrument
    pub orders: Vec<TargetWeightRequest>,
    /// Skipped members
    pub warnings: Vec<RebalanceWarning>,
}

impl RebalanceReport {
    /// Instructions with a non-zero target
    pub fn held(&self) -> impl Iterator<Item = &TargetWeightRequest> {
        self.orders.iter().filter(|o| o.weight > 0.0)
    }
}

/// Per-run driver state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RotationState {
    /// Year that triggers the next rebalance; `None` before the first day
    pub next_trigger_year: Option<i32>,
    /// Current phase
    pub phase: RebalancePhase,
    /// Selection made by the last trigger
    pub selection: Vec<RankedMember>,
    /// Warnings raised during selection, reported with the next rebalance
    pub pending_warnings: Vec<RebalanceWarning>,
    /// Highest leverage recorded
    pub max_leverage: f64,
    /// Completed rebalances
    pub rebalances: usize,
    /// Report for the most recent rebalance
    pub last_report: Option<RebalanceReport>,
}

/// Dow 30 "dogs"-style dividend rotation
pub struct DividendYieldRotation {
    config: RotationConfig,
    timeline: Arc<MembershipTimeline>,
    state: RotationState,
    metric_builder: Option<MetricBuilder>,
}

impl DividendYieldRotation {
    pub fn new(config: RotationConfig, timeline: Arc<MembershipTimeline>) -> StrategyResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            timeline,
            state: RotationState::default(),
            metric_builder: None,
        })
    }

    /// Build the strategy with the timeline named in `config`
    pub fn from_config(config: RotationConfig) -> StrategyResult<Self> {
        let timeline = Arc::new(config.load_timeline()?);
        Self::new(config, timeline)
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    pub fn state(&self) -> &RotationState {
        &self.state
    }

    pub fn timeline(&self) -> &MembershipTimeline {
        &self.timeline
    }

    pub fn last_report(&self) -> Option<&RebalanceReport> {
        self.state.last_report.as_ref()
    }

    /// First simulated day, or the first day of the year after the last trigger
    ///
    /// A calendar year with no sessions at all ends the cycle: the trigger
    /// year is never reached again.
    pub fn should_trigger(&self, date: NaiveDate) -> bool {
        match self.state.next_trigger_year {
            None => true,
            Some(year) => year == date.year(),
        }
    }

    fn builder(&self) -> StrategyResult<MetricBuilder> {
        self.metric_builder.clone().ok_or(StrategyError::NotInitialized)
    }

    /// Rank current members by dividend yield and keep the top `top_n`
    fn select(&mut self, date: NaiveDate, ctx: &mut StrategyContext) -> StrategyResult<()> {
        let builder = self.builder()?;
        let members = self.timeline.members_as_of(date)?;
        let rows = ctx.fetch_fundamentals(&members, date)?;

        let mut warnings = Vec::new();
        for security in &members {
            let has_yield = rows
                .get(security)
                .map_or(false, |f| f.dividend_yield.is_finite());
            if !has_yield {
                tracing::warn!(%date, %security, "No dividend yield for index member, excluding");
                ctx.emit_metric(builder.missing(date, metric_names::MISSING_FUNDAMENTALS, security.as_str()));
                warnings.push(RebalanceWarning::MissingFundamentals {
                    security: security.clone(),
                });
            }
        }

        let selection = rank_by_dividend_yield(rows, self.config.top_n);
        for ranked in &selection {
            ctx.emit_metric(builder.selected_yield(
                date,
                ranked.security.as_str(),
                ranked.fundamentals.dividend_yield,
            ));
        }

        tracing::info!(
            %date,
            members = members.len(),
            selected = selection.len(),
            "Selected highest dividend yielders"
        );

        self.state.selection = selection;
        self.state.pending_warnings = warnings;
        Ok(())
    }
}

#[async_trait]
impl Strategy for DividendYieldRotation {
    async fn initialize(&mut self, ctx: &mut StrategyContext) -> StrategyResult<()> {
        if let Some(top_n) = ctx.get_param::<usize>("top_n")? {
            self.config.top_n = top_n;
        }
        if let Some(target_weight) = ctx.get_param::<f64>("target_weight")? {
            self.config.target_weight = target_weight;
        }
        self.config.validate()?;

        self.metric_builder = Some(MetricBuilder::new(ctx.strategy_id.clone()));
        ctx.configure_execution(&self.config.execution)?;

        tracing::info!(
            strategy_id = %ctx.strategy_id,
            top_n = self.config.top_n,
            target_weight = self.config.target_weight,
            membership_events = self.timeline.len(),
            first_event = %self.timeline.first_date(),
            "Dividend yield rotation initialized"
        );

        Ok(())
    }

    async fn before_trading_start(
        &mut self,
        date: NaiveDate,
        ctx: &mut StrategyContext,
    ) -> StrategyResult<()> {
        if !self.should_trigger(date) {
            return Ok(());
        }

        tracing::debug!(%date, next_trigger_year = ?self.state.next_trigger_year, "Yearly rebalance triggered");
        self.state.phase = RebalancePhase::PendingRebalance;
        self.state.next_trigger_year = Some(date.year() + 1);

        self.select(date, ctx)
    }

    async fn on_session(
        &mut self,
        session: &SessionData,
        ctx: &mut StrategyContext,
    ) -> StrategyResult<()> {
        if self.state.phase != RebalancePhase::PendingRebalance {
            return Ok(());
        }

        let date = session.date;
        let builder = self.builder()?;
        tracing::info!(%date, instruments = session.len(), "Rebalancing");
        self.state.phase = RebalancePhase::Idle;

        let members = self.timeline.members_as_of(date)?;
        let mut warnings = std::mem::take(&mut self.state.pending_warnings);

        for ranked in &self.state.selection {
            if !session.contains(&ranked.security) {
                tracing::warn!(%date, security = %ranked.security, "No trade data available for selected member");
                ctx.emit_metric(builder.missing(date, metric_names::MISSING_TRADE_DATA, ranked.security.as_str()));
                warnings.push(RebalanceWarning::MissingData {
                    security: ranked.security.clone(),
                });
            }
        }

        let selected: HashMap<&SecurityId, &RankedMember> = self
            .state
            .selection
            .iter()
            .filter(|r| members.contains(&r.security))
            .map(|r| (&r.security, r))
            .collect();

        let first_order = ctx.order_log().len();
        for security in session.instruments() {
            let price = session.price(security);
            match selected.get(security) {
                Some(ranked) => {
                    tracing::info!(
                        %security,
                        price = price.unwrap_or_default(),
                        dividend_yield_pct = 100.0 * ranked.fundamentals.dividend_yield,
                        "Ordering"
                    );
                    ctx.order_target_percent(security, self.config.target_weight, price)
                        .await?;
                    ctx.emit_metric(builder.order_placed(date, security.as_str(), self.config.target_weight));
                }
                None => {
                    ctx.order_target_percent(security, 0.0, price).await?;
                }
            }
        }

        let orders = ctx.order_log()[first_order..].to_vec();
        ctx.emit_metric(builder.rebalance(date, selected.len()));

        self.state.rebalances += 1;
        self.state.last_report = Some(RebalanceReport {
            date,
            selected: self.state.selection.clone(),
            orders,
            warnings,
        });
        Ok(())
    }

    async fn handle_data(
        &mut self,
        _session: &SessionData,
        ctx: &mut StrategyContext,
    ) -> StrategyResult<()> {
        let snapshot = ctx.portfolio();
        ctx.record(metric_names::POSITIONS, snapshot.position_count() as f64)?;
        ctx.record(metric_names::LEVERAGE, snapshot.leverage)?;

        if snapshot.leverage > self.state.max_leverage {
            self.state.max_leverage = snapshot.leverage;
            ctx.record(metric_names::MAX_LEVERAGE, self.state.max_leverage)?;
        }
        Ok(())
    }

    async fn shutdown(&mut self, ctx: &mut StrategyContext) -> StrategyResult<()> {
        tracing::info!(
            strategy_id = %ctx.strategy_id,
            rebalances = self.state.rebalances,
            max_leverage = self.state.max_leverage,
            "Dividend yield rotation stopped"
        );
        Ok(())
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            name: "DowDividendYieldRotation".to_string(),
            version: "1.0.0".to_string(),
            description: format!(
                "Hold the {} highest dividend yielders among current index members at {:.0}% each, rebalanced yearly",
                self.config.top_n,
                self.config.target_weight * 100.0
            ),
            benchmark: self.config.execution.benchmark.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::PaperExecution;
    use crate::fundamentals::StaticFundamentals;
    use crate::membership::MembershipEvent;
    use crate::types::{Fundamentals, MembershipAction};
    use crate::StrategyParams;
    use approx::assert_relative_eq;
    use parking_lot::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn timeline(ids: &[&str]) -> Arc<MembershipTimeline> {
        let events = ids
            .iter()
            .map(|id| MembershipEvent::new(date(1999, 11, 1), *id, MembershipAction::Add))
            .collect();
        Arc::new(MembershipTimeline::new(events).unwrap())
    }

    fn context(fundamentals: StaticFundamentals) -> (StrategyContext, Arc<Mutex<PaperExecution>>) {
        let exec = Arc::new(Mutex::new(PaperExecution::new()));
        let ctx = StrategyContext::new(
            "rotation_test".to_string(),
            exec.clone(),
            Arc::new(fundamentals),
            StrategyParams::new(),
        );
        (ctx, exec)
    }

    fn small_config(top_n: usize, target_weight: f64) -> RotationConfig {
        RotationConfig {
            top_n,
            target_weight,
            ..RotationConfig::default()
        }
    }

    #[test]
    fn test_trigger_rule() {
        let mut strategy =
            DividendYieldRotation::new(RotationConfig::default(), timeline(&["A"])).unwrap();

        assert!(strategy.should_trigger(date(2000, 6, 15)));
        strategy.state.next_trigger_year = Some(2001);
        assert!(!strategy.should_trigger(date(2000, 12, 29)));
        assert!(strategy.should_trigger(date(2001, 1, 2)));
        assert!(!strategy.should_trigger(date(2002, 1, 2)));
    }

    #[tokio::test]
    async fn test_hooks_require_initialize() {
        let mut strategy =
            DividendYieldRotation::new(RotationConfig::default(), timeline(&["A"])).unwrap();
        let (mut ctx, _) = context(StaticFundamentals::new());
        ctx.set_date(date(2000, 1, 3));

        let result = strategy.before_trading_start(date(2000, 1, 3), &mut ctx).await;
        assert!(matches!(result, Err(StrategyError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_selection_excludes_missing_fundamentals() {
        let mut fundamentals = StaticFundamentals::new();
        fundamentals.set(date(2000, 1, 3), "A", Fundamentals::new(0.01, None));
        fundamentals.set(date(2000, 1, 3), "B", Fundamentals::new(0.04, None));

        let mut strategy =
            DividendYieldRotation::new(small_config(2, 0.5), timeline(&["A", "B", "C"])).unwrap();
        let (mut ctx, _) = context(fundamentals);
        ctx.set_date(date(2000, 1, 3));

        strategy.initialize(&mut ctx).await.unwrap();
        strategy.before_trading_start(date(2000, 1, 3), &mut ctx).await.unwrap();

        let ids: Vec<&str> = strategy.state().selection.iter().map(|r| r.security.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(strategy.state().phase, RebalancePhase::PendingRebalance);
        assert_eq!(
            strategy.state().pending_warnings,
            vec![RebalanceWarning::MissingFundamentals {
                security: SecurityId::from("C")
            }]
        );
    }

    #[tokio::test]
    async fn test_rebalance_orders_every_instrument_once() {
        let mut fundamentals = StaticFundamentals::new();
        fundamentals.set(date(2000, 1, 3), "A", Fundamentals::new(0.05, None));
        fundamentals.set(date(2000, 1, 3), "B", Fundamentals::new(0.04, None));
        fundamentals.set(date(2000, 1, 3), "C", Fundamentals::new(0.01, None));

        let mut strategy =
            DividendYieldRotation::new(small_config(2, 0.5), timeline(&["A", "B", "C"])).unwrap();
        let (mut ctx, exec) = context(fundamentals);
        let day = date(2000, 1, 3);
        ctx.set_date(day);

        strategy.initialize(&mut ctx).await.unwrap();
        strategy.before_trading_start(day, &mut ctx).await.unwrap();

        // B has no data today; X is tradable but not a member
        let session = SessionData::new(day)
            .with_bar("A", 10.0, 1000.0)
            .with_bar("C", 20.0, 1000.0)
            .with_bar("X", 30.0, 1000.0);
        strategy.on_session(&session, &mut ctx).await.unwrap();

        let report = strategy.last_report().unwrap();
        assert_eq!(report.orders.len(), 3);
        let weights: Vec<(&str, f64)> = report
            .orders
            .iter()
            .map(|o| (o.security.as_str(), o.weight))
            .collect();
        assert_eq!(weights, vec![("A", 0.5), ("C", 0.0), ("X", 0.0)]);
        assert_eq!(
            report.warnings,
            vec![RebalanceWarning::MissingData {
                security: SecurityId::from("B")
            }]
        );
        assert_eq!(strategy.state().phase, RebalancePhase::Idle);
        assert_eq!(exec.lock().requests().len(), 3);

        // Nothing more until the next trigger
        strategy.on_session(&session, &mut ctx).await.unwrap();
        assert_eq!(exec.lock().requests().len(), 3);
    }

    #[tokio::test]
    async fn test_handle_data_tracks_max_leverage() {
        let mut strategy =
            DividendYieldRotation::new(RotationConfig::default(), timeline(&["A"])).unwrap();
        let (mut ctx, exec) = context(StaticFundamentals::new());
        let session = SessionData::new(date(2000, 1, 3));
        ctx.set_date(session.date);
        strategy.initialize(&mut ctx).await.unwrap();

        strategy.handle_data(&session, &mut ctx).await.unwrap();
        assert!(ctx.series(metric_names::MAX_LEVERAGE).is_empty());

        ctx.order_target_percent(&SecurityId::from("A"), 0.3, None).await.unwrap();
        strategy.handle_data(&session, &mut ctx).await.unwrap();
        ctx.order_target_percent(&SecurityId::from("A"), 0.1, None).await.unwrap();
        strategy.handle_data(&session, &mut ctx).await.unwrap();

        assert_relative_eq!(strategy.state().max_leverage, 0.3);
        assert_eq!(ctx.series(metric_names::MAX_LEVERAGE).len(), 1);
        assert_eq!(ctx.series(metric_names::LEVERAGE).len(), 3);
        assert_eq!(ctx.series(metric_names::POSITIONS).last().map(|p| p.1), Some(1.0));
        assert!(exec.lock().config().is_some());
    }

    #[tokio::test]
    async fn test_params_override_config() {
        let mut strategy =
            DividendYieldRotation::new(RotationConfig::default(), timeline(&["A"])).unwrap();
        let (mut ctx, _) = context(StaticFundamentals::new());
        ctx.params.set("top_n".to_string(), "4".to_string());
        ctx.params.set("target_weight".to_string(), "0.25".to_string());

        strategy.initialize(&mut ctx).await.unwrap();
        assert_eq!(strategy.config().top_n, 4);
        assert_relative_eq!(strategy.config().target_weight, 0.25);
        assert!(strategy.metadata().description.contains("4 highest"));
    }

    #[tokio::test]
    async fn test_params_that_lever_the_book_rejected() {
        let mut strategy =
            DividendYieldRotation::new(RotationConfig::default(), timeline(&["A"])).unwrap();
        let (mut ctx, exec) = context(StaticFundamentals::new());
        ctx.params.set("top_n".to_string(), "20".to_string());

        let result = strategy.initialize(&mut ctx).await;
        assert!(matches!(result, Err(StrategyError::ConfigError(_))));
        assert!(exec.lock().config().is_none());
    }

    #[test]
    fn test_metadata() {
        let strategy =
            DividendYieldRotation::new(RotationConfig::default(), timeline(&["A"])).unwrap();
        let metadata = strategy.metadata();
        assert_eq!(metadata.name, "DowDividendYieldRotation");
        assert_eq!(metadata.benchmark.as_deref(), Some("DIA"));
        assert!(metadata.description.contains("10 highest"));
    }
}
