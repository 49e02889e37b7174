//! Core types for the rotation strategy

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

pub use crate::{Strategy, StrategyError, StrategyResult};

/// Opaque security identifier
///
/// The strategy never interprets the value; the built-in Dow 30 dataset uses
/// tickers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityId(String);

impl SecurityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for SecurityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SecurityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for SecurityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Set of index members as of some date
pub type MemberSet = BTreeSet<SecurityId>;

/// Index membership change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipAction {
    Add,
    Remove,
}

impl fmt::Display for MembershipAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            MembershipAction::Add => "add",
            MembershipAction::Remove => "remove",
        })
    }
}

/// Valuation figures for one security
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    /// Trailing dividend yield as a fraction (0.035 = 3.5%)
    pub dividend_yield: f64,
    /// Price/earnings ratio, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
}

impl Fundamentals {
    pub fn new(dividend_yield: f64, pe_ratio: Option<f64>) -> Self {
        Self {
            dividend_yield,
            pe_ratio,
        }
    }
}

/// A member selected by dividend yield
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMember {
    pub security: SecurityId,
    pub fundamentals: Fundamentals,
}

/// Daily price bar for one instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Closing price
    pub close: f64,
    /// Shares traded
    #[serde(default)]
    pub volume: f64,
}

/// Instruments tradable on one simulated day, with their prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// Session date
    pub date: NaiveDate,
    /// Bars by instrument
    #[serde(default)]
    pub bars: HashMap<SecurityId, Bar>,
}

impl SessionData {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            bars: HashMap::new(),
        }
    }

    /// Builder-style insert
    pub fn with_bar(mut self, security: impl Into<SecurityId>, close: f64, volume: f64) -> Self {
        self.insert(security, close, volume);
        self
    }

    pub fn insert(&mut self, security: impl Into<SecurityId>, close: f64, volume: f64) {
        self.bars.insert(security.into(), Bar { close, volume });
    }

    pub fn contains(&self, security: &SecurityId) -> bool {
        self.bars.contains_key(security)
    }

    pub fn price(&self, security: &SecurityId) -> Option<f64> {
        self.bars.get(security).map(|b| b.close)
    }

    /// Tradable instruments sorted by identifier
    pub fn instruments(&self) -> Vec<&SecurityId> {
        let mut ids: Vec<&SecurityId> = self.bars.keys().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Target-weight instruction sent to the execution simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetWeightRequest {
    /// Simulated date the instruction was issued
    pub date: NaiveDate,
    /// Instrument
    pub security: SecurityId,
    /// Fraction of portfolio value, in [0, 1]
    pub weight: f64,
    /// Reference price on the issuing day
    pub price: Option<f64>,
}

/// Holding as seen by the execution simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument
    pub security: SecurityId,
    /// Fraction of portfolio value held
    pub weight: f64,
    /// Last known price
    pub last_price: Option<f64>,
}

impl Position {
    pub fn new(security: SecurityId) -> Self {
        Self {
            security,
            weight: 0.0,
            last_price: None,
        }
    }

    /// Check if position is flat (no exposure)
    pub fn is_flat(&self) -> bool {
        self.weight.abs() < 1e-12
    }
}

/// Portfolio state exposed by the execution simulator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Open positions by instrument
    pub positions: HashMap<SecurityId, Position>,
    /// Gross exposure over portfolio value
    pub leverage: f64,
}

impl PortfolioSnapshot {
    pub fn position_count(&self) -> usize {
        self.positions.values().filter(|p| !p.is_flat()).count()
    }
}

/// Strategy metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyMetadata {
    /// Strategy name
    pub name: String,
    /// Strategy version
    pub version: String,
    /// Strategy description
    pub description: String,
    /// Benchmark instrument, if any
    pub benchmark: Option<String>,
}

/// Strategy parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Parameter key-value map
    pub params: HashMap<String, String>,
}

impl StrategyParams {
    /// Create new empty parameters
    pub fn new() -> Self {
        Self {
            params: HashMap::new(),
        }
    }

    /// Get parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|s| s.as_str())
    }

    /// Set parameter value
    pub fn set(&mut self, key: String, value: String) {
        self.params.insert(key, value);
    }
}
