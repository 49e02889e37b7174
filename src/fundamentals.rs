//! Fundamentals collaborator and dividend-yield ranking

use crate::error::StrategyResult;
use crate::types::{Fundamentals, MemberSet, RankedMember, SecurityId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Source of valuation figures
///
/// Implementations return data only for the securities they have figures
/// for; a missing key is not an error.
pub trait FundamentalsProvider: Send + Sync {
    /// Figures for `securities` as known on `as_of`
    fn fetch(
        &self,
        securities: &MemberSet,
        as_of: NaiveDate,
    ) -> StrategyResult<HashMap<SecurityId, Fundamentals>>;

    /// The `limit` highest dividend yields among `securities`, descending
    fn top_by_dividend_yield(
        &self,
        securities: &MemberSet,
        as_of: NaiveDate,
        limit: usize,
    ) -> StrategyResult<Vec<RankedMember>> {
        let rows = self.fetch(securities, as_of)?;
        Ok(rank_by_dividend_yield(rows, limit))
    }
}

/// Sort rows by dividend yield descending and keep the first `limit`
///
/// Ties are broken by identifier so the ranking is deterministic. Rows with
/// a non-finite yield are dropped.
pub fn rank_by_dividend_yield(
    rows: HashMap<SecurityId, Fundamentals>,
    limit: usize,
) -> Vec<RankedMember> {
    let mut ranked: Vec<RankedMember> = rows
        .into_iter()
        .filter(|(_, f)| f.dividend_yield.is_finite())
        .map(|(security, fundamentals)| RankedMember {
            security,
            fundamentals,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.fundamentals
            .dividend_yield
            .partial_cmp(&a.fundamentals.dividend_yield)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.security.cmp(&b.security))
    });
    ranked.truncate(limit);
    ranked
}

/// One dated set of figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalsSnapshot {
    /// First date the figures are known
    pub as_of: NaiveDate,
    /// Figures by security
    pub rows: HashMap<SecurityId, Fundamentals>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FundamentalsFile {
    snapshots: Vec<FundamentalsSnapshot>,
}

/// In-memory, point-in-time fundamentals
///
/// A query on date `d` sees the latest snapshot dated on or before `d`.
#[derive(Debug, Clone, Default)]
pub struct StaticFundamentals {
    snapshots: BTreeMap<NaiveDate, HashMap<SecurityId, Fundamentals>>,
}

impl StaticFundamentals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the snapshot for `as_of`
    pub fn insert_snapshot(&mut self, as_of: NaiveDate, rows: HashMap<SecurityId, Fundamentals>) {
        self.snapshots.insert(as_of, rows);
    }

    /// Set a single row, creating the snapshot if needed
    pub fn set(&mut self, as_of: NaiveDate, security: impl Into<SecurityId>, fundamentals: Fundamentals) {
        self.snapshots
            .entry(as_of)
            .or_default()
            .insert(security.into(), fundamentals);
    }

    /// Load snapshots from YAML
    ///
    /// ```yaml
    /// snapshots:
    ///   - as_of: 2000-01-03
    ///     rows:
    ///       MMM: { dividend_yield: 0.024, pe_ratio: 22.1 }
    /// ```
    pub fn from_yaml(yaml: &str) -> StrategyResult<Self> {
        let file: FundamentalsFile = serde_yaml::from_str(yaml)?;
        Ok(Self::from_snapshots(file.snapshots))
    }

    pub fn from_file(path: impl AsRef<Path>) -> StrategyResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_snapshots(snapshots: Vec<FundamentalsSnapshot>) -> Self {
        let mut fundamentals = Self::new();
        for snapshot in snapshots {
            fundamentals.insert_snapshot(snapshot.as_of, snapshot.rows);
        }
        fundamentals
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    fn snapshot_for(&self, as_of: NaiveDate) -> Option<&HashMap<SecurityId, Fundamentals>> {
        self.snapshots.range(..=as_of).next_back().map(|(_, rows)| rows)
    }
}

impl FundamentalsProvider for StaticFundamentals {
    fn fetch(
        &self,
        securities: &MemberSet,
        as_of: NaiveDate,
    ) -> StrategyResult<HashMap<SecurityId, Fundamentals>> {
        let Some(rows) = self.snapshot_for(as_of) else {
            return Ok(HashMap::new());
        };

        let mut out = HashMap::with_capacity(securities.len());
        for security in securities {
            if let Some(f) = rows.get(security) {
                if f.dividend_yield.is_nan() {
                    tracing::warn!(%as_of, %security, "NaN dividend yield in snapshot, treating as missing");
                    continue;
                }
                out.insert(security.clone(), *f);
            }
        }
        Ok(out)
    }
}
