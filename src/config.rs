//! Strategy configuration
//!
//! Loaded from YAML, in the same shape as `config/strategy.yaml`.

use crate::error::{StrategyError, StrategyResult};
use crate::membership::{dow30_timeline, MembershipTimeline, RawMembershipEvent};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete rotation strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Number of highest-yielding members to hold
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Target weight per selected member, as a fraction of portfolio value
    #[serde(default = "default_target_weight")]
    pub target_weight: f64,

    /// Where the membership history comes from
    #[serde(default)]
    pub membership: MembershipSource,

    /// Settings handed to the execution simulator at initialization
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            target_weight: default_target_weight(),
            membership: MembershipSource::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl RotationConfig {
    /// Parse and validate a YAML config
    pub fn from_yaml(yaml: &str) -> StrategyResult<Self> {
        let config: RotationConfig = serde_yaml::from_str(yaml)
            .map_err(|e| StrategyError::ConfigError(format!("Failed to parse config YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML config file
    ///
    /// Relative membership file paths are resolved against the config
    /// file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> StrategyResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        if let MembershipSource::File { path: dataset } = &mut config.membership {
            if dataset.is_relative() {
                if let Some(dir) = path.parent() {
                    *dataset = dir.join(&*dataset);
                }
            }
        }
        Ok(config)
    }

    /// Reject selections that cannot be held without leverage
    pub fn validate(&self) -> StrategyResult<()> {
        if self.top_n == 0 {
            return Err(StrategyError::ConfigError("top_n must be at least 1".to_string()));
        }
        if !(self.target_weight > 0.0 && self.target_weight <= 1.0) {
            return Err(StrategyError::ConfigError(format!(
                "target_weight must be in (0, 1], got {}",
                self.target_weight
            )));
        }
        let gross = self.top_n as f64 * self.target_weight;
        if gross > 1.0 + 1e-9 {
            return Err(StrategyError::ConfigError(format!(
                "top_n * target_weight = {:.4} exceeds full investment",
                gross
            )));
        }
        Ok(())
    }

    /// Build the membership timeline this config points at
    pub fn load_timeline(&self) -> StrategyResult<MembershipTimeline> {
        self.membership.load()
    }
}

/// Membership dataset location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum MembershipSource {
    /// Compiled-in Dow 30 history
    #[default]
    Builtin,

    /// YAML or JSON dataset file
    File {
        path: PathBuf,
    },

    /// Events listed in the config itself
    Inline {
        events: Vec<RawMembershipEvent>,
    },
}

impl MembershipSource {
    pub fn load(&self) -> StrategyResult<MembershipTimeline> {
        match self {
            MembershipSource::Builtin => dow30_timeline(),
            MembershipSource::File { path } => MembershipTimeline::from_file(path),
            MembershipSource::Inline { events } => MembershipTimeline::from_raw(events.clone()),
        }
    }
}

/// Settings passed through to the execution simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Benchmark instrument
    #[serde(default = "default_benchmark")]
    pub benchmark: Option<String>,

    /// Commission model
    #[serde(default)]
    pub commission: CommissionModel,

    /// Slippage model
    #[serde(default)]
    pub slippage: SlippageModel,

    /// What the simulator does when an instrument has no data
    #[serde(default)]
    pub missing_data: NoDataPolicy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            benchmark: default_benchmark(),
            commission: CommissionModel::default(),
            slippage: SlippageModel::default(),
            missing_data: NoDataPolicy::default(),
        }
    }
}

/// Commission model, interpreted by the execution simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommissionModel {
    /// Flat cost per trade
    PerTrade { cost: f64 },
    /// Cost per share traded
    PerShare { cost: f64 },
    /// No commission
    Free,
}

impl Default for CommissionModel {
    fn default() -> Self {
        CommissionModel::PerTrade { cost: 0.03 }
    }
}

/// Slippage model, interpreted by the execution simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SlippageModel {
    /// Fill at most `volume_limit` of bar volume, with quadratic price impact
    VolumeShare { volume_limit: f64, price_impact: f64 },
    /// Fixed spread around the bar price
    FixedSpread { spread: f64 },
    /// No slippage
    Zero,
}

impl Default for SlippageModel {
    fn default() -> Self {
        SlippageModel::VolumeShare {
            volume_limit: 0.25,
            price_impact: 0.1,
        }
    }
}

/// Simulator behavior when asked to trade an instrument without data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoDataPolicy {
    /// Abort the run
    #[default]
    Exception,
    /// Log and skip
    Log,
    /// Skip silently
    Ignore,
}

fn default_top_n() -> usize {
    10
}

fn default_target_weight() -> f64 {
    0.10
}

fn default_benchmark() -> Option<String> {
    Some("DIA".to_string())
}
