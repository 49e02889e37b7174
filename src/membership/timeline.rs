//! Point-in-time index membership
//!
//! Membership as of any date is the fold of the prefix of an ordered
//! add/remove log, so no per-date snapshots are stored.

use crate::error::{StrategyError, StrategyResult};
use crate::types::{MemberSet, MembershipAction, SecurityId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Dated addition or removal of a security
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEvent {
    /// First date on which the change applies
    pub effective_date: NaiveDate,
    /// Security added or removed
    pub security: SecurityId,
    /// Add or remove
    pub action: MembershipAction,
}

impl MembershipEvent {
    pub fn new(effective_date: NaiveDate, security: impl Into<SecurityId>, action: MembershipAction) -> Self {
        Self {
            effective_date,
            security: security.into(),
            action,
        }
    }
}

/// Membership event with an unparsed date, as found in datasets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMembershipEvent {
    /// Date in `YYYY-MM-DD` form
    pub date: String,
    /// Security identifier
    pub security: String,
    /// Add or remove
    pub action: MembershipAction,
}

impl RawMembershipEvent {
    fn parse(&self) -> StrategyResult<MembershipEvent> {
        let effective_date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).map_err(|e| {
            StrategyError::ConfigError(format!(
                "unparsable membership date {:?} for {}: {}",
                self.date, self.security, e
            ))
        })?;

        if self.security.trim().is_empty() {
            return Err(StrategyError::ConfigError(format!(
                "membership event on {} has an empty security identifier",
                self.date
            )));
        }

        Ok(MembershipEvent::new(
            effective_date,
            self.security.trim(),
            self.action,
        ))
    }
}

/// Serialized membership dataset
///
/// ```yaml
/// index: DJIA
/// events:
///   - { date: "1999-11-01", security: MMM, action: add }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipDataset {
    /// Index name, informational only
    #[serde(default)]
    pub index: Option<String>,
    /// Membership changes
    pub events: Vec<RawMembershipEvent>,
}

/// Historical index membership, immutable after construction
#[derive(Debug, Clone)]
pub struct MembershipTimeline {
    events: Vec<MembershipEvent>,
}

impl MembershipTimeline {
    /// Build a timeline from typed events
    ///
    /// Events are sorted by effective date. The sort is stable, so events
    /// sharing a date keep their dataset order.
    pub fn new(mut events: Vec<MembershipEvent>) -> StrategyResult<Self> {
        if events.is_empty() {
            return Err(StrategyError::ConfigError(
                "membership dataset has no events".to_string(),
            ));
        }

        events.sort_by_key(|e| e.effective_date);
        Ok(Self { events })
    }

    /// Build a timeline from events with string dates
    pub fn from_raw(raw: Vec<RawMembershipEvent>) -> StrategyResult<Self> {
        let events = raw
            .iter()
            .map(RawMembershipEvent::parse)
            .collect::<StrategyResult<Vec<_>>>()?;
        Self::new(events)
    }

    pub fn from_dataset(dataset: MembershipDataset) -> StrategyResult<Self> {
        let timeline = Self::from_raw(dataset.events)?;
        tracing::debug!(
            index = dataset.index.as_deref().unwrap_or("unnamed"),
            events = timeline.len(),
            "Loaded membership dataset"
        );
        Ok(timeline)
    }

    /// Load a dataset from YAML
    pub fn from_yaml(yaml: &str) -> StrategyResult<Self> {
        let dataset: MembershipDataset = serde_yaml::from_str(yaml)
            .map_err(|e| StrategyError::ConfigError(format!("Failed to parse membership YAML: {}", e)))?;
        Self::from_dataset(dataset)
    }

    /// Load a dataset from JSON
    pub fn from_json(json: &str) -> StrategyResult<Self> {
        let dataset: MembershipDataset = serde_json::from_str(json)
            .map_err(|e| StrategyError::ConfigError(format!("Failed to parse membership JSON: {}", e)))?;
        Self::from_dataset(dataset)
    }

    /// Load a dataset file; `.json` files are read as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> StrategyResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Members of the index on `date`
    ///
    /// Dates before the first event yield the empty set. Fails with
    /// [`StrategyError::Consistency`] if a removal on or before `date`
    /// targets a non-member.
    pub fn members_as_of(&self, date: NaiveDate) -> StrategyResult<MemberSet> {
        let mut replay = self.replay();
        replay.advance_to(date)?;
        Ok(replay.into_members())
    }

    /// Start a fold over the log that can be continued date by date
    pub fn replay(&self) -> MembershipReplay<'_> {
        MembershipReplay {
            events: &self.events,
            next: 0,
            as_of: None,
            members: MemberSet::new(),
        }
    }

    /// Replay the whole log, surfacing the first consistency error
    pub fn validate(&self) -> StrategyResult<()> {
        self.final_members().map(|_| ())
    }

    /// Membership after every event has been applied
    pub fn final_members(&self) -> StrategyResult<MemberSet> {
        self.members_as_of(self.last_date())
    }

    /// Events in replay order
    pub fn events(&self) -> &[MembershipEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Date of the earliest event
    pub fn first_date(&self) -> NaiveDate {
        // non-empty by construction
        self.events[0].effective_date
    }

    /// Date of the latest event
    pub fn last_date(&self) -> NaiveDate {
        self.events[self.events.len() - 1].effective_date
    }
}

/// Incremental fold over a [`MembershipTimeline`]
///
/// `advance_to(d2)` after `advance_to(d1)` applies only the events dated in
/// `(d1, d2]`.
#[derive(Debug, Clone)]
pub struct MembershipReplay<'a> {
    events: &'a [MembershipEvent],
    next: usize,
    as_of: Option<NaiveDate>,
    members: MemberSet,
}

impl<'a> MembershipReplay<'a> {
    /// Apply every pending event dated on or before `date`
    pub fn advance_to(&mut self, date: NaiveDate) -> StrategyResult<&MemberSet> {
        if let Some(as_of) = self.as_of {
            if date < as_of {
                return Err(StrategyError::InvalidParameter(format!(
                    "cannot rewind membership replay from {} to {}",
                    as_of, date
                )));
            }
        }

        while let Some(event) = self.events.get(self.next) {
            if event.effective_date > date {
                break;
            }
            match event.action {
                MembershipAction::Add => {
                    self.members.insert(event.security.clone());
                }
                MembershipAction::Remove => {
                    if !self.members.remove(&event.security) {
                        return Err(StrategyError::Consistency {
                            security: event.security.clone(),
                            date: event.effective_date,
                        });
                    }
                }
            }
            self.next += 1;
        }

        self.as_of = Some(date);
        Ok(&self.members)
    }

    /// Date of the last `advance_to`, if any
    pub fn as_of(&self) -> Option<NaiveDate> {
        self.as_of
    }

    pub fn members(&self) -> &MemberSet {
        &self.members
    }

    pub fn into_members(self) -> MemberSet {
        self.members
    }

    /// Whether every event has been applied
    pub fn is_exhausted(&self) -> bool {
        self.next >= self.events.len()
    }
}
