//! Historical Dow Jones Industrial Average components, 1999-11-01 onwards
//!
//! Source: Dow Jones Indexes, "Dow Jones Industrial Average Historical Components".
//! Identifiers are tickers as of the date the security joined the index.

use super::timeline::{MembershipEvent, MembershipTimeline};
use crate::error::{StrategyError, StrategyResult};
use crate::types::MembershipAction::{self, Add, Remove};
use chrono::NaiveDate;

/// Name used for the built-in dataset
pub const DOW30_INDEX: &str = "DJIA";

/// Number of index constituents at any point in the dataset
pub const DOW30_SIZE: usize = 30;

/// (date, ticker, action)
const DOW30_EVENTS: &[(&str, &str, MembershipAction)] = &[
    ("1999-11-01", "MMM", Add), // Minnesota Mining & Manufacturing / 3M
    ("1999-11-01", "AA", Add),
    ("1999-11-01", "AXP", Add),
    ("1999-11-01", "T", Add), // AT&T Corporation
    ("1999-11-01", "BA", Add),
    ("1999-11-01", "CAT", Add),
    ("1999-11-01", "C", Add),
    ("1999-11-01", "KO", Add),
    ("1999-11-01", "DD", Add),
    ("1999-11-01", "EK", Add),
    ("1999-11-01", "XOM", Add),
    ("1999-11-01", "GE", Add),
    ("1999-11-01", "GM", Add),
    ("1999-11-01", "HPQ", Add),
    ("1999-11-01", "HD", Add),
    ("1999-11-01", "HON", Add), // AlliedSignal / Honeywell
    ("1999-11-01", "INTC", Add),
    ("1999-11-01", "IBM", Add),
    ("1999-11-01", "IP", Add),
    ("1999-11-01", "JPM", Add),
    ("1999-11-01", "JNJ", Add),
    ("1999-11-01", "MCD", Add),
    ("1999-11-01", "MRK", Add),
    ("1999-11-01", "MSFT", Add),
    ("1999-11-01", "MO", Add),
    ("1999-11-01", "PG", Add),
    ("1999-11-01", "SBC", Add), // SBC Communications, later AT&T Inc.
    ("1999-11-01", "UTX", Add),
    ("1999-11-01", "WMT", Add),
    ("1999-11-01", "DIS", Add),
    ("2004-04-08", "T", Remove),
    ("2004-04-08", "EK", Remove),
    ("2004-04-08", "IP", Remove),
    ("2004-04-08", "AIG", Add),
    ("2004-04-08", "PFE", Add),
    ("2004-04-08", "VZ", Add),
    ("2008-02-19", "MO", Remove),
    ("2008-02-19", "HON", Remove),
    ("2008-02-19", "BAC", Add),
    ("2008-02-19", "CVX", Add),
    ("2008-09-22", "AIG", Remove),
    ("2008-09-22", "KFT", Add), // Kraft, later Mondelez
    ("2009-06-08", "C", Remove),
    ("2009-06-08", "GM", Remove),
    ("2009-06-08", "TRV", Add),
    ("2009-06-08", "CSCO", Add),
    ("2012-09-24", "KFT", Remove),
    ("2012-09-24", "UNH", Add),
    ("2013-09-23", "BAC", Remove),
    ("2013-09-23", "HPQ", Remove),
    ("2013-09-23", "GS", Add),
    ("2013-09-23", "V", Add),
    ("2015-03-18", "SBC", Remove),
    ("2015-03-18", "AAPL", Add),
];

/// Built-in Dow 30 membership timeline
pub fn dow30_timeline() -> StrategyResult<MembershipTimeline> {
    MembershipTimeline::new(dow30_events()?)
}

/// Built-in Dow 30 membership events in dataset order
pub fn dow30_events() -> StrategyResult<Vec<MembershipEvent>> {
    DOW30_EVENTS
        .iter()
        .map(|(date, ticker, action)| {
            let effective_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| StrategyError::ConfigError(format!("bad built-in date {}: {}", date, e)))?;
            Ok(MembershipEvent::new(effective_date, *ticker, *action))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SecurityId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_dataset_is_consistent() {
        let timeline = dow30_timeline().unwrap();
        assert_eq!(timeline.len(), 54);
        assert!(timeline.validate().is_ok());
    }

    #[test]
    fn test_thirty_members_at_every_change() {
        let timeline = dow30_timeline().unwrap();
        for event in timeline.events() {
            let members = timeline.members_as_of(event.effective_date).unwrap();
            assert_eq!(members.len(), DOW30_SIZE, "on {}", event.effective_date);
        }
    }

    #[test]
    fn test_2004_reshuffle() {
        let timeline = dow30_timeline().unwrap();

        let before = timeline.members_as_of(date(2004, 4, 7)).unwrap();
        assert!(before.contains("T"));
        assert!(!before.contains("AIG"));

        let after = timeline.members_as_of(date(2004, 4, 8)).unwrap();
        assert!(!after.contains("T"));
        assert!(!after.contains("EK"));
        assert!(after.contains("PFE"));
        assert!(after.contains("VZ"));
    }

    #[test]
    fn test_final_membership() {
        let members = dow30_timeline().unwrap().final_members().unwrap();
        assert!(members.contains(&SecurityId::from("AAPL")));
        assert!(!members.contains(&SecurityId::from("SBC")));
        assert!(!members.contains(&SecurityId::from("KFT")));
        assert_eq!(members.len(), DOW30_SIZE);
    }
}
