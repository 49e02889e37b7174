//! Index membership reconstruction

pub mod dow30;
pub mod timeline;

pub use dow30::{dow30_events, dow30_timeline, DOW30_INDEX, DOW30_SIZE};
pub use timeline::{
    MembershipDataset, MembershipEvent, MembershipReplay, MembershipTimeline, RawMembershipEvent,
};
