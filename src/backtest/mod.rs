//! Day-by-day replay of a strategy over recorded sessions

pub mod engine;
pub mod sessions;

pub use engine::{BacktestEngine, BacktestResult};
pub use sessions::{load_sessions, load_sessions_yaml, SessionsFile};
