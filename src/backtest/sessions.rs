//! Price session files

use crate::types::SessionData;
use crate::StrategyResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk list of trading days
///
/// ```yaml
/// sessions:
///   - date: 2000-01-03
///     bars:
///       KO: { close: 58.2, volume: 2100000 }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionsFile {
    pub sessions: Vec<SessionData>,
}

/// Parse sessions from YAML, keeping file order
pub fn load_sessions_yaml(yaml: &str) -> StrategyResult<Vec<SessionData>> {
    let file: SessionsFile = serde_yaml::from_str(yaml)?;
    Ok(file.sessions)
}

/// Read a sessions file from disk
pub fn load_sessions(path: impl AsRef<Path>) -> StrategyResult<Vec<SessionData>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let sessions = load_sessions_yaml(&contents)?;
    tracing::debug!(path = %path.display(), sessions = sessions.len(), "Loaded price sessions");
    Ok(sessions)
}
