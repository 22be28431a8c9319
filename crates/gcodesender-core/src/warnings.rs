//! User-facing warning log
//!
//! Transport failures and refused commands are not errors from the caller's
//! point of view: they are surfaced to the user as warnings, grouped so a UI
//! can clear them once the condition no longer applies.

use serde::{Deserialize, Serialize};

/// Warning group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningGroup {
    /// Connection setup, option mismatches and receive errors
    Connection,
    /// Commands that could not be sent
    Command,
}

impl std::fmt::Display for WarningGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection => write!(f, "connection"),
            Self::Command => write!(f, "cmd"),
        }
    }
}

/// A single user-facing warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub group: WarningGroup,
    pub message: String,
}

/// Ordered log of warnings shown to the user
#[derive(Debug, Clone, Default)]
pub struct WarningLog {
    warnings: Vec<Warning>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning
    pub fn warn(&mut self, group: WarningGroup, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(group = %group, "{}", message);
        self.warnings.push(Warning { group, message });
    }

    /// Clear all warnings
    pub fn clear(&mut self) {
        self.warnings.clear();
    }

    /// Clear the warnings of one group
    pub fn clear_group(&mut self, group: WarningGroup) {
        self.warnings.retain(|w| w.group != group);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Messages in insertion order
    pub fn messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_and_clear() {
        let mut log = WarningLog::new();
        log.warn(WarningGroup::Connection, "Unable to connect to 'COM3'");
        log.warn(WarningGroup::Command, "no device connection available.");
        assert_eq!(log.len(), 2);
        assert_eq!(log.messages()[0], "Unable to connect to 'COM3'");

        log.clear_group(WarningGroup::Connection);
        assert_eq!(log.len(), 1);
        assert_eq!(log.warnings()[0].group, WarningGroup::Command);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut log = WarningLog::new();
        log.warn(WarningGroup::Command, "failed to send command: timeout");
        log.warn(WarningGroup::Command, "failed to send command: timeout");
        assert_eq!(log.len(), 2);
    }
}
