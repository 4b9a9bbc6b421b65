//! Topic catalog overrides from TOML (`[[topics]]`)

use crate::config::issue::{ConfigIssue, ConfigIssueCode};
use gameplan_domain::Topic;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One catalog entry. Entries replace built-in topics with the same id.
///
/// ```toml
/// [[topics]]
/// id = "robotics"
/// name = "Robotics"
/// description = "Sensors, actuators and control loops"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTopicConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Convert entries to topics, dropping invalid ones.
///
/// Later duplicates win, matching how the catalog applies overrides.
pub fn parse_topics(entries: &[FileTopicConfig]) -> (Vec<Topic>, Vec<ConfigIssue>) {
    let mut topics = Vec::new();
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        if entry.id.trim().is_empty() || entry.name.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidValue {
                    field: format!("topics[{}]", index),
                },
                format!("topics[{}]: id and name must not be empty", index),
            ));
            continue;
        }
        if !seen.insert(entry.id.trim().to_string()) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::DuplicateTopic {
                    id: entry.id.clone(),
                },
                format!("topics: '{}' is defined more than once", entry.id),
            ));
        }
        topics.push(Topic::new(
            entry.id.trim(),
            entry.name.trim(),
            entry.description.trim(),
        ));
    }

    (topics, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::issue::Severity;

    fn entry(id: &str, name: &str) -> FileTopicConfig {
        FileTopicConfig {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn empty_fields_are_dropped_with_error() {
        let (topics, issues) = parse_topics(&[entry("", "Nameless"), entry("ok", "Ok")]);
        assert_eq!(topics.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn duplicates_warn() {
        let (topics, issues) = parse_topics(&[entry("a", "A"), entry("a", "A2")]);
        assert_eq!(topics.len(), 2);
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0].code, ConfigIssueCode::DuplicateTopic { .. }));
    }
}
