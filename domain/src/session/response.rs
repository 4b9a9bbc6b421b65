//! Response attribution

use serde::{Deserialize, Serialize};

/// Which tier of the transport plan produced a reply.
///
/// Only [`ResponseSource::Synthetic`] degrades a session; a reply from a later
/// remote attempt is still real service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Primary,
    Secondary,
    Synthetic,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Primary => "primary",
            ResponseSource::Secondary => "secondary",
            ResponseSource::Synthetic => "synthetic",
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, ResponseSource::Synthetic)
    }

    /// Source for a remote attempt at `position` in the provider's plan.
    pub fn for_attempt(position: usize) -> Self {
        if position == 0 {
            ResponseSource::Primary
        } else {
            ResponseSource::Secondary
        }
    }
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
