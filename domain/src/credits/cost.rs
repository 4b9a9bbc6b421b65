//! Operation pricing

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Kind of metered AI operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Initialize,
    TextMessage,
    ImageMessage,
    AudioMessage,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Initialize => "initialize",
            OperationKind::TextMessage => "text-message",
            OperationKind::ImageMessage => "image-message",
            OperationKind::AudioMessage => "audio-message",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Credit price of each operation kind.
///
/// This is the only place credit math lives: callers ask the table for a
/// cost once, before any remote call, and hand the number to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostTable {
    initialize: u64,
    text_message: u64,
    image_message: u64,
    audio_message: u64,
}

impl CostTable {
    /// Build a table, rejecting zero prices.
    pub fn new(
        initialize: u64,
        text_message: u64,
        image_message: u64,
        audio_message: u64,
    ) -> Result<Self, DomainError> {
        let table = Self {
            initialize,
            text_message,
            image_message,
            audio_message,
        };
        for kind in [
            OperationKind::Initialize,
            OperationKind::TextMessage,
            OperationKind::ImageMessage,
            OperationKind::AudioMessage,
        ] {
            if table.cost(kind) == 0 {
                return Err(DomainError::InvalidCost {
                    kind: kind.to_string(),
                });
            }
        }
        Ok(table)
    }

    /// Cost of one operation of the given kind.
    pub fn cost(&self, kind: OperationKind) -> u64 {
        match kind {
            OperationKind::Initialize => self.initialize,
            OperationKind::TextMessage => self.text_message,
            OperationKind::ImageMessage => self.image_message,
            OperationKind::AudioMessage => self.audio_message,
        }
    }
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            initialize: 3,
            text_message: 1,
            image_message: 3,
            audio_message: 2,
        }
    }
}
