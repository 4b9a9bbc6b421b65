//! Domain layer for gameplan
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Credits
//!
//! Every AI operation has a price given by [`CostTable`]. A user's
//! [`CreditAccount`] balance never goes negative; credits are earmarked by a
//! [`Reservation`] before a remote call and debited after a reply exists.
//!
//! ## Sessions
//!
//! A [`GameSession`] is one topic/difficulty-scoped conversation with an
//! append-only history. Replies are attributed with a [`ResponseSource`];
//! a synthetic reply marks the session degraded for good.

pub mod content;
pub mod core;
pub mod credits;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use content::topic::{Topic, TopicId};
pub use core::error::DomainError;
pub use credits::{
    account::{CreditAccount, UserId},
    cost::{CostTable, OperationKind},
    reservation::{Reservation, ReservationId},
};
pub use session::{
    entities::{Attachment, ConversationMessage, MessageInput, Role},
    game_session::{Difficulty, GameSession, ProviderId, SessionId, SessionPhase},
    response::ResponseSource,
    snapshot::{GameSessionSnapshot, SNAPSHOT_VERSION},
    synthetic::{SYNTHETIC_MARKER, is_synthetic_text, synthetic_greeting, synthetic_reply},
};
