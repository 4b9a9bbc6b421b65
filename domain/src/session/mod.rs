//! Learning session domain.
//!
//! - [`entities::ConversationMessage`]: a single message in session history
//! - [`game_session::GameSession`]: one topic/difficulty-scoped conversation
//! - [`response::ResponseSource`]: which transport tier produced a reply
//! - [`snapshot::GameSessionSnapshot`]: serializable session state
//! - [`synthetic`]: deterministic offline replies

pub mod entities;
pub mod game_session;
pub mod response;
pub mod snapshot;
pub mod synthetic;
