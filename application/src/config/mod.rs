//! Application-level configuration.
//!
//! - [`GameParams`]: credit seeding, history window and ledger retry limits
//! - [`ChainParams`]: transport fallback chain behavior

pub mod game_params;

pub use game_params::{ChainParams, GameParams};
