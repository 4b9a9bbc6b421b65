//! Credit metering domain.
//!
//! - [`account::CreditAccount`]: a user's credit balance of record
//! - [`cost::CostTable`]: the single pricing function for AI operations
//! - [`reservation::Reservation`]: credits earmarked for one operation

pub mod account;
pub mod cost;
pub mod reservation;
