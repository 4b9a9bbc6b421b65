//! Learning content reference data.

pub mod topic;
