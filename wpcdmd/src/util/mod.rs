//! Utility code; candidates for factoring out.

pub mod measurement;
pub mod spin_lock;
