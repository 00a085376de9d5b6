//! Screen implementations. Each screen is a top-level Component; the
//! panel's current `Screen` decides which one receives input.

pub mod configure;
pub mod login;
pub mod search;
