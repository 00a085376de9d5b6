// Persons API: project-scoped person lookup with bearer-token auth.

pub mod client;
pub mod types;

pub use client::PersonsClient;
