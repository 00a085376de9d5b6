// lookout-api: Async Rust client for the analytics platform's persons API

pub mod error;
pub mod persons;
pub mod transport;

pub use error::Error;
pub use persons::PersonsClient;
pub use persons::types;
pub use transport::{TlsMode, TransportConfig};
