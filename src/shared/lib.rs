// Declare modules at the root level
pub mod alerts;
pub mod completion;
pub mod domain;
pub mod error;
pub mod irrigation;
pub mod panel;
pub mod poller;
pub mod prediction;
pub mod sensor_validation;
pub mod snapshot_client;
pub mod time;
pub mod validators;

// Scripted sources and generators for unit tests
#[cfg(test)]
pub mod test_utils;

// Re-export everything under a shared namespace for external access
pub mod shared {
    pub use super::alerts;
    pub use super::completion;
    pub use super::domain;
    pub use super::error;
    pub use super::irrigation;
    pub use super::panel;
    pub use super::poller;
    pub use super::prediction;
    pub use super::sensor_validation;
    pub use super::snapshot_client;
    pub use super::time;
    pub use super::validators;
}

// Also re-export at root for convenience
pub use alerts::*;
pub use completion::*;
pub use domain::*;
pub use error::*;
pub use irrigation::*;
pub use panel::*;
pub use poller::*;
pub use prediction::*;
pub use sensor_validation::*;
pub use snapshot_client::*;
pub use time::*;
pub use validators::*;
