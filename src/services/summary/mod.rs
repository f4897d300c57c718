pub mod classify;
pub mod client;
pub mod engine;
pub mod error;
pub mod prompt;
pub mod traits;
pub mod types;

pub use engine::{SummaryFailure, SummaryService};
