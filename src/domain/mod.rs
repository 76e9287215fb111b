//! Domain types and DTOs
//!
//! Field names on the wire follow the inference engine (Spanish camelCase);
//! Rust-side names are English.

pub mod cases;
pub mod diagnosis;
pub mod interview;

// Re-export commonly used types
pub use cases::*;
pub use diagnosis::*;
pub use interview::*;
