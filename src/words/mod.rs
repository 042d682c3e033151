pub mod core;
pub mod selector;
pub mod supply;

// Re-export the main types for convenience
pub use core::{WordPool, WordPools};
pub use selector::{RandomSelector, WordSelector};
pub use supply::{validate_words, GenerateRequest, WordSource, WordSupply};
