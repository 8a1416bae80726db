//! Repositories for database operations

pub mod account;

// Re-export for convenience
pub use account::{Account, AccountRepository};
