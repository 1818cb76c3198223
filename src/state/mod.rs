//! State module for tracking workflow progress
//!
//! # Components
//!
//! - `AuthState`: Progress of the sign-in sequence (one per run)
//! - `EntryAttemptState`: Progress of one giveaway entry attempt (one per listing)

mod auth_state;
mod entry_state;

// Re-export main types
pub use auth_state::AuthState;
pub use entry_state::EntryAttemptState;
