//! API request handlers.

/// Agent registry listing.
pub mod agents;
/// Chat turns.
pub mod chat;
/// Stored conversation inspection.
pub mod conversations;
