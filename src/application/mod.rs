//! Application layer orchestrating the negotiation rules.
//!
//! `NegotiationEngine` is the write side: it authorizes, validates and
//! persists proposals and decisions. `projection` and `catalog` are the read
//! side, shaping stored records into viewer-scoped views.

pub mod catalog;
pub mod engine;
pub mod projection;

use crate::domain::party::{User, UserId};
use crate::domain::ports::Directory;
use crate::error::{NegotiationError, Result};

/// Resolves the acting user. Unknown users are unauthenticated.
pub(crate) async fn resolve_identity(directory: &dyn Directory, user_id: UserId) -> Result<User> {
    directory
        .user(user_id)
        .await?
        .ok_or(NegotiationError::Unauthenticated)
}
