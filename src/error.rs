use crate::domain::item::ItemId;
use crate::domain::party::{PartyId, UserId};
use crate::domain::proposal::ProposalId;
use crate::domain::validation::PaymentRejection;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NegotiationError>;

/// Everything the negotiation core and its adapters can fail with.
///
/// The first six variants are expected business outcomes and are returned to
/// the caller as-is. The rest wrap collaborator failures.
#[derive(Error, Debug)]
pub enum NegotiationError {
    #[error("user is not authenticated")]
    Unauthenticated,
    #[error("{0} not found")]
    NotFound(Entity),
    #[error("forbidden: {0}")]
    Forbidden(ForbiddenAction),
    #[error("conflict: {0}")]
    Conflict(ConflictReason),
    #[error("invalid state: {0}")]
    InvalidState(StateViolation),
    #[error("invalid input: {0}")]
    InvalidInput(InputError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
}

/// The record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User(UserId),
    Party(PartyId),
    Item(ItemId),
    Proposal(ProposalId),
    PendingRatio {
        proposal: ProposalId,
        party: PartyId,
    },
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User(id) => write!(f, "user {id}"),
            Entity::Party(id) => write!(f, "party {id}"),
            Entity::Item(id) => write!(f, "item {id}"),
            Entity::Proposal(id) => write!(f, "proposal {id}"),
            Entity::PendingRatio { proposal, party } => {
                write!(f, "pending payment for party {party} on proposal {proposal}")
            }
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenAction {
    #[error("cannot submit a counter-proposal to your own proposal")]
    SelfCounter,
    #[error("cannot accept or reject your own proposal")]
    OwnProposal,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    #[error("a proposal already exists for item {0}, submit a counter-proposal")]
    ProposalExists(ItemId),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateViolation {
    #[error("item is not shared among multiple parties")]
    ItemNotShared,
    #[error("item is not associated with the user's party")]
    PartyNotAssociated,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("{0}")]
    Payment(PaymentRejection),
    #[error("a message is required for counter-proposals")]
    MissingMessage,
    #[error("malformed command: {0}")]
    Command(String),
}

impl From<PaymentRejection> for NegotiationError {
    fn from(rejection: PaymentRejection) -> Self {
        NegotiationError::InvalidInput(InputError::Payment(rejection))
    }
}
