use super::item::{Item, ItemId};
use super::party::{Party, PartyId, User, UserId};
use super::proposal::{Proposal, ProposalId, RatioStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Resolves who is acting and which party they act for.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn store_party(&self, party: Party) -> Result<()>;
    async fn party(&self, party_id: PartyId) -> Result<Option<Party>>;
    async fn store_user(&self, user: User) -> Result<()>;
    async fn user(&self, user_id: UserId) -> Result<Option<User>>;
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn store(&self, item: Item) -> Result<()>;
    async fn get(&self, item_id: ItemId) -> Result<Option<Item>>;
    async fn all(&self) -> Result<Vec<Item>>;
}

/// Persistence for proposals and their payment ratios.
///
/// `insert` writes a proposal together with all of its ratios in one call.
/// After that only ratio status changes go through `record_decision`.
#[async_trait]
pub trait ProposalStore: Send + Sync {
    async fn next_id(&self) -> Result<ProposalId>;
    async fn insert(&self, proposal: Proposal) -> Result<()>;
    async fn get(&self, proposal_id: ProposalId) -> Result<Option<Proposal>>;
    async fn exists_for_item(&self, item_id: ItemId) -> Result<bool>;
    /// All proposals for an item, oldest first.
    async fn for_item(&self, item_id: ItemId) -> Result<Vec<Proposal>>;
    /// Moves the party's ratio out of `Pending`. Fails with
    /// `NotFound(PendingRatio)` when the ratio was already decided, so of two
    /// racing decisions only one is stored.
    async fn record_decision(
        &self,
        proposal_id: ProposalId,
        party: PartyId,
        status: RatioStatus,
        by: UserId,
    ) -> Result<()>;
    async fn all(&self) -> Result<Vec<Proposal>>;
}

pub type DirectoryBox = Box<dyn Directory>;
pub type ItemStoreBox = Box<dyn ItemStore>;
pub type ProposalStoreBox = Box<dyn ProposalStore>;
