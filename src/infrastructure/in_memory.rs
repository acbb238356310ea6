use crate::domain::item::{Item, ItemId};
use crate::domain::party::{Party, PartyId, User, UserId};
use crate::domain::ports::{Directory, ItemStore, ProposalStore};
use crate::domain::proposal::{Proposal, ProposalId, RatioStatus};
use crate::error::{Entity, NegotiationError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A thread-safe in-memory directory of parties and users.
#[derive(Default, Clone)]
pub struct InMemoryDirectory {
    parties: Arc<RwLock<HashMap<PartyId, Party>>>,
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn store_party(&self, party: Party) -> Result<()> {
        self.parties.write().await.insert(party.id, party);
        Ok(())
    }

    async fn party(&self, party_id: PartyId) -> Result<Option<Party>> {
        Ok(self.parties.read().await.get(&party_id).cloned())
    }

    async fn store_user(&self, user: User) -> Result<()> {
        self.users.write().await.insert(user.id, user);
        Ok(())
    }

    async fn user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }
}

/// A thread-safe in-memory store for items.
#[derive(Default, Clone)]
pub struct InMemoryItemStore {
    items: Arc<RwLock<HashMap<ItemId, Item>>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn store(&self, item: Item) -> Result<()> {
        self.items.write().await.insert(item.id, item);
        Ok(())
    }

    async fn get(&self, item_id: ItemId) -> Result<Option<Item>> {
        Ok(self.items.read().await.get(&item_id).cloned())
    }

    async fn all(&self) -> Result<Vec<Item>> {
        Ok(self.items.read().await.values().cloned().collect())
    }
}

/// A thread-safe in-memory store for proposals and their payment ratios.
///
/// Ids are handed out from a shared counter starting at 1, so clones of one
/// store never reuse an id.
#[derive(Default, Clone)]
pub struct InMemoryProposalStore {
    proposals: Arc<RwLock<HashMap<ProposalId, Proposal>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryProposalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProposalStore for InMemoryProposalStore {
    async fn next_id(&self) -> Result<ProposalId> {
        Ok(ProposalId(self.sequence.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn insert(&self, proposal: Proposal) -> Result<()> {
        self.proposals.write().await.insert(proposal.id, proposal);
        Ok(())
    }

    async fn get(&self, proposal_id: ProposalId) -> Result<Option<Proposal>> {
        Ok(self.proposals.read().await.get(&proposal_id).cloned())
    }

    async fn exists_for_item(&self, item_id: ItemId) -> Result<bool> {
        let proposals = self.proposals.read().await;
        Ok(proposals.values().any(|p| p.item == item_id))
    }

    async fn for_item(&self, item_id: ItemId) -> Result<Vec<Proposal>> {
        let proposals = self.proposals.read().await;
        let mut found: Vec<Proposal> = proposals
            .values()
            .filter(|p| p.item == item_id)
            .cloned()
            .collect();
        found.sort_by_key(|p| (p.created_at, p.id));
        Ok(found)
    }

    async fn record_decision(
        &self,
        proposal_id: ProposalId,
        party: PartyId,
        status: RatioStatus,
        by: UserId,
    ) -> Result<()> {
        let mut proposals = self.proposals.write().await;
        let proposal = proposals
            .get_mut(&proposal_id)
            .ok_or(NegotiationError::NotFound(Entity::Proposal(proposal_id)))?;
        // Checked again under the write lock: a racing decision may have won.
        let decided = proposal
            .ratio_for_mut(party)
            .is_some_and(|ratio| ratio.decide(status, by));
        if !decided {
            return Err(NegotiationError::NotFound(Entity::PendingRatio {
                proposal: proposal_id,
                party,
            }));
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Proposal>> {
        let mut all: Vec<Proposal> = self.proposals.read().await.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }
}
