use crate::domain::item::{Item, ItemId};
use crate::domain::party::{Party, PartyId, User, UserId};
use crate::domain::ports::{Directory, ItemStore, ProposalStore};
use crate::domain::proposal::{Proposal, ProposalId, RatioStatus};
use crate::error::{Entity, NegotiationError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const CF_PARTIES: &str = "parties";
pub const CF_USERS: &str = "users";
pub const CF_ITEMS: &str = "items";
pub const CF_PROPOSALS: &str = "proposals";
/// Holds the proposal id sequence.
pub const CF_META: &str = "meta";

const KEY_PROPOSAL_SEQUENCE: &[u8] = b"proposal_sequence";

/// A persistent store implementation using RocksDB.
///
/// Parties, users, items and proposals live in separate column families,
/// keyed by their big-endian id and stored as JSON. A proposal is stored as
/// one value together with its payment ratios, so `insert` is a single write.
///
/// Cloning shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    // Serializes read-modify-write cycles (id sequence, ratio decisions).
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path` with every column
    /// family this store needs.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_PARTIES, CF_USERS, CF_ITEMS, CF_PROPOSALS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, families)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn put<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let handle = self.handle(cf)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(handle, key, bytes)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        let handle = self.handle(cf)?;
        match self.db.get_pinned_cf(handle, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let handle = self.handle(cf)?;
        self.db
            .iterator_cf(handle, IteratorMode::Start)
            .map(|entry| -> Result<T> {
                let (_key, value) = entry?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    fn handle(&self, cf: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(cf)
            .ok_or_else(|| NegotiationError::Storage(format!("column family {cf} not found")))
    }
}

#[async_trait]
impl Directory for RocksDBStore {
    async fn store_party(&self, party: Party) -> Result<()> {
        self.put(CF_PARTIES, &party.id.0.to_be_bytes(), &party)
    }

    async fn party(&self, party_id: PartyId) -> Result<Option<Party>> {
        self.fetch(CF_PARTIES, &party_id.0.to_be_bytes())
    }

    async fn store_user(&self, user: User) -> Result<()> {
        self.put(CF_USERS, &user.id.0.to_be_bytes(), &user)
    }

    async fn user(&self, user_id: UserId) -> Result<Option<User>> {
        self.fetch(CF_USERS, &user_id.0.to_be_bytes())
    }
}

#[async_trait]
impl ItemStore for RocksDBStore {
    async fn store(&self, item: Item) -> Result<()> {
        self.put(CF_ITEMS, &item.id.0.to_be_bytes(), &item)
    }

    async fn get(&self, item_id: ItemId) -> Result<Option<Item>> {
        self.fetch(CF_ITEMS, &item_id.0.to_be_bytes())
    }

    async fn all(&self) -> Result<Vec<Item>> {
        self.scan(CF_ITEMS)
    }
}

#[async_trait]
impl ProposalStore for RocksDBStore {
    async fn next_id(&self) -> Result<ProposalId> {
        let _guard = self.write_lock.lock().await;
        let current: u64 = self
            .fetch(CF_META, KEY_PROPOSAL_SEQUENCE)?
            .unwrap_or_default();
        let next = current + 1;
        self.put(CF_META, KEY_PROPOSAL_SEQUENCE, &next)?;
        Ok(ProposalId(next))
    }

    async fn insert(&self, proposal: Proposal) -> Result<()> {
        self.put(CF_PROPOSALS, &proposal.id.0.to_be_bytes(), &proposal)
    }

    async fn get(&self, proposal_id: ProposalId) -> Result<Option<Proposal>> {
        self.fetch(CF_PROPOSALS, &proposal_id.0.to_be_bytes())
    }

    async fn exists_for_item(&self, item_id: ItemId) -> Result<bool> {
        Ok(!self.for_item(item_id).await?.is_empty())
    }

    async fn for_item(&self, item_id: ItemId) -> Result<Vec<Proposal>> {
        let mut found: Vec<Proposal> = self
            .scan::<Proposal>(CF_PROPOSALS)?
            .into_iter()
            .filter(|p| p.item == item_id)
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
        let _guard = self.write_lock.lock().await;
        let key = proposal_id.0.to_be_bytes();
        let mut proposal: Proposal = self
            .fetch(CF_PROPOSALS, &key)?
            .ok_or(NegotiationError::NotFound(Entity::Proposal(proposal_id)))?;
        let decided = proposal
            .ratio_for_mut(party)
            .is_some_and(|ratio| ratio.decide(status, by));
        if !decided {
            return Err(NegotiationError::NotFound(Entity::PendingRatio {
                proposal: proposal_id,
                party,
            }));
        }
        self.put(CF_PROPOSALS, &key, &proposal)
    }

    async fn all(&self) -> Result<Vec<Proposal>> {
        // Big-endian keys iterate in id order.
        self.scan(CF_PROPOSALS)
    }
}
