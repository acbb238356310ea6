//! Viewer-scoped read models for proposals and their payment ratios.
//!
//! Names of the people behind a proposal or a decision are only revealed to
//! viewers from the same party. Everyone else gets an empty string.

use super::resolve_identity;
use crate::domain::item::ItemId;
use crate::domain::money::Money;
use crate::domain::party::{Party, PartyId, User, UserId};
use crate::domain::ports::{DirectoryBox, ItemStoreBox, ProposalStoreBox};
use crate::domain::proposal::{PaymentRatio, Proposal, ProposalId, RatioStatus};
use crate::error::{Entity, NegotiationError, Result, StateViolation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalSummary {
    pub proposal_id: ProposalId,
    pub created_at: DateTime<Utc>,
    pub creator_party: String,
    pub message: String,
    pub is_counter_proposal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalView {
    pub proposal_id: ProposalId,
    pub created_at: DateTime<Utc>,
    pub creator_name: String,
    pub creator_party: String,
    pub message: String,
    pub is_counter_proposal: bool,
    pub initial_proposal_id: Option<ProposalId>,
    pub payments: Vec<PaymentRatioView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRatioView {
    pub party_id: PartyId,
    pub party_name: String,
    pub amount: Money,
    pub status: RatioStatus,
    pub reviewer_name: String,
    pub reviewer_party: String,
}

/// Read side over the same stores the engine writes to.
pub struct NegotiationProjection {
    directory: DirectoryBox,
    items: ItemStoreBox,
    proposals: ProposalStoreBox,
}

impl NegotiationProjection {
    pub fn new(directory: DirectoryBox, items: ItemStoreBox, proposals: ProposalStoreBox) -> Self {
        Self {
            directory,
            items,
            proposals,
        }
    }

    pub async fn proposal_summary(&self, proposal_id: ProposalId) -> Result<ProposalSummary> {
        let proposal = self
            .proposals
            .get(proposal_id)
            .await?
            .ok_or(NegotiationError::NotFound(Entity::Proposal(proposal_id)))?;

        let mut names = NameCache::new(self);
        let creator = names.user(proposal.created_by).await?;
        let creator_party = names.party(creator.party).await?.name;

        Ok(ProposalSummary {
            proposal_id: proposal.id,
            created_at: proposal.created_at,
            creator_party,
            message: proposal.message,
            is_counter_proposal: proposal.is_counter_proposal,
        })
    }

    /// Every proposal and counter-proposal of a shared item, oldest first, as
    /// seen by `viewer`.
    pub async fn negotiation_details(
        &self,
        viewer: UserId,
        item_id: ItemId,
    ) -> Result<Vec<ProposalView>> {
        let viewer = resolve_identity(self.directory.as_ref(), viewer).await?;
        let item = self
            .items
            .get(item_id)
            .await?
            .ok_or(NegotiationError::NotFound(Entity::Item(item_id)))?;
        if !item.is_shared() {
            return Err(NegotiationError::InvalidState(StateViolation::ItemNotShared));
        }

        let mut names = NameCache::new(self);
        let mut views = Vec::new();
        for proposal in self.proposals.for_item(item.id).await? {
            views.push(project_proposal(&mut names, viewer.party, proposal).await?);
        }
        Ok(views)
    }
}

async fn project_proposal(
    names: &mut NameCache<'_>,
    viewer_party: PartyId,
    proposal: Proposal,
) -> Result<ProposalView> {
    let creator = names.user(proposal.created_by).await?;
    let creator_party = names.party(creator.party).await?;

    let mut payments = Vec::with_capacity(proposal.payment_ratios.len());
    for ratio in &proposal.payment_ratios {
        payments.push(project_ratio(names, viewer_party, ratio).await?);
    }

    Ok(ProposalView {
        proposal_id: proposal.id,
        created_at: proposal.created_at,
        creator_name: reveal_to(viewer_party, &creator, &creator.name),
        creator_party: creator_party.name,
        message: proposal.message,
        is_counter_proposal: proposal.is_counter_proposal,
        initial_proposal_id: proposal.initial_proposal,
        payments,
    })
}

async fn project_ratio(
    names: &mut NameCache<'_>,
    viewer_party: PartyId,
    ratio: &PaymentRatio,
) -> Result<PaymentRatioView> {
    let party_name = names.party(ratio.party).await?.name;

    let (reviewer_name, reviewer_party) = match ratio.statused_by {
        Some(reviewer_id) => {
            let reviewer = names.user(reviewer_id).await?;
            let reviewer_party = names.party(reviewer.party).await?;
            (
                reveal_to(viewer_party, &reviewer, &reviewer.name),
                reveal_to(viewer_party, &reviewer, &reviewer_party.name),
            )
        }
        None => (String::new(), String::new()),
    };

    Ok(PaymentRatioView {
        party_id: ratio.party,
        party_name,
        amount: ratio.amount,
        status: ratio.status,
        reviewer_name,
        reviewer_party,
    })
}

/// `text` when the viewer belongs to `user`'s party, blank otherwise.
fn reveal_to(viewer_party: PartyId, user: &User, text: &str) -> String {
    if user.party == viewer_party {
        text.to_string()
    } else {
        String::new()
    }
}

/// Memoizes directory lookups for the duration of one projection.
struct NameCache<'a> {
    projection: &'a NegotiationProjection,
    users: HashMap<UserId, User>,
    parties: HashMap<PartyId, Party>,
}

impl<'a> NameCache<'a> {
    fn new(projection: &'a NegotiationProjection) -> Self {
        Self {
            projection,
            users: HashMap::new(),
            parties: HashMap::new(),
        }
    }

    async fn user(&mut self, user_id: UserId) -> Result<User> {
        if let Some(user) = self.users.get(&user_id) {
            return Ok(user.clone());
        }
        let user = self
            .projection
            .directory
            .user(user_id)
            .await?
            .ok_or(NegotiationError::NotFound(Entity::User(user_id)))?;
        self.users.insert(user_id, user.clone());
        Ok(user)
    }

    async fn party(&mut self, party_id: PartyId) -> Result<Party> {
        if let Some(party) = self.parties.get(&party_id) {
            return Ok(party.clone());
        }
        let party = self
            .projection
            .directory
            .party(party_id)
            .await?
            .ok_or(NegotiationError::NotFound(Entity::Party(party_id)))?;
        self.parties.insert(party_id, party.clone());
        Ok(party)
    }
}
