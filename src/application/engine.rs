use super::resolve_identity;
use crate::domain::item::{Item, ItemId};
use crate::domain::party::{User, UserId};
use crate::domain::ports::{DirectoryBox, ItemStoreBox, ProposalStoreBox};
use crate::domain::proposal::{Decision, PaymentRequest, Proposal, ProposalId, RatioStatus};
use crate::domain::ratios::build_ratios;
use crate::domain::validation::validate_payments;
use crate::error::{
    ConflictReason, Entity, ForbiddenAction, InputError, NegotiationError, Result, StateViolation,
};
use chrono::Utc;
use tracing::{debug, info, warn};

/// A split submitted by a user: the payments plus how to read them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub message: Option<String>,
    pub is_percentage_based: bool,
    pub payments: Vec<PaymentRequest>,
}

/// Enforces who may propose, counter and decide on an item's split.
///
/// The engine holds no negotiation state of its own. Every operation reads
/// what it needs through the ports, checks its preconditions top to bottom,
/// and only then allocates a proposal id and writes. Nothing is written when
/// a check fails.
///
/// Read-check-write is not serialized: two concurrent `create_proposal`
/// calls for one item can both succeed. Callers that need exclusivity must
/// serialize by item id before calling in.
pub struct NegotiationEngine {
    directory: DirectoryBox,
    items: ItemStoreBox,
    proposals: ProposalStoreBox,
}

impl NegotiationEngine {
    pub fn new(directory: DirectoryBox, items: ItemStoreBox, proposals: ProposalStoreBox) -> Self {
        Self {
            directory,
            items,
            proposals,
        }
    }

    /// Opens the negotiation for an item with its root proposal.
    ///
    /// Only the first proposal for an item may be created this way; later
    /// submissions must counter an existing proposal.
    pub async fn create_proposal(
        &self,
        user_id: UserId,
        item_id: ItemId,
        submission: Submission,
    ) -> Result<Proposal> {
        let user = resolve_identity(self.directory.as_ref(), user_id).await?;
        let item = self
            .items
            .get(item_id)
            .await?
            .ok_or(NegotiationError::NotFound(Entity::Item(item_id)))?;

        ensure_negotiable(&item, &user)?;

        if self.proposals.exists_for_item(item.id).await? {
            return Err(NegotiationError::Conflict(ConflictReason::ProposalExists(
                item.id,
            )));
        }

        self.submit(&user, &item, submission, None).await
    }

    /// Counters `original_id` with a new split.
    ///
    /// The counter always links to `original_id` itself, even when newer
    /// counters exist for the same item.
    pub async fn create_counter_proposal(
        &self,
        user_id: UserId,
        original_id: ProposalId,
        submission: Submission,
    ) -> Result<Proposal> {
        let user = resolve_identity(self.directory.as_ref(), user_id).await?;
        let original = self.load_proposal(original_id).await?;
        let item = self
            .items
            .get(original.item)
            .await?
            .ok_or(NegotiationError::NotFound(Entity::Item(original.item)))?;

        ensure_negotiable(&item, &user)?;

        if original.created_by == user.id {
            return Err(NegotiationError::Forbidden(ForbiddenAction::SelfCounter));
        }

        let has_message = submission
            .message
            .as_deref()
            .is_some_and(|message| !message.trim().is_empty());
        if !has_message {
            return Err(NegotiationError::InvalidInput(InputError::MissingMessage));
        }

        self.submit(&user, &item, submission, Some(original.id)).await
    }

    /// Records the acting user's party decision on its pending share.
    pub async fn decide_proposal(
        &self,
        user_id: UserId,
        proposal_id: ProposalId,
        decision: Decision,
    ) -> Result<()> {
        let user = resolve_identity(self.directory.as_ref(), user_id).await?;
        let mut proposal = self.load_proposal(proposal_id).await?;

        if proposal.created_by == user.id {
            return Err(NegotiationError::Forbidden(ForbiddenAction::OwnProposal));
        }

        let status = RatioStatus::from(decision);
        let decided = proposal
            .ratio_for_mut(user.party)
            .is_some_and(|ratio| ratio.decide(status, user.id));
        if !decided {
            return Err(NegotiationError::NotFound(Entity::PendingRatio {
                proposal: proposal.id,
                party: user.party,
            }));
        }

        self.proposals
            .record_decision(proposal.id, user.party, status, user.id)
            .await?;

        info!(
            proposal = %proposal.id,
            party = %user.party,
            user = %user.id,
            %status,
            "recorded payment decision"
        );
        Ok(())
    }

    /// Rejects `proposal_id` on behalf of the user's party, then counters it.
    ///
    /// The two steps are not atomic. When the counter-proposal fails, the
    /// rejection stays recorded and the counter error is returned.
    pub async fn reject_and_counter(
        &self,
        user_id: UserId,
        proposal_id: ProposalId,
        submission: Submission,
    ) -> Result<Proposal> {
        self.decide_proposal(user_id, proposal_id, Decision::Reject)
            .await?;

        self.create_counter_proposal(user_id, proposal_id, submission)
            .await
            .inspect_err(|e| {
                warn!(
                    proposal = %proposal_id,
                    user = %user_id,
                    error = %e,
                    "counter-proposal failed after rejection, rejection is kept"
                );
            })
    }

    async fn load_proposal(&self, proposal_id: ProposalId) -> Result<Proposal> {
        self.proposals
            .get(proposal_id)
            .await?
            .ok_or(NegotiationError::NotFound(Entity::Proposal(proposal_id)))
    }

    async fn submit(
        &self,
        user: &User,
        item: &Item,
        submission: Submission,
        initial_proposal: Option<ProposalId>,
    ) -> Result<Proposal> {
        let Submission {
            message,
            is_percentage_based,
            payments,
        } = submission;

        validate_payments(&payments, item, is_percentage_based)
            .into_result()
            .inspect_err(|rejection| {
                debug!(item = %item.id, user = %user.id, %rejection, "payment split rejected");
            })?;

        // Ratios are built before an id is allocated, so a failed split
        // leaves the sequence untouched.
        let mut payment_ratios =
            build_ratios(ProposalId(0), &payments, is_percentage_based, item.price)?;
        let id = self.proposals.next_id().await?;
        for ratio in &mut payment_ratios {
            ratio.proposal = id;
        }

        let proposal = Proposal {
            id,
            item: item.id,
            created_at: Utc::now(),
            created_by: user.id,
            message: message.unwrap_or_default(),
            is_counter_proposal: initial_proposal.is_some(),
            initial_proposal,
            payment_ratios,
        };

        self.proposals.insert(proposal.clone()).await?;

        info!(
            proposal = %proposal.id,
            item = %item.id,
            user = %user.id,
            counter_of = ?proposal.initial_proposal.map(|id| id.0),
            "created proposal"
        );
        Ok(proposal)
    }
}

fn ensure_negotiable(item: &Item, user: &User) -> Result<()> {
    if !item.is_shared() {
        return Err(NegotiationError::InvalidState(StateViolation::ItemNotShared));
    }
    if !item.involves(user.party) {
        return Err(NegotiationError::InvalidState(
            StateViolation::PartyNotAssociated,
        ));
    }
    Ok(())
}
