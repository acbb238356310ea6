use super::item::ItemId;
use super::money::Money;
use super::party::{PartyId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(pub u64);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A payment ratio is identified by its proposal and party, since a proposal
/// names each party exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentRatioId {
    pub proposal: ProposalId,
    pub party: PartyId,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum RatioStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for RatioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RatioStatus::Pending => "Pending",
            RatioStatus::Accepted => "Accepted",
            RatioStatus::Rejected => "Rejected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl From<Decision> for RatioStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accept => RatioStatus::Accepted,
            Decision::Reject => RatioStatus::Rejected,
        }
    }
}

/// One party's share of the item price within a proposal.
///
/// `amount` is always absolute currency, even for percentage-based proposals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRatio {
    pub proposal: ProposalId,
    pub party: PartyId,
    pub amount: Money,
    pub status: RatioStatus,
    pub statused_by: Option<UserId>,
}

impl PaymentRatio {
    pub fn pending(proposal: ProposalId, party: PartyId, amount: Money) -> Self {
        Self {
            proposal,
            party,
            amount,
            status: RatioStatus::Pending,
            statused_by: None,
        }
    }

    pub fn id(&self) -> PaymentRatioId {
        PaymentRatioId {
            proposal: self.proposal,
            party: self.party,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RatioStatus::Pending
    }

    /// Moves a pending ratio to its final status. Decided ratios are left
    /// untouched and `false` is returned.
    pub fn decide(&mut self, status: RatioStatus, by: UserId) -> bool {
        if !self.is_pending() || status == RatioStatus::Pending {
            return false;
        }
        self.status = status;
        self.statused_by = Some(by);
        true
    }
}

/// A complete payment-split offer for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub item: ItemId,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
    pub message: String,
    pub is_counter_proposal: bool,
    /// The proposal this one counters. Points at whatever proposal the counter
    /// was submitted against, not at the newest proposal in the chain.
    pub initial_proposal: Option<ProposalId>,
    pub payment_ratios: Vec<PaymentRatio>,
}

impl Proposal {
    pub fn ratio_for(&self, party: PartyId) -> Option<&PaymentRatio> {
        self.payment_ratios.iter().find(|ratio| ratio.party == party)
    }

    pub fn ratio_for_mut(&mut self, party: PartyId) -> Option<&mut PaymentRatio> {
        self.payment_ratios
            .iter_mut()
            .find(|ratio| ratio.party == party)
    }

    pub fn total(&self) -> Money {
        self.payment_ratios.iter().map(|ratio| ratio.amount).sum()
    }
}

/// One entry of a submitted split, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub party: PartyId,
    pub amount: Option<Decimal>,
    pub percentage: Option<i32>,
}

impl PaymentRequest {
    pub fn amount(party: PartyId, amount: Decimal) -> Self {
        Self {
            party,
            amount: Some(amount),
            percentage: None,
        }
    }

    pub fn percentage(party: PartyId, percentage: i32) -> Self {
        Self {
            party,
            amount: None,
            percentage: Some(percentage),
        }
    }
}
