use crate::application::engine::{NegotiationEngine, Submission};
use crate::domain::item::ItemId;
use crate::domain::party::UserId;
use crate::domain::proposal::{Decision, ProposalId};
use crate::error::Result;

/// One negotiation step, as replayed from a command file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Propose {
        user: UserId,
        item: ItemId,
        submission: Submission,
    },
    Counter {
        user: UserId,
        proposal: ProposalId,
        submission: Submission,
    },
    Decide {
        user: UserId,
        proposal: ProposalId,
        decision: Decision,
    },
    RejectAndCounter {
        user: UserId,
        proposal: ProposalId,
        submission: Submission,
    },
}

impl Command {
    pub fn user(&self) -> UserId {
        match self {
            Command::Propose { user, .. }
            | Command::Counter { user, .. }
            | Command::Decide { user, .. }
            | Command::RejectAndCounter { user, .. } => *user,
        }
    }

    /// Runs the command against the engine. Returns the id of the proposal it
    /// created, if any.
    pub async fn run(self, engine: &NegotiationEngine) -> Result<Option<ProposalId>> {
        match self {
            Command::Propose {
                user,
                item,
                submission,
            } => engine
                .create_proposal(user, item, submission)
                .await
                .map(|p| Some(p.id)),
            Command::Counter {
                user,
                proposal,
                submission,
            } => engine
                .create_counter_proposal(user, proposal, submission)
                .await
                .map(|p| Some(p.id)),
            Command::Decide {
                user,
                proposal,
                decision,
            } => engine
                .decide_proposal(user, proposal, decision)
                .await
                .map(|()| None),
            Command::RejectAndCounter {
                user,
                proposal,
                submission,
            } => engine
                .reject_and_counter(user, proposal, submission)
                .await
                .map(|p| Some(p.id)),
        }
    }
}
