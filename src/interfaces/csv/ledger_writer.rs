use crate::domain::proposal::Proposal;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct LedgerRow {
    proposal: u64,
    item: u32,
    counter_of: Option<u64>,
    party: u32,
    amount: String,
    status: String,
    statused_by: Option<u32>,
}

/// Writes one CSV row per payment ratio, in the order the proposals are given.
///
/// Amounts are normalized, so `500.0000` is written as `500`.
pub struct LedgerWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LedgerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_proposals(&mut self, proposals: impl IntoIterator<Item = Proposal>) -> Result<()> {
        let mut wrote_any = false;
        for proposal in proposals {
            for ratio in &proposal.payment_ratios {
                self.writer.serialize(LedgerRow {
                    proposal: proposal.id.0,
                    item: proposal.item.0,
                    counter_of: proposal.initial_proposal.map(|id| id.0),
                    party: ratio.party.0,
                    amount: ratio.amount.to_string(),
                    status: ratio.status.to_string(),
                    statused_by: ratio.statused_by.map(|id| id.0),
                })?;
                wrote_any = true;
            }
        }
        if !wrote_any {
            // serialize() emits the header with the first row only.
            self.writer.write_record([
                "proposal",
                "item",
                "counter_of",
                "party",
                "amount",
                "status",
                "statused_by",
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
