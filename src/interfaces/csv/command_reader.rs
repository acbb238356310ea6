use crate::application::engine::Submission;
use crate::domain::item::ItemId;
use crate::domain::party::{PartyId, UserId};
use crate::domain::proposal::{Decision, PaymentRequest, ProposalId};
use crate::error::{InputError, NegotiationError, Result};
use crate::interfaces::command::Command;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum CommandKind {
    Propose,
    Counter,
    Accept,
    Reject,
    RejectCounter,
}

/// A raw row of the command file:
/// `command, user, item, proposal, percentage_based, payments, message`.
#[derive(Debug, Deserialize)]
struct CommandRecord {
    command: CommandKind,
    user: u32,
    item: Option<u32>,
    proposal: Option<u64>,
    percentage_based: Option<bool>,
    payments: Option<String>,
    message: Option<String>,
}

fn malformed(reason: impl Into<String>) -> NegotiationError {
    NegotiationError::InvalidInput(InputError::Command(reason.into()))
}

/// Parses `party=value` pairs separated by `;`, e.g. `1=600.00;2=400.00`.
/// Values are whole percentages when `is_percentage_based`, amounts otherwise.
pub fn parse_payments(field: &str, is_percentage_based: bool) -> Result<Vec<PaymentRequest>> {
    field
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| -> Result<PaymentRequest> {
            let (party, value) = pair
                .split_once('=')
                .ok_or_else(|| malformed(format!("payment `{pair}` is not party=value")))?;
            let party = party
                .trim()
                .parse::<u32>()
                .map(PartyId)
                .map_err(|_| malformed(format!("invalid party id in `{pair}`")))?;
            let value = value.trim();
            if is_percentage_based {
                let percentage = value
                    .parse::<i32>()
                    .map_err(|_| malformed(format!("invalid percentage in `{pair}`")))?;
                Ok(PaymentRequest::percentage(party, percentage))
            } else {
                let amount = Decimal::from_str(value)
                    .map_err(|_| malformed(format!("invalid amount in `{pair}`")))?;
                Ok(PaymentRequest::amount(party, amount))
            }
        })
        .collect()
}

impl TryFrom<CommandRecord> for Command {
    type Error = NegotiationError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        let user = UserId(record.user);
        let proposal = || {
            record
                .proposal
                .map(ProposalId)
                .ok_or_else(|| malformed("missing proposal id"))
        };
        let submission = || -> Result<Submission> {
            let is_percentage_based = record.percentage_based.unwrap_or(false);
            let payments = parse_payments(
                record.payments.as_deref().unwrap_or_default(),
                is_percentage_based,
            )?;
            Ok(Submission {
                message: record.message.clone(),
                is_percentage_based,
                payments,
            })
        };

        Ok(match record.command {
            CommandKind::Propose => Command::Propose {
                user,
                item: record
                    .item
                    .map(ItemId)
                    .ok_or_else(|| malformed("missing item id"))?,
                submission: submission()?,
            },
            CommandKind::Counter => Command::Counter {
                user,
                proposal: proposal()?,
                submission: submission()?,
            },
            CommandKind::Accept => Command::Decide {
                user,
                proposal: proposal()?,
                decision: Decision::Accept,
            },
            CommandKind::Reject => Command::Decide {
                user,
                proposal: proposal()?,
                decision: Decision::Reject,
            },
            CommandKind::RejectCounter => Command::RejectAndCounter {
                user,
                proposal: proposal()?,
                submission: submission()?,
            },
        })
    }
}

/// Reads negotiation commands from a CSV source.
///
/// Whitespace around fields is trimmed and short rows are accepted, so
/// `accept, 2, , 1` is a complete line.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and converts rows. A bad row yields an error and the
    /// iterator carries on with the next one.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader.into_deserialize().map(|result| -> Result<Command> {
            let record: CommandRecord = result?;
            Command::try_from(record)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "command, user, item, proposal, percentage_based, payments, message\n";

    fn read(rows: &str) -> Vec<Result<Command>> {
        let data = format!("{HEADER}{rows}");
        CommandReader::new(data.as_bytes()).commands().collect()
    }

    #[test]
    fn test_reader_valid_stream() {
        let results = read(
            "propose, 1, 1, , false, 1=600.00;2=400.00, opening\n\
             accept, 2, , 1\n\
             reject_counter, 2, , 1, true, 1=70;2=30, too much\n",
        );
        assert_eq!(results.len(), 3);

        let Command::Propose {
            user,
            item,
            submission,
        } = results[0].as_ref().unwrap()
        else {
            panic!("expected a proposal");
        };
        assert_eq!(*user, UserId(1));
        assert_eq!(*item, ItemId(1));
        assert_eq!(submission.message.as_deref(), Some("opening"));
        assert_eq!(
            submission.payments,
            vec![
                PaymentRequest::amount(PartyId(1), dec!(600.00)),
                PaymentRequest::amount(PartyId(2), dec!(400.00)),
            ]
        );

        assert_eq!(
            results[1].as_ref().unwrap(),
            &Command::Decide {
                user: UserId(2),
                proposal: ProposalId(1),
                decision: Decision::Accept,
            }
        );

        let Command::RejectAndCounter { submission, .. } = results[2].as_ref().unwrap() else {
            panic!("expected reject_counter");
        };
        assert!(submission.is_percentage_based);
        assert_eq!(submission.payments[0], PaymentRequest::percentage(PartyId(1), 70));
    }

    #[test]
    fn test_reader_malformed_lines() {
        let results = read(
            "haggle, 1, 1, , false, 1=1, x\n\
             propose, 1, , , false, 1=1, x\n\
             counter, 1, 1, , false, 1=1, x\n\
             propose, 1, 1, , false, 1:600, x\n\
             propose, 1, 1, , false, 1=lots, x\n\
             accept, 2, , 1\n",
        );
        assert_eq!(results.len(), 6);
        assert!(results[..5].iter().all(|r| r.is_err()));
        assert!(matches!(
            results[2],
            Err(NegotiationError::InvalidInput(InputError::Command(_)))
        ));
        assert!(results[5].is_ok());
    }

    #[test]
    fn test_parse_payments_skips_empty_pairs() {
        let payments = parse_payments(" 1 = 50 ; ;2=50;", true).unwrap();
        assert_eq!(
            payments,
            vec![
                PaymentRequest::percentage(PartyId(1), 50),
                PaymentRequest::percentage(PartyId(2), 50),
            ]
        );
        assert!(parse_payments("", false).unwrap().is_empty());
    }
}
