use super::money::Money;
use super::proposal::{PaymentRatio, PaymentRequest, ProposalId};
use super::validation::PaymentRejection;

/// Turns a validated split into pending payment ratios for `proposal`,
/// preserving the order the payments were given in.
///
/// Percentages are converted to absolute amounts of `item_price` with exact
/// decimal arithmetic. The error cases are unreachable for input that passed
/// [`validate_payments`](super::validation::validate_payments) except for
/// decimal overflow on absurdly large prices.
pub fn build_ratios(
    proposal: ProposalId,
    payments: &[PaymentRequest],
    is_percentage_based: bool,
    item_price: Money,
) -> Result<Vec<PaymentRatio>, PaymentRejection> {
    payments
        .iter()
        .map(|payment| {
            let amount = if is_percentage_based {
                let percentage = payment
                    .percentage
                    .ok_or(PaymentRejection::MissingPercentage)?;
                item_price
                    .percent(percentage)
                    .ok_or(PaymentRejection::AmountsNotPrice)?
            } else {
                payment
                    .amount
                    .map(Money::new)
                    .ok_or(PaymentRejection::MissingAmount)?
            };
            Ok(PaymentRatio::pending(proposal, payment.party, amount))
        })
        .collect()
}
