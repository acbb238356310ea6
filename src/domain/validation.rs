//! Payment-split validation against an item's price and party membership.

use super::item::Item;
use super::money::Money;
use super::proposal::PaymentRequest;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRejection {
    #[error("duplicate parties")]
    DuplicateParties,
    #[error("payment for unassociated party")]
    UnassociatedParty,
    #[error("missing payment for associated party")]
    MissingParty,
    #[error("missing percentage")]
    MissingPercentage,
    #[error("percentages do not sum to 100")]
    PercentagesNot100,
    #[error("missing amount")]
    MissingAmount,
    #[error("amounts do not match item price")]
    AmountsNotPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(PaymentRejection),
}

impl ValidationResult {
    pub fn into_result(self) -> Result<(), PaymentRejection> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid(rejection) => Err(rejection),
        }
    }
}

/// Checks a candidate split. Rules run in order and the first failure wins:
/// duplicates, membership, coverage of every item party, then percentage or
/// amount completeness and sum.
pub fn validate_payments(
    payments: &[PaymentRequest],
    item: &Item,
    is_percentage_based: bool,
) -> ValidationResult {
    match check(payments, item, is_percentage_based) {
        Ok(()) => ValidationResult::Valid,
        Err(rejection) => ValidationResult::Invalid(rejection),
    }
}

fn check(
    payments: &[PaymentRequest],
    item: &Item,
    is_percentage_based: bool,
) -> Result<(), PaymentRejection> {
    let mut seen = HashSet::with_capacity(payments.len());
    if !payments.iter().all(|payment| seen.insert(payment.party)) {
        return Err(PaymentRejection::DuplicateParties);
    }

    if payments.iter().any(|payment| !item.involves(payment.party)) {
        return Err(PaymentRejection::UnassociatedParty);
    }

    if item.parties.iter().any(|party| !seen.contains(party)) {
        return Err(PaymentRejection::MissingParty);
    }

    if is_percentage_based {
        let mut total: i64 = 0;
        for payment in payments {
            let percentage = payment
                .percentage
                .ok_or(PaymentRejection::MissingPercentage)?;
            total += i64::from(percentage);
        }
        if total != 100 {
            return Err(PaymentRejection::PercentagesNot100);
        }
    } else {
        let amounts = payments
            .iter()
            .map(|payment| payment.amount.map(Money::new))
            .collect::<Option<Vec<_>>>()
            .ok_or(PaymentRejection::MissingAmount)?;

        let total = amounts
            .into_iter()
            .try_fold(Money::ZERO, Money::checked_add);
        if total != Some(item.price) {
            return Err(PaymentRejection::AmountsNotPrice);
        }
    }

    Ok(())
}
