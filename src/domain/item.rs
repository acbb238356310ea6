use super::money::Money;
use super::party::PartyId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The good or expense being negotiated.
///
/// The price is assumed immutable once proposals exist for the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub price: Money,
    pub parties: Vec<PartyId>,
}

impl Item {
    /// Distinct parties associated with the item. Repeated ids count once.
    pub fn party_count(&self) -> usize {
        self.parties.iter().collect::<HashSet<_>>().len()
    }

    /// An item is shared when more than one party is associated with it.
    pub fn is_shared(&self) -> bool {
        self.party_count() > 1
    }

    pub fn involves(&self, party: PartyId) -> bool {
        self.parties.contains(&party)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(parties: Vec<u32>) -> Item {
        Item {
            id: ItemId(1),
            name: "Sofa".to_string(),
            created_at: Utc::now(),
            price: Money::new(dec!(1000.00)),
            parties: parties.into_iter().map(PartyId).collect(),
        }
    }

    #[test]
    fn test_is_shared() {
        assert!(!item(vec![]).is_shared());
        assert!(!item(vec![1]).is_shared());
        assert!(item(vec![1, 2]).is_shared());
    }

    #[test]
    fn test_repeated_party_is_not_shared() {
        let item = item(vec![1, 1]);
        assert_eq!(item.party_count(), 1);
        assert!(!item.is_shared());
    }

    #[test]
    fn test_involves() {
        let item = item(vec![1, 2]);
        assert!(item.involves(PartyId(2)));
        assert!(!item.involves(PartyId(3)));
    }
}
