use crate::domain::item::Item;
use crate::domain::party::{Party, User};
use crate::domain::ports::{Directory, ItemStore};
use crate::error::Result;
use serde::Deserialize;
use std::io::Read;

/// Parties, users and items to seed the stores with before negotiating.
///
/// ```json
/// {
///   "parties": [{ "id": 1, "name": "Party A" }],
///   "users": [{ "id": 1, "name": "John Doe", "party": 1 }],
///   "items": [{ "id": 1, "name": "Item 1", "created_at": "2025-01-08T16:10:16Z",
///               "price": "1000.00", "parties": [1, 2] }]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub parties: Vec<Party>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Fixture {
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }

    /// Writes every record into the stores. Existing records with the same id
    /// are replaced.
    pub async fn load_into(&self, directory: &dyn Directory, items: &dyn ItemStore) -> Result<()> {
        for party in &self.parties {
            directory.store_party(party.clone()).await?;
        }
        for user in &self.users {
            directory.store_user(user.clone()).await?;
        }
        for item in &self.items {
            items.store(item.clone()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::ItemId;
    use crate::domain::money::Money;
    use crate::domain::party::{PartyId, UserId};
    use crate::infrastructure::in_memory::{InMemoryDirectory, InMemoryItemStore};
    use rust_decimal_macros::dec;

    const FIXTURE: &str = r#"{
        "parties": [{ "id": 1, "name": "Party A" }, { "id": 2, "name": "Party B" }],
        "users": [{ "id": 7, "name": "John Doe", "party": 1 }],
        "items": [{
            "id": 3, "name": "Item 1", "created_at": "2025-01-08T16:10:16Z",
            "price": "1000.00", "parties": [1, 2]
        }]
    }"#;

    #[tokio::test]
    async fn test_fixture_loads_into_stores() {
        let fixture = Fixture::from_reader(FIXTURE.as_bytes()).unwrap();
        let directory = InMemoryDirectory::new();
        let items = InMemoryItemStore::new();
        fixture.load_into(&directory, &items).await.unwrap();

        let user = directory.user(UserId(7)).await.unwrap().unwrap();
        assert_eq!(user.party, PartyId(1));
        assert_eq!(directory.party(PartyId(2)).await.unwrap().unwrap().name, "Party B");

        let item = items.get(ItemId(3)).await.unwrap().unwrap();
        assert_eq!(item.price, Money::new(dec!(1000.00)));
        assert!(item.is_shared());
    }

    #[test]
    fn test_fixture_rejects_bad_json() {
        assert!(Fixture::from_reader("{ \"items\": [ { \"id\": ".as_bytes()).is_err());
        let empty = Fixture::from_reader("{}".as_bytes()).unwrap();
        assert!(empty.items.is_empty());
    }
}
