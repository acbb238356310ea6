use super::resolve_identity;
use crate::domain::item::{Item, ItemId};
use crate::domain::money::Money;
use crate::domain::party::UserId;
use crate::domain::ports::{DirectoryBox, ItemStoreBox};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::convert::Infallible;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub item_id: ItemId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub price: Money,
    pub is_shared: bool,
}

impl From<&Item> for ItemView {
    fn from(item: &Item) -> Self {
        Self {
            item_id: item.id,
            name: item.name.clone(),
            created_at: item.created_at,
            price: item.price,
            is_shared: item.is_shared(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    Id,
    Name,
    Date,
    Price,
}

/// Unknown columns sort by id.
impl FromStr for SortColumn {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "name" => SortColumn::Name,
            "date" => SortColumn::Date,
            "price" => SortColumn::Price,
            _ => SortColumn::Id,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Anything but `desc` sorts ascending.
impl FromStr for SortOrder {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        })
    }
}

/// Filters for item listings. Every filter is optional; date bounds are
/// inclusive and the name filter is a case-sensitive substring match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_shared: Option<bool>,
    pub sort: SortColumn,
    pub order: SortOrder,
}

impl ItemQuery {
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(name) = self.name.as_deref().filter(|name| !name.trim().is_empty())
            && !item.name.contains(name)
        {
            return false;
        }
        if self.start_date.is_some_and(|start| item.created_at < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| item.created_at > end) {
            return false;
        }
        // Items without any party are neither shared nor solo.
        match self.is_shared {
            None => true,
            Some(true) => item.is_shared(),
            Some(false) => item.party_count() == 1,
        }
    }

    pub fn apply<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> Vec<ItemView> {
        let mut selected: Vec<&Item> = items.into_iter().filter(|i| self.matches(i)).collect();
        selected.sort_by(|a, b| {
            let ordering = match self.sort {
                SortColumn::Id => a.id.cmp(&b.id),
                SortColumn::Name => a.name.cmp(&b.name),
                SortColumn::Date => a.created_at.cmp(&b.created_at),
                SortColumn::Price => a.price.cmp(&b.price),
            };
            match self.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        selected.into_iter().map(ItemView::from).collect()
    }
}

/// Item listings for browsing, independent of any negotiation.
pub struct ItemCatalog {
    directory: DirectoryBox,
    items: ItemStoreBox,
}

impl ItemCatalog {
    pub fn new(directory: DirectoryBox, items: ItemStoreBox) -> Self {
        Self { directory, items }
    }

    /// Items the viewer's party is associated with, by id.
    pub async fn party_items(&self, viewer: UserId) -> Result<Vec<ItemView>> {
        let viewer = resolve_identity(self.directory.as_ref(), viewer).await?;
        let items = self.items.all().await?;
        let mut views: Vec<ItemView> = items
            .iter()
            .filter(|item| item.involves(viewer.party))
            .map(ItemView::from)
            .collect();
        views.sort_by_key(|view| view.item_id);
        Ok(views)
    }

    pub async fn items(&self, query: &ItemQuery) -> Result<Vec<ItemView>> {
        let items = self.items.all().await?;
        Ok(query.apply(&items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::party::{Party, PartyId, User};
    use crate::domain::ports::{Directory, ItemStore};
    use crate::error::NegotiationError;
    use crate::infrastructure::in_memory::{InMemoryDirectory, InMemoryItemStore};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, d, 12, 0, 0).unwrap()
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                id: ItemId(1),
                name: "Item 1".to_string(),
                created_at: day(8),
                price: Money::new(dec!(1000.00)),
                parties: vec![PartyId(1), PartyId(2)],
            },
            Item {
                id: ItemId(2),
                name: "Item 2".to_string(),
                created_at: day(13),
                price: Money::new(dec!(2000.00)),
                parties: vec![PartyId(2), PartyId(3)],
            },
            Item {
                id: ItemId(3),
                name: "Lamp".to_string(),
                created_at: day(16),
                price: Money::new(dec!(500.00)),
                parties: vec![PartyId(1)],
            },
        ]
    }

    fn ids(views: &[ItemView]) -> Vec<u32> {
        views.iter().map(|v| v.item_id.0).collect()
    }

    #[test]
    fn test_query_filters() {
        let items = items();

        let by_name = ItemQuery {
            name: Some("Item".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&by_name.apply(&items)), vec![1, 2]);

        let shared = ItemQuery {
            is_shared: Some(true),
            ..Default::default()
        };
        assert_eq!(ids(&shared.apply(&items)), vec![1, 2]);

        let solo = ItemQuery {
            is_shared: Some(false),
            ..Default::default()
        };
        let views = solo.apply(&items);
        assert_eq!(ids(&views), vec![3]);
        assert!(!views[0].is_shared);

        let window = ItemQuery {
            start_date: Some(day(13)),
            end_date: Some(day(16) - Duration::seconds(1)),
            ..Default::default()
        };
        assert_eq!(ids(&window.apply(&items)), vec![2]);
    }

    #[test]
    fn test_solo_filter_needs_exactly_one_party() {
        let mut items = items();
        items.push(Item {
            id: ItemId(4),
            name: "Orphan".to_string(),
            created_at: day(17),
            price: Money::new(dec!(10.00)),
            parties: vec![],
        });
        items.push(Item {
            id: ItemId(5),
            name: "Repeated".to_string(),
            created_at: day(18),
            price: Money::new(dec!(10.00)),
            parties: vec![PartyId(2), PartyId(2)],
        });

        let solo = ItemQuery {
            is_shared: Some(false),
            ..Default::default()
        };
        assert_eq!(ids(&solo.apply(&items)), vec![3, 5]);

        let shared = ItemQuery {
            is_shared: Some(true),
            ..Default::default()
        };
        assert_eq!(ids(&shared.apply(&items)), vec![1, 2]);
    }

    #[test]
    fn test_query_sorting() {
        let items = items();

        let by_price_desc = ItemQuery {
            sort: "PRICE".parse().unwrap(),
            order: "desc".parse().unwrap(),
            ..Default::default()
        };
        assert_eq!(ids(&by_price_desc.apply(&items)), vec![2, 1, 3]);

        let by_name = ItemQuery {
            sort: "name".parse().unwrap(),
            order: "sideways".parse().unwrap(),
            ..Default::default()
        };
        assert_eq!(ids(&by_name.apply(&items)), vec![1, 2, 3]);

        let unknown: SortColumn = "colour".parse().unwrap();
        assert_eq!(unknown, SortColumn::Id);
    }

    #[tokio::test]
    async fn test_party_items() {
        let directory = InMemoryDirectory::new();
        directory
            .store_party(Party {
                id: PartyId(1),
                name: "Party A".to_string(),
            })
            .await
            .unwrap();
        directory
            .store_user(User {
                id: UserId(1),
                name: "Alice".to_string(),
                party: PartyId(1),
            })
            .await
            .unwrap();
        let store = InMemoryItemStore::new();
        for item in items() {
            store.store(item).await.unwrap();
        }

        let catalog = ItemCatalog::new(Box::new(directory), Box::new(store));
        let views = catalog.party_items(UserId(1)).await.unwrap();
        assert_eq!(ids(&views), vec![1, 3]);
        assert!(views[0].is_shared);

        assert!(matches!(
            catalog.party_items(UserId(2)).await,
            Err(NegotiationError::Unauthenticated)
        ));

        let all = catalog.items(&ItemQuery::default()).await.unwrap();
        assert_eq!(ids(&all), vec![1, 2, 3]);
    }
}
