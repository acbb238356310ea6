use chrono::Utc;
use negotiator::application::engine::{NegotiationEngine, Submission};
use negotiator::domain::item::{Item, ItemId};
use negotiator::domain::money::Money;
use negotiator::domain::party::{Party, PartyId, User, UserId};
use negotiator::domain::ports::{Directory, DirectoryBox, ItemStore, ItemStoreBox, ProposalStore};
use negotiator::domain::proposal::{Decision, PaymentRequest, RatioStatus};
use negotiator::infrastructure::in_memory::{
    InMemoryDirectory, InMemoryItemStore, InMemoryProposalStore,
};
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn test_stores_as_trait_objects() {
    let directory: DirectoryBox = Box::new(InMemoryDirectory::new());
    let item_store: ItemStoreBox = Box::new(InMemoryItemStore::new());

    let item = Item {
        id: ItemId(1),
        name: "Boat".to_string(),
        created_at: Utc::now(),
        price: Money::new(dec!(100.00)),
        parties: vec![PartyId(1), PartyId(2)],
    };

    // Verify Send + Sync by spawning tasks
    let dir_handle = tokio::spawn(async move {
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
                name: "John Doe".to_string(),
                party: PartyId(1),
            })
            .await
            .unwrap();
        directory.user(UserId(1)).await.unwrap().unwrap()
    });

    let item_handle = tokio::spawn(async move {
        item_store.store(item).await.unwrap();
        item_store.get(ItemId(1)).await.unwrap().unwrap()
    });

    let user = dir_handle.await.unwrap();
    assert_eq!(user.party, PartyId(1));

    let item = item_handle.await.unwrap();
    assert!(item.is_shared());
}

#[tokio::test]
async fn test_engine_shared_across_tasks() {
    let directory = InMemoryDirectory::new();
    let items = InMemoryItemStore::new();
    let proposals = InMemoryProposalStore::new();

    for (id, name) in [(1, "Party A"), (2, "Party B")] {
        directory
            .store_party(Party {
                id: PartyId(id),
                name: name.to_string(),
            })
            .await
            .unwrap();
        directory
            .store_user(User {
                id: UserId(id),
                name: format!("User {id}"),
                party: PartyId(id),
            })
            .await
            .unwrap();
    }
    for id in 1..=8 {
        items
            .store(Item {
                id: ItemId(id),
                name: format!("Item {id}"),
                created_at: Utc::now(),
                price: Money::new(dec!(10.00)),
                parties: vec![PartyId(1), PartyId(2)],
            })
            .await
            .unwrap();
    }

    let engine = Arc::new(NegotiationEngine::new(
        Box::new(directory),
        Box::new(items),
        Box::new(proposals.clone()),
    ));

    let handles: Vec<_> = (1..=8)
        .map(|id| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                let submission = Submission {
                    message: None,
                    is_percentage_based: true,
                    payments: vec![
                        PaymentRequest::percentage(PartyId(1), 50),
                        PaymentRequest::percentage(PartyId(2), 50),
                    ],
                };
                let proposal = engine
                    .create_proposal(UserId(1), ItemId(id), submission)
                    .await
                    .unwrap();
                engine
                    .decide_proposal(UserId(2), proposal.id, Decision::Accept)
                    .await
                    .unwrap();
                proposal.id
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8, "proposal ids must be unique");

    let all = proposals.all().await.unwrap();
    assert_eq!(all.len(), 8);
    for proposal in all {
        let ratio = proposal.ratio_for(PartyId(2)).unwrap();
        assert_eq!(ratio.status, RatioStatus::Accepted);
        assert_eq!(proposal.total(), Money::new(dec!(10.00)));
    }
}
