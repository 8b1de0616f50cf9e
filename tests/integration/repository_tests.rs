//! SQLite repository tests
//!
//! Exercise the versioned write path against a real database file.

use chrono::Utc;
use tokio::task::JoinSet;
use uuid::Uuid;

use tender_api::{
    db::{
        self, BidFilter, BidRepository, OrganizationRepository, SqliteBidRepository,
        SqliteOrganizationRepository, SqliteTenderRepository, SqliteUserRepository, StoreError,
        TenderFilter, TenderRepository, UserRepository,
    },
    models::{
        BidAuthor, BidFeedback, BidStatus, Organization, OrganizationType, Page,
        TenderServiceType, TenderStatus, User,
    },
    DbPool,
};

use crate::common::{organization_bid, test_config, user_bid, TenderFactory};

struct Repos {
    pool: DbPool,
    tenders: SqliteTenderRepository,
    bids: SqliteBidRepository,
    users: SqliteUserRepository,
    organizations: SqliteOrganizationRepository,
    org: Organization,
    factory: TenderFactory,
}

async fn setup() -> Repos {
    setup_with_connections(1).await
}

async fn setup_with_connections(max_connections: u32) -> Repos {
    let mut config = test_config();
    config.database.max_connections = max_connections;
    let pool: DbPool = db::init_pool(&config.database)
        .await
        .expect("Failed to initialize test database");

    let organizations = SqliteOrganizationRepository::new(pool.clone());
    let org = Organization::new("Acme", OrganizationType::JSC);
    organizations.insert(&org).await.unwrap();

    Repos {
        pool: pool.clone(),
        tenders: SqliteTenderRepository::new(pool.clone()),
        bids: SqliteBidRepository::new(pool.clone()),
        users: SqliteUserRepository::new(pool.clone()),
        organizations,
        factory: TenderFactory::new(org.id, "alice"),
        org,
    }
}

#[tokio::test]
async fn test_tender_update_snapshots_previous_version() {
    let repos = setup().await;
    let tender = repos
        .tenders
        .create(&repos.factory.named("Road", TenderServiceType::Construction))
        .await
        .unwrap();

    let mut next = tender.clone();
    next.name = "Bridge".to_string();
    next.status = TenderStatus::Published;
    let updated = repos.tenders.update(&next).await.unwrap();

    assert_eq!(updated.version, 2);
    assert_eq!(updated.name, "Bridge");
    assert_eq!(
        updated.created_at.timestamp(),
        tender.created_at.timestamp()
    );

    let history = repos.tenders.history(tender.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].version, 1);
    assert_eq!(history[0].name, "Road");
    assert_eq!(history[0].status, TenderStatus::Created);
    assert_eq!(history[0].id, tender.id);

    let stored = repos.tenders.get_by_id(tender.id).await.unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.status, TenderStatus::Published);
}

#[tokio::test]
async fn test_tender_rollback_moves_version_forward() {
    let repos = setup().await;
    let tender = repos
        .tenders
        .create(&repos.factory.named("Road", TenderServiceType::Construction))
        .await
        .unwrap();

    let mut next = tender.clone();
    next.name = "Bridge".to_string();
    next.service_type = TenderServiceType::Delivery;
    repos.tenders.update(&next).await.unwrap();

    let restored = repos.tenders.rollback_to_version(tender.id, 1).await.unwrap();
    assert_eq!(restored.version, 3);
    assert_eq!(restored.name, "Road");
    assert_eq!(restored.service_type, TenderServiceType::Construction);

    let versions: Vec<i32> = repos
        .tenders
        .history(tender.id)
        .await
        .unwrap()
        .iter()
        .map(|t| t.version)
        .collect();
    assert_eq!(versions, vec![1, 2]);

    // Rolling back to the restored state again still moves forward
    let again = repos.tenders.rollback_to_version(tender.id, 2).await.unwrap();
    assert_eq!(again.version, 4);
    assert_eq!(again.name, "Bridge");
}

#[tokio::test]
async fn test_failed_update_leaves_no_snapshot() {
    let repos = setup().await;
    let tender = repos
        .tenders
        .create(&repos.factory.named("Road", TenderServiceType::Construction))
        .await
        .unwrap();

    sqlx::query(
        "CREATE TRIGGER reject_tender_update BEFORE UPDATE ON tender \
         BEGIN SELECT RAISE(ABORT, 'tender updates disabled'); END",
    )
    .execute(&repos.pool)
    .await
    .unwrap();

    let mut next = tender.clone();
    next.name = "Bridge".to_string();
    assert!(matches!(
        repos.tenders.update(&next).await,
        Err(StoreError::Storage(_))
    ));
    assert!(matches!(
        repos.tenders.rollback_to_version(tender.id, 1).await,
        Err(StoreError::VersionNotFound(1))
    ));
    assert!(repos.tenders.history(tender.id).await.unwrap().is_empty());
    let stored = repos.tenders.get_by_id(tender.id).await.unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.name, "Road");

    sqlx::query("DROP TRIGGER reject_tender_update")
        .execute(&repos.pool)
        .await
        .unwrap();
    let updated = repos.tenders.update(&next).await.unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(repos.tenders.history(tender.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_feedback_leaves_no_snapshot() {
    let repos = setup().await;
    let tender = repos
        .tenders
        .create(&repos.factory.build(TenderServiceType::Construction))
        .await
        .unwrap();
    let bid = repos.bids.create(&user_bid(tender.id, "carol")).await.unwrap();

    sqlx::query(
        "CREATE TRIGGER reject_bid_update BEFORE UPDATE ON bid \
         BEGIN SELECT RAISE(ABORT, 'bid updates disabled'); END",
    )
    .execute(&repos.pool)
    .await
    .unwrap();

    let feedback = BidFeedback::new(bid.id, "alice", "Too expensive", Utc::now());
    assert!(matches!(
        repos.bids.add_feedback(&feedback).await,
        Err(StoreError::Storage(_))
    ));
    assert!(repos.bids.history(bid.id).await.unwrap().is_empty());
    assert!(repos
        .bids
        .list_feedback(bid.id, Page::new(10, 0))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(repos.bids.get_by_id(bid.id).await.unwrap().version, 1);
}

#[tokio::test]
async fn test_concurrent_updates_of_one_tender_all_land() {
    let repos = setup_with_connections(8).await;
    let tender = repos
        .tenders
        .create(&repos.factory.named("Road", TenderServiceType::Construction))
        .await
        .unwrap();

    let mut tasks = JoinSet::new();
    for i in 0..16 {
        let tenders = repos.tenders.clone();
        let mut next = tender.clone();
        next.name = format!("Edit {i}");
        tasks.spawn(async move { tenders.update(&next).await });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().expect("concurrent update failed");
    }

    // Last write wins, every intermediate state is kept
    let stored = repos.tenders.get_by_id(tender.id).await.unwrap();
    assert_eq!(stored.version, 17);
    let versions: Vec<i32> = repos
        .tenders
        .history(tender.id)
        .await
        .unwrap()
        .iter()
        .map(|t| t.version)
        .collect();
    assert_eq!(versions, (1..=16).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_concurrent_writes_to_different_rows() {
    let repos = setup_with_connections(8).await;
    let mut tenders = Vec::new();
    for i in 0..8 {
        tenders.push(
            repos
                .tenders
                .create(&repos.factory.named(&format!("Lot {i}"), TenderServiceType::Delivery))
                .await
                .unwrap(),
        );
    }
    let bid = repos
        .bids
        .create(&organization_bid(tenders[0].id, repos.org.id, "bob"))
        .await
        .unwrap();

    let mut tasks = JoinSet::new();
    for tender in &tenders {
        let store = repos.tenders.clone();
        let mut next = tender.clone();
        next.status = TenderStatus::Published;
        tasks.spawn(async move { store.update(&next).await.map(|_| ()) });
    }
    for i in 0..4 {
        let bids = repos.bids.clone();
        let feedback = BidFeedback::new(
            bid.id,
            "alice",
            &format!("Review {i}"),
            Utc::now() + chrono::Duration::seconds(i),
        );
        tasks.spawn(async move { bids.add_feedback(&feedback).await.map(|_| ()) });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().expect("concurrent write failed");
    }

    for tender in &tenders {
        let stored = repos.tenders.get_by_id(tender.id).await.unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.status, TenderStatus::Published);
    }
    assert_eq!(repos.bids.get_by_id(bid.id).await.unwrap().version, 5);
    assert_eq!(repos.bids.history(bid.id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_tender_missing_rows() {
    let repos = setup().await;
    let tender = repos
        .tenders
        .create(&repos.factory.build(TenderServiceType::Manufacture))
        .await
        .unwrap();

    assert!(matches!(
        repos.tenders.rollback_to_version(tender.id, 5).await,
        Err(StoreError::VersionNotFound(5))
    ));
    assert!(matches!(
        repos.tenders.get_by_id(Uuid::new_v4()).await,
        Err(StoreError::NotFound)
    ));

    let mut ghost = tender.clone();
    ghost.id = Uuid::new_v4();
    assert!(matches!(
        repos.tenders.update(&ghost).await,
        Err(StoreError::NotFound)
    ));
    assert!(repos.tenders.history(ghost.id).await.unwrap().is_empty());
    assert_eq!(repos.tenders.get_by_id(tender.id).await.unwrap().version, 1);
}

#[tokio::test]
async fn test_tender_list_filters_orders_and_pages() {
    let repos = setup().await;
    for (name, kind) in [
        ("Delta", TenderServiceType::Delivery),
        ("Alpha", TenderServiceType::Construction),
        ("Charlie", TenderServiceType::Manufacture),
        ("Bravo", TenderServiceType::Construction),
    ] {
        repos
            .tenders
            .create(&repos.factory.named(name, kind))
            .await
            .unwrap();
    }
    let other = TenderFactory::new(repos.org.id, "bob");
    repos
        .tenders
        .create(&other.named("Echo", TenderServiceType::Delivery))
        .await
        .unwrap();

    let names = |tenders: Vec<tender_api::models::Tender>| {
        tenders.into_iter().map(|t| t.name).collect::<Vec<_>>()
    };

    let all = repos
        .tenders
        .list(&TenderFilter::default(), Page::new(10, 0))
        .await
        .unwrap();
    assert_eq!(names(all), vec!["Alpha", "Bravo", "Charlie", "Delta", "Echo"]);

    let filtered = repos
        .tenders
        .list(
            &TenderFilter::by_service_types(vec![
                TenderServiceType::Construction,
                TenderServiceType::Delivery,
            ]),
            Page::new(10, 0),
        )
        .await
        .unwrap();
    assert_eq!(names(filtered), vec!["Alpha", "Bravo", "Delta", "Echo"]);

    let page = repos
        .tenders
        .list(&TenderFilter::default(), Page::new(2, 3))
        .await
        .unwrap();
    assert_eq!(names(page), vec!["Delta", "Echo"]);

    let bobs = repos
        .tenders
        .list(&TenderFilter::by_creator("bob"), Page::new(10, 0))
        .await
        .unwrap();
    assert_eq!(names(bobs), vec!["Echo"]);
}

#[tokio::test]
async fn test_bid_authors_round_trip() {
    let repos = setup().await;
    let tender = repos
        .tenders
        .create(&repos.factory.build(TenderServiceType::Construction))
        .await
        .unwrap();

    let org_bid = repos
        .bids
        .create(&organization_bid(tender.id, repos.org.id, "bob"))
        .await
        .unwrap();
    let solo = repos.bids.create(&user_bid(tender.id, "carol")).await.unwrap();

    let stored = repos.bids.get_by_id(org_bid.id).await.unwrap();
    assert_eq!(stored.author, BidAuthor::Organization(repos.org.id));
    assert_eq!(stored.status, BidStatus::Created);

    let stored = repos.bids.get_by_id(solo.id).await.unwrap();
    assert_eq!(stored.author, BidAuthor::User("carol".to_string()));

    let on_tender = repos
        .bids
        .list(&BidFilter::by_tender(tender.id), Page::new(10, 0))
        .await
        .unwrap();
    assert_eq!(on_tender.len(), 2);

    let carols = repos
        .bids
        .list(&BidFilter::by_creator("carol"), Page::new(10, 0))
        .await
        .unwrap();
    assert_eq!(carols.len(), 1);
    assert_eq!(carols[0].id, solo.id);
}

#[tokio::test]
async fn test_bid_feedback_bumps_version_in_one_transaction() {
    let repos = setup().await;
    let tender = repos
        .tenders
        .create(&repos.factory.build(TenderServiceType::Construction))
        .await
        .unwrap();
    let bid = repos
        .bids
        .create(&organization_bid(tender.id, repos.org.id, "bob"))
        .await
        .unwrap();

    let first = BidFeedback::new(bid.id, "alice", "Too expensive", Utc::now());
    let after = repos.bids.add_feedback(&first).await.unwrap();
    assert_eq!(after.version, 2);
    assert_eq!(after.name, bid.name);

    let second = BidFeedback::new(
        bid.id,
        "alice",
        "Still too expensive",
        Utc::now() + chrono::Duration::seconds(1),
    );
    repos.bids.add_feedback(&second).await.unwrap();

    let history = repos.bids.history(bid.id).await.unwrap();
    assert_eq!(history.iter().map(|b| b.version).collect::<Vec<_>>(), vec![1, 2]);

    let feedback = repos
        .bids
        .list_feedback(bid.id, Page::new(10, 0))
        .await
        .unwrap();
    assert_eq!(feedback.len(), 2);
    assert_eq!(feedback[0].review, "Still too expensive");
    assert_eq!(feedback[1].review, "Too expensive");

    // Feedback on a missing bid writes nothing
    let orphan = BidFeedback::new(Uuid::new_v4(), "alice", "Hello", Utc::now());
    assert!(matches!(
        repos.bids.add_feedback(&orphan).await,
        Err(StoreError::NotFound)
    ));
    assert!(repos
        .bids
        .list_feedback(orphan.bid_id, Page::new(10, 0))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_bid_rollback_restores_status() {
    let repos = setup().await;
    let tender = repos
        .tenders
        .create(&repos.factory.build(TenderServiceType::Delivery))
        .await
        .unwrap();
    let bid = repos.bids.create(&user_bid(tender.id, "carol")).await.unwrap();

    let mut next = bid.clone();
    next.status = BidStatus::Published;
    next.description = "Revised".to_string();
    repos.bids.update(&next).await.unwrap();

    let restored = repos.bids.rollback_to_version(bid.id, 1).await.unwrap();
    assert_eq!(restored.version, 3);
    assert_eq!(restored.status, BidStatus::Created);
    assert_eq!(restored.description, bid.description);
}

#[tokio::test]
async fn test_users_and_responsibility() {
    let repos = setup().await;
    let alice = User::new("alice").with_name("Alice", "Smith");
    let bob = User::new("bob");
    repos.users.insert(&alice).await.unwrap();
    repos.users.insert(&bob).await.unwrap();
    repos
        .organizations
        .add_responsible(repos.org.id, alice.id)
        .await
        .unwrap();

    let stored = repos.users.get_by_username("alice").await.unwrap();
    assert_eq!(stored.id, alice.id);
    assert_eq!(stored.first_name.as_deref(), Some("Alice"));
    assert!(matches!(
        repos.users.get_by_username("mallory").await,
        Err(StoreError::NotFound)
    ));

    assert!(repos
        .organizations
        .is_responsible(repos.org.id, "alice")
        .await
        .unwrap());
    assert!(!repos
        .organizations
        .is_responsible(repos.org.id, "bob")
        .await
        .unwrap());
    assert!(!repos
        .organizations
        .is_responsible(repos.org.id, "mallory")
        .await
        .unwrap());

    let tender = repos
        .tenders
        .create(&repos.factory.build(TenderServiceType::Construction))
        .await
        .unwrap();
    assert!(repos
        .organizations
        .is_responsible_for_tender(tender.id, "alice")
        .await
        .unwrap());
    assert!(!repos
        .organizations
        .is_responsible_for_tender(Uuid::new_v4(), "alice")
        .await
        .unwrap());

    let org = repos.organizations.get_by_id(repos.org.id).await.unwrap();
    assert_eq!(org.organization_type, OrganizationType::JSC);
}
