//! Postgres 연동 테스트
//! DATABASE_URL 이 일회용 데이터베이스를 가리킬 때만 실행: `cargo test -- --ignored`
use auction_lifecycle::auction::entity::{
    Auction, AuctionFilter, AuctionStatus, ProductCondition,
};
use auction_lifecycle::bidding::model::Bid;
use auction_lifecycle::database::{
    AuctionRepository, BidRepository, DatabaseManager, PostgresAuctionRepository,
    PostgresBidRepository,
};
use auction_lifecycle::error::AuctionError;
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::time::Duration as StdDuration;

const DAY: StdDuration = StdDuration::from_secs(24 * 60 * 60);

/// 데이터베이스 매니저 설정
async fn setup() -> Arc<DatabaseManager> {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db_manager = DatabaseManager::connect(&database_url, 5)
        .await
        .expect("Failed to create pool");
    db_manager
        .initialize_database()
        .await
        .expect("Failed to initialize schema");
    Arc::new(db_manager)
}

/// 테스트용 경매 생성 (created_at 을 과거로 이동)
async fn create_test_auction(
    repo: &PostgresAuctionRepository,
    product_name: &str,
    age: Duration,
) -> Auction {
    let mut auction = Auction::create(
        product_name,
        "integration",
        "Integration test auction item",
        ProductCondition::New,
    )
    .unwrap();
    auction.created_at = Utc::now() - age;
    repo.create(&auction).await.unwrap();
    auction
}

/// 만료 조회는 만료된 ACTIVE 경매만 반환
#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_find_active_expiring() {
    let repo = PostgresAuctionRepository::new(setup().await);
    let expired = create_test_auction(&repo, "만료 경매", Duration::hours(25)).await;
    let fresh = create_test_auction(&repo, "진행 경매", Duration::hours(1)).await;

    let found = repo.find_active_expiring(Utc::now(), DAY).await.unwrap();
    assert!(found.iter().any(|a| a.id == expired.id));
    assert!(found.iter().all(|a| a.id != fresh.id));
}

/// 상태 변경은 멱등이며 COMPLETED 를 되돌리지 않는다
#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_status_is_idempotent_and_monotonic() {
    let repo = PostgresAuctionRepository::new(setup().await);
    let auction = create_test_auction(&repo, "상태 변경 경매", Duration::hours(30)).await;

    assert!(repo
        .update_status(&auction.id, AuctionStatus::Completed)
        .await
        .unwrap());
    assert!(!repo
        .update_status(&auction.id, AuctionStatus::Completed)
        .await
        .unwrap());
    assert!(!repo
        .update_status(&auction.id, AuctionStatus::Active)
        .await
        .unwrap());
    assert!(!repo
        .update_status("no-such-auction", AuctionStatus::Completed)
        .await
        .unwrap());

    let stored = repo.find_by_id(&auction.id).await.unwrap();
    assert_eq!(stored.status, AuctionStatus::Completed);

    let completed = repo
        .find(&AuctionFilter {
            status: Some(AuctionStatus::Completed),
            category: Some("integration".to_string()),
            product_name: Some("상태 변경".to_string()),
        })
        .await
        .unwrap();
    assert!(completed.iter().any(|a| a.id == auction.id));
}

/// 종료된 경매에 대한 입찰은 저장 단계에서 거절
#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_bid_rejected_after_completion() {
    let db_manager = setup().await;
    let auctions = PostgresAuctionRepository::new(Arc::clone(&db_manager));
    let bids = PostgresBidRepository::new(db_manager);
    let auction = create_test_auction(&auctions, "입찰 경매", Duration::hours(2)).await;

    bids.create_bid(&Bid::create(&auction.id, "bidder-1", 1_000).unwrap())
        .await
        .unwrap();
    bids.create_bid(&Bid::create(&auction.id, "bidder-2", 3_000).unwrap())
        .await
        .unwrap();
    let winner = bids.find_winning_bid(&auction.id).await.unwrap().unwrap();
    assert_eq!(winner.bidder_id, "bidder-2");

    auctions
        .update_status(&auction.id, AuctionStatus::Completed)
        .await
        .unwrap();
    let err = bids
        .create_bid(&Bid::create(&auction.id, "bidder-3", 9_000).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::AuctionClosed(_)));
    assert_eq!(bids.find_bids_by_auction(&auction.id).await.unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_find_missing_auction() {
    let repo = PostgresAuctionRepository::new(setup().await);
    let err = repo.find_by_id("no-such-auction").await.unwrap_err();
    assert!(matches!(err, AuctionError::NotFound(_)));
}

/// 상품명 검색은 %, _ 를 와일드카드가 아닌 문자로 비교
#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_product_name_filter_is_literal() {
    let repo = PostgresAuctionRepository::new(setup().await);
    let plain = create_test_auction(&repo, "Plain Desk Lamp", Duration::hours(1)).await;
    let marked = create_test_auction(&repo, "Discount 50% off_cut", Duration::hours(1)).await;

    let filter = |name: &str| AuctionFilter {
        status: None,
        category: Some("integration".to_string()),
        product_name: Some(name.to_string()),
    };

    for wildcard in ["%", "_"] {
        let found = repo.find(&filter(wildcard)).await.unwrap();
        assert!(found.iter().all(|a| a.id != plain.id), "{wildcard} matched everything");
        assert!(found.iter().any(|a| a.id == marked.id));
    }

    let found = repo.find(&filter("desk lamp")).await.unwrap();
    assert!(found.iter().any(|a| a.id == plain.id));
}
