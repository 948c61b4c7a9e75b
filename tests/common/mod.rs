#![allow(dead_code)]

use async_trait::async_trait;
use auction_lifecycle::auction::entity::{
    Auction, AuctionFilter, AuctionStatus, ProductCondition,
};
use auction_lifecycle::auction::events::AuctionEvent;
use auction_lifecycle::bidding::model::Bid;
use auction_lifecycle::config::{RetryPolicy, SweeperConfig};
use auction_lifecycle::database::{AuctionRepository, BidRepository};
use auction_lifecycle::error::AuctionError;
use auction_lifecycle::message_broker::EventPublisher;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// 테스트용 스위퍼 설정 (짧은 주기)
pub fn fast_sweeper_config() -> SweeperConfig {
    SweeperConfig {
        auction_duration: DAY,
        interval: Duration::from_millis(20),
        fetch_retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(20),
        },
    }
}

/// created_at 이 now - age 인 ACTIVE 경매
pub fn auction_aged(id: &str, age: ChronoDuration) -> Auction {
    Auction {
        id: id.to_string(),
        product_name: format!("Product {id}"),
        category: "electronics".to_string(),
        description: "A perfectly ordinary test product".to_string(),
        condition: ProductCondition::New,
        status: AuctionStatus::Active,
        created_at: Utc::now() - age,
    }
}

// region:    --- In-Memory Auction Repository
/// 실패 주입과 상태 변경 알림을 지원하는 메모리 저장소
#[derive(Default)]
pub struct InMemoryAuctionRepository {
    auctions: Mutex<HashMap<String, Auction>>,
    failing_updates: Mutex<HashSet<String>>,
    fetch_failures_left: AtomicUsize,
    fetch_count: AtomicUsize,
    update_delay: Mutex<Option<Duration>>,
    operations: Mutex<Vec<String>>,
    completed_elsewhere: Mutex<HashSet<String>>,
    update_notifier: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl InMemoryAuctionRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, auction: Auction) {
        self.auctions
            .lock()
            .unwrap()
            .insert(auction.id.clone(), auction);
    }

    pub fn status_of(&self, id: &str) -> Option<AuctionStatus> {
        self.auctions.lock().unwrap().get(id).map(|a| a.status)
    }

    pub fn fail_updates_for(&self, id: &str) {
        self.failing_updates.lock().unwrap().insert(id.to_string());
    }

    pub fn heal_updates_for(&self, id: &str) {
        self.failing_updates.lock().unwrap().remove(id);
    }

    pub fn fail_next_fetches(&self, n: usize) {
        self.fetch_failures_left.store(n, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// 조회 직후 다른 인스턴스가 먼저 종료시킨 것처럼 상태를 바꾼다
    pub fn complete_elsewhere_after_fetch(&self, id: &str) {
        self.completed_elsewhere
            .lock()
            .unwrap()
            .insert(id.to_string());
    }

    pub fn set_update_delay(&self, delay: Duration) {
        *self.update_delay.lock().unwrap() = Some(delay);
    }

    /// 조회/변경 호출 순서 기록 ("fetch", "update:<id>")
    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    /// 상태 변경 시도마다 경매 id 를 전달받는 채널
    pub fn subscribe_updates(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.update_notifier.lock().unwrap() = Some(tx);
        rx
    }

    fn notify(&self, id: &str) {
        if let Some(tx) = self.update_notifier.lock().unwrap().as_ref() {
            let _ = tx.send(id.to_string());
        }
    }
}

#[async_trait]
impl AuctionRepository for InMemoryAuctionRepository {
    async fn create(&self, auction: &Auction) -> Result<(), AuctionError> {
        self.insert(auction.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Auction, AuctionError> {
        self.auctions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| AuctionError::NotFound(format!("auction not found with id = {id}")))
    }

    async fn find(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, AuctionError> {
        Ok(self
            .auctions
            .lock()
            .unwrap()
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn find_active_expiring(
        &self,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Result<Vec<Auction>, AuctionError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.operations.lock().unwrap().push("fetch".to_string());

        let should_fail = self
            .fetch_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(AuctionError::Storage("connection refused".to_string()));
        }

        let mut auctions = self.auctions.lock().unwrap();
        let expired: Vec<Auction> = auctions
            .values()
            .filter(|a| a.status == AuctionStatus::Active && a.is_expired(now, duration))
            .cloned()
            .collect();
        for id in self.completed_elsewhere.lock().unwrap().iter() {
            if let Some(auction) = auctions.get_mut(id) {
                auction.complete();
            }
        }
        Ok(expired)
    }

    async fn update_status(&self, id: &str, status: AuctionStatus) -> Result<bool, AuctionError> {
        let delay = *self.update_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.notify(id);

        if self.failing_updates.lock().unwrap().contains(id) {
            return Err(AuctionError::Storage(format!("transient failure for {id}")));
        }

        let mut auctions = self.auctions.lock().unwrap();
        let changed = match auctions.get_mut(id) {
            Some(auction) if auction.status != status && auction.status.can_transition_to(status) => {
                auction.status = status;
                true
            }
            _ => false,
        };
        drop(auctions);
        self.operations.lock().unwrap().push(format!("update:{id}"));
        Ok(changed)
    }
}

// endregion: --- In-Memory Auction Repository

// region:    --- In-Memory Bid Repository
pub struct InMemoryBidRepository {
    auctions: Arc<InMemoryAuctionRepository>,
    bids: Mutex<Vec<Bid>>,
}

impl InMemoryBidRepository {
    pub fn new(auctions: Arc<InMemoryAuctionRepository>) -> Arc<Self> {
        Arc::new(Self {
            auctions,
            bids: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl BidRepository for InMemoryBidRepository {
    async fn create_bid(&self, bid: &Bid) -> Result<(), AuctionError> {
        match self.auctions.status_of(&bid.auction_id) {
            None => Err(AuctionError::NotFound(bid.auction_id.clone())),
            Some(AuctionStatus::Completed) => {
                Err(AuctionError::AuctionClosed(bid.auction_id.clone()))
            }
            Some(AuctionStatus::Active) => {
                self.bids.lock().unwrap().push(bid.clone());
                Ok(())
            }
        }
    }

    async fn find_winning_bid(&self, auction_id: &str) -> Result<Option<Bid>, AuctionError> {
        let bids = self.bids.lock().unwrap();
        let mut candidates: Vec<&Bid> = bids.iter().filter(|b| b.auction_id == auction_id).collect();
        candidates.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.placed_at.cmp(&b.placed_at)));
        Ok(candidates.first().map(|b| (*b).clone()))
    }

    async fn find_bids_by_auction(&self, auction_id: &str) -> Result<Vec<Bid>, AuctionError> {
        Ok(self
            .bids
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.auction_id == auction_id)
            .cloned()
            .collect())
    }
}

// endregion: --- In-Memory Bid Repository

// region:    --- Recording Publisher
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<AuctionEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<AuctionEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), String> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// 항상 실패하는 발행자
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _event: &AuctionEvent) -> Result<(), String> {
        Err("broker unavailable".to_string())
    }
}

// endregion: --- Recording Publisher

/// 조건이 참이 될 때까지 대기 (최대 timeout)
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
