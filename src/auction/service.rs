/// 경매 서비스
/// 생성, 조회, 낙찰 정보 조회를 제공하고 만료 스위퍼의 수명을 소유한다.
// region:    --- Imports
use super::entity::{Auction, AuctionFilter, ProductCondition};
use super::events::AuctionEvent;
use crate::bidding::model::Bid;
use crate::config::SweeperConfig;
use crate::database::{AuctionRepository, BidRepository};
use crate::error::AuctionError;
use crate::message_broker::EventPublisher;
use crate::scheduler::{ExpirationSweeper, SweeperHandle};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- DTOs
/// 경매 생성 입력
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionInput {
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: ProductCondition,
}

/// 낙찰 정보. 입찰이 없으면 bid 는 None
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinningInfo {
    pub auction: Auction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid: Option<Bid>,
}

// endregion: --- DTOs

// region:    --- Auction Service
pub struct AuctionService {
    auctions: Arc<dyn AuctionRepository>,
    bids: Option<Arc<dyn BidRepository>>,
    publisher: Arc<dyn EventPublisher>,
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl AuctionService {
    /// 서비스 생성과 동시에 만료 스위퍼를 하나 시작한다 (Tokio 런타임 안에서 호출).
    /// 스위퍼는 경매 저장소만 사용하므로 입찰 저장소가 없어도 동작한다.
    pub fn new(
        auctions: Arc<dyn AuctionRepository>,
        bids: Option<Arc<dyn BidRepository>>,
        publisher: Arc<dyn EventPublisher>,
        sweeper_config: SweeperConfig,
    ) -> Self {
        info!("{:<12} --> AuctionService 생성", "Service");

        let sweeper = ExpirationSweeper::new(
            Arc::clone(&auctions),
            Arc::clone(&publisher),
            sweeper_config,
        )
        .spawn();

        Self {
            auctions,
            bids,
            publisher,
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    /// 경매 생성
    pub async fn create_auction(&self, input: CreateAuctionInput) -> Result<(), AuctionError> {
        let auction = Auction::create(
            &input.product_name,
            &input.category,
            &input.description,
            input.condition,
        )?;
        self.auctions.create(&auction).await?;
        info!("{:<12} --> 경매 생성 id={}", "Service", auction.id);

        let event = AuctionEvent::AuctionCreated {
            auction_id: auction.id.clone(),
            product_name: auction.product_name.clone(),
            category: auction.category.clone(),
            timestamp: auction.created_at,
        };
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                "{:<12} --> AuctionCreated 이벤트 발행 실패 id={}: {}",
                "Service", auction.id, e
            );
        }
        Ok(())
    }

    /// 경매 단건 조회
    pub async fn find_auction_by_id(&self, id: &str) -> Result<Auction, AuctionError> {
        self.auctions.find_by_id(id).await
    }

    /// 경매 목록 조회
    pub async fn find_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, AuctionError> {
        self.auctions.find(filter).await
    }

    /// 낙찰 입찰 조회. 경매가 없으면 NotFound, 입찰이 없으면 bid 없이 반환
    pub async fn find_winning_bid_by_auction_id(
        &self,
        auction_id: &str,
    ) -> Result<WinningInfo, AuctionError> {
        let auction = self.auctions.find_by_id(auction_id).await?;
        let bid = match &self.bids {
            Some(bids) => bids.find_winning_bid(auction_id).await?,
            None => None,
        };
        Ok(WinningInfo { auction, bid })
    }

    pub fn is_sweeper_running(&self) -> bool {
        match self.sweeper.lock() {
            Ok(guard) => guard.as_ref().is_some_and(|h| !h.is_finished()),
            Err(_) => false,
        }
    }

    /// 스위퍼 종료 후 대기. 두 번째 호출부터는 no-op
    pub async fn shutdown(&self) {
        let handle = match self.sweeper.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            info!("{:<12} --> 스위퍼 종료 요청", "Service");
            handle.shutdown().await;
        }
    }
}

impl Drop for AuctionService {
    fn drop(&mut self) {
        let sweeper = match self.sweeper.get_mut() {
            Ok(sweeper) => sweeper,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = sweeper.as_ref() {
            handle.cancel_token().cancel();
        }
    }
}

// endregion: --- Auction Service
