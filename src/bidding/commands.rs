/// 입찰 관련 커맨드 처리
/// 입찰 저장 전에 경매 상태를 확인하고, 저장 시점에도 같은 트랜잭션 안에서 다시 확인한다.
// region:    --- Imports
use super::model::Bid;
use crate::auction::entity::AuctionStatus;
use crate::auction::events::AuctionEvent;
use crate::database::{AuctionRepository, BidRepository};
use crate::error::AuctionError;
use crate::message_broker::EventPublisher;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: String,
    pub bidder_id: String,
    pub amount: i64,
}

pub struct BidService {
    auctions: Arc<dyn AuctionRepository>,
    bids: Arc<dyn BidRepository>,
    publisher: Arc<dyn EventPublisher>,
    auction_duration: Duration,
}

impl BidService {
    pub fn new(
        auctions: Arc<dyn AuctionRepository>,
        bids: Arc<dyn BidRepository>,
        publisher: Arc<dyn EventPublisher>,
        auction_duration: Duration,
    ) -> Self {
        Self {
            auctions,
            bids,
            publisher,
            auction_duration,
        }
    }

    /// 입찰
    pub async fn place_bid(&self, cmd: PlaceBidCommand) -> Result<Bid, AuctionError> {
        info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);
        let bid = Bid::create(&cmd.auction_id, &cmd.bidder_id, cmd.amount)?;

        let auction = self.auctions.find_by_id(&bid.auction_id).await?;
        if auction.status == AuctionStatus::Completed {
            return Err(AuctionError::AuctionClosed(format!(
                "auction {} is already closed",
                auction.id
            )));
        }
        // 스위퍼가 아직 처리하지 않았더라도 만료 시각이 지났으면 거절
        if auction.is_expired(Utc::now(), self.auction_duration) {
            return Err(AuctionError::AuctionClosed(format!(
                "auction {} has expired",
                auction.id
            )));
        }

        self.bids.create_bid(&bid).await?;

        let event = AuctionEvent::BidPlaced {
            auction_id: bid.auction_id.clone(),
            bid_id: bid.id.clone(),
            bidder_id: bid.bidder_id.clone(),
            amount: bid.amount,
            timestamp: bid.placed_at,
        };
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                "{:<12} --> BidPlaced 이벤트 발행 실패 auction={}: {}",
                "Command", bid.auction_id, e
            );
        }
        Ok(bid)
    }

    /// 경매 입찰 이력 조회
    pub async fn find_bids_by_auction_id(&self, auction_id: &str) -> Result<Vec<Bid>, AuctionError> {
        self.auctions.find_by_id(auction_id).await?;
        self.bids.find_bids_by_auction(auction_id).await
    }
}

// endregion: --- Commands
