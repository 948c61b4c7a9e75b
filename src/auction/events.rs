use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum AuctionEvent {
    // 경매 생성 이벤트
    AuctionCreated {
        auction_id: String,
        product_name: String,
        category: String,
        timestamp: DateTime<Utc>,
    },
    // 입찰 이벤트
    BidPlaced {
        auction_id: String,
        bid_id: String,
        bidder_id: String,
        amount: i64,
        timestamp: DateTime<Utc>,
    },
    // 경매 종료 이벤트 (만료 스위퍼가 발행)
    AuctionCompleted {
        auction_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    pub fn auction_id(&self) -> &str {
        match self {
            AuctionEvent::AuctionCreated { auction_id, .. }
            | AuctionEvent::BidPlaced { auction_id, .. }
            | AuctionEvent::AuctionCompleted { auction_id, .. } => auction_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            AuctionEvent::AuctionCreated { .. } => "AuctionCreated",
            AuctionEvent::BidPlaced { .. } => "BidPlaced",
            AuctionEvent::AuctionCompleted { .. } => "AuctionCompleted",
        }
    }
}
