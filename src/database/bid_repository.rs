// region:    --- Imports
use super::DatabaseManager;
use crate::auction::entity::AuctionStatus;
use crate::bidding::model::Bid;
use crate::error::AuctionError;
use crate::query::queries;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Bid Repository Trait
#[async_trait]
pub trait BidRepository: Send + Sync {
    /// 경매가 ACTIVE 인 경우에만 입찰을 저장한다.
    async fn create_bid(&self, bid: &Bid) -> Result<(), AuctionError>;

    /// 최고 금액 입찰 (동일 금액은 먼저 들어온 입찰)
    async fn find_winning_bid(&self, auction_id: &str) -> Result<Option<Bid>, AuctionError>;

    async fn find_bids_by_auction(&self, auction_id: &str) -> Result<Vec<Bid>, AuctionError>;
}

// endregion: --- Bid Repository Trait

// region:    --- Postgres Bid Repository
pub struct PostgresBidRepository {
    db: Arc<DatabaseManager>,
}

impl PostgresBidRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BidRepository for PostgresBidRepository {
    async fn create_bid(&self, bid: &Bid) -> Result<(), AuctionError> {
        let bid = bid.clone();
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    // 스위퍼의 상태 변경과 직렬화되도록 경매 행을 공유 잠금
                    let status: Option<String> = sqlx::query_scalar(queries::LOCK_AUCTION_STATUS)
                        .bind(&bid.auction_id)
                        .fetch_optional(&mut **tx)
                        .await?;

                    let status: AuctionStatus = match status {
                        Some(s) => s.parse().map_err(|e| {
                            AuctionError::Storage(format!("corrupt auction status: {e}"))
                        })?,
                        None => {
                            return Err(AuctionError::NotFound(format!(
                                "auction not found with id = {}",
                                bid.auction_id
                            )))
                        }
                    };
                    if status != AuctionStatus::Active {
                        return Err(AuctionError::AuctionClosed(format!(
                            "auction {} is already closed",
                            bid.auction_id
                        )));
                    }

                    sqlx::query(queries::INSERT_BID)
                        .bind(&bid.id)
                        .bind(&bid.auction_id)
                        .bind(&bid.bidder_id)
                        .bind(bid.amount)
                        .bind(bid.placed_at)
                        .execute(&mut **tx)
                        .await?;

                    info!(
                        "{:<12} --> 입찰 저장 auction={} amount={}",
                        "Repository", bid.auction_id, bid.amount
                    );
                    Ok(())
                })
            })
            .await
    }

    async fn find_winning_bid(&self, auction_id: &str) -> Result<Option<Bid>, AuctionError> {
        let bid = sqlx::query_as::<_, Bid>(queries::GET_WINNING_BID)
            .bind(auction_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(bid)
    }

    async fn find_bids_by_auction(&self, auction_id: &str) -> Result<Vec<Bid>, AuctionError> {
        let bids = sqlx::query_as::<_, Bid>(queries::GET_AUCTION_BIDS)
            .bind(auction_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(bids)
    }
}

// endregion: --- Postgres Bid Repository
