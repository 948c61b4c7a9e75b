use crate::error::{AuctionError, Cause};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// 입찰 모델
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: String,
    pub auction_id: String,
    pub bidder_id: String,
    pub amount: i64,
    pub placed_at: DateTime<Utc>,
}

impl Bid {
    /// 입찰 생성 (입력값 검증 포함)
    pub fn create(auction_id: &str, bidder_id: &str, amount: i64) -> Result<Self, AuctionError> {
        let mut causes = Vec::new();
        if auction_id.trim().is_empty() {
            causes.push(Cause::new("auction_id", "must not be empty"));
        }
        if bidder_id.trim().is_empty() {
            causes.push(Cause::new("bidder_id", "must not be empty"));
        }
        if amount <= 0 {
            causes.push(Cause::new("amount", "must be greater than zero"));
        }
        if !causes.is_empty() {
            return Err(AuctionError::Validation {
                message: "invalid bid object".to_string(),
                causes,
            });
        }

        Ok(Bid {
            id: Uuid::new_v4().to_string(),
            auction_id: auction_id.trim().to_string(),
            bidder_id: bidder_id.trim().to_string(),
            amount,
            placed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_amount() {
        let err = Bid::create("auction-1", "bidder-1", 0).unwrap_err();
        assert!(matches!(err, AuctionError::Validation { .. }));
    }

    #[test]
    fn trims_identifiers() {
        let bid = Bid::create(" auction-1 ", " bidder-1", 1500).unwrap();
        assert_eq!(bid.auction_id, "auction-1");
        assert_eq!(bid.bidder_id, "bidder-1");
    }
}
