/// 경매 저장소 계약 및 Postgres 구현
/// 스위퍼와 서비스가 공유하는 유일한 가변 자원이다.
// region:    --- Imports
use super::DatabaseManager;
use crate::auction::entity::{Auction, AuctionFilter, AuctionStatus};
use crate::error::AuctionError;
use crate::query::queries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

// endregion: --- Imports

// region:    --- Auction Repository Trait
#[async_trait]
pub trait AuctionRepository: Send + Sync {
    async fn create(&self, auction: &Auction) -> Result<(), AuctionError>;

    async fn find_by_id(&self, id: &str) -> Result<Auction, AuctionError>;

    async fn find(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, AuctionError>;

    /// status = ACTIVE AND created_at <= now - duration
    async fn find_active_expiring(
        &self,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Result<Vec<Auction>, AuctionError>;

    /// 무조건 설정. 이미 변경되었거나 존재하지 않는 id 도 성공으로 처리한다.
    /// 실제로 행이 바뀌었을 때만 true
    async fn update_status(&self, id: &str, status: AuctionStatus) -> Result<bool, AuctionError>;
}

/// 만료 기준 시각 (now - duration). 표현 범위를 벗어나면 None
pub fn expiry_cutoff(now: DateTime<Utc>, duration: Duration) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|d| now.checked_sub_signed(d))
}

// endregion: --- Auction Repository Trait

// region:    --- Auction Row
#[derive(sqlx::FromRow)]
struct AuctionRow {
    id: String,
    product_name: String,
    category: String,
    description: String,
    condition: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuctionRow> for Auction {
    type Error = AuctionError;

    fn try_from(row: AuctionRow) -> Result<Self, Self::Error> {
        let corrupt =
            |e: AuctionError| AuctionError::Storage(format!("corrupt auction row {}: {e}", row.id));
        Ok(Auction {
            condition: row.condition.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            id: row.id,
            product_name: row.product_name,
            category: row.category,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

fn into_auctions(rows: Vec<AuctionRow>) -> Result<Vec<Auction>, AuctionError> {
    rows.into_iter().map(Auction::try_from).collect()
}

// endregion: --- Auction Row

// region:    --- Postgres Auction Repository
pub struct PostgresAuctionRepository {
    db: Arc<DatabaseManager>,
}

impl PostgresAuctionRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuctionRepository for PostgresAuctionRepository {
    async fn create(&self, auction: &Auction) -> Result<(), AuctionError> {
        sqlx::query(queries::INSERT_AUCTION)
            .bind(&auction.id)
            .bind(&auction.product_name)
            .bind(&auction.category)
            .bind(&auction.description)
            .bind(auction.condition.as_str())
            .bind(auction.status.as_str())
            .bind(auction.created_at)
            .execute(self.db.pool())
            .await
            .map_err(|e| {
                error!("{:<12} --> 경매 저장 실패: {:?}", "Repository", e);
                AuctionError::from(e)
            })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Auction, AuctionError> {
        let row = sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AuctionError::NotFound(format!("auction not found with id = {id}")))?;
        Auction::try_from(row)
    }

    async fn find(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, AuctionError> {
        let rows = sqlx::query_as::<_, AuctionRow>(queries::FIND_AUCTIONS)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.category.as_deref())
            .bind(filter.product_name.as_deref())
            .fetch_all(self.db.pool())
            .await?;
        into_auctions(rows)
    }

    async fn find_active_expiring(
        &self,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Result<Vec<Auction>, AuctionError> {
        let Some(cutoff) = expiry_cutoff(now, duration) else {
            return Ok(Vec::new());
        };
        let rows = sqlx::query_as::<_, AuctionRow>(queries::FIND_ACTIVE_EXPIRING)
            .bind(cutoff)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| {
                error!("{:<12} --> 만료 경매 조회 실패: {:?}", "Repository", e);
                AuctionError::from(e)
            })?;
        into_auctions(rows)
    }

    async fn update_status(
        &self,
        id: &str,
        status: AuctionStatus,
    ) -> Result<bool, AuctionError> {
        let result = sqlx::query(queries::UPDATE_AUCTION_STATUS)
            .bind(id)
            .bind(status.as_str())
            .execute(self.db.pool())
            .await
            .map_err(|e| {
                error!("{:<12} --> 경매 상태 변경 실패: {:?}", "Repository", e);
                AuctionError::from(e)
            })?;

        // 영향받은 행이 없으면 이미 종료되었거나 없는 경매: 성공으로 처리
        if result.rows_affected() == 0 {
            debug!(
                "{:<12} --> 상태 변경 대상 없음 id={} status={}",
                "Repository", id, status
            );
            return Ok(false);
        }
        Ok(true)
    }
}

// endregion: --- Postgres Auction Repository

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_subtracts_duration() {
        let now = Utc::now();
        let cutoff = expiry_cutoff(now, Duration::from_secs(3600)).unwrap();
        assert_eq!(now - cutoff, chrono::Duration::hours(1));
    }

    #[test]
    fn cutoff_out_of_range_is_none() {
        assert!(expiry_cutoff(Utc::now(), Duration::from_secs(u64::MAX)).is_none());
    }

    #[test]
    fn corrupt_rows_are_storage_errors() {
        let row = AuctionRow {
            id: "a1".to_string(),
            product_name: "Lamp".to_string(),
            category: "home".to_string(),
            description: "A lamp that still works".to_string(),
            condition: "BROKEN".to_string(),
            status: "ACTIVE".to_string(),
            created_at: Utc::now(),
        };
        assert!(matches!(
            Auction::try_from(row),
            Err(AuctionError::Storage(_))
        ));
    }
}
// endregion: --- Tests
