/// 경매 엔티티 및 상태 전이 규칙
/// 상태는 ACTIVE -> COMPLETED 단방향으로만 전이되며, COMPLETED 는 종료 상태이다.
// region:    --- Imports
use crate::error::{AuctionError, Cause};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Constants
const CATEGORY_MIN_LEN: usize = 2;
const DESCRIPTION_MIN_LEN: usize = 10;
const DESCRIPTION_MAX_LEN: usize = 200;
// endregion: --- Constants

// region:    --- Enums
/// 상품 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCondition {
    New,
    UsedGood,
    UsedWorn,
}

impl ProductCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCondition::New => "NEW",
            ProductCondition::UsedGood => "USED_GOOD",
            ProductCondition::UsedWorn => "USED_WORN",
        }
    }
}

impl FromStr for ProductCondition {
    type Err = AuctionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(ProductCondition::New),
            "USED_GOOD" => Ok(ProductCondition::UsedGood),
            "USED_WORN" => Ok(ProductCondition::UsedWorn),
            other => Err(AuctionError::validation(format!(
                "unknown product condition: {other}"
            ))),
        }
    }
}

/// 경매 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Active,
    Completed,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Active => "ACTIVE",
            AuctionStatus::Completed => "COMPLETED",
        }
    }

    /// 상태 전이 가능 여부
    /// 같은 상태로의 전이는 no-op 으로 허용한다.
    pub fn can_transition_to(&self, next: AuctionStatus) -> bool {
        !self.is_terminal() || *self == next
    }

    /// 종료 상태에서는 다른 상태로 전이할 수 없다
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuctionStatus::Completed)
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuctionStatus {
    type Err = AuctionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(AuctionStatus::Active),
            "COMPLETED" => Ok(AuctionStatus::Completed),
            other => Err(AuctionError::validation(format!(
                "unknown auction status: {other}"
            ))),
        }
    }
}

// endregion: --- Enums

// region:    --- Auction
/// 경매 모델
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub id: String,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: ProductCondition,
    pub status: AuctionStatus,
    pub created_at: DateTime<Utc>,
}

impl Auction {
    /// 경매 생성
    /// 입력값을 검증하고 ACTIVE 상태의 새 경매를 반환한다. 저장은 호출자의 책임이다.
    pub fn create(
        product_name: &str,
        category: &str,
        description: &str,
        condition: ProductCondition,
    ) -> Result<Self, AuctionError> {
        let auction = Auction {
            id: Uuid::new_v4().to_string(),
            product_name: product_name.trim().to_string(),
            category: category.trim().to_string(),
            description: description.trim().to_string(),
            condition,
            status: AuctionStatus::Active,
            created_at: Utc::now(),
        };
        auction.validate()?;
        Ok(auction)
    }

    fn validate(&self) -> Result<(), AuctionError> {
        let mut causes = Vec::new();

        if self.product_name.is_empty() {
            causes.push(Cause::new("product_name", "must not be empty"));
        }
        if self.category.chars().count() < CATEGORY_MIN_LEN {
            causes.push(Cause::new(
                "category",
                format!("must be at least {CATEGORY_MIN_LEN} characters"),
            ));
        }
        let description_len = self.description.chars().count();
        if !(DESCRIPTION_MIN_LEN..=DESCRIPTION_MAX_LEN).contains(&description_len) {
            causes.push(Cause::new(
                "description",
                format!(
                    "must be between {DESCRIPTION_MIN_LEN} and {DESCRIPTION_MAX_LEN} characters"
                ),
            ));
        }

        if causes.is_empty() {
            Ok(())
        } else {
            Err(AuctionError::Validation {
                message: "invalid auction object".to_string(),
                causes,
            })
        }
    }

    /// 경매 만료 시각 (created_at + duration)
    pub fn expires_at(&self, duration: Duration) -> DateTime<Utc> {
        match chrono::Duration::from_std(duration) {
            Ok(d) => self
                .created_at
                .checked_add_signed(d)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Err(_) => DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, duration: Duration) -> bool {
        self.expires_at(duration) <= now
    }

    /// ACTIVE -> COMPLETED 전이. 이미 COMPLETED 인 경우 no-op
    pub fn complete(&mut self) {
        if self.status.can_transition_to(AuctionStatus::Completed) {
            self.status = AuctionStatus::Completed;
        }
    }
}

// endregion: --- Auction

// region:    --- Auction Filter
/// 경매 목록 조회 조건. 모든 조건은 AND 로 결합되며, None 은 조건 없음을 의미한다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuctionFilter {
    pub status: Option<AuctionStatus>,
    pub category: Option<String>,
    pub product_name: Option<String>,
}

impl AuctionFilter {
    pub fn with_status(status: AuctionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// status, category 는 정확히 일치, product_name 은 대소문자 무시 부분 일치
    pub fn matches(&self, auction: &Auction) -> bool {
        if let Some(status) = self.status {
            if auction.status != status {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &auction.category != category {
                return false;
            }
        }
        if let Some(name) = &self.product_name {
            if !auction
                .product_name
                .to_lowercase()
                .contains(&name.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

// endregion: --- Auction Filter

// endregion: --- Tests
