// region:    --- Imports
use crate::auction::entity::{AuctionFilter, AuctionStatus};
use crate::auction::service::{AuctionService, CreateAuctionInput};
use crate::bidding::commands::{BidService, PlaceBidCommand};
use crate::error::AuctionError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// endregion: --- Imports

// region:    --- Router
#[derive(Clone)]
pub struct AppState {
    pub auction_service: Arc<AuctionService>,
    pub bid_service: Arc<BidService>,
}

/// 라우터 설정
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auction", post(handle_create_auction).get(handle_find_auctions))
        .route("/auction/:auction_id", get(handle_find_auction_by_id))
        .route(
            "/auction/winner/:auction_id",
            get(handle_find_winning_bid),
        )
        .route("/bid", post(handle_place_bid))
        .route("/bid/:auction_id", get(handle_find_bids))
        .layer(cors)
        .with_state(state)
}

// endregion: --- Router

// region:    --- Auction Handlers
#[derive(Debug, Deserialize)]
pub struct FindAuctionsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "productName")]
    pub product_name: Option<String>,
}

impl TryFrom<FindAuctionsQuery> for AuctionFilter {
    type Error = AuctionError;

    fn try_from(query: FindAuctionsQuery) -> Result<Self, Self::Error> {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let status = match non_empty(query.status) {
            Some(s) => Some(s.to_uppercase().parse::<AuctionStatus>()?),
            None => None,
        };
        Ok(AuctionFilter {
            status,
            category: non_empty(query.category),
            product_name: non_empty(query.product_name),
        })
    }
}

/// 경매 생성
pub async fn handle_create_auction(
    State(state): State<AppState>,
    payload: Result<Json<CreateAuctionInput>, JsonRejection>,
) -> Result<impl IntoResponse, AuctionError> {
    let Json(input) = payload.map_err(|e| AuctionError::validation(e.body_text()))?;
    info!("{:<12} --> 경매 생성 요청: {}", "Handler", input.product_name);

    state.auction_service.create_auction(input).await?;
    Ok(StatusCode::CREATED)
}

/// 경매 목록 조회
pub async fn handle_find_auctions(
    State(state): State<AppState>,
    query: Result<Query<FindAuctionsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AuctionError> {
    let Query(query) = query.map_err(|e| AuctionError::validation(e.body_text()))?;
    let filter = AuctionFilter::try_from(query)?;
    info!("{:<12} --> 경매 목록 조회: {:?}", "Handler", filter);

    let auctions = state.auction_service.find_auctions(&filter).await?;
    Ok(Json(auctions))
}

/// 경매 조회
pub async fn handle_find_auction_by_id(
    State(state): State<AppState>,
    Path(auction_id): Path<String>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 경매 조회 id: {}", "Handler", auction_id);
    let auction = state.auction_service.find_auction_by_id(&auction_id).await?;
    Ok(Json(auction))
}

/// 낙찰 정보 조회
pub async fn handle_find_winning_bid(
    State(state): State<AppState>,
    Path(auction_id): Path<String>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 낙찰 정보 조회 id: {}", "Handler", auction_id);
    let winning = state
        .auction_service
        .find_winning_bid_by_auction_id(&auction_id)
        .await?;
    Ok(Json(winning))
}

// endregion: --- Auction Handlers

// region:    --- Bid Handlers
/// 입찰 요청 처리
pub async fn handle_place_bid(
    State(state): State<AppState>,
    payload: Result<Json<PlaceBidCommand>, JsonRejection>,
) -> Result<impl IntoResponse, AuctionError> {
    let Json(cmd) = payload.map_err(|e| AuctionError::validation(e.body_text()))?;
    let bid = state.bid_service.place_bid(cmd).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

/// 경매 입찰 이력 조회
pub async fn handle_find_bids(
    State(state): State<AppState>,
    Path(auction_id): Path<String>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Handler", auction_id);
    let bids = state.bid_service.find_bids_by_auction_id(&auction_id).await?;
    Ok(Json(bids))
}

// endregion: --- Bid Handlers

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_maps_to_filter() {
        let filter = AuctionFilter::try_from(FindAuctionsQuery {
            status: Some("completed".to_string()),
            category: Some(" ".to_string()),
            product_name: Some("lamp".to_string()),
        })
        .unwrap();
        assert_eq!(filter.status, Some(AuctionStatus::Completed));
        assert_eq!(filter.category, None);
        assert_eq!(filter.product_name.as_deref(), Some("lamp"));
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = AuctionFilter::try_from(FindAuctionsQuery {
            status: Some("closed".to_string()),
            category: None,
            product_name: None,
        })
        .unwrap_err();
        assert!(matches!(err, AuctionError::Validation { .. }));
    }
}
// endregion: --- Tests
