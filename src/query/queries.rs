/// 경매 생성
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (id, product_name, category, description, condition, status, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

/// 경매 조회
pub const GET_AUCTION: &str = "SELECT id, product_name, category, description, condition, status, created_at FROM auctions WHERE id = $1";

/// 경매 목록 조회 (선택 조건 AND 결합)
/// 상품명은 대소문자 무시 부분 문자열 일치. LIKE 와 달리 %, _ 를 문자 그대로 비교한다.
pub const FIND_AUCTIONS: &str = r#"
    SELECT id, product_name, category, description, condition, status, created_at
    FROM auctions
    WHERE ($1::text IS NULL OR status = $1)
      AND ($2::text IS NULL OR category = $2)
      AND ($3::text IS NULL OR strpos(lower(product_name), lower($3)) > 0)
    ORDER BY created_at DESC
"#;

/// 만료된 진행 중 경매 조회
pub const FIND_ACTIVE_EXPIRING: &str = r#"
    SELECT id, product_name, category, description, condition, status, created_at
    FROM auctions
    WHERE status = 'ACTIVE' AND created_at <= $1
"#;

/// 경매 상태 변경 (COMPLETED 는 되돌리지 않는다)
pub const UPDATE_AUCTION_STATUS: &str =
    "UPDATE auctions SET status = $2 WHERE id = $1 AND status <> 'COMPLETED'";

/// 입찰 전 경매 상태 잠금 조회
pub const LOCK_AUCTION_STATUS: &str = "SELECT status FROM auctions WHERE id = $1 FOR SHARE";

/// 입찰 생성
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (id, auction_id, bidder_id, amount, placed_at)
    VALUES ($1, $2, $3, $4, $5)
"#;

/// 최고 입찰 조회 (동일 금액은 먼저 입찰한 쪽)
pub const GET_WINNING_BID: &str = r#"
    SELECT id, auction_id, bidder_id, amount, placed_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC, placed_at ASC
    LIMIT 1
"#;

/// 경매 입찰 이력 조회
pub const GET_AUCTION_BIDS: &str = r#"
    SELECT id, auction_id, bidder_id, amount, placed_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY placed_at DESC
"#;
