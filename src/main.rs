// region:    --- Imports
use auction_lifecycle::auction::service::AuctionService;
use auction_lifecycle::bidding::commands::BidService;
use auction_lifecycle::config::AppConfig;
use auction_lifecycle::database::{
    AuctionRepository, BidRepository, DatabaseManager, PostgresAuctionRepository,
    PostgresBidRepository,
};
use auction_lifecycle::handlers::{self, AppState};
use auction_lifecycle::message_broker::{
    EventPublisher, KafkaEventPublisher, KafkaManager, NoopEventPublisher,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // .env 파일은 선택 사항
    if dotenvy::dotenv().is_err() {
        info!("{:<12} --> .env 파일 없음, 프로세스 환경 변수 사용", "Main");
    }

    // 설정 로드 (시작 시 1회)
    let config = AppConfig::from_env().map_err(|e| {
        error!("{:<12} --> 설정 로드 실패: {}", "Main", e);
        e
    })?;

    // DatabaseManager 생성
    let db_manager = Arc::new(
        DatabaseManager::connect(&config.database_url, config.database_max_connections).await?,
    );

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 이벤트 발행자 (Kafka 미설정 시 발행 생략)
    let publisher: Arc<dyn EventPublisher> = match &config.kafka_brokers {
        Some(brokers) => {
            let kafka_manager = KafkaManager::new(brokers)?;
            kafka_manager.create_topic(&config.kafka_topic, 5, 1).await?;
            info!("{:<12} --> Kafka 초기화 성공", "Main");
            Arc::new(KafkaEventPublisher::new(
                kafka_manager.get_producer(),
                &config.kafka_topic,
            ))
        }
        None => {
            warn!("{:<12} --> KAFKA_BROKERS 미설정, 이벤트 발행 비활성화", "Main");
            Arc::new(NoopEventPublisher)
        }
    };

    // 저장소 및 서비스 생성 (경매 서비스가 만료 스위퍼를 시작한다)
    let auctions: Arc<dyn AuctionRepository> =
        Arc::new(PostgresAuctionRepository::new(Arc::clone(&db_manager)));
    let bids: Arc<dyn BidRepository> =
        Arc::new(PostgresBidRepository::new(Arc::clone(&db_manager)));

    let auction_service = Arc::new(AuctionService::new(
        Arc::clone(&auctions),
        Some(Arc::clone(&bids)),
        Arc::clone(&publisher),
        config.sweeper,
    ));
    let bid_service = Arc::new(BidService::new(
        auctions,
        bids,
        publisher,
        config.sweeper.auction_duration,
    ));

    // 라우터 설정
    let routes_all = handlers::router(AppState {
        auction_service: Arc::clone(&auction_service),
        bid_service,
    });

    // 리스너 생성
    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행 (Ctrl-C 시 정상 종료)
    if let Err(err) = axum::serve(listener, routes_all.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("{:<12} --> Server error: {}", "Main", err);
    }

    auction_service.shutdown().await;
    info!("{:<12} --> 서버 종료", "Main");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("{:<12} --> 종료 신호 대기 실패: {}", "Main", e);
    }
    info!("{:<12} --> 종료 신호 수신", "Main");
}
// endregion: --- Main
