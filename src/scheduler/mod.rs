/// 경매 만료 스위퍼
/// 일정 주기로 만료된 ACTIVE 경매를 조회하고, 경매마다 별도 태스크로 COMPLETED 상태 변경을 요청한다.
/// 한 사이클의 모든 변경이 끝나야 다음 사이클을 시작하므로 사이클 간 조회가 겹치지 않는다.
/// 스위퍼는 애플리케이션 메모리가 아닌 저장소만 읽고 쓴다.
// region:    --- Imports
use crate::auction::entity::{Auction, AuctionStatus};
use crate::auction::events::AuctionEvent;
use crate::config::SweeperConfig;
use crate::database::AuctionRepository;
use crate::error::AuctionError;
use crate::message_broker::EventPublisher;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Sweep Report
/// 한 사이클의 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub found: usize,
    pub completed: usize,
    /// 조회와 변경 사이에 이미 종료되었거나 사라진 경매
    pub skipped: usize,
    pub failed: usize,
}

/// 개별 경매 종료 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Completed,
    Unchanged,
    Failed,
}

// endregion: --- Sweep Report

// region:    --- Sweeper Handle
/// 실행 중인 스위퍼 태스크의 소유권
pub struct SweeperHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// 취소 신호를 보내고 루프 종료까지 대기
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            error!("{:<12} --> 스위퍼 태스크 비정상 종료: {:?}", "Sweeper", e);
        }
    }
}

// endregion: --- Sweeper Handle

// region:    --- Expiration Sweeper
#[derive(Clone)]
pub struct ExpirationSweeper {
    auctions: Arc<dyn AuctionRepository>,
    publisher: Arc<dyn EventPublisher>,
    config: SweeperConfig,
}

impl ExpirationSweeper {
    pub fn new(
        auctions: Arc<dyn AuctionRepository>,
        publisher: Arc<dyn EventPublisher>,
        config: SweeperConfig,
    ) -> Self {
        Self {
            auctions,
            publisher,
            config,
        }
    }

    /// 백그라운드 태스크로 스위퍼 시작 (Tokio 런타임 안에서 호출해야 한다)
    pub fn spawn(self) -> SweeperHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let join = tokio::spawn(async move {
            self.run(token).await;
        });
        SweeperHandle { cancel, join }
    }

    /// 취소될 때까지 조회 -> 상태 변경 -> 대기 사이클 반복
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            "{:<12} --> 만료 경매 스위퍼 시작 (duration={:?}, interval={:?})",
            "Sweeper", self.config.auction_duration, self.config.interval
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.fetch_expired_with_retry(&cancel).await {
                Ok(Some(auctions)) => {
                    let report = self.complete_all(auctions).await;
                    if report.found > 0 {
                        info!(
                            "{:<12} --> 사이클 완료: found={} completed={} skipped={} failed={}",
                            "Sweeper",
                            report.found,
                            report.completed,
                            report.skipped,
                            report.failed
                        );
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    // 재시도 소진: 이번 사이클은 포기하고 다음 주기에 다시 시도
                    error!(
                        "{:<12} --> 만료 경매 조회 재시도 소진, 사이클 건너뜀: {}",
                        "Sweeper", e
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        info!("{:<12} --> 만료 경매 스위퍼 종료", "Sweeper");
    }

    /// 한 사이클 실행: 조회 후 모든 상태 변경이 끝날 때까지 대기
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<SweepReport, AuctionError> {
        let auctions = self
            .auctions
            .find_active_expiring(now, self.config.auction_duration)
            .await?;
        Ok(self.complete_all(auctions).await)
    }

    /// 조회 실패 시 지수 백오프로 재시도. 취소되면 Ok(None)
    async fn fetch_expired_with_retry(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<Auction>>, AuctionError> {
        let policy = self.config.fetch_retry;
        let mut attempt = 1;

        loop {
            let result = tokio::select! {
                r = self.auctions.find_active_expiring(Utc::now(), self.config.auction_duration) => r,
                _ = cancel.cancelled() => return Ok(None),
            };

            match result {
                Ok(auctions) => return Ok(Some(auctions)),
                Err(e) if attempt >= policy.max_attempts => return Err(e),
                Err(e) => {
                    let delay = policy.backoff(attempt);
                    warn!(
                        "{:<12} --> 만료 경매 조회 실패 (시도: {}/{}), {:?} 후 재시도: {}",
                        "Sweeper", attempt, policy.max_attempts, delay, e
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => return Ok(None),
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// 경매마다 태스크를 띄우고 전부 끝날 때까지 대기 (fan-out / fan-in)
    async fn complete_all(&self, auctions: Vec<Auction>) -> SweepReport {
        let mut report = SweepReport {
            found: auctions.len(),
            ..Default::default()
        };
        if auctions.is_empty() {
            return report;
        }

        let mut tasks = JoinSet::new();
        for auction in auctions {
            let repository = Arc::clone(&self.auctions);
            let publisher = Arc::clone(&self.publisher);
            tasks.spawn(async move { complete_auction(repository, publisher, auction.id).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Completion::Completed) => report.completed += 1,
                Ok(Completion::Unchanged) => report.skipped += 1,
                Ok(Completion::Failed) => report.failed += 1,
                Err(e) => {
                    error!("{:<12} --> 상태 변경 태스크 실패: {:?}", "Sweeper", e);
                    report.failed += 1;
                }
            }
        }
        report
    }
}

/// 개별 경매 종료 처리. 실패는 로그만 남기고 다음 사이클에서 다시 발견된다.
/// 이벤트는 이 호출이 실제로 상태를 바꿨을 때만 발행한다.
async fn complete_auction(
    repository: Arc<dyn AuctionRepository>,
    publisher: Arc<dyn EventPublisher>,
    auction_id: String,
) -> Completion {
    debug!("{:<12} --> 만료된 경매 발견: {}", "Sweeper", auction_id);

    match repository
        .update_status(&auction_id, AuctionStatus::Completed)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            debug!(
                "{:<12} --> 이미 종료되었거나 없는 경매 id={}",
                "Sweeper", auction_id
            );
            return Completion::Unchanged;
        }
        Err(e) => {
            error!(
                "{:<12} --> 경매 상태 변경 실패 id={}: {}",
                "Sweeper", auction_id, e
            );
            return Completion::Failed;
        }
    }

    let event = AuctionEvent::AuctionCompleted {
        auction_id: auction_id.clone(),
        timestamp: Utc::now(),
    };
    if let Err(e) = publisher.publish(&event).await {
        warn!(
            "{:<12} --> AuctionCompleted 이벤트 발행 실패 id={}: {}",
            "Sweeper", auction_id, e
        );
    }
    Completion::Completed
}

// endregion: --- Expiration Sweeper
