/// 애플리케이션 설정
/// 시작 시점에 한 번만 환경 변수를 읽어 타입이 있는 설정으로 변환한다.
/// - 필수 값이 없으면 시작 실패
/// - 선택 값이 잘못된 경우 경고 로그를 남기고 기본값 사용
// region:    --- Imports
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

// endregion: --- Imports

// region:    --- Defaults
pub const DEFAULT_AUCTION_DURATION: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_FETCH_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_FETCH_INITIAL_BACKOFF: Duration = Duration::from_millis(500);
pub const DEFAULT_FETCH_MAX_BACKOFF: Duration = Duration::from_secs(30);
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_KAFKA_TOPIC: &str = "auction-events";
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
// endregion: --- Defaults

// region:    --- Config Error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(String),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

// endregion: --- Config Error

// region:    --- Sweeper Config
/// 조회 실패 시 재시도 정책 (지수 백오프)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_FETCH_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_FETCH_INITIAL_BACKOFF,
            max_backoff: DEFAULT_FETCH_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// attempt 번째(1부터) 실패 후 대기 시간: min(initial * 2^(attempt-1), max)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// 만료 스위퍼 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweeperConfig {
    pub auction_duration: Duration,
    pub interval: Duration,
    pub fetch_retry: RetryPolicy,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            auction_duration: DEFAULT_AUCTION_DURATION,
            interval: DEFAULT_SWEEP_INTERVAL,
            fetch_retry: RetryPolicy::default(),
        }
    }
}

// endregion: --- Sweeper Config

// region:    --- App Config
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub listen_addr: String,
    pub kafka_brokers: Option<String>,
    pub kafka_topic: String,
    pub sweeper: SweeperConfig,
}

impl AppConfig {
    /// 프로세스 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로부터 설정 로드
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = non_empty(lookup("DATABASE_URL"))
            .ok_or_else(|| ConfigError::Missing("DATABASE_URL".to_string()))?;

        let sweeper = SweeperConfig {
            auction_duration: duration_or_default(
                "AUCTION_DURATION",
                lookup("AUCTION_DURATION"),
                DEFAULT_AUCTION_DURATION,
            ),
            interval: non_zero_duration_or_default(
                "AUCTION_SWEEP_INTERVAL",
                lookup("AUCTION_SWEEP_INTERVAL"),
                DEFAULT_SWEEP_INTERVAL,
            ),
            fetch_retry: RetryPolicy {
                max_attempts: non_zero_u32_or_default(
                    "SWEEPER_FETCH_MAX_ATTEMPTS",
                    lookup("SWEEPER_FETCH_MAX_ATTEMPTS"),
                    DEFAULT_FETCH_MAX_ATTEMPTS,
                ),
                initial_backoff: duration_or_default(
                    "SWEEPER_FETCH_INITIAL_BACKOFF",
                    lookup("SWEEPER_FETCH_INITIAL_BACKOFF"),
                    DEFAULT_FETCH_INITIAL_BACKOFF,
                ),
                max_backoff: duration_or_default(
                    "SWEEPER_FETCH_MAX_BACKOFF",
                    lookup("SWEEPER_FETCH_MAX_BACKOFF"),
                    DEFAULT_FETCH_MAX_BACKOFF,
                ),
            },
        };

        Ok(AppConfig {
            database_url,
            database_max_connections: non_zero_u32_or_default(
                "DATABASE_MAX_CONNECTIONS",
                lookup("DATABASE_MAX_CONNECTIONS"),
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            ),
            listen_addr: non_empty(lookup("LISTEN_ADDR"))
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            kafka_brokers: non_empty(lookup("KAFKA_BROKERS")),
            kafka_topic: non_empty(lookup("KAFKA_TOPIC"))
                .unwrap_or_else(|| DEFAULT_KAFKA_TOPIC.to_string()),
            sweeper,
        })
    }
}

// endregion: --- App Config

// region:    --- Parsing
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 없거나 잘못된 기간 값은 기본값으로 대체 (경고 로그)
pub fn duration_or_default(key: &str, value: Option<String>, default: Duration) -> Duration {
    let Some(raw) = value else {
        return default;
    };
    match parse_duration(&raw) {
        Ok(d) => d,
        Err(e) => {
            warn!(
                "{:<12} --> {} 값이 잘못되어 기본값 {:?} 사용: {}",
                "Config", key, default, e
            );
            default
        }
    }
}

fn non_zero_duration_or_default(key: &str, value: Option<String>, default: Duration) -> Duration {
    let parsed = duration_or_default(key, value, default);
    if parsed.is_zero() {
        warn!(
            "{:<12} --> {} 값은 0 일 수 없어 기본값 {:?} 사용",
            "Config", key, default
        );
        return default;
    }
    parsed
}

fn non_zero_u32_or_default(key: &str, value: Option<String>, default: u32) -> u32 {
    let Some(raw) = value else {
        return default;
    };
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
            warn!(
                "{:<12} --> {} 값 {:?} 이(가) 잘못되어 기본값 {} 사용",
                "Config", key, raw, default
            );
            default
        }
    }
}

/// `24h`, `1h30m`, `1.5h`, `250ms` 형식의 기간 문자열 파싱
/// 단위: ns, us, µs, ms, s, m, h
pub fn parse_duration(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key: "duration".to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let input = raw.trim();
    if input.is_empty() {
        return Err(invalid("empty duration"));
    }
    if input == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_secs = 0f64;
    let mut rest = input;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| invalid("missing unit"))?;
        if number_end == 0 {
            return Err(invalid("expected a number"));
        }
        let value: f64 = rest[..number_end]
            .parse()
            .map_err(|_| invalid("malformed number"))?;
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(invalid("unknown unit")),
        };
        total_secs += value * scale;
        rest = &rest[unit_end..];
    }

    Duration::try_from_secs_f64(total_secs).map_err(|_| invalid("out of range"))
}

// endregion: --- Parsing

// endregion: --- Tests
