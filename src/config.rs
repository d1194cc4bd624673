//! Environment-driven configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::code::DEFAULT_CODE_LENGTH;
use crate::score::DEFAULT_BONUS_GRANULARITY;
use crate::types::ScoringConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Rules every room is created with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub room_code_length: usize,
    pub total_rounds: u32,
    pub scoring: ScoringConfig,
    pub bonus_granularity: Duration,
    /// How long a question accepts answers
    pub answer_window: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            room_code_length: DEFAULT_CODE_LENGTH,
            total_rounds: 10,
            scoring: ScoringConfig::default(),
            bonus_granularity: DEFAULT_BONUS_GRANULARITY,
            answer_window: Duration::from_secs(15),
        }
    }
}

/// Where question content comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Base URL of the catalog service (preferred when set)
    pub url: Option<String>,
    /// JSON catalog file
    pub file: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: None,
            file: None,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Inbound event limits per connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_events: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_events: 30,
            window: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub game: GameConfig,
    pub catalog: CatalogConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            game: GameConfig::default(),
            catalog: CatalogConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let game = GameConfig {
            room_code_length: env_positive("ROOM_CODE_LENGTH", defaults.game.room_code_length)?,
            total_rounds: env_positive("TOTAL_ROUNDS", defaults.game.total_rounds)?,
            scoring: ScoringConfig {
                base_points: env_parse("BASE_POINTS", defaults.game.scoring.base_points)?,
                speed_bonus_multiplier: env_parse(
                    "SPEED_BONUS_MULTIPLIER",
                    defaults.game.scoring.speed_bonus_multiplier,
                )?,
            },
            bonus_granularity: Duration::from_millis(env_positive(
                "BONUS_GRANULARITY_MS",
                u64::try_from(defaults.game.bonus_granularity.as_millis()).unwrap_or(u64::MAX),
            )?),
            answer_window: Duration::from_secs(env_positive(
                "ANSWER_WINDOW_SECS",
                defaults.game.answer_window.as_secs(),
            )?),
        };

        let catalog = CatalogConfig {
            url: env_string("CATALOG_URL"),
            file: env_string("CATALOG_FILE").map(PathBuf::from),
            timeout: Duration::from_secs(env_parse(
                "CATALOG_TIMEOUT_SECS",
                defaults.catalog.timeout.as_secs(),
            )?),
        };

        let rate_limit = RateLimitConfig {
            max_events: env_parse("WS_RATE_LIMIT", defaults.rate_limit.max_events)?,
            window: Duration::from_secs(env_parse(
                "WS_RATE_WINDOW_SECS",
                defaults.rate_limit.window.as_secs(),
            )?),
        };

        Ok(Self {
            port: env_parse("PORT", defaults.port)?,
            game,
            catalog,
            rate_limit,
        })
    }
}

/// Trimmed value of a variable; empty counts as unset
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn env_parse<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env_string(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn env_positive<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
{
    let value = env_parse(key, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
        });
    }
    Ok(value)
}
