mod lobby;
mod question;
mod room;
mod store;

pub use room::{Room, RoomSummary};

use crate::abuse::RateLimiter;
use crate::catalog::{CatalogError, ContentSource};
use crate::clock::{Clock, SystemClock};
use crate::config::GameConfig;
use crate::score::{ScoreCalculator, SpeedBonus};
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// A room behind its own lock; operations on different rooms never contend
pub type SharedRoom = Arc<Mutex<Room>>;

pub type GameResult<T> = Result<T, GameError>;

/// Why an engine operation declined to act
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Not enough songs for this genre")]
    InsufficientContent,

    #[error("Content lookup failed")]
    Catalog(#[from] CatalogError),

    /// Expected races (late answer, double submit, reveal with nothing open...)
    #[error("{0}")]
    Precondition(&'static str),
}

impl GameError {
    /// Whether the acting connection should be told about this
    pub fn is_reported(&self) -> bool {
        !matches!(self, GameError::Precondition(_))
    }
}

/// Shared application state: the room registry plus its collaborators
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<RoomCode, SharedRoom>>>,
    /// Which room and user each live connection speaks for
    pub connections: Arc<RwLock<HashMap<ConnectionId, Binding>>>,
    pub config: Arc<GameConfig>,
    pub catalog: Arc<dyn ContentSource>,
    pub scorer: Arc<dyn ScoreCalculator>,
    pub clock: Arc<dyn Clock>,
    /// Inbound event limit per connection (None = unlimited)
    pub rate_limiter: Option<RateLimiter>,
}

impl AppState {
    pub fn new(config: GameConfig, catalog: Arc<dyn ContentSource>) -> Self {
        let scorer = SpeedBonus::new(config.bonus_granularity, config.answer_window);
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            connections: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
            catalog,
            scorer: Arc::new(scorer),
            clock: Arc::new(SystemClock),
            rate_limiter: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn ScoreCalculator>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }
}
