/// Match state machine.
pub mod game;
/// Open sockets and message delivery.
pub mod hub;
/// Item effects and per-match inventories.
pub mod items;
/// Jackpot pool economics.
pub mod jackpot;
/// Waiting rooms per quiz.
pub mod lobby;
/// Players, quizzes and questions.
pub mod model;
/// Live matches by id.
pub mod registry;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig, dao::quiz_store::QuizStore, error::ServiceError, state::hub::ConnectionHub,
};

use self::{lobby::LobbyRegistry, registry::MatchRegistry};

/// State shared by handlers, services and background tasks.
pub type SharedState = Arc<AppState>;

/// Central application state: open sockets, lobbies, live matches and the storage handle.
pub struct AppState {
    config: AppConfig,
    quiz_store: RwLock<Option<Arc<dyn QuizStore>>>,
    degraded: watch::Sender<bool>,
    hub: ConnectionHub,
    lobbies: LobbyRegistry,
    matches: MatchRegistry,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let matches = MatchRegistry::new(config.max_matches);
        Arc::new(Self {
            config,
            quiz_store: RwLock::new(None),
            degraded: degraded_tx,
            hub: ConnectionHub::new(),
            lobbies: LobbyRegistry::new(),
            matches,
        })
    }

    /// Tunables loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current quiz store, if one is installed.
    pub async fn quiz_store(&self) -> Option<Arc<dyn QuizStore>> {
        let guard = self.quiz_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current quiz store, or [`ServiceError::Degraded`] while none is installed.
    pub async fn require_quiz_store(&self) -> Result<Arc<dyn QuizStore>, ServiceError> {
        self.quiz_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a quiz store implementation and leave degraded mode.
    pub async fn set_quiz_store(&self, store: Arc<dyn QuizStore>) {
        {
            let mut guard = self.quiz_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current quiz store and enter degraded mode.
    pub async fn clear_quiz_store(&self) {
        {
            let mut guard = self.quiz_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers only when it changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Open player sockets.
    pub fn hub(&self) -> &ConnectionHub {
        &self.hub
    }

    /// Open lobbies.
    pub fn lobbies(&self) -> &LobbyRegistry {
        &self.lobbies
    }

    /// Live matches.
    pub fn matches(&self) -> &MatchRegistry {
        &self.matches
    }
}
