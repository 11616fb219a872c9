use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    dao::game_store::GameStore,
    error::ServiceError,
    services::game_service::{GameLifecycle, LifecycleSettings},
};

/// Handle passed to every route and background task.
pub type SharedState = Arc<AppState>;

/// Central application state holding the storage handle shared by all requests.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    degraded: watch::Sender<bool>,
    settings: LifecycleSettings,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(settings: LifecycleSettings) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            game_store: RwLock::new(None),
            degraded: degraded_tx,
            settings,
        })
    }

    /// State with `store` already installed, skipping degraded mode.
    pub fn with_store(store: Arc<dyn GameStore>, settings: LifecycleSettings) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        Arc::new(Self {
            game_store: RwLock::new(Some(store)),
            degraded: degraded_tx,
            settings,
        })
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn install_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    #[cfg(test)]
    pub(crate) fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Lifecycle manager bound to the installed store.
    ///
    /// Fails with [`ServiceError::Degraded`] while no store is installed or the
    /// installed one is failing its health checks.
    pub async fn lifecycle(&self) -> Result<GameLifecycle, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        let store = self.game_store().await.ok_or(ServiceError::Degraded)?;
        Ok(GameLifecycle::new(store, self.settings))
    }
}
