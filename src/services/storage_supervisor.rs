use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{quiz_store::QuizStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Open the quiz store and keep the shared state in degraded mode while it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn QuizStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "quiz store connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
                continue;
            }
        };

        state.set_quiz_store(store.clone()).await;
        info!("quiz store ready; leaving degraded mode");
        delay = INITIAL_DELAY;

        while watch_store(&state, store.as_ref()).await {}

        warn!("exhausted quiz store reconnect attempts; reopening");
        state.clear_quiz_store().await;
        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// One health poll; returns false once the store is considered lost.
async fn watch_store(state: &SharedState, store: &dyn QuizStore) -> bool {
    if store.health_check().await.is_ok() {
        if state.is_degraded() {
            info!("quiz store healthy again; leaving degraded mode");
            state.update_degraded(false);
        }
        sleep(HEALTH_POLL_INTERVAL).await;
        return true;
    }

    let mut reconnect_delay = INITIAL_DELAY;
    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "quiz store reconnected after failed health check");
                state.update_degraded(false);
                sleep(HEALTH_POLL_INTERVAL).await;
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(attempt, error = %err, "quiz store reconnect failed; entering degraded mode");
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "quiz store reconnect attempt failed");
                }
                sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::quiz_store::memory::MemoryQuizStore, state::AppState};

    #[tokio::test(start_paused = true)]
    async fn retries_until_the_store_opens() {
        let state = AppState::new(AppConfig::default());
        let mut attempts = 0;
        let supervisor = tokio::spawn(run(state.clone(), move || {
            attempts += 1;
            let outcome: Result<Arc<dyn QuizStore>, StorageError> = if attempts < 3 {
                Err(StorageError::unavailable(
                    "data directory missing".into(),
                    std::io::Error::other("missing"),
                ))
            } else {
                Ok(Arc::new(MemoryQuizStore::new()))
            };
            async move { outcome }
        }));

        sleep(Duration::from_millis(500)).await;
        assert!(state.is_degraded());

        sleep(Duration::from_secs(4)).await;
        assert!(!state.is_degraded());
        supervisor.abort();
    }
}
