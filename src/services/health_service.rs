use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the degraded flag while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        None => warn!("no storage installed (degraded mode)"),
    }

    HealthResponse::from(state.is_degraded())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig, dto::health::HealthStatus, services::score_service::tests::memory_state,
        state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_without_store() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn reports_ok_with_store() {
        let state = memory_state().await;
        assert_eq!(health_status(&state).await.status, HealthStatus::Ok);
    }
}
