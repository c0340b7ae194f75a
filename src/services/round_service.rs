//! Round registry. Round deletion is a multi-step cascade that is not
//! transactional; every step is idempotent so a failed deletion is recovered
//! by running it again.

use std::fmt;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::RoundEntity,
    dto::{
        admin::{ActionResponse, NameRequest},
        common::RoundResponse,
    },
    error::ServiceError,
    services::{score_service, totals},
    state::SharedState,
};

/// Steps of the round deletion cascade, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStep {
    /// Delete every score row of the round.
    PurgeScores,
    /// Re-derive every team total from the remaining scores.
    RecomputeTotals,
    /// Remove the round row itself.
    DropRound,
}

impl fmt::Display for DeletionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeletionStep::PurgeScores => "purge scores",
            DeletionStep::RecomputeTotals => "recompute totals",
            DeletionStep::DropRound => "drop round",
        };
        f.write_str(label)
    }
}

/// All rounds, oldest first.
pub async fn list_rounds(state: &SharedState) -> Result<Vec<RoundResponse>, ServiceError> {
    let store = state.require_store().await?;
    let rounds = store.list_rounds().await?;
    Ok(rounds.into_iter().map(RoundResponse::from).collect())
}

/// Create a round from a validated request. Duplicate names are rejected by the store.
pub async fn create_round(
    state: &SharedState,
    request: NameRequest,
) -> Result<RoundResponse, ServiceError> {
    let store = state.require_store().await?;
    let round = RoundEntity::new(request.name.trim());
    store.insert_round(round.clone()).await?;
    info!(round_id = %round.id, name = %round.name, "round created");
    Ok(round.into())
}

/// Show or hide a round's scores on the public history.
pub async fn set_round_revealed(
    state: &SharedState,
    round_id: Uuid,
    is_revealed: bool,
) -> Result<RoundResponse, ServiceError> {
    let store = state.require_store().await?;
    if !store.set_round_revealed(round_id, is_revealed).await? {
        return Err(round_not_found(round_id));
    }

    let round = store
        .find_round(round_id)
        .await?
        .ok_or_else(|| round_not_found(round_id))?;
    info!(%round_id, is_revealed, "round visibility updated");
    Ok(round.into())
}

/// Delete a round: purge its scores, recompute every team total, then drop the round row.
///
/// Totals are recomputed before the row is removed so they never include
/// scores of a round that is gone. A failure part-way leaves a round without
/// scores, which a second call cleans up.
pub async fn delete_round(
    state: &SharedState,
    round_id: Uuid,
) -> Result<ActionResponse, ServiceError> {
    let store = state.require_store().await?;
    if store.find_round(round_id).await?.is_none() {
        return Err(round_not_found(round_id));
    }

    let mut step = DeletionStep::PurgeScores;
    let outcome = async {
        let purged = score_service::delete_scores_for_round(state, round_id).await?;
        debug!(%round_id, %step, purged, "round deletion step done");

        step = DeletionStep::RecomputeTotals;
        totals::recompute_all(store.as_ref()).await?;
        debug!(%round_id, %step, "round deletion step done");

        step = DeletionStep::DropRound;
        if !store.delete_round(round_id).await? {
            debug!(%round_id, "round row already removed");
        }
        Ok::<(), ServiceError>(())
    }
    .await;

    if let Err(err) = outcome {
        warn!(%round_id, %step, error = %err, "round deletion stopped; retry to finish");
        return Err(err);
    }

    info!(%round_id, "round deleted and totals recalculated");
    Ok(ActionResponse {
        message: "Round deleted and scores recalculated.".into(),
    })
}

fn round_not_found(round_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("round `{round_id}` not found"))
}
