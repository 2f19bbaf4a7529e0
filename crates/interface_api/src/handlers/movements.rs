//! Movement handlers

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Extension, Json,
};
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use core_kernel::AccountId;
use domain_ledger::LedgerStore;

use crate::auth::Claims;
use crate::dto::movement::*;
use crate::handlers::accounts::visible_account;
use crate::{error::ApiError, AppState};

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

fn header_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

/// Applies a credit or debit
///
/// Replays with a known idempotency key return the original movement.
pub async fn apply_movement<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<ApplyMovementRequest>,
) -> Result<Json<MovementResponse>, ApiError> {
    let account_id = AccountId::from_uuid(id);
    visible_account(&state, &claims, account_id).await?;
    body.validate()?;

    let request = body.into_request(account_id, header_key(&headers), &claims.sub);
    let movement_type = request.movement_type;

    let movement = state.engine.apply_movement(request).await.map_err(|e| {
        warn!(
            account = %account_id,
            movement_type = %movement_type,
            user = %claims.sub,
            error = %e,
            "Movement rejected"
        );
        ApiError::from(e)
    })?;

    Ok(Json(movement.into()))
}

/// Lists an account's latest movements, newest first
pub async fn list_movements<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Query(query): Query<MovementsQuery>,
) -> Result<Json<Vec<MovementResponse>>, ApiError> {
    let account_id = AccountId::from_uuid(id);
    visible_account(&state, &claims, account_id).await?;

    let movements = state.engine.movements(account_id, query.limit()).await?;
    Ok(Json(movements.into_iter().map(Into::into).collect()))
}
