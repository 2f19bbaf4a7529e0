//! Account handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use core_kernel::AccountId;
use domain_ledger::{Account, LedgerStore};

use crate::auth::Claims;
use crate::dto::account::*;
use crate::{error::ApiError, AppState};

/// Loads an account the caller may see
///
/// Unknown accounts and accounts the caller has no right to look at both
/// come back as the same 404.
pub(crate) async fn visible_account<S: LedgerStore>(
    state: &AppState<S>,
    claims: &Claims,
    account_id: AccountId,
) -> Result<Account, ApiError> {
    let account = state.engine.account(account_id).await?;
    if !claims.can_access(&account) {
        return Err(ApiError::account_not_found());
    }
    Ok(account)
}

fn require_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.is_admin() {
        Ok(())
    } else {
        warn!(user = %claims.sub, "Administrator role required");
        Err(ApiError::Forbidden("administrator role required".to_string()))
    }
}

/// Opens an account
pub async fn open_account<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    require_admin(&claims)?;
    request.validate()?;

    let account = state
        .engine
        .open_account(request.owner(), &request.opening_balance)
        .await?;

    info!(
        account = %account.id(),
        owner = %account.owner_id(),
        user = %claims.sub,
        "Account opened"
    );
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Gets an account by ID
pub async fn get_account<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = visible_account(&state, &claims, AccountId::from_uuid(id)).await?;
    Ok(Json(account.into()))
}

/// Moves an account through its lifecycle
pub async fn change_state<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeStateRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account_id = AccountId::from_uuid(id);
    visible_account(&state, &claims, account_id).await?;
    require_admin(&claims)?;

    let account = state
        .engine
        .change_state(account_id, request.state)
        .await
        .map_err(|e| {
            warn!(
                account = %account_id,
                requested = %request.state,
                error = %e,
                "State change rejected"
            );
            ApiError::from(e)
        })?;

    info!(
        account = %account_id,
        state = %account.state(),
        user = %claims.sub,
        "Account state changed"
    );
    Ok(Json(account.into()))
}
