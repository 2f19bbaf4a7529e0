//! Statement handlers

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use domain_ledger::LedgerStore;

use crate::auth::Claims;
use crate::dto::statement::*;
use crate::handlers::accounts::visible_account;
use crate::{error::ApiError, AppState};

/// Statement over one or more accounts for an inclusive date range
///
/// Non-admin callers must be able to see every listed account.
pub async fn get_statement<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<StatementQuery>,
) -> Result<Json<StatementResponse>, ApiError> {
    let account_ids = query.account_ids()?;

    if !claims.is_admin() {
        for account_id in &account_ids {
            visible_account(&state, &claims, *account_id).await?;
        }
    }

    let statement = state
        .engine
        .statement(&account_ids, query.from, query.to)
        .await?;
    Ok(Json(statement.into()))
}
