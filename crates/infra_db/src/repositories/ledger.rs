//! Ledger repository
//!
//! SQL for the `accounts` and `movements` tables. Every query takes an
//! executor so the same statement runs against the pool for plain reads and
//! against an open transaction inside a unit of work.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

use core_kernel::{AccountId, CustomerId, Money, MovementId};
use domain_ledger::{Account, AccountSnapshot, AccountState, Movement, MovementType};

use crate::error::DatabaseError;

const ACCOUNT_COLUMNS: &str = "account_id, owner_id, state, balance, opening_balance, \
                               opened_at, version, last_movement_at";

const MOVEMENT_COLUMNS: &str = "movement_id, account_id, sequence, movement_type, amount, \
                                balance_before, balance_after, occurred_at, idempotency_key, \
                                note, actor";

/// Account lifecycle state as stored in PostgreSQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "account_state", rename_all = "snake_case")]
pub enum DbAccountState {
    Active,
    Inactive,
    Blocked,
}

impl From<AccountState> for DbAccountState {
    fn from(state: AccountState) -> Self {
        match state {
            AccountState::Active => DbAccountState::Active,
            AccountState::Inactive => DbAccountState::Inactive,
            AccountState::Blocked => DbAccountState::Blocked,
        }
    }
}

impl From<DbAccountState> for AccountState {
    fn from(state: DbAccountState) -> Self {
        match state {
            DbAccountState::Active => AccountState::Active,
            DbAccountState::Inactive => AccountState::Inactive,
            DbAccountState::Blocked => AccountState::Blocked,
        }
    }
}

/// Movement direction as stored in PostgreSQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "movement_type", rename_all = "snake_case")]
pub enum DbMovementType {
    Credit,
    Debit,
}

impl From<MovementType> for DbMovementType {
    fn from(movement_type: MovementType) -> Self {
        match movement_type {
            MovementType::Credit => DbMovementType::Credit,
            MovementType::Debit => DbMovementType::Debit,
        }
    }
}

impl From<DbMovementType> for MovementType {
    fn from(movement_type: DbMovementType) -> Self {
        match movement_type {
            DbMovementType::Credit => MovementType::Credit,
            DbMovementType::Debit => MovementType::Debit,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub account_id: Uuid,
    pub owner_id: Uuid,
    pub state: DbAccountState,
    pub balance: Decimal,
    pub opening_balance: Decimal,
    pub opened_at: DateTime<Utc>,
    pub version: i64,
    pub last_movement_at: Option<DateTime<Utc>>,
}

impl TryFrom<AccountRow> for Account {
    type Error = DatabaseError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account::restore(AccountSnapshot {
            id: AccountId::from_uuid(row.account_id),
            owner_id: CustomerId::from_uuid(row.owner_id),
            state: row.state.into(),
            balance: money("accounts.balance", row.balance)?,
            opening_balance: money("accounts.opening_balance", row.opening_balance)?,
            opened_at: row.opened_at,
            version: u64::try_from(row.version)
                .map_err(|e| DatabaseError::decode("accounts.version", e))?,
            last_movement_at: row.last_movement_at,
        }))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MovementRow {
    pub movement_id: Uuid,
    pub account_id: Uuid,
    pub sequence: i64,
    pub movement_type: DbMovementType,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub occurred_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
    pub note: Option<String>,
    pub actor: Option<String>,
}

impl TryFrom<MovementRow> for Movement {
    type Error = DatabaseError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        Ok(Movement {
            id: MovementId::from_uuid(row.movement_id),
            account_id: AccountId::from_uuid(row.account_id),
            movement_type: row.movement_type.into(),
            amount: money("movements.amount", row.amount)?,
            balance_before: money("movements.balance_before", row.balance_before)?,
            balance_after: money("movements.balance_after", row.balance_after)?,
            timestamp: row.occurred_at,
            sequence: u64::try_from(row.sequence)
                .map_err(|e| DatabaseError::decode("movements.sequence", e))?,
            idempotency_key: row.idempotency_key,
            note: row.note,
            actor: row.actor,
        })
    }
}

fn money(column: &str, value: Decimal) -> Result<Money, DatabaseError> {
    Money::try_from(value).map_err(|e| DatabaseError::decode(column, e))
}

fn to_i64(value: u64, column: &str) -> Result<i64, DatabaseError> {
    i64::try_from(value).map_err(|e| DatabaseError::decode(column, e))
}

fn into_movements(rows: Vec<MovementRow>) -> Result<Vec<Movement>, DatabaseError> {
    rows.into_iter().map(Movement::try_from).collect()
}

pub async fn insert_account<'e, E: PgExecutor<'e>>(
    executor: E,
    account: &Account,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO accounts (
            account_id, owner_id, state, balance, opening_balance,
            opened_at, version, last_movement_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(*account.id().as_uuid())
    .bind(*account.owner_id().as_uuid())
    .bind(DbAccountState::from(account.state()))
    .bind(account.balance().amount())
    .bind(account.opening_balance().amount())
    .bind(account.opened_at())
    .bind(to_i64(account.version(), "accounts.version")?)
    .bind(account.last_movement_at())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_account<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: AccountId,
) -> Result<Option<Account>, DatabaseError> {
    let sql = format!("SELECT {} FROM accounts WHERE account_id = $1", ACCOUNT_COLUMNS);
    let row = sqlx::query_as::<_, AccountRow>(&sql)
        .bind(*account_id.as_uuid())
        .fetch_optional(executor)
        .await?;
    row.map(Account::try_from).transpose()
}

/// Reads the account row and holds a row lock until the transaction ends
pub async fn lock_account<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: AccountId,
) -> Result<Option<Account>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM accounts WHERE account_id = $1 FOR UPDATE",
        ACCOUNT_COLUMNS
    );
    let row = sqlx::query_as::<_, AccountRow>(&sql)
        .bind(*account_id.as_uuid())
        .fetch_optional(executor)
        .await?;
    row.map(Account::try_from).transpose()
}

pub async fn update_account<'e, E: PgExecutor<'e>>(
    executor: E,
    account: &Account,
) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET state = $2, balance = $3, version = $4, last_movement_at = $5
        WHERE account_id = $1
        "#,
    )
    .bind(*account.id().as_uuid())
    .bind(DbAccountState::from(account.state()))
    .bind(account.balance().amount())
    .bind(to_i64(account.version(), "accounts.version")?)
    .bind(account.last_movement_at())
    .execute(executor)
    .await?;

    if result.rows_affected() != 1 {
        return Err(DatabaseError::QueryFailed(format!(
            "account {} not updated",
            account.id()
        )));
    }
    Ok(())
}

pub async fn insert_movement<'e, E: PgExecutor<'e>>(
    executor: E,
    movement: &Movement,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO movements (
            movement_id, account_id, sequence, movement_type, amount,
            balance_before, balance_after, occurred_at, idempotency_key, note, actor
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(*movement.id.as_uuid())
    .bind(*movement.account_id.as_uuid())
    .bind(to_i64(movement.sequence, "movements.sequence")?)
    .bind(DbMovementType::from(movement.movement_type))
    .bind(movement.amount.amount())
    .bind(movement.balance_before.amount())
    .bind(movement.balance_after.amount())
    .bind(movement.timestamp)
    .bind(movement.idempotency_key.as_deref())
    .bind(movement.note.as_deref())
    .bind(movement.actor.as_deref())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_movement_by_key<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: AccountId,
    key: &str,
) -> Result<Option<Movement>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM movements WHERE account_id = $1 AND idempotency_key = $2",
        MOVEMENT_COLUMNS
    );
    let row = sqlx::query_as::<_, MovementRow>(&sql)
        .bind(*account_id.as_uuid())
        .bind(key)
        .fetch_optional(executor)
        .await?;
    row.map(Movement::try_from).transpose()
}

/// Sum of debit amounts on the account with `start <= occurred_at < end`
pub async fn sum_debits<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: AccountId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Money, DatabaseError> {
    let total = sqlx::query_scalar::<_, Decimal>(
        r#"
        SELECT COALESCE(SUM(amount), 0)::NUMERIC(19, 2)
        FROM movements
        WHERE account_id = $1
          AND movement_type = 'debit'
          AND occurred_at >= $2
          AND occurred_at < $3
        "#,
    )
    .bind(*account_id.as_uuid())
    .bind(start)
    .bind(end)
    .fetch_one(executor)
    .await?;
    money("movements.amount", total)
}

pub async fn recent_movements<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: AccountId,
    limit: i64,
) -> Result<Vec<Movement>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM movements WHERE account_id = $1 ORDER BY sequence DESC LIMIT $2",
        MOVEMENT_COLUMNS
    );
    let rows = sqlx::query_as::<_, MovementRow>(&sql)
        .bind(*account_id.as_uuid())
        .bind(limit)
        .fetch_all(executor)
        .await?;
    into_movements(rows)
}

pub async fn movements_between<'e, E: PgExecutor<'e>>(
    executor: E,
    account_ids: &[Uuid],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Movement>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM movements \
         WHERE account_id = ANY($1) AND occurred_at >= $2 AND occurred_at < $3 \
         ORDER BY occurred_at, sequence, movement_id",
        MOVEMENT_COLUMNS
    );
    let rows = sqlx::query_as::<_, MovementRow>(&sql)
        .bind(account_ids)
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await?;
    into_movements(rows)
}

pub async fn ping<'e, E: PgExecutor<'e>>(executor: E) -> Result<(), DatabaseError> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(executor).await?;
    Ok(())
}
