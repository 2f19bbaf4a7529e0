//! Movement records and requests
//!
//! A movement is the immutable fact left behind by every successful apply:
//! which account, which direction, how much, and the balance on either side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AccountId, Money, MovementId};

/// Direction of a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    /// Increases the balance
    Credit,
    /// Decreases the balance
    Debit,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Credit => "CREDIT",
            MovementType::Debit => "DEBIT",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREDIT" => Ok(MovementType::Credit),
            "DEBIT" => Ok(MovementType::Debit),
            other => Err(format!("unknown movement type '{}'", other)),
        }
    }
}

/// An applied credit or debit
///
/// The amount is always positive; the sign lives in `movement_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub account_id: AccountId,
    pub movement_type: MovementType,
    pub amount: Money,
    pub balance_before: Money,
    pub balance_after: Money,
    /// Assigned by the engine at apply time
    pub timestamp: DateTime<Utc>,
    /// 1-based position in the account's ledger
    pub sequence: u64,
    pub idempotency_key: Option<String>,
    pub note: Option<String>,
    pub actor: Option<String>,
}

impl Movement {
    /// Checks `balance_after = balance_before ± amount`
    pub fn is_consistent(&self) -> bool {
        let expected = match self.movement_type {
            MovementType::Credit => self.balance_before.checked_add(&self.amount),
            MovementType::Debit => self.balance_before.checked_sub(&self.amount),
        };
        self.amount.is_positive() && expected == Ok(self.balance_after)
    }

    /// Key that reproduces ledger order for a single account
    pub fn ordering_key(&self) -> (DateTime<Utc>, u64, MovementId) {
        (self.timestamp, self.sequence, self.id)
    }
}

/// A request to apply a movement
///
/// The amount stays a raw decimal string until the engine normalizes it with
/// the configured rounding mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRequest {
    pub account_id: AccountId,
    pub movement_type: MovementType,
    pub amount: String,
    pub idempotency_key: Option<String>,
    pub note: Option<String>,
    pub actor: String,
}

impl MovementRequest {
    pub fn new(
        account_id: AccountId,
        movement_type: MovementType,
        amount: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            movement_type,
            amount: amount.into(),
            idempotency_key: None,
            note: None,
            actor: actor.into(),
        }
    }

    pub fn credit(
        account_id: AccountId,
        amount: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self::new(account_id, MovementType::Credit, amount, actor)
    }

    pub fn debit(
        account_id: AccountId,
        amount: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self::new(account_id, MovementType::Debit, amount, actor)
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// The idempotency key, trimmed; blank keys count as absent
    pub fn normalized_key(&self) -> Option<&str> {
        self.idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(movement_type: MovementType, before: i64, amount: i64, after: i64) -> Movement {
        Movement {
            id: MovementId::new_v7(),
            account_id: AccountId::new(),
            movement_type,
            amount: Money::from_minor(amount),
            balance_before: Money::from_minor(before),
            balance_after: Money::from_minor(after),
            timestamp: Utc::now(),
            sequence: 1,
            idempotency_key: None,
            note: None,
            actor: None,
        }
    }

    #[test]
    fn test_consistency_check() {
        assert!(movement(MovementType::Credit, 100, 50, 150).is_consistent());
        assert!(movement(MovementType::Debit, 100, 50, 50).is_consistent());
        assert!(!movement(MovementType::Debit, 100, 50, 150).is_consistent());
        assert!(!movement(MovementType::Credit, 100, 0, 100).is_consistent());
    }

    #[test]
    fn test_movement_type_wire_format() {
        assert_eq!(serde_json::to_string(&MovementType::Debit).unwrap(), "\"DEBIT\"");
        assert_eq!("credit".parse::<MovementType>().unwrap(), MovementType::Credit);
        assert!("refund".parse::<MovementType>().is_err());
    }

    #[test]
    fn test_blank_idempotency_key_is_ignored() {
        let request =
            MovementRequest::credit(AccountId::new(), "1.00", "teller").with_idempotency_key("   ");
        assert_eq!(request.normalized_key(), None);

        let request = request.with_idempotency_key(" abc ");
        assert_eq!(request.normalized_key(), Some("abc"));
    }
}
