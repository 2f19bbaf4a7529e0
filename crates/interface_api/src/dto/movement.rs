//! Movement DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{AccountId, Money, MovementId};
use domain_ledger::{Movement, MovementRequest, MovementType};

/// Default page size for `GET /accounts/:id/movements`
pub const DEFAULT_MOVEMENT_LIMIT: usize = 50;

/// Body of `POST /accounts/:id/movements`
#[derive(Debug, Deserialize, Validate)]
pub struct ApplyMovementRequest {
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    #[validate(length(min = 1, max = 32))]
    pub amount: String,
    #[validate(length(max = 128))]
    pub idempotency_key: Option<String>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

impl ApplyMovementRequest {
    /// Builds the engine request
    ///
    /// A key from the `Idempotency-Key` header wins over the body field.
    pub fn into_request(
        self,
        account_id: AccountId,
        header_key: Option<String>,
        actor: &str,
    ) -> MovementRequest {
        let mut request = MovementRequest::new(account_id, self.movement_type, self.amount, actor);
        request.idempotency_key = header_key.or(self.idempotency_key);
        request.note = self.note;
        request
    }
}

#[derive(Debug, Deserialize)]
pub struct MovementsQuery {
    pub limit: Option<usize>,
}

impl MovementsQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_MOVEMENT_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct MovementResponse {
    pub id: MovementId,
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub amount: Money,
    pub balance_before: Money,
    pub balance_after: Money,
    pub timestamp: DateTime<Utc>,
    pub sequence: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

impl From<Movement> for MovementResponse {
    fn from(movement: Movement) -> Self {
        Self {
            id: movement.id,
            account_id: movement.account_id,
            movement_type: movement.movement_type,
            amount: movement.amount,
            balance_before: movement.balance_before,
            balance_after: movement.balance_after,
            timestamp: movement.timestamp,
            sequence: movement.sequence,
            idempotency_key: movement.idempotency_key,
            note: movement.note,
            actor: movement.actor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(key: Option<&str>) -> ApplyMovementRequest {
        ApplyMovementRequest {
            movement_type: MovementType::Credit,
            amount: "10.00".to_string(),
            idempotency_key: key.map(str::to_string),
            note: None,
        }
    }

    #[test]
    fn test_header_key_wins_over_body() {
        let request = body(Some("from-body")).into_request(
            AccountId::new(),
            Some("from-header".to_string()),
            "u",
        );
        assert_eq!(request.normalized_key(), Some("from-header"));
    }

    #[test]
    fn test_body_key_used_without_header() {
        let request = body(Some("from-body")).into_request(AccountId::new(), None, "u");
        assert_eq!(request.normalized_key(), Some("from-body"));
        assert_eq!(request.actor, "u");
    }

    #[test]
    fn test_type_field_is_uppercase() {
        let parsed: ApplyMovementRequest =
            serde_json::from_str(r#"{"type":"DEBIT","amount":"5.00"}"#).unwrap();
        assert_eq!(parsed.movement_type, MovementType::Debit);
        assert_eq!(MovementsQuery { limit: None }.limit(), DEFAULT_MOVEMENT_LIMIT);
    }
}
