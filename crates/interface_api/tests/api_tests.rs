//! HTTP API tests
//!
//! Drive the router with `tower::ServiceExt::oneshot` over the in-memory store.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use core_kernel::CustomerId;
use domain_ledger::{Account, AccountState, InMemoryLedgerStore};
use interface_api::{
    auth::{create_token, roles},
    config::ApiConfig,
    create_router,
};
use test_utils::{EngineFixture, TestAccountBuilder};

struct TestApp {
    router: Router,
    fixture: EngineFixture<InMemoryLedgerStore>,
    config: ApiConfig,
}

impl TestApp {
    fn new() -> Self {
        Self::with_fixture(EngineFixture::in_memory())
    }

    fn with_fixture(fixture: EngineFixture<InMemoryLedgerStore>) -> Self {
        let config = ApiConfig {
            jwt_secret: "api-test-secret".to_string(),
            ..Default::default()
        };
        let router = create_router(fixture.engine.clone(), config.clone());
        Self {
            router,
            fixture,
            config,
        }
    }

    fn admin_token(&self) -> String {
        create_token("ops-1", vec![roles::ADMIN.to_string()], &self.config.jwt_secret, 300).unwrap()
    }

    fn customer_token(&self, customer: CustomerId) -> String {
        create_token(
            &customer.as_uuid().to_string(),
            vec![roles::CUSTOMER.to_string()],
            &self.config.jwt_secret,
            300,
        )
        .unwrap()
    }

    async fn account(&self, balance: &str) -> Account {
        TestAccountBuilder::new()
            .opening_balance(balance)
            .open(&self.fixture.engine)
            .await
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::get(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn send_json(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn movement(&self, account: &Account, token: &str, body: Value) -> (StatusCode, Value) {
        let uri = format!("/api/v1/accounts/{}/movements", account.id().as_uuid());
        self.send_json("POST", &uri, token, body).await
    }
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let app = TestApp::new();
        let (status, body) = app
            .send(Request::get("/health").body(Body::empty()).unwrap())
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_pings_store() {
        let app = TestApp::new();
        let (status, body) = app
            .send(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = TestApp::new();
        let (status, body) = app
            .send(Request::get("/api/v1/statements").body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
        assert_eq!(body["message"], "Unauthorized");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_unauthorized() {
        let app = TestApp::new();
        let token = create_token("ops-1", vec![roles::ADMIN.to_string()], "wrong", 300).unwrap();
        let account = app.account("10.00").await;

        let (status, body) = app
            .get(&format!("/api/v1/accounts/{}", account.id().as_uuid()), &token)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_stranger_sees_not_found() {
        let app = TestApp::new();
        let account = app.account("10.00").await;
        let stranger = app.customer_token(CustomerId::new());

        let (status, body) = app
            .get(&format!("/api/v1/accounts/{}", account.id().as_uuid()), &stranger)
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_customer_cannot_open_accounts() {
        let app = TestApp::new();
        let customer = CustomerId::new();
        let token = app.customer_token(customer);

        let (status, body) = app
            .send_json(
                "POST",
                "/api/v1/accounts",
                &token,
                json!({ "owner_id": customer.as_uuid(), "opening_balance": "10.00" }),
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
    }
}

mod account_tests {
    use super::*;

    #[tokio::test]
    async fn test_admin_opens_account() {
        let app = TestApp::new();
        let owner = CustomerId::new();

        let (status, body) = app
            .send_json(
                "POST",
                "/api/v1/accounts",
                &app.admin_token(),
                json!({ "owner_id": owner.as_uuid(), "opening_balance": "2000.005" }),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["balance"], "2000.00");
        assert_eq!(body["state"], "active");
        assert_eq!(body["owner_id"], owner.as_uuid().to_string());
    }

    #[tokio::test]
    async fn test_owner_reads_own_account() {
        let app = TestApp::new();
        let account = app.account("55.10").await;
        let token = app.customer_token(account.owner_id());

        let (status, body) = app
            .get(&format!("/api/v1/accounts/{}", account.id().as_uuid()), &token)
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], "55.10");
    }

    #[tokio::test]
    async fn test_deactivation_with_balance_conflicts() {
        let app = TestApp::new();
        let account = app.account("1.00").await;

        let (status, body) = app
            .send_json(
                "PUT",
                &format!("/api/v1/accounts/{}/state", account.id().as_uuid()),
                &app.admin_token(),
                json!({ "state": "inactive" }),
            )
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");
    }

    #[tokio::test]
    async fn test_blocked_account_rejects_movements_as_not_found() {
        let app = TestApp::new();
        let account = app.account("100.00").await;
        let admin = app.admin_token();

        let (status, body) = app
            .send_json(
                "PUT",
                &format!("/api/v1/accounts/{}/state", account.id().as_uuid()),
                &admin,
                json!({ "state": "blocked" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "blocked");

        let (status, _) = app
            .movement(&account, &admin, json!({ "type": "CREDIT", "amount": "5.00" }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_owner_loses_sight_of_inactive_account() {
        let app = TestApp::new();
        let account = TestAccountBuilder::new()
            .inactive()
            .open(&app.fixture.engine)
            .await
            .unwrap();
        assert_eq!(account.state(), AccountState::Inactive);

        let uri = format!("/api/v1/accounts/{}", account.id().as_uuid());
        let (owner_status, _) = app.get(&uri, &app.customer_token(account.owner_id())).await;
        let (admin_status, _) = app.get(&uri, &app.admin_token()).await;

        assert_eq!(owner_status, StatusCode::NOT_FOUND);
        assert_eq!(admin_status, StatusCode::OK);
    }
}

mod movement_tests {
    use super::*;

    #[tokio::test]
    async fn test_owner_debits_and_actor_is_recorded() {
        let app = TestApp::new();
        let account = app.account("2000.00").await;
        let token = app.customer_token(account.owner_id());

        let (status, body) = app
            .movement(
                &account,
                &token,
                json!({ "type": "DEBIT", "amount": "600.00", "note": "rent" }),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance_before"], "2000.00");
        assert_eq!(body["balance_after"], "1400.00");
        assert_eq!(body["actor"], account.owner_id().as_uuid().to_string());
        assert_eq!(body["note"], "rent");
    }

    #[tokio::test]
    async fn test_idempotency_header_replays_original() {
        let app = TestApp::new();
        let account = app.account("100.00").await;
        let token = app.admin_token();
        let uri = format!("/api/v1/accounts/{}/movements", account.id().as_uuid());

        let request = || {
            Request::post(&uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .header("Idempotency-Key", "retry-7")
                .body(Body::from(json!({ "type": "CREDIT", "amount": "25.00" }).to_string()))
                .unwrap()
        };

        let (first_status, first) = app.send(request()).await;
        let (second_status, second) = app.send(request()).await;

        assert_eq!(first_status, StatusCode::OK);
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(first["id"], second["id"]);
        assert_eq!(second["balance_after"], "125.00");

        let (_, list) = app.get(&uri, &token).await;
        assert_eq!(list.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_insufficient_funds_has_its_own_code() {
        let app = TestApp::new();
        let account = app.account("10.00").await;

        let (status, body) = app
            .movement(&account, &app.admin_token(), json!({ "type": "DEBIT", "amount": "10.01" }))
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "insufficient_funds");
    }

    #[tokio::test]
    async fn test_daily_cap_has_its_own_code() {
        let app = TestApp::with_fixture(EngineFixture::with_cap("100.00"));
        let account = app.account("500.00").await;
        let token = app.admin_token();

        let (status, _) = app
            .movement(&account, &token, json!({ "type": "DEBIT", "amount": "60.00" }))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .movement(&account, &token, json!({ "type": "DEBIT", "amount": "40.01" }))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "daily_cap_exceeded");
    }

    #[tokio::test]
    async fn test_malformed_amount_is_validation_error() {
        let app = TestApp::new();
        let account = app.account("10.00").await;
        let token = app.admin_token();

        for amount in ["abc", "-5", "0.004", "1e3"] {
            let (status, body) = app
                .movement(&account, &token, json!({ "type": "CREDIT", "amount": amount }))
                .await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "amount {}", amount);
            assert_eq!(body["error"], "validation_error");
        }
    }

    #[tokio::test]
    async fn test_list_respects_limit_newest_first() {
        let app = TestApp::new();
        let account = app.account("0.00").await;
        let token = app.admin_token();
        for amount in ["1.00", "2.00", "3.00"] {
            app.movement(&account, &token, json!({ "type": "CREDIT", "amount": amount }))
                .await;
        }

        let (status, list) = app
            .get(
                &format!("/api/v1/accounts/{}/movements?limit=2", account.id().as_uuid()),
                &token,
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        let list = list.as_array().cloned().unwrap_or_default();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["amount"], "3.00");
        assert_eq!(list[1]["amount"], "2.00");
    }
}

mod statement_tests {
    use super::*;
    use test_utils::TemporalFixtures;

    fn statement_uri(accounts: &[&Account]) -> String {
        let ids: Vec<String> = accounts.iter().map(|a| a.id().as_uuid().to_string()).collect();
        let day = TemporalFixtures::business_day();
        format!("/api/v1/statements?accounts={}&from={}&to={}", ids.join(","), day, day)
    }

    #[tokio::test]
    async fn test_owner_statement_totals() {
        let app = TestApp::new();
        let account = app.account("100.00").await;
        let token = app.customer_token(account.owner_id());
        app.movement(&account, &token, json!({ "type": "CREDIT", "amount": "50.00" }))
            .await;
        app.movement(&account, &token, json!({ "type": "DEBIT", "amount": "20.00" }))
            .await;

        let (status, body) = app.get(&statement_uri(&[&account]), &token).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["opening_balance"], "100.00");
        assert_eq!(body["closing_balance"], "130.00");
        assert_eq!(body["total_credits"], "50.00");
        assert_eq!(body["total_debits"], "20.00");
        assert_eq!(body["movements"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_customer_cannot_include_foreign_account() {
        let app = TestApp::new();
        let mine = app.account("10.00").await;
        let theirs = app.account("10.00").await;
        let token = app.customer_token(mine.owner_id());

        let (status, _) = app.get(&statement_uri(&[&mine, &theirs]), &token).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_statement_over_two_accounts() {
        let app = TestApp::new();
        let first = app.account("10.00").await;
        let second = app.account("15.00").await;

        let (status, body) = app
            .get(&statement_uri(&[&first, &second]), &app.admin_token())
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["opening_balance"], "25.00");
        assert_eq!(body["accounts"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_reversed_range_is_rejected() {
        let app = TestApp::new();
        let account = app.account("10.00").await;
        let uri = format!(
            "/api/v1/statements?accounts={}&from=2024-03-05&to=2024-03-04",
            account.id().as_uuid()
        );

        let (status, body) = app.get(&uri, &app.admin_token()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_error");
    }
}
