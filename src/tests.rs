//! Integration tests for the lodge backend.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::notify::Notifier;
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some("test-api-key".to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        let config = Config {
            api_psk: psk.clone(),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            notify_url: None,
            notify_timeout: Duration::from_secs(1),
            default_location: "Templo".to_string(),
            term_years: 2,
        };

        let state = AppState {
            repo,
            notifier: Arc::new(Notifier::disabled()),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn delete(&self, path: &str) -> (u16, Value) {
        let resp = self.client.delete(self.url(path)).send().await.unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    /// Register a brother and return its id.
    async fn brother(&self, name: &str) -> String {
        let (status, body) = self
            .post("/api/brothers", json!({ "name": name, "degree": "mestre" }))
            .await;
        assert_eq!(status, 200);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Schedule an event and return the response data (`event` + `conflicts`).
    async fn event(&self, title: &str, date: &str, time: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/events",
                json!({ "title": title, "date": date, "time": time, "eventType": "sessao" }),
            )
            .await;
        assert_eq!(status, 200);
        body["data"].clone()
    }
}

// ==================== HEALTH & AUTH ====================

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    // Request without API key
    let resp = Client::new()
        .get(fixture.url("/api/brothers"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_psk() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/brothers"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_auth_bearer_token() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/brothers"))
        .header("Authorization", "Bearer test-api-key")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_auth_disabled_without_psk() {
    let fixture = TestFixture::with_psk(None).await;

    let (status, body) = fixture.get("/api/positions").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

// ==================== BROTHERS ====================

#[tokio::test]
async fn test_brother_crud() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/brothers",
            json!({
                "name": "José da Silva",
                "cim": "12345",
                "email": "jose@example.com",
                "initiationDate": "2015-05-13"
            }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["degree"], "aprendiz");
    assert_eq!(body["data"]["active"], true);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = fixture
        .put(
            &format!("/api/brothers/{}", id),
            json!({ "degree": "companheiro", "phone": "11 99999-0000" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["degree"], "companheiro");
    assert_eq!(body["data"]["name"], "José da Silva");
    assert_eq!(body["data"]["cim"], "12345");

    let (_, body) = fixture.get("/api/brothers?degree=companheiro").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = fixture.get("/api/brothers?active=false").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, _) = fixture.delete(&format!("/api/brothers/{}", id)).await;
    assert_eq!(status, 200);

    let (status, body) = fixture.get(&format!("/api/brothers/{}", id)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_brother_requires_name() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.post("/api/brothers", json!({ "name": "   " })).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// ==================== FINANCE ====================

#[tokio::test]
async fn test_expense_listed_with_formatted_amount() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/finance/transactions",
            json!({
                "type": "Despesa",
                "amount": 150.00,
                "date": "2024-03-01",
                "category": "Manutenção",
                "description": "Reparo do telhado"
            }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["amountFormatted"], "R$ 150,00");

    // Unrelated income must not show up in the expense list.
    fixture
        .post(
            "/api/finance/transactions",
            json!({
                "type": "Receita",
                "amount": 80,
                "date": "2024-03-02",
                "category": "Mensalidades"
            }),
        )
        .await;

    let (status, body) = fixture.get("/api/finance/transactions?type=Despesa").await;
    assert_eq!(status, 200);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["amountFormatted"], "R$ 150,00");
    assert_eq!(rows[0]["category"], "Manutenção");
    assert_eq!(rows[0]["type"], "Despesa");
    assert_eq!(rows[0]["date"], "2024-03-01");
}

#[tokio::test]
async fn test_transaction_reuses_category() {
    let fixture = TestFixture::new().await;

    for amount in [10, 20] {
        let (status, _) = fixture
            .post(
                "/api/finance/transactions",
                json!({
                    "type": "Receita",
                    "amount": amount,
                    "date": "2024-01-10",
                    "category": "Mensalidades"
                }),
            )
            .await;
        assert_eq!(status, 200);
    }

    let (_, body) = fixture.get("/api/finance/categories?type=Receita").await;
    let categories = body["data"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["name"], "Mensalidades");
}

#[tokio::test]
async fn test_transaction_validation() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/finance/transactions",
            json!({ "type": "Despesa", "amount": 0, "date": "2024-03-01", "category": "Luz" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = fixture
        .post(
            "/api/finance/transactions",
            json!({ "type": "Despesa", "amount": 10, "date": "2024-03-01", "category": "" }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, _) = fixture.get("/api/finance/transactions/missing").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_amounts_validated_after_rounding_to_cents() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/finance/transactions",
            json!({ "type": "Despesa", "amount": 0.004, "date": "2024-03-01", "category": "Luz" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = fixture
        .post(
            "/api/finance/budgets",
            json!({ "name": "Luz", "type": "Despesa", "amount": 0.004 }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = fixture
        .post(
            "/api/finance/goals",
            json!({ "name": "Reforma", "targetAmount": 0.001, "deadline": "2024-12-31" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = fixture
        .post(
            "/api/finance/transactions",
            json!({ "type": "Despesa", "amount": 12.344, "date": "2024-03-01", "category": "Luz" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["amount"].as_f64(), Some(12.34));

    let path = format!("/api/finance/transactions/{}", body["data"]["id"].as_str().unwrap());
    let (status, body) = fixture.put(&path, json!({ "amount": 0.001 })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_huge_amount_rejected_and_progress_still_served() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/finance/transactions",
            json!({ "type": "Despesa", "amount": 1e27, "date": "2024-03-01", "category": "Luz" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // The largest accepted amount against the smallest budget.
    let (status, _) = fixture
        .post(
            "/api/finance/transactions",
            json!({ "type": "Despesa", "amount": 1e15, "date": "2024-03-01", "category": "Luz" }),
        )
        .await;
    assert_eq!(status, 200);

    let (status, body) = fixture
        .post(
            "/api/finance/budgets",
            json!({ "name": "Luz", "type": "Despesa", "amount": 0.01, "period": "mensal" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["progress"]["percentage"].as_f64(), Some(100.0));

    let (status, _) = fixture.get("/api/finance/budgets").await;
    assert_eq!(status, 200);
    let (status, _) = fixture.get("/api/reports/finance").await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_budget_dates_can_be_cleared() {
    let fixture = TestFixture::new().await;

    let (_, body) = fixture
        .post(
            "/api/finance/budgets",
            json!({
                "name": "Luz",
                "type": "Despesa",
                "amount": 300,
                "startDate": "2024-01-01",
                "endDate": "2024-12-31"
            }),
        )
        .await;
    let path = format!("/api/finance/budgets/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = fixture.put(&path, json!({ "amount": 400 })).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["startDate"], "2024-01-01");
    assert_eq!(body["data"]["endDate"], "2024-12-31");

    let (status, body) = fixture.put(&path, json!({ "startDate": null })).await;
    assert_eq!(status, 200);
    assert!(body["data"]["startDate"].is_null());
    assert_eq!(body["data"]["endDate"], "2024-12-31");

    let (_, body) = fixture.get(&path).await;
    assert!(body["data"]["startDate"].is_null());
}

#[tokio::test]
async fn test_budget_progress_is_capped() {
    let fixture = TestFixture::new().await;

    let (_, body) = fixture
        .post(
            "/api/finance/transactions",
            json!({ "type": "Despesa", "amount": 150, "date": "2024-03-01", "category": "Manutenção" }),
        )
        .await;
    let category_id = body["data"]["categoryId"].as_str().unwrap().to_string();

    let (status, body) = fixture
        .post(
            "/api/finance/budgets",
            json!({ "name": "Manutenção anual", "type": "Despesa", "categoryId": category_id, "amount": 100 }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["progress"]["percentage"].as_f64(), Some(100.0));
    assert_eq!(body["data"]["progress"]["current"].as_f64(), Some(150.0));

    let (_, body) = fixture
        .post(
            "/api/finance/budgets",
            json!({ "name": "Despesas gerais", "type": "Despesa", "amount": 600, "period": "anual" }),
        )
        .await;
    assert_eq!(body["data"]["progress"]["percentage"].as_f64(), Some(25.0));

    let (_, body) = fixture.get("/api/finance/budgets").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_goal_counts_income_only() {
    let fixture = TestFixture::new().await;

    for (kind, amount) in [("Receita", 250), ("Despesa", 900)] {
        fixture
            .post(
                "/api/finance/transactions",
                json!({ "type": kind, "amount": amount, "date": "2024-04-01", "category": "Eventos" }),
            )
            .await;
    }

    let (status, body) = fixture
        .post(
            "/api/finance/goals",
            json!({ "name": "Reforma do templo", "targetAmount": 1000, "deadline": "2024-12-31" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["progress"]["current"].as_f64(), Some(250.0));
    assert_eq!(body["data"]["progress"]["percentage"].as_f64(), Some(25.0));
}

#[tokio::test]
async fn test_bank_account_balance() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/finance/accounts",
            json!({ "name": "Conta corrente", "bank": "Banco do Brasil", "initialBalance": 1000 }),
        )
        .await;
    assert_eq!(status, 200);
    let account_id = body["data"]["id"].as_str().unwrap().to_string();

    for (kind, amount) in [("Receita", 200), ("Despesa", 50)] {
        fixture
            .post(
                "/api/finance/transactions",
                json!({
                    "type": kind,
                    "amount": amount,
                    "date": "2024-02-01",
                    "category": "Diversos",
                    "bankAccountId": account_id
                }),
            )
            .await;
    }

    let (_, body) = fixture
        .get(&format!("/api/finance/accounts/{}", account_id))
        .await;
    assert_eq!(body["data"]["currentBalance"].as_f64(), Some(1150.0));
    assert_eq!(body["data"]["currentBalanceFormatted"], "R$ 1.150,00");
}

// ==================== POSITIONS ====================

#[tokio::test]
async fn test_position_reassignment_keeps_one_holder() {
    let fixture = TestFixture::new().await;
    let first = fixture.brother("Antônio Pereira").await;
    let second = fixture.brother("Benedito Souza").await;

    let (status, body) = fixture
        .post(
            "/api/positions",
            json!({ "positionType": "veneravel", "brotherId": first, "startDate": "2022-03-21" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["endDate"], "2024-03-21");
    assert_eq!(body["data"]["title"], "Venerável Mestre");

    let (status, _) = fixture
        .post(
            "/api/positions",
            json!({
                "positionType": "veneravel",
                "brotherId": second,
                "startDate": "2024-03-21",
                "endDate": "2025-03-21"
            }),
        )
        .await;
    assert_eq!(status, 200);

    // History first, then the active list.
    let (_, history) = fixture
        .get("/api/positions/history?positionType=veneravel")
        .await;
    let history = history["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["brotherId"], first.as_str());
    assert_eq!(history[0]["reason"], "substituido");

    let (_, active) = fixture.get("/api/positions").await;
    let active: Vec<&Value> = active["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["positionType"] == "veneravel")
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["brotherId"], second.as_str());
    assert_eq!(active[0]["endDate"], "2025-03-21");
}

#[tokio::test]
async fn test_position_assignment_errors() {
    let fixture = TestFixture::new().await;

    let (status, _) = fixture
        .post(
            "/api/positions",
            json!({ "positionType": "orador", "brotherId": "nobody", "startDate": "2024-01-01" }),
        )
        .await;
    assert_eq!(status, 404);

    let (status, body) = fixture.delete("/api/positions/orador").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = fixture.delete("/api/positions/chanceler").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_remove_position_archives_holder() {
    let fixture = TestFixture::new().await;
    let holder = fixture.brother("Carlos Lima").await;

    fixture
        .post(
            "/api/positions",
            json!({ "positionType": "tesoureiro", "brotherId": holder, "startDate": "2023-01-01" }),
        )
        .await;

    let (status, body) = fixture.delete("/api/positions/tesoureiro").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["reason"], "removido");

    let (_, body) = fixture.get("/api/positions").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

// ==================== AGENDA ====================

#[tokio::test]
async fn test_event_conflict_within_two_hours() {
    let fixture = TestFixture::new().await;

    let first = fixture.event("Sessão ordinária", "2024-05-10", "19:00").await;
    assert_eq!(first["conflicts"].as_array().unwrap().len(), 0);

    let second = fixture.event("Reunião da diretoria", "2024-05-10", "20:00").await;
    let conflicts = second["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["eventId"], first["event"]["id"]);
    assert_eq!(conflicts[0]["location"], "Templo");
}

#[tokio::test]
async fn test_event_no_conflict_beyond_threshold() {
    let fixture = TestFixture::new().await;

    fixture.event("Sessão ordinária", "2024-05-10", "19:00").await;
    let later = fixture.event("Ágape", "2024-05-10", "21:10").await;
    assert_eq!(later["conflicts"].as_array().unwrap().len(), 0);

    let other_day = fixture.event("Sessão magna", "2024-05-11", "19:00").await;
    assert_eq!(other_day["conflicts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_conflict_check_without_saving() {
    let fixture = TestFixture::new().await;
    fixture.event("Sessão ordinária", "2024-05-10", "19:00").await;

    let (status, body) = fixture
        .get("/api/events/conflicts?date=2024-05-10&time=19:30&location=templo")
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = fixture
        .get("/api/events/conflicts?date=2024-05-10&time=19:30&location=Sede%20social")
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (_, body) = fixture.get("/api/events").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_event_time_validation() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/events",
            json!({ "title": "Sessão", "date": "2024-05-10", "time": "7pm" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_requests_use_error_envelope() {
    let fixture = TestFixture::new().await;
    let brother = fixture.brother("Rui Barbosa").await;

    let (status, body) = fixture
        .post(
            "/api/positions",
            json!({ "positionType": "grao_mestre", "brotherId": brother, "startDate": "2024-01-01" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = fixture
        .post("/api/events", json!({ "date": "2024-05-10", "time": "20:00" }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = fixture.get("/api/brothers?active=maybe").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture
        .client
        .post(fixture.url("/api/brothers"))
        .body("name=Rui")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// ==================== ATTENDANCE ====================

#[tokio::test]
async fn test_frequency_counts_only_finalized_sessions() {
    let fixture = TestFixture::new().await;
    let present = fixture.brother("Daniel Rocha").await;
    let absent = fixture.brother("Eduardo Alves").await;

    let event = fixture.event("Sessão ordinária", "2024-06-04", "20:00").await;
    let (status, body) = fixture
        .post("/api/sessions", json!({ "eventId": event["event"]["id"] }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "aberta");
    let session_id = body["data"]["id"].as_str().unwrap().to_string();

    let path = format!("/api/sessions/{}/attendance", session_id);
    let (status, first) = fixture
        .post(&path, json!({ "brotherId": present, "status": "presente" }))
        .await;
    assert_eq!(status, 200);
    fixture
        .post(&path, json!({ "brotherId": absent, "status": "ausente" }))
        .await;

    // Nothing finalized yet: everyone is at zero.
    let (_, body) = fixture.get("/api/attendance/frequency").await;
    for line in body["data"].as_array().unwrap() {
        assert_eq!(line["percentage"], 0);
        assert_eq!(line["totalSessions"], 0);
    }

    let (status, body) = fixture
        .post(&format!("/api/sessions/{}/finalize", session_id), json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "finalizada");

    let (_, body) = fixture.get("/api/attendance/frequency").await;
    let lines = body["data"].as_array().unwrap();
    let line_of = |id: &str| {
        lines
            .iter()
            .find(|l| l["brotherId"] == id)
            .cloned()
            .unwrap()
    };
    assert_eq!(line_of(&present)["percentage"], 100);
    assert_eq!(line_of(&absent)["percentage"], 0);

    // Excusing the absence turns it into a presence.
    let (_, records) = fixture.get(&path).await;
    let absent_record = records["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["brotherId"] == absent.as_str())
        .cloned()
        .unwrap();
    let (status, _) = fixture
        .put(
            &format!("/api/attendance/{}", absent_record["id"].as_str().unwrap()),
            json!({ "status": "justificado" }),
        )
        .await;
    assert_eq!(status, 200);

    let (_, body) = fixture.get("/api/attendance/frequency").await;
    let excused = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["brotherId"] == absent.as_str())
        .cloned()
        .unwrap();
    assert_eq!(excused["percentage"], 100);
    assert!(first["data"]["id"].is_string());
}

#[tokio::test]
async fn test_duplicate_attendance_returns_existing_record() {
    let fixture = TestFixture::new().await;
    let brother = fixture.brother("Fábio Nunes").await;
    let event = fixture.event("Sessão ordinária", "2024-06-11", "20:00").await;
    let (_, body) = fixture
        .post("/api/sessions", json!({ "eventId": event["event"]["id"] }))
        .await;
    let path = format!(
        "/api/sessions/{}/attendance",
        body["data"]["id"].as_str().unwrap()
    );

    let (_, first) = fixture
        .post(&path, json!({ "brotherId": brother, "status": "presente" }))
        .await;
    let (status, second) = fixture
        .post(&path, json!({ "brotherId": brother, "status": "ausente" }))
        .await;

    assert_eq!(status, 200);
    assert_eq!(second["success"], true);
    assert_eq!(second["data"]["id"], first["data"]["id"]);
    assert_eq!(second["data"]["status"], "presente");

    let (_, records) = fixture.get(&path).await;
    assert_eq!(records["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_attendance_for_unknown_brother_is_not_found() {
    let fixture = TestFixture::new().await;
    let event = fixture.event("Sessão magna", "2024-06-24", "20:00").await;
    let (_, body) = fixture
        .post("/api/sessions", json!({ "eventId": event["event"]["id"] }))
        .await;
    let path = format!(
        "/api/sessions/{}/attendance",
        body["data"]["id"].as_str().unwrap()
    );

    let (status, body) = fixture
        .post(&path, json!({ "brotherId": "nobody", "status": "presente" }))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_session_requires_existing_event() {
    let fixture = TestFixture::new().await;

    let (status, _) = fixture
        .post("/api/sessions", json!({ "eventId": "missing" }))
        .await;
    assert_eq!(status, 404);
}

// ==================== MINUTES ====================

#[tokio::test]
async fn test_minutes_signatures() {
    let fixture = TestFixture::new().await;
    let secretary = fixture.brother("Gilberto Ramos").await;

    let (status, body) = fixture
        .post(
            "/api/minutes",
            json!({
                "title": "Ata da sessão de 04/06",
                "meetingDate": "2024-06-04",
                "content": "<p>Abertos os trabalhos...</p>"
            }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "rascunho");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let sign_path = format!("/api/minutes/{}/signatures", id);
    let (status, body) = fixture
        .post(&sign_path, json!({ "brotherId": secretary, "role": "Secretário" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["brotherName"], "Gilberto Ramos");

    let (status, body) = fixture
        .post(&sign_path, json!({ "brotherId": secretary, "role": "Secretário" }))
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, body) = fixture
        .put(&format!("/api/minutes/{}", id), json!({ "status": "aprovada" }))
        .await;
    assert_eq!(body["data"]["status"], "aprovada");
    assert_eq!(body["data"]["content"], "<p>Abertos os trabalhos...</p>");

    let (_, body) = fixture.get(&format!("/api/minutes/{}", id)).await;
    assert_eq!(body["data"]["signatures"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["title"], "Ata da sessão de 04/06");
}

// ==================== CONTACT & DOCUMENTS ====================

#[tokio::test]
async fn test_contact_form_is_public() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .post(fixture.url("/api/contact"))
        .json(&json!({
            "name": "Maria",
            "email": "maria@example.com",
            "subject": "Visita",
            "message": "Gostaria de conhecer a loja."
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["read"], false);

    // The inbox itself stays behind the key.
    let resp = Client::new()
        .get(fixture.url("/api/contact/messages"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_contact_reply_without_notifier() {
    let fixture = TestFixture::new().await;

    let (_, body) = fixture
        .post(
            "/api/contact",
            json!({ "name": "João", "email": "joao@example.com", "message": "Olá" }),
        )
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = fixture.get("/api/contact/messages?unread=true").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = fixture
        .post(
            &format!("/api/contact/messages/{}/reply", id),
            json!({ "reply": "Obrigado pelo contato." }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["reply"], "Obrigado pelo contato.");
    assert_eq!(body["data"]["read"], true);
    assert!(body["data"]["repliedAt"].is_string());

    let (_, body) = fixture.get("/api/contact/messages?unread=true").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, _) = fixture
        .delete(&format!("/api/contact/messages/{}", id))
        .await;
    assert_eq!(status, 200);
    let (status, _) = fixture
        .get(&format!("/api/contact/messages/{}", id))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_contact_validation() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/contact",
            json!({ "name": "Ana", "email": "not-an-email", "message": "Oi" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_document_crud() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/documents",
            json!({
                "title": "Regimento interno",
                "category": "estatuto",
                "fileUrl": "https://files.example.com/regimento.pdf"
            }),
        )
        .await;
    assert_eq!(status, 200);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    fixture
        .post(
            "/api/documents",
            json!({ "title": "Boletim", "fileUrl": "https://files.example.com/boletim.pdf" }),
        )
        .await;

    let (_, body) = fixture.get("/api/documents?category=estatuto").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = fixture.get("/api/documents?category=geral").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = fixture
        .put(
            &format!("/api/documents/{}", id),
            json!({ "description": "Versão 2023" }),
        )
        .await;
    assert_eq!(body["data"]["description"], "Versão 2023");

    let (status, body) = fixture.delete(&format!("/api/documents/{}", id)).await;
    assert_eq!(status, 200);
    assert_eq!(
        body["data"]["fileUrl"],
        "https://files.example.com/regimento.pdf"
    );
}

// ==================== REPORTS ====================

#[tokio::test]
async fn test_finance_report_summary() {
    let fixture = TestFixture::new().await;

    for (kind, amount, date, category) in [
        ("Receita", 500, "2024-03-05", "Mensalidades"),
        ("Receita", 120, "2024-03-06", "Tronco de Beneficência"),
        ("Despesa", 150, "2024-03-07", "Manutenção"),
        ("Despesa", 999, "2024-04-01", "Manutenção"),
    ] {
        fixture
            .post(
                "/api/finance/transactions",
                json!({ "type": kind, "amount": amount, "date": date, "category": category }),
            )
            .await;
    }

    let (status, body) = fixture
        .get("/api/reports/finance?from=2024-03-01&to=2024-03-31")
        .await;
    assert_eq!(status, 200);
    let data = &body["data"];
    assert_eq!(data["transactionCount"], 3);
    assert_eq!(data["totalIncome"]["formatted"], "R$ 620,00");
    assert_eq!(data["totalExpense"]["formatted"], "R$ 150,00");
    assert_eq!(data["balance"]["formatted"], "R$ 470,00");
    assert_eq!(data["charityIncome"]["formatted"], "R$ 120,00");
    assert_eq!(data["byCategory"].as_array().unwrap().len(), 3);

    let (status, _) = fixture
        .get("/api/reports/finance?from=2024-04-01&to=2024-03-01")
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_finance_csv_export() {
    let fixture = TestFixture::new().await;

    fixture
        .post(
            "/api/finance/transactions",
            json!({
                "type": "Despesa",
                "amount": 1234.5,
                "date": "2024-03-01",
                "category": "Manutenção",
                "description": "Pintura"
            }),
        )
        .await;

    let resp = fixture
        .client
        .get(fixture.url("/api/reports/finance.csv"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    assert!(resp.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("attachment"));

    let text = resp.text().await.unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Data;Tipo;Categoria;Descrição;Valor"));
    assert_eq!(lines.next(), Some("01/03/2024;Despesa;Manutenção;Pintura;1234,50"));
    assert_eq!(lines.next(), None);
}

#[tokio::test]
async fn test_brothers_csv_export() {
    let fixture = TestFixture::new().await;
    fixture.brother("Henrique Dias").await;

    let text = fixture
        .client
        .get(fixture.url("/api/reports/brothers.csv"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(text.starts_with("Nome;CIM;Grau"));
    assert!(text.contains("Henrique Dias"));
    assert!(text.contains("Mestre"));
}
