//! End-to-end API tests against an on-disk database

use std::sync::Arc;

use barangay_registry::{dispatch, ApiRequest, Config, Database, Services};
use http_body_util::BodyExt;
use hyper::{header, Method, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

struct Api {
    services: Services,
    token: Option<String>,
    _dir: TempDir,
}

impl Api {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            jwt_secret: "integration-test-secret-0123456789abcdef".into(),
            ..Default::default()
        };
        let db = Arc::new(Database::open(&config).unwrap());
        let services = Services::new(db, Arc::new(config)).unwrap();
        Self {
            services,
            token: None,
            _dir: dir,
        }
    }

    /// Sign up the first account (bootstrapped as super admin) and log in
    async fn as_admin() -> Self {
        let mut api = Self::new();
        let (status, _) = api
            .call(
                Method::POST,
                "/api/auth/signup",
                Some(json!({ "name": "Kapitan", "email": "admin@brgy.ph", "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        api.token = Some(api.login("admin@brgy.ph").await);
        api
    }

    async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                Some(json!({ "email": email, "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    fn request(&self, method: Method, target: &str, body: Option<Value>) -> ApiRequest {
        let mut req = ApiRequest::new(method, target);
        if let Some(ref token) = self.token {
            req = req.with_token(token);
        }
        if let Some(body) = body {
            req = req.with_json(&body);
        }
        req
    }

    async fn call(&self, method: Method, target: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = dispatch(&self.services, &self.request(method, target, body));
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create(&self, target: &str, body: Value) -> Value {
        let (status, value) = self.call(Method::POST, target, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "POST {} -> {}", target, value);
        value
    }
}

async fn resident_in_new_household(api: &Api) -> (String, String) {
    let household = api
        .create("/api/households", json!({ "street": "Rizal Street", "purok": "Purok 2" }))
        .await;
    let household_id = household["id"].as_str().unwrap().to_string();
    let resident = api
        .create(
            "/api/residents",
            json!({
                "firstName": "Maria",
                "lastName": "Santos",
                "birthDate": "1990-05-01",
                "gender": "FEMALE",
                "civilStatus": "MARRIED",
                "householdId": household_id,
                "isHouseholdHead": true,
                "sectors": ["SOLO_PARENT"]
            }),
        )
        .await;
    (household_id, resident["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_resident_keeps_its_household() {
    let api = Api::as_admin().await;
    let (household_id, resident_id) = resident_in_new_household(&api).await;

    let (status, resident) = api.call(Method::GET, &format!("/api/residents/{}", resident_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resident["householdId"], household_id.as_str());
    assert_eq!(resident["sectors"], json!(["SOLO_PARENT"]));

    let (_, members) = api
        .call(Method::GET, &format!("/api/households/{}/residents", household_id), None)
        .await;
    assert_eq!(members.as_array().unwrap().len(), 1);

    let (_, detail) = api.call(Method::GET, &format!("/api/households/{}", household_id), None).await;
    assert_eq!(detail["statistics"]["totalMembers"], 1);
}

#[tokio::test]
async fn test_certificate_lifecycle_and_filters() {
    let api = Api::as_admin().await;
    let (_, resident_id) = resident_in_new_household(&api).await;

    let clearance = api
        .create(
            "/api/certificates",
            json!({ "certificateType": "CLEARANCE", "residentId": resident_id, "purpose": "Employment", "fee": 50.0 }),
        )
        .await;
    let residency = api
        .create(
            "/api/certificates",
            json!({ "certificateType": "RESIDENCY", "residentId": resident_id, "purpose": "School" }),
        )
        .await;
    assert!(clearance["issuedDate"].is_null());
    let clearance_status = format!("/api/certificates/{}/status", clearance["id"].as_str().unwrap());

    // Release needs approval first
    let (status, _) = api
        .call(Method::PATCH, &clearance_status, Some(json!({ "status": "RELEASED" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    api.call(Method::PATCH, &clearance_status, Some(json!({ "status": "APPROVED" }))).await;
    let (status, released) = api
        .call(Method::PATCH, &clearance_status, Some(json!({ "status": "RELEASED" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(released["issuedDate"].is_string());

    let residency_status = format!("/api/certificates/{}/status", residency["id"].as_str().unwrap());
    let (_, cancelled) = api
        .call(Method::PATCH, &residency_status, Some(json!({ "status": "CANCELLED" })))
        .await;
    assert!(cancelled["issuedDate"].is_null());

    let (_, all) = api.call(Method::GET, "/api/certificates?statusFilter=ALL", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    let (_, released_only) = api.call(Method::GET, "/api/certificates?status=RELEASED", None).await;
    let released_only = released_only.as_array().unwrap();
    assert_eq!(released_only.len(), 1);
    assert_eq!(released_only[0]["status"], "RELEASED");

    let (status, html) = {
        let response = dispatch(
            &api.services,
            &api.request(
                Method::GET,
                &format!("/api/certificates/{}/render", clearance["id"].as_str().unwrap()),
                None,
            ),
        );
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    };
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Maria"));

    let (status, _) = api
        .call(Method::DELETE, &format!("/api/certificates/{}", residency["id"].as_str().unwrap()), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, remaining) = api.call(Method::GET, "/api/certificates", None).await;
    let remaining = remaining.as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["id"], clearance["id"]);
}

#[tokio::test]
async fn test_blotter_trail_follows_status() {
    let api = Api::as_admin().await;
    let case = api
        .create(
            "/api/blotter",
            json!({
                "incidentType": "Noise complaint",
                "incidentDate": "2024-03-02T22:15",
                "incidentLocation": "Purok 3",
                "description": "Karaoke past curfew",
                "parties": [
                    { "partyType": "COMPLAINANT", "name": "Jose Reyes" },
                    { "partyType": "RESPONDENT", "name": "Pedro Garcia" }
                ]
            }),
        )
        .await;
    let id = case["id"].as_str().unwrap();
    assert_eq!(case["status"], "PENDING");
    assert_eq!(case["parties"].as_array().unwrap().len(), 2);

    for status in ["ONGOING", "ESCALATED"] {
        let (code, _) = api
            .call(Method::PATCH, &format!("/api/blotter/{}/status", id), Some(json!({ "status": status })))
            .await;
        assert_eq!(code, StatusCode::OK);
    }

    let (_, updates) = api.call(Method::GET, &format!("/api/blotter/{}/updates", id), None).await;
    let trail: Vec<&str> = updates
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["status"].as_str().unwrap())
        .collect();
    assert_eq!(trail, ["PENDING", "ONGOING", "ESCALATED"]);

    let (_, current) = api.call(Method::GET, &format!("/api/blotter/{}", id), None).await;
    assert_eq!(current["status"], *trail.last().unwrap());
    assert_eq!(current["updates"].as_array().unwrap().len(), 3);

    let (code, _) = api
        .call(Method::PATCH, &format!("/api/blotter/{}/status", id), Some(json!({ "status": "PENDING" })))
        .await;
    assert_eq!(code, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_project_utilization_is_clamped() {
    let api = Api::as_admin().await;
    let aip = api
        .create(
            "/api/finance/aip",
            json!({ "fiscalYear": 2024, "title": "AIP 2024", "totalBudget": 100000.0 }),
        )
        .await;
    let aip_id = aip["id"].as_str().unwrap();
    let project = api
        .create(
            &format!("/api/finance/aip/{}/projects", aip_id),
            json!({ "title": "Drainage", "totalCost": 1000.0 }),
        )
        .await;
    let expenses = format!("/api/finance/projects/{}/expenses", project["id"].as_str().unwrap());

    let first = api
        .create(&expenses, json!({ "description": "Cement", "amount": 600.0, "expenseDate": "2024-02-01" }))
        .await;
    assert_eq!(first["budget"]["utilization"], 60);
    assert!(first["warning"].is_null());

    let second = api
        .create(&expenses, json!({ "description": "Labor", "amount": 900.0, "expenseDate": "2024-02-08" }))
        .await;
    assert_eq!(second["budget"]["utilization"], 100);
    assert_eq!(second["budget"]["overBudget"], true);
    assert!(second["warning"].is_string());

    let response = dispatch(
        &api.services,
        &api.request(Method::GET, &format!("/api/finance/aip/{}/report/csv?type=expenses", aip_id), None),
    );
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
}

#[tokio::test]
async fn test_roles_gate_sign_off_and_finance() {
    let mut api = Api::as_admin().await;
    let (_, resident_id) = resident_in_new_household(&api).await;
    let certificate = api
        .create(
            "/api/certificates",
            json!({ "certificateType": "INDIGENCY", "residentId": resident_id, "purpose": "Medical assistance" }),
        )
        .await;

    let (status, pending) = api
        .call(
            Method::POST,
            "/api/auth/signup",
            Some(json!({ "name": "Treasurer", "email": "treasurer@brgy.ph", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(pending["status"], "PENDING");

    let (status, _) = api
        .call(
            Method::PATCH,
            &format!("/api/users/{}", pending["id"].as_str().unwrap()),
            Some(json!({ "role": "TREASURER", "status": "ACTIVE" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    api.token = Some(api.login("treasurer@brgy.ph").await);
    let (status, _) = api
        .call(
            Method::PATCH,
            &format!("/api/certificates/{}/status", certificate["id"].as_str().unwrap()),
            Some(json!({ "status": "APPROVED" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let entry = api
        .create(
            "/api/finance/transactions",
            json!({
                "transactionType": "INCOME",
                "category": "Clearance Fees",
                "amount": 250.0,
                "description": "Weekly collection",
                "transactionDate": "2024-04-05"
            }),
        )
        .await;
    assert_eq!(entry["status"], "PENDING");

    let (status, _) = api.call(Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_token_is_rejected() {
    let mut api = Api::new();
    api.token = Some("not-a-jwt".into());
    let (status, body) = api.call(Method::GET, "/api/reports/dashboard", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_captain_stays_below_super_admin() {
    let mut api = Api::as_admin().await;
    let (_, me) = api.call(Method::GET, "/api/auth/me", None).await;
    let admin_url = format!("/api/users/{}", me["id"].as_str().unwrap());

    let captain = api
        .create(
            "/api/auth/signup",
            json!({ "name": "Kapitan", "email": "captain@brgy.ph", "password": "password123" }),
        )
        .await;
    let captain_url = format!("/api/users/{}", captain["id"].as_str().unwrap());
    let (status, _) = api
        .call(Method::PATCH, &captain_url, Some(json!({ "role": "CAPTAIN", "status": "ACTIVE" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    api.token = Some(api.login("captain@brgy.ph").await);
    let (status, _) = api
        .call(Method::PATCH, &captain_url, Some(json!({ "role": "SUPER_ADMIN" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = api
        .call(Method::PATCH, &admin_url, Some(json!({ "role": "STAFF" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = api.call(Method::DELETE, &admin_url, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, admin) = api.call(Method::GET, &admin_url, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(admin["role"], "SUPER_ADMIN");
    assert_eq!(admin["status"], "ACTIVE");
}
