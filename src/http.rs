//! HTTP API for the barangay registry
//!
//! JSON over HTTP/1.1. Every `/api` route except signup and login needs a
//! bearer token from `POST /api/auth/login`; with `dev_mode` on, requests
//! without a token act as a super admin.
//!
//! ## Routes
//! - `GET /health`
//! - `/api/auth/{signup,login,me}`
//! - `/api/users[/{id}]`
//! - `/api/households[/{id}[/residents|/statistics]]`
//! - `/api/residents[/{id}]`, `/api/officials[/{id}]`
//! - `/api/certificates[/{id}[/status|/render]]`, `/api/certificate-templates[/{id}]`
//! - `/api/blotter[/{id}[/status|/parties|/hearings|/updates]]`
//! - `/api/finance/{aip,projects,expenses,milestones,transactions}/...`
//! - `/api/reports/dashboard`, `/api/reports/{kind}[/export]`,
//!   `/api/reports/aip/{type}/export`
//!
//! ```bash
//! curl -X POST -H "Content-Type: application/json" \
//!      -d '{"email":"admin@barangay.local","password":"barangay123"}' \
//!      http://localhost:8088/api/auth/login
//! curl -H "Authorization: Bearer $TOKEN" \
//!      "http://localhost:8088/api/reports/certificates/export?year=2024&format=pdf" > certs.pdf
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::{extract_bearer, role_allows, Capability};
use crate::db::blotter::{
    CaseQuery, CreateCaseInput, CreatePartyInput, ScheduleHearingInput, StatusChangeInput,
    UpdateCaseInput, UpdateHearingInput,
};
use crate::db::certificate_templates::{CreateTemplateInput, UpdateTemplateInput};
use crate::db::certificates::{CertificateQuery, CreateCertificateInput, UpdateCertificateInput};
use crate::db::finance::aip::{CreateAipInput, UpdateAipInput};
use crate::db::finance::expenses::{CreateExpenseInput, LinkTransactionInput};
use crate::db::finance::milestones::{CreateMilestoneInput, UpdateMilestoneInput};
use crate::db::finance::projects::{CreateProjectInput, UpdateProjectInput};
use crate::db::finance::transactions::{
    CreateTransactionInput, TransactionQuery, UpdateTransactionInput,
};
use crate::db::households::{CreateHouseholdInput, HouseholdQuery, UpdateHouseholdInput};
use crate::db::models::{certificate_statuses, user_roles, User};
use crate::db::officials::{CreateOfficialInput, UpdateOfficialInput};
use crate::db::residents::{CreateResidentInput, ResidentQuery, UpdateResidentInput};
use crate::db::users::UserQuery;
use crate::error::RegistryError;
use crate::reports::{AipReportType, Export, ReportKind};
use crate::services::response::{
    attachment, created, error_response, html, no_content, not_found, ok, HttpResponse,
};
use crate::services::user_service::{Actor, LoginInput, SignupInput, UpdateUserInput};
use crate::services::{ReportQuery, Services};
use crate::views::{
    AipView, BlotterCaseDetailView, BlotterCaseView, BlotterHearingView, BlotterPartyView,
    BlotterStatusUpdateView, CertificateTemplateView, CertificateView, ExpenseRecordedView,
    ExpenseView, HouseholdStatisticsView, HouseholdView, MilestoneView, OfficialView, ProjectView,
    ResidentView, SessionView, TransactionView, UserView,
};

type ApiResult = Result<HttpResponse, RegistryError>;

/// A request with its body already read
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Bytes,
}

impl ApiRequest {
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            authorization: None,
            body: Bytes::new(),
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.authorization = Some(format!("Bearer {}", token));
        self
    }

    pub fn with_json(mut self, body: &serde_json::Value) -> Self {
        self.body = Bytes::from(body.to_string());
        self
    }

    fn json<T: DeserializeOwned>(&self) -> Result<T, RegistryError> {
        if self.body.is_empty() {
            return Err(RegistryError::InvalidInput("Request body required".into()));
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| RegistryError::InvalidInput(format!("Invalid JSON body: {}", e)))
    }

    fn query<T: DeserializeOwned>(&self) -> Result<T, RegistryError> {
        serde_urlencoded::from_str(self.query.as_deref().unwrap_or(""))
            .map_err(|e| RegistryError::InvalidInput(format!("Invalid query string: {}", e)))
    }
}

/// Who is making the request
struct Caller {
    /// `None` only for unauthenticated requests in dev mode
    user: Option<User>,
}

impl Caller {
    fn role(&self) -> &str {
        self.user
            .as_ref()
            .map_or(user_roles::SUPER_ADMIN, |u| u.role.as_str())
    }

    fn id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    fn actor(&self) -> Actor<'_> {
        Actor {
            id: self.id(),
            role: self.role(),
        }
    }

    fn require(&self, capability: Capability) -> Result<(), RegistryError> {
        if role_allows(self.role(), capability) {
            Ok(())
        } else {
            Err(RegistryError::Forbidden(format!(
                "Role {} may not {}",
                self.role(),
                capability
            )))
        }
    }
}

fn caller(services: &Services, req: &ApiRequest) -> Result<Caller, RegistryError> {
    match extract_bearer(req.authorization.as_deref()) {
        Some(token) => Ok(Caller {
            user: Some(services.users.authenticate(token)?),
        }),
        None if services.config.dev_mode => Ok(Caller { user: None }),
        None => Err(RegistryError::Unauthorized("Missing bearer token".into())),
    }
}

#[derive(Debug, Deserialize)]
struct StatusInput {
    status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfficialQuery {
    #[serde(default)]
    active: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateQuery {
    #[serde(default, alias = "certificateType")]
    r#type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AipExportQuery {
    #[serde(default)]
    r#type: Option<String>,
    #[serde(default)]
    aip_id: Option<String>,
    #[serde(default)]
    format: Option<String>,
}

fn views<T, V: From<T>>(rows: Vec<T>) -> Vec<V> {
    rows.into_iter().map(V::from).collect()
}

/// 200 with the view, or 404 with `missing`
fn found<T, V>(row: Option<T>, missing: &str) -> HttpResponse
where
    V: From<T> + serde::Serialize,
{
    match row {
        Some(row) => ok(&V::from(row)),
        None => not_found(missing),
    }
}

fn deleted(removed: bool, missing: &str) -> HttpResponse {
    if removed {
        no_content()
    } else {
        not_found(missing)
    }
}

fn download(export: Export) -> HttpResponse {
    attachment(export.content_type, &export.filename, export.body)
}

fn route_not_found(req: &ApiRequest) -> ApiResult {
    Ok(not_found(&format!("No route for {} {}", req.method, req.path)))
}

/// Route a request to its handler and render the outcome
pub fn dispatch(services: &Services, req: &ApiRequest) -> HttpResponse {
    debug!(method = %req.method, path = %req.path, "Incoming request");

    let segments: Vec<&str> = req.path.split('/').filter(|s| !s.is_empty()).collect();
    let result = match segments.as_slice() {
        ["health"] if req.method == Method::GET => health(services),
        ["api", "auth", rest @ ..] => auth_routes(services, req, rest),
        ["api", rest @ ..] => caller(services, req).and_then(|caller| match rest {
            ["users", rest @ ..] => user_routes(services, req, &caller, rest),
            ["households", rest @ ..] => household_routes(services, req, &caller, rest),
            ["residents", rest @ ..] => resident_routes(services, req, &caller, rest),
            ["officials", rest @ ..] => official_routes(services, req, &caller, rest),
            ["certificates", rest @ ..] => certificate_routes(services, req, &caller, rest),
            ["certificate-templates", rest @ ..] => template_routes(services, req, &caller, rest),
            ["blotter", rest @ ..] => blotter_routes(services, req, &caller, rest),
            ["finance", rest @ ..] => finance_routes(services, req, &caller, rest),
            ["reports", rest @ ..] => report_routes(services, req, &caller, rest),
            _ => route_not_found(req),
        }),
        _ => route_not_found(req),
    };

    match result {
        Ok(response) => response,
        Err(e) => {
            let response = error_response(e);
            if response.status().is_server_error() {
                error!(method = %req.method, path = %req.path, status = %response.status(), "Request failed");
            }
            response
        }
    }
}

fn health(services: &Services) -> ApiResult {
    let stats = services.db.stats()?;
    Ok(ok(&serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "barangay": services.config.barangay_name,
        "records": stats,
    })))
}

// ============================================================================
// Accounts
// ============================================================================

fn auth_routes(services: &Services, req: &ApiRequest, rest: &[&str]) -> ApiResult {
    match (req.method.clone(), rest) {
        (Method::POST, ["signup"]) => {
            let user = services.users.signup(&req.json::<SignupInput>()?)?;
            Ok(created(&UserView::from(user)))
        }
        (Method::POST, ["login"]) => {
            let session = services.users.login(&req.json::<LoginInput>()?)?;
            Ok(ok(&SessionView {
                token: session.token,
                expires_in: u32::try_from(session.expires_in).unwrap_or(u32::MAX),
                user: session.user.into(),
            }))
        }
        (Method::GET, ["me"]) => match caller(services, req)?.user {
            Some(user) => Ok(ok(&UserView::from(user))),
            None => Err(RegistryError::Unauthorized("No session".into())),
        },
        _ => route_not_found(req),
    }
}

fn user_routes(services: &Services, req: &ApiRequest, caller: &Caller, rest: &[&str]) -> ApiResult {
    caller.require(Capability::ManageUsers)?;
    let users = &services.users;
    match (req.method.clone(), rest) {
        (Method::GET, []) => {
            let rows = users.list(&req.query::<UserQuery>()?)?;
            Ok(ok(&views::<_, UserView>(rows)))
        }
        (Method::GET, [id]) => Ok(found::<_, UserView>(users.get(id)?, "User not found")),
        (Method::PATCH, [id]) => {
            let updated = users.update(id, &req.json::<UpdateUserInput>()?, caller.actor())?;
            Ok(found::<_, UserView>(updated, "User not found"))
        }
        (Method::DELETE, [id]) => {
            let user = users.deactivate(id, caller.actor())?;
            Ok(found::<_, UserView>(user, "User not found"))
        }
        _ => route_not_found(req),
    }
}

// ============================================================================
// Households, residents and officials
// ============================================================================

fn household_routes(
    services: &Services,
    req: &ApiRequest,
    caller: &Caller,
    rest: &[&str],
) -> ApiResult {
    let registry = &services.registry;
    match (req.method.clone(), rest) {
        (Method::GET, []) => {
            caller.require(Capability::ViewRecords)?;
            let rows = registry.list_households(&req.query::<HouseholdQuery>()?)?;
            Ok(ok(&views::<_, HouseholdView>(rows)))
        }
        (Method::POST, []) => {
            caller.require(Capability::ManageRecords)?;
            let household = registry.create_household(&req.json::<CreateHouseholdInput>()?)?;
            Ok(created(&HouseholdView::from(household)))
        }
        (Method::GET, [id]) => {
            caller.require(Capability::ViewRecords)?;
            match registry.household_detail(id)? {
                Some(detail) => Ok(ok(&detail)),
                None => Ok(not_found("Household not found")),
            }
        }
        (Method::PATCH | Method::PUT, [id]) => {
            caller.require(Capability::ManageRecords)?;
            let updated = registry.update_household(id, &req.json::<UpdateHouseholdInput>()?)?;
            Ok(found::<_, HouseholdView>(updated, "Household not found"))
        }
        (Method::DELETE, [id]) => {
            caller.require(Capability::ManageRecords)?;
            let archived = registry.archive_household(id)?;
            Ok(found::<_, HouseholdView>(archived, "Household not found"))
        }
        (Method::GET, [id, "residents"]) => {
            caller.require(Capability::ViewRecords)?;
            match registry.household_members(id)? {
                Some(members) => Ok(ok(&views::<_, ResidentView>(members))),
                None => Ok(not_found("Household not found")),
            }
        }
        (Method::GET, [id, "statistics"]) => {
            caller.require(Capability::ViewRecords)?;
            let stats = registry.household_statistics(id)?;
            Ok(found::<_, HouseholdStatisticsView>(stats, "Household not found"))
        }
        _ => route_not_found(req),
    }
}

fn resident_routes(
    services: &Services,
    req: &ApiRequest,
    caller: &Caller,
    rest: &[&str],
) -> ApiResult {
    let registry = &services.registry;
    match (req.method.clone(), rest) {
        (Method::GET, []) => {
            caller.require(Capability::ViewRecords)?;
            let rows = registry.list_residents(&req.query::<ResidentQuery>()?)?;
            Ok(ok(&views::<_, ResidentView>(rows)))
        }
        (Method::POST, []) => {
            caller.require(Capability::ManageRecords)?;
            let resident = registry.create_resident(&req.json::<CreateResidentInput>()?)?;
            Ok(created(&ResidentView::from(resident)))
        }
        (Method::GET, [id]) => {
            caller.require(Capability::ViewRecords)?;
            Ok(found::<_, ResidentView>(registry.get_resident(id)?, "Resident not found"))
        }
        (Method::PATCH | Method::PUT, [id]) => {
            caller.require(Capability::ManageRecords)?;
            let updated = registry.update_resident(id, &req.json::<UpdateResidentInput>()?)?;
            Ok(found::<_, ResidentView>(updated, "Resident not found"))
        }
        (Method::DELETE, [id]) => {
            caller.require(Capability::ManageRecords)?;
            Ok(deleted(registry.delete_resident(id)?, "Resident not found"))
        }
        _ => route_not_found(req),
    }
}

fn official_routes(
    services: &Services,
    req: &ApiRequest,
    caller: &Caller,
    rest: &[&str],
) -> ApiResult {
    let registry = &services.registry;
    match (req.method.clone(), rest) {
        (Method::GET, []) => {
            caller.require(Capability::ViewRecords)?;
            let query = req.query::<OfficialQuery>()?;
            Ok(ok(&views::<_, OfficialView>(registry.list_officials(query.active)?)))
        }
        (Method::POST, []) => {
            caller.require(Capability::ApproveCertificates)?;
            let official = registry.create_official(&req.json::<CreateOfficialInput>()?)?;
            Ok(created(&OfficialView::from(official)))
        }
        (Method::PATCH, [id]) => {
            caller.require(Capability::ApproveCertificates)?;
            let updated = registry.update_official(id, &req.json::<UpdateOfficialInput>()?)?;
            Ok(found::<_, OfficialView>(updated, "Official not found"))
        }
        _ => route_not_found(req),
    }
}

// ============================================================================
// Certificates
// ============================================================================

fn certificate_routes(
    services: &Services,
    req: &ApiRequest,
    caller: &Caller,
    rest: &[&str],
) -> ApiResult {
    let certificates = &services.certificates;
    match (req.method.clone(), rest) {
        (Method::GET, []) => {
            caller.require(Capability::ViewRecords)?;
            let rows = certificates.list(&req.query::<CertificateQuery>()?)?;
            Ok(ok(&views::<_, CertificateView>(rows)))
        }
        (Method::POST, []) => {
            caller.require(Capability::ManageRecords)?;
            let certificate = certificates.create(&req.json::<CreateCertificateInput>()?)?;
            Ok(created(&CertificateView::from(certificate)))
        }
        (Method::GET, [id]) => {
            caller.require(Capability::ViewRecords)?;
            Ok(found::<_, CertificateView>(certificates.get(id)?, "Certificate not found"))
        }
        (Method::PATCH | Method::PUT, [id]) => {
            caller.require(Capability::ManageRecords)?;
            let updated = certificates.update(id, &req.json::<UpdateCertificateInput>()?)?;
            Ok(found::<_, CertificateView>(updated, "Certificate not found"))
        }
        (Method::DELETE, [id]) => {
            caller.require(Capability::ManageRecords)?;
            Ok(deleted(certificates.delete(id)?, "Certificate not found"))
        }
        (Method::PATCH, [id, "status"]) => {
            let input = req.json::<StatusInput>()?;
            // Requesters may withdraw; everything else is a sign-off
            if input.status == certificate_statuses::CANCELLED {
                caller.require(Capability::ManageRecords)?;
            } else {
                caller.require(Capability::ApproveCertificates)?;
            }
            let updated = certificates.update_status(id, &input.status)?;
            Ok(found::<_, CertificateView>(updated, "Certificate not found"))
        }
        (Method::GET, [id, "render"]) => {
            caller.require(Capability::ViewRecords)?;
            match certificates.render(id)? {
                Some(document) => Ok(html(document)),
                None => Ok(not_found("Certificate not found")),
            }
        }
        _ => route_not_found(req),
    }
}

fn template_routes(
    services: &Services,
    req: &ApiRequest,
    caller: &Caller,
    rest: &[&str],
) -> ApiResult {
    let certificates = &services.certificates;
    match (req.method.clone(), rest) {
        (Method::GET, []) => {
            caller.require(Capability::ViewRecords)?;
            let query = req.query::<TemplateQuery>()?;
            let rows = certificates.list_templates(query.r#type.as_deref())?;
            Ok(ok(&views::<_, CertificateTemplateView>(rows)))
        }
        (Method::POST, []) => {
            caller.require(Capability::ApproveCertificates)?;
            let template = certificates.create_template(&req.json::<CreateTemplateInput>()?)?;
            Ok(created(&CertificateTemplateView::from(template)))
        }
        (Method::GET, [id]) => {
            caller.require(Capability::ViewRecords)?;
            let template = certificates.get_template(id)?;
            Ok(found::<_, CertificateTemplateView>(template, "Template not found"))
        }
        (Method::PUT | Method::PATCH, [id]) => {
            caller.require(Capability::ApproveCertificates)?;
            let updated = certificates.update_template(id, &req.json::<UpdateTemplateInput>()?)?;
            Ok(found::<_, CertificateTemplateView>(updated, "Template not found"))
        }
        (Method::DELETE, [id]) => {
            caller.require(Capability::ApproveCertificates)?;
            Ok(deleted(certificates.delete_template(id)?, "Template not found"))
        }
        _ => route_not_found(req),
    }
}

// ============================================================================
// Blotter
// ============================================================================

fn blotter_routes(
    services: &Services,
    req: &ApiRequest,
    caller: &Caller,
    rest: &[&str],
) -> ApiResult {
    let blotter = &services.blotter;
    let writing = req.method != Method::GET;
    caller.require(if writing {
        Capability::ManageRecords
    } else {
        Capability::ViewRecords
    })?;

    match (req.method.clone(), rest) {
        (Method::GET, []) => {
            let rows = blotter.list_cases(&req.query::<CaseQuery>()?)?;
            Ok(ok(&views::<_, BlotterCaseView>(rows)))
        }
        (Method::POST, []) => {
            let detail = blotter.create_case(&req.json::<CreateCaseInput>()?, caller.id())?;
            Ok(created(&BlotterCaseDetailView::from(detail)))
        }
        (Method::GET, [id]) => {
            Ok(found::<_, BlotterCaseDetailView>(blotter.get_case(id)?, "Case not found"))
        }
        (Method::PATCH, [id]) => {
            let updated = blotter.update_case(id, &req.json::<UpdateCaseInput>()?)?;
            Ok(found::<_, BlotterCaseView>(updated, "Case not found"))
        }
        (Method::DELETE, [id]) => Ok(deleted(blotter.delete_case(id)?, "Case not found")),
        (Method::PATCH, [id, "status"]) => {
            let updated =
                blotter.update_status(id, &req.json::<StatusChangeInput>()?, caller.id())?;
            Ok(found::<_, BlotterCaseView>(updated, "Case not found"))
        }
        (Method::GET, [id, "updates"]) => match blotter.status_updates(id)? {
            Some(rows) => Ok(ok(&views::<_, BlotterStatusUpdateView>(rows))),
            None => Ok(not_found("Case not found")),
        },
        (Method::GET, [id, "parties"]) => match blotter.list_parties(id)? {
            Some(rows) => Ok(ok(&views::<_, BlotterPartyView>(rows))),
            None => Ok(not_found("Case not found")),
        },
        (Method::POST, [id, "parties"]) => {
            match blotter.add_party(id, &req.json::<CreatePartyInput>()?)? {
                Some(party) => Ok(created(&BlotterPartyView::from(party))),
                None => Ok(not_found("Case not found")),
            }
        }
        (Method::DELETE, [id, "parties", party_id]) => {
            Ok(deleted(blotter.remove_party(id, party_id)?, "Party not found"))
        }
        (Method::GET, [id, "hearings"]) => match blotter.list_hearings(id)? {
            Some(rows) => Ok(ok(&views::<_, BlotterHearingView>(rows))),
            None => Ok(not_found("Case not found")),
        },
        (Method::POST, [id, "hearings"]) => {
            match blotter.schedule_hearing(id, &req.json::<ScheduleHearingInput>()?)? {
                Some(hearing) => Ok(created(&BlotterHearingView::from(hearing))),
                None => Ok(not_found("Case not found")),
            }
        }
        (Method::PATCH, [id, "hearings", hearing_id]) => {
            let updated =
                blotter.update_hearing(id, hearing_id, &req.json::<UpdateHearingInput>()?)?;
            Ok(found::<_, BlotterHearingView>(updated, "Hearing not found"))
        }
        _ => route_not_found(req),
    }
}

// ============================================================================
// Finance
// ============================================================================

fn finance_routes(
    services: &Services,
    req: &ApiRequest,
    caller: &Caller,
    rest: &[&str],
) -> ApiResult {
    let finance = &services.finance;
    let writing = req.method != Method::GET;
    caller.require(if writing {
        Capability::ManageFinance
    } else {
        Capability::ViewRecords
    })?;

    match (req.method.clone(), rest) {
        // Annual investment programs
        (Method::GET, ["aip"]) => Ok(ok(&views::<_, AipView>(finance.list_aips()?))),
        (Method::POST, ["aip"]) => {
            let aip = finance.create_aip(&req.json::<CreateAipInput>()?)?;
            Ok(created(&AipView::from(aip)))
        }
        (Method::GET, ["aip", id]) => match finance.aip_detail(id)? {
            Some(detail) => Ok(ok(&detail)),
            None => Ok(not_found("AIP not found")),
        },
        (Method::PATCH, ["aip", id]) => {
            let updated = finance.update_aip(id, &req.json::<UpdateAipInput>()?)?;
            Ok(found::<_, AipView>(updated, "AIP not found"))
        }
        (Method::DELETE, ["aip", id]) => Ok(deleted(finance.delete_aip(id)?, "AIP not found")),
        (Method::GET, ["aip", id, "projects"]) => match finance.list_projects(id)? {
            Some(rows) => Ok(ok(&views::<_, ProjectView>(rows))),
            None => Ok(not_found("AIP not found")),
        },
        (Method::POST, ["aip", id, "projects"]) => {
            let project = finance.create_project(id, &req.json::<CreateProjectInput>()?)?;
            Ok(created(&ProjectView::from(project)))
        }
        (Method::GET, ["aip", id, "report"]) => match services.reports.aip_report(id)? {
            Some(report) => Ok(ok(&report)),
            None => Ok(not_found("AIP not found")),
        },
        (Method::GET, ["aip", id, "report", format]) => {
            let query = req.query::<AipExportQuery>()?;
            let report_type = query
                .r#type
                .as_deref()
                .unwrap_or("summary")
                .parse::<AipReportType>()?;
            match services.reports.export_aip(id, report_type, format.parse()?)? {
                Some(export) => Ok(download(export)),
                None => Ok(not_found("AIP not found")),
            }
        }

        // Projects
        (Method::GET, ["projects", id]) => {
            Ok(found::<_, ProjectView>(finance.get_project(id)?, "Project not found"))
        }
        (Method::PATCH, ["projects", id]) => {
            let updated = finance.update_project(id, &req.json::<UpdateProjectInput>()?)?;
            Ok(found::<_, ProjectView>(updated, "Project not found"))
        }
        (Method::DELETE, ["projects", id]) => {
            Ok(deleted(finance.delete_project(id)?, "Project not found"))
        }
        (Method::GET, ["projects", id, "expenses"]) => match finance.list_expenses(id)? {
            Some(rows) => Ok(ok(&views::<_, ExpenseView>(rows))),
            None => Ok(not_found("Project not found")),
        },
        (Method::POST, ["projects", id, "expenses"]) => {
            let outcome = finance.record_expense(id, &req.json::<CreateExpenseInput>()?)?;
            if outcome.budget.over_budget {
                warn!(project_id = %id, "Expense recorded past project cost");
            }
            Ok(created(&ExpenseRecordedView::from(outcome)))
        }
        (Method::GET, ["projects", id, "milestones"]) => match finance.list_milestones(id)? {
            Some(rows) => Ok(ok(&views::<_, MilestoneView>(rows))),
            None => Ok(not_found("Project not found")),
        },
        (Method::POST, ["projects", id, "milestones"]) => {
            let milestone = finance.create_milestone(id, &req.json::<CreateMilestoneInput>()?)?;
            Ok(created(&MilestoneView::from(milestone)))
        }

        // Expenses and milestones
        (Method::DELETE, ["expenses", id]) => {
            Ok(deleted(finance.delete_expense(id)?, "Expense not found"))
        }
        (Method::POST, ["expenses", id, "link"]) => {
            let link = req.json::<LinkTransactionInput>()?;
            let expense = finance.link_expense(id, &link.transaction_id)?;
            Ok(found::<_, ExpenseView>(expense, "Expense not found"))
        }
        (Method::DELETE, ["expenses", id, "link"]) => {
            Ok(found::<_, ExpenseView>(finance.unlink_expense(id)?, "Expense not found"))
        }
        (Method::PATCH, ["milestones", id]) => {
            let updated = finance.update_milestone(id, &req.json::<UpdateMilestoneInput>()?)?;
            Ok(found::<_, MilestoneView>(updated, "Milestone not found"))
        }
        (Method::DELETE, ["milestones", id]) => {
            Ok(deleted(finance.delete_milestone(id)?, "Milestone not found"))
        }

        // Ledger
        (Method::GET, ["transactions"]) => {
            let rows = finance.list_transactions(&req.query::<TransactionQuery>()?)?;
            Ok(ok(&views::<_, TransactionView>(rows)))
        }
        (Method::POST, ["transactions"]) => {
            let entry =
                finance.create_transaction(&req.json::<CreateTransactionInput>()?, caller.id())?;
            Ok(created(&TransactionView::from(entry)))
        }
        (Method::GET, ["transactions", id]) => {
            let entry = finance.get_transaction(id)?;
            Ok(found::<_, TransactionView>(entry, "Transaction not found"))
        }
        (Method::PATCH, ["transactions", id]) => {
            let updated = finance.update_transaction(id, &req.json::<UpdateTransactionInput>()?)?;
            Ok(found::<_, TransactionView>(updated, "Transaction not found"))
        }
        (Method::DELETE, ["transactions", id]) => {
            Ok(deleted(finance.delete_transaction(id)?, "Transaction not found"))
        }
        (Method::PATCH, ["transactions", id, "status"]) => {
            let input = req.json::<StatusInput>()?;
            let updated = finance.update_transaction_status(id, &input.status, caller.id())?;
            Ok(found::<_, TransactionView>(updated, "Transaction not found"))
        }
        _ => route_not_found(req),
    }
}

// ============================================================================
// Reports
// ============================================================================

fn report_routes(
    services: &Services,
    req: &ApiRequest,
    caller: &Caller,
    rest: &[&str],
) -> ApiResult {
    caller.require(Capability::ViewRecords)?;
    if req.method != Method::GET {
        return route_not_found(req);
    }
    let reports = &services.reports;

    match rest {
        ["dashboard"] => Ok(ok(&reports.dashboard()?)),
        ["aip", report_type, "export"] => {
            let query = req.query::<AipExportQuery>()?;
            let report_type = report_type.parse::<AipReportType>()?;
            let aip_id = query
                .aip_id
                .ok_or_else(|| RegistryError::InvalidInput("aipId is required".into()))?;
            let format = query.format.as_deref().unwrap_or("csv").parse()?;
            match reports.export_aip(&aip_id, report_type, format)? {
                Some(export) => Ok(download(export)),
                None => Ok(not_found("AIP not found")),
            }
        }
        [kind] => {
            let kind = kind.parse::<ReportKind>()?;
            Ok(ok(&reports.report(kind, &req.query::<ReportQuery>()?)?))
        }
        [kind, "export"] => {
            let kind = kind.parse::<ReportKind>()?;
            let query = req.query::<ReportQuery>()?;
            let format = query.export_format()?;
            Ok(download(reports.export(kind, &query, format)?))
        }
        _ => route_not_found(req),
    }
}

// ============================================================================
// Server
// ============================================================================

/// HTTP server state
pub struct HttpServer {
    services: Arc<Services>,
    bind_addr: SocketAddr,
}

impl HttpServer {
    pub fn new(services: Arc<Services>, bind_addr: SocketAddr) -> Self {
        Self {
            services,
            bind_addr,
        }
    }

    /// Accept connections until the listener fails
    pub async fn run(self: Arc<Self>) -> Result<(), RegistryError> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        info!(addr = %self.bind_addr, "HTTP server listening");

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { server.handle_request(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(addr = %remote_addr, error = %err, "Connection error");
                }
            });
        }
    }

    async fn handle_request(&self, req: Request<Incoming>) -> Result<HttpResponse, hyper::Error> {
        let (parts, body) = req.into_parts();
        let body = body.collect().await?.to_bytes();

        let request = ApiRequest {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            authorization: parts
                .headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        };

        // Repositories block on SQLite
        let services = self.services.clone();
        match tokio::task::spawn_blocking(move || dispatch(&services, &request)).await {
            Ok(response) => Ok(response),
            Err(e) => {
                error!(error = %e, "Request handler panicked");
                Ok(crate::services::response::error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Database;
    use serde_json::{json, Value};

    fn services(dev_mode: bool) -> Services {
        let config = Config {
            dev_mode,
            jwt_secret: "a-test-secret-that-is-long-enough-1234".into(),
            ..Default::default()
        };
        let db = Arc::new(Database::open_in_memory().unwrap());
        Services::new(db, Arc::new(config)).unwrap()
    }

    async fn body_json(response: HttpResponse) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let svc = services(false);
        let response = dispatch(&svc, &ApiRequest::new(Method::GET, "/health"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_api_requires_token_outside_dev_mode() {
        let svc = services(false);
        let response = dispatch(&svc, &ApiRequest::new(Method::GET, "/api/residents"));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let dev = services(true);
        let response = dispatch(&dev, &ApiRequest::new(Method::GET, "/api/residents"));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_signup_login_and_me() {
        let svc = services(false);
        let signup = ApiRequest::new(Method::POST, "/api/auth/signup").with_json(&json!({
            "name": "Kapitan", "email": "kap@brgy.ph", "password": "password123"
        }));
        assert_eq!(dispatch(&svc, &signup).status(), StatusCode::CREATED);

        let login = ApiRequest::new(Method::POST, "/api/auth/login")
            .with_json(&json!({ "email": "kap@brgy.ph", "password": "password123" }));
        let session = body_json(dispatch(&svc, &login)).await;
        let token = session["token"].as_str().unwrap().to_string();
        assert_eq!(session["user"]["role"], "SUPER_ADMIN");

        let me = dispatch(&svc, &ApiRequest::new(Method::GET, "/api/auth/me").with_token(&token));
        assert_eq!(body_json(me).await["email"], "kap@brgy.ph");

        let bad = ApiRequest::new(Method::POST, "/api/auth/login")
            .with_json(&json!({ "email": "kap@brgy.ph", "password": "wrong-password" }));
        assert_eq!(dispatch(&svc, &bad).status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_errors_are_json() {
        let svc = services(true);
        let response = dispatch(&svc, &ApiRequest::new(Method::GET, "/api/residents/nope"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_json(response).await["error"].is_string());

        let response = dispatch(
            &svc,
            &ApiRequest::new(Method::POST, "/api/households").with_json(&json!({ "street": "" })),
        );
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = dispatch(&svc, &ApiRequest::new(Method::GET, "/api/reports/weather"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_report_export_is_an_attachment() {
        let svc = services(true);
        let response = dispatch(
            &svc,
            &ApiRequest::new(Method::GET, "/api/reports/population/export?format=pdf"),
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"population-report-"));
    }
}
