//! View types for the HTTP API boundary
//!
//! Repository rows keep the storage shape (snake_case, integer flags, tag
//! tables). Views are what the dashboard client sees:
//! - camelCase field names, exported to TypeScript with ts-rs
//! - SQLite integer flags exposed as `bool`
//! - related rows embedded (resident name on certificates, trail on cases,
//!   statistics on households, budget summary on projects)
//!
//! Password hashes never leave the crate; `UserView` omits them.

use chrono::NaiveDate;
use serde::Serialize;
use ts_rs::TS;

use crate::db::blotter::CaseDetail;
use crate::db::certificates::CertificateWithResident;
use crate::db::finance::expenses::ExpenseOutcome;
use crate::db::finance::projects::ProjectWithBudget;
use crate::db::finance::BudgetSummary;
use crate::db::models::{
    flag, Aip, BlotterCase, BlotterHearing, BlotterParty, BlotterStatusUpdate, CertificateTemplate,
    Expense, Household, HouseholdStatistic, Milestone, Official, Transaction, User,
};
use crate::db::residents::ResidentWithSectors;

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            status: u.status,
            last_login_at: u.last_login_at,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Login response
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionView {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: u32,
    pub user: UserView,
}

// ============================================================================
// Households and residents
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HouseholdView {
    pub id: String,
    pub house_no: Option<String>,
    pub street: String,
    pub purok: Option<String>,
    pub barangay: String,
    pub city: String,
    pub province: String,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub household_type: String,
    pub status: String,
    pub monthly_income: Option<f64>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Household> for HouseholdView {
    fn from(h: Household) -> Self {
        Self {
            id: h.id,
            house_no: h.house_no,
            street: h.street,
            purok: h.purok,
            barangay: h.barangay,
            city: h.city,
            province: h.province,
            zip_code: h.zip_code,
            latitude: h.latitude,
            longitude: h.longitude,
            household_type: h.household_type,
            status: h.status,
            monthly_income: h.monthly_income,
            notes: h.notes,
            created_at: h.created_at,
            updated_at: h.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HouseholdStatisticsView {
    pub household_id: String,
    pub total_members: i32,
    pub voter_count: i32,
    pub senior_count: i32,
    pub minor_count: i32,
    pub pwd_count: i32,
    pub updated_at: String,
}

impl From<HouseholdStatistic> for HouseholdStatisticsView {
    fn from(s: HouseholdStatistic) -> Self {
        Self {
            household_id: s.household_id,
            total_members: s.total_members,
            voter_count: s.voter_count,
            senior_count: s.senior_count,
            minor_count: s.minor_count,
            pwd_count: s.pwd_count,
            updated_at: s.updated_at,
        }
    }
}

/// Household with its statistics and members
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HouseholdDetailView {
    #[serde(flatten)]
    pub household: HouseholdView,
    pub statistics: Option<HouseholdStatisticsView>,
    pub members: Vec<ResidentView>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ResidentView {
    pub id: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub full_name: String,
    pub birth_date: String,
    pub age: Option<i32>,
    pub gender: String,
    pub civil_status: String,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub household_id: Option<String>,
    pub is_household_head: bool,
    pub is_voter: bool,
    pub status: String,
    pub sectors: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ResidentWithSectors> for ResidentView {
    fn from(rw: ResidentWithSectors) -> Self {
        let r = rw.resident;
        let full_name = r.full_name();
        let age = r.age_on(today());
        Self {
            id: r.id,
            first_name: r.first_name,
            middle_name: r.middle_name,
            last_name: r.last_name,
            suffix: r.suffix,
            full_name,
            birth_date: r.birth_date,
            age,
            gender: r.gender,
            civil_status: r.civil_status,
            contact_number: r.contact_number,
            email: r.email,
            occupation: r.occupation,
            address: r.address,
            household_id: r.household_id,
            is_household_head: flag(r.is_household_head),
            is_voter: flag(r.is_voter),
            status: r.status,
            sectors: rw.sectors,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OfficialView {
    pub id: String,
    pub name: String,
    pub position: String,
    pub term_start: Option<String>,
    pub term_end: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Official> for OfficialView {
    fn from(o: Official) -> Self {
        Self {
            id: o.id,
            name: o.name,
            position: o.position,
            term_start: o.term_start,
            term_end: o.term_end,
            is_active: flag(o.is_active),
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

// ============================================================================
// Certificates
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CertificateView {
    pub id: String,
    pub control_number: String,
    pub certificate_type: String,
    pub status: String,
    pub purpose: String,
    pub resident_id: String,
    pub resident_name: String,
    pub official_id: Option<String>,
    pub issued_date: Option<String>,
    pub or_number: Option<String>,
    pub fee: Option<f64>,
    pub business_name: Option<String>,
    pub remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CertificateWithResident> for CertificateView {
    fn from(cw: CertificateWithResident) -> Self {
        let resident_name = cw.resident.full_name();
        let c = cw.certificate;
        Self {
            id: c.id,
            control_number: c.control_number,
            certificate_type: c.certificate_type,
            status: c.status,
            purpose: c.purpose,
            resident_id: c.resident_id,
            resident_name,
            official_id: c.official_id,
            issued_date: c.issued_date,
            or_number: c.or_number,
            fee: c.fee,
            business_name: c.business_name,
            remarks: c.remarks,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CertificateTemplateView {
    pub id: String,
    pub certificate_type: String,
    pub name: String,
    pub html_content: String,
    pub css_content: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CertificateTemplate> for CertificateTemplateView {
    fn from(t: CertificateTemplate) -> Self {
        Self {
            id: t.id,
            certificate_type: t.certificate_type,
            name: t.name,
            html_content: t.html_content,
            css_content: t.css_content,
            is_active: flag(t.is_active),
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

// ============================================================================
// Blotter
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlotterCaseView {
    pub id: String,
    pub case_number: String,
    pub incident_type: String,
    pub incident_date: String,
    pub incident_location: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub resolution: Option<String>,
    pub resolved_at: Option<String>,
    pub reported_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BlotterCase> for BlotterCaseView {
    fn from(c: BlotterCase) -> Self {
        Self {
            id: c.id,
            case_number: c.case_number,
            incident_type: c.incident_type,
            incident_date: c.incident_date,
            incident_location: c.incident_location,
            description: c.description,
            status: c.status,
            priority: c.priority,
            resolution: c.resolution,
            resolved_at: c.resolved_at,
            reported_by: c.reported_by,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlotterPartyView {
    pub id: String,
    pub case_id: String,
    pub party_type: String,
    pub resident_id: Option<String>,
    pub name: String,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub statement: Option<String>,
    pub created_at: String,
}

impl From<BlotterParty> for BlotterPartyView {
    fn from(p: BlotterParty) -> Self {
        Self {
            id: p.id,
            case_id: p.case_id,
            party_type: p.party_type,
            resident_id: p.resident_id,
            name: p.name,
            contact_number: p.contact_number,
            address: p.address,
            statement: p.statement,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlotterHearingView {
    pub id: String,
    pub case_id: String,
    pub scheduled_at: String,
    pub location: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BlotterHearing> for BlotterHearingView {
    fn from(h: BlotterHearing) -> Self {
        Self {
            id: h.id,
            case_id: h.case_id,
            scheduled_at: h.scheduled_at,
            location: h.location,
            status: h.status,
            notes: h.notes,
            created_at: h.created_at,
            updated_at: h.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlotterStatusUpdateView {
    pub id: String,
    pub case_id: String,
    pub status: String,
    pub notes: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: String,
}

impl From<BlotterStatusUpdate> for BlotterStatusUpdateView {
    fn from(u: BlotterStatusUpdate) -> Self {
        Self {
            id: u.id,
            case_id: u.case_id,
            status: u.status,
            notes: u.notes,
            updated_by: u.updated_by,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlotterCaseDetailView {
    #[serde(flatten)]
    pub case: BlotterCaseView,
    pub parties: Vec<BlotterPartyView>,
    pub hearings: Vec<BlotterHearingView>,
    pub updates: Vec<BlotterStatusUpdateView>,
}

impl From<CaseDetail> for BlotterCaseDetailView {
    fn from(d: CaseDetail) -> Self {
        Self {
            case: d.case.into(),
            parties: d.parties.into_iter().map(Into::into).collect(),
            hearings: d.hearings.into_iter().map(Into::into).collect(),
            updates: d.updates.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Finance
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BudgetView {
    pub total_cost: f64,
    pub total_expenses: f64,
    pub remaining: f64,
    /// Whole percent, clamped to 0..=100
    pub utilization: u32,
    pub over_budget: bool,
}

impl From<BudgetSummary> for BudgetView {
    fn from(b: BudgetSummary) -> Self {
        Self {
            total_cost: b.total_cost,
            total_expenses: b.total_expenses,
            remaining: b.remaining,
            utilization: b.utilization,
            over_budget: b.over_budget,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AipView {
    pub id: String,
    pub fiscal_year: i32,
    pub title: String,
    pub description: Option<String>,
    pub total_budget: f64,
    pub status: String,
    pub approved_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Aip> for AipView {
    fn from(a: Aip) -> Self {
        Self {
            id: a.id,
            fiscal_year: a.fiscal_year,
            title: a.title,
            description: a.description,
            total_budget: a.total_budget,
            status: a.status,
            approved_date: a.approved_date,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// AIP with its projects and how much of the budget they claim
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AipDetailView {
    #[serde(flatten)]
    pub aip: AipView,
    pub allocated_budget: f64,
    pub unallocated_budget: f64,
    pub projects: Vec<ProjectView>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProjectView {
    pub id: String,
    pub aip_id: String,
    pub project_code: String,
    pub title: String,
    pub description: Option<String>,
    pub sector: String,
    pub location: Option<String>,
    pub implementing_office: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub total_cost: f64,
    pub status: String,
    pub budget: BudgetView,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProjectWithBudget> for ProjectView {
    fn from(pw: ProjectWithBudget) -> Self {
        let p = pw.project;
        Self {
            id: p.id,
            aip_id: p.aip_id,
            project_code: p.project_code,
            title: p.title,
            description: p.description,
            sector: p.sector,
            location: p.location,
            implementing_office: p.implementing_office,
            start_date: p.start_date,
            end_date: p.end_date,
            total_cost: p.total_cost,
            status: p.status,
            budget: pw.budget.into(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenseView {
    pub id: String,
    pub project_id: String,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub expense_date: String,
    pub reference_number: Option<String>,
    pub transaction_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Expense> for ExpenseView {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id,
            project_id: e.project_id,
            description: e.description,
            amount: e.amount,
            category: e.category,
            expense_date: e.expense_date,
            reference_number: e.reference_number,
            transaction_id: e.transaction_id,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// Response to recording an expense: the row plus the project's new position
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenseRecordedView {
    pub expense: ExpenseView,
    pub budget: BudgetView,
    /// Present when the expense pushed the project past its total cost
    pub warning: Option<String>,
}

impl From<ExpenseOutcome> for ExpenseRecordedView {
    fn from(o: ExpenseOutcome) -> Self {
        let warning = o.budget.over_budget.then(|| {
            format!(
                "Project expenses ({:.2}) exceed total cost ({:.2})",
                o.budget.total_expenses, o.budget.total_cost
            )
        });
        Self {
            expense: o.expense.into(),
            budget: o.budget.into(),
            warning,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MilestoneView {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub target_date: String,
    pub completed_date: Option<String>,
    pub progress: i32,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Milestone> for MilestoneView {
    fn from(m: Milestone) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            title: m.title,
            description: m.description,
            target_date: m.target_date,
            completed_date: m.completed_date,
            progress: m.progress,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionView {
    pub id: String,
    pub reference_number: String,
    pub transaction_type: String,
    pub category: String,
    pub amount: f64,
    pub description: String,
    pub transaction_date: String,
    pub status: String,
    pub payee: Option<String>,
    pub created_by: Option<String>,
    pub approved_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Transaction> for TransactionView {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            reference_number: t.reference_number,
            transaction_type: t.transaction_type,
            category: t.category,
            amount: t.amount,
            description: t.description,
            transaction_date: t.transaction_date,
            status: t.status,
            payee: t.payee,
            created_by: t.created_by,
            approved_by: t.approved_by,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}
