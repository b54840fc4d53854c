//! Diesel model definitions for database tables
//!
//! - Queryable structs: for SELECT queries (reading data)
//! - Insertable structs: for INSERT queries (writing data)
//! - Changeset structs: for partial UPDATEs (`None` leaves a column untouched)
//!
//! Status and category vocabularies are plain string constants so they map
//! straight onto the TEXT columns.

use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use super::diesel_schema::*;

// ============================================================================
// Timestamp Helpers (SQLite stores timestamps as TEXT)
// ============================================================================

/// Get current UTC timestamp as ISO 8601 string for SQLite TEXT columns
pub fn current_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Today's date as YYYY-MM-DD
pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Year component of an ISO date or timestamp, if it parses
pub fn year_of(date: &str) -> Option<i32> {
    date.get(0..4).and_then(|y| y.parse().ok())
}

/// Deserialize a field where `null` means "clear" and absence means "keep".
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Convert an SQLite integer flag to bool
pub fn flag(value: i32) -> bool {
    value != 0
}

// ============================================================================
// User Models
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub status: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChanges<'a> {
    pub name: Option<&'a str>,
    pub role: Option<&'a str>,
    pub status: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub updated_at: Option<&'a str>,
}

// ============================================================================
// Household Models
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = households)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Household {
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = households)]
pub struct NewHousehold<'a> {
    pub id: &'a str,
    pub house_no: Option<&'a str>,
    pub street: &'a str,
    pub purok: Option<&'a str>,
    pub barangay: &'a str,
    pub city: &'a str,
    pub province: &'a str,
    pub zip_code: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub household_type: &'a str,
    pub status: &'a str,
    pub monthly_income: Option<f64>,
    pub notes: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = households)]
pub struct HouseholdChanges<'a> {
    pub house_no: Option<Option<&'a str>>,
    pub street: Option<&'a str>,
    pub purok: Option<Option<&'a str>>,
    pub barangay: Option<&'a str>,
    pub city: Option<&'a str>,
    pub province: Option<&'a str>,
    pub zip_code: Option<Option<&'a str>>,
    pub latitude: Option<Option<f64>>,
    pub longitude: Option<Option<f64>>,
    pub household_type: Option<&'a str>,
    pub status: Option<&'a str>,
    pub monthly_income: Option<Option<f64>>,
    pub notes: Option<Option<&'a str>>,
    pub updated_at: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = household_statistics)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HouseholdStatistic {
    pub household_id: String,
    pub total_members: i32,
    pub voter_count: i32,
    pub senior_count: i32,
    pub minor_count: i32,
    pub pwd_count: i32,
    pub updated_at: String,
}

// ============================================================================
// Resident Models
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = residents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Resident {
    pub id: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub birth_date: String,
    pub gender: String,
    pub civil_status: String,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub household_id: Option<String>,
    pub is_household_head: i32,
    pub is_voter: i32,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Resident {
    /// "First M. Last Suffix"
    pub fn full_name(&self) -> String {
        let mut name = self.first_name.clone();
        if let Some(middle) = self.middle_name.as_deref().and_then(|m| m.chars().next()) {
            name.push(' ');
            name.push(middle);
            name.push('.');
        }
        name.push(' ');
        name.push_str(&self.last_name);
        if let Some(suffix) = self.suffix.as_deref().filter(|s| !s.is_empty()) {
            name.push(' ');
            name.push_str(suffix);
        }
        name
    }

    /// Age in whole years on the given date (YYYY-MM-DD), if birth_date parses
    pub fn age_on(&self, on: chrono::NaiveDate) -> Option<i32> {
        age_on(&self.birth_date, on)
    }
}

/// Age in whole years for a YYYY-MM-DD birth date
pub fn age_on(birth_date: &str, on: chrono::NaiveDate) -> Option<i32> {
    use chrono::Datelike;

    let born = chrono::NaiveDate::parse_from_str(birth_date.get(0..10)?, "%Y-%m-%d").ok()?;
    let mut age = on.year() - born.year();
    if (on.month(), on.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    Some(age.max(0))
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = residents)]
pub struct NewResident<'a> {
    pub id: &'a str,
    pub first_name: &'a str,
    pub middle_name: Option<&'a str>,
    pub last_name: &'a str,
    pub suffix: Option<&'a str>,
    pub birth_date: &'a str,
    pub gender: &'a str,
    pub civil_status: &'a str,
    pub contact_number: Option<&'a str>,
    pub email: Option<&'a str>,
    pub occupation: Option<&'a str>,
    pub address: Option<&'a str>,
    pub household_id: Option<&'a str>,
    pub is_household_head: i32,
    pub is_voter: i32,
    pub status: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = residents)]
pub struct ResidentChanges<'a> {
    pub first_name: Option<&'a str>,
    pub middle_name: Option<Option<&'a str>>,
    pub last_name: Option<&'a str>,
    pub suffix: Option<Option<&'a str>>,
    pub birth_date: Option<&'a str>,
    pub gender: Option<&'a str>,
    pub civil_status: Option<&'a str>,
    pub contact_number: Option<Option<&'a str>>,
    pub email: Option<Option<&'a str>>,
    pub occupation: Option<Option<&'a str>>,
    pub address: Option<Option<&'a str>>,
    pub household_id: Option<Option<&'a str>>,
    pub is_household_head: Option<i32>,
    pub is_voter: Option<i32>,
    pub status: Option<&'a str>,
    pub updated_at: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = resident_sectors)]
pub struct ResidentSector {
    pub resident_id: String,
    pub sector: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = resident_sectors)]
pub struct NewResidentSector<'a> {
    pub resident_id: &'a str,
    pub sector: &'a str,
}

// ============================================================================
// Official Models
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = officials)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Official {
    pub id: String,
    pub name: String,
    pub position: String,
    pub term_start: Option<String>,
    pub term_end: Option<String>,
    pub is_active: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = officials)]
pub struct NewOfficial<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub position: &'a str,
    pub term_start: Option<&'a str>,
    pub term_end: Option<&'a str>,
    pub is_active: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = officials)]
pub struct OfficialChanges<'a> {
    pub name: Option<&'a str>,
    pub position: Option<&'a str>,
    pub term_start: Option<Option<&'a str>>,
    pub term_end: Option<Option<&'a str>>,
    pub is_active: Option<i32>,
    pub updated_at: Option<&'a str>,
}

// ============================================================================
// Certificate Models
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = certificates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Certificate {
    pub id: String,
    pub control_number: String,
    pub certificate_type: String,
    pub status: String,
    pub purpose: String,
    pub resident_id: String,
    pub official_id: Option<String>,
    pub issued_date: Option<String>,
    pub or_number: Option<String>,
    pub fee: Option<f64>,
    pub business_name: Option<String>,
    pub remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = certificates)]
pub struct NewCertificate<'a> {
    pub id: &'a str,
    pub control_number: &'a str,
    pub certificate_type: &'a str,
    pub status: &'a str,
    pub purpose: &'a str,
    pub resident_id: &'a str,
    pub official_id: Option<&'a str>,
    pub issued_date: Option<&'a str>,
    pub or_number: Option<&'a str>,
    pub fee: Option<f64>,
    pub business_name: Option<&'a str>,
    pub remarks: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = certificates)]
pub struct CertificateChanges<'a> {
    pub purpose: Option<&'a str>,
    pub official_id: Option<Option<&'a str>>,
    pub or_number: Option<Option<&'a str>>,
    pub fee: Option<Option<f64>>,
    pub business_name: Option<Option<&'a str>>,
    pub remarks: Option<Option<&'a str>>,
    pub updated_at: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = certificate_templates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CertificateTemplate {
    pub id: String,
    pub certificate_type: String,
    pub name: String,
    pub html_content: String,
    pub css_content: Option<String>,
    pub is_active: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = certificate_templates)]
pub struct NewCertificateTemplate<'a> {
    pub id: &'a str,
    pub certificate_type: &'a str,
    pub name: &'a str,
    pub html_content: &'a str,
    pub css_content: Option<&'a str>,
    pub is_active: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = certificate_templates)]
pub struct CertificateTemplateChanges<'a> {
    pub name: Option<&'a str>,
    pub html_content: Option<&'a str>,
    pub css_content: Option<Option<&'a str>>,
    pub is_active: Option<i32>,
    pub updated_at: Option<&'a str>,
}

// ============================================================================
// Blotter Models
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = blotter_cases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BlotterCase {
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blotter_cases)]
pub struct NewBlotterCase<'a> {
    pub id: &'a str,
    pub case_number: &'a str,
    pub incident_type: &'a str,
    pub incident_date: &'a str,
    pub incident_location: &'a str,
    pub description: &'a str,
    pub status: &'a str,
    pub priority: &'a str,
    pub reported_by: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = blotter_cases)]
pub struct BlotterCaseChanges<'a> {
    pub incident_type: Option<&'a str>,
    pub incident_date: Option<&'a str>,
    pub incident_location: Option<&'a str>,
    pub description: Option<&'a str>,
    pub priority: Option<&'a str>,
    pub resolution: Option<Option<&'a str>>,
    pub updated_at: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = blotter_parties)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BlotterParty {
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blotter_parties)]
pub struct NewBlotterParty<'a> {
    pub id: &'a str,
    pub case_id: &'a str,
    pub party_type: &'a str,
    pub resident_id: Option<&'a str>,
    pub name: &'a str,
    pub contact_number: Option<&'a str>,
    pub address: Option<&'a str>,
    pub statement: Option<&'a str>,
    pub created_at: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = blotter_hearings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BlotterHearing {
    pub id: String,
    pub case_id: String,
    pub scheduled_at: String,
    pub location: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blotter_hearings)]
pub struct NewBlotterHearing<'a> {
    pub id: &'a str,
    pub case_id: &'a str,
    pub scheduled_at: &'a str,
    pub location: &'a str,
    pub status: &'a str,
    pub notes: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = blotter_hearings)]
pub struct BlotterHearingChanges<'a> {
    pub scheduled_at: Option<&'a str>,
    pub location: Option<&'a str>,
    pub status: Option<&'a str>,
    pub notes: Option<Option<&'a str>>,
    pub updated_at: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = blotter_status_updates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BlotterStatusUpdate {
    pub id: String,
    pub case_id: String,
    pub status: String,
    pub notes: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blotter_status_updates)]
pub struct NewBlotterStatusUpdate<'a> {
    pub id: &'a str,
    pub case_id: &'a str,
    pub status: &'a str,
    pub notes: Option<&'a str>,
    pub updated_by: Option<&'a str>,
    pub created_at: &'a str,
}

// ============================================================================
// Finance Models
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = aips)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Aip {
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = aips)]
pub struct NewAip<'a> {
    pub id: &'a str,
    pub fiscal_year: i32,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub total_budget: f64,
    pub status: &'a str,
    pub approved_date: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = aips)]
pub struct AipChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<Option<&'a str>>,
    pub total_budget: Option<f64>,
    pub status: Option<&'a str>,
    pub approved_date: Option<Option<&'a str>>,
    pub updated_at: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Project {
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
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub struct NewProject<'a> {
    pub id: &'a str,
    pub aip_id: &'a str,
    pub project_code: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub sector: &'a str,
    pub location: Option<&'a str>,
    pub implementing_office: Option<&'a str>,
    pub start_date: Option<&'a str>,
    pub end_date: Option<&'a str>,
    pub total_cost: f64,
    pub status: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = projects)]
pub struct ProjectChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<Option<&'a str>>,
    pub sector: Option<&'a str>,
    pub location: Option<Option<&'a str>>,
    pub implementing_office: Option<Option<&'a str>>,
    pub start_date: Option<Option<&'a str>>,
    pub end_date: Option<Option<&'a str>>,
    pub total_cost: Option<f64>,
    pub status: Option<&'a str>,
    pub updated_at: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = expenses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Expense {
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = expenses)]
pub struct NewExpense<'a> {
    pub id: &'a str,
    pub project_id: &'a str,
    pub description: &'a str,
    pub amount: f64,
    pub category: &'a str,
    pub expense_date: &'a str,
    pub reference_number: Option<&'a str>,
    pub transaction_id: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = milestones)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Milestone {
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = milestones)]
pub struct NewMilestone<'a> {
    pub id: &'a str,
    pub project_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub target_date: &'a str,
    pub completed_date: Option<&'a str>,
    pub progress: i32,
    pub status: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = milestones)]
pub struct MilestoneChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<Option<&'a str>>,
    pub target_date: Option<&'a str>,
    pub completed_date: Option<Option<&'a str>>,
    pub progress: Option<i32>,
    pub status: Option<&'a str>,
    pub updated_at: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Transaction {
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = transactions)]
pub struct NewTransaction<'a> {
    pub id: &'a str,
    pub reference_number: &'a str,
    pub transaction_type: &'a str,
    pub category: &'a str,
    pub amount: f64,
    pub description: &'a str,
    pub transaction_date: &'a str,
    pub status: &'a str,
    pub payee: Option<&'a str>,
    pub created_by: Option<&'a str>,
    pub approved_by: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = transactions)]
pub struct TransactionChanges<'a> {
    pub transaction_type: Option<&'a str>,
    pub category: Option<&'a str>,
    pub amount: Option<f64>,
    pub description: Option<&'a str>,
    pub transaction_date: Option<&'a str>,
    pub payee: Option<Option<&'a str>>,
    pub updated_at: Option<&'a str>,
}

// ============================================================================
// Vocabularies
// ============================================================================

/// Staff roles, highest privilege first
pub mod user_roles {
    pub const SUPER_ADMIN: &str = "SUPER_ADMIN";
    pub const CAPTAIN: &str = "CAPTAIN";
    pub const SECRETARY: &str = "SECRETARY";
    pub const TREASURER: &str = "TREASURER";
    pub const STAFF: &str = "STAFF";

    pub const ALL: [&str; 5] = [SUPER_ADMIN, CAPTAIN, SECRETARY, TREASURER, STAFF];

    pub fn is_valid(role: &str) -> bool {
        ALL.contains(&role)
    }
}

/// Account states; accounts are deactivated, never deleted
pub mod user_statuses {
    pub const ACTIVE: &str = "ACTIVE";
    pub const INACTIVE: &str = "INACTIVE";
    pub const PENDING: &str = "PENDING";

    pub const ALL: [&str; 3] = [ACTIVE, INACTIVE, PENDING];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }
}

pub mod household_types {
    pub const SINGLE_FAMILY: &str = "SINGLE_FAMILY";
    pub const MULTI_FAMILY: &str = "MULTI_FAMILY";
    pub const EXTENDED_FAMILY: &str = "EXTENDED_FAMILY";
    pub const SINGLE_PERSON: &str = "SINGLE_PERSON";
    pub const INFORMAL_SETTLER: &str = "INFORMAL_SETTLER";

    pub const ALL: [&str; 5] = [
        SINGLE_FAMILY, MULTI_FAMILY, EXTENDED_FAMILY, SINGLE_PERSON, INFORMAL_SETTLER,
    ];

    pub fn is_valid(t: &str) -> bool {
        ALL.contains(&t)
    }
}

/// Households are archived rather than deleted
pub mod household_statuses {
    pub const ACTIVE: &str = "ACTIVE";
    pub const INACTIVE: &str = "INACTIVE";
    pub const ARCHIVED: &str = "ARCHIVED";

    pub const ALL: [&str; 3] = [ACTIVE, INACTIVE, ARCHIVED];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }
}

pub mod genders {
    pub const MALE: &str = "MALE";
    pub const FEMALE: &str = "FEMALE";
    pub const OTHER: &str = "OTHER";

    pub const ALL: [&str; 3] = [MALE, FEMALE, OTHER];

    pub fn is_valid(gender: &str) -> bool {
        ALL.contains(&gender)
    }
}

pub mod civil_statuses {
    pub const SINGLE: &str = "SINGLE";
    pub const MARRIED: &str = "MARRIED";
    pub const WIDOWED: &str = "WIDOWED";
    pub const SEPARATED: &str = "SEPARATED";
    pub const DIVORCED: &str = "DIVORCED";

    pub const ALL: [&str; 5] = [SINGLE, MARRIED, WIDOWED, SEPARATED, DIVORCED];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }
}

pub mod resident_statuses {
    pub const ACTIVE: &str = "ACTIVE";
    pub const INACTIVE: &str = "INACTIVE";
    pub const DECEASED: &str = "DECEASED";
    pub const TRANSFERRED: &str = "TRANSFERRED";

    pub const ALL: [&str; 4] = [ACTIVE, INACTIVE, DECEASED, TRANSFERRED];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }
}

/// Sector tags used for social-service targeting
pub mod sectors {
    pub const SENIOR_CITIZEN: &str = "SENIOR_CITIZEN";
    pub const PWD: &str = "PWD";
    pub const SOLO_PARENT: &str = "SOLO_PARENT";
    pub const YOUTH: &str = "YOUTH";
    pub const FOUR_PS: &str = "4PS";
    pub const OFW: &str = "OFW";
    pub const INDIGENOUS: &str = "INDIGENOUS";
    pub const FARMER: &str = "FARMER";
    pub const FISHERFOLK: &str = "FISHERFOLK";
    pub const UNEMPLOYED: &str = "UNEMPLOYED";

    pub const ALL: [&str; 10] = [
        SENIOR_CITIZEN, PWD, SOLO_PARENT, YOUTH, FOUR_PS, OFW, INDIGENOUS, FARMER, FISHERFOLK,
        UNEMPLOYED,
    ];

    pub fn is_valid(sector: &str) -> bool {
        ALL.contains(&sector)
    }
}

pub mod certificate_types {
    pub const RESIDENCY: &str = "RESIDENCY";
    pub const INDIGENCY: &str = "INDIGENCY";
    pub const CLEARANCE: &str = "CLEARANCE";
    pub const BUSINESS_PERMIT: &str = "BUSINESS_PERMIT";
    pub const CFA: &str = "CFA";

    pub const ALL: [&str; 5] = [RESIDENCY, INDIGENCY, CLEARANCE, BUSINESS_PERMIT, CFA];

    pub fn is_valid(t: &str) -> bool {
        ALL.contains(&t)
    }

    /// Control number prefix for a certificate type
    pub fn prefix(t: &str) -> &'static str {
        match t {
            RESIDENCY => "RES",
            INDIGENCY => "IND",
            CLEARANCE => "CLR",
            BUSINESS_PERMIT => "BP",
            CFA => "CFA",
            _ => "CERT",
        }
    }

    /// Human-readable document title
    pub fn title(t: &str) -> &'static str {
        match t {
            RESIDENCY => "Certificate of Residency",
            INDIGENCY => "Certificate of Indigency",
            CLEARANCE => "Barangay Clearance",
            BUSINESS_PERMIT => "Barangay Business Permit",
            CFA => "Certificate to File Action",
            _ => "Certificate",
        }
    }
}

/// Certificate lifecycle: PENDING -> APPROVED -> RELEASED, with REJECTED and
/// CANCELLED reachable from PENDING or APPROVED.
pub mod certificate_statuses {
    pub const PENDING: &str = "PENDING";
    pub const APPROVED: &str = "APPROVED";
    pub const RELEASED: &str = "RELEASED";
    pub const REJECTED: &str = "REJECTED";
    pub const CANCELLED: &str = "CANCELLED";

    pub const ALL: [&str; 5] = [PENDING, APPROVED, RELEASED, REJECTED, CANCELLED];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }

    pub fn is_terminal(status: &str) -> bool {
        matches!(status, RELEASED | REJECTED | CANCELLED)
    }

    pub fn can_transition(from: &str, to: &str) -> bool {
        matches!(
            (from, to),
            (PENDING, APPROVED)
                | (APPROVED, RELEASED)
                | (PENDING, REJECTED)
                | (PENDING, CANCELLED)
                | (APPROVED, REJECTED)
                | (APPROVED, CANCELLED)
        )
    }
}

pub mod blotter_statuses {
    pub const PENDING: &str = "PENDING";
    pub const ONGOING: &str = "ONGOING";
    pub const RESOLVED: &str = "RESOLVED";
    pub const ESCALATED: &str = "ESCALATED";

    pub const ALL: [&str; 4] = [PENDING, ONGOING, RESOLVED, ESCALATED];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }

    /// Cases never return to PENDING; RESOLVED is terminal.
    pub fn can_transition(from: &str, to: &str) -> bool {
        matches!(
            (from, to),
            (PENDING, ONGOING)
                | (PENDING, RESOLVED)
                | (PENDING, ESCALATED)
                | (ONGOING, RESOLVED)
                | (ONGOING, ESCALATED)
                | (ESCALATED, ONGOING)
                | (ESCALATED, RESOLVED)
        )
    }

    pub fn is_active(status: &str) -> bool {
        matches!(status, PENDING | ONGOING | ESCALATED)
    }
}

pub mod blotter_priorities {
    pub const LOW: &str = "LOW";
    pub const MEDIUM: &str = "MEDIUM";
    pub const HIGH: &str = "HIGH";
    pub const URGENT: &str = "URGENT";

    pub const ALL: [&str; 4] = [LOW, MEDIUM, HIGH, URGENT];

    pub fn is_valid(priority: &str) -> bool {
        ALL.contains(&priority)
    }
}

pub mod party_types {
    pub const COMPLAINANT: &str = "COMPLAINANT";
    pub const RESPONDENT: &str = "RESPONDENT";
    pub const WITNESS: &str = "WITNESS";

    pub const ALL: [&str; 3] = [COMPLAINANT, RESPONDENT, WITNESS];

    pub fn is_valid(t: &str) -> bool {
        ALL.contains(&t)
    }
}

pub mod hearing_statuses {
    pub const SCHEDULED: &str = "SCHEDULED";
    pub const COMPLETED: &str = "COMPLETED";
    pub const CANCELLED: &str = "CANCELLED";
    pub const RESCHEDULED: &str = "RESCHEDULED";

    pub const ALL: [&str; 4] = [SCHEDULED, COMPLETED, CANCELLED, RESCHEDULED];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }
}

pub mod aip_statuses {
    pub const DRAFT: &str = "DRAFT";
    pub const SUBMITTED: &str = "SUBMITTED";
    pub const APPROVED: &str = "APPROVED";
    pub const IMPLEMENTED: &str = "IMPLEMENTED";
    pub const CLOSED: &str = "CLOSED";

    pub const ALL: [&str; 5] = [DRAFT, SUBMITTED, APPROVED, IMPLEMENTED, CLOSED];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }
}

pub mod project_statuses {
    pub const PLANNED: &str = "PLANNED";
    pub const ONGOING: &str = "ONGOING";
    pub const COMPLETED: &str = "COMPLETED";
    pub const CANCELLED: &str = "CANCELLED";
    pub const ON_HOLD: &str = "ON_HOLD";

    pub const ALL: [&str; 5] = [PLANNED, ONGOING, COMPLETED, CANCELLED, ON_HOLD];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }
}

pub mod project_sectors {
    pub const GENERAL_SERVICES: &str = "GENERAL_SERVICES";
    pub const SOCIAL_SERVICES: &str = "SOCIAL_SERVICES";
    pub const ECONOMIC_SERVICES: &str = "ECONOMIC_SERVICES";
    pub const INFRASTRUCTURE: &str = "INFRASTRUCTURE";
    pub const ENVIRONMENT: &str = "ENVIRONMENT";

    pub const ALL: [&str; 5] = [
        GENERAL_SERVICES, SOCIAL_SERVICES, ECONOMIC_SERVICES, INFRASTRUCTURE, ENVIRONMENT,
    ];

    pub fn is_valid(sector: &str) -> bool {
        ALL.contains(&sector)
    }
}

pub mod milestone_statuses {
    pub const PENDING: &str = "PENDING";
    pub const IN_PROGRESS: &str = "IN_PROGRESS";
    pub const COMPLETED: &str = "COMPLETED";
    pub const DELAYED: &str = "DELAYED";

    pub const ALL: [&str; 4] = [PENDING, IN_PROGRESS, COMPLETED, DELAYED];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }
}

pub mod expense_categories {
    pub const MATERIALS: &str = "MATERIALS";
    pub const LABOR: &str = "LABOR";
    pub const EQUIPMENT: &str = "EQUIPMENT";
    pub const SERVICES: &str = "SERVICES";
    pub const ADMINISTRATIVE: &str = "ADMINISTRATIVE";
    pub const OTHER: &str = "OTHER";

    pub const ALL: [&str; 6] = [MATERIALS, LABOR, EQUIPMENT, SERVICES, ADMINISTRATIVE, OTHER];

    pub fn is_valid(category: &str) -> bool {
        ALL.contains(&category)
    }
}

pub mod transaction_types {
    pub const INCOME: &str = "INCOME";
    pub const EXPENSE: &str = "EXPENSE";

    pub const ALL: [&str; 2] = [INCOME, EXPENSE];

    pub fn is_valid(t: &str) -> bool {
        ALL.contains(&t)
    }
}

/// Ledger lifecycle: PENDING -> APPROVED -> COMPLETED, with REJECTED from
/// PENDING and CANCELLED from PENDING or APPROVED.
pub mod transaction_statuses {
    pub const PENDING: &str = "PENDING";
    pub const APPROVED: &str = "APPROVED";
    pub const COMPLETED: &str = "COMPLETED";
    pub const REJECTED: &str = "REJECTED";
    pub const CANCELLED: &str = "CANCELLED";

    pub const ALL: [&str; 5] = [PENDING, APPROVED, COMPLETED, REJECTED, CANCELLED];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }

    pub fn can_transition(from: &str, to: &str) -> bool {
        matches!(
            (from, to),
            (PENDING, APPROVED)
                | (PENDING, REJECTED)
                | (PENDING, CANCELLED)
                | (APPROVED, COMPLETED)
                | (APPROVED, CANCELLED)
        )
    }

    /// Only entries that never posted may be deleted
    pub fn is_deletable(status: &str) -> bool {
        matches!(status, PENDING | REJECTED | CANCELLED)
    }
}
