//! Database schema definitions
//!
//! DDL is applied through `diesel::sql_query`; the `diesel::table!`
//! declarations in `diesel_schema.rs` must stay in step with it.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use tracing::info;

use crate::error::RegistryError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

#[derive(QueryableByName)]
struct VersionRow {
    #[diesel(sql_type = Integer)]
    version: i32,
}

/// Initialize the database schema
pub fn init_schema(conn: &mut SqliteConnection) -> Result<(), RegistryError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        conn.transaction::<_, RegistryError, _>(|conn| {
            create_tables(conn)?;
            set_schema_version(conn, SCHEMA_VERSION)
        })?;
    } else if current_version < SCHEMA_VERSION {
        info!("Migrating schema from v{} to v{}", current_version, SCHEMA_VERSION);
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &mut SqliteConnection) -> Result<i32, RegistryError> {
    conn.batch_execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
        .map_err(|e| RegistryError::Database(format!("Failed to create schema_version table: {}", e)))?;

    let rows: Vec<VersionRow> = diesel::sql_query("SELECT version FROM schema_version LIMIT 1")
        .load(conn)?;

    Ok(rows.first().map(|r| r.version).unwrap_or(0))
}

fn set_schema_version(conn: &mut SqliteConnection, version: i32) -> Result<(), RegistryError> {
    diesel::sql_query("DELETE FROM schema_version").execute(conn)?;
    diesel::sql_query("INSERT INTO schema_version (version) VALUES (?)")
        .bind::<Integer, _>(version)
        .execute(conn)?;
    Ok(())
}

fn create_tables(conn: &mut SqliteConnection) -> Result<(), RegistryError> {
    for (name, ddl) in [
        ("users", USERS_SCHEMA),
        ("registry", REGISTRY_SCHEMA),
        ("certificates", CERTIFICATES_SCHEMA),
        ("blotter", BLOTTER_SCHEMA),
        ("finance", FINANCE_SCHEMA),
        ("indexes", INDEXES_SCHEMA),
    ] {
        conn.batch_execute(ddl)
            .map_err(|e| RegistryError::Database(format!("Failed to create {} tables: {}", name, e)))?;
    }
    Ok(())
}

const USERS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'STAFF',
    status TEXT NOT NULL DEFAULT 'PENDING',
    last_login_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

const REGISTRY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS households (
    id TEXT PRIMARY KEY NOT NULL,
    house_no TEXT,
    street TEXT NOT NULL,
    purok TEXT,
    barangay TEXT NOT NULL,
    city TEXT NOT NULL,
    province TEXT NOT NULL,
    zip_code TEXT,
    latitude REAL,
    longitude REAL,
    household_type TEXT NOT NULL DEFAULT 'SINGLE_FAMILY',
    status TEXT NOT NULL DEFAULT 'ACTIVE',
    monthly_income REAL,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS household_statistics (
    household_id TEXT PRIMARY KEY NOT NULL REFERENCES households(id) ON DELETE CASCADE,
    total_members INTEGER NOT NULL DEFAULT 0,
    voter_count INTEGER NOT NULL DEFAULT 0,
    senior_count INTEGER NOT NULL DEFAULT 0,
    minor_count INTEGER NOT NULL DEFAULT 0,
    pwd_count INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS residents (
    id TEXT PRIMARY KEY NOT NULL,
    first_name TEXT NOT NULL,
    middle_name TEXT,
    last_name TEXT NOT NULL,
    suffix TEXT,
    birth_date TEXT NOT NULL,
    gender TEXT NOT NULL,
    civil_status TEXT NOT NULL DEFAULT 'SINGLE',
    contact_number TEXT,
    email TEXT,
    occupation TEXT,
    address TEXT,
    household_id TEXT REFERENCES households(id) ON DELETE SET NULL,
    is_household_head INTEGER NOT NULL DEFAULT 0,
    is_voter INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'ACTIVE',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS resident_sectors (
    resident_id TEXT NOT NULL REFERENCES residents(id) ON DELETE CASCADE,
    sector TEXT NOT NULL,
    PRIMARY KEY (resident_id, sector)
);

CREATE TABLE IF NOT EXISTS officials (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    position TEXT NOT NULL,
    term_start TEXT,
    term_end TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

const CERTIFICATES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS certificate_templates (
    id TEXT PRIMARY KEY NOT NULL,
    certificate_type TEXT NOT NULL,
    name TEXT NOT NULL,
    html_content TEXT NOT NULL,
    css_content TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS certificates (
    id TEXT PRIMARY KEY NOT NULL,
    control_number TEXT NOT NULL UNIQUE,
    certificate_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING',
    purpose TEXT NOT NULL,
    resident_id TEXT NOT NULL REFERENCES residents(id) ON DELETE CASCADE,
    official_id TEXT REFERENCES officials(id) ON DELETE SET NULL,
    issued_date TEXT,
    or_number TEXT,
    fee REAL,
    business_name TEXT,
    remarks TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

const BLOTTER_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS blotter_cases (
    id TEXT PRIMARY KEY NOT NULL,
    case_number TEXT NOT NULL UNIQUE,
    incident_type TEXT NOT NULL,
    incident_date TEXT NOT NULL,
    incident_location TEXT NOT NULL,
    description TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING',
    priority TEXT NOT NULL DEFAULT 'MEDIUM',
    resolution TEXT,
    resolved_at TEXT,
    reported_by TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS blotter_parties (
    id TEXT PRIMARY KEY NOT NULL,
    case_id TEXT NOT NULL REFERENCES blotter_cases(id) ON DELETE CASCADE,
    party_type TEXT NOT NULL,
    resident_id TEXT REFERENCES residents(id) ON DELETE SET NULL,
    name TEXT NOT NULL,
    contact_number TEXT,
    address TEXT,
    statement TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS blotter_hearings (
    id TEXT PRIMARY KEY NOT NULL,
    case_id TEXT NOT NULL REFERENCES blotter_cases(id) ON DELETE CASCADE,
    scheduled_at TEXT NOT NULL,
    location TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'SCHEDULED',
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS blotter_status_updates (
    id TEXT PRIMARY KEY NOT NULL,
    case_id TEXT NOT NULL REFERENCES blotter_cases(id) ON DELETE CASCADE,
    status TEXT NOT NULL,
    notes TEXT,
    updated_by TEXT,
    created_at TEXT NOT NULL
);
"#;

const FINANCE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS aips (
    id TEXT PRIMARY KEY NOT NULL,
    fiscal_year INTEGER NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT,
    total_budget REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'DRAFT',
    approved_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY NOT NULL,
    aip_id TEXT NOT NULL REFERENCES aips(id) ON DELETE CASCADE,
    project_code TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT,
    sector TEXT NOT NULL,
    location TEXT,
    implementing_office TEXT,
    start_date TEXT,
    end_date TEXT,
    total_cost REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'PLANNED',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY NOT NULL,
    reference_number TEXT NOT NULL UNIQUE,
    transaction_type TEXT NOT NULL,
    category TEXT NOT NULL,
    amount REAL NOT NULL,
    description TEXT NOT NULL,
    transaction_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING',
    payee TEXT,
    created_by TEXT,
    approved_by TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS expenses (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    description TEXT NOT NULL,
    amount REAL NOT NULL,
    category TEXT NOT NULL,
    expense_date TEXT NOT NULL,
    reference_number TEXT,
    transaction_id TEXT REFERENCES transactions(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS milestones (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    target_date TEXT NOT NULL,
    completed_date TEXT,
    progress INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'PENDING',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

const INDEXES_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_residents_household ON residents(household_id);
CREATE INDEX IF NOT EXISTS idx_residents_name ON residents(last_name, first_name);
CREATE INDEX IF NOT EXISTS idx_resident_sectors_sector ON resident_sectors(sector);
CREATE INDEX IF NOT EXISTS idx_certificates_resident ON certificates(resident_id);
CREATE INDEX IF NOT EXISTS idx_certificates_status ON certificates(status);
CREATE INDEX IF NOT EXISTS idx_templates_type ON certificate_templates(certificate_type);
CREATE INDEX IF NOT EXISTS idx_blotter_status ON blotter_cases(status);
CREATE INDEX IF NOT EXISTS idx_blotter_parties_case ON blotter_parties(case_id);
CREATE INDEX IF NOT EXISTS idx_blotter_hearings_case ON blotter_hearings(case_id);
CREATE INDEX IF NOT EXISTS idx_blotter_updates_case ON blotter_status_updates(case_id, created_at);
CREATE INDEX IF NOT EXISTS idx_projects_aip ON projects(aip_id);
CREATE INDEX IF NOT EXISTS idx_expenses_project ON expenses(project_id);
CREATE INDEX IF NOT EXISTS idx_milestones_project ON milestones(project_id);
CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);
"#;
