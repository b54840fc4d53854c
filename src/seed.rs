//! Deterministic demo data
//!
//! `run` wipes every table and rebuilds a small barangay from a seeded
//! `StdRng`, so the same seed always yields the same names, dates and
//! amounts. Row ids are still fresh UUIDs.

use chrono::{Datelike, Duration, NaiveDate};
use diesel::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::auth::hash_password;
use crate::db::blotter::{
    self, CreateCaseInput, CreatePartyInput, ScheduleHearingInput, StatusChangeInput,
    UpdateHearingInput,
};
use crate::db::certificate_templates::{self, default_html, CreateTemplateInput};
use crate::db::certificates::{self, CreateCertificateInput};
use crate::db::diesel_schema::{
    aips, blotter_cases, blotter_hearings, blotter_parties, blotter_status_updates,
    certificate_templates as templates_table, certificates as certificates_table, expenses,
    household_statistics, households as households_table, milestones, officials as officials_table,
    projects, resident_sectors, residents as residents_table, transactions, users as users_table,
};
use crate::db::finance::aip::{create_aip, CreateAipInput};
use crate::db::finance::expenses::{create_expense, CreateExpenseInput};
use crate::db::finance::milestones::{create_milestone, CreateMilestoneInput};
use crate::db::finance::projects::{create_project, CreateProjectInput};
use crate::db::finance::transactions::{
    generate_reference, insert_transaction, update_status as update_transaction_status,
    CreateTransactionInput,
};
use crate::db::households::{self, CreateHouseholdInput};
use crate::db::models::{
    aip_statuses, blotter_priorities, blotter_statuses, certificate_statuses, certificate_types,
    civil_statuses, expense_categories, genders, hearing_statuses, household_types,
    milestone_statuses, party_types, project_sectors, project_statuses, sectors,
    transaction_statuses, transaction_types, user_roles, user_statuses, Resident,
};
use crate::db::officials::{self, CreateOfficialInput};
use crate::db::residents::{self, CreateResidentInput};
use crate::db::{users, Database};
use crate::error::RegistryError;
use crate::services::events::{EventBus, RegistryEvent};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_PASSWORD: &str = "barangay123";

const FIRST_NAMES_MALE: &[&str] = &[
    "Jose", "Juan", "Antonio", "Pedro", "Ramon", "Manuel", "Carlo", "Miguel", "Paolo", "Rafael",
    "Andres", "Emilio", "Jericho", "Mark", "Christian",
];
const FIRST_NAMES_FEMALE: &[&str] = &[
    "Maria", "Ana", "Rosa", "Luz", "Carmen", "Teresa", "Kristine", "Angelica", "Joy", "Liza",
    "Marites", "Rowena", "Jasmine", "Patricia", "Nicole",
];
const LAST_NAMES: &[&str] = &[
    "Dela Cruz", "Santos", "Reyes", "Garcia", "Mendoza", "Bautista", "Villanueva", "Ramos",
    "Aquino", "Castillo", "Navarro", "Domingo", "Flores", "Torres", "Mercado",
];
const STREETS: &[&str] = &[
    "Rizal Street", "Mabini Street", "Bonifacio Avenue", "Luna Street", "Del Pilar Street",
    "Quezon Boulevard", "Sampaguita Lane", "Narra Street",
];
const PUROKS: &[&str] = &["Purok 1", "Purok 2", "Purok 3", "Purok 4", "Purok 5"];
const OCCUPATIONS: &[&str] = &[
    "Farmer", "Teacher", "Driver", "Vendor", "Carpenter", "Nurse", "Fisherman", "Clerk",
];
const OPTIONAL_SECTORS: &[&str] = &[
    sectors::PWD,
    sectors::SOLO_PARENT,
    sectors::FOUR_PS,
    sectors::OFW,
    sectors::INDIGENOUS,
    sectors::FARMER,
    sectors::FISHERFOLK,
    sectors::UNEMPLOYED,
];
const PURPOSES: &[&str] = &[
    "Employment requirement",
    "School enrollment",
    "Bank account opening",
    "Medical assistance",
    "Scholarship application",
    "Business registration",
];
const INCIDENTS: &[&str] = &[
    "Noise complaint",
    "Boundary dispute",
    "Unpaid debt",
    "Theft",
    "Physical altercation",
    "Stray animals",
];
const INCOME_CATEGORIES: &[&str] = &[
    "Real Property Tax Share",
    "Clearance Fees",
    "Business Permit Fees",
    "National Tax Allotment",
];

/// Knobs for a seeding run
#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub seed: u64,
    pub households: usize,
    pub certificates: usize,
    pub cases: usize,
    /// Password for every seeded account
    pub password: String,
    pub today: NaiveDate,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            households: 24,
            certificates: 30,
            cases: 12,
            password: DEFAULT_PASSWORD.to_string(),
            today: chrono::Utc::now().date_naive(),
        }
    }
}

/// What a seeding run created
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub seed: u64,
    pub users: usize,
    pub officials: usize,
    pub households: usize,
    pub residents: usize,
    pub certificates: usize,
    pub templates: usize,
    pub blotter_cases: usize,
    pub projects: usize,
    pub expenses: usize,
    pub transactions: usize,
}

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

fn date_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Delete every row, children before parents
pub fn reset(conn: &mut SqliteConnection) -> Result<(), RegistryError> {
    diesel::delete(blotter_status_updates::table).execute(conn)?;
    diesel::delete(blotter_hearings::table).execute(conn)?;
    diesel::delete(blotter_parties::table).execute(conn)?;
    diesel::delete(blotter_cases::table).execute(conn)?;
    diesel::delete(certificates_table::table).execute(conn)?;
    diesel::delete(templates_table::table).execute(conn)?;
    diesel::delete(expenses::table).execute(conn)?;
    diesel::delete(milestones::table).execute(conn)?;
    diesel::delete(transactions::table).execute(conn)?;
    diesel::delete(projects::table).execute(conn)?;
    diesel::delete(aips::table).execute(conn)?;
    diesel::delete(resident_sectors::table).execute(conn)?;
    diesel::delete(household_statistics::table).execute(conn)?;
    diesel::delete(residents_table::table).execute(conn)?;
    diesel::delete(households_table::table).execute(conn)?;
    diesel::delete(officials_table::table).execute(conn)?;
    diesel::delete(users_table::table).execute(conn)?;
    Ok(())
}

/// Wipe and repopulate the database in a single transaction
pub fn run(db: &Database, events: &EventBus, options: &SeedOptions) -> Result<SeedSummary, RegistryError> {
    let password_hash = hash_password(&options.password)?;
    let summary = db.transaction(|conn| {
        reset(conn)?;
        let mut seeder = Seeder {
            rng: StdRng::seed_from_u64(options.seed),
            options,
            summary: SeedSummary {
                seed: options.seed,
                ..Default::default()
            },
        };
        seeder.populate(conn, &password_hash)?;
        Ok(seeder.summary)
    })?;

    info!(
        seed = summary.seed,
        households = summary.households,
        residents = summary.residents,
        cases = summary.blotter_cases,
        "Database seeded"
    );
    events.emit(RegistryEvent::DatabaseSeeded { seed: summary.seed });
    Ok(summary)
}

struct Seeder<'a> {
    rng: StdRng,
    options: &'a SeedOptions,
    summary: SeedSummary,
}

struct Staff {
    captain_official: String,
    treasurer_user: String,
    secretary_user: String,
}

impl Seeder<'_> {
    fn populate(&mut self, conn: &mut SqliteConnection, password_hash: &str) -> Result<(), RegistryError> {
        let staff = self.users_and_officials(conn, password_hash)?;
        let pool = self.households_and_residents(conn)?;
        self.templates(conn)?;
        self.certificates(conn, &pool, &staff)?;
        self.blotter(conn, &pool, &staff)?;
        self.finance(conn, &staff)?;
        Ok(())
    }

    fn users_and_officials(
        &mut self,
        conn: &mut SqliteConnection,
        password_hash: &str,
    ) -> Result<Staff, RegistryError> {
        let accounts = [
            ("System Administrator", "admin@barangay.local", user_roles::SUPER_ADMIN),
            ("Ramon Villanueva", "captain@barangay.local", user_roles::CAPTAIN),
            ("Teresa Santos", "secretary@barangay.local", user_roles::SECRETARY),
            ("Andres Bautista", "treasurer@barangay.local", user_roles::TREASURER),
            ("Joy Ramos", "staff@barangay.local", user_roles::STAFF),
        ];
        let mut ids = Vec::with_capacity(accounts.len());
        for (name, email, role) in accounts {
            let user = users::create_user(conn, name, email, password_hash, role, user_statuses::ACTIVE)?;
            ids.push(user.id);
        }
        self.summary.users = ids.len();

        let term_start = format!("{}-07-01", self.options.today.year() - 1);
        let term_end = format!("{}-06-30", self.options.today.year() + 2);
        let positions = [
            ("Ramon Villanueva", "Punong Barangay"),
            ("Teresa Santos", "Barangay Secretary"),
            ("Andres Bautista", "Barangay Treasurer"),
            ("Emilio Aquino", "Barangay Kagawad"),
            ("Rowena Castillo", "Barangay Kagawad"),
            ("Paolo Mercado", "SK Chairperson"),
        ];
        let mut captain_official = String::new();
        for (name, position) in positions {
            let official = officials::create_official(
                conn,
                &CreateOfficialInput {
                    name: name.into(),
                    position: position.into(),
                    term_start: Some(term_start.clone()),
                    term_end: Some(term_end.clone()),
                    is_active: true,
                },
            )?;
            if captain_official.is_empty() {
                captain_official = official.id;
            }
        }
        self.summary.officials = positions.len();

        Ok(Staff {
            captain_official,
            secretary_user: ids[2].clone(),
            treasurer_user: ids[3].clone(),
        })
    }

    fn birth_date(&mut self, years: std::ops::RangeInclusive<i32>) -> String {
        let year = self.rng.gen_range(years);
        let month = self.rng.gen_range(1..=12);
        let day = self.rng.gen_range(1..=28);
        format!("{:04}-{:02}-{:02}", year, month, day)
    }

    fn resident_input(&mut self, household_id: &str, head: bool, last_name: &str) -> CreateResidentInput {
        let born = if head {
            self.birth_date(1940..=1995)
        } else {
            self.birth_date(1940..=2020)
        };
        let age = crate::db::models::age_on(&born, self.options.today).unwrap_or(0);

        let gender = if self.rng.gen_bool(0.5) { genders::MALE } else { genders::FEMALE };
        let first_name = if gender == genders::MALE {
            pick(&mut self.rng, FIRST_NAMES_MALE)
        } else {
            pick(&mut self.rng, FIRST_NAMES_FEMALE)
        };
        let civil_status = if age < 18 {
            civil_statuses::SINGLE
        } else {
            pick(&mut self.rng, &[civil_statuses::SINGLE, civil_statuses::MARRIED, civil_statuses::MARRIED, civil_statuses::WIDOWED])
        };

        let mut tags = Vec::new();
        if age >= 60 {
            tags.push(sectors::SENIOR_CITIZEN.to_string());
        }
        if (15..=30).contains(&age) {
            tags.push(sectors::YOUTH.to_string());
        }
        if age >= 18 && self.rng.gen_bool(0.2) {
            tags.push(pick(&mut self.rng, OPTIONAL_SECTORS).to_string());
        }

        let contact = (age >= 18).then(|| format!("09{:09}", self.rng.gen_range(100_000_000..1_000_000_000u64)));
        CreateResidentInput {
            first_name: first_name.into(),
            middle_name: Some(pick(&mut self.rng, LAST_NAMES).into()),
            last_name: last_name.into(),
            birth_date: born,
            gender: gender.into(),
            civil_status: civil_status.into(),
            contact_number: contact,
            occupation: (age >= 18).then(|| pick(&mut self.rng, OCCUPATIONS).to_string()),
            household_id: Some(household_id.to_string()),
            is_household_head: head,
            is_voter: age >= 18 && self.rng.gen_bool(0.8),
            sectors: tags,
            ..Default::default()
        }
    }

    fn households_and_residents(&mut self, conn: &mut SqliteConnection) -> Result<Vec<Resident>, RegistryError> {
        let mut pool = Vec::new();
        for n in 0..self.options.households {
            let household = households::create_household(
                conn,
                &CreateHouseholdInput {
                    house_no: Some(format!("{}", 10 + n * 3)),
                    street: pick(&mut self.rng, STREETS).into(),
                    purok: Some(pick(&mut self.rng, PUROKS).into()),
                    household_type: Some(
                        pick(
                            &mut self.rng,
                            &[household_types::SINGLE_FAMILY, household_types::SINGLE_FAMILY, household_types::EXTENDED_FAMILY, household_types::MULTI_FAMILY],
                        )
                        .into(),
                    ),
                    monthly_income: Some(f64::from(self.rng.gen_range(8..=60i32) * 1000)),
                    ..Default::default()
                },
            )?;
            self.summary.households += 1;

            let family = pick(&mut self.rng, LAST_NAMES);
            let members = self.rng.gen_range(1..=6);
            for m in 0..members {
                let input = self.resident_input(&household.id, m == 0, family);
                let created = residents::create_resident(conn, &input)?;
                pool.push(created.resident);
                self.summary.residents += 1;
            }
        }
        Ok(pool)
    }

    fn templates(&mut self, conn: &mut SqliteConnection) -> Result<(), RegistryError> {
        for certificate_type in certificate_types::ALL {
            certificate_templates::create_template(
                conn,
                &CreateTemplateInput {
                    certificate_type: certificate_type.into(),
                    name: format!("Standard {}", certificate_types::title(certificate_type)),
                    html_content: default_html(certificate_type),
                    css_content: None,
                    is_active: true,
                },
            )?;
            self.summary.templates += 1;
        }
        Ok(())
    }

    fn certificates(
        &mut self,
        conn: &mut SqliteConnection,
        pool: &[Resident],
        staff: &Staff,
    ) -> Result<(), RegistryError> {
        if pool.is_empty() {
            return Ok(());
        }
        let year = self.options.today.year();
        let targets = [
            certificate_statuses::PENDING,
            certificate_statuses::APPROVED,
            certificate_statuses::RELEASED,
            certificate_statuses::REJECTED,
            certificate_statuses::CANCELLED,
        ];

        for i in 0..self.options.certificates {
            let resident = &pool[self.rng.gen_range(0..pool.len())];
            let certificate_type = certificate_types::ALL[i % certificate_types::ALL.len()];
            let business_name = (certificate_type == certificate_types::BUSINESS_PERMIT)
                .then(|| format!("{} Sari-Sari Store", resident.last_name));
            let fee = match certificate_type {
                certificate_types::INDIGENCY | certificate_types::CFA => None,
                certificate_types::BUSINESS_PERMIT => Some(500.0),
                _ => Some(f64::from(self.rng.gen_range(5..=20i32) * 10)),
            };
            let certificate = certificates::create_certificate(
                conn,
                &CreateCertificateInput {
                    certificate_type: certificate_type.into(),
                    resident_id: resident.id.clone(),
                    purpose: pick(&mut self.rng, PURPOSES).into(),
                    official_id: Some(staff.captain_official.clone()),
                    or_number: fee.map(|_| format!("OR-{:06}", self.rng.gen_range(0..1_000_000))),
                    fee,
                    business_name,
                    remarks: None,
                },
                year,
            )?;

            // The first few requests cover every status, the rest are drawn
            let target = if i < targets.len() {
                targets[i]
            } else {
                targets[self.rng.gen_range(0..targets.len())]
            };
            let path: &[&str] = match target {
                certificate_statuses::APPROVED => &[certificate_statuses::APPROVED],
                certificate_statuses::RELEASED => {
                    &[certificate_statuses::APPROVED, certificate_statuses::RELEASED]
                }
                certificate_statuses::REJECTED => &[certificate_statuses::REJECTED],
                certificate_statuses::CANCELLED => &[certificate_statuses::CANCELLED],
                _ => &[],
            };
            for status in path {
                certificates::update_status(conn, &certificate.id, status)?;
            }
            self.summary.certificates += 1;
        }
        Ok(())
    }

    fn blotter(
        &mut self,
        conn: &mut SqliteConnection,
        pool: &[Resident],
        staff: &Staff,
    ) -> Result<(), RegistryError> {
        let year = self.options.today.year();
        let targets = [
            blotter_statuses::PENDING,
            blotter_statuses::ONGOING,
            blotter_statuses::ESCALATED,
            blotter_statuses::RESOLVED,
        ];

        for i in 0..self.options.cases {
            let incident = self.options.today - Duration::days(self.rng.gen_range(1..150));
            let involved: Vec<&Resident> = pool.choose_multiple(&mut self.rng, 3).collect();
            let parties = [party_types::COMPLAINANT, party_types::RESPONDENT, party_types::WITNESS]
                .iter()
                .zip(&involved)
                .map(|(party_type, resident)| CreatePartyInput {
                    party_type: party_type.to_string(),
                    resident_id: Some(resident.id.clone()),
                    name: resident.full_name(),
                    contact_number: resident.contact_number.clone(),
                    address: None,
                    statement: (*party_type == party_types::COMPLAINANT)
                        .then(|| "Filed a complaint at the barangay hall.".to_string()),
                })
                .collect();

            let detail = blotter::create_case(
                conn,
                &CreateCaseInput {
                    incident_type: pick(&mut self.rng, INCIDENTS).into(),
                    incident_date: format!("{}T{:02}:{:02}", date_string(incident), self.rng.gen_range(6..22), self.rng.gen_range(0..60)),
                    incident_location: format!("{}, {}", pick(&mut self.rng, STREETS), pick(&mut self.rng, PUROKS)),
                    description: "Incident reported to the barangay desk officer.".into(),
                    priority: Some(pick(&mut self.rng, &blotter_priorities::ALL).into()),
                    reported_by: involved.first().map(|r| r.full_name()),
                    parties,
                },
                year,
                Some(staff.secretary_user.as_str()),
            )?;
            let case_id = detail.case.id;

            let target = targets[i % targets.len()];
            let path: &[&str] = match target {
                blotter_statuses::ONGOING => &[blotter_statuses::ONGOING],
                blotter_statuses::ESCALATED => &[blotter_statuses::ONGOING, blotter_statuses::ESCALATED],
                blotter_statuses::RESOLVED => &[blotter_statuses::ONGOING, blotter_statuses::RESOLVED],
                _ => &[],
            };

            if !path.is_empty() {
                let hearing = blotter::schedule_hearing(
                    conn,
                    &case_id,
                    &ScheduleHearingInput {
                        scheduled_at: format!("{}T09:00", date_string(incident + Duration::days(7))),
                        location: "Barangay Hall Session Room".into(),
                        notes: None,
                    },
                )?;
                if target == blotter_statuses::RESOLVED {
                    blotter::update_hearing(
                        conn,
                        &case_id,
                        &hearing.id,
                        &UpdateHearingInput {
                            status: Some(hearing_statuses::COMPLETED.into()),
                            ..Default::default()
                        },
                    )?;
                }
            }
            for status in path {
                let resolved = *status == blotter_statuses::RESOLVED;
                blotter::update_status(
                    conn,
                    &case_id,
                    &StatusChangeInput {
                        status: status.to_string(),
                        notes: Some(format!("Moved to {}", status)),
                        resolution: resolved.then(|| "Parties reached an amicable settlement.".to_string()),
                    },
                    Some(staff.secretary_user.as_str()),
                )?;
            }
            self.summary.blotter_cases += 1;
        }
        Ok(())
    }

    fn ledger_entry(
        &mut self,
        conn: &mut SqliteConnection,
        input: &CreateTransactionInput,
        path: &[&str],
        staff: &Staff,
    ) -> Result<String, RegistryError> {
        let reference = generate_reference(&input.transaction_date, &mut self.rng);
        let entry = insert_transaction(
            conn,
            input,
            &reference,
            transaction_statuses::PENDING,
            Some(staff.treasurer_user.as_str()),
        )?;
        for status in path {
            update_transaction_status(conn, &entry.id, status, Some(staff.treasurer_user.as_str()))?;
        }
        self.summary.transactions += 1;
        Ok(entry.id)
    }

    fn finance(&mut self, conn: &mut SqliteConnection, staff: &Staff) -> Result<(), RegistryError> {
        let today = self.options.today;
        let fiscal_year = today.year();
        let aip = create_aip(
            conn,
            &CreateAipInput {
                fiscal_year,
                title: format!("Annual Investment Program {}", fiscal_year),
                description: Some("Priority programs approved by the barangay council.".into()),
                total_budget: 5_000_000.0,
                status: Some(aip_statuses::APPROVED.into()),
            },
        )?;

        let plans = [
            ("Farm-to-Market Road Concreting", project_sectors::INFRASTRUCTURE, 1_800_000.0),
            ("Barangay Health Station Upgrade", project_sectors::SOCIAL_SERVICES, 900_000.0),
            ("Livelihood Training Program", project_sectors::ECONOMIC_SERVICES, 350_000.0),
            ("Drainage Declogging", project_sectors::ENVIRONMENT, 420_000.0),
            ("Barangay Hall Records Digitization", project_sectors::GENERAL_SERVICES, 280_000.0),
        ];
        let year_start = NaiveDate::from_ymd_opt(fiscal_year, 1, 15).unwrap_or(today);

        for (n, (title, sector, cost)) in plans.into_iter().enumerate() {
            let status = match n % 3 {
                0 => project_statuses::ONGOING,
                1 => project_statuses::COMPLETED,
                _ => project_statuses::PLANNED,
            };
            let project = create_project(
                conn,
                &aip.id,
                &CreateProjectInput {
                    title: title.into(),
                    sector: Some(sector.into()),
                    location: Some(pick(&mut self.rng, PUROKS).into()),
                    implementing_office: Some("Office of the Punong Barangay".into()),
                    start_date: Some(date_string(year_start)),
                    end_date: Some(format!("{}-12-15", fiscal_year)),
                    total_cost: cost,
                    status: Some(status.into()),
                    ..Default::default()
                },
            )?;
            self.summary.projects += 1;

            for (step, label) in ["Procurement", "Mobilization", "Turnover"].into_iter().enumerate() {
                let milestone_status = match (status, step) {
                    (project_statuses::COMPLETED, _) => milestone_statuses::COMPLETED,
                    (project_statuses::ONGOING, 0) => milestone_statuses::COMPLETED,
                    (project_statuses::ONGOING, 1) => milestone_statuses::IN_PROGRESS,
                    _ => milestone_statuses::PENDING,
                };
                let progress = match milestone_status {
                    milestone_statuses::IN_PROGRESS => self.rng.gen_range(20..=80),
                    _ => 0,
                };
                create_milestone(
                    conn,
                    &project.id,
                    &CreateMilestoneInput {
                        title: label.into(),
                        description: None,
                        target_date: date_string(year_start + Duration::days(90 * (step as i64 + 1))),
                        progress: Some(progress),
                        status: Some(milestone_status.into()),
                    },
                )?;
            }

            if status == project_statuses::PLANNED {
                continue;
            }
            let count = self.rng.gen_range(1..=4);
            for _ in 0..count {
                let share: i32 = self.rng.gen_range(5..=20);
                let amount = (cost * f64::from(share) / 100.0).round();
                let spent_on = year_start + Duration::days(self.rng.gen_range(0..120));
                let category = pick(&mut self.rng, &expense_categories::ALL);
                let transaction_id = self.ledger_entry(
                    conn,
                    &CreateTransactionInput {
                        transaction_type: transaction_types::EXPENSE.into(),
                        category: "Development Fund".into(),
                        amount,
                        description: format!("{} - {}", title, category.to_lowercase()),
                        transaction_date: date_string(spent_on),
                        payee: Some("Local supplier".into()),
                    },
                    &[transaction_statuses::APPROVED, transaction_statuses::COMPLETED],
                    staff,
                )?;
                create_expense(
                    conn,
                    &project.id,
                    &CreateExpenseInput {
                        description: format!("{} for {}", category.to_lowercase(), title),
                        amount,
                        category: Some(category.into()),
                        expense_date: date_string(spent_on),
                        reference_number: None,
                        transaction_id: Some(transaction_id),
                    },
                    false,
                )?;
                self.summary.expenses += 1;
            }
        }

        for (n, category) in INCOME_CATEGORIES.iter().enumerate() {
            let received = year_start + Duration::days(30 * n as i64);
            let path: &[&str] = if n + 1 == INCOME_CATEGORIES.len() {
                &[]
            } else {
                &[transaction_statuses::APPROVED, transaction_statuses::COMPLETED]
            };
            let amount = f64::from(self.rng.gen_range(20..=400i32) * 1000);
            self.ledger_entry(
                conn,
                &CreateTransactionInput {
                    transaction_type: transaction_types::INCOME.into(),
                    category: category.to_string(),
                    amount,
                    description: format!("{} collection", category),
                    transaction_date: date_string(received),
                    payee: None,
                },
                path,
                staff,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::blotter::{list_cases, list_status_updates, CaseQuery};
    use crate::db::certificates::{list_certificates, CertificateQuery};

    fn options() -> SeedOptions {
        SeedOptions {
            households: 6,
            certificates: 10,
            cases: 8,
            today: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_trails_and_issued_dates_hold() {
        let db = Database::open_in_memory().unwrap();
        let summary = run(&db, &EventBus::new(), &options()).unwrap();
        assert_eq!(summary.blotter_cases, 8);
        assert_eq!(summary.templates, certificate_types::ALL.len());

        db.with_conn(|conn| {
            for case in list_cases(conn, &CaseQuery::default())? {
                let trail = list_status_updates(conn, &case.id)?;
                assert_eq!(trail.first().unwrap().status, blotter_statuses::PENDING);
                assert_eq!(trail.last().unwrap().status, case.status);
            }
            let all = list_certificates(conn, &CertificateQuery::default())?;
            for status in certificate_statuses::ALL {
                assert!(all.iter().any(|c| c.certificate.status == status), "missing {}", status);
            }
            for c in &all {
                let released = c.certificate.status == certificate_statuses::RELEASED;
                assert_eq!(c.certificate.issued_date.is_some(), released);
            }
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_same_seed_same_people() {
        let names = |seed: u64| {
            let db = Database::open_in_memory().unwrap();
            let opts = SeedOptions { seed, ..options() };
            run(&db, &EventBus::new(), &opts).unwrap();
            db.with_conn(|conn| {
                let mut names: Vec<(String, String)> = residents_table::table
                    .select((residents_table::last_name, residents_table::birth_date))
                    .load(conn)?;
                names.sort();
                Ok(names)
            })
            .unwrap()
        };
        assert_eq!(names(7), names(7));
        assert_ne!(names(7), names(8));
    }

    #[test]
    fn test_rerun_replaces_previous_data() {
        let db = Database::open_in_memory().unwrap();
        let events = EventBus::new();
        let first = run(&db, &events, &options()).unwrap();
        let second = run(&db, &events, &options()).unwrap();
        assert_eq!(first.residents, second.residents);

        let stored: i64 = db
            .with_conn(|conn| residents_table::table.count().get_result(conn).map_err(Into::into))
            .unwrap();
        assert_eq!(stored as usize, second.residents);
    }

    #[test]
    fn test_income_ledger_posts_all_but_latest() {
        let db = Database::open_in_memory().unwrap();
        run(&db, &EventBus::new(), &options()).unwrap();

        let income: Vec<(String, f64)> = db
            .with_conn(|conn| {
                transactions::table
                    .filter(transactions::transaction_type.eq(transaction_types::INCOME))
                    .order(transactions::transaction_date.asc())
                    .select((transactions::status, transactions::amount))
                    .load(conn)
                    .map_err(Into::into)
            })
            .unwrap();
        assert_eq!(income.len(), INCOME_CATEGORIES.len());
        let (latest, posted) = income.split_last().unwrap();
        assert_eq!(latest.0, transaction_statuses::PENDING);
        assert!(posted.iter().all(|(status, _)| status == transaction_statuses::COMPLETED));
        assert!(income
            .iter()
            .all(|(_, amount)| (20_000.0..=400_000.0).contains(amount)));
    }
}
