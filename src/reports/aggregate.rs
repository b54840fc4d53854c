//! Aggregate queries behind the reports
//!
//! Each function loads the handful of columns it needs and folds them in
//! memory. Callers pass `today` so month and age boundaries are testable.

use chrono::{Datelike, NaiveDate};
use diesel::prelude::*;

use super::{
    age_bracket, AipExpenseLine, AipMilestoneLine, AipProjectLine, AipReport, BlotterReport,
    CertificateReport, ChartPoint, ChartSeries, CurrentBudget, DashboardSummary, FinanceReport,
    PopulationReport, AGE_BRACKETS,
};
use crate::db::diesel_schema::{
    aips, blotter_cases, certificates, expenses, households, milestones, projects,
    resident_sectors, residents, transactions,
};
use crate::db::finance::projects::{list_projects, total_expenses};
use crate::db::finance::{aip::allocated_budget, budget_utilization};
use crate::db::models::{
    age_on, blotter_priorities, blotter_statuses, certificate_statuses, certificate_types,
    civil_statuses, genders, household_statuses, milestone_statuses, resident_statuses, sectors,
    transaction_statuses, transaction_types, Aip,
};
use crate::error::RegistryError;
use crate::views::AipView;

/// Ledger entries that count toward totals
const POSTED: [&str; 2] = [transaction_statuses::APPROVED, transaction_statuses::COMPLETED];

fn year_prefix(year: i32) -> String {
    format!("{:04}-%", year)
}

fn count_active_households(conn: &mut SqliteConnection) -> Result<i64, RegistryError> {
    households::table
        .filter(households::status.ne(household_statuses::ARCHIVED))
        .count()
        .get_result(conn)
        .map_err(Into::into)
}

// ============================================================================
// Population
// ============================================================================

pub fn population_report(
    conn: &mut SqliteConnection,
    today: NaiveDate,
) -> Result<PopulationReport, RegistryError> {
    let rows: Vec<(String, String, String, i32)> = residents::table
        .filter(residents::status.eq(resident_statuses::ACTIVE))
        .select((
            residents::gender,
            residents::birth_date,
            residents::civil_status,
            residents::is_voter,
        ))
        .load(conn)?;

    let tags: Vec<String> = resident_sectors::table
        .inner_join(residents::table)
        .filter(residents::status.eq(resident_statuses::ACTIVE))
        .select(resident_sectors::sector)
        .load(conn)?;

    let total_households = count_active_households(conn)?;

    let voters = rows.iter().filter(|r| r.3 != 0).count() as i64;
    let brackets: Vec<&str> = AGE_BRACKETS.iter().map(|(label, _, _)| *label).collect();

    Ok(PopulationReport {
        total_residents: rows.len() as i64,
        total_households,
        registered_voters: voters,
        by_gender: ChartSeries::tally("Gender", &genders::ALL, rows.iter().map(|r| r.0.as_str())),
        by_age_bracket: ChartSeries::tally(
            "Age",
            &brackets,
            rows.iter()
                .filter_map(|r| age_on(&r.1, today))
                .map(age_bracket),
        ),
        by_sector: ChartSeries::tally("Sector", &sectors::ALL, tags.iter().map(String::as_str)),
        by_civil_status: ChartSeries::tally(
            "Civil Status",
            &civil_statuses::ALL,
            rows.iter().map(|r| r.2.as_str()),
        ),
        voter_registration: ChartSeries::new(
            "Voters",
            vec![
                ChartPoint {
                    label: "Registered".into(),
                    value: voters as f64,
                },
                ChartPoint {
                    label: "Not registered".into(),
                    value: (rows.len() as i64 - voters) as f64,
                },
            ],
        ),
    })
}

// ============================================================================
// Certificates
// ============================================================================

/// Requests filed in `year`, plus releases per month of that year
pub fn certificate_report(
    conn: &mut SqliteConnection,
    year: i32,
) -> Result<CertificateReport, RegistryError> {
    let requested: Vec<(String, String)> = certificates::table
        .filter(certificates::created_at.like(year_prefix(year)))
        .select((certificates::certificate_type, certificates::status))
        .load(conn)?;

    let released: Vec<(Option<String>, Option<f64>)> = certificates::table
        .filter(certificates::status.eq(certificate_statuses::RELEASED))
        .filter(certificates::issued_date.like(year_prefix(year)))
        .select((certificates::issued_date, certificates::fee))
        .load(conn)?;

    Ok(CertificateReport {
        year,
        total_requests: requested.len() as i64,
        released: released.len() as i64,
        fees_collected: released.iter().filter_map(|r| r.1).sum(),
        by_type: ChartSeries::tally(
            "Type",
            &certificate_types::ALL,
            requested.iter().map(|r| r.0.as_str()),
        ),
        by_status: ChartSeries::tally(
            "Status",
            &certificate_statuses::ALL,
            requested.iter().map(|r| r.1.as_str()),
        ),
        issued_per_month: ChartSeries::monthly(
            "Released",
            year,
            released.iter().filter_map(|r| r.0.as_deref()),
        ),
    })
}

// ============================================================================
// Blotter
// ============================================================================

/// Cases whose incident happened in `year`
pub fn blotter_report(conn: &mut SqliteConnection, year: i32) -> Result<BlotterReport, RegistryError> {
    let cases: Vec<(String, String, String, String)> = blotter_cases::table
        .filter(blotter_cases::incident_date.like(year_prefix(year)))
        .select((
            blotter_cases::status,
            blotter_cases::priority,
            blotter_cases::incident_type,
            blotter_cases::incident_date,
        ))
        .load(conn)?;

    let active = cases
        .iter()
        .filter(|c| blotter_statuses::is_active(&c.0))
        .count() as i64;
    let resolved = cases
        .iter()
        .filter(|c| c.0 == blotter_statuses::RESOLVED)
        .count() as i64;

    Ok(BlotterReport {
        year,
        total_cases: cases.len() as i64,
        active_cases: active,
        resolved_cases: resolved,
        by_status: ChartSeries::tally("Status", &blotter_statuses::ALL, cases.iter().map(|c| c.0.as_str())),
        by_priority: ChartSeries::tally(
            "Priority",
            &blotter_priorities::ALL,
            cases.iter().map(|c| c.1.as_str()),
        ),
        by_incident_type: ChartSeries::ranked("Incident Type", cases.iter().map(|c| c.2.as_str())),
        cases_per_month: ChartSeries::monthly("Cases", year, cases.iter().map(|c| c.3.as_str())),
    })
}

// ============================================================================
// Finance
// ============================================================================

/// Which AIP a finance report covers
#[derive(Debug, Clone, Default)]
pub struct FinanceSelector {
    pub aip_id: Option<String>,
    pub fiscal_year: Option<i32>,
}

fn select_aip(
    conn: &mut SqliteConnection,
    selector: &FinanceSelector,
) -> Result<Option<Aip>, RegistryError> {
    if let Some(ref id) = selector.aip_id {
        let found: Option<Aip> = aips::table.find(id).first(conn).optional()?;
        return found
            .map(Some)
            .ok_or_else(|| RegistryError::NotFound(format!("AIP not found: {}", id)));
    }
    let mut q = aips::table.into_boxed();
    if let Some(year) = selector.fiscal_year {
        q = q.filter(aips::fiscal_year.eq(year));
    }
    q.order(aips::fiscal_year.desc())
        .first(conn)
        .optional()
        .map_err(Into::into)
}

fn posted_in_year(
    conn: &mut SqliteConnection,
    year: i32,
) -> Result<Vec<(String, String, f64)>, RegistryError> {
    transactions::table
        .filter(transactions::transaction_date.like(year_prefix(year)))
        .filter(transactions::status.eq_any(POSTED))
        .select((
            transactions::transaction_type,
            transactions::category,
            transactions::amount,
        ))
        .load(conn)
        .map_err(Into::into)
}

fn sum_by_category(label: &str, rows: &[(String, String, f64)], kind: &str) -> ChartSeries {
    let mut points: Vec<ChartPoint> = Vec::new();
    for (_, category, amount) in rows.iter().filter(|r| r.0 == kind) {
        match points.iter_mut().find(|p| &p.label == category) {
            Some(point) => point.value += amount,
            None => points.push(ChartPoint {
                label: category.clone(),
                value: *amount,
            }),
        }
    }
    points.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    ChartSeries::new(label, points)
}

/// Budget position of one AIP against the posted ledger of its fiscal year
pub fn finance_report(
    conn: &mut SqliteConnection,
    selector: &FinanceSelector,
    today: NaiveDate,
) -> Result<FinanceReport, RegistryError> {
    let aip = select_aip(conn, selector)?;
    let fiscal_year = aip
        .as_ref()
        .map(|a| a.fiscal_year)
        .or(selector.fiscal_year)
        .unwrap_or_else(|| today.year());

    let projects = match aip {
        Some(ref a) => list_projects(conn, &a.id)?,
        None => Vec::new(),
    };
    let allocated: f64 = projects.iter().map(|p| p.project.total_cost).sum();
    let spent: f64 = projects.iter().map(|p| p.budget.total_expenses).sum();

    let ledger = posted_in_year(conn, fiscal_year)?;
    let income_by_category = sum_by_category("Income", &ledger, transaction_types::INCOME);
    let expense_by_category = sum_by_category("Disbursements", &ledger, transaction_types::EXPENSE);

    Ok(FinanceReport {
        fiscal_year,
        aip_id: aip.as_ref().map(|a| a.id.clone()),
        total_budget: aip.as_ref().map_or(0.0, |a| a.total_budget),
        allocated_budget: allocated,
        total_expenses: spent,
        utilization: budget_utilization(spent, allocated),
        project_costs: ChartSeries::new(
            "Planned Cost",
            projects
                .iter()
                .map(|p| ChartPoint {
                    label: p.project.project_code.clone(),
                    value: p.project.total_cost,
                })
                .collect(),
        ),
        project_expenses: ChartSeries::new(
            "Actual Expenses",
            projects
                .iter()
                .map(|p| ChartPoint {
                    label: p.project.project_code.clone(),
                    value: p.budget.total_expenses,
                })
                .collect(),
        ),
        total_income: income_by_category.total(),
        total_expense_transactions: expense_by_category.total(),
        income_by_category,
        expense_by_category,
    })
}

/// Full AIP breakdown, or `None` when the AIP does not exist
pub fn aip_report(conn: &mut SqliteConnection, aip_id: &str) -> Result<Option<AipReport>, RegistryError> {
    let aip: Option<Aip> = aips::table.find(aip_id).first(conn).optional()?;
    let Some(aip) = aip else {
        return Ok(None);
    };

    let projects = list_projects(conn, aip_id)?;
    let allocated = allocated_budget(conn, aip_id)?;

    let expense_rows: Vec<(String, String, String, String, f64, Option<String>)> = expenses::table
        .inner_join(projects::table)
        .filter(projects::aip_id.eq(aip_id))
        .select((
            projects::project_code,
            expenses::expense_date,
            expenses::description,
            expenses::category,
            expenses::amount,
            expenses::reference_number,
        ))
        .order((projects::project_code.asc(), expenses::expense_date.asc()))
        .load(conn)?;

    let milestone_rows: Vec<(String, String, String, Option<String>, String, i32)> = milestones::table
        .inner_join(projects::table)
        .filter(projects::aip_id.eq(aip_id))
        .select((
            projects::project_code,
            milestones::title,
            milestones::target_date,
            milestones::completed_date,
            milestones::status,
            milestones::progress,
        ))
        .order((projects::project_code.asc(), milestones::target_date.asc()))
        .load(conn)?;

    let milestones: Vec<AipMilestoneLine> = milestone_rows
        .into_iter()
        .map(
            |(project_code, title, target_date, completed_date, status, progress)| AipMilestoneLine {
                project_code,
                title,
                target_date,
                completed_date,
                status,
                progress,
            },
        )
        .collect();

    let spent: f64 = projects.iter().map(|p| p.budget.total_expenses).sum();
    let lines = projects
        .iter()
        .map(|p| {
            let own = milestones
                .iter()
                .filter(|m| m.project_code == p.project.project_code);
            let (completed, total) = own.fold((0u32, 0u32), |(done, all), m| {
                let done = done + u32::from(m.status == milestone_statuses::COMPLETED);
                (done, all + 1)
            });
            AipProjectLine {
                project_code: p.project.project_code.clone(),
                title: p.project.title.clone(),
                sector: p.project.sector.clone(),
                status: p.project.status.clone(),
                total_cost: p.project.total_cost,
                total_expenses: p.budget.total_expenses,
                remaining: p.budget.remaining,
                utilization: p.budget.utilization,
                milestones_completed: completed,
                milestones_total: total,
            }
        })
        .collect();

    Ok(Some(AipReport {
        aip: AipView::from(aip),
        allocated_budget: allocated,
        total_expenses: spent,
        utilization: budget_utilization(spent, allocated),
        projects: lines,
        expenses: expense_rows
            .into_iter()
            .map(
                |(project_code, expense_date, description, category, amount, reference_number)| {
                    AipExpenseLine {
                        project_code,
                        expense_date,
                        description,
                        category,
                        amount,
                        reference_number,
                    }
                },
            )
            .collect(),
        milestones,
    }))
}

// ============================================================================
// Dashboard
// ============================================================================

pub fn dashboard_summary(
    conn: &mut SqliteConnection,
    today: NaiveDate,
) -> Result<DashboardSummary, RegistryError> {
    let year = today.year();
    let population: Vec<(String, i32)> = residents::table
        .filter(residents::status.eq(resident_statuses::ACTIVE))
        .select((residents::birth_date, residents::is_voter))
        .load(conn)?;
    let seniors = population
        .iter()
        .filter(|r| age_on(&r.0, today).is_some_and(|age| age >= 60))
        .count() as i64;

    let total_households = count_active_households(conn)?;

    let pending_certificates: i64 = certificates::table
        .filter(certificates::status.eq(certificate_statuses::PENDING))
        .count()
        .get_result(conn)?;
    let released_dates: Vec<Option<String>> = certificates::table
        .filter(certificates::status.eq(certificate_statuses::RELEASED))
        .filter(certificates::issued_date.like(year_prefix(year)))
        .select(certificates::issued_date)
        .load(conn)?;
    let this_month = today.format("%Y-%m-").to_string();
    let released_this_month = released_dates
        .iter()
        .flatten()
        .filter(|d| d.starts_with(&this_month))
        .count() as i64;

    let open_cases: Vec<String> = blotter_cases::table
        .filter(blotter_cases::status.ne(blotter_statuses::RESOLVED))
        .select(blotter_cases::priority)
        .load(conn)?;
    let incident_dates: Vec<String> = blotter_cases::table
        .filter(blotter_cases::incident_date.like(year_prefix(year)))
        .select(blotter_cases::incident_date)
        .load(conn)?;

    let this_year: Option<Aip> = aips::table
        .filter(aips::fiscal_year.eq(year))
        .first(conn)
        .optional()?;
    let current = match this_year {
        Some(aip) => Some(aip),
        None => aips::table
            .order(aips::fiscal_year.desc())
            .first::<Aip>(conn)
            .optional()?,
    };
    let current_budget = match current {
        Some(aip) => {
            let project_ids: Vec<String> = projects::table
                .filter(projects::aip_id.eq(&aip.id))
                .select(projects::id)
                .load(conn)?;
            let mut spent = 0.0;
            for id in &project_ids {
                spent += total_expenses(conn, id)?;
            }
            let allocated = allocated_budget(conn, &aip.id)?;
            Some(CurrentBudget {
                aip_id: aip.id,
                fiscal_year: aip.fiscal_year,
                total_budget: aip.total_budget,
                total_expenses: spent,
                utilization: budget_utilization(spent, allocated),
            })
        }
        None => None,
    };

    let ledger = posted_in_year(conn, year)?;
    let sum_of = |kind: &str| -> f64 {
        ledger
            .iter()
            .filter(|r| r.0 == kind)
            .map(|r| r.2)
            .sum()
    };

    Ok(DashboardSummary {
        total_residents: population.len() as i64,
        total_households,
        registered_voters: population.iter().filter(|r| r.1 != 0).count() as i64,
        senior_citizens: seniors,
        pending_certificates,
        released_this_month,
        active_cases: open_cases.len() as i64,
        urgent_cases: open_cases
            .iter()
            .filter(|p| p.as_str() == blotter_priorities::URGENT)
            .count() as i64,
        current_budget,
        income_this_year: sum_of(transaction_types::INCOME),
        expenses_this_year: sum_of(transaction_types::EXPENSE),
        certificates_per_month: ChartSeries::monthly(
            "Released",
            year,
            released_dates.iter().flatten().map(String::as_str),
        ),
        cases_per_month: ChartSeries::monthly("Cases", year, incident_dates.iter().map(String::as_str)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::blotter::{create_case, update_status as update_case_status, CreateCaseInput, StatusChangeInput};
    use crate::db::certificates::{create_certificate, update_status as update_cert_status, CreateCertificateInput};
    use crate::db::finance::aip::{create_aip, CreateAipInput};
    use crate::db::finance::expenses::{create_expense, CreateExpenseInput};
    use crate::db::finance::milestones::{create_milestone, CreateMilestoneInput};
    use crate::db::finance::projects::{create_project, CreateProjectInput};
    use crate::db::finance::transactions::{create_transaction, update_status as update_txn_status, CreateTransactionInput};
    use crate::db::residents::{create_resident, CreateResidentInput};
    use crate::db::test_conn as setup;

    fn on() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn resident(conn: &mut SqliteConnection, first: &str, birth: &str, gender: &str, voter: bool, tags: &[&str]) -> String {
        create_resident(
            conn,
            &CreateResidentInput {
                first_name: first.into(),
                last_name: "Dela Cruz".into(),
                birth_date: birth.into(),
                gender: gender.into(),
                civil_status: civil_statuses::SINGLE.into(),
                is_voter: voter,
                sectors: tags.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
        )
        .unwrap()
        .resident
        .id
    }

    #[test]
    fn test_population_brackets_and_sectors() {
        let mut conn = setup();
        resident(&mut conn, "Ana", "2010-01-01", genders::FEMALE, false, &[sectors::YOUTH]);
        resident(&mut conn, "Ben", "1990-06-15", genders::MALE, true, &[]);
        resident(&mut conn, "Cora", "1950-03-03", genders::FEMALE, true, &[sectors::SENIOR_CITIZEN, sectors::PWD]);

        let report = population_report(&mut conn, on()).unwrap();
        assert_eq!(report.total_residents, 3);
        assert_eq!(report.registered_voters, 2);

        let ages: Vec<f64> = report.by_age_bracket.points.iter().map(|p| p.value).collect();
        assert_eq!(ages, [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(report.by_gender.points[1].value, 2.0);
        assert_eq!(report.by_sector.total(), 3.0);
        assert_eq!(report.voter_registration.points[1].value, 1.0);
    }

    #[test]
    fn test_certificate_report_counts_releases() {
        let mut conn = setup();
        let rid = resident(&mut conn, "Ana", "1990-01-01", genders::FEMALE, true, &[]);
        let year = chrono::Utc::now().year();

        let cert = create_certificate(
            &mut conn,
            &CreateCertificateInput {
                certificate_type: certificate_types::CLEARANCE.into(),
                resident_id: rid.clone(),
                purpose: "Employment".into(),
                fee: Some(50.0),
                ..Default::default()
            },
            year,
        )
        .unwrap();
        create_certificate(
            &mut conn,
            &CreateCertificateInput {
                certificate_type: certificate_types::RESIDENCY.into(),
                resident_id: rid,
                purpose: "School".into(),
                ..Default::default()
            },
            year,
        )
        .unwrap();
        update_cert_status(&mut conn, &cert.id, certificate_statuses::APPROVED).unwrap();
        update_cert_status(&mut conn, &cert.id, certificate_statuses::RELEASED).unwrap();

        let report = certificate_report(&mut conn, year).unwrap();
        assert_eq!(report.total_requests, 2);
        assert_eq!(report.released, 1);
        assert_eq!(report.fees_collected, 50.0);
        assert_eq!(report.issued_per_month.total(), 1.0);
    }

    #[test]
    fn test_blotter_report_by_year() {
        let mut conn = setup();
        for (date, kind) in [("2024-02-01", "Theft"), ("2024-02-10", "Noise"), ("2023-12-30", "Noise")] {
            create_case(
                &mut conn,
                &CreateCaseInput {
                    incident_type: kind.into(),
                    incident_date: date.into(),
                    incident_location: "Purok 1".into(),
                    description: "Reported at the desk".into(),
                    ..Default::default()
                },
                2024,
                None,
            )
            .unwrap();
        }
        let report = blotter_report(&mut conn, 2024).unwrap();
        assert_eq!(report.total_cases, 2);
        assert_eq!(report.active_cases, 2);
        assert_eq!(report.cases_per_month.points[1].value, 2.0);
        assert_eq!(report.by_incident_type.points.len(), 2);
    }

    #[test]
    fn test_finance_and_aip_reports() {
        let mut conn = setup();
        let aip = create_aip(
            &mut conn,
            &CreateAipInput {
                fiscal_year: 2024,
                title: "AIP 2024".into(),
                total_budget: 500_000.0,
                ..Default::default()
            },
        )
        .unwrap();
        let project = create_project(
            &mut conn,
            &aip.id,
            &CreateProjectInput {
                title: "Drainage".into(),
                total_cost: 200_000.0,
                ..Default::default()
            },
        )
        .unwrap();
        create_expense(
            &mut conn,
            &project.id,
            &CreateExpenseInput {
                description: "Culverts".into(),
                amount: 50_000.0,
                expense_date: "2024-03-01".into(),
                ..Default::default()
            },
            false,
        )
        .unwrap();
        create_milestone(
            &mut conn,
            &project.id,
            &CreateMilestoneInput {
                title: "Excavation".into(),
                target_date: "2024-04-01".into(),
                status: Some(milestone_statuses::COMPLETED.into()),
                ..Default::default()
            },
        )
        .unwrap();

        let income = create_transaction(
            &mut conn,
            &CreateTransactionInput {
                transaction_type: transaction_types::INCOME.into(),
                category: "Clearance Fees".into(),
                amount: 1_000.0,
                description: "Fees".into(),
                transaction_date: "2024-03-05".into(),
                payee: None,
            },
            None,
        )
        .unwrap();
        update_txn_status(&mut conn, &income.id, transaction_statuses::APPROVED, None).unwrap();
        create_transaction(
            &mut conn,
            &CreateTransactionInput {
                transaction_type: transaction_types::INCOME.into(),
                category: "Clearance Fees".into(),
                amount: 9_999.0,
                description: "Still pending".into(),
                transaction_date: "2024-03-06".into(),
                payee: None,
            },
            None,
        )
        .unwrap();

        let finance = finance_report(&mut conn, &FinanceSelector::default(), on()).unwrap();
        assert_eq!(finance.fiscal_year, 2024);
        assert_eq!(finance.utilization, 25);
        assert_eq!(finance.total_income, 1_000.0);
        assert_eq!(finance.project_costs.points[0].value, 200_000.0);

        let report = aip_report(&mut conn, &aip.id).unwrap().unwrap();
        assert_eq!(report.projects[0].milestones_completed, 1);
        assert_eq!(report.expenses.len(), 1);
        assert_eq!(report.utilization, 25);
        assert!(aip_report(&mut conn, "missing").unwrap().is_none());

        let missing = FinanceSelector {
            aip_id: Some("missing".into()),
            ..Default::default()
        };
        assert!(matches!(
            finance_report(&mut conn, &missing, on()),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_dashboard_counts_open_cases() {
        let mut conn = setup();
        let case = create_case(
            &mut conn,
            &CreateCaseInput {
                incident_type: "Theft".into(),
                incident_date: "2024-06-01".into(),
                incident_location: "Market".into(),
                description: "Stolen bicycle".into(),
                priority: Some(blotter_priorities::URGENT.into()),
                ..Default::default()
            },
            2024,
            None,
        )
        .unwrap();
        resident(&mut conn, "Lola", "1940-01-01", genders::FEMALE, true, &[]);

        let summary = dashboard_summary(&mut conn, on()).unwrap();
        assert_eq!(summary.active_cases, 1);
        assert_eq!(summary.urgent_cases, 1);
        assert_eq!(summary.senior_citizens, 1);
        assert!(summary.current_budget.is_none());

        update_case_status(
            &mut conn,
            &case.case.id,
            &StatusChangeInput {
                status: blotter_statuses::RESOLVED.into(),
                ..Default::default()
            },
            None,
        )
        .unwrap();
        let summary = dashboard_summary(&mut conn, on()).unwrap();
        assert_eq!(summary.active_cases, 0);
        assert_eq!(summary.cases_per_month.points[5].value, 1.0);
    }
}
