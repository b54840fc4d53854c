//! AIP budgets, projects, expenses, milestones and the transaction ledger

use std::sync::Arc;

use crate::config::Config;
use crate::db::finance::aip::{self, CreateAipInput, UpdateAipInput};
use crate::db::finance::expenses::{self, CreateExpenseInput, ExpenseOutcome};
use crate::db::finance::milestones::{self, CreateMilestoneInput, UpdateMilestoneInput};
use crate::db::finance::projects::{self, CreateProjectInput, ProjectWithBudget, UpdateProjectInput};
use crate::db::finance::transactions::{
    self, CreateTransactionInput, TransactionQuery, UpdateTransactionInput,
};
use crate::db::models::{
    aip_statuses, expense_categories, milestone_statuses, project_sectors, project_statuses,
    transaction_statuses, transaction_types, Aip, Expense, Milestone, Transaction,
};
use crate::db::Database;
use crate::error::RegistryError;
use crate::views::{AipDetailView, AipView};

use super::events::{EventBus, RegistryEvent};
use super::validation::{self, optional};

const MIN_FISCAL_YEAR: i32 = 2000;
const MAX_FISCAL_YEAR: i32 = 2100;

pub struct FinanceService {
    db: Arc<Database>,
    events: Arc<EventBus>,
    config: Arc<Config>,
}

impl FinanceService {
    pub fn new(db: Arc<Database>, events: Arc<EventBus>, config: Arc<Config>) -> Self {
        Self { db, events, config }
    }

    // =========================================================================
    // AIP
    // =========================================================================

    pub fn create_aip(&self, input: &CreateAipInput) -> Result<Aip, RegistryError> {
        validation::in_range("fiscalYear", input.fiscal_year, MIN_FISCAL_YEAR, MAX_FISCAL_YEAR)?;
        validation::required("title", &input.title)?;
        validation::non_negative("totalBudget", input.total_budget)?;
        optional(input.status.as_deref(), |s| validation::one_of("status", s, &aip_statuses::ALL))?;

        let created = self.db.with_conn(|conn| aip::create_aip(conn, input))?;
        self.events.emit(RegistryEvent::AipSaved {
            id: created.id.clone(),
            fiscal_year: created.fiscal_year,
        });
        Ok(created)
    }

    pub fn get_aip(&self, id: &str) -> Result<Option<Aip>, RegistryError> {
        self.db.with_conn(|conn| aip::get_aip(conn, id))
    }

    /// AIP with its projects and how much of the budget they claim
    pub fn aip_detail(&self, id: &str) -> Result<Option<AipDetailView>, RegistryError> {
        self.db.with_conn(|conn| {
            let Some(found) = aip::get_aip(conn, id)? else {
                return Ok(None);
            };
            let allocated = aip::allocated_budget(conn, id)?;
            let projects = projects::list_projects(conn, id)?;
            Ok(Some(AipDetailView {
                unallocated_budget: found.total_budget - allocated,
                allocated_budget: allocated,
                aip: AipView::from(found),
                projects: projects.into_iter().map(Into::into).collect(),
            }))
        })
    }

    pub fn list_aips(&self) -> Result<Vec<Aip>, RegistryError> {
        self.db.with_conn(aip::list_aips)
    }

    pub fn update_aip(&self, id: &str, input: &UpdateAipInput) -> Result<Option<Aip>, RegistryError> {
        optional(input.title.as_deref(), |v| validation::required("title", v))?;
        optional(input.total_budget.as_ref(), |v| validation::non_negative("totalBudget", *v))?;
        optional(input.status.as_deref(), |s| validation::one_of("status", s, &aip_statuses::ALL))?;

        let updated = self.db.with_conn(|conn| aip::update_aip(conn, id, input))?;
        if let Some(ref a) = updated {
            self.events.emit(RegistryEvent::AipSaved {
                id: a.id.clone(),
                fiscal_year: a.fiscal_year,
            });
        }
        Ok(updated)
    }

    pub fn delete_aip(&self, id: &str) -> Result<bool, RegistryError> {
        let deleted = self.db.with_conn(|conn| aip::delete_aip(conn, id))?;
        if deleted {
            self.events.emit(RegistryEvent::AipDeleted { id: id.to_string() });
        }
        Ok(deleted)
    }

    // =========================================================================
    // Projects
    // =========================================================================

    pub fn create_project(
        &self,
        aip_id: &str,
        input: &CreateProjectInput,
    ) -> Result<ProjectWithBudget, RegistryError> {
        validation::required("title", &input.title)?;
        validation::non_negative("totalCost", input.total_cost)?;
        optional(input.sector.as_deref(), |s| {
            validation::one_of("sector", s, &project_sectors::ALL)
        })?;
        optional(input.status.as_deref(), |s| {
            validation::one_of("status", s, &project_statuses::ALL)
        })?;
        validate_schedule(input.start_date.as_deref(), input.end_date.as_deref())?;

        let created = self.db.with_conn(|conn| {
            let project = projects::create_project(conn, aip_id, input)?;
            projects::get_project_with_budget(conn, &project.id)?
                .ok_or_else(|| RegistryError::Internal("Project vanished after insert".into()))
        })?;
        self.events.emit(RegistryEvent::ProjectSaved {
            id: created.project.id.clone(),
            project_code: created.project.project_code.clone(),
        });
        Ok(created)
    }

    pub fn get_project(&self, id: &str) -> Result<Option<ProjectWithBudget>, RegistryError> {
        self.db.with_conn(|conn| projects::get_project_with_budget(conn, id))
    }

    /// Projects under an AIP, or `None` when the AIP does not exist
    pub fn list_projects(&self, aip_id: &str) -> Result<Option<Vec<ProjectWithBudget>>, RegistryError> {
        self.db.with_conn(|conn| {
            if aip::get_aip(conn, aip_id)?.is_none() {
                return Ok(None);
            }
            projects::list_projects(conn, aip_id).map(Some)
        })
    }

    pub fn update_project(
        &self,
        id: &str,
        input: &UpdateProjectInput,
    ) -> Result<Option<ProjectWithBudget>, RegistryError> {
        optional(input.title.as_deref(), |v| validation::required("title", v))?;
        optional(input.total_cost.as_ref(), |v| validation::non_negative("totalCost", *v))?;
        optional(input.sector.as_deref(), |s| {
            validation::one_of("sector", s, &project_sectors::ALL)
        })?;
        optional(input.status.as_deref(), |s| {
            validation::one_of("status", s, &project_statuses::ALL)
        })?;

        let updated = self.db.with_conn(|conn| {
            let Some(current) = projects::get_project(conn, id)? else {
                return Ok(None);
            };
            let start = match input.start_date {
                Some(ref v) => v.clone(),
                None => current.start_date.clone(),
            };
            let end = match input.end_date {
                Some(ref v) => v.clone(),
                None => current.end_date.clone(),
            };
            validate_schedule(start.as_deref(), end.as_deref())?;

            if projects::update_project(conn, id, input)?.is_none() {
                return Ok(None);
            }
            projects::get_project_with_budget(conn, id)
        })?;

        if let Some(ref p) = updated {
            self.events.emit(RegistryEvent::ProjectSaved {
                id: p.project.id.clone(),
                project_code: p.project.project_code.clone(),
            });
        }
        Ok(updated)
    }

    pub fn delete_project(&self, id: &str) -> Result<bool, RegistryError> {
        let deleted = self.db.with_conn(|conn| projects::delete_project(conn, id))?;
        if deleted {
            self.events.emit(RegistryEvent::ProjectDeleted { id: id.to_string() });
        }
        Ok(deleted)
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// Record an expense; overruns are refused only under `strict_budget`
    pub fn record_expense(
        &self,
        project_id: &str,
        input: &CreateExpenseInput,
    ) -> Result<ExpenseOutcome, RegistryError> {
        validation::required("description", &input.description)?;
        validation::positive("amount", input.amount)?;
        validation::date("expenseDate", &input.expense_date)?;
        optional(input.category.as_deref(), |c| {
            validation::one_of("category", c, &expense_categories::ALL)
        })?;

        let strict = self.config.strict_budget;
        let outcome = self
            .db
            .with_conn(|conn| expenses::create_expense(conn, project_id, input, strict))?;
        self.events.emit(RegistryEvent::ExpenseRecorded {
            id: outcome.expense.id.clone(),
            project_id: project_id.to_string(),
            amount: outcome.expense.amount,
            over_budget: outcome.budget.over_budget,
        });
        Ok(outcome)
    }

    pub fn list_expenses(&self, project_id: &str) -> Result<Option<Vec<Expense>>, RegistryError> {
        self.db.with_conn(|conn| {
            if projects::get_project(conn, project_id)?.is_none() {
                return Ok(None);
            }
            expenses::list_expenses(conn, project_id).map(Some)
        })
    }

    pub fn delete_expense(&self, id: &str) -> Result<bool, RegistryError> {
        let deleted = self.db.with_conn(|conn| expenses::delete_expense(conn, id))?;
        if deleted {
            self.events.emit(RegistryEvent::ExpenseDeleted { id: id.to_string() });
        }
        Ok(deleted)
    }

    pub fn link_expense(&self, expense_id: &str, transaction_id: &str) -> Result<Option<Expense>, RegistryError> {
        validation::required("transactionId", transaction_id)?;
        self.db
            .with_conn(|conn| expenses::set_transaction_link(conn, expense_id, Some(transaction_id)))
    }

    pub fn unlink_expense(&self, expense_id: &str) -> Result<Option<Expense>, RegistryError> {
        self.db
            .with_conn(|conn| expenses::set_transaction_link(conn, expense_id, None))
    }

    // =========================================================================
    // Milestones
    // =========================================================================

    pub fn create_milestone(
        &self,
        project_id: &str,
        input: &CreateMilestoneInput,
    ) -> Result<Milestone, RegistryError> {
        validation::required("title", &input.title)?;
        validation::date("targetDate", &input.target_date)?;
        optional(input.progress.as_ref(), |p| validation::in_range("progress", *p, 0, 100))?;
        optional(input.status.as_deref(), |s| {
            validation::one_of("status", s, &milestone_statuses::ALL)
        })?;

        let created = self
            .db
            .with_conn(|conn| milestones::create_milestone(conn, project_id, input))?;
        self.events.emit(RegistryEvent::MilestoneSaved {
            id: created.id.clone(),
            project_id: created.project_id.clone(),
        });
        Ok(created)
    }

    pub fn list_milestones(&self, project_id: &str) -> Result<Option<Vec<Milestone>>, RegistryError> {
        self.db.with_conn(|conn| {
            if projects::get_project(conn, project_id)?.is_none() {
                return Ok(None);
            }
            milestones::list_milestones(conn, project_id).map(Some)
        })
    }

    pub fn update_milestone(
        &self,
        id: &str,
        input: &UpdateMilestoneInput,
    ) -> Result<Option<Milestone>, RegistryError> {
        optional(input.title.as_deref(), |v| validation::required("title", v))?;
        optional(input.target_date.as_deref(), |v| validation::date("targetDate", v).map(|_| ()))?;
        optional(input.progress.as_ref(), |p| validation::in_range("progress", *p, 0, 100))?;
        optional(input.status.as_deref(), |s| {
            validation::one_of("status", s, &milestone_statuses::ALL)
        })?;

        let updated = self
            .db
            .with_conn(|conn| milestones::update_milestone(conn, id, input))?;
        if let Some(ref m) = updated {
            self.events.emit(RegistryEvent::MilestoneSaved {
                id: m.id.clone(),
                project_id: m.project_id.clone(),
            });
        }
        Ok(updated)
    }

    pub fn delete_milestone(&self, id: &str) -> Result<bool, RegistryError> {
        let deleted = self.db.with_conn(|conn| milestones::delete_milestone(conn, id))?;
        if deleted {
            self.events.emit(RegistryEvent::MilestoneDeleted { id: id.to_string() });
        }
        Ok(deleted)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    pub fn create_transaction(
        &self,
        input: &CreateTransactionInput,
        created_by: Option<&str>,
    ) -> Result<Transaction, RegistryError> {
        validation::one_of("transactionType", &input.transaction_type, &transaction_types::ALL)?;
        validation::required("category", &input.category)?;
        validation::required("description", &input.description)?;
        validation::positive("amount", input.amount)?;
        validation::date("transactionDate", &input.transaction_date)?;

        let created = self
            .db
            .with_conn(|conn| transactions::create_transaction(conn, input, created_by))?;
        self.events.emit(RegistryEvent::TransactionRecorded {
            id: created.id.clone(),
            reference_number: created.reference_number.clone(),
            amount: created.amount,
        });
        Ok(created)
    }

    pub fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, RegistryError> {
        self.db.with_conn(|conn| transactions::get_transaction(conn, id))
    }

    pub fn list_transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, RegistryError> {
        optional(query.transaction_type.as_deref(), |t| {
            validation::one_of("type", t, &transaction_types::ALL)
        })?;
        optional(query.status.as_deref(), |s| {
            validation::one_of("status", s, &transaction_statuses::ALL)
        })?;
        optional(query.from.as_deref(), |d| validation::date("from", d).map(|_| ()))?;
        optional(query.to.as_deref(), |d| validation::date("to", d).map(|_| ()))?;
        self.db
            .with_conn(|conn| transactions::list_transactions(conn, query))
    }

    pub fn update_transaction(
        &self,
        id: &str,
        input: &UpdateTransactionInput,
    ) -> Result<Option<Transaction>, RegistryError> {
        optional(input.transaction_type.as_deref(), |t| {
            validation::one_of("transactionType", t, &transaction_types::ALL)
        })?;
        optional(input.category.as_deref(), |v| validation::required("category", v))?;
        optional(input.description.as_deref(), |v| validation::required("description", v))?;
        optional(input.amount.as_ref(), |v| validation::positive("amount", *v))?;
        optional(input.transaction_date.as_deref(), |d| {
            validation::date("transactionDate", d).map(|_| ())
        })?;
        self.db
            .with_conn(|conn| transactions::update_transaction(conn, id, input))
    }

    pub fn update_transaction_status(
        &self,
        id: &str,
        status: &str,
        actor: Option<&str>,
    ) -> Result<Option<Transaction>, RegistryError> {
        validation::one_of("status", status, &transaction_statuses::ALL)?;

        let (previous, updated) = self.db.with_conn(|conn| {
            let Some(current) = transactions::get_transaction(conn, id)? else {
                return Ok((None, None));
            };
            let updated = transactions::update_status(conn, id, status, actor)?;
            Ok((Some(current.status), updated))
        })?;

        if let (Some(from), Some(t)) = (previous, updated.as_ref()) {
            if from != t.status {
                self.events.emit(RegistryEvent::TransactionStatusChanged {
                    id: id.to_string(),
                    from,
                    to: t.status.clone(),
                });
            }
        }
        Ok(updated)
    }

    pub fn delete_transaction(&self, id: &str) -> Result<bool, RegistryError> {
        let deleted = self
            .db
            .with_conn(|conn| transactions::delete_transaction(conn, id))?;
        if deleted {
            self.events.emit(RegistryEvent::TransactionDeleted { id: id.to_string() });
        }
        Ok(deleted)
    }
}

fn validate_schedule(start: Option<&str>, end: Option<&str>) -> Result<(), RegistryError> {
    let start = start.map(|d| validation::date("startDate", d)).transpose()?;
    let end = end.map(|d| validation::date("endDate", d)).transpose()?;
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(RegistryError::InvalidInput(
                "endDate must not be before startDate".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(strict_budget: bool) -> FinanceService {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let config = Config {
            strict_budget,
            ..Config::default()
        };
        FinanceService::new(db, Arc::new(EventBus::new()), Arc::new(config))
    }

    fn seeded(svc: &FinanceService, cost: f64) -> (String, String) {
        let aip = svc
            .create_aip(&CreateAipInput {
                fiscal_year: 2024,
                title: "AIP 2024".into(),
                total_budget: 1_000_000.0,
                ..Default::default()
            })
            .unwrap();
        let project = svc
            .create_project(
                &aip.id,
                &CreateProjectInput {
                    title: "Covered Court".into(),
                    total_cost: cost,
                    start_date: Some("2024-02-01".into()),
                    end_date: Some("2024-11-30".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        (aip.id, project.project.id)
    }

    fn expense(amount: f64) -> CreateExpenseInput {
        CreateExpenseInput {
            description: "Steel trusses".into(),
            amount,
            category: Some(expense_categories::MATERIALS.into()),
            expense_date: "2024-03-15".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_detail_reports_allocation() {
        let svc = service(false);
        let (aip_id, _) = seeded(&svc, 250_000.0);
        let detail = svc.aip_detail(&aip_id).unwrap().unwrap();
        assert_eq!(detail.allocated_budget, 250_000.0);
        assert_eq!(detail.unallocated_budget, 750_000.0);
        assert_eq!(detail.projects.len(), 1);
        assert!(svc.aip_detail("missing").unwrap().is_none());
    }

    #[test]
    fn test_overrun_flagged_or_refused() {
        let lenient = service(false);
        let (_, pid) = seeded(&lenient, 1000.0);
        let outcome = lenient.record_expense(&pid, &expense(1200.0)).unwrap();
        assert!(outcome.budget.over_budget);
        assert_eq!(outcome.budget.utilization, 100);

        let strict = service(true);
        let (_, pid) = seeded(&strict, 1000.0);
        let err = strict.record_expense(&pid, &expense(1200.0)).unwrap_err();
        assert!(matches!(err, RegistryError::Conflict(_)));
    }

    #[test]
    fn test_schedule_and_amount_validation() {
        let svc = service(false);
        let (aip_id, pid) = seeded(&svc, 1000.0);

        let backwards = CreateProjectInput {
            title: "Backwards".into(),
            total_cost: 10.0,
            start_date: Some("2024-05-01".into()),
            end_date: Some("2024-04-01".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.create_project(&aip_id, &backwards),
            Err(RegistryError::InvalidInput(_))
        ));

        let moved_end = UpdateProjectInput {
            end_date: Some(Some("2024-01-01".into())),
            ..Default::default()
        };
        assert!(matches!(
            svc.update_project(&pid, &moved_end),
            Err(RegistryError::InvalidInput(_))
        ));

        assert!(matches!(
            svc.record_expense(&pid, &expense(0.0)),
            Err(RegistryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_transaction_status_flow() {
        let svc = service(false);
        let txn = svc
            .create_transaction(
                &CreateTransactionInput {
                    transaction_type: transaction_types::INCOME.into(),
                    category: "Clearance Fees".into(),
                    amount: 150.0,
                    description: "Barangay clearance".into(),
                    transaction_date: "2024-05-02".into(),
                    payee: None,
                },
                Some("treasurer"),
            )
            .unwrap();

        let approved = svc
            .update_transaction_status(&txn.id, transaction_statuses::APPROVED, Some("captain"))
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, transaction_statuses::APPROVED);

        let err = svc
            .update_transaction_status(&txn.id, transaction_statuses::PENDING, None)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));
        assert!(svc
            .update_transaction_status("missing", transaction_statuses::APPROVED, None)
            .unwrap()
            .is_none());
    }
}
