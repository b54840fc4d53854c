//! Project expenses
//!
//! Recording an expense reads the project's current spend and inserts in
//! one transaction, so the budget check sees a consistent total.

use diesel::prelude::*;
use serde::Deserialize;

use super::projects::{get_project, total_expenses};
use super::BudgetSummary;
use crate::db::diesel_schema::{expenses, transactions};
use crate::db::models::{current_timestamp, expense_categories, Expense, NewExpense};
use crate::db::new_id;
use crate::error::RegistryError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseInput {
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
    pub expense_date: String,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTransactionInput {
    pub transaction_id: String,
}

/// Result of recording an expense
#[derive(Debug, Clone)]
pub struct ExpenseOutcome {
    pub expense: Expense,
    /// Budget position after the expense
    pub budget: BudgetSummary,
}

/// Record an expense against a project
///
/// With `strict_budget`, an expense that would push the total past the
/// project's cost is refused with `Conflict`; otherwise it is stored and the
/// returned summary reports `over_budget`.
pub fn create_expense(
    conn: &mut SqliteConnection,
    project_id: &str,
    input: &CreateExpenseInput,
    strict_budget: bool,
) -> Result<ExpenseOutcome, RegistryError> {
    conn.transaction(|conn| {
        let Some(project) = get_project(conn, project_id)? else {
            return Err(RegistryError::NotFound(format!("Project not found: {}", project_id)));
        };
        if let Some(ref transaction_id) = input.transaction_id {
            ensure_transaction(conn, transaction_id)?;
        }

        let spent = total_expenses(conn, project_id)?;
        let after = spent + input.amount;
        if strict_budget && after > project.total_cost {
            return Err(RegistryError::Conflict(format!(
                "Expense of {:.2} exceeds remaining budget of {:.2} for project {}",
                input.amount,
                project.total_cost - spent,
                project.project_code
            )));
        }

        let id = new_id();
        let now = current_timestamp();
        let new_expense = NewExpense {
            id: &id,
            project_id,
            description: input.description.trim(),
            amount: input.amount,
            category: input.category.as_deref().unwrap_or(expense_categories::OTHER),
            expense_date: &input.expense_date,
            reference_number: input.reference_number.as_deref(),
            transaction_id: input.transaction_id.as_deref(),
            created_at: &now,
            updated_at: &now,
        };
        diesel::insert_into(expenses::table)
            .values(&new_expense)
            .execute(conn)?;

        let expense = expenses::table.find(&id).first(conn)?;
        Ok(ExpenseOutcome {
            expense,
            budget: BudgetSummary::new(project.total_cost, after),
        })
    })
}

fn ensure_transaction(conn: &mut SqliteConnection, transaction_id: &str) -> Result<(), RegistryError> {
    let exists: bool =
        diesel::select(diesel::dsl::exists(transactions::table.find(transaction_id))).get_result(conn)?;
    if exists {
        Ok(())
    } else {
        Err(RegistryError::InvalidInput(format!(
            "Transaction not found: {}",
            transaction_id
        )))
    }
}

pub fn get_expense(conn: &mut SqliteConnection, id: &str) -> Result<Option<Expense>, RegistryError> {
    expenses::table.find(id).first(conn).optional().map_err(Into::into)
}

pub fn list_expenses(
    conn: &mut SqliteConnection,
    project_id: &str,
) -> Result<Vec<Expense>, RegistryError> {
    expenses::table
        .filter(expenses::project_id.eq(project_id))
        .order((expenses::expense_date.desc(), expenses::created_at.desc()))
        .load(conn)
        .map_err(Into::into)
}

pub fn delete_expense(conn: &mut SqliteConnection, id: &str) -> Result<bool, RegistryError> {
    let deleted = diesel::delete(expenses::table.find(id)).execute(conn)?;
    Ok(deleted > 0)
}

/// Point an expense at a ledger transaction (`None` unlinks)
pub fn set_transaction_link(
    conn: &mut SqliteConnection,
    expense_id: &str,
    transaction_id: Option<&str>,
) -> Result<Option<Expense>, RegistryError> {
    if let Some(transaction_id) = transaction_id {
        ensure_transaction(conn, transaction_id)?;
    }

    let now = current_timestamp();
    let updated = diesel::update(expenses::table.find(expense_id))
        .set((
            expenses::transaction_id.eq(transaction_id),
            expenses::updated_at.eq(&now),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Ok(None);
    }
    get_expense(conn, expense_id)
}

/// Expenses linked to a ledger transaction
pub fn list_for_transaction(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> Result<Vec<Expense>, RegistryError> {
    expenses::table
        .filter(expenses::transaction_id.eq(transaction_id))
        .load(conn)
        .map_err(Into::into)
}
