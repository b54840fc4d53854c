//! AIP project storage and budget summaries

use std::collections::HashMap;

use diesel::prelude::*;
use serde::Deserialize;

use super::BudgetSummary;
use crate::db::diesel_schema::{aips, expenses, projects};
use crate::db::models::{
    current_timestamp, double_option, project_sectors, project_statuses, Aip, NewProject, Project,
    ProjectChanges,
};
use crate::db::{new_id, next_sequence};
use crate::error::RegistryError;

/// Project with its spending position
#[derive(Debug, Clone)]
pub struct ProjectWithBudget {
    pub project: Project,
    pub budget: BudgetSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    /// Generated as `PRJ-YYYY-NNN` when absent
    #[serde(default)]
    pub project_code: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub implementing_office: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub total_cost: f64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub implementing_office: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<String>>,
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

fn next_project_code(conn: &mut SqliteConnection, fiscal_year: i32) -> Result<String, RegistryError> {
    let prefix = format!("PRJ-{}-", fiscal_year);
    let existing: Vec<String> = projects::table
        .filter(projects::project_code.like(format!("{}%", prefix)))
        .select(projects::project_code)
        .load(conn)?;

    let next = next_sequence(&prefix, &existing);
    Ok(format!("{}{:03}", prefix, next))
}

pub fn create_project(
    conn: &mut SqliteConnection,
    aip_id: &str,
    input: &CreateProjectInput,
) -> Result<Project, RegistryError> {
    conn.transaction(|conn| {
        let aip: Option<Aip> = aips::table.find(aip_id).first(conn).optional()?;
        let Some(aip) = aip else {
            return Err(RegistryError::NotFound(format!("AIP not found: {}", aip_id)));
        };

        let project_code = match input.project_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => next_project_code(conn, aip.fiscal_year)?,
        };

        let id = new_id();
        let now = current_timestamp();
        let new_project = NewProject {
            id: &id,
            aip_id,
            project_code: &project_code,
            title: input.title.trim(),
            description: input.description.as_deref(),
            sector: input.sector.as_deref().unwrap_or(project_sectors::GENERAL_SERVICES),
            location: input.location.as_deref(),
            implementing_office: input.implementing_office.as_deref(),
            start_date: input.start_date.as_deref(),
            end_date: input.end_date.as_deref(),
            total_cost: input.total_cost,
            status: input.status.as_deref().unwrap_or(project_statuses::PLANNED),
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(projects::table)
            .values(&new_project)
            .execute(conn)
            .map_err(|e| match RegistryError::from(e) {
                RegistryError::Conflict(_) => {
                    RegistryError::Conflict(format!("Project code already used: {}", project_code))
                }
                other => other,
            })?;
        projects::table.find(&id).first(conn).map_err(Into::into)
    })
}

pub fn get_project(conn: &mut SqliteConnection, id: &str) -> Result<Option<Project>, RegistryError> {
    projects::table.find(id).first(conn).optional().map_err(Into::into)
}

pub fn get_project_with_budget(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<ProjectWithBudget>, RegistryError> {
    let Some(project) = get_project(conn, id)? else {
        return Ok(None);
    };
    let spent = total_expenses(conn, id)?;
    let budget = BudgetSummary::new(project.total_cost, spent);
    Ok(Some(ProjectWithBudget { project, budget }))
}

pub fn list_projects(
    conn: &mut SqliteConnection,
    aip_id: &str,
) -> Result<Vec<ProjectWithBudget>, RegistryError> {
    let rows: Vec<Project> = projects::table
        .filter(projects::aip_id.eq(aip_id))
        .order(projects::project_code.asc())
        .load(conn)?;

    let ids: Vec<String> = rows.iter().map(|p| p.id.clone()).collect();
    let totals: Vec<(String, Option<f64>)> = expenses::table
        .filter(expenses::project_id.eq_any(ids))
        .group_by(expenses::project_id)
        .select((expenses::project_id, diesel::dsl::sum(expenses::amount)))
        .load(conn)?;
    let totals: HashMap<String, f64> = totals
        .into_iter()
        .map(|(id, sum)| (id, sum.unwrap_or(0.0)))
        .collect();

    Ok(rows
        .into_iter()
        .map(|project| {
            let spent = totals.get(&project.id).copied().unwrap_or(0.0);
            let budget = BudgetSummary::new(project.total_cost, spent);
            ProjectWithBudget { project, budget }
        })
        .collect())
}

pub fn update_project(
    conn: &mut SqliteConnection,
    id: &str,
    input: &UpdateProjectInput,
) -> Result<Option<Project>, RegistryError> {
    let now = current_timestamp();
    let changes = ProjectChanges {
        title: input.title.as_deref(),
        description: input.description.as_ref().map(|v| v.as_deref()),
        sector: input.sector.as_deref(),
        location: input.location.as_ref().map(|v| v.as_deref()),
        implementing_office: input.implementing_office.as_ref().map(|v| v.as_deref()),
        start_date: input.start_date.as_ref().map(|v| v.as_deref()),
        end_date: input.end_date.as_ref().map(|v| v.as_deref()),
        total_cost: input.total_cost,
        status: input.status.as_deref(),
        updated_at: Some(&now),
    };

    let updated = diesel::update(projects::table.find(id))
        .set(&changes)
        .execute(conn)?;
    if updated == 0 {
        return Ok(None);
    }
    get_project(conn, id)
}

/// Delete a project with its expenses and milestones
pub fn delete_project(conn: &mut SqliteConnection, id: &str) -> Result<bool, RegistryError> {
    let deleted = diesel::delete(projects::table.find(id)).execute(conn)?;
    Ok(deleted > 0)
}

/// Sum of recorded expenses for one project
pub fn total_expenses(conn: &mut SqliteConnection, project_id: &str) -> Result<f64, RegistryError> {
    let total: Option<f64> = expenses::table
        .filter(expenses::project_id.eq(project_id))
        .select(diesel::dsl::sum(expenses::amount))
        .first(conn)?;
    Ok(total.unwrap_or(0.0))
}
