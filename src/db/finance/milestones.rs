//! Project milestones

use diesel::prelude::*;
use serde::Deserialize;

use super::projects::get_project;
use crate::db::diesel_schema::milestones;
use crate::db::models::{
    current_timestamp, double_option, milestone_statuses, today, Milestone, MilestoneChanges,
    NewMilestone,
};
use crate::db::new_id;
use crate::error::RegistryError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMilestoneInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub target_date: String,
    #[serde(default)]
    pub progress: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMilestoneInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub progress: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
}

pub fn create_milestone(
    conn: &mut SqliteConnection,
    project_id: &str,
    input: &CreateMilestoneInput,
) -> Result<Milestone, RegistryError> {
    if get_project(conn, project_id)?.is_none() {
        return Err(RegistryError::NotFound(format!("Project not found: {}", project_id)));
    }

    let id = new_id();
    let now = current_timestamp();
    let date = today();
    let status = input.status.as_deref().unwrap_or(milestone_statuses::PENDING);
    let completed = status == milestone_statuses::COMPLETED;

    let new_milestone = NewMilestone {
        id: &id,
        project_id,
        title: input.title.trim(),
        description: input.description.as_deref(),
        target_date: &input.target_date,
        completed_date: completed.then_some(date.as_str()),
        progress: if completed { 100 } else { input.progress.unwrap_or(0) },
        status,
        created_at: &now,
        updated_at: &now,
    };

    diesel::insert_into(milestones::table)
        .values(&new_milestone)
        .execute(conn)?;
    milestones::table.find(&id).first(conn).map_err(Into::into)
}

pub fn get_milestone(conn: &mut SqliteConnection, id: &str) -> Result<Option<Milestone>, RegistryError> {
    milestones::table.find(id).first(conn).optional().map_err(Into::into)
}

pub fn list_milestones(
    conn: &mut SqliteConnection,
    project_id: &str,
) -> Result<Vec<Milestone>, RegistryError> {
    milestones::table
        .filter(milestones::project_id.eq(project_id))
        .order(milestones::target_date.asc())
        .load(conn)
        .map_err(Into::into)
}

/// Update a milestone. Moving to COMPLETED stamps today's date and sets
/// progress to 100; moving away from COMPLETED clears the date.
pub fn update_milestone(
    conn: &mut SqliteConnection,
    id: &str,
    input: &UpdateMilestoneInput,
) -> Result<Option<Milestone>, RegistryError> {
    let Some(current) = get_milestone(conn, id)? else {
        return Ok(None);
    };

    let now = current_timestamp();
    let date = today();
    let (completed_date, progress) = match input.status.as_deref() {
        Some(milestone_statuses::COMPLETED) if current.status != milestone_statuses::COMPLETED => {
            (Some(Some(date.as_str())), Some(100))
        }
        Some(status) if status != milestone_statuses::COMPLETED => (Some(None), input.progress),
        _ => (None, input.progress),
    };

    let changes = MilestoneChanges {
        title: input.title.as_deref(),
        description: input.description.as_ref().map(|v| v.as_deref()),
        target_date: input.target_date.as_deref(),
        completed_date,
        progress,
        status: input.status.as_deref(),
        updated_at: Some(&now),
    };

    diesel::update(milestones::table.find(id))
        .set(&changes)
        .execute(conn)?;
    get_milestone(conn, id)
}

pub fn delete_milestone(conn: &mut SqliteConnection, id: &str) -> Result<bool, RegistryError> {
    let deleted = diesel::delete(milestones::table.find(id)).execute(conn)?;
    Ok(deleted > 0)
}
