//! Annual Investment Program storage (one AIP per fiscal year)

use diesel::prelude::*;
use serde::Deserialize;

use crate::db::diesel_schema::{aips, projects};
use crate::db::models::{aip_statuses, current_timestamp, double_option, Aip, AipChanges, NewAip};
use crate::db::new_id;
use crate::error::RegistryError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAipInput {
    pub fiscal_year: i32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub total_budget: f64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAipInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub total_budget: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

pub fn create_aip(conn: &mut SqliteConnection, input: &CreateAipInput) -> Result<Aip, RegistryError> {
    let id = new_id();
    let now = current_timestamp();
    let status = input.status.as_deref().unwrap_or(aip_statuses::DRAFT);
    let approved_date = (status == aip_statuses::APPROVED).then_some(now.as_str());

    let new_aip = NewAip {
        id: &id,
        fiscal_year: input.fiscal_year,
        title: input.title.trim(),
        description: input.description.as_deref(),
        total_budget: input.total_budget,
        status,
        approved_date,
        created_at: &now,
        updated_at: &now,
    };

    diesel::insert_into(aips::table)
        .values(&new_aip)
        .execute(conn)
        .map_err(|e| match RegistryError::from(e) {
            RegistryError::Conflict(_) => RegistryError::Conflict(format!(
                "An AIP for fiscal year {} already exists",
                input.fiscal_year
            )),
            other => other,
        })?;
    aips::table.find(&id).first(conn).map_err(Into::into)
}

pub fn get_aip(conn: &mut SqliteConnection, id: &str) -> Result<Option<Aip>, RegistryError> {
    aips::table.find(id).first(conn).optional().map_err(Into::into)
}

/// Newest fiscal year first
pub fn list_aips(conn: &mut SqliteConnection) -> Result<Vec<Aip>, RegistryError> {
    aips::table
        .order(aips::fiscal_year.desc())
        .load(conn)
        .map_err(Into::into)
}

pub fn update_aip(
    conn: &mut SqliteConnection,
    id: &str,
    input: &UpdateAipInput,
) -> Result<Option<Aip>, RegistryError> {
    let Some(current) = get_aip(conn, id)? else {
        return Ok(None);
    };

    let now = current_timestamp();
    // First approval stamps the date; later status changes keep it
    let approved_date = match input.status.as_deref() {
        Some(aip_statuses::APPROVED) if current.approved_date.is_none() => Some(Some(now.as_str())),
        _ => None,
    };

    let changes = AipChanges {
        title: input.title.as_deref(),
        description: input.description.as_ref().map(|v| v.as_deref()),
        total_budget: input.total_budget,
        status: input.status.as_deref(),
        approved_date,
        updated_at: Some(&now),
    };

    diesel::update(aips::table.find(id)).set(&changes).execute(conn)?;
    get_aip(conn, id)
}

/// Delete an AIP and, through cascading keys, its projects
pub fn delete_aip(conn: &mut SqliteConnection, id: &str) -> Result<bool, RegistryError> {
    let deleted = diesel::delete(aips::table.find(id)).execute(conn)?;
    Ok(deleted > 0)
}

/// Sum of project costs planned under an AIP
pub fn allocated_budget(conn: &mut SqliteConnection, aip_id: &str) -> Result<f64, RegistryError> {
    let total: Option<f64> = projects::table
        .filter(projects::aip_id.eq(aip_id))
        .select(diesel::dsl::sum(projects::total_cost))
        .first(conn)?;
    Ok(total.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn as setup;

    fn input(year: i32) -> CreateAipInput {
        CreateAipInput {
            fiscal_year: year,
            title: format!("AIP {}", year),
            total_budget: 5_000_000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_one_aip_per_fiscal_year() {
        let mut conn = setup();
        create_aip(&mut conn, &input(2024)).unwrap();
        let err = create_aip(&mut conn, &input(2024)).unwrap_err();
        assert!(matches!(err, RegistryError::Conflict(_)));

        create_aip(&mut conn, &input(2025)).unwrap();
        let all = list_aips(&mut conn).unwrap();
        assert_eq!(all[0].fiscal_year, 2025);
    }

    #[test]
    fn test_approval_stamps_date_once() {
        let mut conn = setup();
        let aip = create_aip(&mut conn, &input(2024)).unwrap();
        assert_eq!(aip.status, aip_statuses::DRAFT);
        assert!(aip.approved_date.is_none());

        let approved = update_aip(
            &mut conn,
            &aip.id,
            &UpdateAipInput {
                status: Some(aip_statuses::APPROVED.into()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        let stamped = approved.approved_date.clone();
        assert!(stamped.is_some());

        let implemented = update_aip(
            &mut conn,
            &aip.id,
            &UpdateAipInput {
                status: Some(aip_statuses::IMPLEMENTED.into()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(implemented.approved_date, stamped);
        assert_eq!(allocated_budget(&mut conn, &aip.id).unwrap(), 0.0);
    }
}
