//! Barangay officials (certificate signatories)

use diesel::prelude::*;
use serde::Deserialize;

use super::diesel_schema::officials;
use super::models::{current_timestamp, double_option, NewOfficial, Official, OfficialChanges};
use super::new_id;
use crate::error::RegistryError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfficialInput {
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub term_start: Option<String>,
    #[serde(default)]
    pub term_end: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfficialInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub term_start: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub term_end: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

pub fn create_official(
    conn: &mut SqliteConnection,
    input: &CreateOfficialInput,
) -> Result<Official, RegistryError> {
    let id = new_id();
    let now = current_timestamp();
    let new_official = NewOfficial {
        id: &id,
        name: input.name.trim(),
        position: input.position.trim(),
        term_start: input.term_start.as_deref(),
        term_end: input.term_end.as_deref(),
        is_active: input.is_active as i32,
        created_at: &now,
        updated_at: &now,
    };

    diesel::insert_into(officials::table)
        .values(&new_official)
        .execute(conn)?;
    officials::table.find(&id).first(conn).map_err(Into::into)
}

pub fn get_official(conn: &mut SqliteConnection, id: &str) -> Result<Option<Official>, RegistryError> {
    officials::table.find(id).first(conn).optional().map_err(Into::into)
}

pub fn list_officials(
    conn: &mut SqliteConnection,
    active_only: bool,
) -> Result<Vec<Official>, RegistryError> {
    let mut q = officials::table.into_boxed();
    if active_only {
        q = q.filter(officials::is_active.eq(1));
    }
    q.order(officials::name.asc()).load(conn).map_err(Into::into)
}

/// First active official holding `position`, used as the default signatory
pub fn find_active_by_position(
    conn: &mut SqliteConnection,
    position: &str,
) -> Result<Option<Official>, RegistryError> {
    officials::table
        .filter(officials::position.eq(position))
        .filter(officials::is_active.eq(1))
        .order(officials::created_at.asc())
        .first(conn)
        .optional()
        .map_err(Into::into)
}

pub fn update_official(
    conn: &mut SqliteConnection,
    id: &str,
    input: &UpdateOfficialInput,
) -> Result<Option<Official>, RegistryError> {
    let now = current_timestamp();
    let changes = OfficialChanges {
        name: input.name.as_deref(),
        position: input.position.as_deref(),
        term_start: input.term_start.as_ref().map(|v| v.as_deref()),
        term_end: input.term_end.as_ref().map(|v| v.as_deref()),
        is_active: input.is_active.map(|b| b as i32),
        updated_at: Some(&now),
    };

    let updated = diesel::update(officials::table.find(id))
        .set(&changes)
        .execute(conn)?;
    if updated == 0 {
        return Ok(None);
    }
    get_official(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn as setup;

    #[test]
    fn test_active_filter_and_signatory_lookup() {
        let mut conn = setup();
        let captain = create_official(
            &mut conn,
            &CreateOfficialInput {
                name: "Jose Rizal".into(),
                position: "Punong Barangay".into(),
                is_active: true,
                ..Default::default()
            },
        )
        .unwrap();
        create_official(
            &mut conn,
            &CreateOfficialInput {
                name: "Andres Bonifacio".into(),
                position: "Kagawad".into(),
                is_active: false,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(list_officials(&mut conn, false).unwrap().len(), 2);
        assert_eq!(list_officials(&mut conn, true).unwrap().len(), 1);

        let found = find_active_by_position(&mut conn, "Punong Barangay").unwrap().unwrap();
        assert_eq!(found.id, captain.id);

        let retired = update_official(
            &mut conn,
            &captain.id,
            &UpdateOfficialInput {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(retired.is_active, 0);
        assert!(find_active_by_position(&mut conn, "Punong Barangay").unwrap().is_none());
    }
}
