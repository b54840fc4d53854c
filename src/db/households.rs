//! Household registry storage
//!
//! Households are archived, never deleted. Each household has at most one
//! `household_statistics` row, recomputed from its active residents.

use chrono::NaiveDate;
use diesel::prelude::*;
use serde::Deserialize;

use super::diesel_schema::{household_statistics, households, resident_sectors, residents};
use super::models::{
    age_on, current_timestamp, double_option, household_statuses, household_types,
    resident_statuses, sectors, Household, HouseholdChanges, HouseholdStatistic, NewHousehold,
};
use super::{like_pattern, new_id};
use crate::error::RegistryError;

// ============================================================================
// Input Types
// ============================================================================

/// Input for creating a household
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHouseholdInput {
    #[serde(default)]
    pub house_no: Option<String>,
    pub street: String,
    #[serde(default)]
    pub purok: Option<String>,
    #[serde(default)]
    pub barangay: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub household_type: Option<String>,
    #[serde(default)]
    pub monthly_income: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update; `null` clears a nullable field, absence keeps it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHouseholdInput {
    #[serde(default, deserialize_with = "double_option")]
    pub house_no: Option<Option<String>>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub purok: Option<Option<String>>,
    #[serde(default)]
    pub barangay: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub zip_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub longitude: Option<Option<f64>>,
    #[serde(default)]
    pub household_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub monthly_income: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

/// Query parameters for listing households
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub purok: Option<String>,
    #[serde(default)]
    pub household_type: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

// ============================================================================
// Household CRUD
// ============================================================================

pub fn create_household(
    conn: &mut SqliteConnection,
    input: &CreateHouseholdInput,
) -> Result<Household, RegistryError> {
    let id = new_id();
    let now = current_timestamp();

    let new_household = NewHousehold {
        id: &id,
        house_no: input.house_no.as_deref(),
        street: input.street.trim(),
        purok: input.purok.as_deref(),
        barangay: input.barangay.as_deref().unwrap_or_default(),
        city: input.city.as_deref().unwrap_or_default(),
        province: input.province.as_deref().unwrap_or_default(),
        zip_code: input.zip_code.as_deref(),
        latitude: input.latitude,
        longitude: input.longitude,
        household_type: input
            .household_type
            .as_deref()
            .unwrap_or(household_types::SINGLE_FAMILY),
        status: household_statuses::ACTIVE,
        monthly_income: input.monthly_income,
        notes: input.notes.as_deref(),
        created_at: &now,
        updated_at: &now,
    };

    conn.transaction(|conn| {
        diesel::insert_into(households::table)
            .values(&new_household)
            .execute(conn)?;
        recompute_statistics(conn, &id)?;
        households::table.find(&id).first(conn).map_err(Into::into)
    })
}

pub fn get_household(conn: &mut SqliteConnection, id: &str) -> Result<Option<Household>, RegistryError> {
    households::table.find(id).first(conn).optional().map_err(Into::into)
}

pub fn household_exists(conn: &mut SqliteConnection, id: &str) -> Result<bool, RegistryError> {
    diesel::select(diesel::dsl::exists(households::table.find(id)))
        .get_result(conn)
        .map_err(Into::into)
}

pub fn list_households(
    conn: &mut SqliteConnection,
    query: &HouseholdQuery,
) -> Result<Vec<Household>, RegistryError> {
    let mut q = households::table.into_boxed();

    match query.status.as_deref() {
        Some(status) => q = q.filter(households::status.eq(status.to_string())),
        None if !query.include_archived => {
            q = q.filter(households::status.ne(household_statuses::ARCHIVED))
        }
        None => {}
    }
    if let Some(ref purok) = query.purok {
        q = q.filter(households::purok.eq(purok));
    }
    if let Some(ref household_type) = query.household_type {
        q = q.filter(households::household_type.eq(household_type));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        q = q.filter(
            households::street
                .like(pattern.clone())
                .escape('\\')
                .or(households::house_no.like(pattern.clone()).escape('\\'))
                .or(households::purok.like(pattern).escape('\\')),
        );
    }

    q.order((households::street.asc(), households::house_no.asc()))
        .load(conn)
        .map_err(Into::into)
}

pub fn update_household(
    conn: &mut SqliteConnection,
    id: &str,
    input: &UpdateHouseholdInput,
) -> Result<Option<Household>, RegistryError> {
    let now = current_timestamp();
    let changes = HouseholdChanges {
        house_no: input.house_no.as_ref().map(|v| v.as_deref()),
        street: input.street.as_deref(),
        purok: input.purok.as_ref().map(|v| v.as_deref()),
        barangay: input.barangay.as_deref(),
        city: input.city.as_deref(),
        province: input.province.as_deref(),
        zip_code: input.zip_code.as_ref().map(|v| v.as_deref()),
        latitude: input.latitude,
        longitude: input.longitude,
        household_type: input.household_type.as_deref(),
        status: input.status.as_deref(),
        monthly_income: input.monthly_income,
        notes: input.notes.as_ref().map(|v| v.as_deref()),
        updated_at: Some(&now),
    };

    let updated = diesel::update(households::table.find(id))
        .set(&changes)
        .execute(conn)?;
    if updated == 0 {
        return Ok(None);
    }
    get_household(conn, id)
}

/// Archive instead of deleting; residents keep their reference
pub fn archive_household(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Household>, RegistryError> {
    update_household(
        conn,
        id,
        &UpdateHouseholdInput {
            status: Some(household_statuses::ARCHIVED.to_string()),
            ..Default::default()
        },
    )
}

// ============================================================================
// Statistics
// ============================================================================

pub fn get_statistics(
    conn: &mut SqliteConnection,
    household_id: &str,
) -> Result<Option<HouseholdStatistic>, RegistryError> {
    household_statistics::table
        .find(household_id)
        .first(conn)
        .optional()
        .map_err(Into::into)
}

/// Recount the household's active members and upsert its statistics row
pub fn recompute_statistics(
    conn: &mut SqliteConnection,
    household_id: &str,
) -> Result<HouseholdStatistic, RegistryError> {
    let members: Vec<(String, String, i32)> = residents::table
        .filter(residents::household_id.eq(household_id))
        .filter(residents::status.eq(resident_statuses::ACTIVE))
        .select((residents::id, residents::birth_date, residents::is_voter))
        .load(conn)?;

    let member_ids: Vec<String> = members.iter().map(|(id, _, _)| id.clone()).collect();
    let pwd_count: i64 = if member_ids.is_empty() {
        0
    } else {
        resident_sectors::table
            .filter(resident_sectors::resident_id.eq_any(member_ids))
            .filter(resident_sectors::sector.eq(sectors::PWD))
            .count()
            .get_result(conn)?
    };

    let today = chrono::Utc::now().date_naive();
    let stat = tally(household_id, &members, pwd_count as i32, today);

    diesel::replace_into(household_statistics::table)
        .values(&stat)
        .execute(conn)?;

    Ok(stat)
}

fn tally(
    household_id: &str,
    members: &[(String, String, i32)],
    pwd_count: i32,
    today: NaiveDate,
) -> HouseholdStatistic {
    let mut stat = HouseholdStatistic {
        household_id: household_id.to_string(),
        total_members: members.len() as i32,
        voter_count: 0,
        senior_count: 0,
        minor_count: 0,
        pwd_count,
        updated_at: current_timestamp(),
    };

    for (_, birth_date, is_voter) in members {
        if *is_voter != 0 {
            stat.voter_count += 1;
        }
        match age_on(birth_date, today) {
            Some(age) if age >= 60 => stat.senior_count += 1,
            Some(age) if age < 18 => stat.minor_count += 1,
            _ => {}
        }
    }

    stat
}

pub fn count_by_status(
    conn: &mut SqliteConnection,
    status: &str,
) -> Result<i64, RegistryError> {
    households::table
        .filter(households::status.eq(status))
        .count()
        .get_result(conn)
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn as setup;

    fn sample(street: &str) -> CreateHouseholdInput {
        CreateHouseholdInput {
            house_no: Some("12".into()),
            street: street.into(),
            purok: Some("Purok 3".into()),
            barangay: Some("San Isidro".into()),
            city: Some("Quezon City".into()),
            province: Some("Metro Manila".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_initializes_statistics() {
        let mut conn = setup();
        let household = create_household(&mut conn, &sample("Mabini St")).unwrap();

        assert_eq!(household.status, household_statuses::ACTIVE);
        assert_eq!(household.household_type, household_types::SINGLE_FAMILY);
        let stat = get_statistics(&mut conn, &household.id).unwrap().unwrap();
        assert_eq!(stat.total_members, 0);
    }

    #[test]
    fn test_archive_hides_from_default_list() {
        let mut conn = setup();
        let a = create_household(&mut conn, &sample("Mabini St")).unwrap();
        create_household(&mut conn, &sample("Rizal Ave")).unwrap();

        let archived = archive_household(&mut conn, &a.id).unwrap().unwrap();
        assert_eq!(archived.status, household_statuses::ARCHIVED);

        let visible = list_households(&mut conn, &HouseholdQuery::default()).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].street, "Rizal Ave");

        let all = list_households(
            &mut conn,
            &HouseholdQuery {
                include_archived: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(all.len(), 2);
        assert!(get_household(&mut conn, &a.id).unwrap().is_some());
    }

    #[test]
    fn test_update_clears_nullable_field() {
        let mut conn = setup();
        let household = create_household(&mut conn, &sample("Mabini St")).unwrap();
        let input: UpdateHouseholdInput =
            serde_json::from_str(r#"{"purok": null, "street": "Luna St"}"#).unwrap();

        let updated = update_household(&mut conn, &household.id, &input).unwrap().unwrap();
        assert_eq!(updated.street, "Luna St");
        assert_eq!(updated.purok, None);
        assert_eq!(updated.house_no.as_deref(), Some("12"));
    }

    #[test]
    fn test_tally_age_brackets() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let members = vec![
            ("a".to_string(), "1950-05-01".to_string(), 1),
            ("b".to_string(), "2010-05-01".to_string(), 0),
            ("c".to_string(), "1990-05-01".to_string(), 1),
        ];
        let stat = tally("h1", &members, 1, today);
        assert_eq!(stat.total_members, 3);
        assert_eq!(stat.voter_count, 2);
        assert_eq!(stat.senior_count, 1);
        assert_eq!(stat.minor_count, 1);
        assert_eq!(stat.pwd_count, 1);
    }
}
