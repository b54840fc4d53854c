//! Resident storage with sector tags
//!
//! Sector tags live in `resident_sectors`; every read returns them alongside
//! the resident row. Household statistics are recomputed whenever a
//! resident joins, leaves or changes inside a household.

use std::collections::HashMap;

use diesel::prelude::*;
use serde::Deserialize;

use super::diesel_schema::{certificates, resident_sectors, residents};
use super::households::{household_exists, recompute_statistics};
use super::models::{
    certificate_statuses, current_timestamp, double_option, resident_statuses, NewResident,
    NewResidentSector, Resident, ResidentChanges,
};
use super::{like_pattern, new_id};
use crate::error::RegistryError;

/// Resident row plus its sector tags
#[derive(Debug, Clone)]
pub struct ResidentWithSectors {
    pub resident: Resident,
    pub sectors: Vec<String>,
}

// ============================================================================
// Input Types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResidentInput {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub suffix: Option<String>,
    pub birth_date: String,
    pub gender: String,
    pub civil_status: String,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub household_id: Option<String>,
    #[serde(default)]
    pub is_household_head: bool,
    #[serde(default)]
    pub is_voter: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResidentInput {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub middle_name: Option<Option<String>>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub suffix: Option<Option<String>>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub civil_status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub occupation: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub household_id: Option<Option<String>>,
    #[serde(default)]
    pub is_household_head: Option<bool>,
    #[serde(default)]
    pub is_voter: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    /// Replaces the full tag set when present
    #[serde(default)]
    pub sectors: Option<Vec<String>>,
}

/// Sort keys accepted by `list_residents`
pub mod sort_keys {
    pub const NAME: &str = "name";
    pub const BIRTH_DATE: &str = "birthDate";
    pub const CREATED_AT: &str = "createdAt";
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidentQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub is_voter: Option<bool>,
    #[serde(default)]
    pub household_id: Option<String>,
    #[serde(default)]
    pub civil_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub descending: bool,
}

// ============================================================================
// Read Operations
// ============================================================================

pub fn get_resident(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<ResidentWithSectors>, RegistryError> {
    let resident: Option<Resident> = residents::table.find(id).first(conn).optional()?;
    match resident {
        Some(resident) => {
            let sectors = load_sectors(conn, &resident.id)?;
            Ok(Some(ResidentWithSectors { resident, sectors }))
        }
        None => Ok(None),
    }
}

pub fn resident_exists(conn: &mut SqliteConnection, id: &str) -> Result<bool, RegistryError> {
    diesel::select(diesel::dsl::exists(residents::table.find(id)))
        .get_result(conn)
        .map_err(Into::into)
}

pub fn list_residents(
    conn: &mut SqliteConnection,
    query: &ResidentQuery,
) -> Result<Vec<ResidentWithSectors>, RegistryError> {
    let mut q = residents::table.into_boxed();

    if let Some(ref gender) = query.gender {
        q = q.filter(residents::gender.eq(gender));
    }
    if let Some(ref civil_status) = query.civil_status {
        q = q.filter(residents::civil_status.eq(civil_status));
    }
    if let Some(ref status) = query.status {
        q = q.filter(residents::status.eq(status));
    }
    if let Some(is_voter) = query.is_voter {
        q = q.filter(residents::is_voter.eq(is_voter as i32));
    }
    if let Some(ref household_id) = query.household_id {
        q = q.filter(residents::household_id.eq(household_id));
    }
    if let Some(ref sector) = query.sector {
        let tagged = resident_sectors::table
            .filter(resident_sectors::sector.eq(sector))
            .select(resident_sectors::resident_id);
        q = q.filter(residents::id.eq_any(tagged));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        q = q.filter(
            residents::first_name
                .like(pattern.clone())
                .escape('\\')
                .or(residents::last_name.like(pattern.clone()).escape('\\'))
                .or(residents::middle_name.like(pattern.clone()).escape('\\'))
                .or(residents::contact_number.like(pattern).escape('\\')),
        );
    }

    q = match (query.sort_by.as_deref(), query.descending) {
        (Some(sort_keys::BIRTH_DATE), false) => q.order(residents::birth_date.asc()),
        (Some(sort_keys::BIRTH_DATE), true) => q.order(residents::birth_date.desc()),
        (Some(sort_keys::CREATED_AT), false) => q.order(residents::created_at.asc()),
        (Some(sort_keys::CREATED_AT), true) => q.order(residents::created_at.desc()),
        (_, false) => q.order((residents::last_name.asc(), residents::first_name.asc())),
        (_, true) => q.order((residents::last_name.desc(), residents::first_name.desc())),
    };

    let rows: Vec<Resident> = q.load(conn)?;
    attach_sectors(conn, rows)
}

pub fn list_household_members(
    conn: &mut SqliteConnection,
    household_id: &str,
) -> Result<Vec<ResidentWithSectors>, RegistryError> {
    list_residents(
        conn,
        &ResidentQuery {
            household_id: Some(household_id.to_string()),
            ..Default::default()
        },
    )
}

fn load_sectors(conn: &mut SqliteConnection, resident_id: &str) -> Result<Vec<String>, RegistryError> {
    resident_sectors::table
        .filter(resident_sectors::resident_id.eq(resident_id))
        .select(resident_sectors::sector)
        .order(resident_sectors::sector.asc())
        .load(conn)
        .map_err(Into::into)
}

fn attach_sectors(
    conn: &mut SqliteConnection,
    rows: Vec<Resident>,
) -> Result<Vec<ResidentWithSectors>, RegistryError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let tags: Vec<(String, String)> = resident_sectors::table
        .filter(resident_sectors::resident_id.eq_any(ids))
        .select((resident_sectors::resident_id, resident_sectors::sector))
        .order(resident_sectors::sector.asc())
        .load(conn)?;

    let mut by_resident: HashMap<String, Vec<String>> = HashMap::new();
    for (resident_id, sector) in tags {
        by_resident.entry(resident_id).or_default().push(sector);
    }

    Ok(rows
        .into_iter()
        .map(|resident| {
            let sectors = by_resident.remove(&resident.id).unwrap_or_default();
            ResidentWithSectors { resident, sectors }
        })
        .collect())
}

// ============================================================================
// Write Operations
// ============================================================================

pub fn create_resident(
    conn: &mut SqliteConnection,
    input: &CreateResidentInput,
) -> Result<ResidentWithSectors, RegistryError> {
    conn.transaction(|conn| {
        if let Some(ref household_id) = input.household_id {
            if !household_exists(conn, household_id)? {
                return Err(RegistryError::InvalidInput(format!(
                    "Household not found: {}",
                    household_id
                )));
            }
        }

        let id = new_id();
        let now = current_timestamp();
        let new_resident = NewResident {
            id: &id,
            first_name: input.first_name.trim(),
            middle_name: input.middle_name.as_deref(),
            last_name: input.last_name.trim(),
            suffix: input.suffix.as_deref(),
            birth_date: &input.birth_date,
            gender: &input.gender,
            civil_status: &input.civil_status,
            contact_number: input.contact_number.as_deref(),
            email: input.email.as_deref(),
            occupation: input.occupation.as_deref(),
            address: input.address.as_deref(),
            household_id: input.household_id.as_deref(),
            is_household_head: input.is_household_head as i32,
            is_voter: input.is_voter as i32,
            status: input.status.as_deref().unwrap_or(resident_statuses::ACTIVE),
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(residents::table)
            .values(&new_resident)
            .execute(conn)?;
        replace_sectors(conn, &id, &input.sectors)?;

        if let Some(ref household_id) = input.household_id {
            recompute_statistics(conn, household_id)?;
        }

        get_resident(conn, &id)?
            .ok_or_else(|| RegistryError::Internal("Resident vanished after insert".into()))
    })
}

pub fn update_resident(
    conn: &mut SqliteConnection,
    id: &str,
    input: &UpdateResidentInput,
) -> Result<Option<ResidentWithSectors>, RegistryError> {
    conn.transaction(|conn| {
        let previous: Option<Resident> = residents::table.find(id).first(conn).optional()?;
        let Some(previous) = previous else {
            return Ok(None);
        };

        if let Some(Some(ref household_id)) = input.household_id {
            if !household_exists(conn, household_id)? {
                return Err(RegistryError::InvalidInput(format!(
                    "Household not found: {}",
                    household_id
                )));
            }
        }

        let now = current_timestamp();
        let changes = ResidentChanges {
            first_name: input.first_name.as_deref(),
            middle_name: input.middle_name.as_ref().map(|v| v.as_deref()),
            last_name: input.last_name.as_deref(),
            suffix: input.suffix.as_ref().map(|v| v.as_deref()),
            birth_date: input.birth_date.as_deref(),
            gender: input.gender.as_deref(),
            civil_status: input.civil_status.as_deref(),
            contact_number: input.contact_number.as_ref().map(|v| v.as_deref()),
            email: input.email.as_ref().map(|v| v.as_deref()),
            occupation: input.occupation.as_ref().map(|v| v.as_deref()),
            address: input.address.as_ref().map(|v| v.as_deref()),
            household_id: input.household_id.as_ref().map(|v| v.as_deref()),
            is_household_head: input.is_household_head.map(|b| b as i32),
            is_voter: input.is_voter.map(|b| b as i32),
            status: input.status.as_deref(),
            updated_at: Some(&now),
        };

        diesel::update(residents::table.find(id))
            .set(&changes)
            .execute(conn)?;

        if let Some(ref sectors) = input.sectors {
            replace_sectors(conn, id, sectors)?;
        }

        let current = get_resident(conn, id)?
            .ok_or_else(|| RegistryError::Internal("Resident vanished after update".into()))?;

        // Both the old and the new household may have changed membership
        let mut affected: Vec<&str> = Vec::new();
        if let Some(ref old) = previous.household_id {
            affected.push(old);
        }
        if let Some(ref new) = current.resident.household_id {
            if !affected.contains(&new.as_str()) {
                affected.push(new);
            }
        }
        for household_id in affected {
            recompute_statistics(conn, household_id)?;
        }

        Ok(Some(current))
    })
}

/// Delete a resident; returns false when the id is unknown
pub fn delete_resident(conn: &mut SqliteConnection, id: &str) -> Result<bool, RegistryError> {
    conn.transaction(|conn| {
        let household_id: Option<Option<String>> = residents::table
            .find(id)
            .select(residents::household_id)
            .first(conn)
            .optional()?;
        let Some(household_id) = household_id else {
            return Ok(false);
        };

        // Pending requests go with the resident; processed certificates stay on file
        let processed: i64 = certificates::table
            .filter(certificates::resident_id.eq(id))
            .filter(certificates::status.ne(certificate_statuses::PENDING))
            .count()
            .get_result(conn)?;
        if processed > 0 {
            return Err(RegistryError::Conflict(format!(
                "Resident has {} processed certificate(s); mark the resident inactive instead",
                processed
            )));
        }

        diesel::delete(residents::table.find(id)).execute(conn)?;

        if let Some(household_id) = household_id {
            recompute_statistics(conn, &household_id)?;
        }
        Ok(true)
    })
}

fn replace_sectors(
    conn: &mut SqliteConnection,
    resident_id: &str,
    sectors: &[String],
) -> Result<(), RegistryError> {
    diesel::delete(resident_sectors::table.filter(resident_sectors::resident_id.eq(resident_id)))
        .execute(conn)?;

    let mut unique: Vec<&str> = sectors.iter().map(|s| s.as_str()).collect();
    unique.sort_unstable();
    unique.dedup();

    let rows: Vec<NewResidentSector> = unique
        .into_iter()
        .map(|sector| NewResidentSector { resident_id, sector })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(resident_sectors::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::households::{create_household, get_statistics, CreateHouseholdInput};
    use crate::db::models::{civil_statuses, genders, sectors};
    use crate::db::test_conn as setup;

    fn resident(first: &str, last: &str, birth_date: &str) -> CreateResidentInput {
        CreateResidentInput {
            first_name: first.into(),
            last_name: last.into(),
            birth_date: birth_date.into(),
            gender: genders::FEMALE.into(),
            civil_status: civil_statuses::SINGLE.into(),
            ..Default::default()
        }
    }

    fn household(conn: &mut SqliteConnection) -> String {
        create_household(
            conn,
            &CreateHouseholdInput {
                street: "Mabini St".into(),
                ..Default::default()
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_household_reference_round_trips() {
        let mut conn = setup();
        let household_id = household(&mut conn);

        let mut input = resident("Ana", "Reyes", "1990-02-03");
        input.household_id = Some(household_id.clone());
        let created = create_resident(&mut conn, &input).unwrap();

        let fetched = get_resident(&mut conn, &created.resident.id).unwrap().unwrap();
        assert_eq!(fetched.resident.household_id.as_deref(), Some(household_id.as_str()));
    }

    #[test]
    fn test_unknown_household_rejected() {
        let mut conn = setup();
        let mut input = resident("Ana", "Reyes", "1990-02-03");
        input.household_id = Some("nope".into());
        let err = create_resident(&mut conn, &input).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidInput(_)));
    }

    #[test]
    fn test_resident_without_household() {
        let mut conn = setup();
        let created = create_resident(&mut conn, &resident("Ana", "Reyes", "1990-02-03")).unwrap();
        assert!(created.resident.household_id.is_none());
    }

    #[test]
    fn test_statistics_follow_membership() {
        let mut conn = setup();
        let household_id = household(&mut conn);

        let mut senior = resident("Lola", "Santos", "1940-01-01");
        senior.household_id = Some(household_id.clone());
        senior.is_voter = true;
        senior.sectors = vec![sectors::SENIOR_CITIZEN.into(), sectors::PWD.into()];
        let senior = create_resident(&mut conn, &senior).unwrap();

        let mut child = resident("Bata", "Santos", "2020-01-01");
        child.household_id = Some(household_id.clone());
        create_resident(&mut conn, &child).unwrap();

        let stat = get_statistics(&mut conn, &household_id).unwrap().unwrap();
        assert_eq!(stat.total_members, 2);
        assert_eq!(stat.voter_count, 1);
        assert_eq!(stat.senior_count, 1);
        assert_eq!(stat.minor_count, 1);
        assert_eq!(stat.pwd_count, 1);

        let moved: UpdateResidentInput = serde_json::from_str(r#"{"householdId": null}"#).unwrap();
        let updated = update_resident(&mut conn, &senior.resident.id, &moved).unwrap().unwrap();
        assert!(updated.resident.household_id.is_none());

        let stat = get_statistics(&mut conn, &household_id).unwrap().unwrap();
        assert_eq!(stat.total_members, 1);
        assert_eq!(stat.pwd_count, 0);
    }

    #[test]
    fn test_filter_by_sector_and_search() {
        let mut conn = setup();
        let mut a = resident("Ana", "Reyes", "1990-02-03");
        a.sectors = vec![sectors::SOLO_PARENT.into(), sectors::SOLO_PARENT.into()];
        create_resident(&mut conn, &a).unwrap();
        create_resident(&mut conn, &resident("Ben", "Cruz", "1985-07-09")).unwrap();

        let solo = list_residents(
            &mut conn,
            &ResidentQuery {
                sector: Some(sectors::SOLO_PARENT.into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(solo.len(), 1);
        assert_eq!(solo[0].sectors, vec![sectors::SOLO_PARENT.to_string()]);

        let found = list_residents(
            &mut conn,
            &ResidentQuery {
                search: Some("cru".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].resident.first_name, "Ben");
    }

    #[test]
    fn test_delete_resident() {
        let mut conn = setup();
        let created = create_resident(&mut conn, &resident("Ana", "Reyes", "1990-02-03")).unwrap();
        assert!(delete_resident(&mut conn, &created.resident.id).unwrap());
        assert!(!delete_resident(&mut conn, &created.resident.id).unwrap());
        assert!(get_resident(&mut conn, &created.resident.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_keeps_residents_with_processed_certificates() {
        use crate::db::certificates::{
            create_certificate, list_certificates, update_status, CertificateQuery,
            CreateCertificateInput,
        };
        use crate::db::models::certificate_types;

        let mut conn = setup();
        let created = create_resident(&mut conn, &resident("Ana", "Reyes", "1990-02-03")).unwrap();
        let id = created.resident.id;
        let request = CreateCertificateInput {
            certificate_type: certificate_types::CLEARANCE.into(),
            resident_id: id.clone(),
            purpose: "Employment".into(),
            ..Default::default()
        };
        let certificate = create_certificate(&mut conn, &request, 2024).unwrap();
        update_status(&mut conn, &certificate.id, certificate_statuses::APPROVED).unwrap();
        update_status(&mut conn, &certificate.id, certificate_statuses::RELEASED).unwrap();

        assert!(matches!(
            delete_resident(&mut conn, &id),
            Err(RegistryError::Conflict(_))
        ));
        assert!(get_resident(&mut conn, &id).unwrap().is_some());
        let all = CertificateQuery {
            status_filter: Some("ALL".into()),
            ..Default::default()
        };
        assert_eq!(list_certificates(&mut conn, &all).unwrap().len(), 1);

        let other = create_resident(&mut conn, &resident("Ben", "Cruz", "1985-07-11")).unwrap();
        create_certificate(
            &mut conn,
            &CreateCertificateInput {
                resident_id: other.resident.id.clone(),
                ..request
            },
            2024,
        )
        .unwrap();
        assert!(delete_resident(&mut conn, &other.resident.id).unwrap());
        assert_eq!(list_certificates(&mut conn, &all).unwrap().len(), 1);
    }
}
