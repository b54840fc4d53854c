//! Blotter (incident case) storage
//!
//! Every case carries an append-only trail in `blotter_status_updates`. The
//! first entry is always PENDING (written with the case) and every status
//! change appends an entry, so the latest entry always matches the case.

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use serde::Deserialize;

use super::diesel_schema::{blotter_cases, blotter_hearings, blotter_parties, blotter_status_updates};
use super::models::{
    blotter_priorities, blotter_statuses, current_timestamp, double_option, hearing_statuses,
    BlotterCase, BlotterCaseChanges, BlotterHearing, BlotterHearingChanges, BlotterParty,
    BlotterStatusUpdate, NewBlotterCase, NewBlotterHearing, NewBlotterParty,
    NewBlotterStatusUpdate,
};
use super::{like_pattern, new_id, next_sequence};
use crate::error::RegistryError;

/// Case with all of its child rows
#[derive(Debug, Clone)]
pub struct CaseDetail {
    pub case: BlotterCase,
    pub parties: Vec<BlotterParty>,
    pub hearings: Vec<BlotterHearing>,
    pub updates: Vec<BlotterStatusUpdate>,
}

// ============================================================================
// Input Types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartyInput {
    pub party_type: String,
    #[serde(default)]
    pub resident_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub statement: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaseInput {
    pub incident_type: String,
    pub incident_date: String,
    pub incident_location: String,
    pub description: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub reported_by: Option<String>,
    #[serde(default)]
    pub parties: Vec<CreatePartyInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaseInput {
    #[serde(default)]
    pub incident_type: Option<String>,
    #[serde(default)]
    pub incident_date: Option<String>,
    #[serde(default)]
    pub incident_location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub resolution: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeInput {
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Stored on the case when the new status is RESOLVED
    #[serde(default)]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleHearingInput {
    pub scheduled_at: String,
    pub location: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHearingInput {
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub incident_type: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

// ============================================================================
// Case Numbers
// ============================================================================

/// Next case number for `year`: `BLT-YYYY-NNNN`
pub fn next_case_number(conn: &mut SqliteConnection, year: i32) -> Result<String, RegistryError> {
    let prefix = format!("BLT-{}-", year);
    let existing: Vec<String> = blotter_cases::table
        .filter(blotter_cases::case_number.like(format!("{}%", prefix)))
        .select(blotter_cases::case_number)
        .load(conn)?;

    let next = next_sequence(&prefix, &existing);

    Ok(format!("{}{:04}", prefix, next))
}

// ============================================================================
// Cases
// ============================================================================

/// File a new case: PENDING status, first trail entry and initial parties
pub fn create_case(
    conn: &mut SqliteConnection,
    input: &CreateCaseInput,
    year: i32,
    filed_by: Option<&str>,
) -> Result<CaseDetail, RegistryError> {
    conn.transaction(|conn| {
        let id = new_id();
        let now = current_timestamp();
        let case_number = next_case_number(conn, year)?;

        let new_case = NewBlotterCase {
            id: &id,
            case_number: &case_number,
            incident_type: input.incident_type.trim(),
            incident_date: &input.incident_date,
            incident_location: input.incident_location.trim(),
            description: &input.description,
            status: blotter_statuses::PENDING,
            priority: input.priority.as_deref().unwrap_or(blotter_priorities::MEDIUM),
            reported_by: input.reported_by.as_deref(),
            created_at: &now,
            updated_at: &now,
        };
        diesel::insert_into(blotter_cases::table)
            .values(&new_case)
            .execute(conn)?;

        append_status_update(conn, &id, blotter_statuses::PENDING, Some("Case filed"), filed_by)?;

        for party in &input.parties {
            add_party(conn, &id, party)?;
        }

        get_case_detail(conn, &id)?
            .ok_or_else(|| RegistryError::Internal("Case vanished after insert".into()))
    })
}

pub fn get_case(conn: &mut SqliteConnection, id: &str) -> Result<Option<BlotterCase>, RegistryError> {
    blotter_cases::table.find(id).first(conn).optional().map_err(Into::into)
}

pub fn get_case_detail(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<CaseDetail>, RegistryError> {
    let Some(case) = get_case(conn, id)? else {
        return Ok(None);
    };
    let parties = list_parties(conn, id)?;
    let hearings = list_hearings(conn, id)?;
    let updates = list_status_updates(conn, id)?;
    Ok(Some(CaseDetail {
        case,
        parties,
        hearings,
        updates,
    }))
}

pub fn list_cases(
    conn: &mut SqliteConnection,
    query: &CaseQuery,
) -> Result<Vec<BlotterCase>, RegistryError> {
    let mut q = blotter_cases::table.into_boxed();

    if let Some(ref status) = query.status {
        q = q.filter(blotter_cases::status.eq(status));
    }
    if let Some(ref priority) = query.priority {
        q = q.filter(blotter_cases::priority.eq(priority));
    }
    if let Some(ref incident_type) = query.incident_type {
        q = q.filter(blotter_cases::incident_type.eq(incident_type));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        let by_party = blotter_parties::table
            .filter(blotter_parties::name.like(pattern.clone()).escape('\\'))
            .select(blotter_parties::case_id);
        q = q.filter(
            blotter_cases::case_number
                .like(pattern.clone())
                .escape('\\')
                .or(blotter_cases::incident_type.like(pattern.clone()).escape('\\'))
                .or(blotter_cases::incident_location.like(pattern).escape('\\'))
                .or(blotter_cases::id.eq_any(by_party)),
        );
    }

    q.order(blotter_cases::created_at.desc())
        .then_order_by(blotter_cases::case_number.desc())
        .load(conn)
        .map_err(Into::into)
}

pub fn update_case(
    conn: &mut SqliteConnection,
    id: &str,
    input: &UpdateCaseInput,
) -> Result<Option<BlotterCase>, RegistryError> {
    let now = current_timestamp();
    let changes = BlotterCaseChanges {
        incident_type: input.incident_type.as_deref(),
        incident_date: input.incident_date.as_deref(),
        incident_location: input.incident_location.as_deref(),
        description: input.description.as_deref(),
        priority: input.priority.as_deref(),
        resolution: input.resolution.as_ref().map(|v| v.as_deref()),
        updated_at: Some(&now),
    };

    let updated = diesel::update(blotter_cases::table.find(id))
        .set(&changes)
        .execute(conn)?;
    if updated == 0 {
        return Ok(None);
    }
    get_case(conn, id)
}

/// Change case status and append to the trail
///
/// Re-applying the current status is a no-op. RESOLVED stamps `resolved_at`.
pub fn update_status(
    conn: &mut SqliteConnection,
    id: &str,
    change: &StatusChangeInput,
    updated_by: Option<&str>,
) -> Result<Option<BlotterCase>, RegistryError> {
    conn.transaction(|conn| {
        let Some(current) = get_case(conn, id)? else {
            return Ok(None);
        };
        let status = change.status.as_str();

        if current.status == status {
            return Ok(Some(current));
        }
        if !blotter_statuses::can_transition(&current.status, status) {
            return Err(RegistryError::InvalidTransition {
                entity: "blotter case",
                from: current.status,
                to: status.to_string(),
            });
        }

        let now = current_timestamp();
        let resolved = status == blotter_statuses::RESOLVED;
        let resolved_at = resolved.then_some(now.as_str());
        let resolution = if resolved {
            change.resolution.as_deref().or(current.resolution.as_deref())
        } else {
            current.resolution.as_deref()
        };

        diesel::update(blotter_cases::table.find(id))
            .set((
                blotter_cases::status.eq(status),
                blotter_cases::resolved_at.eq(resolved_at),
                blotter_cases::resolution.eq(resolution),
                blotter_cases::updated_at.eq(&now),
            ))
            .execute(conn)?;

        append_status_update(conn, id, status, change.notes.as_deref(), updated_by)?;

        get_case(conn, id)
    })
}

pub fn delete_case(conn: &mut SqliteConnection, id: &str) -> Result<bool, RegistryError> {
    let deleted = diesel::delete(blotter_cases::table.find(id)).execute(conn)?;
    Ok(deleted > 0)
}

// ============================================================================
// Status Trail
// ============================================================================

fn append_status_update(
    conn: &mut SqliteConnection,
    case_id: &str,
    status: &str,
    notes: Option<&str>,
    updated_by: Option<&str>,
) -> Result<(), RegistryError> {
    let id = new_id();
    let now = current_timestamp();
    let update = NewBlotterStatusUpdate {
        id: &id,
        case_id,
        status,
        notes,
        updated_by,
        created_at: &now,
    };
    diesel::insert_into(blotter_status_updates::table)
        .values(&update)
        .execute(conn)?;
    Ok(())
}

/// Trail in append order
pub fn list_status_updates(
    conn: &mut SqliteConnection,
    case_id: &str,
) -> Result<Vec<BlotterStatusUpdate>, RegistryError> {
    blotter_status_updates::table
        .filter(blotter_status_updates::case_id.eq(case_id))
        .order((
            blotter_status_updates::created_at.asc(),
            sql::<BigInt>("rowid").asc(),
        ))
        .load(conn)
        .map_err(Into::into)
}

// ============================================================================
// Parties
// ============================================================================

pub fn add_party(
    conn: &mut SqliteConnection,
    case_id: &str,
    input: &CreatePartyInput,
) -> Result<BlotterParty, RegistryError> {
    let id = new_id();
    let now = current_timestamp();
    let party = NewBlotterParty {
        id: &id,
        case_id,
        party_type: &input.party_type,
        resident_id: input.resident_id.as_deref(),
        name: input.name.trim(),
        contact_number: input.contact_number.as_deref(),
        address: input.address.as_deref(),
        statement: input.statement.as_deref(),
        created_at: &now,
    };
    diesel::insert_into(blotter_parties::table)
        .values(&party)
        .execute(conn)?;
    blotter_parties::table.find(&id).first(conn).map_err(Into::into)
}

pub fn list_parties(
    conn: &mut SqliteConnection,
    case_id: &str,
) -> Result<Vec<BlotterParty>, RegistryError> {
    blotter_parties::table
        .filter(blotter_parties::case_id.eq(case_id))
        .order((blotter_parties::party_type.asc(), blotter_parties::created_at.asc()))
        .load(conn)
        .map_err(Into::into)
}

pub fn remove_party(
    conn: &mut SqliteConnection,
    case_id: &str,
    party_id: &str,
) -> Result<bool, RegistryError> {
    let deleted = diesel::delete(
        blotter_parties::table
            .filter(blotter_parties::id.eq(party_id))
            .filter(blotter_parties::case_id.eq(case_id)),
    )
    .execute(conn)?;
    Ok(deleted > 0)
}

// ============================================================================
// Hearings
// ============================================================================

pub fn schedule_hearing(
    conn: &mut SqliteConnection,
    case_id: &str,
    input: &ScheduleHearingInput,
) -> Result<BlotterHearing, RegistryError> {
    let id = new_id();
    let now = current_timestamp();
    let hearing = NewBlotterHearing {
        id: &id,
        case_id,
        scheduled_at: &input.scheduled_at,
        location: input.location.trim(),
        status: hearing_statuses::SCHEDULED,
        notes: input.notes.as_deref(),
        created_at: &now,
        updated_at: &now,
    };
    diesel::insert_into(blotter_hearings::table)
        .values(&hearing)
        .execute(conn)?;
    blotter_hearings::table.find(&id).first(conn).map_err(Into::into)
}

pub fn list_hearings(
    conn: &mut SqliteConnection,
    case_id: &str,
) -> Result<Vec<BlotterHearing>, RegistryError> {
    blotter_hearings::table
        .filter(blotter_hearings::case_id.eq(case_id))
        .order(blotter_hearings::scheduled_at.asc())
        .load(conn)
        .map_err(Into::into)
}

pub fn update_hearing(
    conn: &mut SqliteConnection,
    case_id: &str,
    hearing_id: &str,
    input: &UpdateHearingInput,
) -> Result<Option<BlotterHearing>, RegistryError> {
    let now = current_timestamp();
    let changes = BlotterHearingChanges {
        scheduled_at: input.scheduled_at.as_deref(),
        location: input.location.as_deref(),
        status: input.status.as_deref(),
        notes: input.notes.as_ref().map(|v| v.as_deref()),
        updated_at: Some(&now),
    };

    let target = blotter_hearings::table
        .filter(blotter_hearings::id.eq(hearing_id))
        .filter(blotter_hearings::case_id.eq(case_id));
    let updated = diesel::update(target).set(&changes).execute(conn)?;
    if updated == 0 {
        return Ok(None);
    }
    blotter_hearings::table
        .find(hearing_id)
        .first(conn)
        .optional()
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::party_types;
    use crate::db::test_conn as setup;

    fn file(conn: &mut SqliteConnection) -> CaseDetail {
        create_case(
            conn,
            &CreateCaseInput {
                incident_type: "Noise Complaint".into(),
                incident_date: "2024-03-01".into(),
                incident_location: "Purok 2".into(),
                description: "Loud karaoke past midnight".into(),
                parties: vec![
                    CreatePartyInput {
                        party_type: party_types::COMPLAINANT.into(),
                        name: "Maria Santos".into(),
                        ..Default::default()
                    },
                    CreatePartyInput {
                        party_type: party_types::RESPONDENT.into(),
                        name: "Pedro Reyes".into(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            2024,
            None,
        )
        .unwrap()
    }

    fn change(status: &str) -> StatusChangeInput {
        StatusChangeInput {
            status: status.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_case_numbers_and_initial_trail() {
        let mut conn = setup();
        let first = file(&mut conn);
        let second = file(&mut conn);

        assert_eq!(first.case.case_number, "BLT-2024-0001");
        assert_eq!(second.case.case_number, "BLT-2024-0002");
        assert_eq!(first.case.status, blotter_statuses::PENDING);
        assert_eq!(first.case.priority, blotter_priorities::MEDIUM);
        assert_eq!(first.parties.len(), 2);
        assert_eq!(first.updates.len(), 1);
        assert_eq!(first.updates[0].status, blotter_statuses::PENDING);
    }

    #[test]
    fn test_case_numbers_continue_past_padding() {
        let mut conn = setup();
        let first = file(&mut conn);
        diesel::update(blotter_cases::table.find(first.case.id.as_str()))
            .set(blotter_cases::case_number.eq("BLT-2024-9999"))
            .execute(&mut conn)
            .unwrap();

        assert_eq!(file(&mut conn).case.case_number, "BLT-2024-10000");
        assert_eq!(file(&mut conn).case.case_number, "BLT-2024-10001");
    }

    #[test]
    fn test_trail_first_pending_last_current() {
        let mut conn = setup();
        let detail = file(&mut conn);
        let id = detail.case.id;

        update_status(&mut conn, &id, &change(blotter_statuses::ONGOING), None).unwrap();
        update_status(&mut conn, &id, &change(blotter_statuses::ESCALATED), None).unwrap();
        let resolved = update_status(
            &mut conn,
            &id,
            &StatusChangeInput {
                status: blotter_statuses::RESOLVED.into(),
                resolution: Some("Amicable settlement".into()),
                ..Default::default()
            },
            None,
        )
        .unwrap()
        .unwrap();

        assert!(resolved.resolved_at.is_some());
        assert_eq!(resolved.resolution.as_deref(), Some("Amicable settlement"));

        let updates = list_status_updates(&mut conn, &id).unwrap();
        assert_eq!(updates.len(), 4);
        assert_eq!(updates.first().unwrap().status, blotter_statuses::PENDING);
        assert_eq!(updates.last().unwrap().status, resolved.status);
    }

    #[test]
    fn test_resolved_is_terminal() {
        let mut conn = setup();
        let id = file(&mut conn).case.id;
        update_status(&mut conn, &id, &change(blotter_statuses::RESOLVED), None).unwrap();

        let err = update_status(&mut conn, &id, &change(blotter_statuses::ONGOING), None).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));
        assert_eq!(list_status_updates(&mut conn, &id).unwrap().len(), 2);
    }

    #[test]
    fn test_hearings_and_parties() {
        let mut conn = setup();
        let detail = file(&mut conn);
        let id = detail.case.id.clone();

        let hearing = schedule_hearing(
            &mut conn,
            &id,
            &ScheduleHearingInput {
                scheduled_at: "2024-03-10T09:00:00Z".into(),
                location: "Barangay Hall".into(),
                notes: None,
            },
        )
        .unwrap();
        assert_eq!(hearing.status, hearing_statuses::SCHEDULED);

        let done = update_hearing(
            &mut conn,
            &id,
            &hearing.id,
            &UpdateHearingInput {
                status: Some(hearing_statuses::COMPLETED.into()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(done.status, hearing_statuses::COMPLETED);
        assert!(update_hearing(&mut conn, "other-case", &hearing.id, &UpdateHearingInput::default())
            .unwrap()
            .is_none());

        let party_id = detail.parties[0].id.clone();
        assert!(remove_party(&mut conn, &id, &party_id).unwrap());
        assert_eq!(list_parties(&mut conn, &id).unwrap().len(), 1);
    }

    #[test]
    fn test_search_by_party_name_and_delete_cascades() {
        let mut conn = setup();
        let detail = file(&mut conn);

        let found = list_cases(
            &mut conn,
            &CaseQuery {
                search: Some("pedro".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(found.len(), 1);

        assert!(delete_case(&mut conn, &detail.case.id).unwrap());
        assert!(list_parties(&mut conn, &detail.case.id).unwrap().is_empty());
        assert!(list_status_updates(&mut conn, &detail.case.id).unwrap().is_empty());
    }
}
