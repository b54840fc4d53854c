//! Blotter cases: filing, status workflow, parties and hearings

use std::sync::Arc;

use chrono::Datelike;

use crate::db::blotter::{
    self, CaseDetail, CaseQuery, CreateCaseInput, CreatePartyInput, ScheduleHearingInput,
    StatusChangeInput, UpdateCaseInput, UpdateHearingInput,
};
use crate::db::models::{
    blotter_priorities, blotter_statuses, hearing_statuses, party_types, BlotterCase,
    BlotterHearing, BlotterParty, BlotterStatusUpdate,
};
use crate::db::Database;
use crate::error::RegistryError;

use super::events::{EventBus, RegistryEvent};
use super::validation::{self, optional};

pub struct BlotterService {
    db: Arc<Database>,
    events: Arc<EventBus>,
}

impl BlotterService {
    pub fn new(db: Arc<Database>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// File a case with its initial parties
    pub fn create_case(
        &self,
        input: &CreateCaseInput,
        filed_by: Option<&str>,
    ) -> Result<CaseDetail, RegistryError> {
        validation::required("incidentType", &input.incident_type)?;
        validation::date_or_datetime("incidentDate", &input.incident_date)?;
        validation::required("incidentLocation", &input.incident_location)?;
        validation::required("description", &input.description)?;
        optional(input.priority.as_deref(), |p| {
            validation::one_of("priority", p, &blotter_priorities::ALL)
        })?;
        for party in &input.parties {
            validate_party(party)?;
        }

        let year = chrono::Utc::now().year();
        let detail = self
            .db
            .with_conn(|conn| blotter::create_case(conn, input, year, filed_by))?;
        self.events.emit(RegistryEvent::CaseFiled {
            id: detail.case.id.clone(),
            case_number: detail.case.case_number.clone(),
        });
        Ok(detail)
    }

    pub fn get_case(&self, id: &str) -> Result<Option<CaseDetail>, RegistryError> {
        self.db.with_conn(|conn| blotter::get_case_detail(conn, id))
    }

    pub fn list_cases(&self, query: &CaseQuery) -> Result<Vec<BlotterCase>, RegistryError> {
        optional(query.status.as_deref(), |s| {
            validation::one_of("status", s, &blotter_statuses::ALL)
        })?;
        optional(query.priority.as_deref(), |p| {
            validation::one_of("priority", p, &blotter_priorities::ALL)
        })?;
        self.db.with_conn(|conn| blotter::list_cases(conn, query))
    }

    pub fn update_case(&self, id: &str, input: &UpdateCaseInput) -> Result<Option<BlotterCase>, RegistryError> {
        optional(input.incident_type.as_deref(), |v| validation::required("incidentType", v))?;
        optional(input.incident_date.as_deref(), |v| {
            validation::date_or_datetime("incidentDate", v)
        })?;
        optional(input.incident_location.as_deref(), |v| {
            validation::required("incidentLocation", v)
        })?;
        optional(input.description.as_deref(), |v| validation::required("description", v))?;
        optional(input.priority.as_deref(), |p| {
            validation::one_of("priority", p, &blotter_priorities::ALL)
        })?;

        let case = self.db.with_conn(|conn| blotter::update_case(conn, id, input))?;
        if case.is_some() {
            self.events.emit(RegistryEvent::CaseUpdated { id: id.to_string() });
        }
        Ok(case)
    }

    /// Change status and append to the case trail
    pub fn update_status(
        &self,
        id: &str,
        change: &StatusChangeInput,
        updated_by: Option<&str>,
    ) -> Result<Option<BlotterCase>, RegistryError> {
        validation::one_of("status", &change.status, &blotter_statuses::ALL)?;
        if change.status == blotter_statuses::RESOLVED {
            optional(change.resolution.as_deref(), |v| validation::required("resolution", v))?;
        }

        let (previous, case) = self.db.with_conn(|conn| {
            let Some(previous) = blotter::get_case(conn, id)? else {
                return Ok((None, None));
            };
            let case = blotter::update_status(conn, id, change, updated_by)?;
            Ok((Some(previous.status), case))
        })?;

        if let (Some(from), Some(case)) = (previous, case.as_ref()) {
            if from != case.status {
                self.events.emit(RegistryEvent::CaseStatusChanged {
                    id: id.to_string(),
                    from,
                    to: case.status.clone(),
                });
            }
        }
        Ok(case)
    }

    pub fn delete_case(&self, id: &str) -> Result<bool, RegistryError> {
        let deleted = self.db.with_conn(|conn| blotter::delete_case(conn, id))?;
        if deleted {
            self.events.emit(RegistryEvent::CaseDeleted { id: id.to_string() });
        }
        Ok(deleted)
    }

    pub fn status_updates(&self, case_id: &str) -> Result<Option<Vec<BlotterStatusUpdate>>, RegistryError> {
        self.db.with_conn(|conn| {
            if blotter::get_case(conn, case_id)?.is_none() {
                return Ok(None);
            }
            blotter::list_status_updates(conn, case_id).map(Some)
        })
    }

    // =========================================================================
    // Parties
    // =========================================================================

    pub fn add_party(
        &self,
        case_id: &str,
        input: &CreatePartyInput,
    ) -> Result<Option<BlotterParty>, RegistryError> {
        validate_party(input)?;
        self.db.with_conn(|conn| {
            if blotter::get_case(conn, case_id)?.is_none() {
                return Ok(None);
            }
            blotter::add_party(conn, case_id, input).map(Some)
        })
    }

    pub fn list_parties(&self, case_id: &str) -> Result<Option<Vec<BlotterParty>>, RegistryError> {
        self.db.with_conn(|conn| {
            if blotter::get_case(conn, case_id)?.is_none() {
                return Ok(None);
            }
            blotter::list_parties(conn, case_id).map(Some)
        })
    }

    pub fn remove_party(&self, case_id: &str, party_id: &str) -> Result<bool, RegistryError> {
        self.db
            .with_conn(|conn| blotter::remove_party(conn, case_id, party_id))
    }

    // =========================================================================
    // Hearings
    // =========================================================================

    pub fn schedule_hearing(
        &self,
        case_id: &str,
        input: &ScheduleHearingInput,
    ) -> Result<Option<BlotterHearing>, RegistryError> {
        validation::date_or_datetime("scheduledAt", &input.scheduled_at)?;
        validation::required("location", &input.location)?;

        let hearing = self.db.with_conn(|conn| {
            let Some(case) = blotter::get_case(conn, case_id)? else {
                return Ok(None);
            };
            if case.status == blotter_statuses::RESOLVED {
                return Err(RegistryError::Conflict(format!(
                    "Case {} is resolved; no further hearings can be scheduled",
                    case.case_number
                )));
            }
            blotter::schedule_hearing(conn, case_id, input).map(Some)
        })?;

        if let Some(ref hearing) = hearing {
            self.events.emit(RegistryEvent::HearingScheduled {
                id: hearing.id.clone(),
                case_id: case_id.to_string(),
                scheduled_at: hearing.scheduled_at.clone(),
            });
        }
        Ok(hearing)
    }

    pub fn list_hearings(&self, case_id: &str) -> Result<Option<Vec<BlotterHearing>>, RegistryError> {
        self.db.with_conn(|conn| {
            if blotter::get_case(conn, case_id)?.is_none() {
                return Ok(None);
            }
            blotter::list_hearings(conn, case_id).map(Some)
        })
    }

    pub fn update_hearing(
        &self,
        case_id: &str,
        hearing_id: &str,
        input: &UpdateHearingInput,
    ) -> Result<Option<BlotterHearing>, RegistryError> {
        optional(input.scheduled_at.as_deref(), |v| {
            validation::date_or_datetime("scheduledAt", v)
        })?;
        optional(input.location.as_deref(), |v| validation::required("location", v))?;
        optional(input.status.as_deref(), |s| {
            validation::one_of("status", s, &hearing_statuses::ALL)
        })?;
        self.db
            .with_conn(|conn| blotter::update_hearing(conn, case_id, hearing_id, input))
    }
}

fn validate_party(party: &CreatePartyInput) -> Result<(), RegistryError> {
    validation::one_of("partyType", &party.party_type, &party_types::ALL)?;
    validation::required("name", &party.name)?;
    optional(party.contact_number.as_deref(), |v| validation::phone("contactNumber", v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> BlotterService {
        let db = Arc::new(Database::open_in_memory().unwrap());
        BlotterService::new(db, Arc::new(EventBus::new()))
    }

    fn case_input() -> CreateCaseInput {
        CreateCaseInput {
            incident_type: "Noise complaint".into(),
            incident_date: "2024-05-01T22:15".into(),
            incident_location: "Purok 3".into(),
            description: "Karaoke past curfew".into(),
            parties: vec![
                CreatePartyInput {
                    party_type: party_types::COMPLAINANT.into(),
                    name: "Liza Soberano".into(),
                    ..Default::default()
                },
                CreatePartyInput {
                    party_type: party_types::RESPONDENT.into(),
                    name: "Enrique Gil".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    fn change(status: &str) -> StatusChangeInput {
        StatusChangeInput {
            status: status.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_trail_follows_every_change() {
        let svc = service();
        let filed = svc.create_case(&case_input(), Some("desk-officer")).unwrap();
        let id = filed.case.id.clone();
        assert_eq!(filed.parties.len(), 2);

        svc.update_status(&id, &change(blotter_statuses::ONGOING), None).unwrap();
        svc.update_status(&id, &change(blotter_statuses::ESCALATED), None).unwrap();
        let resolved = svc
            .update_status(
                &id,
                &StatusChangeInput {
                    status: blotter_statuses::RESOLVED.into(),
                    resolution: Some("Amicable settlement".into()),
                    notes: None,
                },
                None,
            )
            .unwrap()
            .unwrap();
        assert!(resolved.resolved_at.is_some());

        let trail = svc.status_updates(&id).unwrap().unwrap();
        let statuses: Vec<&str> = trail.iter().map(|u| u.status.as_str()).collect();
        assert_eq!(statuses, ["PENDING", "ONGOING", "ESCALATED", "RESOLVED"]);
        assert_eq!(trail.last().unwrap().status, resolved.status);

        let err = svc
            .update_status(&id, &change(blotter_statuses::ONGOING), None)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));
    }

    #[test]
    fn test_validation() {
        let svc = service();
        let bad_party = CreateCaseInput {
            parties: vec![CreatePartyInput {
                party_type: "BYSTANDER".into(),
                name: "X".into(),
                ..Default::default()
            }],
            ..case_input()
        };
        assert!(matches!(svc.create_case(&bad_party, None), Err(RegistryError::InvalidInput(_))));

        let bad_date = CreateCaseInput {
            incident_date: "yesterday".into(),
            ..case_input()
        };
        assert!(matches!(svc.create_case(&bad_date, None), Err(RegistryError::InvalidInput(_))));
    }

    #[test]
    fn test_hearings_and_parties_on_missing_case() {
        let svc = service();
        let hearing = ScheduleHearingInput {
            scheduled_at: "2024-05-10T09:00".into(),
            location: "Barangay Hall".into(),
            notes: None,
        };
        assert!(svc.schedule_hearing("missing", &hearing).unwrap().is_none());
        assert!(svc.list_parties("missing").unwrap().is_none());

        let filed = svc.create_case(&case_input(), None).unwrap();
        let scheduled = svc.schedule_hearing(&filed.case.id, &hearing).unwrap().unwrap();
        assert_eq!(scheduled.status, hearing_statuses::SCHEDULED);

        svc.update_status(
            &filed.case.id,
            &StatusChangeInput {
                status: blotter_statuses::RESOLVED.into(),
                resolution: Some("Settled".into()),
                notes: None,
            },
            None,
        )
        .unwrap();
        assert!(matches!(
            svc.schedule_hearing(&filed.case.id, &hearing),
            Err(RegistryError::Conflict(_))
        ));
    }
}
