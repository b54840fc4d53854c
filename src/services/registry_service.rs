//! Households, residents and officials
//!
//! Address fields a household omits (barangay, city, province) are filled
//! from the configured barangay identity.

use std::sync::Arc;

use crate::config::Config;
use crate::db::households::{self, CreateHouseholdInput, HouseholdQuery, UpdateHouseholdInput};
use crate::db::models::{
    civil_statuses, genders, household_statuses, household_types, resident_statuses, sectors,
    Household, HouseholdStatistic, Official,
};
use crate::db::officials::{self, CreateOfficialInput, UpdateOfficialInput};
use crate::db::residents::{
    self, CreateResidentInput, ResidentQuery, ResidentWithSectors, UpdateResidentInput,
};
use crate::db::Database;
use crate::error::RegistryError;
use crate::views::{HouseholdDetailView, ResidentView};

use super::events::{EventBus, RegistryEvent};
use super::validation::{self, optional};

pub struct RegistryService {
    db: Arc<Database>,
    events: Arc<EventBus>,
    config: Arc<Config>,
}

impl RegistryService {
    pub fn new(db: Arc<Database>, events: Arc<EventBus>, config: Arc<Config>) -> Self {
        Self { db, events, config }
    }

    // =========================================================================
    // Households
    // =========================================================================

    pub fn create_household(&self, input: &CreateHouseholdInput) -> Result<Household, RegistryError> {
        validate_household_create(input)?;

        let mut input = input.clone();
        fill_blank(&mut input.barangay, &self.config.barangay_name);
        fill_blank(&mut input.city, &self.config.municipality);
        fill_blank(&mut input.province, &self.config.province);

        let household = self.db.with_conn(|conn| households::create_household(conn, &input))?;
        self.events.emit(RegistryEvent::HouseholdCreated {
            id: household.id.clone(),
            street: household.street.clone(),
        });
        Ok(household)
    }

    pub fn get_household(&self, id: &str) -> Result<Option<Household>, RegistryError> {
        self.db.with_conn(|conn| households::get_household(conn, id))
    }

    /// Household with statistics and current members
    pub fn household_detail(&self, id: &str) -> Result<Option<HouseholdDetailView>, RegistryError> {
        self.db.with_conn(|conn| {
            let Some(household) = households::get_household(conn, id)? else {
                return Ok(None);
            };
            let statistics = households::get_statistics(conn, id)?;
            let members = residents::list_household_members(conn, id)?;
            Ok(Some(HouseholdDetailView {
                household: household.into(),
                statistics: statistics.map(Into::into),
                members: members.into_iter().map(ResidentView::from).collect(),
            }))
        })
    }

    pub fn list_households(&self, query: &HouseholdQuery) -> Result<Vec<Household>, RegistryError> {
        self.db.with_conn(|conn| households::list_households(conn, query))
    }

    pub fn update_household(
        &self,
        id: &str,
        input: &UpdateHouseholdInput,
    ) -> Result<Option<Household>, RegistryError> {
        validate_household_update(input)?;
        let household = self.db.with_conn(|conn| households::update_household(conn, id, input))?;
        if household.is_some() {
            self.events.emit(RegistryEvent::HouseholdUpdated { id: id.to_string() });
        }
        Ok(household)
    }

    /// Households are archived instead of deleted; members keep their link
    pub fn archive_household(&self, id: &str) -> Result<Option<Household>, RegistryError> {
        let household = self.db.with_conn(|conn| households::archive_household(conn, id))?;
        if household.is_some() {
            self.events.emit(RegistryEvent::HouseholdArchived { id: id.to_string() });
        }
        Ok(household)
    }

    pub fn household_members(&self, id: &str) -> Result<Option<Vec<ResidentWithSectors>>, RegistryError> {
        self.db.with_conn(|conn| {
            if !households::household_exists(conn, id)? {
                return Ok(None);
            }
            residents::list_household_members(conn, id).map(Some)
        })
    }

    /// Stored statistics; computed on the spot if the row is missing
    pub fn household_statistics(&self, id: &str) -> Result<Option<HouseholdStatistic>, RegistryError> {
        self.db.with_conn(|conn| {
            if !households::household_exists(conn, id)? {
                return Ok(None);
            }
            match households::get_statistics(conn, id)? {
                Some(stats) => Ok(Some(stats)),
                None => households::recompute_statistics(conn, id).map(Some),
            }
        })
    }

    // =========================================================================
    // Residents
    // =========================================================================

    pub fn create_resident(&self, input: &CreateResidentInput) -> Result<ResidentWithSectors, RegistryError> {
        validate_resident_create(input)?;
        let created = self.db.with_conn(|conn| residents::create_resident(conn, input))?;
        self.events.emit(RegistryEvent::ResidentCreated {
            id: created.resident.id.clone(),
            household_id: created.resident.household_id.clone(),
        });
        Ok(created)
    }

    pub fn get_resident(&self, id: &str) -> Result<Option<ResidentWithSectors>, RegistryError> {
        self.db.with_conn(|conn| residents::get_resident(conn, id))
    }

    pub fn list_residents(&self, query: &ResidentQuery) -> Result<Vec<ResidentWithSectors>, RegistryError> {
        optional(query.sort_by.as_deref(), |s| {
            validation::one_of(
                "sortBy",
                s,
                &[
                    residents::sort_keys::NAME,
                    residents::sort_keys::BIRTH_DATE,
                    residents::sort_keys::CREATED_AT,
                ],
            )
        })?;
        self.db.with_conn(|conn| residents::list_residents(conn, query))
    }

    pub fn update_resident(
        &self,
        id: &str,
        input: &UpdateResidentInput,
    ) -> Result<Option<ResidentWithSectors>, RegistryError> {
        validate_resident_update(input)?;
        let updated = self.db.with_conn(|conn| residents::update_resident(conn, id, input))?;
        if updated.is_some() {
            self.events.emit(RegistryEvent::ResidentUpdated { id: id.to_string() });
        }
        Ok(updated)
    }

    pub fn delete_resident(&self, id: &str) -> Result<bool, RegistryError> {
        let deleted = self.db.with_conn(|conn| residents::delete_resident(conn, id))?;
        if deleted {
            self.events.emit(RegistryEvent::ResidentDeleted { id: id.to_string() });
        }
        Ok(deleted)
    }

    // =========================================================================
    // Officials
    // =========================================================================

    pub fn create_official(&self, input: &CreateOfficialInput) -> Result<Official, RegistryError> {
        validation::required("name", &input.name)?;
        validation::required("position", &input.position)?;
        validate_term(input.term_start.as_deref(), input.term_end.as_deref())?;

        let official = self.db.with_conn(|conn| officials::create_official(conn, input))?;
        self.events.emit(RegistryEvent::OfficialSaved {
            id: official.id.clone(),
            position: official.position.clone(),
        });
        Ok(official)
    }

    pub fn list_officials(&self, active_only: bool) -> Result<Vec<Official>, RegistryError> {
        self.db.with_conn(|conn| officials::list_officials(conn, active_only))
    }

    pub fn update_official(
        &self,
        id: &str,
        input: &UpdateOfficialInput,
    ) -> Result<Option<Official>, RegistryError> {
        optional(input.name.as_deref(), |v| validation::required("name", v))?;
        optional(input.position.as_deref(), |v| validation::required("position", v))?;
        validate_term(
            input.term_start.as_ref().and_then(|v| v.as_deref()),
            input.term_end.as_ref().and_then(|v| v.as_deref()),
        )?;

        let official = self.db.with_conn(|conn| officials::update_official(conn, id, input))?;
        if let Some(ref official) = official {
            self.events.emit(RegistryEvent::OfficialSaved {
                id: official.id.clone(),
                position: official.position.clone(),
            });
        }
        Ok(official)
    }
}

fn fill_blank(field: &mut Option<String>, default: &str) {
    if field.as_deref().map_or(true, |v| v.trim().is_empty()) {
        *field = Some(default.to_string());
    }
}

fn validate_household_create(input: &CreateHouseholdInput) -> Result<(), RegistryError> {
    validation::required("street", &input.street)?;
    validation::max_len("street", &input.street, 200)?;
    optional(input.household_type.as_deref(), |t| {
        validation::one_of("householdType", t, &household_types::ALL)
    })?;
    validate_coordinates(input.latitude, input.longitude)?;
    optional(input.monthly_income.as_ref(), |v| validation::non_negative("monthlyIncome", *v))
}

fn validate_household_update(input: &UpdateHouseholdInput) -> Result<(), RegistryError> {
    optional(input.street.as_deref(), |v| validation::required("street", v))?;
    optional(input.household_type.as_deref(), |t| {
        validation::one_of("householdType", t, &household_types::ALL)
    })?;
    optional(input.status.as_deref(), |s| {
        validation::one_of("status", s, &household_statuses::ALL)
    })?;
    validate_coordinates(input.latitude.flatten(), input.longitude.flatten())?;
    optional(input.monthly_income.flatten().as_ref(), |v| {
        validation::non_negative("monthlyIncome", *v)
    })
}

fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), RegistryError> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(RegistryError::InvalidInput("latitude must be between -90 and 90".into()));
        }
    }
    if let Some(lng) = longitude {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(RegistryError::InvalidInput(
                "longitude must be between -180 and 180".into(),
            ));
        }
    }
    Ok(())
}

fn validate_birth_date(value: &str) -> Result<(), RegistryError> {
    let born = validation::date("birthDate", value)?;
    if born > chrono::Utc::now().date_naive() {
        return Err(RegistryError::InvalidInput("birthDate cannot be in the future".into()));
    }
    Ok(())
}

fn validate_sectors(values: &[String]) -> Result<(), RegistryError> {
    for sector in values {
        validation::one_of("sectors", sector, &sectors::ALL)?;
    }
    Ok(())
}

fn validate_resident_create(input: &CreateResidentInput) -> Result<(), RegistryError> {
    validation::required("firstName", &input.first_name)?;
    validation::required("lastName", &input.last_name)?;
    validation::max_len("firstName", &input.first_name, 100)?;
    validation::max_len("lastName", &input.last_name, 100)?;
    validate_birth_date(&input.birth_date)?;
    validation::one_of("gender", &input.gender, &genders::ALL)?;
    validation::one_of("civilStatus", &input.civil_status, &civil_statuses::ALL)?;
    optional(input.status.as_deref(), |s| {
        validation::one_of("status", s, &resident_statuses::ALL)
    })?;
    optional(input.email.as_deref(), |v| validation::email("email", v))?;
    optional(input.contact_number.as_deref(), |v| validation::phone("contactNumber", v))?;
    validate_sectors(&input.sectors)
}

fn validate_resident_update(input: &UpdateResidentInput) -> Result<(), RegistryError> {
    optional(input.first_name.as_deref(), |v| validation::required("firstName", v))?;
    optional(input.last_name.as_deref(), |v| validation::required("lastName", v))?;
    optional(input.birth_date.as_deref(), validate_birth_date)?;
    optional(input.gender.as_deref(), |v| validation::one_of("gender", v, &genders::ALL))?;
    optional(input.civil_status.as_deref(), |v| {
        validation::one_of("civilStatus", v, &civil_statuses::ALL)
    })?;
    optional(input.status.as_deref(), |s| {
        validation::one_of("status", s, &resident_statuses::ALL)
    })?;
    optional(input.email.as_ref().and_then(|v| v.as_deref()), |v| {
        validation::email("email", v)
    })?;
    optional(input.contact_number.as_ref().and_then(|v| v.as_deref()), |v| {
        validation::phone("contactNumber", v)
    })?;
    optional(input.sectors.as_deref(), validate_sectors)
}

fn validate_term(start: Option<&str>, end: Option<&str>) -> Result<(), RegistryError> {
    let start = start.map(|v| validation::date("termStart", v)).transpose()?;
    let end = end.map(|v| validation::date("termEnd", v)).transpose()?;
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(RegistryError::InvalidInput("termEnd must not precede termStart".into()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> RegistryService {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let config = Config {
            barangay_name: "Barangay Malinis".into(),
            municipality: "San Pablo".into(),
            province: "Laguna".into(),
            ..Config::default()
        };
        RegistryService::new(db, Arc::new(EventBus::new()), Arc::new(config))
    }

    fn resident(household_id: Option<String>) -> CreateResidentInput {
        CreateResidentInput {
            first_name: "Maria".into(),
            last_name: "Santos".into(),
            birth_date: "1950-03-10".into(),
            gender: genders::FEMALE.into(),
            civil_status: civil_statuses::WIDOWED.into(),
            household_id,
            is_voter: true,
            sectors: vec![sectors::SENIOR_CITIZEN.into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_household_defaults_to_configured_locality() {
        let svc = service();
        let household = svc
            .create_household(&CreateHouseholdInput {
                street: "Mabini St.".into(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(household.barangay, "Barangay Malinis");
        assert_eq!(household.city, "San Pablo");
        assert_eq!(household.province, "Laguna");
    }

    #[test]
    fn test_household_detail_includes_members_and_statistics() {
        let svc = service();
        let household = svc
            .create_household(&CreateHouseholdInput {
                street: "Mabini St.".into(),
                ..Default::default()
            })
            .unwrap();
        svc.create_resident(&resident(Some(household.id.clone()))).unwrap();

        let detail = svc.household_detail(&household.id).unwrap().unwrap();
        assert_eq!(detail.members.len(), 1);
        let stats = detail.statistics.unwrap();
        assert_eq!(stats.total_members, 1);
        assert_eq!(stats.senior_count, 1);
        assert_eq!(stats.voter_count, 1);
    }

    #[test]
    fn test_resident_validation() {
        let svc = service();
        let bad_email = CreateResidentInput {
            email: Some("maria-at-example".into()),
            ..resident(None)
        };
        assert!(matches!(svc.create_resident(&bad_email), Err(RegistryError::InvalidInput(_))));

        let bad_phone = CreateResidentInput {
            contact_number: Some("555".into()),
            ..resident(None)
        };
        assert!(matches!(svc.create_resident(&bad_phone), Err(RegistryError::InvalidInput(_))));

        let bad_sector = CreateResidentInput {
            sectors: vec!["ASTRONAUT".into()],
            ..resident(None)
        };
        assert!(matches!(svc.create_resident(&bad_sector), Err(RegistryError::InvalidInput(_))));

        let future = CreateResidentInput {
            birth_date: "2999-01-01".into(),
            ..resident(None)
        };
        assert!(matches!(svc.create_resident(&future), Err(RegistryError::InvalidInput(_))));

        let unknown_household = resident(Some("missing".into()));
        assert!(matches!(
            svc.create_resident(&unknown_household),
            Err(RegistryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_official_term_order() {
        let svc = service();
        let err = svc
            .create_official(&CreateOfficialInput {
                name: "Jose Rizal".into(),
                position: "Punong Barangay".into(),
                term_start: Some("2023-11-30".into()),
                term_end: Some("2020-11-30".into()),
                is_active: true,
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidInput(_)));
    }
}
