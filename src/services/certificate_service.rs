//! Certificate requests, status workflow, templates and rendering

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::config::Config;
use crate::db::certificate_templates::{
    self, default_html, render_document, CreateTemplateInput, UpdateTemplateInput,
};
use crate::db::certificates::{
    self, CertificateQuery, CertificateWithResident, CreateCertificateInput,
    UpdateCertificateInput, ALL_STATUSES,
};
use crate::db::models::{
    certificate_statuses, certificate_types, Certificate, CertificateTemplate, Official,
};
use crate::db::{households, officials, Database};
use crate::error::RegistryError;

use super::events::{EventBus, RegistryEvent};
use super::validation::{self, optional};

/// Signatory used when a certificate names no official
pub const DEFAULT_SIGNATORY_POSITION: &str = "Punong Barangay";

pub struct CertificateService {
    db: Arc<Database>,
    events: Arc<EventBus>,
    config: Arc<Config>,
}

impl CertificateService {
    pub fn new(db: Arc<Database>, events: Arc<EventBus>, config: Arc<Config>) -> Self {
        Self { db, events, config }
    }

    // =========================================================================
    // Certificates
    // =========================================================================

    /// File a certificate request; it starts PENDING with a fresh control number
    pub fn create(&self, input: &CreateCertificateInput) -> Result<CertificateWithResident, RegistryError> {
        validation::one_of("certificateType", &input.certificate_type, &certificate_types::ALL)?;
        validation::required("residentId", &input.resident_id)?;
        validation::required("purpose", &input.purpose)?;
        validation::max_len("purpose", &input.purpose, 500)?;
        optional(input.fee.as_ref(), |v| validation::non_negative("fee", *v))?;
        if input.certificate_type == certificate_types::BUSINESS_PERMIT {
            validation::required("businessName", input.business_name.as_deref().unwrap_or_default())?;
        }

        let year = chrono::Utc::now().year();
        let created = self.db.with_conn(|conn| {
            let certificate = certificates::create_certificate(conn, input, year)?;
            certificates::get_certificate(conn, &certificate.id)?
                .ok_or_else(|| RegistryError::Internal("Certificate vanished after insert".into()))
        })?;

        self.events.emit(RegistryEvent::CertificateRequested {
            id: created.certificate.id.clone(),
            control_number: created.certificate.control_number.clone(),
            certificate_type: created.certificate.certificate_type.clone(),
        });
        Ok(created)
    }

    pub fn get(&self, id: &str) -> Result<Option<CertificateWithResident>, RegistryError> {
        self.db.with_conn(|conn| certificates::get_certificate(conn, id))
    }

    pub fn list(&self, query: &CertificateQuery) -> Result<Vec<CertificateWithResident>, RegistryError> {
        if let Some(status) = query.status_filter.as_deref().filter(|s| !s.is_empty()) {
            if !status.eq_ignore_ascii_case(ALL_STATUSES) {
                validation::one_of("status", status, &certificate_statuses::ALL)?;
            }
        }
        optional(query.certificate_type.as_deref(), |t| {
            validation::one_of("type", t, &certificate_types::ALL)
        })?;
        self.db.with_conn(|conn| certificates::list_certificates(conn, query))
    }

    pub fn update(
        &self,
        id: &str,
        input: &UpdateCertificateInput,
    ) -> Result<Option<CertificateWithResident>, RegistryError> {
        optional(input.purpose.as_deref(), |v| validation::required("purpose", v))?;
        optional(input.fee.flatten().as_ref(), |v| validation::non_negative("fee", *v))?;

        let updated = self.db.with_conn(|conn| {
            if certificates::update_certificate(conn, id, input)?.is_none() {
                return Ok(None);
            }
            certificates::get_certificate(conn, id)
        })?;
        if updated.is_some() {
            self.events.emit(RegistryEvent::CertificateUpdated { id: id.to_string() });
        }
        Ok(updated)
    }

    /// Move a certificate through PENDING -> APPROVED -> RELEASED (or out to
    /// REJECTED / CANCELLED)
    pub fn update_status(
        &self,
        id: &str,
        status: &str,
    ) -> Result<Option<CertificateWithResident>, RegistryError> {
        validation::one_of("status", status, &certificate_statuses::ALL)?;

        let (previous, updated) = self.db.with_conn(|conn| {
            let previous = certificates::get_certificate(conn, id)?.map(|c| c.certificate.status);
            if previous.is_none() {
                return Ok((None, None));
            }
            certificates::update_status(conn, id, status)?;
            Ok((previous, certificates::get_certificate(conn, id)?))
        })?;

        if let (Some(from), Some(updated)) = (previous, updated.as_ref()) {
            if from != updated.certificate.status {
                self.events.emit(RegistryEvent::CertificateStatusChanged {
                    id: id.to_string(),
                    from,
                    to: updated.certificate.status.clone(),
                });
            }
        }
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<bool, RegistryError> {
        let deleted = self.db.with_conn(|conn| certificates::delete_certificate(conn, id))?;
        if deleted {
            self.events.emit(RegistryEvent::CertificateDeleted { id: id.to_string() });
        }
        Ok(deleted)
    }

    // =========================================================================
    // Templates
    // =========================================================================

    pub fn create_template(&self, input: &CreateTemplateInput) -> Result<CertificateTemplate, RegistryError> {
        validation::one_of("certificateType", &input.certificate_type, &certificate_types::ALL)?;
        validation::required("name", &input.name)?;
        validation::required("htmlContent", &input.html_content)?;

        let template = self
            .db
            .with_conn(|conn| certificate_templates::create_template(conn, input))?;
        self.events.emit(RegistryEvent::TemplateSaved {
            id: template.id.clone(),
            certificate_type: template.certificate_type.clone(),
        });
        Ok(template)
    }

    pub fn get_template(&self, id: &str) -> Result<Option<CertificateTemplate>, RegistryError> {
        self.db.with_conn(|conn| certificate_templates::get_template(conn, id))
    }

    pub fn list_templates(&self, certificate_type: Option<&str>) -> Result<Vec<CertificateTemplate>, RegistryError> {
        optional(certificate_type, |t| {
            validation::one_of("type", t, &certificate_types::ALL)
        })?;
        self.db
            .with_conn(|conn| certificate_templates::list_templates(conn, certificate_type))
    }

    pub fn update_template(
        &self,
        id: &str,
        input: &UpdateTemplateInput,
    ) -> Result<Option<CertificateTemplate>, RegistryError> {
        optional(input.name.as_deref(), |v| validation::required("name", v))?;
        optional(input.html_content.as_deref(), |v| validation::required("htmlContent", v))?;

        let template = self
            .db
            .with_conn(|conn| certificate_templates::update_template(conn, id, input))?;
        if let Some(ref template) = template {
            self.events.emit(RegistryEvent::TemplateSaved {
                id: template.id.clone(),
                certificate_type: template.certificate_type.clone(),
            });
        }
        Ok(template)
    }

    pub fn delete_template(&self, id: &str) -> Result<bool, RegistryError> {
        let deleted = self
            .db
            .with_conn(|conn| certificate_templates::delete_template(conn, id))?;
        if deleted {
            self.events.emit(RegistryEvent::TemplateDeleted { id: id.to_string() });
        }
        Ok(deleted)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Render a certificate as a printable HTML document
    ///
    /// Uses the active template for the certificate's type, or the built-in
    /// body when none is active.
    pub fn render(&self, id: &str) -> Result<Option<String>, RegistryError> {
        self.db.with_conn(|conn| {
            let Some(CertificateWithResident { certificate, resident }) =
                certificates::get_certificate(conn, id)?
            else {
                return Ok(None);
            };

            let template =
                certificate_templates::get_active_for_type(conn, &certificate.certificate_type)?;
            let official = match certificate.official_id.as_deref() {
                Some(official_id) => officials::get_official(conn, official_id)?,
                None => officials::find_active_by_position(conn, DEFAULT_SIGNATORY_POSITION)?,
            };
            let address = match (resident.address.clone(), resident.household_id.as_deref()) {
                (Some(address), _) if !address.trim().is_empty() => address,
                (_, Some(household_id)) => households::get_household(conn, household_id)?
                    .map(|h| {
                        let mut parts: Vec<String> = Vec::new();
                        if let Some(no) = h.house_no.filter(|v| !v.is_empty()) {
                            parts.push(no);
                        }
                        parts.push(h.street);
                        if let Some(purok) = h.purok.filter(|v| !v.is_empty()) {
                            parts.push(format!("Purok {}", purok));
                        }
                        parts.push(h.barangay);
                        parts.push(h.city);
                        parts.join(", ")
                    })
                    .unwrap_or_else(|| self.config.locality_line()),
                _ => self.config.locality_line(),
            };

            debug!(
                id = %certificate.id,
                template = template.as_ref().map(|t| t.name.as_str()).unwrap_or("built-in"),
                "Rendering certificate"
            );

            let values = self.placeholder_values(&certificate, &resident, official.as_ref(), address);
            let title = certificate_types::title(&certificate.certificate_type);
            let html = match template {
                Some(t) => render_document(title, &t.html_content, t.css_content.as_deref(), &values),
                None => render_document(
                    title,
                    &default_html(&certificate.certificate_type),
                    None,
                    &values,
                ),
            };
            Ok(Some(html))
        })
    }

    fn placeholder_values(
        &self,
        certificate: &Certificate,
        resident: &crate::db::models::Resident,
        official: Option<&Official>,
        address: String,
    ) -> HashMap<&'static str, String> {
        let today = chrono::Utc::now().date_naive();
        let issued = certificate
            .issued_date
            .as_deref()
            .and_then(|d| d.get(0..10))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or(today);

        let mut values = HashMap::new();
        values.insert("fullName", resident.full_name());
        values.insert(
            "age",
            resident.age_on(today).map(|a| a.to_string()).unwrap_or_default(),
        );
        values.insert("civilStatus", resident.civil_status.to_lowercase());
        values.insert("address", address);
        values.insert(
            "businessName",
            certificate.business_name.clone().unwrap_or_default(),
        );
        values.insert("province", self.config.province.clone());
        values.insert("municipality", self.config.municipality.clone());
        values.insert("barangayName", self.config.barangay_name.clone());
        values.insert(
            "certificateTitle",
            certificate_types::title(&certificate.certificate_type).to_string(),
        );
        values.insert("purpose", certificate.purpose.clone());
        values.insert("issuedDate", issued.format("%B %-d, %Y").to_string());
        values.insert(
            "officialName",
            official.map(|o| o.name.clone()).unwrap_or_default(),
        );
        values.insert(
            "officialPosition",
            official
                .map(|o| o.position.clone())
                .unwrap_or_else(|| DEFAULT_SIGNATORY_POSITION.to_string()),
        );
        values.insert("controlNumber", certificate.control_number.clone());
        values.insert("orNumber", certificate.or_number.clone().unwrap_or_default());
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{civil_statuses, genders};
    use crate::db::officials::CreateOfficialInput;
    use crate::db::residents::{create_resident, CreateResidentInput};

    fn setup() -> (CertificateService, String) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let resident = db
            .with_conn(|conn| {
                create_resident(
                    conn,
                    &CreateResidentInput {
                        first_name: "Andres".into(),
                        last_name: "Bonifacio".into(),
                        birth_date: "1985-11-30".into(),
                        gender: genders::MALE.into(),
                        civil_status: civil_statuses::MARRIED.into(),
                        address: Some("12 Katipunan Ave".into()),
                        ..Default::default()
                    },
                )
            })
            .unwrap();
        db.with_conn(|conn| {
            officials::create_official(
                conn,
                &CreateOfficialInput {
                    name: "Gregoria de Jesus".into(),
                    position: DEFAULT_SIGNATORY_POSITION.into(),
                    is_active: true,
                    ..Default::default()
                },
            )
        })
        .unwrap();
        let svc = CertificateService::new(db, Arc::new(EventBus::new()), Arc::new(Config::default()));
        (svc, resident.resident.id)
    }

    fn request(resident_id: &str, certificate_type: &str) -> CreateCertificateInput {
        CreateCertificateInput {
            certificate_type: certificate_type.into(),
            resident_id: resident_id.into(),
            purpose: "Employment".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_business_permit_requires_business_name() {
        let (svc, resident_id) = setup();
        let err = svc
            .create(&request(&resident_id, certificate_types::BUSINESS_PERMIT))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidInput(_)));
    }

    #[test]
    fn test_status_workflow_and_events() {
        let (svc, resident_id) = setup();
        let mut events = svc.events.subscribe();
        let created = svc.create(&request(&resident_id, certificate_types::CLEARANCE)).unwrap();
        assert!(created.certificate.control_number.starts_with("CLR-"));

        let err = svc
            .update_status(&created.certificate.id, certificate_statuses::RELEASED)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));

        svc.update_status(&created.certificate.id, certificate_statuses::APPROVED).unwrap();
        let released = svc
            .update_status(&created.certificate.id, certificate_statuses::RELEASED)
            .unwrap()
            .unwrap();
        assert!(released.certificate.issued_date.is_some());

        let mut changes = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, RegistryEvent::CertificateStatusChanged { .. }) {
                changes += 1;
            }
        }
        assert_eq!(changes, 2);
    }

    #[test]
    fn test_render_uses_builtin_body_and_default_signatory() {
        let (svc, resident_id) = setup();
        let created = svc.create(&request(&resident_id, certificate_types::RESIDENCY)).unwrap();
        let html = svc.render(&created.certificate.id).unwrap().unwrap();
        assert!(html.contains("Andres Bonifacio"));
        assert!(html.contains("12 Katipunan Ave"));
        assert!(html.contains("Gregoria de Jesus"));
        assert!(html.contains(&created.certificate.control_number));
        assert!(html.contains("Certificate of Residency"));
        assert!(!html.contains("{{fullName}}"));
    }

    #[test]
    fn test_render_prefers_active_template() {
        let (svc, resident_id) = setup();
        svc.create_template(&CreateTemplateInput {
            certificate_type: certificate_types::INDIGENCY.into(),
            name: "Indigency v2".into(),
            html_content: "<p>INDIGENT: {{fullName}} / {{unknownSlot}}</p>".into(),
            css_content: None,
            is_active: true,
        })
        .unwrap();
        let created = svc.create(&request(&resident_id, certificate_types::INDIGENCY)).unwrap();
        let html = svc.render(&created.certificate.id).unwrap().unwrap();
        assert!(html.contains("INDIGENT: Andres Bonifacio"));
        assert!(html.contains("{{unknownSlot}}"));
        assert!(svc.render("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_rejects_unknown_status_but_accepts_all() {
        let (svc, resident_id) = setup();
        svc.create(&request(&resident_id, certificate_types::CLEARANCE)).unwrap();
        let all = svc
            .list(&CertificateQuery {
                status_filter: Some("ALL".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(all.len(), 1);
        assert!(svc
            .list(&CertificateQuery {
                status_filter: Some("LOST".into()),
                ..Default::default()
            })
            .is_err());
    }
}
