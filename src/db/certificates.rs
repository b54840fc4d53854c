//! Certificate issuance storage
//!
//! Control numbers are allocated per type and year as `PREFIX-YYYY-NNNNN`
//! inside the insert transaction. Status changes follow
//! `certificate_statuses::can_transition`; `issued_date` is set exactly when a
//! certificate is RELEASED.

use diesel::prelude::*;
use serde::Deserialize;

use super::diesel_schema::{certificates, officials, residents};
use super::models::{
    certificate_statuses, certificate_types, current_timestamp, double_option, Certificate,
    CertificateChanges, NewCertificate, Resident,
};
use super::residents::resident_exists;
use super::{like_pattern, new_id, next_sequence};
use crate::error::RegistryError;

/// Sentinel accepted by the status filter meaning "no filter"
pub const ALL_STATUSES: &str = "ALL";

/// Certificate row joined with the resident it was issued to
#[derive(Debug, Clone)]
pub struct CertificateWithResident {
    pub certificate: Certificate,
    pub resident: Resident,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCertificateInput {
    pub certificate_type: String,
    pub resident_id: String,
    pub purpose: String,
    #[serde(default)]
    pub official_id: Option<String>,
    #[serde(default)]
    pub or_number: Option<String>,
    #[serde(default)]
    pub fee: Option<f64>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCertificateInput {
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub official_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub or_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub fee: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub business_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub remarks: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateQuery {
    /// A status, or `ALL` / absent for every status
    #[serde(default, alias = "status")]
    pub status_filter: Option<String>,
    #[serde(default, alias = "type")]
    pub certificate_type: Option<String>,
    #[serde(default)]
    pub resident_id: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

// ============================================================================
// Control Numbers
// ============================================================================

/// Next control number for `certificate_type` in `year`
pub fn next_control_number(
    conn: &mut SqliteConnection,
    certificate_type: &str,
    year: i32,
) -> Result<String, RegistryError> {
    let prefix = format!("{}-{}-", certificate_types::prefix(certificate_type), year);
    let existing: Vec<String> = certificates::table
        .filter(certificates::control_number.like(format!("{}%", prefix)))
        .select(certificates::control_number)
        .load(conn)?;

    let next = next_sequence(&prefix, &existing);

    Ok(format!("{}{:05}", prefix, next))
}

// ============================================================================
// CRUD
// ============================================================================

/// Issue a new PENDING certificate with a freshly allocated control number
pub fn create_certificate(
    conn: &mut SqliteConnection,
    input: &CreateCertificateInput,
    year: i32,
) -> Result<Certificate, RegistryError> {
    conn.transaction(|conn| {
        if !resident_exists(conn, &input.resident_id)? {
            return Err(RegistryError::InvalidInput(format!(
                "Resident not found: {}",
                input.resident_id
            )));
        }
        if let Some(ref official_id) = input.official_id {
            ensure_official(conn, official_id)?;
        }

        let id = new_id();
        let now = current_timestamp();
        let control_number = next_control_number(conn, &input.certificate_type, year)?;

        let new_certificate = NewCertificate {
            id: &id,
            control_number: &control_number,
            certificate_type: &input.certificate_type,
            status: certificate_statuses::PENDING,
            purpose: input.purpose.trim(),
            resident_id: &input.resident_id,
            official_id: input.official_id.as_deref(),
            issued_date: None,
            or_number: input.or_number.as_deref(),
            fee: input.fee,
            business_name: input.business_name.as_deref(),
            remarks: input.remarks.as_deref(),
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(certificates::table)
            .values(&new_certificate)
            .execute(conn)?;
        certificates::table.find(&id).first(conn).map_err(Into::into)
    })
}

/// Insert a fully-specified row (seeding and imports)
pub fn insert_certificate(
    conn: &mut SqliteConnection,
    certificate: &NewCertificate<'_>,
) -> Result<(), RegistryError> {
    diesel::insert_into(certificates::table)
        .values(certificate)
        .execute(conn)?;
    Ok(())
}

fn ensure_official(conn: &mut SqliteConnection, official_id: &str) -> Result<(), RegistryError> {
    let exists: bool = diesel::select(diesel::dsl::exists(officials::table.find(official_id)))
        .get_result(conn)?;
    if exists {
        Ok(())
    } else {
        Err(RegistryError::InvalidInput(format!("Official not found: {}", official_id)))
    }
}

pub fn get_certificate(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<CertificateWithResident>, RegistryError> {
    certificates::table
        .inner_join(residents::table)
        .filter(certificates::id.eq(id))
        .select((Certificate::as_select(), Resident::as_select()))
        .first::<(Certificate, Resident)>(conn)
        .optional()
        .map(|row| row.map(|(certificate, resident)| CertificateWithResident { certificate, resident }))
        .map_err(Into::into)
}

pub fn list_certificates(
    conn: &mut SqliteConnection,
    query: &CertificateQuery,
) -> Result<Vec<CertificateWithResident>, RegistryError> {
    let mut q = certificates::table
        .inner_join(residents::table)
        .select((Certificate::as_select(), Resident::as_select()))
        .into_boxed();

    if let Some(status) = query
        .status_filter
        .as_deref()
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case(ALL_STATUSES))
    {
        q = q.filter(certificates::status.eq(status.to_string()));
    }
    if let Some(ref certificate_type) = query.certificate_type {
        q = q.filter(certificates::certificate_type.eq(certificate_type));
    }
    if let Some(ref resident_id) = query.resident_id {
        q = q.filter(certificates::resident_id.eq(resident_id));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        q = q.filter(
            certificates::control_number
                .like(pattern.clone())
                .escape('\\')
                .or(certificates::purpose.like(pattern.clone()).escape('\\'))
                .or(residents::first_name.like(pattern.clone()).escape('\\'))
                .or(residents::last_name.like(pattern).escape('\\')),
        );
    }

    let rows: Vec<(Certificate, Resident)> = q.order(certificates::created_at.desc()).load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(certificate, resident)| CertificateWithResident { certificate, resident })
        .collect())
}

pub fn update_certificate(
    conn: &mut SqliteConnection,
    id: &str,
    input: &UpdateCertificateInput,
) -> Result<Option<Certificate>, RegistryError> {
    if let Some(Some(ref official_id)) = input.official_id {
        ensure_official(conn, official_id)?;
    }

    let now = current_timestamp();
    let changes = CertificateChanges {
        purpose: input.purpose.as_deref(),
        official_id: input.official_id.as_ref().map(|v| v.as_deref()),
        or_number: input.or_number.as_ref().map(|v| v.as_deref()),
        fee: input.fee,
        business_name: input.business_name.as_ref().map(|v| v.as_deref()),
        remarks: input.remarks.as_ref().map(|v| v.as_deref()),
        updated_at: Some(&now),
    };

    let updated = diesel::update(certificates::table.find(id))
        .set(&changes)
        .execute(conn)?;
    if updated == 0 {
        return Ok(None);
    }
    certificates::table.find(id).first(conn).optional().map_err(Into::into)
}

/// Move a certificate to `status`
///
/// Re-applying the current status is a no-op. `issued_date` is stamped on
/// RELEASED and cleared for every other status.
pub fn update_status(
    conn: &mut SqliteConnection,
    id: &str,
    status: &str,
) -> Result<Option<Certificate>, RegistryError> {
    conn.transaction(|conn| {
        let current: Option<Certificate> = certificates::table.find(id).first(conn).optional()?;
        let Some(current) = current else {
            return Ok(None);
        };

        if current.status == status {
            return Ok(Some(current));
        }
        if !certificate_statuses::can_transition(&current.status, status) {
            return Err(RegistryError::InvalidTransition {
                entity: "certificate",
                from: current.status,
                to: status.to_string(),
            });
        }

        let now = current_timestamp();
        let issued_date = (status == certificate_statuses::RELEASED).then_some(now.as_str());

        diesel::update(certificates::table.find(id))
            .set((
                certificates::status.eq(status),
                certificates::issued_date.eq(issued_date),
                certificates::updated_at.eq(&now),
            ))
            .execute(conn)?;

        certificates::table.find(id).first(conn).optional().map_err(Into::into)
    })
}

pub fn delete_certificate(conn: &mut SqliteConnection, id: &str) -> Result<bool, RegistryError> {
    let deleted = diesel::delete(certificates::table.find(id)).execute(conn)?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{civil_statuses, genders};
    use crate::db::residents::{create_resident, CreateResidentInput};
    use crate::db::test_conn as setup;

    fn resident(conn: &mut SqliteConnection) -> String {
        create_resident(
            conn,
            &CreateResidentInput {
                first_name: "Juan".into(),
                last_name: "Dela Cruz".into(),
                birth_date: "1980-04-04".into(),
                gender: genders::MALE.into(),
                civil_status: civil_statuses::MARRIED.into(),
                ..Default::default()
            },
        )
        .unwrap()
        .resident
        .id
    }

    fn request(conn: &mut SqliteConnection, resident_id: &str, t: &str) -> Certificate {
        create_certificate(
            conn,
            &CreateCertificateInput {
                certificate_type: t.into(),
                resident_id: resident_id.into(),
                purpose: "Employment".into(),
                ..Default::default()
            },
            2024,
        )
        .unwrap()
    }

    #[test]
    fn test_control_numbers_increment_per_type() {
        let mut conn = setup();
        let rid = resident(&mut conn);

        let a = request(&mut conn, &rid, certificate_types::RESIDENCY);
        let b = request(&mut conn, &rid, certificate_types::RESIDENCY);
        let c = request(&mut conn, &rid, certificate_types::CLEARANCE);

        assert_eq!(a.control_number, "RES-2024-00001");
        assert_eq!(b.control_number, "RES-2024-00002");
        assert_eq!(c.control_number, "CLR-2024-00001");
        assert_eq!(a.status, certificate_statuses::PENDING);
        assert!(a.issued_date.is_none());
    }

    #[test]
    fn test_control_numbers_continue_past_padding() {
        let mut conn = setup();
        let rid = resident(&mut conn);
        let first = request(&mut conn, &rid, certificate_types::INDIGENCY);
        diesel::update(certificates::table.find(first.id.as_str()))
            .set(certificates::control_number.eq("IND-2024-99999"))
            .execute(&mut conn)
            .unwrap();

        let a = request(&mut conn, &rid, certificate_types::INDIGENCY);
        let b = request(&mut conn, &rid, certificate_types::INDIGENCY);
        assert_eq!(a.control_number, "IND-2024-100000");
        assert_eq!(b.control_number, "IND-2024-100001");
    }

    #[test]
    fn test_released_sets_issued_date() {
        let mut conn = setup();
        let rid = resident(&mut conn);
        let cert = request(&mut conn, &rid, certificate_types::INDIGENCY);

        let approved = update_status(&mut conn, &cert.id, certificate_statuses::APPROVED)
            .unwrap()
            .unwrap();
        assert!(approved.issued_date.is_none());

        let released = update_status(&mut conn, &cert.id, certificate_statuses::RELEASED)
            .unwrap()
            .unwrap();
        assert!(released.issued_date.is_some());
    }

    #[test]
    fn test_pending_cannot_skip_to_released() {
        let mut conn = setup();
        let rid = resident(&mut conn);
        let cert = request(&mut conn, &rid, certificate_types::INDIGENCY);

        let err = update_status(&mut conn, &cert.id, certificate_statuses::RELEASED).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));

        let same = update_status(&mut conn, &cert.id, certificate_statuses::PENDING)
            .unwrap()
            .unwrap();
        assert_eq!(same.status, certificate_statuses::PENDING);
    }

    #[test]
    fn test_status_filter_all_and_specific() {
        let mut conn = setup();
        let rid = resident(&mut conn);
        let a = request(&mut conn, &rid, certificate_types::RESIDENCY);
        request(&mut conn, &rid, certificate_types::RESIDENCY);
        update_status(&mut conn, &a.id, certificate_statuses::APPROVED).unwrap();

        let all = list_certificates(
            &mut conn,
            &CertificateQuery {
                status_filter: Some(ALL_STATUSES.into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(all.len(), 2);

        let approved = list_certificates(
            &mut conn,
            &CertificateQuery {
                status_filter: Some(certificate_statuses::APPROVED.into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(approved.len(), 1);
        assert!(approved.iter().all(|c| c.certificate.status == certificate_statuses::APPROVED));
    }

    #[test]
    fn test_delete_removes_from_list() {
        let mut conn = setup();
        let rid = resident(&mut conn);
        let cert = request(&mut conn, &rid, certificate_types::CFA);

        assert!(delete_certificate(&mut conn, &cert.id).unwrap());
        let remaining = list_certificates(&mut conn, &CertificateQuery::default()).unwrap();
        assert!(remaining.iter().all(|c| c.certificate.id != cert.id));
    }

    #[test]
    fn test_search_matches_resident_name() {
        let mut conn = setup();
        let rid = resident(&mut conn);
        request(&mut conn, &rid, certificate_types::CFA);

        let found = list_certificates(
            &mut conn,
            &CertificateQuery {
                search: Some("dela".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].resident.first_name, "Juan");
    }
}
