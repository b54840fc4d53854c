//! Certificate templates: HTML/CSS fragments with `{{placeholder}}` slots
//!
//! At most one template per certificate type is expected to be active; the
//! most recently updated active template wins when several are.

use std::collections::HashMap;
use std::sync::OnceLock;

use diesel::prelude::*;
use regex::{Captures, Regex};
use serde::Deserialize;

use super::diesel_schema::certificate_templates;
use super::models::{
    certificate_types, current_timestamp, double_option, CertificateTemplate,
    CertificateTemplateChanges, NewCertificateTemplate,
};
use super::new_id;
use crate::error::RegistryError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateInput {
    pub certificate_type: String,
    pub name: String,
    pub html_content: String,
    #[serde(default)]
    pub css_content: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub css_content: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

pub fn create_template(
    conn: &mut SqliteConnection,
    input: &CreateTemplateInput,
) -> Result<CertificateTemplate, RegistryError> {
    let id = new_id();
    let now = current_timestamp();
    let new_template = NewCertificateTemplate {
        id: &id,
        certificate_type: &input.certificate_type,
        name: input.name.trim(),
        html_content: &input.html_content,
        css_content: input.css_content.as_deref(),
        is_active: input.is_active as i32,
        created_at: &now,
        updated_at: &now,
    };

    diesel::insert_into(certificate_templates::table)
        .values(&new_template)
        .execute(conn)?;
    certificate_templates::table.find(&id).first(conn).map_err(Into::into)
}

pub fn get_template(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<CertificateTemplate>, RegistryError> {
    certificate_templates::table
        .find(id)
        .first(conn)
        .optional()
        .map_err(Into::into)
}

pub fn get_active_for_type(
    conn: &mut SqliteConnection,
    certificate_type: &str,
) -> Result<Option<CertificateTemplate>, RegistryError> {
    certificate_templates::table
        .filter(certificate_templates::certificate_type.eq(certificate_type))
        .filter(certificate_templates::is_active.eq(1))
        .order(certificate_templates::updated_at.desc())
        .first(conn)
        .optional()
        .map_err(Into::into)
}

pub fn list_templates(
    conn: &mut SqliteConnection,
    certificate_type: Option<&str>,
) -> Result<Vec<CertificateTemplate>, RegistryError> {
    let mut q = certificate_templates::table.into_boxed();
    if let Some(t) = certificate_type {
        q = q.filter(certificate_templates::certificate_type.eq(t.to_string()));
    }
    q.order((
        certificate_templates::certificate_type.asc(),
        certificate_templates::name.asc(),
    ))
    .load(conn)
    .map_err(Into::into)
}

pub fn update_template(
    conn: &mut SqliteConnection,
    id: &str,
    input: &UpdateTemplateInput,
) -> Result<Option<CertificateTemplate>, RegistryError> {
    let now = current_timestamp();
    let changes = CertificateTemplateChanges {
        name: input.name.as_deref(),
        html_content: input.html_content.as_deref(),
        css_content: input.css_content.as_ref().map(|v| v.as_deref()),
        is_active: input.is_active.map(|b| b as i32),
        updated_at: Some(&now),
    };

    let updated = diesel::update(certificate_templates::table.find(id))
        .set(&changes)
        .execute(conn)?;
    if updated == 0 {
        return Ok(None);
    }
    get_template(conn, id)
}

pub fn delete_template(conn: &mut SqliteConnection, id: &str) -> Result<bool, RegistryError> {
    let deleted = diesel::delete(certificate_templates::table.find(id)).execute(conn)?;
    Ok(deleted > 0)
}

// ============================================================================
// Rendering
// ============================================================================

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Minimal HTML escaping for substituted values
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Substitute `{{key}}` slots. Unknown keys are left in place so template
/// authors can see what did not resolve.
pub fn fill_placeholders(html: &str, values: &HashMap<&str, String>) -> String {
    placeholder_regex()
        .replace_all(html, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => escape_html(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Render a complete HTML document from template fragments
pub fn render_document(
    title: &str,
    html: &str,
    css: Option<&str>,
    values: &HashMap<&str, String>,
) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        css.unwrap_or(DEFAULT_CSS),
        fill_placeholders(html, values)
    )
}

pub const DEFAULT_CSS: &str = "body { font-family: serif; margin: 48px; }\n\
.header { text-align: center; }\n\
.title { text-align: center; font-size: 22px; font-weight: bold; margin: 32px 0; }\n\
.signature { margin-top: 64px; text-align: right; }\n\
.meta { font-size: 12px; color: #444; }";

/// Built-in body used when no active template exists for a type
pub fn default_html(certificate_type: &str) -> String {
    let body = match certificate_type {
        certificate_types::INDIGENCY => {
            "This is to certify that <b>{{fullName}}</b>, {{age}} years old, {{civilStatus}}, \
             a resident of {{address}}, belongs to an indigent family of this barangay."
        }
        certificate_types::CLEARANCE => {
            "This is to certify that <b>{{fullName}}</b>, a resident of {{address}}, has no \
             derogatory record on file in this barangay."
        }
        certificate_types::BUSINESS_PERMIT => {
            "Permission is hereby granted to <b>{{fullName}}</b> to operate <b>{{businessName}}</b> \
             within the territorial jurisdiction of this barangay."
        }
        certificate_types::CFA => {
            "This is to certify that the complaint filed by <b>{{fullName}}</b> was not settled \
             through conciliation proceedings and may now be filed in court."
        }
        _ => {
            "This is to certify that <b>{{fullName}}</b>, {{age}} years old, is a bona fide \
             resident of {{address}}."
        }
    };

    format!(
        "<div class=\"header\">Republic of the Philippines<br>Province of {{{{province}}}}<br>\
         {{{{municipality}}}}<br><b>{{{{barangayName}}}}</b></div>\n\
         <div class=\"title\">{{{{certificateTitle}}}}</div>\n\
         <p>{}</p>\n\
         <p>Issued upon request for <b>{{{{purpose}}}}</b> this {{{{issuedDate}}}}.</p>\n\
         <div class=\"signature\">{{{{officialName}}}}<br>{{{{officialPosition}}}}</div>\n\
         <div class=\"meta\">Control No. {{{{controlNumber}}}} &middot; O.R. No. {{{{orNumber}}}}</div>",
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn as setup;

    #[test]
    fn test_active_template_selection() {
        let mut conn = setup();
        create_template(
            &mut conn,
            &CreateTemplateInput {
                certificate_type: certificate_types::RESIDENCY.into(),
                name: "Old".into(),
                html_content: "<p>old</p>".into(),
                is_active: false,
                ..Default::default()
            },
        )
        .unwrap();
        let active = create_template(
            &mut conn,
            &CreateTemplateInput {
                certificate_type: certificate_types::RESIDENCY.into(),
                name: "Current".into(),
                html_content: "<p>{{fullName}}</p>".into(),
                is_active: true,
                ..Default::default()
            },
        )
        .unwrap();

        let found = get_active_for_type(&mut conn, certificate_types::RESIDENCY)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, active.id);
        assert!(get_active_for_type(&mut conn, certificate_types::CFA).unwrap().is_none());
        assert_eq!(list_templates(&mut conn, None).unwrap().len(), 2);
    }

    #[test]
    fn test_fill_placeholders_escapes_and_keeps_unknown() {
        let mut values = HashMap::new();
        values.insert("fullName", "Juan <Jr>".to_string());
        let out = fill_placeholders("<b>{{ fullName }}</b> {{unknownKey}}", &values);
        assert_eq!(out, "<b>Juan &lt;Jr&gt;</b> {{unknownKey}}");
    }

    #[test]
    fn test_default_html_has_slots() {
        let html = default_html(certificate_types::BUSINESS_PERMIT);
        assert!(html.contains("{{businessName}}"));
        assert!(html.contains("{{controlNumber}}"));
        assert!(!html.contains("{{{{"));
    }
}
