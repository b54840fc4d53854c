//! Report aggregation and exports

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::debug;

use crate::db::Database;
use crate::error::RegistryError;
use crate::reports::{
    self, AipReport, AipReportType, BlotterReport, CertificateReport, DashboardSummary, Export,
    ExportFormat, FinanceReport, FinanceSelector, PopulationReport, ReportKind, Table,
};

/// Query string accepted by the report routes
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub aip_id: Option<String>,
    #[serde(default)]
    pub fiscal_year: Option<i32>,
    #[serde(default)]
    pub format: Option<String>,
}

impl ReportQuery {
    /// Requested export format, CSV when absent
    pub fn export_format(&self) -> Result<ExportFormat, RegistryError> {
        self.format.as_deref().unwrap_or("csv").parse()
    }
}

pub struct ReportService {
    db: Arc<Database>,
}

impl ReportService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn today() -> NaiveDate {
        chrono::Utc::now().date_naive()
    }

    fn year_or_current(year: Option<i32>) -> Result<i32, RegistryError> {
        let year = year.unwrap_or_else(|| Self::today().year());
        if !(1900..=2100).contains(&year) {
            return Err(RegistryError::InvalidInput(format!("year out of range: {}", year)));
        }
        Ok(year)
    }

    pub fn dashboard(&self) -> Result<DashboardSummary, RegistryError> {
        self.db
            .with_conn(|conn| reports::dashboard_summary(conn, Self::today()))
    }

    pub fn population(&self) -> Result<PopulationReport, RegistryError> {
        self.db
            .with_conn(|conn| reports::population_report(conn, Self::today()))
    }

    pub fn certificates(&self, year: Option<i32>) -> Result<CertificateReport, RegistryError> {
        let year = Self::year_or_current(year)?;
        self.db.with_conn(|conn| reports::certificate_report(conn, year))
    }

    pub fn blotter(&self, year: Option<i32>) -> Result<BlotterReport, RegistryError> {
        let year = Self::year_or_current(year)?;
        self.db.with_conn(|conn| reports::blotter_report(conn, year))
    }

    pub fn finance(&self, query: &ReportQuery) -> Result<FinanceReport, RegistryError> {
        let selector = FinanceSelector {
            aip_id: query.aip_id.clone(),
            fiscal_year: query.fiscal_year.or(query.year),
        };
        self.db
            .with_conn(|conn| reports::finance_report(conn, &selector, Self::today()))
    }

    /// Any report family as JSON
    pub fn report(&self, kind: ReportKind, query: &ReportQuery) -> Result<serde_json::Value, RegistryError> {
        let value = match kind {
            ReportKind::Population => serde_json::to_value(self.population()?)?,
            ReportKind::Certificates => serde_json::to_value(self.certificates(query.year)?)?,
            ReportKind::Blotter => serde_json::to_value(self.blotter(query.year)?)?,
            ReportKind::Finance => serde_json::to_value(self.finance(query)?)?,
        };
        Ok(value)
    }

    fn table(&self, kind: ReportKind, query: &ReportQuery) -> Result<Table, RegistryError> {
        Ok(match kind {
            ReportKind::Population => self.population()?.to_table(),
            ReportKind::Certificates => self.certificates(query.year)?.to_table(),
            ReportKind::Blotter => self.blotter(query.year)?.to_table(),
            ReportKind::Finance => self.finance(query)?.to_table(),
        })
    }

    pub fn export(
        &self,
        kind: ReportKind,
        query: &ReportQuery,
        format: ExportFormat,
    ) -> Result<Export, RegistryError> {
        let table = self.table(kind, query)?;
        debug!(report = %kind, rows = table.rows.len(), ?format, "Exporting report");
        let stem = format!("{}-report-{}", kind, Self::today().format("%Y%m%d"));
        Ok(Export::new(&stem, format, &table))
    }

    pub fn aip_report(&self, aip_id: &str) -> Result<Option<AipReport>, RegistryError> {
        self.db.with_conn(|conn| reports::aip_report(conn, aip_id))
    }

    /// One section of an AIP report, or `None` when the AIP does not exist
    pub fn export_aip(
        &self,
        aip_id: &str,
        report_type: AipReportType,
        format: ExportFormat,
    ) -> Result<Option<Export>, RegistryError> {
        let Some(report) = self.aip_report(aip_id)? else {
            return Ok(None);
        };
        let table = report.to_table(report_type);
        debug!(aip = %aip_id, section = %report_type, rows = table.rows.len(), ?format, "Exporting AIP report");
        let stem = format!("aip-{}-{}", report.aip.fiscal_year, report_type);
        Ok(Some(Export::new(&stem, format, &table)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::finance::aip::{create_aip, CreateAipInput};

    fn service() -> (Arc<Database>, ReportService) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        (db.clone(), ReportService::new(db))
    }

    #[test]
    fn test_empty_database_reports() {
        let (_, svc) = service();
        let dashboard = svc.dashboard().unwrap();
        assert_eq!(dashboard.total_residents, 0);
        assert_eq!(dashboard.cases_per_month.points.len(), 12);

        let population = svc.report(ReportKind::Population, &ReportQuery::default()).unwrap();
        assert_eq!(population["totalResidents"], 0);
        assert!(population["byAgeBracket"]["points"].is_array());
    }

    #[test]
    fn test_exports_carry_content_type_and_name() {
        let (_, svc) = service();
        let csv = svc
            .export(ReportKind::Blotter, &ReportQuery::default(), ExportFormat::Csv)
            .unwrap();
        assert!(csv.filename.starts_with("blotter-report-"));
        assert!(csv.filename.ends_with(".csv"));
        assert!(String::from_utf8(csv.body).unwrap().starts_with("Group,Category,Count\r\n"));

        let pdf = svc
            .export(ReportKind::Population, &ReportQuery::default(), ExportFormat::Pdf)
            .unwrap();
        assert_eq!(pdf.content_type, "application/pdf");
        assert!(pdf.body.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_aip_export_sections() {
        let (db, svc) = service();
        let aip = db
            .with_conn(|conn| {
                create_aip(
                    conn,
                    &CreateAipInput {
                        fiscal_year: 2025,
                        title: "AIP 2025".into(),
                        total_budget: 100.0,
                        ..Default::default()
                    },
                )
            })
            .unwrap();

        let export = svc
            .export_aip(&aip.id, AipReportType::Summary, ExportFormat::Csv)
            .unwrap()
            .unwrap();
        assert_eq!(export.filename, "aip-2025-summary.csv");
        let body = String::from_utf8(export.body).unwrap();
        assert!(body.contains("TOTAL,AIP 2025"));

        assert!(svc
            .export_aip("missing", AipReportType::Projects, ExportFormat::Pdf)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_query_format_default_and_year_bounds() {
        assert_eq!(ReportQuery::default().export_format().unwrap(), ExportFormat::Csv);
        let (_, svc) = service();
        assert!(matches!(svc.certificates(Some(1200)), Err(RegistryError::InvalidInput(_))));
    }
}
