//! Reporting: chart-ready aggregates and CSV/PDF exports
//!
//! Aggregates are computed from the live tables on each request. Every report
//! can be flattened into a [`Table`], which both exporters consume.

pub mod aggregate;
pub mod csv;
pub mod pdf;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use ts_rs::TS;

use crate::error::RegistryError;
use crate::views::AipView;

pub use aggregate::{
    aip_report, blotter_report, certificate_report, dashboard_summary, finance_report,
    population_report, FinanceSelector,
};

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Inclusive age ranges used by the population report
pub const AGE_BRACKETS: [(&str, i32, i32); 4] = [
    ("0-17", 0, 17),
    ("18-35", 18, 35),
    ("36-59", 36, 59),
    ("60+", 60, i32::MAX),
];

pub fn age_bracket(age: i32) -> &'static str {
    AGE_BRACKETS
        .iter()
        .find(|(_, lo, hi)| age >= *lo && age <= *hi)
        .map(|(label, _, _)| *label)
        .unwrap_or(AGE_BRACKETS[0].0)
}

// ============================================================================
// Chart data
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn new(label: impl Into<String>, points: Vec<ChartPoint>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    /// Count occurrences, listing `vocabulary` first (zeros included) and any
    /// values outside it afterwards in order of first appearance
    pub fn tally<'a, I>(label: impl Into<String>, vocabulary: &[&str], values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut order: Vec<String> = vocabulary.iter().map(|v| v.to_string()).collect();
        let mut counts: HashMap<String, f64> = HashMap::new();
        for value in values {
            if !counts.contains_key(value) && !vocabulary.contains(&value) {
                order.push(value.to_string());
            }
            *counts.entry(value.to_string()).or_insert(0.0) += 1.0;
        }
        let points = order
            .into_iter()
            .map(|label| ChartPoint {
                value: counts.get(&label).copied().unwrap_or(0.0),
                label,
            })
            .collect();
        Self::new(label, points)
    }

    /// Count occurrences ranked by frequency, ties broken by label
    pub fn ranked<'a, I>(label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: HashMap<&str, f64> = HashMap::new();
        for value in values {
            *counts.entry(value).or_insert(0.0) += 1.0;
        }
        let mut points: Vec<ChartPoint> = counts
            .into_iter()
            .map(|(label, value)| ChartPoint {
                label: label.to_string(),
                value,
            })
            .collect();
        points.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
        Self::new(label, points)
    }

    /// Twelve monthly buckets for dates (YYYY-MM-DD...) falling in `year`
    pub fn monthly<'a, I>(label: impl Into<String>, year: i32, dates: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let prefix = format!("{:04}-", year);
        let mut buckets = [0.0f64; 12];
        for date in dates {
            let Some(rest) = date.strip_prefix(&prefix) else {
                continue;
            };
            if let Some(month) = rest.get(0..2).and_then(|m| m.parse::<usize>().ok()) {
                if (1..=12).contains(&month) {
                    buckets[month - 1] += 1.0;
                }
            }
        }
        let points = MONTHS
            .iter()
            .zip(buckets)
            .map(|(label, value)| ChartPoint {
                label: label.to_string(),
                value,
            })
            .collect();
        Self::new(label, points)
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PopulationReport {
    pub total_residents: i64,
    pub total_households: i64,
    pub registered_voters: i64,
    pub by_gender: ChartSeries,
    pub by_age_bracket: ChartSeries,
    pub by_sector: ChartSeries,
    pub by_civil_status: ChartSeries,
    pub voter_registration: ChartSeries,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CertificateReport {
    pub year: i32,
    pub total_requests: i64,
    pub released: i64,
    pub fees_collected: f64,
    pub by_type: ChartSeries,
    pub by_status: ChartSeries,
    pub issued_per_month: ChartSeries,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlotterReport {
    pub year: i32,
    pub total_cases: i64,
    pub active_cases: i64,
    pub resolved_cases: i64,
    pub by_status: ChartSeries,
    pub by_priority: ChartSeries,
    pub by_incident_type: ChartSeries,
    pub cases_per_month: ChartSeries,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FinanceReport {
    pub fiscal_year: i32,
    pub aip_id: Option<String>,
    pub total_budget: f64,
    pub allocated_budget: f64,
    pub total_expenses: f64,
    pub utilization: u32,
    pub project_costs: ChartSeries,
    pub project_expenses: ChartSeries,
    pub total_income: f64,
    pub total_expense_transactions: f64,
    pub income_by_category: ChartSeries,
    pub expense_by_category: ChartSeries,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AipProjectLine {
    pub project_code: String,
    pub title: String,
    pub sector: String,
    pub status: String,
    pub total_cost: f64,
    pub total_expenses: f64,
    pub remaining: f64,
    pub utilization: u32,
    pub milestones_completed: u32,
    pub milestones_total: u32,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AipExpenseLine {
    pub project_code: String,
    pub expense_date: String,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub reference_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AipMilestoneLine {
    pub project_code: String,
    pub title: String,
    pub target_date: String,
    pub completed_date: Option<String>,
    pub status: String,
    pub progress: i32,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AipReport {
    pub aip: AipView,
    pub allocated_budget: f64,
    pub total_expenses: f64,
    pub utilization: u32,
    pub projects: Vec<AipProjectLine>,
    pub expenses: Vec<AipExpenseLine>,
    pub milestones: Vec<AipMilestoneLine>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CurrentBudget {
    pub aip_id: String,
    pub fiscal_year: i32,
    pub total_budget: f64,
    pub total_expenses: f64,
    pub utilization: u32,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardSummary {
    pub total_residents: i64,
    pub total_households: i64,
    pub registered_voters: i64,
    pub senior_citizens: i64,
    pub pending_certificates: i64,
    pub released_this_month: i64,
    pub active_cases: i64,
    pub urgent_cases: i64,
    pub current_budget: Option<CurrentBudget>,
    pub income_this_year: f64,
    pub expenses_this_year: f64,
    pub certificates_per_month: ChartSeries,
    pub cases_per_month: ChartSeries,
}

// ============================================================================
// Tabular form
// ============================================================================

/// Flat rows shared by the CSV and PDF exporters
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(title: impl Into<String>, headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            title: title.into(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// One row per point, tagged with the series label
    fn push_series(&mut self, series: &ChartSeries) {
        for point in &series.points {
            self.push([series.label.clone(), point.label.clone(), number(point.value)]);
        }
    }
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        money(value)
    }
}

impl PopulationReport {
    pub fn to_table(&self) -> Table {
        let mut table = Table::new("Population Report", ["Group", "Category", "Count"]);
        table.push(["Summary".into(), "Residents".into(), self.total_residents.to_string()]);
        table.push(["Summary".into(), "Households".into(), self.total_households.to_string()]);
        table.push(["Summary".into(), "Registered voters".into(), self.registered_voters.to_string()]);
        for series in [
            &self.by_gender,
            &self.by_age_bracket,
            &self.by_sector,
            &self.by_civil_status,
            &self.voter_registration,
        ] {
            table.push_series(series);
        }
        table
    }
}

impl CertificateReport {
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(
            format!("Certificate Report {}", self.year),
            ["Group", "Category", "Count"],
        );
        table.push(["Summary".into(), "Requests".into(), self.total_requests.to_string()]);
        table.push(["Summary".into(), "Released".into(), self.released.to_string()]);
        table.push(["Summary".into(), "Fees collected".into(), money(self.fees_collected)]);
        for series in [&self.by_type, &self.by_status, &self.issued_per_month] {
            table.push_series(series);
        }
        table
    }
}

impl BlotterReport {
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(
            format!("Blotter Report {}", self.year),
            ["Group", "Category", "Count"],
        );
        table.push(["Summary".into(), "Cases".into(), self.total_cases.to_string()]);
        table.push(["Summary".into(), "Active".into(), self.active_cases.to_string()]);
        table.push(["Summary".into(), "Resolved".into(), self.resolved_cases.to_string()]);
        for series in [
            &self.by_status,
            &self.by_priority,
            &self.by_incident_type,
            &self.cases_per_month,
        ] {
            table.push_series(series);
        }
        table
    }
}

impl FinanceReport {
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(
            format!("Finance Report FY {}", self.fiscal_year),
            ["Group", "Category", "Amount"],
        );
        table.push(["Summary".into(), "Total budget".into(), money(self.total_budget)]);
        table.push(["Summary".into(), "Allocated".into(), money(self.allocated_budget)]);
        table.push(["Summary".into(), "Project expenses".into(), money(self.total_expenses)]);
        table.push(["Summary".into(), "Utilization %".into(), self.utilization.to_string()]);
        table.push(["Summary".into(), "Income".into(), money(self.total_income)]);
        table.push(["Summary".into(), "Disbursements".into(), money(self.total_expense_transactions)]);
        for series in [
            &self.project_costs,
            &self.project_expenses,
            &self.income_by_category,
            &self.expense_by_category,
        ] {
            for point in &series.points {
                table.push([series.label.clone(), point.label.clone(), money(point.value)]);
            }
        }
        table
    }
}

/// Sections of the AIP report that can be exported on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AipReportType {
    Summary,
    Projects,
    Expenses,
    Milestones,
}

impl FromStr for AipReportType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "projects" => Ok(Self::Projects),
            "expenses" => Ok(Self::Expenses),
            "milestones" => Ok(Self::Milestones),
            other => Err(RegistryError::InvalidInput(format!(
                "Unknown AIP report type: {} (expected summary, projects, expenses or milestones)",
                other
            ))),
        }
    }
}

impl fmt::Display for AipReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Summary => "summary",
            Self::Projects => "projects",
            Self::Expenses => "expenses",
            Self::Milestones => "milestones",
        };
        f.write_str(name)
    }
}

impl AipReport {
    pub fn to_table(&self, report_type: AipReportType) -> Table {
        let fy = self.aip.fiscal_year;
        match report_type {
            AipReportType::Summary => {
                let mut table = Table::new(
                    format!("AIP {} Budget Summary", fy),
                    ["Project", "Title", "Cost", "Expenses", "Remaining", "Utilization %"],
                );
                for p in &self.projects {
                    table.push([
                        p.project_code.clone(),
                        p.title.clone(),
                        money(p.total_cost),
                        money(p.total_expenses),
                        money(p.remaining),
                        p.utilization.to_string(),
                    ]);
                }
                table.push([
                    "TOTAL".to_string(),
                    self.aip.title.clone(),
                    money(self.allocated_budget),
                    money(self.total_expenses),
                    money(self.allocated_budget - self.total_expenses),
                    self.utilization.to_string(),
                ]);
                table
            }
            AipReportType::Projects => {
                let mut table = Table::new(
                    format!("AIP {} Projects", fy),
                    ["Project", "Title", "Sector", "Status", "Cost", "Milestones"],
                );
                for p in &self.projects {
                    table.push([
                        p.project_code.clone(),
                        p.title.clone(),
                        p.sector.clone(),
                        p.status.clone(),
                        money(p.total_cost),
                        format!("{}/{}", p.milestones_completed, p.milestones_total),
                    ]);
                }
                table
            }
            AipReportType::Expenses => {
                let mut table = Table::new(
                    format!("AIP {} Expenses", fy),
                    ["Project", "Date", "Description", "Category", "Amount", "Reference"],
                );
                for e in &self.expenses {
                    table.push([
                        e.project_code.clone(),
                        e.expense_date.clone(),
                        e.description.clone(),
                        e.category.clone(),
                        money(e.amount),
                        e.reference_number.clone().unwrap_or_default(),
                    ]);
                }
                table
            }
            AipReportType::Milestones => {
                let mut table = Table::new(
                    format!("AIP {} Milestones", fy),
                    ["Project", "Milestone", "Target", "Completed", "Status", "Progress %"],
                );
                for m in &self.milestones {
                    table.push([
                        m.project_code.clone(),
                        m.title.clone(),
                        m.target_date.clone(),
                        m.completed_date.clone().unwrap_or_default(),
                        m.status.clone(),
                        m.progress.to_string(),
                    ]);
                }
                table
            }
        }
    }
}

// ============================================================================
// Export selection
// ============================================================================

/// Report families served under `/api/reports/{kind}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Population,
    Certificates,
    Blotter,
    Finance,
}

impl FromStr for ReportKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "population" | "residents" => Ok(Self::Population),
            "certificates" => Ok(Self::Certificates),
            "blotter" => Ok(Self::Blotter),
            "finance" => Ok(Self::Finance),
            other => Err(RegistryError::NotFound(format!("Unknown report: {}", other))),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Population => "population",
            Self::Certificates => "certificates",
            Self::Blotter => "blotter",
            Self::Finance => "finance",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    pub fn render(&self, table: &Table) -> Vec<u8> {
        match self {
            Self::Csv => csv::to_csv(table).into_bytes(),
            Self::Pdf => pdf::to_pdf(table),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            other => Err(RegistryError::InvalidInput(format!(
                "Unsupported export format: {} (expected csv or pdf)",
                other
            ))),
        }
    }
}

/// Rendered export ready to be sent as an attachment
#[derive(Debug, Clone)]
pub struct Export {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Export {
    pub fn new(stem: &str, format: ExportFormat, table: &Table) -> Self {
        Self {
            filename: format!("{}.{}", stem, format.extension()),
            content_type: format.content_type(),
            body: format.render(table),
        }
    }
}
