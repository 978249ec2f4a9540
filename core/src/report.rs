//! Report assembly — the augmented workbook offered for download.
//!
//! Sheet order is fixed:
//!   1. Raw Data          (the dataset, unchanged)
//!   2. Summary           (insights + latest simulation text)
//!   3. Competitors       (only when competitor data exists)
//!   4. Scraped Products  (only when product data exists)
//!
//! Writing the workbook to disk is store.rs's job.

use crate::{
    dataset::{CellValue, Dataset},
    error::{DashError, DashResult},
    simulator::ScenarioResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const REPORT_FILE_STEM: &str = "company_status_report";

pub const SHEET_RAW_DATA:         &str = "Raw Data";
pub const SHEET_SUMMARY:          &str = "Summary";
pub const SHEET_COMPETITORS:      &str = "Competitors";
pub const SHEET_SCRAPED_PRODUCTS: &str = "Scraped Products";

pub const NO_INSIGHTS_TEXT:   &str = "No insights generated yet.";
pub const NO_SIMULATION_TEXT: &str = "No simulation results run yet.";

/// One product page fetched by the scraping collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedProduct {
    pub url:    String,
    pub title:  String,
    pub price:  String,
    pub status: String,
}

/// One entry from a scraped competitor listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name:   String,
    pub price:  String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name:    String,
    pub columns: Vec<String>,
    pub rows:    Vec<Vec<CellValue>>,
}

impl Sheet {
    fn new(name: &str, columns: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    /// Cell by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    pub generated_at: DateTime<Utc>,
    pub sheets:       Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> DashResult<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| DashError::UnknownSheet { name: name.to_string() })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

pub fn build_report(
    dataset: &Dataset,
    insights: Option<&str>,
    simulation: Option<&ScenarioResult>,
    products: &[ScrapedProduct],
    competitors: &[Competitor],
) -> Workbook {
    let mut sheets = vec![
        Sheet {
            name:    SHEET_RAW_DATA.to_string(),
            columns: dataset.columns().to_vec(),
            rows:    dataset.rows().to_vec(),
        },
        Sheet::new(
            SHEET_SUMMARY,
            &["Section", "Content"],
            vec![
                vec![
                    "AI Insights".into(),
                    insights.unwrap_or(NO_INSIGHTS_TEXT).into(),
                ],
                vec![
                    "Simulation Results".into(),
                    simulation
                        .map(|r| r.markdown.as_str())
                        .unwrap_or(NO_SIMULATION_TEXT)
                        .into(),
                ],
            ],
        ),
    ];

    if !competitors.is_empty() {
        let rows = competitors
            .iter()
            .map(|c| {
                vec![
                    c.name.as_str().into(),
                    c.price.as_str().into(),
                    c.status.as_deref().map_or(CellValue::Empty, CellValue::from),
                ]
            })
            .collect();
        sheets.push(Sheet::new(SHEET_COMPETITORS, &["Name", "Price", "Status"], rows));
    }

    if !products.is_empty() {
        let rows = products
            .iter()
            .map(|p| {
                vec![
                    p.url.as_str().into(),
                    p.title.as_str().into(),
                    p.price.as_str().into(),
                    p.status.as_str().into(),
                ]
            })
            .collect();
        sheets.push(Sheet::new(
            SHEET_SCRAPED_PRODUCTS,
            &["URL", "Title", "Price", "Status"],
            rows,
        ));
    }

    log::debug!("report assembled with {} sheet(s)", sheets.len());

    Workbook {
        generated_at: Utc::now(),
        sheets,
    }
}
