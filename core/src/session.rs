//! Dashboard session — the per-user working set.
//!
//! RULE: The session is owned by the request-handling layer.
//! The computation modules never hold it; they receive a borrowed
//! Dataset and return fresh values. Callers that share a session across
//! requests must serialize access themselves (last writer wins).

use crate::{
    aggregator::{render_chart, ChartView},
    config::{DashConfig, ScenarioRules},
    dataset::Dataset,
    error::{DashError, DashResult},
    report::{build_report, Competitor, ScrapedProduct, Workbook, NO_INSIGHTS_TEXT},
    simulator::{run_simulation, ScenarioResult},
    types::SessionId,
};
use serde::Serialize;
use uuid::Uuid;

pub const NO_SIMULATION_PROMPT: &str = "Run a simulation below.";

/// Everything the dashboard page needs, already computed.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub session_id:          SessionId,
    pub chart:               ChartView,
    pub insights_markdown:   String,
    pub simulation_markdown: String,
    pub scraped_products:    Vec<ScrapedProduct>,
    pub competitors:         Vec<Competitor>,
}

#[derive(Debug, Clone)]
pub struct DashboardSession {
    pub session_id:    SessionId,
    dataset:           Option<Dataset>,
    insights:          Option<String>,
    simulation_result: Option<ScenarioResult>,
    scraped_products:  Vec<ScrapedProduct>,
    competitors:       Vec<Competitor>,
}

impl Default for DashboardSession {
    fn default() -> Self { Self::new() }
}

impl DashboardSession {
    pub fn new() -> Self {
        Self {
            session_id:        Uuid::new_v4().to_string(),
            dataset:           None,
            insights:          None,
            simulation_result: None,
            scraped_products:  Vec::new(),
            competitors:       Vec::new(),
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn insights(&self) -> Option<&str> {
        self.insights.as_deref()
    }

    pub fn simulation_result(&self) -> Option<&ScenarioResult> {
        self.simulation_result.as_ref()
    }

    pub fn scraped_products(&self) -> &[ScrapedProduct] {
        &self.scraped_products
    }

    pub fn competitors(&self) -> &[Competitor] {
        &self.competitors
    }

    fn require_dataset(&self) -> DashResult<&Dataset> {
        self.dataset.as_ref().ok_or(DashError::NoDataset)
    }

    /// Replace the working dataset. Insights belong to the old data and
    /// are dropped; the last simulation result stays until the next run.
    pub fn upload(&mut self, dataset: Dataset) -> DashResult<()> {
        if dataset.is_empty() {
            return Err(DashError::EmptyDataset);
        }
        log::info!(
            "session {}: dataset uploaded ({} rows, {} columns)",
            self.session_id,
            dataset.len(),
            dataset.columns().len()
        );
        self.dataset = Some(dataset);
        self.insights = None;
        Ok(())
    }

    /// Store insights markdown produced outside the core.
    pub fn set_insights(&mut self, markdown: impl Into<String>) {
        self.insights = Some(markdown.into());
    }

    /// Run a scenario against the current dataset and keep the result.
    pub fn submit_scenario(
        &mut self,
        scenario: &str,
        rules: &ScenarioRules,
    ) -> DashResult<&ScenarioResult> {
        let dataset = self.require_dataset()?;
        let result = run_simulation(dataset, scenario, rules);
        log::info!(
            "session {}: simulation stored (simulated={})",
            self.session_id,
            result.is_simulated()
        );
        Ok(self.simulation_result.insert(result))
    }

    pub fn record_scraped_product(&mut self, product: ScrapedProduct) {
        self.scraped_products.push(product);
    }

    pub fn set_competitors(&mut self, competitors: Vec<Competitor>) {
        self.competitors = competitors;
    }

    pub fn dashboard(&self, config: &DashConfig) -> DashResult<DashboardView> {
        let dataset = self.require_dataset()?;
        Ok(DashboardView {
            session_id:          self.session_id.clone(),
            chart:               render_chart(dataset, &config.chart_title),
            insights_markdown:   self.insights.clone().unwrap_or_else(|| NO_INSIGHTS_TEXT.to_string()),
            simulation_markdown: self
                .simulation_result
                .as_ref()
                .map(|r| r.markdown.clone())
                .unwrap_or_else(|| NO_SIMULATION_PROMPT.to_string()),
            scraped_products:    self.scraped_products.clone(),
            competitors:         self.competitors.clone(),
        })
    }

    pub fn export_report(&self) -> DashResult<Workbook> {
        let dataset = self.require_dataset()?;
        Ok(build_report(
            dataset,
            self.insights(),
            self.simulation_result(),
            &self.scraped_products,
            &self.competitors,
        ))
    }
}
