//! Scenario simulator — rule-based "what-if" over the dataset.
//!
//! Stateless. Each call depends only on (dataset, scenario, rules).
//! The caller holds the most recent result; see session.rs.
//!
//! Never returns an error. Anything the rule table cannot handle
//! (no match, missing columns, zero baseline) becomes the fallback text.

use crate::{
    config::{ScenarioRule, ScenarioRules},
    dataset::{measure_value, Dataset},
    error::DashResult,
    types::{COL_SALES, SALES_COLUMNS},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketChange {
    pub market:        String,
    pub product:       String,
    pub current_sales: f64,
    pub new_sales:     f64,
    pub change_pct:    f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Simulated {
        rule_id: String,
        changes: Vec<MarketChange>,
    },
    Unprocessed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub outcome:  ScenarioOutcome,
    /// Markdown handed to the presentation and export layers as-is.
    pub markdown: String,
}

impl ScenarioResult {
    pub fn is_simulated(&self) -> bool {
        matches!(self.outcome, ScenarioOutcome::Simulated { .. })
    }

    pub fn change_for(&self, market: &str) -> Option<&MarketChange> {
        match &self.outcome {
            ScenarioOutcome::Simulated { changes, .. } => {
                changes.iter().find(|c| c.market == market)
            }
            ScenarioOutcome::Unprocessed => None,
        }
    }
}

/// Why a matched rule could not produce numbers.
#[derive(Debug)]
enum RuleFailure {
    /// Baseline sales of zero: the percentage change is undefined.
    UndefinedRatio { market: String },
    Data(crate::error::DashError),
}

pub fn run_simulation(dataset: &Dataset, scenario: &str, rules: &ScenarioRules) -> ScenarioResult {
    log::info!("running simulation for: {scenario}");

    let Some(rule) = rules.first_match(scenario) else {
        log::debug!("no scenario rule matched");
        return fallback(scenario);
    };

    match apply_rule(dataset, rule) {
        Ok(changes) => {
            log::debug!("rule '{}' produced {} market change(s)", rule.id, changes.len());
            ScenarioResult {
                scenario: scenario.to_string(),
                markdown: simulated_markdown(scenario, &changes),
                outcome:  ScenarioOutcome::Simulated {
                    rule_id: rule.id.clone(),
                    changes,
                },
            }
        }
        Err(RuleFailure::UndefinedRatio { market }) => {
            log::warn!(
                "rule '{}': no {} sales in market '{market}', cannot compute change",
                rule.id,
                rule.product
            );
            fallback(scenario)
        }
        Err(RuleFailure::Data(e)) => {
            log::warn!("rule '{}' could not read dataset: {e}", rule.id);
            fallback(scenario)
        }
    }
}

fn apply_rule(dataset: &Dataset, rule: &ScenarioRule) -> Result<Vec<MarketChange>, RuleFailure> {
    let mut changes = Vec::with_capacity(rule.adjustments.len());
    for adj in &rule.adjustments {
        let current = product_market_sales(dataset, &rule.product, &adj.market)
            .map_err(RuleFailure::Data)?;

        if current == 0.0 || !current.is_finite() {
            return Err(RuleFailure::UndefinedRatio { market: adj.market.clone() });
        }

        let new_sales = current * adj.multiplier;
        changes.push(MarketChange {
            market:        adj.market.clone(),
            product:       rule.product.clone(),
            current_sales: current,
            new_sales,
            change_pct:    (new_sales - current) / current * 100.0,
        });
    }
    Ok(changes)
}

/// Sum of Sales where Product and Market match exactly.
pub fn product_market_sales(dataset: &Dataset, product: &str, market: &str) -> DashResult<f64> {
    let [product_idx, market_idx, sales_idx] =
        dataset.require_columns(SALES_COLUMNS)?;

    let mut total = 0.0;
    for (i, row) in dataset.rows().iter().enumerate() {
        if row[product_idx].as_text() == Some(product) && row[market_idx].as_text() == Some(market) {
            total += measure_value(&row[sales_idx], i, COL_SALES)?;
        }
    }
    Ok(total)
}

fn simulated_markdown(scenario: &str, changes: &[MarketChange]) -> String {
    let lines: Vec<String> = changes
        .iter()
        .map(|c| {
            format!(
                "- {} Market {} Sales Change: {:.2}%",
                c.market, c.product, c.change_pct
            )
        })
        .collect();
    format!(
        "**Scenario Simulated:** *{scenario}*\n\n**Result:** \n{}",
        lines.join("\n")
    )
}

fn fallback(scenario: &str) -> ScenarioResult {
    ScenarioResult {
        scenario: scenario.to_string(),
        outcome:  ScenarioOutcome::Unprocessed,
        markdown: format!(
            "**Scenario Simulated:** *{scenario}*\n\n**Result:** The simulation logic could not \
             fully process this request (lacks specific logic for '{scenario}')."
        ),
    }
}
