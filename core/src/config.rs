use crate::aggregator::CHART_TITLE;
use serde::{Deserialize, Serialize};

/// Fixed sales adjustment applied to one market when a rule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAdjustment {
    pub market:     String,
    /// New sales = current sales × multiplier (0.95 is a 5% drop).
    pub multiplier: f64,
}

/// A keyword-triggered scenario.
///
/// Matches when the lowercased scenario contains every subject keyword
/// and at least one trigger phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRule {
    pub id:               String,
    pub product:          String,
    pub subject_keywords: Vec<String>,
    pub trigger_phrases:  Vec<String>,
    pub adjustments:      Vec<MarketAdjustment>,
}

impl ScenarioRule {
    pub fn matches(&self, scenario: &str) -> bool {
        let lower = scenario.to_lowercase();
        self.subject_keywords
            .iter()
            .all(|k| lower.contains(&k.to_lowercase()))
            && self
                .trigger_phrases
                .iter()
                .any(|p| lower.contains(&p.to_lowercase()))
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.adjustments.is_empty() {
            anyhow::bail!("Rule '{}' has no market adjustments", self.id);
        }
        if self.trigger_phrases.is_empty() {
            anyhow::bail!("Rule '{}' has no trigger phrases", self.id);
        }
        for adj in &self.adjustments {
            if !adj.multiplier.is_finite() || adj.multiplier <= 0.0 {
                anyhow::bail!(
                    "Rule '{}': invalid multiplier {} for market '{}'",
                    self.id,
                    adj.multiplier,
                    adj.market
                );
            }
        }
        Ok(())
    }
}

/// Ordered rule table. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRules {
    pub rules: Vec<ScenarioRule>,
}

impl Default for ScenarioRules {
    /// The smartphone price rule: a price increase costs 5% of
    /// North sales and 8% of South sales.
    fn default() -> Self {
        Self {
            rules: vec![ScenarioRule {
                id:               "smartphone_price_increase".into(),
                product:          "Smartphone".into(),
                subject_keywords: vec!["smartphone".into()],
                trigger_phrases:  vec![
                    "price increased".into(),
                    "10% increased".into(),
                    "price up".into(),
                ],
                adjustments: vec![
                    MarketAdjustment { market: "North".into(), multiplier: 0.95 }, // -5%
                    MarketAdjustment { market: "South".into(), multiplier: 0.92 }, // -8%
                ],
            }],
        }
    }
}

impl ScenarioRules {
    /// Load from `{data_dir}/scenarios/scenario_rules.json`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/scenarios/scenario_rules.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let rules: ScenarioRules = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rules.is_empty() {
            anyhow::bail!("Scenario rule table is empty");
        }
        for rule in &self.rules {
            rule.validate()?;
        }
        Ok(())
    }

    pub fn first_match(&self, scenario: &str) -> Option<&ScenarioRule> {
        self.rules.iter().find(|r| r.matches(scenario))
    }
}

#[derive(Debug, Clone)]
pub struct DashConfig {
    pub rules:       ScenarioRules,
    pub chart_title: String,
}

impl DashConfig {
    /// Load from the data/ directory.
    /// In tests, use DashConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let rules = ScenarioRules::load(data_dir)?;
        log::info!("loaded {} scenario rule(s) from {data_dir}", rules.rules.len());
        Ok(Self {
            rules,
            chart_title: CHART_TITLE.to_string(),
        })
    }

    /// Config with the built-in rule table.
    pub fn default_test() -> Self {
        Self {
            rules:       ScenarioRules::default(),
            chart_title: CHART_TITLE.to_string(),
        }
    }
}
