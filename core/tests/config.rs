//! Scenario rule configuration tests.

use salesdesk_core::{
    config::{DashConfig, ScenarioRules},
    dataset::Dataset,
};

fn data_dir() -> String {
    format!("{}/../data", env!("CARGO_MANIFEST_DIR"))
}

fn temp_data_dir(name: &str, rules_json: &str) -> String {
    let dir = std::env::temp_dir().join(format!("salesdesk-{name}-{}", std::process::id()));
    std::fs::create_dir_all(dir.join("scenarios")).unwrap();
    std::fs::write(dir.join("scenarios/scenario_rules.json"), rules_json).unwrap();
    dir.to_string_lossy().into_owned()
}

/// The shipped rule file must not drift from the built-in constants.
#[test]
fn shipped_rules_equal_builtin_rules() {
    let loaded = ScenarioRules::load(&data_dir()).unwrap();
    assert_eq!(loaded, ScenarioRules::default());
}

#[test]
fn builtin_rule_keeps_fixed_keywords_and_multipliers() {
    let rules = ScenarioRules::default();
    assert_eq!(rules.rules.len(), 1);
    let rule = &rules.rules[0];
    assert_eq!(rule.product, "Smartphone");
    assert_eq!(rule.subject_keywords, vec!["smartphone"]);
    assert_eq!(rule.trigger_phrases, vec!["price increased", "10% increased", "price up"]);
    assert_eq!(rule.adjustments[0].market, "North");
    assert_eq!(rule.adjustments[0].multiplier, 0.95);
    assert_eq!(rule.adjustments[1].market, "South");
    assert_eq!(rule.adjustments[1].multiplier, 0.92);
}

#[test]
fn dash_config_loads_from_data_dir() {
    let config = DashConfig::load(&data_dir()).unwrap();
    assert_eq!(config.chart_title, "Sales Performance by Product and Market");
    assert_eq!(config.rules, DashConfig::default_test().rules);
}

#[test]
fn missing_rule_file_names_the_path() {
    let err = ScenarioRules::load("/nonexistent/salesdesk").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/salesdesk/scenarios/scenario_rules.json"));
}

#[test]
fn empty_rule_table_is_rejected() {
    let dir = temp_data_dir("empty", r#"{ "rules": [] }"#);
    let result = ScenarioRules::load(&dir);
    std::fs::remove_dir_all(&dir).unwrap();
    assert!(result.is_err());
    assert!(!std::path::Path::new(&dir).exists());
}

#[test]
fn non_positive_multiplier_is_rejected() {
    let dir = temp_data_dir(
        "badmult",
        r#"{ "rules": [ {
            "id": "x", "product": "Laptop",
            "subject_keywords": ["laptop"], "trigger_phrases": ["price up"],
            "adjustments": [ { "market": "North", "multiplier": 0.0 } ]
        } ] }"#,
    );
    let result = ScenarioRules::load(&dir);
    std::fs::remove_dir_all(&dir).unwrap();
    assert!(result.unwrap_err().to_string().contains("invalid multiplier"));
}

#[test]
fn shipped_sample_dataset_parses() {
    let path = format!("{}/sample/sample_sales.json", data_dir());
    let ds = Dataset::from_json_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(ds, salesdesk_core::sample::sample_dataset());
}

#[test]
fn ragged_and_duplicate_headers_are_rejected() {
    let ragged = r#"{ "columns": ["Product", "Sales"], "rows": [["Laptop"]] }"#;
    assert!(Dataset::from_json_str(ragged).is_err());

    let dup = r#"{ "columns": ["Sales", "Sales"], "rows": [] }"#;
    assert!(Dataset::from_json_str(dup).is_err());
}
