//! Report assembly and SQLite export tests.

use salesdesk_core::{
    config::DashConfig,
    dataset::{CellValue, Dataset},
    error::DashError,
    report::{
        Competitor, ScrapedProduct, NO_INSIGHTS_TEXT, NO_SIMULATION_TEXT, SHEET_COMPETITORS,
        SHEET_RAW_DATA, SHEET_SCRAPED_PRODUCTS, SHEET_SUMMARY, Workbook,
    },
    sample::sample_dataset,
    session::DashboardSession,
    store::ReportStore,
};

fn loaded_session() -> DashboardSession {
    let mut session = DashboardSession::new();
    session.upload(sample_dataset()).unwrap();
    session
}

#[test]
fn summary_uses_defaults_when_nothing_ran() {
    let workbook = loaded_session().export_report().unwrap();

    assert_eq!(workbook.sheet_names(), vec![SHEET_RAW_DATA, SHEET_SUMMARY]);
    let summary = workbook.sheet(SHEET_SUMMARY).unwrap();
    assert_eq!(summary.columns, vec!["Section", "Content"]);
    assert_eq!(summary.cell(0, "Section"), Some(&CellValue::from("AI Insights")));
    assert_eq!(summary.cell(0, "Content"), Some(&CellValue::from(NO_INSIGHTS_TEXT)));
    assert_eq!(summary.cell(1, "Section"), Some(&CellValue::from("Simulation Results")));
    assert_eq!(summary.cell(1, "Content"), Some(&CellValue::from(NO_SIMULATION_TEXT)));
}

#[test]
fn raw_data_sheet_is_the_dataset_unchanged() {
    let session = loaded_session();
    let workbook = session.export_report().unwrap();
    let raw = workbook.sheet(SHEET_RAW_DATA).unwrap();

    let ds = session.dataset().unwrap();
    assert_eq!(raw.columns, ds.columns());
    assert_eq!(raw.rows, ds.rows());
}

#[test]
fn summary_carries_insights_and_latest_simulation() {
    let mut session = loaded_session();
    let config = DashConfig::default_test();
    session.set_insights("* South market is competitive.");
    let markdown = session
        .submit_scenario("Smartphone price up", &config.rules)
        .unwrap()
        .markdown
        .clone();

    let workbook = session.export_report().unwrap();
    let summary = workbook.sheet(SHEET_SUMMARY).unwrap();
    assert_eq!(summary.cell(0, "Content"), Some(&CellValue::from("* South market is competitive.")));
    assert_eq!(summary.cell(1, "Content"), Some(&CellValue::Text(markdown)));
}

#[test]
fn optional_sheets_appear_only_with_data() {
    let mut session = loaded_session();
    session.set_competitors(vec![
        Competitor { name: "A Light in the Attic".into(), price: "£51.77".into(), status: None },
        Competitor { name: "N/A".into(), price: "N/A".into(), status: Some("No matching elements found".into()) },
    ]);
    session.record_scraped_product(ScrapedProduct {
        url:    "http://books.toscrape.com/x".into(),
        title:  "Error".into(),
        price:  "Error".into(),
        status: "Failed: timeout".into(),
    });

    let workbook = session.export_report().unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec![SHEET_RAW_DATA, SHEET_SUMMARY, SHEET_COMPETITORS, SHEET_SCRAPED_PRODUCTS]
    );

    let comp = workbook.sheet(SHEET_COMPETITORS).unwrap();
    assert_eq!(comp.columns, vec!["Name", "Price", "Status"]);
    assert_eq!(comp.cell(0, "Status"), Some(&CellValue::Empty));
    assert_eq!(comp.cell(1, "Status"), Some(&CellValue::from("No matching elements found")));

    let prod = workbook.sheet(SHEET_SCRAPED_PRODUCTS).unwrap();
    assert_eq!(prod.columns, vec!["URL", "Title", "Price", "Status"]);
    assert_eq!(prod.rows.len(), 1);
}

#[test]
fn unknown_sheet_is_an_error() {
    let workbook = loaded_session().export_report().unwrap();
    assert!(matches!(workbook.sheet("Pivot"), Err(DashError::UnknownSheet { .. })));
}

#[test]
fn store_round_trips_workbook() {
    let mut session = loaded_session();
    let config = DashConfig::default_test();
    session.submit_scenario("Smartphone price increased", &config.rules).unwrap();
    session.set_competitors(vec![Competitor { name: "B".into(), price: "£2".into(), status: None }]);
    let workbook = session.export_report().unwrap();

    let store = ReportStore::in_memory().unwrap();
    store.write_workbook(&workbook).unwrap();

    assert_eq!(
        store.sheet_names().unwrap(),
        vec![SHEET_RAW_DATA, SHEET_SUMMARY, SHEET_COMPETITORS]
    );
    let back = store.read_workbook().unwrap();
    assert_eq!(back.generated_at, workbook.generated_at);
    assert_eq!(back.sheets, workbook.sheets);
}

#[test]
fn rewriting_replaces_previous_report() {
    let mut session = loaded_session();
    session.set_competitors(vec![Competitor { name: "B".into(), price: "£2".into(), status: None }]);

    let store = ReportStore::in_memory().unwrap();
    store.write_workbook(&session.export_report().unwrap()).unwrap();
    assert_eq!(store.sheet_names().unwrap().len(), 3);

    let plain = loaded_session().export_report().unwrap();
    store.write_workbook(&plain).unwrap();

    assert_eq!(store.sheet_names().unwrap(), vec![SHEET_RAW_DATA, SHEET_SUMMARY]);
    assert!(matches!(
        store.read_sheet(SHEET_COMPETITORS),
        Err(DashError::UnknownSheet { .. })
    ));
}

#[test]
fn empty_store_has_no_report() {
    let store = ReportStore::in_memory().unwrap();
    assert!(store.sheet_names().unwrap().is_empty());
    assert!(store.generated_at().unwrap().is_none());
    assert!(store.read_workbook().is_err());
}

fn export_through_store(dataset: Dataset) -> (Workbook, Workbook) {
    let mut session = DashboardSession::new();
    session.upload(dataset).unwrap();
    let workbook = session.export_report().unwrap();

    let store = ReportStore::in_memory().unwrap();
    store.write_workbook(&workbook).unwrap();
    let back = store.read_workbook().unwrap();
    (workbook, back)
}

/// SQLite column names are case-insensitive; headers differing only in
/// case must still export and read back in order.
#[test]
fn store_keeps_headers_differing_only_in_case() {
    let ds = Dataset::new(
        vec!["Product".into(), "Market".into(), "Sales".into(), "sales".into()],
        vec![
            vec!["Laptop".into(), "North".into(), CellValue::Integer(100), "high".into()],
            vec!["Phone".into(), "South".into(), CellValue::Number(2.5), CellValue::Empty],
        ],
    )
    .unwrap();

    let (workbook, back) = export_through_store(ds);
    let raw = back.sheet(SHEET_RAW_DATA).unwrap();
    assert_eq!(raw.columns, vec!["Product", "Market", "Sales", "sales"]);
    assert_eq!(raw.cell(0, "sales"), Some(&CellValue::from("high")));
    assert_eq!(back.sheets, workbook.sheets);
}

#[test]
fn store_keeps_sheet_without_columns() {
    let ds = Dataset::new(vec![], vec![vec![], vec![], vec![]]).unwrap();

    let (workbook, back) = export_through_store(ds);
    let raw = back.sheet(SHEET_RAW_DATA).unwrap();
    assert!(raw.columns.is_empty());
    assert_eq!(raw.rows.len(), 3);
    assert_eq!(back.sheets, workbook.sheets);
}

/// A stored timestamp that cannot be read is an error, not "no report".
#[test]
fn unreadable_generated_at_is_reported() {
    let path = std::env::temp_dir().join(format!("salesdesk-corrupt-{}.db", std::process::id()));
    let path_str = path.to_string_lossy().into_owned();
    let _ = std::fs::remove_file(&path);

    let store = ReportStore::open(&path_str).unwrap();
    store.write_workbook(&loaded_session().export_report().unwrap()).unwrap();
    assert!(store.generated_at().unwrap().is_some());

    rusqlite::Connection::open(&path)
        .unwrap()
        .execute("UPDATE report_meta SET value = X'00FF' WHERE key = 'generated_at'", [])
        .unwrap();

    let generated_at = store.generated_at();
    let workbook = store.read_workbook();
    drop(store);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(generated_at, Err(DashError::Database(_))), "got {generated_at:?}");
    assert!(workbook.is_err());
}
