//! desk-runner: headless dashboard runner for SalesDesk.
//!
//! Usage:
//!   desk-runner --dataset sales.json --scenario "Smartphone price up" --report out.db
//!   desk-runner --synthetic 500 --seed 7
//!   desk-runner --ipc-mode

use anyhow::Result;
use salesdesk_core::{
    aggregator::ChartView,
    config::DashConfig,
    dataset::Dataset,
    report::{Competitor, ScrapedProduct, REPORT_FILE_STEM},
    sample::{sample_dataset, synthetic_dataset},
    session::DashboardSession,
    store::ReportStore,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Upload { dataset: serde_json::Value },
    UploadSample,
    Simulate { scenario: String },
    SetInsights { markdown: String },
    RecordProduct { product: ScrapedProduct },
    SetCompetitors { competitors: Vec<Competitor> },
    GetDashboard,
    Export { path: Option<String> },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let seed = parse_arg(&args, "--seed", 42u64);
    let synthetic = parse_arg(&args, "--synthetic", 0usize);
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let dataset_path = flag_value(&args, "--dataset");
    let report_path = flag_value(&args, "--report");
    let scenarios: Vec<&str> = args
        .windows(2)
        .filter(|w| w[0] == "--scenario")
        .map(|w| w[1].as_str())
        .collect();

    let config = match DashConfig::load(data_dir) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("{e}; using built-in scenario rules");
            DashConfig::default_test()
        }
    };

    let mut session = DashboardSession::new();

    if ipc_mode {
        return run_ipc_loop(&mut session, &config);
    }

    let dataset = match (dataset_path, synthetic) {
        (Some(path), _) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
            Dataset::from_json_str(&content)?
        }
        (None, 0) => sample_dataset(),
        (None, n) => synthetic_dataset(seed, n)?,
    };

    println!("SalesDesk: desk-runner");
    println!("  session:   {}", session.session_id);
    println!("  data_dir:  {data_dir}");
    println!("  rows:      {}", dataset.len());
    println!("  scenarios: {}", scenarios.len());
    println!();

    session.upload(dataset)?;
    for scenario in &scenarios {
        session.submit_scenario(scenario, &config.rules)?;
    }

    print_summary(&session, &config)?;

    if let Some(path) = report_path {
        export(&session, path)?;
        println!();
        println!("  report:    {path}");
    }

    Ok(())
}

fn run_ipc_loop(session: &mut DashboardSession, config: &DashConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        // Core errors are reported to the client; the loop keeps running.
        match handle_command(session, config, cmd) {
            Ok(reply) => writeln!(stdout, "{reply}")?,
            Err(e) => {
                log::warn!("command failed: {e}");
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(
    session: &mut DashboardSession,
    config: &DashConfig,
    cmd: IpcCommand,
) -> Result<serde_json::Value> {
    match cmd {
        IpcCommand::Upload { dataset } => {
            session.upload(Dataset::from_json_value(dataset)?)?;
        }
        IpcCommand::UploadSample => {
            session.upload(sample_dataset())?;
        }
        IpcCommand::Simulate { scenario } => {
            session.submit_scenario(&scenario, &config.rules)?;
        }
        IpcCommand::SetInsights { markdown } => {
            session.set_insights(markdown);
        }
        IpcCommand::RecordProduct { product } => {
            session.record_scraped_product(product);
        }
        IpcCommand::SetCompetitors { competitors } => {
            session.set_competitors(competitors);
        }
        IpcCommand::GetDashboard => {}
        IpcCommand::Export { path } => {
            let path = path.unwrap_or_else(|| format!("{REPORT_FILE_STEM}.db"));
            let sheets = export(session, &path)?;
            return Ok(serde_json::json!({ "exported": path, "sheets": sheets }));
        }
        IpcCommand::Quit => {}
    }
    Ok(serde_json::to_value(session.dashboard(config)?)?)
}

fn export(session: &DashboardSession, path: &str) -> Result<Vec<String>> {
    let workbook = session.export_report()?;
    let store = ReportStore::open(path)?;
    store.write_workbook(&workbook)?;
    Ok(store.sheet_names()?)
}

fn write_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{}", err_json)?;
    stdout.flush()?;
    Ok(())
}

fn print_summary(session: &DashboardSession, config: &DashConfig) -> Result<()> {
    let view = session.dashboard(config)?;

    println!("=== SALES BY PRODUCT AND MARKET ===");
    match &view.chart {
        ChartView::Chart { spec } => {
            for p in &spec.series.points {
                println!("  {:<12} {:<8} {:>12.0}", p.product, p.market, p.sales_total);
            }
            println!("  {:<21} {:>12.0}", "total", spec.series.total());
        }
        ChartView::Unavailable { message } => println!("  {message}"),
    }

    println!();
    println!("=== SIMULATION ===");
    for line in view.simulation_markdown.lines() {
        println!("  {line}");
    }
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
