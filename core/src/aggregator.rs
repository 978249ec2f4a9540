//! Aggregator — Sales summed per (Product, Market) for the dashboard chart.
//!
//! Pure function over the dataset. Recomputed on every render;
//! nothing here is cached or stored.
//!
//! INVARIANT: the series partitions the dataset exactly.
//! Every (Product, Market) pair appears once, and the sum of all
//! totals equals the sum of Sales over every row.

use crate::{
    dataset::{measure_value, Dataset},
    error::{DashError, DashResult},
    types::{COL_MARKET, COL_PRODUCT, COL_SALES, SALES_COLUMNS},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CHART_TITLE: &str = "Sales Performance by Product and Market";

/// Renderable fallback shown in place of the chart when the
/// upload lacks the columns the chart needs.
pub const MISSING_COLUMNS_MESSAGE: &str =
    "Required columns ('Product', 'Sales', 'Market') not found for visualization.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub product:     String,
    pub market:      String,
    pub sales_total: f64,
}

/// One point per distinct (Product, Market) pair, ordered by
/// Product then Market.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregatedSeries {
    pub points: Vec<SeriesPoint>,
}

impl AggregatedSeries {
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.sales_total).sum()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, product: &str, market: &str) -> Option<&SeriesPoint> {
        self.points
            .iter()
            .find(|p| p.product == product && p.market == market)
    }
}

pub fn aggregate_sales(dataset: &Dataset) -> DashResult<AggregatedSeries> {
    let [product_idx, market_idx, sales_idx] =
        dataset.require_columns(SALES_COLUMNS)?;

    // Keyed on (text, type rank) so cells of different types never merge.
    let mut totals: BTreeMap<((String, u8), (String, u8)), f64> = BTreeMap::new();
    for (i, row) in dataset.rows().iter().enumerate() {
        let sales = measure_value(&row[sales_idx], i, COL_SALES)?;
        let key = (row[product_idx].group_key(), row[market_idx].group_key());
        *totals.entry(key).or_insert(0.0) += sales;
    }

    let points: Vec<SeriesPoint> = totals
        .into_iter()
        .map(|(((product, _), (market, _)), sales_total)| SeriesPoint {
            product,
            market,
            sales_total,
        })
        .collect();

    log::debug!(
        "aggregated {} rows into {} (product, market) pairs",
        dataset.len(),
        points.len()
    );

    Ok(AggregatedSeries { points })
}

/// Grouped bar chart description for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title:   String,
    pub x:       String,
    pub y:       String,
    pub color:   String,
    pub barmode: String,
    pub series:  AggregatedSeries,
}

impl ChartSpec {
    pub fn grouped_bar(title: &str, series: AggregatedSeries) -> Self {
        Self {
            title:   title.to_string(),
            x:       COL_PRODUCT.to_string(),
            y:       COL_SALES.to_string(),
            color:   COL_MARKET.to_string(),
            barmode: "group".to_string(),
            series,
        }
    }

    /// Distinct markets in first-seen order, i.e. the legend entries.
    pub fn markets(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for p in &self.series.points {
            if !out.contains(&p.market.as_str()) {
                out.push(&p.market);
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartView {
    Chart { spec: ChartSpec },
    Unavailable { message: String },
}

impl ChartView {
    pub fn spec(&self) -> Option<&ChartSpec> {
        match self {
            ChartView::Chart { spec } => Some(spec),
            ChartView::Unavailable { .. } => None,
        }
    }
}

/// Aggregate and wrap as a chart, turning any failure into fallback text.
pub fn render_chart(dataset: &Dataset, title: &str) -> ChartView {
    match aggregate_sales(dataset) {
        Ok(series) => ChartView::Chart {
            spec: ChartSpec::grouped_bar(title, series),
        },
        Err(DashError::MissingColumns { missing }) => {
            log::warn!("chart unavailable, missing columns: {}", missing.join(", "));
            ChartView::Unavailable {
                message: MISSING_COLUMNS_MESSAGE.to_string(),
            }
        }
        Err(e) => {
            log::warn!("chart unavailable: {e}");
            ChartView::Unavailable {
                message: e.to_string(),
            }
        }
    }
}
